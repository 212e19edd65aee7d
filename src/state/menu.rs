// Layer picker open/closed state.
use std::rc::Rc;
use yew::Reducible;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayerMenuState {
    pub open: bool,
}

#[derive(Clone, Copy, Debug)]
pub enum LayerMenuAction {
    Toggle,
    Close,
    /// A pointer-down anywhere in the document while the menu is open.
    PointerDown { inside: bool },
}

impl Reducible for LayerMenuState {
    type Action = LayerMenuAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        use LayerMenuAction::*;
        let open = match action {
            Toggle => !self.open,
            Close => false,
            PointerDown { inside } => self.open && inside,
        };
        if open == self.open {
            return self;
        }
        Rc::new(Self { open })
    }
}
