use yew::prelude::*;

use crate::model::Page;

#[derive(Properties, PartialEq, Clone)]
pub struct HamburgerMenuProps {
    pub open: bool,
    pub on_toggle: Callback<()>,
}

#[function_component(HamburgerMenu)]
pub fn hamburger_menu(props: &HamburgerMenuProps) -> Html {
    let onclick = {
        let cb = props.on_toggle.clone();
        Callback::from(move |e: MouseEvent| {
            e.stop_propagation();
            cb.emit(());
        })
    };
    html! {
        <div class="hamburger-menu">
            <div class={classes!("hamburger-icon", (!props.open).then_some("show"))} {onclick}>
                <img src="images/HamburgerIcon.png" alt="Humble Nomad Logo" />
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq, Clone)]
pub struct SidebarProps {
    pub open: bool,
    pub current: Page,
    pub on_navigate: Callback<Page>,
    pub on_close: Callback<()>,
}

#[function_component(Sidebar)]
pub fn sidebar(props: &SidebarProps) -> Html {
    let close = {
        let cb = props.on_close.clone();
        Callback::from(move |_: MouseEvent| cb.emit(()))
    };
    html! {
        <div class={classes!("sidebar", props.open.then_some("open"))}>
            <div class="sidebar-title">{ "HumbleNomad" }</div>
            { for Page::ALL.iter().map(|&page| {
                let onclick = {
                    let cb = props.on_navigate.clone();
                    Callback::from(move |_: MouseEvent| cb.emit(page))
                };
                html! {
                    <a class={classes!("sidebar-link", (page == props.current).then_some("active"))} {onclick}>
                        { page.icon() }{" "}<span>{ page.title() }</span>
                    </a>
                }
            }) }
            <button class="close-btn" onclick={close}>{ "×" }</button>
        </div>
    }
}
