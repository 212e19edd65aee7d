// DOM event listener that is removed when dropped.
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use web_sys::{Event, EventTarget};

pub struct ScopedListener {
    target: EventTarget,
    event: &'static str,
    capture: bool,
    callback: Closure<dyn FnMut(Event)>,
}

impl ScopedListener {
    pub fn new<F>(target: &EventTarget, event: &'static str, capture: bool, handler: F) -> Result<Self, JsValue>
    where
        F: FnMut(Event) + 'static,
    {
        let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback_and_bool(event, callback.as_ref().unchecked_ref(), capture)?;
        Ok(Self {
            target: target.clone(),
            event,
            capture,
            callback,
        })
    }

    /// Window-level listener, bubbling phase.
    pub fn on_window<F>(event: &'static str, handler: F) -> Option<Self>
    where
        F: FnMut(Event) + 'static,
    {
        let window = web_sys::window()?;
        match Self::new(&window, event, false, handler) {
            Ok(l) => Some(l),
            Err(e) => {
                log::warn!("could not listen for '{event}': {e:?}");
                None
            }
        }
    }
}

impl Drop for ScopedListener {
    fn drop(&mut self) {
        let _ = self.target.remove_event_listener_with_callback_and_bool(
            self.event,
            self.callback.as_ref().unchecked_ref(),
            self.capture,
        );
    }
}
