use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use yew::prelude::*;

const TICK_MS: i32 = 30;

/// Next bar value, or `None` once the bar is full.
fn advance(progress: u32) -> Option<u32> {
    (progress < 100).then_some(progress + 1)
}

#[function_component(LoadingScreen)]
pub fn loading_screen() -> Html {
    let progress = use_state(|| 0u32);
    {
        let progress = progress.clone();
        use_effect_with((), move |_| {
            let window = web_sys::window();
            let counter = Rc::new(Cell::new(0u32));
            let interval = Rc::new(Cell::new(None::<i32>));
            let tick = {
                let window = window.clone();
                let interval = interval.clone();
                Closure::wrap(Box::new(move || match advance(counter.get()) {
                    Some(next) => {
                        counter.set(next);
                        progress.set(next);
                    }
                    None => {
                        if let (Some(w), Some(id)) = (window.as_ref(), interval.take()) {
                            w.clear_interval_with_handle(id);
                        }
                    }
                }) as Box<dyn FnMut()>)
            };
            interval.set(window.as_ref().and_then(|w| {
                w.set_interval_with_callback_and_timeout_and_arguments_0(tick.as_ref().unchecked_ref(), TICK_MS)
                    .ok()
            }));
            move || {
                if let (Some(w), Some(id)) = (window, interval.take()) {
                    w.clear_interval_with_handle(id);
                }
                drop(tick);
            }
        });
    }

    html! {
        <div class="loading-screen">
            <div class="loading-bar-container">
                <div class="loading-bar" style={format!("width: {}%;", *progress)}></div>
            </div>
            <img class="van-image" src="images/astrovan.png" alt="Van" />
            <h1 class="loading-text">{ "HUMBLE NOMAD" }</h1>
            {
                if *progress < 100 {
                    html! { <div class="loading-fallback"><div class="spinner"></div></div> }
                } else {
                    html! {}
                }
            }
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_stops_at_full() {
        assert_eq!(advance(0), Some(1));
        assert_eq!(advance(99), Some(100));
        assert_eq!(advance(100), None);
    }
}
