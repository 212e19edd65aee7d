use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use yew::prelude::*;

use super::{
    loading_screen::LoadingScreen, map_view::MapView, nav_bar::NavBar, search_bar::SearchBar,
    sidebar::{HamburgerMenu, Sidebar},
};
use crate::config::MapConfig;
use crate::model::Page;

#[function_component(App)]
pub fn app() -> Html {
    let config = use_memo((), |_| MapConfig::load());
    let loading = use_state(|| true);
    let page = use_state(|| Page::Campsite);
    let sidebar_open = use_state(|| false);

    // Splash screen timer
    {
        let loading = loading.clone();
        let delay = config.loading_screen_ms;
        use_effect_with((), move |_| {
            let done = Closure::wrap(Box::new(move || loading.set(false)) as Box<dyn FnMut()>);
            let window = web_sys::window();
            let id = window.as_ref().and_then(|w| {
                w.set_timeout_with_callback_and_timeout_and_arguments_0(
                    done.as_ref().unchecked_ref(),
                    delay.min(i32::MAX as u32) as i32,
                )
                .ok()
            });
            move || {
                if let (Some(w), Some(id)) = (window, id) {
                    w.clear_timeout_with_handle(id);
                }
                drop(done);
            }
        });
    }

    if *loading {
        return html! { <LoadingScreen /> };
    }

    let navigate = {
        let page = page.clone();
        let sidebar_open = sidebar_open.clone();
        Callback::from(move |p: Page| {
            log::debug!("navigating to {p:?}");
            page.set(p);
            sidebar_open.set(false);
        })
    };
    let toggle_sidebar = {
        let sidebar_open = sidebar_open.clone();
        Callback::from(move |_: ()| sidebar_open.set(!*sidebar_open))
    };

    let content = match *page {
        Page::Campsite => html! { <MapView config={(*config).clone()} /> },
        other => html! {
            <section class="page-placeholder">
                <h2>{ format!("{} {}", other.icon(), other.title()) }</h2>
                <p>{ "Coming soon." }</p>
            </section>
        },
    };

    html! {
        <div class="App">
            <nav class="top-nav">
                <HamburgerMenu open={*sidebar_open} on_toggle={toggle_sidebar.clone()} />
                <SearchBar />
            </nav>
            <Sidebar open={*sidebar_open} current={*page} on_navigate={navigate.clone()} on_close={toggle_sidebar} />
            <main>{ content }</main>
            <NavBar current={*page} on_navigate={navigate} />
        </div>
    }
}
