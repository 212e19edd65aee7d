use yew::prelude::*;

use crate::model::Page;

#[derive(Properties, PartialEq, Clone)]
pub struct NavBarProps {
    pub current: Page,
    pub on_navigate: Callback<Page>,
}

#[function_component(NavBar)]
pub fn nav_bar(props: &NavBarProps) -> Html {
    html! {
        <footer class="nav-bar">
            { for Page::ALL.iter().map(|&page| {
                let onclick = {
                    let cb = props.on_navigate.clone();
                    Callback::from(move |_: MouseEvent| cb.emit(page))
                };
                html! {
                    <button
                        class={classes!("page", (page == props.current).then_some("active"))}
                        aria-label={format!("Go to {}", page.title())}
                        {onclick}
                    >
                        { page.icon() }{" "}<span>{ page.title() }</span>
                    </button>
                }
            }) }
        </footer>
    }
}
