use web_sys::HtmlInputElement;
use yew::prelude::*;

#[function_component(SearchBar)]
pub fn search_bar() -> Html {
    let term = use_state(String::new);

    let oninput = {
        let term = term.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            term.set(input.value());
        })
    };
    let clear = {
        let term = term.clone();
        Callback::from(move |_: MouseEvent| term.set(String::new()))
    };

    html! {
        <div class="search-bar">
            <input
                type="text"
                class="search-bar-input"
                placeholder="Search for a campsite..."
                value={(*term).clone()}
                {oninput}
            />
            {
                if term.is_empty() {
                    html! {}
                } else {
                    html! { <button class="clear-btn" onclick={clear}>{ "❌" }</button> }
                }
            }
        </div>
    }
}
