use std::rc::Rc;
use yew::prelude::*;

use crate::model::LayerId;
use crate::state::TileLayerRegistry;

// Preview tile over the western US.
const PREVIEW_ZOOM: u8 = 3;
const PREVIEW_X: u32 = 1;
const PREVIEW_Y: u32 = 3;

#[derive(Properties, PartialEq, Clone)]
pub struct LayerMenuProps {
    pub open: bool,
    pub menu_ref: NodeRef,
    pub registry: Rc<TileLayerRegistry>,
    pub attached: Vec<LayerId>,
    pub on_toggle: Callback<LayerId>,
}

#[function_component(LayerMenu)]
pub fn layer_menu(props: &LayerMenuProps) -> Html {
    let sections = props.registry.menu_sections().into_iter().map(|(title, layers)| {
        let items = layers.into_iter().map(|layer| {
            let selected = props.attached.contains(&layer.id);
            let onclick = {
                let cb = props.on_toggle.clone();
                let id = layer.id.clone();
                Callback::from(move |_: MouseEvent| cb.emit(id.clone()))
            };
            html! {
                <div key={layer.id.clone()} class="layer-icon-container" {onclick}>
                    <img
                        src={layer.tile_url(PREVIEW_ZOOM, PREVIEW_X, PREVIEW_Y)}
                        alt={layer.label.clone()}
                        class={classes!("layer-icon", selected.then_some("selected"))}
                    />
                    <p class="layer-icon-text">{ layer.label.clone() }</p>
                </div>
            }
        });
        html! {
            <div class="menu-section" key={title.to_string()}>
                <div class="layer-menu-title">{ title }</div>
                <div class="layer-grid">{ for items }</div>
            </div>
        }
    });

    html! {
        <div ref={props.menu_ref.clone()} class={classes!("layer-menu", props.open.then_some("open"))}>
            { for sections }
        </div>
    }
}
