use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wasm_bindgen::JsCast;
use web_sys::{DeviceOrientationEvent, HtmlElement, KeyboardEvent, Node};
use yew::prelude::*;

use super::layer_menu::LayerMenu;
use crate::config::MapConfig;
use crate::error::MapError;
use crate::model::{LayerId, MapNotice, UserLocationSample};
use crate::state::geolocation::{LocationResult, SampleCallback};
use crate::state::{LayerMenuAction, LayerMenuState, MapScreen};
use crate::web::{BrowserGeolocation, LeafletBackend, ScopedListener};

type Screen = MapScreen<LeafletBackend, BrowserGeolocation>;
type ScreenCell = RefCell<Option<Screen>>;

#[derive(Properties, PartialEq, Clone)]
pub struct MapViewProps {
    pub config: MapConfig,
}

// Platform and Leaflet events can land while the screen is mid-update; those
// are skipped rather than panicking on a double borrow.
fn with_screen<R>(cell: &ScreenCell, f: impl FnOnce(&mut Screen) -> R) -> Option<R> {
    let mut guard = cell.try_borrow_mut().ok()?;
    guard.as_mut().map(f)
}

fn location_sink(cell: Weak<ScreenCell>, redraw: UseForceUpdateHandle) -> SampleCallback {
    Rc::new(move |result: LocationResult| {
        if let Some(cell) = cell.upgrade() {
            with_screen(&cell, |s| s.apply_location(result));
            redraw.force_update();
        }
    })
}

#[derive(Default)]
struct Snapshot {
    attached: Vec<LayerId>,
    attributions: Vec<String>,
    notice: Option<MapNotice>,
    fix: Option<UserLocationSample>,
    missing_base: bool,
    tracking: bool,
}

fn snapshot(cell: &ScreenCell) -> Snapshot {
    let Ok(guard) = cell.try_borrow() else {
        return Snapshot::default();
    };
    let Some(s) = guard.as_ref() else {
        return Snapshot::default();
    };
    Snapshot {
        attached: s.layers().attached_ids().map(str::to_string).collect(),
        attributions: s.attributions(),
        notice: s.notice().cloned(),
        fix: s.user_marker().and(s.last_fix()).copied(),
        missing_base: s.is_mounted() && s.layers().active_base().is_none(),
        tracking: s.is_tracking(),
    }
}

#[function_component(MapView)]
pub fn map_view(props: &MapViewProps) -> Html {
    let container_ref = use_node_ref();
    let menu_ref = use_node_ref();
    let trigger_ref = use_node_ref();
    let registry = use_memo(props.config.clone(), |cfg| cfg.registry());
    let screen = use_mut_ref(|| None::<Screen>);
    let menu = use_reducer(LayerMenuState::default);
    let redraw = use_force_update();

    // Mount: create the map, then window listeners. Cleanup runs on every
    // unmount path and tears both down.
    {
        let container_ref = container_ref.clone();
        let screen = screen.clone();
        let redraw = redraw.clone();
        let registry = (*registry).clone();
        let config = props.config.clone();
        use_effect_with((), move |_| {
            let weak = Rc::downgrade(&screen);
            let backend = {
                let weak = weak.clone();
                LeafletBackend::new().with_move_handler(move |center, zoom| {
                    if let Some(cell) = weak.upgrade() {
                        with_screen(&cell, |s| s.sync_view(center, zoom));
                    }
                })
            };
            let mut map_screen = MapScreen::new(config, registry, backend, BrowserGeolocation::new());
            match container_ref.cast::<HtmlElement>() {
                Some(el) => {
                    if let Err(e) = map_screen.mount(&el) {
                        log::error!("map failed to mount: {e}");
                    }
                }
                None => log::error!("map container element missing"),
            }
            *screen.borrow_mut() = Some(map_screen);
            redraw.force_update();

            let resize = {
                let weak = weak.clone();
                ScopedListener::on_window("resize", move |_| {
                    if let Some(cell) = weak.upgrade() {
                        with_screen(&cell, |s| s.invalidate_size());
                    }
                })
            };
            let orientation = ScopedListener::on_window("deviceorientation", move |e| {
                let heading = e.dyn_ref::<DeviceOrientationEvent>().and_then(|o| o.alpha());
                if let Some(cell) = weak.upgrade() {
                    with_screen(&cell, |s| s.apply_heading(heading));
                }
            });

            move || {
                drop(resize);
                drop(orientation);
                let taken = screen.borrow_mut().take();
                if let Some(mut s) = taken {
                    s.unmount();
                }
            }
        });
    }

    // Outside-click and Escape dismissal; the listeners only exist while open.
    {
        let open = menu.open;
        let dispatcher = menu.dispatcher();
        let menu_ref = menu_ref.clone();
        let trigger_ref = trigger_ref.clone();
        use_effect_with(open, move |open| {
            let mut guards = Vec::new();
            let document = web_sys::window().and_then(|w| w.document());
            if let (true, Some(doc)) = (*open, document) {
                let on_pointer = {
                    let dispatcher = dispatcher.clone();
                    ScopedListener::new(&doc, "pointerdown", true, move |e| {
                        let target = e.target().and_then(|t| t.dyn_into::<Node>().ok());
                        let inside = [&menu_ref, &trigger_ref]
                            .iter()
                            .any(|r| r.get().is_some_and(|el| el.contains(target.as_ref())));
                        dispatcher.dispatch(LayerMenuAction::PointerDown { inside });
                    })
                };
                let on_key = ScopedListener::new(&doc, "keydown", false, move |e| {
                    if e.dyn_ref::<KeyboardEvent>().is_some_and(|k| k.key() == "Escape") {
                        dispatcher.dispatch(LayerMenuAction::Close);
                    }
                });
                for listener in [on_pointer, on_key] {
                    match listener {
                        Ok(l) => guards.push(l),
                        Err(e) => log::warn!("layer menu listener failed: {e:?}"),
                    }
                }
            }
            move || drop(guards)
        });
    }

    let on_locate = {
        let screen = screen.clone();
        let redraw = redraw.clone();
        Callback::from(move |_: MouseEvent| {
            let sink = location_sink(Rc::downgrade(&screen), redraw.clone());
            with_screen(&screen, |s| s.locate_once(Box::new(move |r| sink(r))));
            redraw.force_update();
        })
    };
    let on_track = {
        let screen = screen.clone();
        let redraw = redraw.clone();
        Callback::from(move |_: MouseEvent| {
            let sink = location_sink(Rc::downgrade(&screen), redraw.clone());
            with_screen(&screen, |s| {
                if s.is_tracking() {
                    s.stop_tracking();
                } else {
                    s.start_tracking(sink);
                }
            });
            redraw.force_update();
        })
    };
    let on_toggle_layer = {
        let screen = screen.clone();
        let redraw = redraw.clone();
        Callback::from(move |id: LayerId| {
            match with_screen(&screen, |s| s.toggle_layer(&id)) {
                Some(Err(MapError::UnknownLayer(id))) => {
                    debug_assert!(false, "layer menu offered unregistered layer '{id}'");
                    log::error!("unknown layer '{id}'");
                }
                Some(Err(e)) => log::warn!("layer toggle failed: {e}"),
                _ => {}
            }
            redraw.force_update();
        })
    };
    let on_menu_button = {
        let menu = menu.clone();
        Callback::from(move |_: MouseEvent| menu.dispatch(LayerMenuAction::Toggle))
    };
    let on_dismiss = {
        let screen = screen.clone();
        let redraw = redraw.clone();
        Callback::from(move |_: MouseEvent| {
            with_screen(&screen, |s| s.dismiss_notice());
            redraw.force_update();
        })
    };

    let snap = snapshot(&screen);

    html! {
        <div class="map-screen">
            <div id="map" ref={container_ref} style="height: 100vh; width: 100%;" />

            <button onclick={on_locate} class="location-button" title="Show my location">
                <img src="images/mapmarkers/blue-gps-icon.png" alt="Location Icon" width="40" height="40" />
            </button>
            <button onclick={on_track} class={classes!("track-button", snap.tracking.then_some("active"))}>
                { if snap.tracking { "Stop tracking" } else { "Track me" } }
            </button>
            <button ref={trigger_ref} onclick={on_menu_button} class="layers-button">
                <img src="images/layersmenu/blue-layers-icon.png" alt="Layers Icon" width="40" height="40" />
            </button>

            <LayerMenu
                open={menu.open}
                menu_ref={menu_ref}
                registry={(*registry).clone()}
                attached={snap.attached}
                on_toggle={on_toggle_layer}
            />

            {
                if let Some(fix) = snap.fix {
                    html! {
                        <div class="location-info">
                            { format!("Your location: {:.4}, {:.4} (±{:.0} m)", fix.position.lat, fix.position.lon, fix.accuracy_m) }
                        </div>
                    }
                } else {
                    html! {}
                }
            }
            if snap.missing_base {
                <div class="map-hint">{ "No map view selected" }</div>
            }
            {
                if let Some(notice) = snap.notice {
                    html! {
                        <div class="map-notice" role="alert">
                            <span>{ notice.message() }</span>
                            <button onclick={on_dismiss}>{ "×" }</button>
                        </div>
                    }
                } else {
                    html! {}
                }
            }
            <div class="map-attribution">
                { for snap.attributions.into_iter().map(|a| Html::from_html_unchecked(AttrValue::from(a))) }
            </div>
        </div>
    }
}
