//! Leaflet bindings and the [`MapBackend`] built on them.
//!
//! Leaflet (global `L`) is loaded by `index.html`. Option objects are built
//! with serde and handed over through `JSON.parse`.

use std::collections::HashMap;
use std::rc::Rc;

use js_sys::{Array, Object, Reflect};
use serde::Serialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

use crate::error::MapError;
use crate::model::{LatLon, LayerDescriptor, LayerId, UserMarker, Viewport};
use crate::state::viewport::MapBackend;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(extends = js_sys::Object)]
    #[derive(Clone)]
    pub type LeafletMap;

    #[wasm_bindgen(catch, js_namespace = L, js_name = map)]
    fn create_map(container: &HtmlElement, options: &JsValue) -> Result<LeafletMap, JsValue>;
    #[wasm_bindgen(method, js_name = flyTo)]
    fn fly_to(this: &LeafletMap, center: &JsValue, zoom: f64, options: &JsValue);
    #[wasm_bindgen(method, js_name = invalidateSize)]
    fn invalidate_size(this: &LeafletMap);
    #[wasm_bindgen(method)]
    fn remove(this: &LeafletMap);
    #[wasm_bindgen(method)]
    fn on(this: &LeafletMap, event: &str, handler: &js_sys::Function);
    #[wasm_bindgen(method)]
    fn off(this: &LeafletMap, event: &str, handler: &js_sys::Function);
    #[wasm_bindgen(method, js_name = getCenter)]
    fn get_center(this: &LeafletMap) -> LeafletLatLng;
    #[wasm_bindgen(method, js_name = getZoom)]
    fn get_zoom(this: &LeafletMap) -> f64;

    #[wasm_bindgen(extends = js_sys::Object)]
    #[derive(Clone)]
    pub type LeafletLatLng;

    #[wasm_bindgen(method, getter)]
    fn lat(this: &LeafletLatLng) -> f64;
    #[wasm_bindgen(method, getter)]
    fn lng(this: &LeafletLatLng) -> f64;

    #[wasm_bindgen(extends = js_sys::Object)]
    #[derive(Clone)]
    pub type LeafletTileLayer;

    #[wasm_bindgen(catch, js_namespace = L, js_name = tileLayer)]
    fn create_tile_layer(url: &str, options: &JsValue) -> Result<LeafletTileLayer, JsValue>;
    #[wasm_bindgen(method, js_name = addTo)]
    fn add_to(this: &LeafletTileLayer, map: &LeafletMap);
    #[wasm_bindgen(method, js_name = remove)]
    fn remove_layer(this: &LeafletTileLayer);

    #[wasm_bindgen(extends = js_sys::Object)]
    #[derive(Clone)]
    pub type LeafletMarker;

    #[wasm_bindgen(catch, js_namespace = L, js_name = marker)]
    fn create_marker(at: &JsValue, options: &JsValue) -> Result<LeafletMarker, JsValue>;
    #[wasm_bindgen(method, js_name = addTo)]
    fn add_marker_to(this: &LeafletMarker, map: &LeafletMap);
    #[wasm_bindgen(method, js_name = setLatLng)]
    fn set_lat_lng(this: &LeafletMarker, at: &JsValue);
    #[wasm_bindgen(method, js_name = getElement)]
    fn get_element(this: &LeafletMarker) -> Option<HtmlElement>;
    #[wasm_bindgen(method, js_name = remove)]
    fn remove_marker(this: &LeafletMarker);

    #[wasm_bindgen(catch, js_namespace = L, js_name = divIcon)]
    fn div_icon(options: &JsValue) -> Result<JsValue, JsValue>;
}

const USER_MARKER_HTML: &str = concat!(
    r#"<div class="pulse-glow"></div><div class="pulse-ring"></div>"#,
    r#"<div class="pulse"></div><div class="pulse-static"></div>"#,
    r#"<div class="arrow-wrapper"><div class="arrow"></div></div>"#,
);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MapOptions {
    center: [f64; 2],
    zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
    zoom_control: bool,
    attribution_control: bool,
    prefer_canvas: bool,
    inertia: bool,
    zoom_snap: f64,
    wheel_debounce_time: u32,
    tap_tolerance: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TileOptions<'a> {
    attribution: &'a str,
    min_zoom: u8,
    max_zoom: u8,
    opacity: f64,
    keep_buffer: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IconOptions {
    class_name: &'static str,
    html: &'static str,
    icon_size: [u32; 2],
    icon_anchor: [u32; 2],
}

#[derive(Serialize)]
struct FlyOptions {
    animate: bool,
    duration: f64,
}

fn js_options<T: Serialize>(value: &T) -> Result<JsValue, MapError> {
    let text = serde_json::to_string(value).map_err(|e| MapError::Backend(e.to_string()))?;
    js_sys::JSON::parse(&text).map_err(js_err)
}

fn js_err(e: JsValue) -> MapError {
    MapError::Backend(e.as_string().unwrap_or_else(|| format!("{e:?}")))
}

fn lat_lng(at: LatLon) -> JsValue {
    Array::of2(&at.lat.into(), &at.lon.into()).into()
}

fn rotate_arrow(marker: &LeafletMarker, degrees: f64) {
    let Some(el) = marker.get_element() else {
        return;
    };
    if let Ok(Some(arrow)) = el.query_selector(".arrow") {
        if let Ok(arrow) = arrow.dyn_into::<HtmlElement>() {
            let _ = arrow
                .style()
                .set_property("transform", &format!("rotate({degrees}deg) translate(-50%, -50%)"));
        }
    }
}

type MoveSink = Rc<dyn Fn(LatLon, f64)>;

#[derive(Default)]
pub struct LeafletBackend {
    map: Option<LeafletMap>,
    layers: HashMap<LayerId, LeafletTileLayer>,
    marker: Option<LeafletMarker>,
    move_sink: Option<MoveSink>,
    on_move: Option<Closure<dyn FnMut()>>,
}

impl LeafletBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports the center and zoom after every user pan or zoom.
    pub fn with_move_handler(mut self, sink: impl Fn(LatLon, f64) + 'static) -> Self {
        self.move_sink = Some(Rc::new(sink));
        self
    }

    fn map(&self) -> Result<&LeafletMap, MapError> {
        self.map.as_ref().ok_or(MapError::NotMounted)
    }
}

impl MapBackend for LeafletBackend {
    type Container = HtmlElement;

    fn mount(&mut self, container: &HtmlElement, viewport: &Viewport) -> Result<(), MapError> {
        let options = js_options(&MapOptions {
            center: [viewport.center.lat, viewport.center.lon],
            zoom: viewport.zoom,
            min_zoom: viewport.min_zoom,
            max_zoom: viewport.max_zoom,
            zoom_control: true,
            attribution_control: false,
            prefer_canvas: true,
            inertia: true,
            zoom_snap: 0.5,
            wheel_debounce_time: 100,
            tap_tolerance: 15,
        })?;
        let map = create_map(container, &options).map_err(js_err)?;
        if let Some(sink) = self.move_sink.clone() {
            let source = map.clone();
            let on_move = Closure::wrap(Box::new(move || {
                let c = source.get_center();
                sink(LatLon::new(c.lat(), c.lng()), source.get_zoom());
            }) as Box<dyn FnMut()>);
            map.on("moveend", on_move.as_ref().unchecked_ref());
            self.on_move = Some(on_move);
        }
        self.map = Some(map);
        Ok(())
    }

    fn attach_layer(&mut self, layer: &LayerDescriptor) -> Result<(), MapError> {
        let map = self.map()?.clone();
        if !self.layers.contains_key(&layer.id) {
            let options = js_options(&TileOptions {
                attribution: &layer.attribution,
                min_zoom: layer.min_zoom,
                max_zoom: layer.max_zoom,
                opacity: layer.opacity,
                keep_buffer: 5,
            })?;
            let tiles = create_tile_layer(&layer.url_template, &options).map_err(js_err)?;
            self.layers.insert(layer.id.clone(), tiles);
        }
        if let Some(tiles) = self.layers.get(&layer.id) {
            tiles.add_to(&map);
        }
        Ok(())
    }

    fn detach_layer(&mut self, layer: &LayerDescriptor) {
        if let Some(tiles) = self.layers.get(&layer.id) {
            tiles.remove_layer();
        }
    }

    fn fly_to(&mut self, center: LatLon, zoom: f64, duration_secs: f64) {
        let Ok(map) = self.map() else {
            return;
        };
        match js_options(&FlyOptions {
            animate: duration_secs > 0.0,
            duration: duration_secs,
        }) {
            Ok(options) => map.fly_to(&lat_lng(center), zoom, &options),
            Err(e) => log::warn!("flyTo skipped: {e}"),
        }
    }

    fn invalidate_size(&mut self) {
        if let Ok(map) = self.map() {
            map.invalidate_size();
        }
    }

    fn place_marker(&mut self, marker: &UserMarker) -> Result<(), MapError> {
        let map = self.map()?;
        let icon = div_icon(&js_options(&IconOptions {
            class_name: "user-location-marker",
            html: USER_MARKER_HTML,
            icon_size: [50, 50],
            icon_anchor: [25, 25],
        })?)
        .map_err(js_err)?;
        let options = Object::new();
        Reflect::set(&options, &JsValue::from_str("icon"), &icon).map_err(js_err)?;
        let m = create_marker(&lat_lng(marker.position), &options).map_err(js_err)?;
        m.add_marker_to(map);
        rotate_arrow(&m, marker.rotation_degrees);
        self.marker = Some(m);
        Ok(())
    }

    fn update_marker(&mut self, marker: &UserMarker) {
        if let Some(m) = &self.marker {
            m.set_lat_lng(&lat_lng(marker.position));
            rotate_arrow(m, marker.rotation_degrees);
        }
    }

    fn remove_marker(&mut self) {
        if let Some(m) = self.marker.take() {
            m.remove_marker();
        }
    }

    fn unmount(&mut self) {
        if let Some(map) = self.map.take() {
            if let Some(on_move) = self.on_move.take() {
                map.off("moveend", on_move.as_ref().unchecked_ref());
            }
            map.remove();
        }
        self.layers.clear();
        self.marker = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_clone<T: Clone>() {}

    #[test]
    fn leaflet_handles_are_cloneable() {
        assert_clone::<LeafletMap>();
        assert_clone::<LeafletLatLng>();
        assert_clone::<LeafletTileLayer>();
        assert_clone::<LeafletMarker>();
    }

    #[test]
    fn option_objects_use_leaflet_names() {
        let tiles = serde_json::to_value(TileOptions {
            attribution: "BLM",
            min_zoom: 0,
            max_zoom: 16,
            opacity: 0.5,
            keep_buffer: 5,
        })
        .unwrap();
        assert_eq!(tiles["maxZoom"], 16);
        assert_eq!(tiles["keepBuffer"], 5);
        let icon = serde_json::to_value(IconOptions {
            class_name: "user-location-marker",
            html: USER_MARKER_HTML,
            icon_size: [50, 50],
            icon_anchor: [25, 25],
        })
        .unwrap();
        assert_eq!(icon["className"], "user-location-marker");
        assert_eq!(icon["iconAnchor"][0], 25);
    }
}
