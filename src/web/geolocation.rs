// `navigator.geolocation` as a LocationPlatform.
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use js_sys::{Function, Reflect};
use serde::Serialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use crate::error::LocationError;
use crate::model::{LatLon, LocationOptions, UserLocationSample};
use crate::state::geolocation::{LocationPlatform, OnceCallback, SampleCallback, WatchId};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(extends = js_sys::Object)]
    type GeolocationApi;

    #[wasm_bindgen(catch, method, js_name = getCurrentPosition)]
    fn get_current_position(
        this: &GeolocationApi,
        on_position: &Function,
        on_error: &Function,
        options: &JsValue,
    ) -> Result<(), JsValue>;
    #[wasm_bindgen(catch, method, js_name = watchPosition)]
    fn watch_position(
        this: &GeolocationApi,
        on_position: &Function,
        on_error: &Function,
        options: &JsValue,
    ) -> Result<WatchId, JsValue>;
    #[wasm_bindgen(method, js_name = clearWatch)]
    fn clear_watch(this: &GeolocationApi, id: WatchId);

    #[wasm_bindgen(extends = js_sys::Object)]
    type Position;

    #[wasm_bindgen(method, getter)]
    fn coords(this: &Position) -> Coordinates;
    #[wasm_bindgen(method, getter)]
    fn timestamp(this: &Position) -> f64;

    #[wasm_bindgen(extends = js_sys::Object)]
    type Coordinates;

    #[wasm_bindgen(method, getter)]
    fn latitude(this: &Coordinates) -> f64;
    #[wasm_bindgen(method, getter)]
    fn longitude(this: &Coordinates) -> f64;
    #[wasm_bindgen(method, getter)]
    fn accuracy(this: &Coordinates) -> f64;
    #[wasm_bindgen(method, getter)]
    fn heading(this: &Coordinates) -> Option<f64>;

    #[wasm_bindgen(extends = js_sys::Object)]
    type PositionError;

    #[wasm_bindgen(method, getter)]
    fn code(this: &PositionError) -> u16;
}

const PERMISSION_DENIED: u16 = 1;
const TIMEOUT: u16 = 3;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PositionOptions {
    enable_high_accuracy: bool,
    maximum_age: u32,
    timeout: u32,
}

impl From<&LocationOptions> for PositionOptions {
    fn from(options: &LocationOptions) -> Self {
        Self {
            enable_high_accuracy: options.high_accuracy,
            maximum_age: options.max_sample_age_ms,
            timeout: options.timeout_ms,
        }
    }
}

fn position_options(options: &LocationOptions) -> JsValue {
    serde_json::to_string(&PositionOptions::from(options))
        .ok()
        .and_then(|text| js_sys::JSON::parse(&text).ok())
        .unwrap_or(JsValue::UNDEFINED)
}

fn error_from_code(code: u16) -> LocationError {
    match code {
        PERMISSION_DENIED => LocationError::PermissionDenied,
        TIMEOUT => LocationError::Timeout,
        _ => LocationError::PositionUnavailable,
    }
}

fn to_sample(pos: &JsValue) -> Option<UserLocationSample> {
    if !pos.is_object() {
        return None;
    }
    let pos: &Position = pos.unchecked_ref();
    let c = pos.coords();
    Some(UserLocationSample {
        position: LatLon::new(c.latitude(), c.longitude()),
        heading_degrees: c.heading().filter(|h| h.is_finite()),
        accuracy_m: c.accuracy(),
        timestamp_ms: pos.timestamp(),
    })
}

fn to_result(pos: &JsValue) -> Result<UserLocationSample, LocationError> {
    to_sample(pos).ok_or(LocationError::PositionUnavailable)
}

fn to_error(err: &JsValue) -> LocationError {
    if !err.is_object() {
        return LocationError::PositionUnavailable;
    }
    error_from_code(err.unchecked_ref::<PositionError>().code())
}

struct WatchClosures {
    _on_position: Closure<dyn FnMut(JsValue)>,
    _on_error: Closure<dyn FnMut(JsValue)>,
}

pub struct BrowserGeolocation {
    geolocation: Option<GeolocationApi>,
    watches: HashMap<WatchId, WatchClosures>,
}

impl BrowserGeolocation {
    pub fn new() -> Self {
        let geolocation = web_sys::window()
            .and_then(|w| Reflect::get(&w.navigator(), &JsValue::from_str("geolocation")).ok())
            .filter(|g| !g.is_undefined() && !g.is_null())
            .map(|g| g.unchecked_into::<GeolocationApi>());
        Self {
            geolocation,
            watches: HashMap::new(),
        }
    }
}

impl LocationPlatform for BrowserGeolocation {
    fn is_supported(&self) -> bool {
        self.geolocation.is_some()
    }

    fn request_once(&mut self, options: &LocationOptions, callback: OnceCallback) -> Result<(), LocationError> {
        let geo = self.geolocation.as_ref().ok_or(LocationError::Unsupported)?;
        // Exactly one of the two fires; both share the callback slot.
        let slot = Rc::new(RefCell::new(Some(callback)));
        let ok_slot = slot.clone();
        let on_position = Closure::once_into_js(move |pos: JsValue| {
            if let Some(cb) = ok_slot.borrow_mut().take() {
                cb(to_result(&pos));
            }
        });
        let on_error = Closure::once_into_js(move |err: JsValue| {
            if let Some(cb) = slot.borrow_mut().take() {
                cb(Err(to_error(&err)));
            }
        });
        geo.get_current_position(
            on_position.unchecked_ref(),
            on_error.unchecked_ref(),
            &position_options(options),
        )
        .map_err(|e| {
            log::error!("getCurrentPosition failed: {e:?}");
            LocationError::PositionUnavailable
        })
    }

    fn watch(&mut self, options: &LocationOptions, callback: SampleCallback) -> Result<WatchId, LocationError> {
        let geo = self.geolocation.as_ref().ok_or(LocationError::Unsupported)?;
        let ok_cb = callback.clone();
        let on_position = Closure::wrap(Box::new(move |pos: JsValue| {
            ok_cb(to_result(&pos));
        }) as Box<dyn FnMut(JsValue)>);
        let on_error = Closure::wrap(Box::new(move |err: JsValue| {
            callback(Err(to_error(&err)));
        }) as Box<dyn FnMut(JsValue)>);
        let id = geo
            .watch_position(
                on_position.as_ref().unchecked_ref(),
                on_error.as_ref().unchecked_ref(),
                &position_options(options),
            )
            .map_err(|e| {
                log::error!("watchPosition failed: {e:?}");
                LocationError::PositionUnavailable
            })?;
        self.watches.insert(
            id,
            WatchClosures {
                _on_position: on_position,
                _on_error: on_error,
            },
        );
        Ok(id)
    }

    fn clear_watch(&mut self, id: WatchId) {
        if let Some(geo) = &self.geolocation {
            geo.clear_watch(id);
        }
        self.watches.remove(&id);
    }
}
