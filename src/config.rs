//! Map screen configuration.
//!
//! Defaults are compiled in. A JSON object stored under
//! [`CONFIG_STORAGE_KEY`] in localStorage overrides any subset of fields.

use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::MapError;
use crate::model::{LatLon, LayerDescriptor, LayerId, LocationOptions, Viewport};
use crate::state::marker::FollowSettings;
use crate::state::registry::TileLayerRegistry;

pub const CONFIG_STORAGE_KEY: &str = "hn_map_config";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Zoom used when centering on the user.
    pub locate_zoom: f64,
    pub fly_duration_secs: f64,
    /// Keep panning to each new fix while tracking.
    pub follow_user: bool,
    pub location: LocationOptions,
    pub loading_screen_ms: u32,
    pub extra_layers: Vec<LayerDescriptor>,
    /// Replacement tile URL templates keyed by layer id.
    pub layer_urls: BTreeMap<LayerId, String>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_lat: 37.7749,
            center_lon: -122.4194,
            zoom: 10.0,
            min_zoom: 3.0,
            max_zoom: 18.0,
            locate_zoom: 15.0,
            fly_duration_secs: 1.5,
            follow_user: true,
            location: LocationOptions::default(),
            loading_screen_ms: 3000,
            extra_layers: Vec::new(),
            layer_urls: BTreeMap::new(),
        }
    }
}

impl MapConfig {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Reads the localStorage override, falling back to defaults.
    pub fn load() -> Self {
        if let Some(win) = web_sys::window() {
            if let Ok(Some(store)) = win.local_storage() {
                if let Ok(Some(raw)) = store.get_item(CONFIG_STORAGE_KEY) {
                    match Self::from_json(&raw) {
                        Ok(cfg) => return cfg,
                        Err(e) => log::warn!("ignoring malformed {CONFIG_STORAGE_KEY}: {e}"),
                    }
                }
            }
        }
        Self::default()
    }

    pub fn initial_viewport(&self) -> Result<Viewport, MapError> {
        Viewport::new(
            LatLon::new(self.center_lat, self.center_lon),
            self.zoom,
            self.min_zoom,
            self.max_zoom,
        )
    }

    pub fn follow(&self) -> FollowSettings {
        FollowSettings {
            enabled: self.follow_user,
            zoom: self.locate_zoom,
            duration_secs: self.fly_duration_secs,
        }
    }

    /// Built-in layers plus `extra_layers`, with `layer_urls` applied. A bad
    /// set is logged and dropped.
    pub fn registry(&self) -> Rc<TileLayerRegistry> {
        match TileLayerRegistry::with_builtin(self.extra_layers.clone(), &self.layer_urls) {
            Ok(reg) => Rc::new(reg),
            Err(e) => {
                log::error!("extra layers rejected: {e}");
                Rc::new(TileLayerRegistry::builtin())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LayerCategory;

    #[test]
    fn defaults_form_valid_viewport() {
        let cfg = MapConfig::default();
        let v = cfg.initial_viewport().unwrap();
        assert_eq!(v.zoom, 10.0);
        assert_eq!(v.min_zoom, 3.0);
        assert!(cfg.location.high_accuracy);
        assert_eq!(cfg.location.timeout_ms, 10_000);
    }

    #[test]
    fn partial_override() {
        let cfg = MapConfig::from_json(
            r#"{"zoom": 12, "follow_user": false, "location": {"timeout_ms": 5000}, "unknown": 1}"#,
        )
        .unwrap();
        assert_eq!(cfg.zoom, 12.0);
        assert!(!cfg.follow_user);
        assert_eq!(cfg.location.timeout_ms, 5000);
        assert!(cfg.location.high_accuracy);
        assert_eq!(cfg.center_lat, 37.7749);
    }

    #[test]
    fn malformed_json_is_error() {
        assert!(MapConfig::from_json("{zoom:").is_err());
    }

    #[test]
    fn extra_layers_join_registry() {
        let cfg = MapConfig::from_json(
            r#"{"extra_layers": [{"id": "smoke", "label": "Smoke", "category": "overlay",
                "url_template": "https://example.org/{z}/{x}/{y}.png", "attribution": "NOAA"}]}"#,
        )
        .unwrap();
        let reg = cfg.registry();
        let smoke = reg.get("smoke").unwrap();
        assert_eq!(smoke.category, LayerCategory::Overlay);
        assert_eq!(smoke.max_zoom, 19);
        assert_eq!(smoke.opacity, 1.0);
    }

    #[test]
    fn conflicting_extra_layers_fall_back_to_builtin() {
        let mut cfg = MapConfig::default();
        cfg.extra_layers = vec![TileLayerRegistry::builtin().get("osm").unwrap().clone()];
        let reg = cfg.registry();
        assert_eq!(reg.iter().count(), TileLayerRegistry::builtin().iter().count());
    }

    #[test]
    fn layer_url_override_applies() {
        let cfg = MapConfig::from_json(
            r#"{"layer_urls": {"verizon": "https://coverage.example.org/vzw/{z}/{x}/{y}.png"}}"#,
        )
        .unwrap();
        let reg = cfg.registry();
        assert_eq!(
            reg.get("verizon").unwrap().url_template,
            "https://coverage.example.org/vzw/{z}/{x}/{y}.png"
        );
    }

    #[test]
    fn out_of_range_zoom_rejected() {
        let cfg = MapConfig {
            zoom: 30.0,
            ..MapConfig::default()
        };
        assert!(cfg.initial_viewport().is_err());
    }
}
