//! Core data models for the Humble Nomad map screen.

use serde::{Deserialize, Serialize};

use crate::error::MapError;

/// Identifier of a tile layer in the registry.
pub type LayerId = String;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Visible center/zoom state of the map.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: LatLon,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Viewport {
    /// Builds a viewport, rejecting `zoom` outside `min_zoom..=max_zoom`.
    pub fn new(center: LatLon, zoom: f64, min_zoom: f64, max_zoom: f64) -> Result<Self, MapError> {
        if !(min_zoom <= zoom && zoom <= max_zoom) || !center.is_valid() {
            return Err(MapError::InvalidViewport {
                zoom,
                min_zoom,
                max_zoom,
            });
        }
        Ok(Self {
            center,
            zoom,
            min_zoom,
            max_zoom,
        })
    }

    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerCategory {
    /// Full-coverage background; mutually exclusive with other base layers.
    Base,
    /// Partial or semi-transparent layer drawn above the base.
    Overlay,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    pub id: LayerId,
    pub label: String,
    pub category: LayerCategory,
    /// Template with `{s}`, `{z}`, `{x}` and `{y}` placeholders.
    pub url_template: String,
    pub attribution: String,
    #[serde(default)]
    pub min_zoom: u8,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: u8,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Layer menu heading for overlays; `None` lists it under "Overlays".
    #[serde(default)]
    pub section: Option<String>,
}

fn default_max_zoom() -> u8 {
    19
}

fn default_opacity() -> f64 {
    1.0
}

const SUBDOMAINS: [&str; 3] = ["a", "b", "c"];

impl LayerDescriptor {
    pub fn is_base(&self) -> bool {
        self.category == LayerCategory::Base
    }

    /// Expands the URL template for one tile.
    pub fn tile_url(&self, z: u8, x: u32, y: u32) -> String {
        let sub = SUBDOMAINS[((x as usize) + (y as usize)) % SUBDOMAINS.len()];
        self.url_template
            .replace("{s}", sub)
            .replace("{z}", &z.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }
}

/// One geolocation/heading reading.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserLocationSample {
    pub position: LatLon,
    /// Degrees clockwise from north; `None` when the platform has no heading.
    pub heading_degrees: Option<f64>,
    pub accuracy_m: f64,
    /// Platform timestamp in milliseconds; non-decreasing within a watch.
    pub timestamp_ms: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserMarker {
    pub position: LatLon,
    pub rotation_degrees: f64,
}

/// Options handed to the platform location stack.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationOptions {
    pub high_accuracy: bool,
    pub max_sample_age_ms: u32,
    pub timeout_ms: u32,
}

impl Default for LocationOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            max_sample_age_ms: 0,
            timeout_ms: 10_000,
        }
    }
}

/// Non-blocking, user-visible notices raised by the map screen.
#[derive(Clone, Debug, PartialEq)]
pub enum MapNotice {
    LocationUnavailable(crate::error::LocationError),
}

impl MapNotice {
    pub fn message(&self) -> String {
        match self {
            MapNotice::LocationUnavailable(reason) => {
                format!("Unable to retrieve your location: {reason}")
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    Campsite,
    Favorites,
    Dashboard,
    Forums,
    Profile,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Campsite,
        Page::Favorites,
        Page::Dashboard,
        Page::Forums,
        Page::Profile,
    ];

    pub fn icon(self) -> &'static str {
        match self {
            Page::Campsite => "🏕️",
            Page::Favorites => "❤️",
            Page::Dashboard => "🛖",
            Page::Forums => "🗯️",
            Page::Profile => "🪪",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Page::Campsite => "Campsite",
            Page::Favorites => "Favs",
            Page::Dashboard => "Dashboard",
            Page::Forums => "Forums",
            Page::Profile => "Profile",
        }
    }
}
