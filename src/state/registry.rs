// Catalog of every tile layer the map can show.
use std::collections::{BTreeMap, HashSet};

use crate::error::MapError;
use crate::model::{LayerCategory, LayerDescriptor, LayerId};

const OSM_ATTRIBUTION: &str =
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors";
const ESRI_ATTRIBUTION: &str = "Tiles &copy; <a href=\"https://www.esri.com/\">Esri</a>";
const USGS_ATTRIBUTION: &str = "<a href=\"https://www.usgs.gov/\">USGS</a> The National Map";
const FCC_ATTRIBUTION: &str = "<a href=\"https://broadbandmap.fcc.gov/\">FCC</a> National Broadband Map";
const FCC_MOBILE_TEMPLATE: &str =
    "https://broadbandmap.fcc.gov/nbm/map/api/published/mobile/{provider}/4g/{z}/{x}/{y}.png";

pub const BASE_SECTION: &str = "Map Views";
pub const CELL_SECTION: &str = "Cell Phone Services";
pub const LAND_SECTION: &str = "Land Layers";
pub const OVERLAY_SECTION: &str = "Overlays";

pub const DEFAULT_BASE_LAYER: &str = "osm";

#[derive(Debug, Clone, PartialEq)]
pub struct TileLayerRegistry {
    layers: Vec<LayerDescriptor>,
    default_base: String,
}

impl TileLayerRegistry {
    /// Validates ids are unique and `default_base` names a base layer.
    pub fn new(layers: Vec<LayerDescriptor>, default_base: &str) -> Result<Self, MapError> {
        let mut seen = HashSet::new();
        for layer in &layers {
            if !seen.insert(layer.id.as_str()) {
                return Err(MapError::Registry(format!("duplicate layer id '{}'", layer.id)));
            }
        }
        match layers.iter().find(|l| l.id == default_base) {
            Some(l) if l.is_base() => {}
            Some(_) => {
                return Err(MapError::Registry(format!(
                    "default layer '{default_base}' is not a base layer"
                )));
            }
            None => {
                return Err(MapError::Registry(format!(
                    "default layer '{default_base}' is not registered"
                )));
            }
        }
        Ok(Self {
            layers,
            default_base: default_base.to_string(),
        })
    }

    /// The built-in catalog alone. Its validity is covered by tests.
    pub fn builtin() -> Self {
        Self {
            layers: builtin_layers(),
            default_base: DEFAULT_BASE_LAYER.to_string(),
        }
    }

    /// The built-in catalog plus any `extra` layers from configuration.
    /// `url_overrides` swaps the tile endpoint of a registered layer.
    pub fn with_builtin(
        extra: Vec<LayerDescriptor>,
        url_overrides: &BTreeMap<LayerId, String>,
    ) -> Result<Self, MapError> {
        let mut layers = builtin_layers();
        layers.extend(extra);
        for (id, url) in url_overrides {
            let layer = layers
                .iter_mut()
                .find(|l| l.id == *id)
                .ok_or_else(|| MapError::Registry(format!("url override for unknown layer '{id}'")))?;
            layer.url_template = url.clone();
        }
        Self::new(layers, DEFAULT_BASE_LAYER)
    }

    pub fn get(&self, id: &str) -> Option<&LayerDescriptor> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn default_base(&self) -> &LayerDescriptor {
        // checked in `new`
        self.layers
            .iter()
            .find(|l| l.id == self.default_base)
            .unwrap_or(&self.layers[0])
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayerDescriptor> {
        self.layers.iter()
    }

    pub fn by_category(&self, category: LayerCategory) -> impl Iterator<Item = &LayerDescriptor> {
        self.iter().filter(move |l| l.category == category)
    }

    /// Layer menu grouping: base layers first, then overlay sections in the
    /// order they first appear.
    pub fn menu_sections(&self) -> Vec<(&str, Vec<&LayerDescriptor>)> {
        let mut sections: Vec<(&str, Vec<&LayerDescriptor>)> =
            vec![(BASE_SECTION, self.by_category(LayerCategory::Base).collect())];
        for layer in self.by_category(LayerCategory::Overlay) {
            let title = layer.section.as_deref().unwrap_or(OVERLAY_SECTION);
            match sections.iter_mut().find(|(t, _)| *t == title) {
                Some((_, items)) => items.push(layer),
                None => sections.push((title, vec![layer])),
            }
        }
        sections
    }

    /// Attribution strings for the given visible layers, deduplicated, in
    /// registry order.
    pub fn attributions<'a, I>(&self, visible: I) -> Vec<&str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let visible: HashSet<&str> = visible.into_iter().collect();
        let mut out: Vec<&str> = Vec::new();
        for layer in &self.layers {
            if visible.contains(layer.id.as_str()) && !out.contains(&layer.attribution.as_str()) {
                out.push(layer.attribution.as_str());
            }
        }
        out
    }
}

fn layer(
    id: &str,
    label: &str,
    category: LayerCategory,
    url_template: &str,
    attribution: &str,
    max_zoom: u8,
    opacity: f64,
) -> LayerDescriptor {
    LayerDescriptor {
        id: id.to_string(),
        label: label.to_string(),
        category,
        url_template: url_template.to_string(),
        attribution: attribution.to_string(),
        min_zoom: 0,
        max_zoom,
        opacity,
        section: None,
    }
}

fn in_section(mut layer: LayerDescriptor, section: &str) -> LayerDescriptor {
    layer.section = Some(section.to_string());
    layer
}

fn carrier(id: &str, label: &str, provider: &str) -> LayerDescriptor {
    in_section(
        layer(
            id,
            label,
            LayerCategory::Overlay,
            &FCC_MOBILE_TEMPLATE.replace("{provider}", provider),
            FCC_ATTRIBUTION,
            14,
            0.6,
        ),
        CELL_SECTION,
    )
}

pub fn builtin_layers() -> Vec<LayerDescriptor> {
    use LayerCategory::{Base, Overlay};
    vec![
        layer(
            "osm",
            "Default View",
            Base,
            "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
            OSM_ATTRIBUTION,
            19,
            1.0,
        ),
        layer(
            "street",
            "Street",
            Base,
            "https://server.arcgisonline.com/ArcGIS/rest/services/World_Street_Map/MapServer/tile/{z}/{y}/{x}",
            ESRI_ATTRIBUTION,
            19,
            1.0,
        ),
        layer(
            "satellite",
            "Satellite",
            Base,
            "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
            ESRI_ATTRIBUTION,
            19,
            1.0,
        ),
        layer(
            "hybrid",
            "Hybrid",
            Base,
            "https://basemap.nationalmap.gov/arcgis/rest/services/USGSImageryTopo/MapServer/tile/{z}/{y}/{x}",
            USGS_ATTRIBUTION,
            16,
            1.0,
        ),
        layer(
            "terrain",
            "Terrain",
            Base,
            "https://server.arcgisonline.com/ArcGIS/rest/services/World_Terrain_Base/MapServer/tile/{z}/{y}/{x}",
            ESRI_ATTRIBUTION,
            13,
            1.0,
        ),
        carrier("verizon", "Verizon LTE", "verizon"),
        carrier("att", "AT&T LTE", "att"),
        carrier("tmobile", "T-Mobile LTE", "tmobile"),
        carrier("sprint", "Sprint LTE", "sprint"),
        in_section(
            layer(
                "blm",
                "BLM Land",
                Overlay,
                "https://gis.blm.gov/arcgis/rest/services/lands/BLM_Natl_SMA_Cached_BLM_Only/MapServer/tile/{z}/{y}/{x}",
                "Bureau of Land Management",
                16,
                0.5,
            ),
            LAND_SECTION,
        ),
        in_section(
            layer(
                "usfs",
                "USFS Land",
                Overlay,
                "https://apps.fs.usda.gov/arcx/rest/services/EDW/EDW_ForestSystemBoundaries_01/MapServer/tile/{z}/{y}/{x}",
                "USDA Forest Service",
                16,
                0.5,
            ),
            LAND_SECTION,
        ),
        in_section(
            layer(
                "fire_smoke",
                "Fire Smoke",
                Overlay,
                "https://tiles.arcgis.com/tiles/C8EMgrsFcRFL6LrL/arcgis/rest/services/HMS_Smoke_Polygons/MapServer/tile/{z}/{y}/{x}",
                "NOAA Hazard Mapping System",
                12,
                0.6,
            ),
            LAND_SECTION,
        ),
        in_section(
            layer(
                "fire_hazards",
                "Fire Hazards",
                Overlay,
                "https://apps.fs.usda.gov/arcx/rest/services/RDW_Wildfire/RMRS_WildfireHazardPotential_2020/MapServer/tile/{z}/{y}/{x}",
                "USDA Forest Service, Wildfire Hazard Potential",
                13,
                0.6,
            ),
            LAND_SECTION,
        ),
        in_section(
            layer(
                "elevation",
                "Elevation",
                Overlay,
                "https://basemap.nationalmap.gov/arcgis/rest/services/USGSShadedReliefOnly/MapServer/tile/{z}/{y}/{x}",
                USGS_ATTRIBUTION,
                16,
                0.5,
            ),
            LAND_SECTION,
        ),
        layer(
            "trail-overlay",
            "Hiking Trails",
            Overlay,
            "https://tile.waymarkedtrails.org/hiking/{z}/{x}/{y}.png",
            "&copy; <a href=\"https://waymarkedtrails.org\">waymarkedtrails.org</a>",
            18,
            0.8,
        ),
        layer(
            "labels",
            "Places & Boundaries",
            Overlay,
            "https://server.arcgisonline.com/ArcGIS/rest/services/Reference/World_Boundaries_and_Places/MapServer/tile/{z}/{y}/{x}",
            ESRI_ATTRIBUTION,
            19,
            1.0,
        ),
        layer(
            "roads",
            "Roads",
            Overlay,
            "https://server.arcgisonline.com/ArcGIS/rest/services/Reference/World_Transportation/MapServer/tile/{z}/{y}/{x}",
            ESRI_ATTRIBUTION,
            19,
            1.0,
        ),
    ]
}
