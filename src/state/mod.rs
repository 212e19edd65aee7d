pub mod geolocation;
pub mod layers;
pub mod marker;
pub mod menu;
pub mod registry;
pub mod screen;
pub mod viewport;

#[cfg(test)]
pub(crate) mod testing;

pub use menu::{LayerMenuAction, LayerMenuState};
pub use registry::TileLayerRegistry;
pub use screen::MapScreen;
