pub mod geolocation;
pub mod leaflet;
pub mod listener;

pub use geolocation::BrowserGeolocation;
pub use leaflet::LeafletBackend;
pub use listener::ScopedListener;
