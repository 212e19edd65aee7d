use thiserror::Error;

/// Failures reported by the platform location stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("location request timed out")]
    Timeout,
    #[error("geolocation is not supported by this browser")]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    #[error("map viewport already initialized")]
    AlreadyInitialized,
    #[error("map is not mounted")]
    NotMounted,
    #[error("unknown layer: {0}")]
    UnknownLayer(String),
    #[error("invalid viewport: zoom {zoom} outside {min_zoom}..={max_zoom} or center out of range")]
    InvalidViewport { zoom: f64, min_zoom: f64, max_zoom: f64 },
    #[error("location sample has invalid coordinates")]
    InvalidSample,
    #[error("map widget error: {0}")]
    Backend(String),
    #[error("layer registry error: {0}")]
    Registry(String),
}
