// Test doubles for the map widget and the location platform.
use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{LocationError, MapError};
use crate::model::{LatLon, LayerDescriptor, LayerId, LocationOptions, UserLocationSample, UserMarker, Viewport};
use crate::state::geolocation::{LocationPlatform, LocationResult, OnceCallback, SampleCallback, WatchId};
use crate::state::registry::TileLayerRegistry;
use crate::state::viewport::MapBackend;

pub fn test_registry() -> Rc<TileLayerRegistry> {
    Rc::new(TileLayerRegistry::builtin())
}

pub fn test_viewport() -> Viewport {
    Viewport::new(LatLon::new(37.7749, -122.4194), 10.0, 3.0, 18.0).unwrap()
}

pub fn sample(lat: f64, lon: f64, heading: Option<f64>, timestamp_ms: f64) -> UserLocationSample {
    UserLocationSample {
        position: LatLon::new(lat, lon),
        heading_degrees: heading,
        accuracy_m: 5.0,
        timestamp_ms,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Mount,
    Attach(LayerId),
    Detach(LayerId),
    FlyTo(LatLon, f64),
    InvalidateSize,
    PlaceMarker(UserMarker),
    UpdateMarker(UserMarker),
    RemoveMarker,
    Unmount,
}

#[derive(Default)]
struct Recorded {
    calls: Vec<BackendCall>,
    mounted: bool,
    attached: Vec<LayerId>,
    markers: usize,
    fail_attach: Option<LayerId>,
}

/// Clones share one call log.
#[derive(Clone, Default)]
pub struct RecordingBackend {
    inner: Rc<RefCell<Recorded>>,
}

impl RecordingBackend {
    pub fn calls(&self) -> Vec<BackendCall> {
        self.inner.borrow().calls.clone()
    }

    pub fn attached(&self) -> Vec<LayerId> {
        self.inner.borrow().attached.clone()
    }

    pub fn mounted(&self) -> bool {
        self.inner.borrow().mounted
    }

    pub fn marker_count(&self) -> usize {
        self.inner.borrow().markers
    }

    /// Makes every later attach of `id` fail.
    pub fn fail_attach_of(&self, id: &str) {
        self.inner.borrow_mut().fail_attach = Some(id.to_string());
    }
}

impl MapBackend for RecordingBackend {
    type Container = ();

    fn mount(&mut self, _container: &(), _viewport: &Viewport) -> Result<(), MapError> {
        let mut r = self.inner.borrow_mut();
        r.calls.push(BackendCall::Mount);
        r.mounted = true;
        Ok(())
    }

    fn attach_layer(&mut self, layer: &LayerDescriptor) -> Result<(), MapError> {
        let mut r = self.inner.borrow_mut();
        if r.fail_attach.as_deref() == Some(layer.id.as_str()) {
            return Err(MapError::Backend(format!("tile layer '{}' failed", layer.id)));
        }
        r.calls.push(BackendCall::Attach(layer.id.clone()));
        r.attached.push(layer.id.clone());
        Ok(())
    }

    fn detach_layer(&mut self, layer: &LayerDescriptor) {
        let mut r = self.inner.borrow_mut();
        r.calls.push(BackendCall::Detach(layer.id.clone()));
        r.attached.retain(|id| *id != layer.id);
    }

    fn fly_to(&mut self, center: LatLon, zoom: f64, _duration_secs: f64) {
        self.inner.borrow_mut().calls.push(BackendCall::FlyTo(center, zoom));
    }

    fn invalidate_size(&mut self) {
        self.inner.borrow_mut().calls.push(BackendCall::InvalidateSize);
    }

    fn place_marker(&mut self, marker: &UserMarker) -> Result<(), MapError> {
        let mut r = self.inner.borrow_mut();
        r.calls.push(BackendCall::PlaceMarker(*marker));
        r.markers += 1;
        Ok(())
    }

    fn update_marker(&mut self, marker: &UserMarker) {
        self.inner.borrow_mut().calls.push(BackendCall::UpdateMarker(*marker));
    }

    fn remove_marker(&mut self) {
        let mut r = self.inner.borrow_mut();
        r.calls.push(BackendCall::RemoveMarker);
        r.markers = r.markers.saturating_sub(1);
    }

    fn unmount(&mut self) {
        let mut r = self.inner.borrow_mut();
        r.calls.push(BackendCall::Unmount);
        r.mounted = false;
    }
}

#[derive(Default)]
struct Scripted {
    unsupported: bool,
    pending_once: Vec<OnceCallback>,
    watches: Vec<(WatchId, SampleCallback)>,
    cancelled: Vec<WatchId>,
    next_id: WatchId,
}

/// Scripted location platform. Results are delivered only when the test
/// calls `emit` or `resolve_once`.
#[derive(Clone, Default)]
pub struct FakePlatform {
    inner: Rc<RefCell<Scripted>>,
}

impl FakePlatform {
    pub fn unsupported() -> Self {
        let p = Self::default();
        p.inner.borrow_mut().unsupported = true;
        p
    }

    pub fn active_watches(&self) -> Vec<WatchId> {
        self.inner.borrow().watches.iter().map(|(id, _)| *id).collect()
    }

    pub fn cancelled(&self) -> Vec<WatchId> {
        self.inner.borrow().cancelled.clone()
    }

    /// Delivers `result` to every active watch.
    pub fn emit(&self, result: LocationResult) {
        let callbacks: Vec<SampleCallback> =
            self.inner.borrow().watches.iter().map(|(_, cb)| cb.clone()).collect();
        for cb in callbacks {
            cb(result.clone());
        }
    }

    /// Resolves every pending one-shot request with `result`.
    pub fn resolve_once(&self, result: LocationResult) {
        let pending: Vec<OnceCallback> = self.inner.borrow_mut().pending_once.drain(..).collect();
        for cb in pending {
            cb(result.clone());
        }
    }
}

impl LocationPlatform for FakePlatform {
    fn is_supported(&self) -> bool {
        !self.inner.borrow().unsupported
    }

    fn request_once(&mut self, _options: &LocationOptions, callback: OnceCallback) -> Result<(), LocationError> {
        self.inner.borrow_mut().pending_once.push(callback);
        Ok(())
    }

    fn watch(&mut self, _options: &LocationOptions, callback: SampleCallback) -> Result<WatchId, LocationError> {
        let mut s = self.inner.borrow_mut();
        s.next_id += 1;
        let id = s.next_id;
        s.watches.push((id, callback));
        Ok(id)
    }

    fn clear_watch(&mut self, id: WatchId) {
        let mut s = self.inner.borrow_mut();
        s.watches.retain(|(w, _)| *w != id);
        s.cancelled.push(id);
    }
}
