//! One mounted map screen: viewport, layers, user marker and location
//! tracking wired together.
//!
//! The UI shell calls [`MapScreen::mount`] when the map page appears and
//! [`MapScreen::unmount`] on every path that removes it. Unmount cancels the
//! active watch and destroys the viewport synchronously; one-shot location
//! results still in flight are dropped through the handle's liveness flag.

use std::rc::Rc;

use crate::config::MapConfig;
use crate::error::{LocationError, MapError};
use crate::model::{LatLon, MapNotice, UserLocationSample, UserMarker};
#[cfg(test)]
use crate::model::Viewport;
use crate::state::geolocation::{
    GeolocationTracker, LocationPlatform, LocationResult, OnceCallback, SampleCallback,
};
use crate::state::layers::{LayerStateMachine, Transition};
use crate::state::marker::UserMarkerController;
use crate::state::registry::TileLayerRegistry;
use crate::state::viewport::{MapBackend, MapViewportController, ViewportHandle};

pub struct MapScreen<B: MapBackend, P: LocationPlatform> {
    config: MapConfig,
    viewport: MapViewportController<B>,
    layers: LayerStateMachine,
    marker: UserMarkerController,
    tracker: GeolocationTracker<P>,
    handle: Option<ViewportHandle>,
    notice: Option<MapNotice>,
}

impl<B: MapBackend, P: LocationPlatform> MapScreen<B, P> {
    pub fn new(config: MapConfig, registry: Rc<TileLayerRegistry>, backend: B, platform: P) -> Self {
        let marker = UserMarkerController::new(config.follow());
        Self {
            viewport: MapViewportController::new(backend, registry.clone()),
            layers: LayerStateMachine::new(registry),
            marker,
            tracker: GeolocationTracker::new(platform),
            handle: None,
            notice: None,
            config,
        }
    }

    pub fn mount(&mut self, container: &B::Container) -> Result<ViewportHandle, MapError> {
        let initial = self.config.initial_viewport()?;
        let handle = self.viewport.create(container, initial)?;
        self.layers.adopt(&self.viewport);
        self.marker.reset();
        self.handle = Some(handle.clone());
        log::info!("map screen mounted (viewport {})", handle.id());
        Ok(handle)
    }

    pub fn unmount(&mut self) {
        self.tracker.cancel();
        if let Some(handle) = self.handle.take() {
            self.viewport.destroy(&handle);
            log::info!("map screen unmounted");
        }
        self.layers.clear();
        self.marker.reset();
    }

    pub fn is_mounted(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| self.viewport.is_live(h))
    }

    fn live_handle(&self) -> Result<ViewportHandle, MapError> {
        self.handle
            .clone()
            .filter(|h| self.viewport.is_live(h))
            .ok_or(MapError::NotMounted)
    }

    pub fn toggle_layer(&mut self, id: &str) -> Result<Transition, MapError> {
        let handle = self.live_handle()?;
        self.layers.toggle(id, &mut self.viewport, &handle)
    }

    /// Applies a one-shot or watch result. Failures become a notice; the
    /// viewport is left untouched.
    pub fn apply_location(&mut self, result: LocationResult) {
        let Ok(handle) = self.live_handle() else {
            return;
        };
        match result {
            Ok(sample) => match self.marker.on_sample(&sample, &mut self.viewport, &handle) {
                Ok(update) => log::debug!("user marker {update:?}"),
                Err(e) => log::warn!("location sample ignored: {e}"),
            },
            Err(e) => self.raise_location_error(e),
        }
    }

    pub fn apply_heading(&mut self, heading: Option<f64>) {
        if let Ok(handle) = self.live_handle() {
            self.marker.on_heading(heading, &mut self.viewport, &handle);
        }
    }

    fn raise_location_error(&mut self, e: LocationError) {
        log::warn!("location unavailable: {e}");
        self.notice = Some(MapNotice::LocationUnavailable(e));
    }

    /// Requests a single fix; `sink` receives the result unless the map is
    /// gone by then.
    pub fn locate_once(&mut self, sink: OnceCallback) {
        let Ok(handle) = self.live_handle() else {
            return;
        };
        let options = self.config.location;
        if let Err(e) = self.tracker.request_once(&options, handle.liveness(), sink) {
            self.raise_location_error(e);
        }
    }

    pub fn start_tracking(&mut self, sink: SampleCallback) {
        if self.live_handle().is_err() {
            return;
        }
        let options = self.config.location;
        if let Err(e) = self.tracker.watch(&options, sink) {
            self.raise_location_error(e);
        }
    }

    pub fn stop_tracking(&mut self) {
        self.tracker.cancel();
    }

    pub fn is_tracking(&self) -> bool {
        self.tracker.active_watch().is_some()
    }

    pub fn invalidate_size(&mut self) {
        if let Ok(handle) = self.live_handle() {
            self.viewport.invalidate_size(&handle);
        }
    }

    pub fn sync_view(&mut self, center: LatLon, zoom: f64) {
        if let Ok(handle) = self.live_handle() {
            self.viewport.sync_view(&handle, center, zoom);
        }
    }

    pub fn notice(&self) -> Option<&MapNotice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn layers(&self) -> &LayerStateMachine {
        &self.layers
    }

    pub fn user_marker(&self) -> Option<&UserMarker> {
        self.marker.marker()
    }

    pub fn last_fix(&self) -> Option<&UserLocationSample> {
        self.marker.last_sample()
    }

    #[cfg(test)]
    pub(crate) fn viewport(&self) -> Option<&Viewport> {
        self.viewport.viewport()
    }

    pub fn registry(&self) -> &Rc<TileLayerRegistry> {
        self.viewport.registry()
    }

    /// Attribution strings of the visible layers.
    pub fn attributions(&self) -> Vec<String> {
        self.registry()
            .attributions(self.layers.attached_ids())
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn backend(&self) -> &B {
        self.viewport.backend()
    }

    #[cfg(test)]
    pub(crate) fn platform(&self) -> &P {
        self.tracker.platform()
    }
}
