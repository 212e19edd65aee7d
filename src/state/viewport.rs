// Owner of the single live map instance.
use std::cell::Cell;
use std::collections::BTreeSet;
use std::rc::Rc;

use crate::error::MapError;
use crate::model::{LatLon, LayerDescriptor, LayerId, UserMarker, Viewport};
use crate::state::registry::TileLayerRegistry;

/// The map widget the controller drives. Implemented over Leaflet in the
/// browser and by a recording fake in tests.
pub trait MapBackend {
    type Container;

    fn mount(&mut self, container: &Self::Container, viewport: &Viewport) -> Result<(), MapError>;
    fn attach_layer(&mut self, layer: &LayerDescriptor) -> Result<(), MapError>;
    fn detach_layer(&mut self, layer: &LayerDescriptor);
    fn fly_to(&mut self, center: LatLon, zoom: f64, duration_secs: f64);
    fn invalidate_size(&mut self);
    fn place_marker(&mut self, marker: &UserMarker) -> Result<(), MapError>;
    fn update_marker(&mut self, marker: &UserMarker);
    fn remove_marker(&mut self);
    fn unmount(&mut self);
}

/// Stable handle to a created viewport. Clones share the liveness flag, so
/// callbacks holding one can tell the viewport was destroyed.
#[derive(Debug, Clone)]
pub struct ViewportHandle {
    id: u64,
    live: Rc<Cell<bool>>,
}

impl ViewportHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_live(&self) -> bool {
        self.live.get()
    }

    pub fn liveness(&self) -> Liveness {
        Liveness(self.live.clone())
    }
}

/// Read-only view of a handle's liveness flag.
#[derive(Debug, Clone)]
pub struct Liveness(Rc<Cell<bool>>);

impl Liveness {
    #[cfg(test)]
    pub(crate) fn from_flag(flag: Rc<Cell<bool>>) -> Self {
        Self(flag)
    }

    pub fn is_live(&self) -> bool {
        self.0.get()
    }
}

struct LiveViewport {
    handle: ViewportHandle,
    viewport: Viewport,
    attached: BTreeSet<LayerId>,
    marker: bool,
}

pub struct MapViewportController<B: MapBackend> {
    backend: B,
    registry: Rc<TileLayerRegistry>,
    live: Option<LiveViewport>,
    next_id: u64,
}

impl<B: MapBackend> MapViewportController<B> {
    pub fn new(backend: B, registry: Rc<TileLayerRegistry>) -> Self {
        Self {
            backend,
            registry,
            live: None,
            next_id: 1,
        }
    }

    #[cfg(test)]
    pub(crate) fn backend(&self) -> &B {
        &self.backend
    }

    pub fn registry(&self) -> &Rc<TileLayerRegistry> {
        &self.registry
    }

    /// Mounts the map and attaches the default base layer.
    pub fn create(
        &mut self,
        container: &B::Container,
        initial: Viewport,
    ) -> Result<ViewportHandle, MapError> {
        if self.live.is_some() {
            return Err(MapError::AlreadyInitialized);
        }
        self.backend.mount(container, &initial)?;
        let base = self.registry.default_base().clone();
        if let Err(e) = self.backend.attach_layer(&base) {
            self.backend.unmount();
            return Err(e);
        }
        let handle = ViewportHandle {
            id: self.next_id,
            live: Rc::new(Cell::new(true)),
        };
        self.next_id += 1;
        let mut attached = BTreeSet::new();
        attached.insert(base.id.clone());
        self.live = Some(LiveViewport {
            handle: handle.clone(),
            viewport: initial,
            attached,
            marker: false,
        });
        log::debug!("map viewport {} created with base layer '{}'", handle.id, base.id);
        Ok(handle)
    }

    fn live_mut(&mut self, handle: &ViewportHandle) -> Option<&mut LiveViewport> {
        self.live
            .as_mut()
            .filter(|l| l.handle.id == handle.id && handle.is_live())
    }

    pub fn is_live(&self, handle: &ViewportHandle) -> bool {
        self.live
            .as_ref()
            .is_some_and(|l| l.handle.id == handle.id && handle.is_live())
    }

    #[cfg(test)]
    pub(crate) fn viewport(&self) -> Option<&Viewport> {
        self.live.as_ref().map(|l| &l.viewport)
    }

    pub fn attached_layers(&self) -> Vec<LayerId> {
        self.live
            .as_ref()
            .map(|l| l.attached.iter().cloned().collect())
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn has_marker(&self) -> bool {
        self.live.as_ref().is_some_and(|l| l.marker)
    }

    /// Animates towards the target. Destroyed handles are logged and ignored.
    pub fn fly_to(&mut self, handle: &ViewportHandle, lat: f64, lon: f64, zoom: f64, duration_secs: f64) {
        let Some(live) = self.live_mut(handle) else {
            log::warn!("fly_to on destroyed viewport {}; ignored", handle.id);
            return;
        };
        let target = LatLon::new(lat, lon);
        if !target.is_valid() || !zoom.is_finite() {
            log::warn!("fly_to target {lat},{lon} z{zoom} out of range; ignored");
            return;
        }
        let zoom = live.viewport.clamp_zoom(zoom);
        live.viewport.center = target;
        live.viewport.zoom = zoom;
        self.backend.fly_to(target, zoom, duration_secs.max(0.0));
    }

    /// Records a center/zoom reported by the widget after a user gesture.
    pub fn sync_view(&mut self, handle: &ViewportHandle, center: LatLon, zoom: f64) {
        if let Some(live) = self.live_mut(handle) {
            if center.is_valid() {
                live.viewport.center = center;
            }
            if zoom.is_finite() {
                live.viewport.zoom = live.viewport.clamp_zoom(zoom);
            }
        }
    }

    pub fn invalidate_size(&mut self, handle: &ViewportHandle) {
        if self.live_mut(handle).is_some() {
            self.backend.invalidate_size();
        } else {
            log::debug!("invalidate_size on destroyed viewport {}; ignored", handle.id);
        }
    }

    pub fn attach_layer(&mut self, handle: &ViewportHandle, id: &str) -> Result<(), MapError> {
        let layer = self
            .registry
            .get(id)
            .cloned()
            .ok_or_else(|| MapError::UnknownLayer(id.to_string()))?;
        let Some(live) = self.live.as_mut().filter(|l| l.handle.id == handle.id && handle.is_live()) else {
            return Err(MapError::Backend(format!("viewport {} is not live", handle.id)));
        };
        if live.attached.contains(id) {
            return Ok(());
        }
        self.backend.attach_layer(&layer)?;
        live.attached.insert(layer.id);
        Ok(())
    }

    pub fn detach_layer(&mut self, handle: &ViewportHandle, id: &str) -> Result<(), MapError> {
        let layer = self
            .registry
            .get(id)
            .cloned()
            .ok_or_else(|| MapError::UnknownLayer(id.to_string()))?;
        let Some(live) = self.live.as_mut().filter(|l| l.handle.id == handle.id && handle.is_live()) else {
            return Err(MapError::Backend(format!("viewport {} is not live", handle.id)));
        };
        if live.attached.remove(id) {
            self.backend.detach_layer(&layer);
        }
        Ok(())
    }

    pub fn place_marker(&mut self, handle: &ViewportHandle, marker: &UserMarker) -> Result<(), MapError> {
        let Some(live) = self.live.as_mut().filter(|l| l.handle.id == handle.id && handle.is_live()) else {
            return Err(MapError::Backend(format!("viewport {} is not live", handle.id)));
        };
        if live.marker {
            self.backend.update_marker(marker);
        } else {
            self.backend.place_marker(marker)?;
            live.marker = true;
        }
        Ok(())
    }

    /// Releases layers, the marker and the widget. Repeated calls are no-ops.
    pub fn destroy(&mut self, handle: &ViewportHandle) {
        let matches = self.live.as_ref().is_some_and(|l| l.handle.id == handle.id);
        if !matches {
            return;
        }
        let Some(live) = self.live.take() else {
            return;
        };
        for id in &live.attached {
            if let Some(layer) = self.registry.get(id) {
                self.backend.detach_layer(layer);
            }
        }
        if live.marker {
            self.backend.remove_marker();
        }
        self.backend.unmount();
        live.handle.live.set(false);
        log::debug!("map viewport {} destroyed", live.handle.id);
    }
}
