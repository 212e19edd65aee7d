//! Layer attachment state.
//!
//! Base layers are mutually exclusive; overlays flip independently. Every
//! transition is pushed to the viewport controller before `toggle` returns.
//!
//! Toggling the base layer that is already active detaches it and leaves the
//! map with no base layer at all. Nothing falls back to the default.
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::MapError;
use crate::model::{LayerDescriptor, LayerId};
use crate::state::registry::TileLayerRegistry;
use crate::state::viewport::{MapBackend, MapViewportController, ViewportHandle};

/// What a successful `toggle` changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    pub detached: Vec<LayerId>,
    pub attached: Option<LayerId>,
}

#[derive(Debug)]
pub struct LayerStateMachine {
    registry: Rc<TileLayerRegistry>,
    state: BTreeMap<LayerId, bool>,
}

impl LayerStateMachine {
    pub fn new(registry: Rc<TileLayerRegistry>) -> Self {
        Self {
            registry,
            state: BTreeMap::new(),
        }
    }

    /// Takes over whatever the controller attached while creating the map.
    pub fn adopt<B: MapBackend>(&mut self, viewport: &MapViewportController<B>) {
        self.state.clear();
        for id in viewport.attached_layers() {
            self.state.insert(id, true);
        }
    }

    pub fn clear(&mut self) {
        self.state.clear();
    }

    pub fn is_attached(&self, id: &str) -> bool {
        self.state.get(id).copied().unwrap_or(false)
    }

    pub fn attached_ids(&self) -> impl Iterator<Item = &str> {
        self.state
            .iter()
            .filter(|(_, on)| **on)
            .map(|(id, _)| id.as_str())
    }

    pub fn active_base(&self) -> Option<&LayerDescriptor> {
        self.attached_ids()
            .filter_map(|id| self.registry.get(id))
            .find(|l| l.is_base())
    }

    #[cfg(test)]
    pub(crate) fn attached_overlays(&self) -> Vec<&LayerDescriptor> {
        self.attached_ids()
            .filter_map(|id| self.registry.get(id))
            .filter(|l| !l.is_base())
            .collect()
    }

    /// If attaching a new base fails, the base it replaced is attached again.
    pub fn toggle<B: MapBackend>(
        &mut self,
        id: &str,
        viewport: &mut MapViewportController<B>,
        handle: &ViewportHandle,
    ) -> Result<Transition, MapError> {
        let layer = self
            .registry
            .get(id)
            .ok_or_else(|| MapError::UnknownLayer(id.to_string()))?
            .clone();
        let mut transition = Transition::default();

        if layer.is_base() {
            let current: Vec<LayerId> = self
                .attached_ids()
                .filter(|other| self.registry.get(other).is_some_and(|l| l.is_base()))
                .map(str::to_string)
                .collect();
            let was_active = current.iter().any(|c| *c == layer.id);
            for other in current {
                viewport.detach_layer(handle, &other)?;
                self.state.insert(other.clone(), false);
                transition.detached.push(other);
            }
            if !was_active {
                if let Err(e) = viewport.attach_layer(handle, &layer.id) {
                    // put the previous base back
                    for prev in &transition.detached {
                        if viewport.attach_layer(handle, prev).is_ok() {
                            self.state.insert(prev.clone(), true);
                        }
                    }
                    return Err(e);
                }
                self.state.insert(layer.id.clone(), true);
                transition.attached = Some(layer.id);
            }
        } else if self.is_attached(&layer.id) {
            viewport.detach_layer(handle, &layer.id)?;
            self.state.insert(layer.id.clone(), false);
            transition.detached.push(layer.id);
        } else {
            viewport.attach_layer(handle, &layer.id)?;
            self.state.insert(layer.id.clone(), true);
            transition.attached = Some(layer.id);
        }
        log::debug!("layer toggle '{id}': {transition:?}");
        Ok(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::{RecordingBackend, test_registry, test_viewport};

    fn setup() -> (LayerStateMachine, MapViewportController<RecordingBackend>, ViewportHandle) {
        let registry = test_registry();
        let mut vp = MapViewportController::new(RecordingBackend::default(), registry.clone());
        let h = vp.create(&(), test_viewport()).unwrap();
        let mut layers = LayerStateMachine::new(registry);
        layers.adopt(&vp);
        (layers, vp, h)
    }

    fn base_count(layers: &LayerStateMachine) -> usize {
        layers
            .attached_ids()
            .filter(|id| layers.registry.get(id).unwrap().is_base())
            .count()
    }

    #[test]
    fn base_layers_are_exclusive() {
        let (mut layers, mut vp, h) = setup();
        for id in ["satellite", "terrain", "street", "osm", "satellite", "trail-overlay"] {
            layers.toggle(id, &mut vp, &h).unwrap();
            assert!(base_count(&layers) <= 1, "after toggling {id}");
            let on_map = vp
                .backend()
                .attached()
                .iter()
                .filter(|id| test_registry().get(id).unwrap().is_base())
                .count();
            assert!(on_map <= 1);
        }
        assert_eq!(layers.active_base().unwrap().id, "satellite");
    }

    #[test]
    fn toggling_active_base_leaves_no_base() {
        let (mut layers, mut vp, h) = setup();
        assert_eq!(layers.active_base().unwrap().id, "osm");
        let t = layers.toggle("osm", &mut vp, &h).unwrap();
        assert_eq!(t.detached, vec!["osm".to_string()]);
        assert_eq!(t.attached, None);
        assert_eq!(base_count(&layers), 0);
        assert!(layers.active_base().is_none());
        assert!(vp.attached_layers().is_empty());
    }

    #[test]
    fn overlay_toggle_pair_restores_state() {
        let (mut layers, mut vp, h) = setup();
        let before: Vec<String> = layers.attached_ids().map(str::to_string).collect();
        layers.toggle("elevation", &mut vp, &h).unwrap();
        assert!(layers.is_attached("elevation"));
        assert!(layers.is_attached("osm"));
        layers.toggle("elevation", &mut vp, &h).unwrap();
        let after: Vec<String> = layers.attached_ids().map(str::to_string).collect();
        assert_eq!(before, after);
        assert_eq!(vp.attached_layers(), after);
    }

    #[test]
    fn overlays_are_independent() {
        let (mut layers, mut vp, h) = setup();
        layers.toggle("elevation", &mut vp, &h).unwrap();
        layers.toggle("trail-overlay", &mut vp, &h).unwrap();
        layers.toggle("satellite", &mut vp, &h).unwrap();
        let overlays: Vec<&str> = layers.attached_overlays().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(overlays, vec!["elevation", "trail-overlay"]);
    }

    #[test]
    fn failed_base_attach_restores_previous_base() {
        let (mut layers, mut vp, h) = setup();
        vp.backend().fail_attach_of("satellite");
        let err = layers.toggle("satellite", &mut vp, &h).unwrap_err();
        assert!(matches!(err, MapError::Backend(_)));
        assert_eq!(layers.active_base().unwrap().id, "osm");
        assert!(!layers.is_attached("satellite"));
        assert_eq!(vp.attached_layers(), vec!["osm".to_string()]);
        assert_eq!(vp.backend().attached(), vec!["osm".to_string()]);
    }

    #[test]
    fn unknown_layer_is_noop() {
        let (mut layers, mut vp, h) = setup();
        let calls = vp.backend().calls().len();
        let err = layers.toggle("nope", &mut vp, &h).unwrap_err();
        assert_eq!(err, MapError::UnknownLayer("nope".into()));
        assert_eq!(vp.backend().calls().len(), calls);
        assert_eq!(layers.attached_ids().collect::<Vec<_>>(), vec!["osm"]);
    }
}
