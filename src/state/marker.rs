// User-location marker: at most one per viewport, repositioned in place.
use crate::error::MapError;
use crate::model::{UserLocationSample, UserMarker};
use crate::state::viewport::{MapBackend, MapViewportController, ViewportHandle};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkerState {
    NoMarker,
    Placed(UserMarker),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerUpdate {
    Placed,
    Moved,
    /// Older than the last applied sample; dropped.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowSettings {
    pub enabled: bool,
    pub zoom: f64,
    pub duration_secs: f64,
}

#[derive(Debug)]
pub struct UserMarkerController {
    state: MarkerState,
    last_sample: Option<UserLocationSample>,
    /// Heading seen before the marker exists, applied on placement.
    pending_rotation: f64,
    follow: FollowSettings,
}

fn normalize_heading(h: f64) -> Option<f64> {
    h.is_finite().then(|| h.rem_euclid(360.0))
}

impl UserMarkerController {
    pub fn new(follow: FollowSettings) -> Self {
        Self {
            state: MarkerState::NoMarker,
            last_sample: None,
            pending_rotation: 0.0,
            follow,
        }
    }

    pub fn marker(&self) -> Option<&UserMarker> {
        match &self.state {
            MarkerState::Placed(m) => Some(m),
            MarkerState::NoMarker => None,
        }
    }

    /// The most recent sample that moved the marker.
    pub fn last_sample(&self) -> Option<&UserLocationSample> {
        self.last_sample.as_ref()
    }

    pub fn on_sample<B: MapBackend>(
        &mut self,
        sample: &UserLocationSample,
        viewport: &mut MapViewportController<B>,
        handle: &ViewportHandle,
    ) -> Result<MarkerUpdate, MapError> {
        if !sample.position.is_valid() {
            return Err(MapError::InvalidSample);
        }
        if self.last_sample.is_some_and(|last| sample.timestamp_ms < last.timestamp_ms) {
            log::debug!("dropping stale location sample at {}", sample.timestamp_ms);
            return Ok(MarkerUpdate::Stale);
        }
        let prior = match self.state {
            MarkerState::Placed(m) => m.rotation_degrees,
            MarkerState::NoMarker => self.pending_rotation,
        };
        let rotation = sample.heading_degrees.and_then(normalize_heading).unwrap_or(prior);
        let marker = UserMarker {
            position: sample.position,
            rotation_degrees: rotation,
        };
        viewport.place_marker(handle, &marker)?;
        let update = match self.state {
            MarkerState::NoMarker => MarkerUpdate::Placed,
            MarkerState::Placed(_) => MarkerUpdate::Moved,
        };
        self.state = MarkerState::Placed(marker);
        self.last_sample = Some(*sample);

        if update == MarkerUpdate::Placed || self.follow.enabled {
            viewport.fly_to(
                handle,
                marker.position.lat,
                marker.position.lon,
                self.follow.zoom,
                self.follow.duration_secs,
            );
        }
        Ok(update)
    }

    /// Device-orientation input. `None` keeps the current rotation.
    pub fn on_heading<B: MapBackend>(
        &mut self,
        heading: Option<f64>,
        viewport: &mut MapViewportController<B>,
        handle: &ViewportHandle,
    ) {
        let Some(rotation) = heading.and_then(normalize_heading) else {
            return;
        };
        match &mut self.state {
            MarkerState::Placed(m) => {
                m.rotation_degrees = rotation;
                let m = *m;
                if let Err(e) = viewport.place_marker(handle, &m) {
                    log::debug!("heading update skipped: {e}");
                }
            }
            MarkerState::NoMarker => self.pending_rotation = rotation,
        }
    }

    /// Back to `NoMarker`; called when the viewport is destroyed.
    pub fn reset(&mut self) {
        self.state = MarkerState::NoMarker;
        self.last_sample = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LatLon;
    use crate::state::testing::{BackendCall, RecordingBackend, sample, test_registry, test_viewport};

    fn setup(follow: bool) -> (UserMarkerController, MapViewportController<RecordingBackend>, ViewportHandle) {
        let mut vp = MapViewportController::new(RecordingBackend::default(), test_registry());
        let h = vp.create(&(), test_viewport()).unwrap();
        let ctl = UserMarkerController::new(FollowSettings {
            enabled: follow,
            zoom: 15.0,
            duration_secs: 1.0,
        });
        (ctl, vp, h)
    }

    #[test]
    fn fifty_samples_one_marker() {
        let (mut ctl, mut vp, h) = setup(false);
        for i in 0..50 {
            let s = sample(40.0 + i as f64 * 0.001, -105.0, None, i as f64);
            let up = ctl.on_sample(&s, &mut vp, &h).unwrap();
            assert_eq!(up, if i == 0 { MarkerUpdate::Placed } else { MarkerUpdate::Moved });
        }
        let calls = vp.backend().calls();
        let placed = calls.iter().filter(|c| matches!(c, BackendCall::PlaceMarker(_))).count();
        let moved = calls.iter().filter(|c| matches!(c, BackendCall::UpdateMarker(_))).count();
        assert_eq!(placed, 1);
        assert_eq!(placed + moved, 50);
        assert_eq!(vp.backend().marker_count(), 1);
        assert_eq!(ctl.marker().unwrap().position, LatLon::new(40.0 + 49.0 * 0.001, -105.0));
    }

    #[test]
    fn missing_heading_keeps_rotation() {
        let (mut ctl, mut vp, h) = setup(false);
        ctl.on_sample(&sample(1.0, 1.0, Some(90.0), 1.0), &mut vp, &h).unwrap();
        ctl.on_sample(&sample(1.1, 1.0, None, 2.0), &mut vp, &h).unwrap();
        assert_eq!(ctl.marker().unwrap().rotation_degrees, 90.0);
        ctl.on_heading(None, &mut vp, &h);
        assert_eq!(ctl.marker().unwrap().rotation_degrees, 90.0);
        ctl.on_heading(Some(-30.0), &mut vp, &h);
        assert_eq!(ctl.marker().unwrap().rotation_degrees, 330.0);
    }

    #[test]
    fn heading_before_first_fix_is_applied_on_placement() {
        let (mut ctl, mut vp, h) = setup(false);
        ctl.on_heading(Some(45.0), &mut vp, &h);
        assert!(ctl.marker().is_none());
        ctl.on_sample(&sample(1.0, 1.0, None, 1.0), &mut vp, &h).unwrap();
        assert_eq!(ctl.marker().unwrap().rotation_degrees, 45.0);
    }

    #[test]
    fn stale_sample_is_dropped() {
        let (mut ctl, mut vp, h) = setup(false);
        ctl.on_sample(&sample(1.0, 1.0, None, 100.0), &mut vp, &h).unwrap();
        let up = ctl.on_sample(&sample(5.0, 5.0, None, 50.0), &mut vp, &h).unwrap();
        assert_eq!(up, MarkerUpdate::Stale);
        assert_eq!(ctl.marker().unwrap().position, LatLon::new(1.0, 1.0));
    }

    #[test]
    fn invalid_sample_rejected() {
        let (mut ctl, mut vp, h) = setup(false);
        let err = ctl.on_sample(&sample(f64::NAN, 1.0, None, 1.0), &mut vp, &h).unwrap_err();
        assert_eq!(err, MapError::InvalidSample);
        assert!(ctl.marker().is_none());
        assert!(ctl.last_sample().is_none());
    }

    #[test]
    fn first_fix_centers_without_follow() {
        let (mut ctl, mut vp, h) = setup(false);
        ctl.on_sample(&sample(10.0, 10.0, None, 1.0), &mut vp, &h).unwrap();
        ctl.on_sample(&sample(11.0, 11.0, None, 2.0), &mut vp, &h).unwrap();
        assert_eq!(vp.viewport().unwrap().center, LatLon::new(10.0, 10.0));
        assert_eq!(vp.viewport().unwrap().zoom, 15.0);
        assert_eq!(ctl.last_sample().unwrap().timestamp_ms, 2.0);
    }

    #[test]
    fn follow_pans_to_every_fix() {
        let (mut ctl, mut vp, h) = setup(true);
        ctl.on_sample(&sample(10.0, 10.0, None, 1.0), &mut vp, &h).unwrap();
        ctl.on_sample(&sample(12.0, 12.0, None, 3.0), &mut vp, &h).unwrap();
        assert_eq!(vp.viewport().unwrap().center, LatLon::new(12.0, 12.0));
    }
}
