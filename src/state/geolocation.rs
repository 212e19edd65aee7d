// Platform location stack wrapper: one-shot requests and a single watch.
use std::rc::Rc;

use crate::error::LocationError;
use crate::model::{LocationOptions, UserLocationSample};
use crate::state::viewport::Liveness;

pub type WatchId = i32;
pub type LocationResult = Result<UserLocationSample, LocationError>;
pub type OnceCallback = Box<dyn FnOnce(LocationResult)>;
pub type SampleCallback = Rc<dyn Fn(LocationResult)>;

/// The host's geolocation capability. Callbacks are always invoked from the
/// event loop, never from inside `request_once` or `watch`.
pub trait LocationPlatform {
    fn is_supported(&self) -> bool;
    fn request_once(&mut self, options: &LocationOptions, callback: OnceCallback) -> Result<(), LocationError>;
    fn watch(&mut self, options: &LocationOptions, callback: SampleCallback) -> Result<WatchId, LocationError>;
    fn clear_watch(&mut self, id: WatchId);
}

/// Handle to the tracker's active watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchSubscription {
    id: WatchId,
}

impl WatchSubscription {
    #[cfg(test)]
    pub(crate) fn id(&self) -> WatchId {
        self.id
    }
}

pub struct GeolocationTracker<P: LocationPlatform> {
    platform: P,
    active: Option<WatchSubscription>,
}

impl<P: LocationPlatform> GeolocationTracker<P> {
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            active: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn platform(&self) -> &P {
        &self.platform
    }

    /// Requests a single sample. A result that arrives after `liveness` has
    /// dropped is discarded instead of delivered.
    pub fn request_once(
        &mut self,
        options: &LocationOptions,
        liveness: Liveness,
        callback: OnceCallback,
    ) -> Result<(), LocationError> {
        if !self.platform.is_supported() {
            return Err(LocationError::Unsupported);
        }
        self.platform.request_once(
            options,
            Box::new(move |result| {
                if liveness.is_live() {
                    callback(result);
                } else {
                    log::debug!("discarding location result for a destroyed map");
                }
            }),
        )
    }

    /// Starts a continuous watch, cancelling any active one first.
    pub fn watch(
        &mut self,
        options: &LocationOptions,
        callback: SampleCallback,
    ) -> Result<WatchSubscription, LocationError> {
        self.cancel();
        if !self.platform.is_supported() {
            return Err(LocationError::Unsupported);
        }
        let id = self.platform.watch(options, callback)?;
        let sub = WatchSubscription { id };
        self.active = Some(sub);
        log::debug!("location watch {id} started");
        Ok(sub)
    }

    /// Cancels the active watch. Returns whether one was active.
    pub fn cancel(&mut self) -> bool {
        match self.active.take() {
            Some(sub) => {
                self.platform.clear_watch(sub.id);
                log::debug!("location watch {} cancelled", sub.id);
                true
            }
            None => false,
        }
    }

    pub fn active_watch(&self) -> Option<WatchSubscription> {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::model::LatLon;
    use crate::state::testing::{FakePlatform, sample};

    fn live_flag() -> (Rc<Cell<bool>>, Liveness) {
        let flag = Rc::new(Cell::new(true));
        (flag.clone(), Liveness::from_flag(flag))
    }

    #[test]
    fn second_watch_cancels_first() {
        let platform = FakePlatform::default();
        let mut tracker = GeolocationTracker::new(platform.clone());
        let opts = LocationOptions::default();
        let first = tracker.watch(&opts, Rc::new(|_| {})).unwrap();
        let second = tracker.watch(&opts, Rc::new(|_| {})).unwrap();
        assert_ne!(first, second);
        assert_eq!(platform.active_watches(), vec![second.id()]);
        assert_eq!(platform.cancelled(), vec![first.id()]);
        assert_eq!(tracker.active_watch(), Some(second));
    }

    #[test]
    fn cancel_without_watch_is_noop() {
        let platform = FakePlatform::default();
        let mut tracker = GeolocationTracker::new(platform.clone());
        assert!(!tracker.cancel());
        assert!(platform.cancelled().is_empty());
    }

    #[test]
    fn watch_delivers_samples_in_order() {
        let platform = FakePlatform::default();
        let mut tracker = GeolocationTracker::new(platform.clone());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        tracker
            .watch(
                &LocationOptions::default(),
                Rc::new(move |r| sink.borrow_mut().push(r)),
            )
            .unwrap();
        platform.emit(Ok(sample(1.0, 2.0, None, 10.0)));
        platform.emit(Err(LocationError::Timeout));
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].as_ref().unwrap().position, LatLon::new(1.0, 2.0));
        assert_eq!(seen[1], Err(LocationError::Timeout));
    }

    #[test]
    fn once_result_after_teardown_is_discarded() {
        let platform = FakePlatform::default();
        let mut tracker = GeolocationTracker::new(platform.clone());
        let (flag, liveness) = live_flag();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        tracker
            .request_once(
                &LocationOptions::default(),
                liveness,
                Box::new(move |_| h.set(h.get() + 1)),
            )
            .unwrap();
        flag.set(false);
        platform.resolve_once(Ok(sample(1.0, 1.0, None, 1.0)));
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn unsupported_platform_reports_error() {
        let platform = FakePlatform::unsupported();
        let mut tracker = GeolocationTracker::new(platform.clone());
        let (_flag, liveness) = live_flag();
        assert_eq!(
            tracker.request_once(&LocationOptions::default(), liveness, Box::new(|_| {})),
            Err(LocationError::Unsupported)
        );
        assert_eq!(
            tracker.watch(&LocationOptions::default(), Rc::new(|_| {})),
            Err(LocationError::Unsupported)
        );
    }
}
