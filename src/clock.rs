//! Frame scheduling and the rotation clock
//!
//! The host drives animation through a [`FrameScheduler`]: the component
//! requests one frame at a time and cancels the pending request when it is
//! torn down. [`ManualScheduler`] is a deterministic host used by the CLI
//! and by tests.

use tracing::debug;

use crate::projection::Rotation;

/// Default longitude increment per frame, in degrees
pub const DEFAULT_STEP: f64 = 0.2;

/// Identifier of a requested frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Host-side frame callback scheduling
pub trait FrameScheduler {
    /// Ask for a callback on the next display refresh
    fn request_frame(&mut self) -> FrameHandle;

    /// Withdraw a pending request; unknown handles are ignored
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Scheduler fired by hand, one frame at a time
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pending: Vec<FrameHandle>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the oldest pending request, if any
    pub fn next_frame(&mut self) -> Option<FrameHandle> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.remove(0))
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.pending.retain(|h| *h != handle);
    }
}

/// Advances the globe longitude once per frame, forever, until cancelled
#[derive(Debug, Clone)]
pub struct RotationClock {
    rotation: Rotation,
    step: f64,
    pending: Option<FrameHandle>,
}

impl RotationClock {
    pub fn new(initial: Rotation, step: f64) -> Self {
        Self {
            rotation: initial.advanced(0.0),
            step,
            pending: None,
        }
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    /// Request the first frame; no-op when already running
    pub fn start(&mut self, scheduler: &mut dyn FrameScheduler) {
        if self.pending.is_none() {
            self.pending = Some(scheduler.request_frame());
            debug!(rotation = ?self.rotation, "Rotation clock started");
        }
    }

    /// Handle a fired frame: advance one step and request the next frame
    ///
    /// Returns the new rotation, or `None` if `handle` is not this clock's
    /// pending frame (stale or cancelled).
    pub fn on_frame(
        &mut self,
        handle: FrameHandle,
        scheduler: &mut dyn FrameScheduler,
    ) -> Option<Rotation> {
        if self.pending != Some(handle) {
            return None;
        }
        self.advance();
        self.pending = Some(scheduler.request_frame());
        Some(self.rotation)
    }

    /// One tick: `longitude = (longitude + step) mod 360`
    pub fn advance(&mut self) -> Rotation {
        self.rotation = self.rotation.advanced(self.step);
        self.rotation
    }

    /// Withdraw the pending frame; no further ticks happen
    pub fn cancel(&mut self, scheduler: &mut dyn FrameScheduler) {
        if let Some(handle) = self.pending.take() {
            scheduler.cancel_frame(handle);
            debug!(rotation = ?self.rotation, "Rotation clock cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_one_tick() {
        let mut scheduler = ManualScheduler::new();
        let mut clock = RotationClock::new(Rotation::new(0.0, -30.0), DEFAULT_STEP);
        clock.start(&mut scheduler);
        let frame = scheduler.next_frame().unwrap();
        let rotation = clock.on_frame(frame, &mut scheduler).unwrap();
        assert!((rotation.longitude - 0.2).abs() < 1e-12);
        assert_eq!(rotation.latitude, -30.0);
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_cancel_stops_ticks() {
        let mut scheduler = ManualScheduler::new();
        let mut clock = RotationClock::new(Rotation::new(0.0, -30.0), DEFAULT_STEP);
        clock.start(&mut scheduler);
        clock.cancel(&mut scheduler);
        assert!(!clock.is_running());
        assert!(scheduler.next_frame().is_none());
    }

    #[test]
    fn test_stale_frame_ignored() {
        let mut scheduler = ManualScheduler::new();
        let mut clock = RotationClock::new(Rotation::new(10.0, 0.0), DEFAULT_STEP);
        clock.start(&mut scheduler);
        let frame = scheduler.next_frame().unwrap();
        clock.on_frame(frame, &mut scheduler);
        assert!(clock.on_frame(frame, &mut scheduler).is_none());
        assert!((clock.rotation().longitude - 10.2).abs() < 1e-12);
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut scheduler = ManualScheduler::new();
        let mut clock = RotationClock::new(Rotation::new(0.0, 0.0), DEFAULT_STEP);
        clock.start(&mut scheduler);
        clock.start(&mut scheduler);
        assert_eq!(scheduler.pending(), 1);
    }

    fn circular_diff(a: f64, b: f64) -> f64 {
        let d = (a - b).rem_euclid(360.0);
        d.min(360.0 - d)
    }

    proptest! {
        #[test]
        fn prop_longitude_stays_in_range(start in 0.0f64..360.0, ticks in 0usize..5000) {
            let mut clock = RotationClock::new(Rotation::new(start, -30.0), DEFAULT_STEP);
            for _ in 0..ticks {
                let r = clock.advance();
                prop_assert!(r.longitude >= 0.0 && r.longitude < 360.0);
                prop_assert_eq!(r.latitude, -30.0);
            }
        }

        #[test]
        fn prop_longitude_after_n_ticks(start in 0.0f64..360.0, ticks in 0usize..5000) {
            let mut clock = RotationClock::new(Rotation::new(start, -30.0), DEFAULT_STEP);
            for _ in 0..ticks {
                clock.advance();
            }
            let expected = (start + DEFAULT_STEP * ticks as f64).rem_euclid(360.0);
            prop_assert!(circular_diff(clock.rotation().longitude, expected) < 1e-6);
        }
    }
}
