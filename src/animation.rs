//! Marker pulse animation
//!
//! Each visible marker pulses its opacity 0.9 → 0.2 → 0.9 forever, 800 ms per
//! leg with cubic in-out easing. A pulse is an explicit state machine advanced
//! by the frame tick; [`PulseBank`] keeps one per marker currently in the
//! scene.

use std::collections::HashMap;

use tracing::trace;

pub const PULSE_HIGH: f64 = 0.9;
pub const PULSE_LOW: f64 = 0.2;
pub const PULSE_LEG_MS: f64 = 800.0;

/// d3's `easeCubicInOut`
pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PulseState {
    /// High to low; `elapsed` milliseconds into the leg
    FadingOut { elapsed: f64 },
    /// Low to high
    FadingIn { elapsed: f64 },
    Stopped,
}

/// One marker's opacity pulse
#[derive(Debug, Clone, PartialEq)]
pub struct PulseAnimation {
    state: PulseState,
    leg_ms: f64,
    opacity: f64,
}

impl Default for PulseAnimation {
    fn default() -> Self {
        Self::new()
    }
}

impl PulseAnimation {
    /// Start at full opacity, fading out
    pub fn new() -> Self {
        Self {
            state: PulseState::FadingOut { elapsed: 0.0 },
            leg_ms: PULSE_LEG_MS,
            opacity: PULSE_HIGH,
        }
    }

    pub fn with_leg_duration(mut self, leg_ms: f64) -> Self {
        self.leg_ms = leg_ms.max(f64::MIN_POSITIVE);
        self
    }

    pub fn state(&self) -> PulseState {
        self.state
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn is_running(&self) -> bool {
        self.state != PulseState::Stopped
    }

    /// Advance by `dt` milliseconds and return the new opacity
    ///
    /// A stopped pulse keeps its last opacity and never changes again.
    pub fn advance(&mut self, dt: f64) -> f64 {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        // a full cycle returns to the same state
        let mut remaining = dt % (2.0 * self.leg_ms);
        loop {
            match self.state {
                PulseState::Stopped => return self.opacity,
                PulseState::FadingOut { elapsed } | PulseState::FadingIn { elapsed } => {
                    let fading_out = matches!(self.state, PulseState::FadingOut { .. });
                    let total = elapsed + remaining;
                    if total < self.leg_ms {
                        self.state = if fading_out {
                            PulseState::FadingOut { elapsed: total }
                        } else {
                            PulseState::FadingIn { elapsed: total }
                        };
                        self.opacity = leg_opacity(fading_out, total / self.leg_ms);
                        return self.opacity;
                    }
                    remaining = total - self.leg_ms;
                    self.state = if fading_out {
                        PulseState::FadingIn { elapsed: 0.0 }
                    } else {
                        PulseState::FadingOut { elapsed: 0.0 }
                    };
                    self.opacity = if fading_out { PULSE_LOW } else { PULSE_HIGH };
                }
            }
        }
    }

    pub fn cancel(&mut self) {
        self.state = PulseState::Stopped;
    }
}

fn leg_opacity(fading_out: bool, t: f64) -> f64 {
    let eased = ease_cubic_in_out(t);
    if fading_out {
        PULSE_HIGH + (PULSE_LOW - PULSE_HIGH) * eased
    } else {
        PULSE_LOW + (PULSE_HIGH - PULSE_LOW) * eased
    }
}

/// Pulses of the markers currently in the scene, by marker name
#[derive(Debug, Clone)]
pub struct PulseBank {
    pulses: HashMap<String, PulseAnimation>,
    leg_ms: f64,
}

impl Default for PulseBank {
    fn default() -> Self {
        Self::new()
    }
}

impl PulseBank {
    pub fn new() -> Self {
        Self {
            pulses: HashMap::new(),
            leg_ms: PULSE_LEG_MS,
        }
    }

    /// Leg duration of pulses started from now on
    pub fn with_leg_duration(mut self, leg_ms: f64) -> Self {
        self.leg_ms = leg_ms;
        self
    }

    /// The pulse for `name`, started if the marker just entered the scene
    pub fn ensure(&mut self, name: &str) -> &PulseAnimation {
        let leg_ms = self.leg_ms;
        self.pulses.entry(name.to_string()).or_insert_with(|| {
            trace!(marker = name, "Starting pulse");
            PulseAnimation::new().with_leg_duration(leg_ms)
        })
    }

    /// Tear down pulses of markers no longer in the scene
    pub fn retain_visible(&mut self, visible: &[&str]) {
        self.pulses.retain(|name, pulse| {
            let keep = visible.contains(&name.as_str());
            if !keep {
                trace!(marker = name.as_str(), "Stopping pulse");
                pulse.cancel();
            }
            keep
        });
    }

    /// Advance every pulse and report the new opacities
    pub fn advance(&mut self, dt: f64) -> Vec<(String, f64)> {
        self.pulses
            .iter_mut()
            .map(|(name, pulse)| (name.clone(), pulse.advance(dt)))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&PulseAnimation> {
        self.pulses.get(name)
    }

    pub fn opacity(&self, name: &str) -> Option<f64> {
        self.get(name).map(PulseAnimation::opacity)
    }

    /// Stop and drop every pulse
    pub fn cancel_all(&mut self) {
        for pulse in self.pulses.values_mut() {
            pulse.cancel();
        }
        self.pulses.clear();
    }

    pub fn len(&self) -> usize {
        self.pulses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pulses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_endpoints() {
        assert_eq!(ease_cubic_in_out(0.0), 0.0);
        assert_eq!(ease_cubic_in_out(1.0), 1.0);
        assert!((ease_cubic_in_out(0.5) - 0.5).abs() < 1e-12);
        assert!(ease_cubic_in_out(0.25) < 0.25);
    }

    #[test]
    fn test_pulse_cycle() {
        let mut pulse = PulseAnimation::new();
        assert_eq!(pulse.opacity(), PULSE_HIGH);

        let mid = pulse.advance(400.0);
        assert!((mid - 0.55).abs() < 1e-9);

        pulse.advance(400.0);
        assert!((pulse.opacity() - PULSE_LOW).abs() < 1e-9);
        assert!(matches!(pulse.state(), PulseState::FadingIn { .. }));

        pulse.advance(800.0);
        assert!((pulse.opacity() - PULSE_HIGH).abs() < 1e-9);
        assert!(matches!(pulse.state(), PulseState::FadingOut { .. }));
    }

    #[test]
    fn test_large_step_crosses_several_legs() {
        let mut pulse = PulseAnimation::new();
        pulse.advance(2.5 * PULSE_LEG_MS);
        // two full legs plus half of a fade-out
        assert!(matches!(pulse.state(), PulseState::FadingOut { .. }));
        assert!((pulse.opacity() - 0.55).abs() < 1e-9);
    }

    #[test]
    fn test_cancel_freezes_opacity() {
        let mut pulse = PulseAnimation::new();
        let before = pulse.advance(300.0);
        pulse.cancel();
        assert!(!pulse.is_running());
        assert_eq!(pulse.advance(500.0), before);
        assert_eq!(pulse.state(), PulseState::Stopped);
    }

    #[test]
    fn test_bank_tracks_scene_membership() {
        let mut bank = PulseBank::new();
        bank.ensure("Toronto");
        bank.ensure("San Francisco");
        bank.advance(100.0);
        bank.ensure("Toronto");
        assert_eq!(bank.len(), 2);
        assert!(bank.opacity("Toronto").unwrap() < PULSE_HIGH);

        bank.retain_visible(&["Toronto"]);
        assert_eq!(bank.len(), 1);
        assert!(bank.get("San Francisco").is_none());

        bank.cancel_all();
        assert!(bank.is_empty());
        assert_eq!(bank.leg_ms, PULSE_LEG_MS);
        assert!(bank.advance(100.0).is_empty());
    }
}
