//! Status LED signal derived from bank health.
//!
//! Two states: all healthy drives a solid green, any unhealthy channel
//! drives a red blink at a fixed half-period. The check is level-triggered
//! on every scheduler pass and the blink phase carries across healthy
//! interludes, so a flapping channel cannot pin the LED on.

use crate::config::LED_BLINK_MS;

/// Aggregate indicator classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndicatorState {
    AllHealthy,
    Degraded,
}

/// Drive levels for the two status LEDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedState {
    pub red: bool,
    pub green: bool,
}

/// Blink-phase holder for the degraded signal.
pub struct StatusIndicator {
    state: IndicatorState,
    blink_on: bool,
    last_toggle_ms: u32,
}

impl StatusIndicator {
    pub const fn new() -> Self {
        Self {
            state: IndicatorState::AllHealthy,
            blink_on: false,
            last_toggle_ms: 0,
        }
    }

    /// Advance the indicator for this pass and return the LED drive levels.
    pub fn update(
        &mut self,
        any_unhealthy: bool,
        now_ms: u32,
    ) -> LedState {
        if any_unhealthy {
            self.state = IndicatorState::Degraded;
            if now_ms.wrapping_sub(self.last_toggle_ms) >= LED_BLINK_MS {
                self.blink_on = !self.blink_on;
                self.last_toggle_ms = now_ms;
            }
            LedState {
                red: self.blink_on,
                green: false,
            }
        } else {
            self.state = IndicatorState::AllHealthy;
            LedState {
                red: false,
                green: true,
            }
        }
    }

    #[inline]
    pub const fn state(&self) -> IndicatorState { self.state }
}

impl Default for StatusIndicator {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_green_while_healthy() {
        let mut indicator = StatusIndicator::new();
        for now in (0..5_000).step_by(100) {
            let led = indicator.update(false, now);
            assert_eq!(led, LedState { red: false, green: true });
            assert_eq!(indicator.state(), IndicatorState::AllHealthy);
        }
    }

    #[test]
    fn test_red_toggles_at_blink_cadence() {
        let mut indicator = StatusIndicator::new();
        let mut transitions = 0;
        let mut prev_red = indicator.update(true, 0).red;

        for now in (100..=4_000u32).step_by(100) {
            let led = indicator.update(true, now);
            assert!(!led.green);
            if led.red != prev_red {
                transitions += 1;
                prev_red = led.red;
            }
        }
        // 4 seconds at a 500 ms half-period is 8 toggles
        assert_eq!(transitions, 8);
        assert_eq!(indicator.state(), IndicatorState::Degraded);
    }

    #[test]
    fn test_phase_survives_healthy_interlude() {
        let mut indicator = StatusIndicator::new();
        // First degraded pass toggles immediately (wrap distance from 0)
        let led = indicator.update(true, 500);
        assert!(led.red);

        // Healthy for a while; green does not disturb the blink phase
        assert!(indicator.update(false, 600).green);
        assert!(indicator.update(false, 900).green);

        // Re-entering before the half-period elapses keeps the lit phase
        let led = indicator.update(true, 950);
        assert!(led.red);
        // Next half-period boundary flips it off
        let led = indicator.update(true, 1_000);
        assert!(!led.red);
    }

    #[test]
    fn test_recovery_restores_solid_green() {
        let mut indicator = StatusIndicator::new();
        indicator.update(true, 500);
        let led = indicator.update(false, 600);
        assert_eq!(led, LedState { red: false, green: true });
    }
}
