//! Per-card gesture state machine.
//!
//! Translations use screen coordinates: `dx` grows to the right and `dy`
//! grows downward, so an upward swipe has a negative `dy`.

use std::time::{Duration, Instant};

/// Distances and timing that turn raw gestures into swipes and double taps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureThresholds {
    /// Horizontal travel needed for a left or right swipe.
    pub horizontal: f32,

    /// Vertical travel needed for an up or down swipe.
    pub vertical: f32,

    /// Maximum gap between two taps that count as a double tap.
    pub double_tap_window: Duration,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self {
            horizontal: 100.0,
            vertical: 50.0,
            double_tap_window: Duration::from_millis(250),
        }
    }
}

/// Direction of a committed swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Swipe {
    /// Dragged right past the horizontal threshold.
    Right,
    /// Dragged left past the horizontal threshold.
    Left,
    /// Dragged up past the vertical threshold.
    Up,
    /// Dragged down past the vertical threshold.
    Down,
}

impl GestureThresholds {
    /// Classify a release translation.
    ///
    /// The larger displacement picks the axis; equal magnitudes count as
    /// horizontal. Travel must exceed the axis threshold; reaching it exactly
    /// is no swipe.
    #[must_use]
    pub fn classify(&self, dx: f32, dy: f32) -> Option<Swipe> {
        if dy.abs() > dx.abs() {
            if dy < -self.vertical {
                Some(Swipe::Up)
            } else if dy > self.vertical {
                Some(Swipe::Down)
            } else {
                None
            }
        } else if dx > self.horizontal {
            Some(Swipe::Right)
        } else if dx < -self.horizontal {
            Some(Swipe::Left)
        } else {
            None
        }
    }
}

/// Gesture state of one card.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum CardState {
    /// At rest.
    #[default]
    Idle,

    /// Following the finger.
    Dragging {
        /// Live horizontal translation.
        dx: f32,
        /// Live vertical translation.
        dy: f32,
    },

    /// Flying off-screen after a left swipe; all input is ignored.
    Locked,
}

impl CardState {
    /// State after a drag update.
    #[must_use]
    pub const fn drag(self, dx: f32, dy: f32) -> Self {
        match self {
            Self::Locked => Self::Locked,
            Self::Idle | Self::Dragging { .. } => Self::Dragging { dx, dy },
        }
    }

    /// State and committed swipe after the finger lifts.
    ///
    /// A left swipe locks the card; every other outcome returns it to rest.
    #[must_use]
    pub fn release(self, dx: f32, dy: f32, thresholds: &GestureThresholds) -> (Self, Option<Swipe>) {
        if self.is_locked() {
            return (self, None);
        }
        match thresholds.classify(dx, dy) {
            Some(Swipe::Left) => (Self::Locked, Some(Swipe::Left)),
            swipe => (Self::Idle, swipe),
        }
    }

    /// State once the card is back in the visible window.
    #[must_use]
    pub const fn unlock(self) -> Self {
        match self {
            Self::Locked => Self::Idle,
            other => other,
        }
    }

    /// Check if the card ignores input.
    #[must_use]
    pub const fn is_locked(self) -> bool {
        matches!(self, Self::Locked)
    }
}

/// Double-tap detector.
#[derive(Debug, Clone, Copy, Default)]
pub struct TapTracker {
    last_tap: Option<Instant>,
}

impl TapTracker {
    /// Register a tap at `now`.
    ///
    /// Returns true when it completes a double tap, after which the tracker
    /// starts over so a third tap cannot pair with the second.
    pub fn tap(&mut self, now: Instant, window: Duration) -> bool {
        match self.last_tap {
            Some(previous) if now.saturating_duration_since(previous) < window => {
                self.last_tap = None;
                true
            }
            _ => {
                self.last_tap = Some(now);
                false
            }
        }
    }

    /// Forget any pending first tap.
    pub fn reset(&mut self) {
        self.last_tap = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> GestureThresholds {
        GestureThresholds::default()
    }

    #[test]
    fn test_classify_axes() {
        let t = thresholds();
        assert_eq!(t.classify(120.0, 10.0), Some(Swipe::Right));
        assert_eq!(t.classify(-150.0, 0.0), Some(Swipe::Left));
        assert_eq!(t.classify(5.0, -80.0), Some(Swipe::Up));
        assert_eq!(t.classify(5.0, 80.0), Some(Swipe::Down));
    }

    #[test]
    fn test_classify_below_threshold() {
        let t = thresholds();
        for (dx, dy) in [(40.0, 0.0), (-40.0, 0.0), (0.0, 40.0), (0.0, -40.0)] {
            assert_eq!(t.classify(dx, dy), None, "({dx}, {dy})");
        }
    }

    #[test]
    fn test_threshold_must_be_exceeded() {
        let t = thresholds();
        assert_eq!(t.classify(100.0, 0.0), None);
        assert_eq!(t.classify(-100.0, 0.0), None);
        assert_eq!(t.classify(0.0, -50.0), None);
        assert_eq!(t.classify(0.0, 50.0), None);

        assert_eq!(t.classify(100.5, 0.0), Some(Swipe::Right));
        assert_eq!(t.classify(-100.5, 0.0), Some(Swipe::Left));
        assert_eq!(t.classify(0.0, -50.5), Some(Swipe::Up));
        assert_eq!(t.classify(0.0, 50.5), Some(Swipe::Down));
    }

    #[test]
    fn test_larger_axis_wins() {
        let t = thresholds();
        // 60 vertical passes its threshold but horizontal is larger
        assert_eq!(t.classify(70.0, -60.0), None);
        assert_eq!(t.classify(60.0, -70.0), Some(Swipe::Up));
    }

    #[test]
    fn test_tie_is_horizontal() {
        let t = thresholds();
        assert_eq!(t.classify(120.0, 120.0), Some(Swipe::Right));
        assert_eq!(t.classify(80.0, -80.0), None);
    }

    #[test]
    fn test_left_release_locks() {
        let (state, swipe) = CardState::Idle.drag(-150.0, 0.0).release(-150.0, 0.0, &thresholds());
        assert_eq!(swipe, Some(Swipe::Left));
        assert!(state.is_locked());

        let (state, swipe) = state.drag(200.0, 0.0).release(200.0, 0.0, &thresholds());
        assert_eq!(swipe, None);
        assert_eq!(state.unlock(), CardState::Idle);
    }

    #[test]
    fn test_right_release_returns_to_rest() {
        let dragging = CardState::Idle.drag(120.0, 3.0);
        assert_eq!(dragging, CardState::Dragging { dx: 120.0, dy: 3.0 });
        let (state, swipe) = dragging.release(120.0, 3.0, &thresholds());
        assert_eq!(swipe, Some(Swipe::Right));
        assert_eq!(state, CardState::Idle);
    }

    #[test]
    fn test_double_tap_window() {
        let window = Duration::from_millis(250);
        let start = Instant::now();

        let mut tracker = TapTracker::default();
        assert!(!tracker.tap(start, window));
        assert!(tracker.tap(start + Duration::from_millis(200), window));
        // Third tap starts a new pair
        assert!(!tracker.tap(start + Duration::from_millis(300), window));

        let mut tracker = TapTracker::default();
        assert!(!tracker.tap(start, window));
        assert!(!tracker.tap(start + Duration::from_millis(400), window));
    }

    #[test]
    fn test_taps_exactly_one_window_apart_are_single() {
        let window = Duration::from_millis(250);
        let start = Instant::now();

        let mut tracker = TapTracker::default();
        assert!(!tracker.tap(start, window));
        assert!(!tracker.tap(start + window, window));
        // The second tap became the new first tap
        assert!(tracker.tap(start + window + Duration::from_millis(249), window));
    }
}
