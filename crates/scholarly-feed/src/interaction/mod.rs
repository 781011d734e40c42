//! Gesture handling for feed cards.
//!
//! [`InteractionDispatcher`] keeps one [`CardState`] and one [`TapTracker`]
//! per card and turns drag releases and taps into [`Action`]s:
//!
//! | Gesture            | Action                           |
//! |--------------------|----------------------------------|
//! | swipe right        | [`Action::ToggleBookmark`]       |
//! | swipe left         | [`Action::OpenChat`] (locks card)|
//! | swipe up           | [`Action::FocusNext`]            |
//! | swipe down         | [`Action::FocusPrevious`]        |
//! | double tap         | [`Action::ToggleLike`]           |

mod gesture;
mod haptics;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

pub use gesture::{CardState, GestureThresholds, Swipe, TapTracker};
pub use haptics::{CountingHaptics, HapticSink, HapticStyle, NoopHaptics, TracingHaptics};

/// Domain action produced by a gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Flip the bookmark on a paper.
    ToggleBookmark {
        /// Feed id of the paper.
        paper_id: String,
    },
    /// Hand the paper to the chat screen.
    OpenChat {
        /// Feed id of the paper.
        paper_id: String,
    },
    /// Move focus to the next card.
    FocusNext,
    /// Move focus to the previous card.
    FocusPrevious,
    /// Flip the like on a paper.
    ToggleLike {
        /// Feed id of the paper.
        paper_id: String,
    },
}

#[derive(Debug, Clone, Copy, Default)]
struct CardEntry {
    state: CardState,
    taps: TapTracker,
}

/// Maps raw gestures on cards to actions.
pub struct InteractionDispatcher {
    thresholds: GestureThresholds,
    cards: HashMap<String, CardEntry>,
    haptics: Arc<dyn HapticSink>,
}

impl InteractionDispatcher {
    /// Create a dispatcher.
    #[must_use]
    pub fn new(thresholds: GestureThresholds, haptics: Arc<dyn HapticSink>) -> Self {
        Self { thresholds, cards: HashMap::new(), haptics }
    }

    /// Current gesture state of a card.
    #[must_use]
    pub fn card_state(&self, paper_id: &str) -> CardState {
        self.cards.get(paper_id).map(|c| c.state).unwrap_or_default()
    }

    /// Record a live drag translation.
    pub fn on_drag(&mut self, paper_id: &str, dx: f32, dy: f32) {
        let card = self.card_mut(paper_id);
        card.state = card.state.drag(dx, dy);
    }

    /// Interpret a drag release.
    pub fn on_release(&mut self, paper_id: &str, dx: f32, dy: f32) -> Option<Action> {
        let thresholds = self.thresholds;
        let card = self.card_mut(paper_id);
        let (state, swipe) = card.state.release(dx, dy, &thresholds);
        card.state = state;

        let action = match swipe? {
            Swipe::Right => Action::ToggleBookmark { paper_id: paper_id.to_string() },
            Swipe::Left => Action::OpenChat { paper_id: paper_id.to_string() },
            Swipe::Up => Action::FocusNext,
            Swipe::Down => Action::FocusPrevious,
        };

        tracing::debug!(paper_id, dx, dy, ?action, "Swipe committed");
        if matches!(action, Action::ToggleBookmark { .. }) {
            self.haptics.impact(HapticStyle::Light);
        }
        Some(action)
    }

    /// Register a tap at `now`.
    pub fn on_tap(&mut self, paper_id: &str, now: Instant) -> Option<Action> {
        let window = self.thresholds.double_tap_window;
        let card = self.card_mut(paper_id);
        if card.state.is_locked() {
            return None;
        }
        if !card.taps.tap(now, window) {
            return None;
        }

        tracing::debug!(paper_id, "Double tap");
        self.haptics.impact(HapticStyle::Light);
        Some(Action::ToggleLike { paper_id: paper_id.to_string() })
    }

    /// The card re-entered the visible window; release any lock.
    pub fn on_card_visible(&mut self, paper_id: &str) {
        if let Some(card) = self.cards.get_mut(paper_id) {
            card.state = card.state.unlock();
            card.taps.reset();
        }
    }

    /// Drop all per-card state (the feed was replaced).
    pub fn clear(&mut self) {
        self.cards.clear();
    }

    fn card_mut(&mut self, paper_id: &str) -> &mut CardEntry {
        self.cards.entry(paper_id.to_string()).or_default()
    }
}

impl Default for InteractionDispatcher {
    fn default() -> Self {
        Self::new(GestureThresholds::default(), Arc::new(NoopHaptics))
    }
}

impl std::fmt::Debug for InteractionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionDispatcher")
            .field("thresholds", &self.thresholds)
            .field("cards", &self.cards.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn dispatcher() -> (InteractionDispatcher, Arc<CountingHaptics>) {
        let haptics = Arc::new(CountingHaptics::default());
        let dispatcher = InteractionDispatcher::new(GestureThresholds::default(), haptics.clone());
        (dispatcher, haptics)
    }

    #[test]
    fn test_swipe_sequence() {
        let (mut d, _) = dispatcher();
        let actions: Vec<_> = [
            d.on_release("a", 120.0, 0.0),
            d.on_release("b", -150.0, 0.0),
            d.on_release("c", 0.0, -80.0),
        ]
        .into_iter()
        .flatten()
        .collect();

        assert_eq!(
            actions,
            vec![
                Action::ToggleBookmark { paper_id: "a".to_string() },
                Action::OpenChat { paper_id: "b".to_string() },
                Action::FocusNext,
            ]
        );
    }

    #[test]
    fn test_short_releases_fire_nothing() {
        let (mut d, haptics) = dispatcher();
        for (dx, dy) in [(40.0, 0.0), (-40.0, 0.0), (0.0, 40.0), (0.0, -40.0)] {
            assert_eq!(d.on_release("a", dx, dy), None);
        }
        assert_eq!(d.card_state("a"), CardState::Idle);
        assert_eq!(haptics.light_count(), 0);
    }

    #[test]
    fn test_locked_card_ignores_input_until_visible() {
        let (mut d, _) = dispatcher();
        let now = Instant::now();

        assert!(d.on_release("a", -150.0, 0.0).is_some());
        assert!(d.card_state("a").is_locked());

        d.on_drag("a", 130.0, 0.0);
        assert!(d.card_state("a").is_locked());
        assert_eq!(d.on_release("a", 130.0, 0.0), None);
        assert_eq!(d.on_tap("a", now), None);
        assert_eq!(d.on_tap("a", now + Duration::from_millis(50)), None);

        d.on_card_visible("a");
        assert_eq!(d.card_state("a"), CardState::Idle);
        assert_eq!(
            d.on_release("a", 130.0, 0.0),
            Some(Action::ToggleBookmark { paper_id: "a".to_string() })
        );
    }

    #[test]
    fn test_double_tap_likes_with_haptic() {
        let (mut d, haptics) = dispatcher();
        let now = Instant::now();

        assert_eq!(d.on_tap("a", now), None);
        assert_eq!(
            d.on_tap("a", now + Duration::from_millis(200)),
            Some(Action::ToggleLike { paper_id: "a".to_string() })
        );
        assert_eq!(haptics.light_count(), 1);
    }

    #[test]
    fn test_taps_on_different_cards_do_not_pair() {
        let (mut d, _) = dispatcher();
        let now = Instant::now();
        assert_eq!(d.on_tap("a", now), None);
        assert_eq!(d.on_tap("b", now + Duration::from_millis(100)), None);
    }

    #[test]
    fn test_bookmark_swipe_pulses() {
        let (mut d, haptics) = dispatcher();
        d.on_release("a", 150.0, 0.0);
        d.on_release("a", 0.0, 90.0);
        assert_eq!(haptics.light_count(), 1);
    }
}
