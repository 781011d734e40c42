//! Search-text debouncing.

use std::time::{Duration, Instant};

/// Deadline tracker for the latest keystroke.
///
/// Every [`push`](Self::push) restarts the window. Only a
/// [`poll`](Self::poll) after the latest deadline yields the text.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    pending: Option<(String, Instant)>,
}

impl Debouncer {
    /// Create a debouncer with the given quiet period.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self { window, pending: None }
    }

    /// Record new text at `now`; returns the deadline it must survive to.
    pub fn push(&mut self, text: impl Into<String>, now: Instant) -> Instant {
        let deadline = now + self.window;
        self.pending = Some((text.into(), deadline));
        deadline
    }

    /// Take the pending text if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match self.pending {
            Some((_, deadline)) if now >= deadline => self.pending.take().map(|(text, _)| text),
            _ => None,
        }
    }

    /// Check if text is waiting for its deadline.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_last_keystroke_survives() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(500));

        let first = debouncer.push("tra", start);
        debouncer.push("transformers", start + Duration::from_millis(300));

        assert_eq!(debouncer.poll(first), None);
        assert!(debouncer.is_pending());
        assert_eq!(
            debouncer.poll(start + Duration::from_millis(800)),
            Some("transformers".to_string())
        );
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.poll(start + Duration::from_secs(5)), None);
    }
}
