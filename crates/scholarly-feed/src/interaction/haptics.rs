//! Haptic feedback sinks.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Impact strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapticStyle {
    /// Short, light pulse.
    Light,
}

/// Device feedback requested by the dispatcher.
pub trait HapticSink: Send + Sync {
    /// Play one impact.
    fn impact(&self, style: HapticStyle);
}

/// Discards every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHaptics;

impl HapticSink for NoopHaptics {
    fn impact(&self, _style: HapticStyle) {}
}

/// Logs each request at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHaptics;

impl HapticSink for TracingHaptics {
    fn impact(&self, style: HapticStyle) {
        tracing::debug!(?style, "Haptic impact");
    }
}

/// Counts requests.
#[derive(Debug, Default)]
pub struct CountingHaptics {
    light: AtomicUsize,
}

impl CountingHaptics {
    /// Light impacts seen so far.
    #[must_use]
    pub fn light_count(&self) -> usize {
        self.light.load(Ordering::SeqCst)
    }
}

impl HapticSink for CountingHaptics {
    fn impact(&self, style: HapticStyle) {
        match style {
            HapticStyle::Light => self.light.fetch_add(1, Ordering::SeqCst),
        };
    }
}
