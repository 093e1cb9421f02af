//! Viewport reactor: debounces resize notifications.
//!
//! Time is passed in explicitly so the logic stays deterministic; the
//! viewer feeds it `Instant::now()` and uses `deadline()` as a poll timeout.

use std::time::{Duration, Instant};

/// Keeps only the latest value and releases it after a quiet period.
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    /// Record a new value; restarts the quiet period.
    pub fn notify(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    /// Take the value if nothing arrived for the quiet period.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, at)) if now.saturating_duration_since(*at) >= self.quiet => {
                self.pending.take().map(|(v, _)| v)
            }
            _ => None,
        }
    }

    /// When the pending value becomes due.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at + self.quiet)
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Debounced viewport width, in pixels.
pub struct ViewportReactor {
    debouncer: Debouncer<u32>,
}

impl ViewportReactor {
    pub fn new(quiet: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(quiet),
        }
    }

    pub fn on_resize(&mut self, width_px: u32, now: Instant) {
        self.debouncer.notify(width_px, now);
    }

    /// The settled width, once the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<u32> {
        self.debouncer.poll(now)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }
}
