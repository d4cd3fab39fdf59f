//! Per-source debounce bookkeeping

use std::time::Duration;
use tokio::time::Instant;

/// Minimum interval between accepted presses for one source
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    last_accepted: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn last_accepted(&self) -> Option<Instant> {
        self.last_accepted
    }

    pub fn record(&mut self, now: Instant) {
        self.last_accepted = Some(now);
    }
}
