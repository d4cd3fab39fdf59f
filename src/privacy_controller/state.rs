//! Privacy state machine data

use chrono::{DateTime, Utc};
use std::time::Duration;

/// `Disabled` or `Enabled(since)`; the timestamp exists exactly while enabled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrivacyState {
    enabled_at: Option<DateTime<Utc>>,
}

impl PrivacyState {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn enabled_since(at: DateTime<Utc>) -> Self {
        Self { enabled_at: Some(at) }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled_at.is_some()
    }

    pub fn enabled_at(&self) -> Option<DateTime<Utc>> {
        self.enabled_at
    }

    /// Time spent enabled; zero when disabled or when the clock went backwards
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        self.enabled_at
            .and_then(|at| (now - at).to_std().ok())
            .unwrap_or(Duration::ZERO)
    }

    pub fn is_expired(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        self.is_enabled() && self.elapsed(now) >= timeout
    }
}
