//! PrivacyController - Per-Camera Privacy State Machine
//!
//! ## Responsibilities
//!
//! - Toggle privacy on every accepted press
//! - Auto-disable once the configured timeout has elapsed
//! - Drive the local status LED and persist after each successful transition
//! - Restore the last snapshot at startup
//!
//! Transitions for one camera are serialized by running the controller inside
//! its own worker task ([`ControllerHandle`]).

mod state;
mod worker;

pub use state::PrivacyState;
pub use worker::ControllerHandle;

use crate::camera_platform::CameraRef;
use crate::error::Result;
use crate::gpio::{GpioBackend, Level};
use crate::privacy_control::PrivacyControl;
use crate::state_store::{PersistedState, StateStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// What caused a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Button,
    Timeout,
}

/// Local status LED: HIGH while privacy is off, LOW while on
#[derive(Clone)]
pub struct StatusLed {
    backend: Arc<dyn GpioBackend>,
    pin: u8,
}

impl StatusLed {
    pub fn new(backend: Arc<dyn GpioBackend>, pin: u8) -> Self {
        Self { backend, pin }
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    pub fn show(&self, privacy_enabled: bool) {
        let level = if privacy_enabled { Level::Low } else { Level::High };
        if let Err(e) = self.backend.write_level(self.pin, level) {
            tracing::warn!(pin = self.pin, error = %e, "Failed to drive status LED");
        }
    }
}

pub struct PrivacyController {
    camera: CameraRef,
    /// Name the state file is keyed by (the configured camera name)
    state_name: String,
    control: PrivacyControl,
    led: Option<StatusLed>,
    store: StateStore,
    state: PrivacyState,
    timeout: Duration,
}

impl PrivacyController {
    pub fn new(
        camera: CameraRef,
        control: PrivacyControl,
        led: Option<StatusLed>,
        store: StateStore,
        timeout: Duration,
    ) -> Self {
        Self {
            state_name: camera.name.clone(),
            camera,
            control,
            led,
            store,
            state: PrivacyState::disabled(),
            timeout,
        }
    }

    /// Key the state file by `name` instead of the upstream camera name
    pub fn with_state_name(mut self, name: impl Into<String>) -> Self {
        self.state_name = name.into();
        self
    }

    pub fn camera(&self) -> &CameraRef {
        &self.camera
    }

    pub fn state(&self) -> PrivacyState {
        self.state
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Load the persisted snapshot without re-applying it to the camera
    pub async fn restore(&mut self, now: DateTime<Utc>) {
        if let Some(saved) = self.store.load(&self.state_name).await {
            self.state = if saved.privacy_enabled {
                PrivacyState::enabled_since(saved.privacy_start_time.unwrap_or(now))
            } else {
                PrivacyState::disabled()
            };

            if let Some(at) = self.state.enabled_at() {
                let remaining = self.timeout.saturating_sub(self.state.elapsed(now));
                tracing::info!(
                    camera = %self.camera.name,
                    enabled_at = %at,
                    remaining_secs = remaining.as_secs(),
                    "Restored privacy state: enabled"
                );
            } else {
                tracing::info!(camera = %self.camera.name, "Restored privacy state: disabled");
            }
        }
        self.show_led();
    }

    /// A press always toggles
    pub async fn handle_press(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.state.is_enabled() {
            self.disable(Trigger::Button).await
        } else {
            self.enable(now).await
        }
    }

    /// Disable when the timeout has elapsed. Returns whether a transition
    /// happened; a failed disable leaves the state enabled for the next check.
    pub async fn check_timeout(&mut self, now: DateTime<Utc>) -> Result<bool> {
        if !self.state.is_expired(now, self.timeout) {
            return Ok(false);
        }
        tracing::info!(
            camera = %self.camera.name,
            timeout_secs = self.timeout.as_secs(),
            "Privacy timeout reached"
        );
        self.disable(Trigger::Timeout).await?;
        Ok(true)
    }

    pub async fn enable(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.state.is_enabled() {
            return Ok(());
        }
        self.control.apply_privacy(&self.camera, true).await?;

        self.state = PrivacyState::enabled_since(now);
        self.show_led();
        self.persist().await;
        tracing::info!(
            camera = %self.camera.name,
            timeout_secs = self.timeout.as_secs(),
            "Privacy enabled"
        );
        Ok(())
    }

    pub async fn disable(&mut self, trigger: Trigger) -> Result<()> {
        if !self.state.is_enabled() {
            return Ok(());
        }
        self.control.apply_privacy(&self.camera, false).await?;

        self.state = PrivacyState::disabled();
        self.show_led();
        self.persist().await;
        tracing::info!(camera = %self.camera.name, trigger = ?trigger, "Privacy disabled");
        Ok(())
    }

    pub fn snapshot(&self) -> PersistedState {
        PersistedState {
            privacy_enabled: self.state.is_enabled(),
            privacy_start_time: self.state.enabled_at(),
            camera_name: self.state_name.clone(),
        }
    }

    pub async fn persist(&self) -> bool {
        self.store.save(&self.snapshot()).await
    }

    fn show_led(&self) {
        if let Some(led) = &self.led {
            led.show(self.state.is_enabled());
        }
    }
}
