//! PrivacyControl - Camera Control Adapter
//!
//! ## Responsibilities
//!
//! - Translate privacy transitions into camera platform calls
//! - Privacy call is authoritative; status LED and IR follow best-effort
//! - LED control walks an ordered strategy list, stopping at the first success

use crate::camera_platform::{CameraPlatform, CameraRef, IrLedMode, IrLedStatus, LedMode, LedStatus};
use crate::error::{Error, Result};
use std::fmt;
use std::sync::Arc;

/// One way of switching the status LED
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedStrategy {
    StatusLight,
    DeviceProperty(&'static str),
    LedMode,
}

impl fmt::Display for LedStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StatusLight => write!(f, "status_light"),
            Self::DeviceProperty(name) => write!(f, "device_property:{}", name),
            Self::LedMode => write!(f, "led_mode"),
        }
    }
}

/// Tried in order
pub const LED_STRATEGIES: [LedStrategy; 5] = [
    LedStrategy::StatusLight,
    LedStrategy::DeviceProperty("status_light"),
    LedStrategy::DeviceProperty("led_enabled"),
    LedStrategy::DeviceProperty("indicator_light"),
    LedStrategy::LedMode,
];

/// Result of a capability call that may be absent on the camera
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlOutcome {
    Applied(String),
    NotAvailable,
}

/// Adapter over the shared upstream session
#[derive(Clone)]
pub struct PrivacyControl {
    platform: Arc<dyn CameraPlatform>,
}

impl PrivacyControl {
    pub fn new(platform: Arc<dyn CameraPlatform>) -> Self {
        Self { platform }
    }

    pub fn platform(&self) -> &Arc<dyn CameraPlatform> {
        &self.platform
    }

    /// Privacy on: blackout, LED off, IR off. Privacy off mirrors it.
    pub async fn apply_privacy(&self, camera: &CameraRef, enable: bool) -> Result<()> {
        let result = if enable {
            self.platform.enable_privacy(camera).await
        } else {
            self.platform.disable_privacy(camera).await
        };
        result.map_err(|e| match e {
            Error::Control { .. } => e,
            other => Error::control(&camera.name, other.to_string()),
        })?;

        match self.set_led(camera, !enable).await {
            Ok(ControlOutcome::Applied(strategy)) => {
                tracing::debug!(camera = %camera.name, strategy = %strategy, on = !enable, "Status LED updated");
            }
            Ok(ControlOutcome::NotAvailable) => {
                tracing::info!(camera = %camera.name, "Status LED control not available");
            }
            Err(e) => {
                tracing::warn!(camera = %camera.name, error = %e, "Status LED update failed");
            }
        }

        let ir_mode = if enable { IrLedMode::Off } else { IrLedMode::Auto };
        match self.set_ir(camera, ir_mode).await {
            Ok(ControlOutcome::Applied(_)) => {
                tracing::debug!(camera = %camera.name, mode = ir_mode.as_str(), "IR LED updated");
            }
            Ok(ControlOutcome::NotAvailable) => {
                tracing::info!(camera = %camera.name, "IR LED control not available");
            }
            Err(e) => {
                tracing::warn!(camera = %camera.name, error = %e, "IR LED update failed");
            }
        }

        Ok(())
    }

    /// First successful strategy wins. Errors that are not capability
    /// absence are returned only when no strategy succeeded.
    pub async fn set_led(&self, camera: &CameraRef, on: bool) -> Result<ControlOutcome> {
        let mut last_error = None;

        for strategy in LED_STRATEGIES {
            let result = match strategy {
                LedStrategy::StatusLight => self.platform.set_status_light(camera, on).await,
                LedStrategy::DeviceProperty(property) => {
                    self.platform
                        .update_device_property(camera, property, on)
                        .await
                }
                LedStrategy::LedMode => {
                    let mode = if on { LedMode::Normal } else { LedMode::Blink };
                    self.platform.set_led_mode(camera, mode).await
                }
            };

            match result {
                Ok(()) => return Ok(ControlOutcome::Applied(strategy.to_string())),
                Err(e) if e.is_unsupported() => {
                    tracing::debug!(camera = %camera.name, strategy = %strategy, "LED strategy unsupported");
                }
                Err(e) => {
                    tracing::debug!(camera = %camera.name, strategy = %strategy, error = %e, "LED strategy failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(ControlOutcome::NotAvailable),
        }
    }

    pub async fn set_ir(&self, camera: &CameraRef, mode: IrLedMode) -> Result<ControlOutcome> {
        match self.platform.set_ir_led_mode(camera, mode).await {
            Ok(()) => Ok(ControlOutcome::Applied(mode.as_str().to_string())),
            Err(e) if e.is_unsupported() => Ok(ControlOutcome::NotAvailable),
            Err(e) => Err(e),
        }
    }

    pub async fn led_status(&self, camera: &CameraRef) -> Result<LedStatus> {
        self.platform.led_status(camera).await
    }

    pub async fn ir_status(&self, camera: &CameraRef) -> Result<IrLedStatus> {
        self.platform.ir_led_status(camera).await
    }
}
