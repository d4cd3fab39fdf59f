//! Configuration loading and validation
//!
//! ## Responsibilities
//!
//! - Parse the camera document
//! - Reject invalid documents before any pin or network resource is touched
//! - Read upstream credentials from the environment

mod types;

pub use types::*;

use crate::error::{Error, Result};
use std::collections::HashSet;
use std::path::Path;

/// Default camera document path
pub const DEFAULT_CONFIG_FILE: &str = "cameras_config.json";

/// Read, parse and validate the camera document
pub async fn load_cameras_config(path: &Path) -> Result<CamerasConfig> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        Error::Config(format!(
            "Camera config file {} could not be read: {}",
            path.display(),
            e
        ))
    })?;

    let config = parse_cameras_config(&raw)?;

    tracing::info!(
        path = %path.display(),
        enabled = config.enabled_cameras().count(),
        total = config.cameras.len(),
        "Camera config loaded"
    );

    Ok(config)
}

/// Parse and validate a camera document
pub fn parse_cameras_config(raw: &str) -> Result<CamerasConfig> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| Error::Config(format!("Invalid JSON in camera config: {}", e)))?;

    if value.get("cameras").map_or(true, |c| !c.is_array()) {
        return Err(Error::Config(
            "Config file must contain 'cameras' array".to_string(),
        ));
    }

    let config: CamerasConfig = serde_json::from_value(value)
        .map_err(|e| Error::Config(format!("Malformed camera config: {}", e)))?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &CamerasConfig) -> Result<()> {
    config.global_settings.resolve()?;

    let mut button_pins = HashSet::new();
    let mut led_pins = HashSet::new();

    for camera in config.enabled_cameras() {
        if camera.name.trim().is_empty() {
            return Err(Error::Config("Camera entry with empty name".to_string()));
        }
        camera.timeout()?;
        if !button_pins.insert(camera.gpio_pin) {
            return Err(Error::Config(format!(
                "Camera '{}': button GPIO {} is already used by another camera",
                camera.name, camera.gpio_pin
            )));
        }
        if let Some(led) = camera.led_pin {
            if !led_pins.insert(led) {
                return Err(Error::Config(format!(
                    "Camera '{}': LED GPIO {} is already used by another camera",
                    camera.name, led
                )));
            }
        }
    }

    for led in &led_pins {
        if button_pins.contains(led) {
            return Err(Error::Config(format!(
                "GPIO {} is configured both as a button and as an LED",
                led
            )));
        }
    }

    if button_pins.is_empty() {
        return Err(Error::Config("No enabled cameras configured".to_string()));
    }

    Ok(())
}

/// Fail with every missing credential named at once
pub fn validate_upstream(config: &UpstreamConfig) -> Result<()> {
    let missing = config.missing_fields();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Missing required configuration: {}",
            missing.join(", ")
        )))
    }
}
