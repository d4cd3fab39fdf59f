//! Configuration data types
//!
//! Camera document (`cameras_config.json`) and upstream credentials

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default directory for per-camera state files
pub const DEFAULT_STATE_DIR: &str = "/opt/unifi-camera-privacy";

const DEFAULT_TIMEOUT_MINUTES: f64 = 60.0;
const DEFAULT_DEBOUNCE_SECS: f64 = 0.3;
const DEFAULT_POLL_DEBOUNCE_SECS: f64 = 0.5;
const DEFAULT_HARDWARE_DEBOUNCE_MS: u64 = 200;
const DEFAULT_STARTUP_DELAY_SECS: f64 = 5.0;
const DEFAULT_POLLING_INTERVAL_SECS: f64 = 0.1;

/// Root of the camera document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CamerasConfig {
    pub cameras: Vec<CameraEntry>,
    #[serde(default)]
    pub global_settings: GlobalSettings,
}

impl CamerasConfig {
    /// Entries with `enabled: true` (the default)
    pub fn enabled_cameras(&self) -> impl Iterator<Item = &CameraEntry> {
        self.cameras.iter().filter(|c| c.enabled)
    }
}

/// One managed camera
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraEntry {
    /// Camera name (or id) as known to the camera platform
    pub name: String,
    /// Button input pin (BCM numbering)
    pub gpio_pin: u8,
    /// Status LED output pin (BCM numbering)
    #[serde(default)]
    pub led_pin: Option<u8>,
    /// Fractions allowed
    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl CameraEntry {
    pub fn timeout(&self) -> Result<Duration> {
        let minutes = self.timeout_minutes;
        if !minutes.is_finite() || minutes <= 0.0 {
            return Err(Error::Config(format!(
                "Camera '{}': timeout_minutes must be greater than 0, got {}",
                self.name, minutes
            )));
        }
        match Duration::try_from_secs_f64(minutes * 60.0) {
            Ok(timeout) if !timeout.is_zero() => Ok(timeout),
            _ => Err(Error::Config(format!(
                "Camera '{}': timeout_minutes is out of range: {}",
                self.name, minutes
            ))),
        }
    }
}

fn default_timeout_minutes() -> f64 {
    DEFAULT_TIMEOUT_MINUTES
}

fn default_enabled() -> bool {
    true
}

/// Group-level overrides, all optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalSettings {
    /// Software debounce for the interrupt path (seconds)
    #[serde(default)]
    pub debounce_time: Option<f64>,
    /// Software debounce for the polling path (seconds)
    #[serde(default)]
    pub poll_debounce_time: Option<f64>,
    /// Debounce handed to the hardware layer at interrupt registration (ms)
    #[serde(default)]
    pub hardware_debounce_ms: Option<u64>,
    /// Delay before the scheduler loop starts (seconds)
    #[serde(default)]
    pub startup_delay: Option<f64>,
    /// Tick length (seconds)
    #[serde(default)]
    pub polling_interval: Option<f64>,
    /// State files live next to this path
    #[serde(default)]
    pub state_file_path: Option<PathBuf>,
}

impl GlobalSettings {
    /// Apply defaults and convert to durations. Negative, non-finite and
    /// unrepresentable values are rejected, as is a zero polling interval.
    pub fn resolve(&self) -> Result<GroupSettings> {
        let polling_interval = secs(
            "polling_interval",
            self.polling_interval
                .unwrap_or(DEFAULT_POLLING_INTERVAL_SECS),
        )?;
        if polling_interval.is_zero() {
            return Err(Error::Config(format!(
                "polling_interval must be positive, got {}",
                self.polling_interval.unwrap_or_default()
            )));
        }

        Ok(GroupSettings {
            interrupt_debounce: secs(
                "debounce_time",
                self.debounce_time.unwrap_or(DEFAULT_DEBOUNCE_SECS),
            )?,
            poll_debounce: secs(
                "poll_debounce_time",
                self.poll_debounce_time.unwrap_or(DEFAULT_POLL_DEBOUNCE_SECS),
            )?,
            hardware_debounce: Duration::from_millis(
                self.hardware_debounce_ms
                    .unwrap_or(DEFAULT_HARDWARE_DEBOUNCE_MS),
            ),
            startup_delay: secs(
                "startup_delay",
                self.startup_delay.unwrap_or(DEFAULT_STARTUP_DELAY_SECS),
            )?,
            polling_interval,
            state_dir: self
                .state_file_path
                .as_ref()
                .and_then(|p| p.parent())
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR)),
        })
    }
}

fn secs(name: &str, value: f64) -> Result<Duration> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::Config(format!(
            "{} must be zero or positive, got {}",
            name, value
        )));
    }
    Duration::try_from_secs_f64(value)
        .map_err(|_| Error::Config(format!("{} is out of range: {}", name, value)))
}

/// Resolved settings shared by every controller in a group
#[derive(Debug, Clone)]
pub struct GroupSettings {
    pub interrupt_debounce: Duration,
    pub poll_debounce: Duration,
    pub hardware_debounce: Duration,
    pub startup_delay: Duration,
    pub polling_interval: Duration,
    pub state_dir: PathBuf,
}

impl Default for GroupSettings {
    fn default() -> Self {
        Self {
            interrupt_debounce: Duration::from_millis(300),
            poll_debounce: Duration::from_millis(500),
            hardware_debounce: Duration::from_millis(DEFAULT_HARDWARE_DEBOUNCE_MS),
            startup_delay: Duration::from_secs(5),
            polling_interval: Duration::from_millis(100),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
        }
    }
}

/// Camera platform connection settings
#[derive(Clone)]
pub struct UpstreamConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub verify_ssl: bool,
}

impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"********")
            .field("verify_ssl", &self.verify_ssl)
            .finish()
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("UFP_HOST").unwrap_or_default(),
            port: std::env::var("UFP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(443),
            username: std::env::var("UFP_USERNAME").unwrap_or_default(),
            password: std::env::var("UFP_PASSWORD").unwrap_or_default(),
            verify_ssl: std::env::var("UFP_SSL_VERIFY")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(true),
        }
    }
}

impl UpstreamConfig {
    /// Names of required variables that are empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.host.is_empty() {
            missing.push("UFP_HOST");
        }
        if self.username.is_empty() {
            missing.push("UFP_USERNAME");
        }
        if self.password.is_empty() {
            missing.push("UFP_PASSWORD");
        }
        missing
    }
}
