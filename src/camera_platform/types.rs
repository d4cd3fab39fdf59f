//! Camera platform type definitions

use serde::Serialize;
use std::fmt;

/// Resolved camera identity, immutable after resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CameraRef {
    pub id: String,
    pub name: String,
}

/// Inventory row returned by `list_cameras`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CameraSummary {
    pub id: String,
    pub name: String,
    pub has_privacy_zone: bool,
}

impl CameraSummary {
    pub fn to_ref(&self) -> CameraRef {
        CameraRef {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

/// IR illuminator mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IrLedMode {
    Off,
    Auto,
}

impl IrLedMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Auto => "auto",
        }
    }
}

/// Named LED mode for platforms that expose one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LedMode {
    Blink,
    Normal,
}

/// Status light state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedStatus {
    On,
    Off,
    Unknown,
}

impl fmt::Display for LedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => write!(f, "ON"),
            Self::Off => write!(f, "OFF"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// IR illuminator state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrLedStatus {
    Off,
    Auto,
    On,
    /// Platform-specific mode name
    Other(String),
    NotAvailable,
    Unknown,
}

impl IrLedStatus {
    pub fn from_mode(mode: &str) -> Self {
        match mode.to_ascii_lowercase().as_str() {
            "off" => Self::Off,
            "auto" => Self::Auto,
            "on" => Self::On,
            "" => Self::Unknown,
            _ => Self::Other(mode.to_ascii_uppercase()),
        }
    }
}

impl fmt::Display for IrLedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "OFF"),
            Self::Auto => write!(f, "AUTO"),
            Self::On => write!(f, "ON"),
            Self::Other(mode) => write!(f, "{}", mode),
            Self::NotAvailable => write!(f, "NOT_AVAILABLE"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}
