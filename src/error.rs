//! Error handling for the privacy button controller

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or malformed configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Upstream session could not be established or was lost
    #[error("Connection error: {0}")]
    Connection(String),

    /// Camera name/id does not resolve upstream
    #[error("Camera not found: {0}")]
    CameraNotFound(String),

    /// Privacy/LED/IR call rejected by the camera platform
    #[error("Control error for camera {camera}: {message}")]
    Control { camera: String, message: String },

    /// Capability absent on this camera model or backend
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Digital I/O failure
    #[error("GPIO error: {0}")]
    Gpio(String),

    /// State file read/write failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the error only signals a missing capability
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::Unsupported(_))
    }

    pub fn control(camera: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Control {
            camera: camera.into(),
            message: message.into(),
        }
    }
}
