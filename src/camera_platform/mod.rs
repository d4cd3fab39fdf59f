//! Camera Platform - upstream camera-management boundary
//!
//! The orchestrator only talks to cameras through [`CameraPlatform`].
//! [`ProtectClient`] is the UniFi Protect implementation used by the binary.

mod protect_client;
mod types;

pub use protect_client::ProtectClient;
pub use types::*;

use crate::error::{Error, Result};
use async_trait::async_trait;

/// Shared upstream session, read-only from the controllers' side
#[async_trait]
pub trait CameraPlatform: Send + Sync {
    /// All cameras known to the platform
    async fn list_cameras(&self) -> Result<Vec<CameraSummary>>;

    /// Black out video (privacy zone / privacy mode)
    async fn enable_privacy(&self, camera: &CameraRef) -> Result<()>;

    /// Restore video
    async fn disable_privacy(&self, camera: &CameraRef) -> Result<()>;

    /// Direct status-light toggle
    async fn set_status_light(&self, camera: &CameraRef, on: bool) -> Result<()>;

    /// Generic boolean device-property update
    async fn update_device_property(
        &self,
        camera: &CameraRef,
        property: &str,
        value: bool,
    ) -> Result<()>;

    /// Named LED mode
    async fn set_led_mode(&self, camera: &CameraRef, mode: LedMode) -> Result<()>;

    /// IR illuminator mode
    async fn set_ir_led_mode(&self, camera: &CameraRef, mode: IrLedMode) -> Result<()>;

    async fn led_status(&self, camera: &CameraRef) -> Result<LedStatus>;

    async fn ir_led_status(&self, camera: &CameraRef) -> Result<IrLedStatus>;
}

/// Resolve a configured camera by name (case-insensitive) or id
pub async fn resolve_camera(platform: &dyn CameraPlatform, name_or_id: &str) -> Result<CameraRef> {
    let cameras = platform.list_cameras().await?;
    find_camera(&cameras, name_or_id)
        .map(CameraSummary::to_ref)
        .ok_or_else(|| Error::CameraNotFound(name_or_id.to_string()))
}

/// Name match wins over id match
pub fn find_camera<'a>(cameras: &'a [CameraSummary], name_or_id: &str) -> Option<&'a CameraSummary> {
    cameras
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name_or_id))
        .or_else(|| cameras.iter().find(|c| c.id == name_or_id))
}
