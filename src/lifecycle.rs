//! Service lifecycle
//!
//! Startup order: camera document → upstream session → GPIO → scheduler.
//! Configuration problems fail before any pin or network resource is touched.
//! Shutdown stops the scheduler (controllers persist their final state), then
//! drives LEDs low and releases every pin.

use crate::camera_platform::{CameraPlatform, ProtectClient};
use crate::config::{load_cameras_config, validate_upstream, CamerasConfig, UpstreamConfig};
use crate::error::Result;
use crate::gpio::{GpioBackend, GpioSession};
use crate::scheduler::SchedulerGroup;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Run the button controller until a termination signal arrives
pub async fn run_service(config_path: &Path, upstream: &UpstreamConfig) -> Result<()> {
    let config = load_cameras_config(config_path).await?;
    validate_upstream(upstream)?;

    let platform: Arc<dyn CameraPlatform> = Arc::new(ProtectClient::connect(upstream).await?);
    let backend = open_gpio()?;

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    run_group(platform, backend, &config, shutdown).await
}

/// Set up the group on `backend` and run it until `shutdown` fires.
/// GPIO is released on every exit path.
pub async fn run_group(
    platform: Arc<dyn CameraPlatform>,
    backend: Arc<dyn GpioBackend>,
    config: &CamerasConfig,
    shutdown: CancellationToken,
) -> Result<()> {
    let mut gpio = GpioSession::new(backend);
    let group = SchedulerGroup::setup(platform, &mut gpio, config).await?;

    tracing::info!(cameras = ?group.camera_names(), "Privacy button controller started");
    group.run(shutdown).await;

    gpio.release();
    tracing::info!("Privacy button controller stopped");
    Ok(())
}

#[cfg(feature = "rpi")]
fn open_gpio() -> Result<Arc<dyn GpioBackend>> {
    Ok(Arc::new(crate::gpio::RppalGpio::new()?))
}

#[cfg(not(feature = "rpi"))]
fn open_gpio() -> Result<Arc<dyn GpioBackend>> {
    Err(crate::error::Error::Unsupported(
        "built without GPIO support (enable the `rpi` feature)".to_string(),
    ))
}

/// Cancel on Ctrl-C or SIGTERM
async fn wait_for_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl-C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
    shutdown.cancel();
}
