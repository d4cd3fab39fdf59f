//! Scheduler - Multi-Camera Button Loop
//!
//! ## Responsibilities
//!
//! - Build one controller per resolvable camera, sharing one upstream session
//! - Acquire button/LED pins and register falling-edge interrupts
//! - Tick: queue timeout checks, then poll every button
//! - Drain interrupt edges between ticks through the same edge detectors
//!
//! The loop never awaits a camera call; controllers run in their own tasks.

use crate::button_input::EdgeDetector;
use crate::camera_platform::{find_camera, CameraPlatform};
use crate::config::{CamerasConfig, GroupSettings};
use crate::error::{Error, Result};
use crate::gpio::{GpioBackend, GpioSession, Level};
use crate::privacy_control::PrivacyControl;
use crate::privacy_controller::{ControllerHandle, PrivacyController, StatusLed};
use crate::state_store::StateStore;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Time each controller gets to finish its current call and persist
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Raw interrupt edge: (button index, time observed)
type Edge = (usize, Instant);

struct Button {
    pin: u8,
    detector: EdgeDetector,
    handle: ControllerHandle,
}

/// Controllers sharing one upstream session
pub struct SchedulerGroup {
    buttons: Vec<Button>,
    backend: Arc<dyn GpioBackend>,
    settings: GroupSettings,
    edge_tx: mpsc::UnboundedSender<Edge>,
    edge_rx: mpsc::UnboundedReceiver<Edge>,
}

impl SchedulerGroup {
    /// Resolve cameras, acquire pins and restore state. Cameras that cannot
    /// be resolved or whose button pin cannot be acquired are skipped.
    pub async fn setup(
        platform: Arc<dyn CameraPlatform>,
        gpio: &mut GpioSession,
        config: &CamerasConfig,
    ) -> Result<Self> {
        let settings = config.global_settings.resolve()?;
        let store = StateStore::new(settings.state_dir.clone());
        let control = PrivacyControl::new(platform.clone());
        let backend = gpio.backend();
        let (edge_tx, edge_rx) = mpsc::unbounded_channel();

        let inventory = platform.list_cameras().await?;
        let mut buttons = Vec::new();

        for entry in config.enabled_cameras() {
            let Some(camera) = find_camera(&inventory, &entry.name).map(|c| c.to_ref()) else {
                tracing::warn!(camera = %entry.name, "Camera not found upstream, skipping");
                continue;
            };

            if let Err(e) = gpio.acquire_button(entry.gpio_pin) {
                tracing::error!(camera = %entry.name, pin = entry.gpio_pin, error = %e, "Button pin unavailable, skipping camera");
                continue;
            }

            let led = match entry.led_pin {
                Some(pin) => match gpio.acquire_led(pin) {
                    Ok(()) => Some(StatusLed::new(backend.clone(), pin)),
                    Err(e) => {
                        tracing::warn!(camera = %entry.name, pin = pin, error = %e, "Status LED disabled");
                        None
                    }
                },
                None => None,
            };

            let timeout = entry.timeout()?;
            let mut controller = PrivacyController::new(
                camera.clone(),
                control.clone(),
                led,
                store.clone(),
                timeout,
            )
            .with_state_name(entry.name.clone());
            controller.restore(Utc::now()).await;

            let baseline = backend.read_level(entry.gpio_pin).unwrap_or_else(|e| {
                tracing::warn!(camera = %camera.name, pin = entry.gpio_pin, error = %e, "Initial button read failed");
                Level::High
            });

            let index = buttons.len();
            let tx = edge_tx.clone();
            let registered = backend.register_falling_edge(
                entry.gpio_pin,
                settings.hardware_debounce,
                Box::new(move || {
                    let _ = tx.send((index, Instant::now()));
                }),
            );
            match registered {
                Ok(()) => {
                    tracing::info!(camera = %camera.name, pin = entry.gpio_pin, "Interrupt detection enabled");
                }
                Err(e) => {
                    tracing::warn!(camera = %camera.name, pin = entry.gpio_pin, error = %e, "Interrupt detection unavailable, polling only");
                }
            }

            tracing::info!(
                camera = %camera.name,
                camera_id = %camera.id,
                button_pin = entry.gpio_pin,
                led_pin = ?entry.led_pin,
                timeout_minutes = entry.timeout_minutes,
                "Camera controller ready"
            );

            buttons.push(Button {
                pin: entry.gpio_pin,
                detector: EdgeDetector::new(baseline, settings.interrupt_debounce, settings.poll_debounce),
                handle: ControllerHandle::spawn(controller),
            });
        }

        if buttons.is_empty() {
            return Err(Error::Config("No configured camera could be set up".to_string()));
        }

        Ok(Self {
            buttons,
            backend,
            settings,
            edge_tx,
            edge_rx,
        })
    }

    pub fn camera_names(&self) -> Vec<&str> {
        self.buttons.iter().map(|b| b.handle.name()).collect()
    }

    /// Run until `shutdown` is cancelled, then stop every controller
    pub async fn run(mut self, shutdown: CancellationToken) {
        tracing::info!(
            cameras = self.buttons.len(),
            startup_delay_ms = self.settings.startup_delay.as_millis() as u64,
            "Starting button scheduler"
        );

        let started = tokio::select! {
            _ = shutdown.cancelled() => false,
            _ = tokio::time::sleep(self.settings.startup_delay) => true,
        };

        if started {
            let mut ticker = tokio::time::interval(self.settings.polling_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    Some((index, at)) = self.edge_rx.recv() => self.on_edge(index, at),
                    _ = ticker.tick() => self.tick(),
                }
            }
        }

        self.shutdown().await;
    }

    fn on_edge(&mut self, index: usize, at: Instant) {
        if let Some(button) = self.buttons.get_mut(index) {
            if let Some(event) = button.detector.on_falling_edge(at) {
                button.handle.press(event);
            }
        }
    }

    fn tick(&mut self) {
        for button in &self.buttons {
            button.handle.check_timeout();
        }

        let now = Instant::now();
        for button in &mut self.buttons {
            match self.backend.read_level(button.pin) {
                Ok(level) => {
                    if let Some(event) = button.detector.sample(level, now) {
                        button.handle.press(event);
                    }
                }
                Err(e) => {
                    tracing::debug!(pin = button.pin, error = %e, "Button read failed");
                }
            }
        }
    }

    async fn shutdown(self) {
        tracing::info!("Stopping button scheduler");
        drop(self.edge_tx);
        drop(self.edge_rx);
        futures::future::join_all(
            self.buttons
                .into_iter()
                .map(|b| b.handle.shutdown(SHUTDOWN_GRACE)),
        )
        .await;
        tracing::info!("All controllers stopped");
    }
}
