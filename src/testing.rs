//! In-memory camera platform and GPIO backend for unit tests

use crate::camera_platform::*;
use crate::error::{Error, Result};
use crate::gpio::{EdgeCallback, GpioBackend, Level};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// A completed platform call
#[derive(Debug, Clone)]
pub struct Call {
    pub camera: String,
    pub op: String,
    pub at: Instant,
}

#[derive(Debug, Default)]
struct MockCamera {
    summary: Option<CameraSummary>,
    led_on: Option<bool>,
    ir_mode: Option<IrLedMode>,
    fail_privacy: bool,
    delay: Duration,
}

/// Scripted camera platform
#[derive(Default)]
pub struct MockPlatform {
    cameras: Mutex<HashMap<String, MockCamera>>,
    unsupported: Mutex<HashSet<&'static str>>,
    calls: Mutex<Vec<Call>>,
}

impl MockPlatform {
    /// Cameras get ids `cam-0`, `cam-1`, ... in order
    pub fn with_cameras(names: &[&str]) -> Self {
        let platform = Self::default();
        {
            let mut cameras = platform.cameras.lock().unwrap();
            for (i, name) in names.iter().enumerate() {
                cameras.insert(
                    name.to_string(),
                    MockCamera {
                        summary: Some(CameraSummary {
                            id: format!("cam-{}", i),
                            name: name.to_string(),
                            has_privacy_zone: false,
                        }),
                        led_on: Some(true),
                        ir_mode: Some(IrLedMode::Auto),
                        ..Default::default()
                    },
                );
            }
        }
        platform
    }

    pub fn camera_ref(&self, name: &str) -> CameraRef {
        self.cameras.lock().unwrap()[name]
            .summary
            .as_ref()
            .unwrap()
            .to_ref()
    }

    /// Privacy calls for `name` fail
    pub fn fail_privacy(&self, name: &str, fail: bool) {
        self.cameras.lock().unwrap().get_mut(name).unwrap().fail_privacy = fail;
    }

    /// Every call for `name` sleeps first
    pub fn delay(&self, name: &str, delay: Duration) {
        self.cameras.lock().unwrap().get_mut(name).unwrap().delay = delay;
    }

    /// `op` is one of the trait method names
    pub fn mark_unsupported(&self, op: &'static str) {
        self.unsupported.lock().unwrap().insert(op);
    }

    /// Camera reports no IR capability
    pub fn remove_ir(&self, name: &str) {
        self.cameras.lock().unwrap().get_mut(name).unwrap().ir_mode = None;
    }

    pub fn privacy_on(&self, name: &str) -> bool {
        self.cameras.lock().unwrap()[name]
            .summary
            .as_ref()
            .map(|s| s.has_privacy_zone)
            .unwrap_or(false)
    }

    pub fn led_on(&self, name: &str) -> Option<bool> {
        self.cameras.lock().unwrap()[name].led_on
    }

    pub fn ir_mode(&self, name: &str) -> Option<IrLedMode> {
        self.cameras.lock().unwrap()[name].ir_mode
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, camera: &str, op: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.camera == camera && c.op == op)
            .count()
    }

    async fn begin(&self, camera: &CameraRef, op: &'static str) -> Result<()> {
        let delay = self
            .cameras
            .lock()
            .unwrap()
            .get(&camera.name)
            .map(|c| c.delay)
            .ok_or_else(|| Error::CameraNotFound(camera.name.clone()))?;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.unsupported.lock().unwrap().contains(op) {
            return Err(Error::Unsupported(op.to_string()));
        }
        Ok(())
    }

    fn finish(&self, camera: &CameraRef, op: &str) {
        self.calls.lock().unwrap().push(Call {
            camera: camera.name.clone(),
            op: op.to_string(),
            at: Instant::now(),
        });
    }

    async fn set_privacy(&self, camera: &CameraRef, on: bool, op: &'static str) -> Result<()> {
        self.begin(camera, op).await?;
        {
            let mut cameras = self.cameras.lock().unwrap();
            let cam = cameras.get_mut(&camera.name).unwrap();
            if cam.fail_privacy {
                return Err(Error::control(&camera.name, "scripted failure"));
            }
            if let Some(summary) = cam.summary.as_mut() {
                summary.has_privacy_zone = on;
            }
        }
        self.finish(camera, op);
        Ok(())
    }

    async fn set_led(&self, camera: &CameraRef, on: bool, op: &'static str) -> Result<()> {
        self.begin(camera, op).await?;
        self.cameras.lock().unwrap().get_mut(&camera.name).unwrap().led_on = Some(on);
        self.finish(camera, op);
        Ok(())
    }
}

#[async_trait]
impl CameraPlatform for MockPlatform {
    async fn list_cameras(&self) -> Result<Vec<CameraSummary>> {
        let mut list: Vec<_> = self
            .cameras
            .lock()
            .unwrap()
            .values()
            .filter_map(|c| c.summary.clone())
            .collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(list)
    }

    async fn enable_privacy(&self, camera: &CameraRef) -> Result<()> {
        self.set_privacy(camera, true, "enable_privacy").await
    }

    async fn disable_privacy(&self, camera: &CameraRef) -> Result<()> {
        self.set_privacy(camera, false, "disable_privacy").await
    }

    async fn set_status_light(&self, camera: &CameraRef, on: bool) -> Result<()> {
        self.set_led(camera, on, "set_status_light").await
    }

    async fn update_device_property(
        &self,
        camera: &CameraRef,
        property: &str,
        value: bool,
    ) -> Result<()> {
        if property != "status_light" {
            return Err(Error::Unsupported(property.to_string()));
        }
        self.set_led(camera, value, "update_device_property").await
    }

    async fn set_led_mode(&self, camera: &CameraRef, mode: LedMode) -> Result<()> {
        self.set_led(camera, mode == LedMode::Normal, "set_led_mode")
            .await
    }

    async fn set_ir_led_mode(&self, camera: &CameraRef, mode: IrLedMode) -> Result<()> {
        self.begin(camera, "set_ir_led_mode").await?;
        {
            let mut cameras = self.cameras.lock().unwrap();
            let cam = cameras.get_mut(&camera.name).unwrap();
            if cam.ir_mode.is_none() {
                return Err(Error::Unsupported("IR LED".to_string()));
            }
            cam.ir_mode = Some(mode);
        }
        self.finish(camera, "set_ir_led_mode");
        Ok(())
    }

    async fn led_status(&self, camera: &CameraRef) -> Result<LedStatus> {
        Ok(match self.led_on(&camera.name) {
            Some(true) => LedStatus::On,
            Some(false) => LedStatus::Off,
            None => LedStatus::Unknown,
        })
    }

    async fn ir_led_status(&self, camera: &CameraRef) -> Result<IrLedStatus> {
        Ok(match self.ir_mode(&camera.name) {
            Some(mode) => IrLedStatus::from_mode(mode.as_str()),
            None => IrLedStatus::NotAvailable,
        })
    }
}

/// In-memory GPIO. Unconfigured input pins read HIGH (pull-up).
#[derive(Default)]
pub struct MockGpio {
    inputs: Mutex<HashMap<u8, Level>>,
    outputs: Mutex<HashMap<u8, Level>>,
    callbacks: Mutex<HashMap<u8, EdgeCallback>>,
    fail_inputs: Mutex<HashSet<u8>>,
    no_interrupts: AtomicBool,
    releases: AtomicUsize,
}

impl MockGpio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_level(&self, pin: u8, level: Level) {
        self.inputs.lock().unwrap().insert(pin, level);
    }

    /// Run the registered edge callback, if any
    pub fn fire_falling_edge(&self, pin: u8) -> bool {
        let mut callbacks = self.callbacks.lock().unwrap();
        match callbacks.get_mut(&pin) {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    pub fn disable_interrupts(&self) {
        self.no_interrupts.store(true, Ordering::SeqCst);
    }

    pub fn fail_input(&self, pin: u8) {
        self.fail_inputs.lock().unwrap().insert(pin);
    }

    pub fn has_callback(&self, pin: u8) -> bool {
        self.callbacks.lock().unwrap().contains_key(&pin)
    }

    /// Last level written to an output pin (kept after release)
    pub fn output(&self, pin: u8) -> Option<Level> {
        self.outputs.lock().unwrap().get(&pin).copied()
    }

    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

impl GpioBackend for MockGpio {
    fn configure_input(&self, pin: u8, _pull_up: bool) -> Result<()> {
        if self.fail_inputs.lock().unwrap().contains(&pin) {
            return Err(Error::Gpio(format!("GPIO {} busy", pin)));
        }
        self.inputs.lock().unwrap().entry(pin).or_insert(Level::High);
        Ok(())
    }

    fn configure_output(&self, pin: u8, initial: Level) -> Result<()> {
        self.outputs.lock().unwrap().insert(pin, initial);
        Ok(())
    }

    fn read_level(&self, pin: u8) -> Result<Level> {
        Ok(self
            .inputs
            .lock()
            .unwrap()
            .get(&pin)
            .copied()
            .unwrap_or(Level::High))
    }

    fn write_level(&self, pin: u8, level: Level) -> Result<()> {
        self.outputs.lock().unwrap().insert(pin, level);
        Ok(())
    }

    fn register_falling_edge(&self, pin: u8, _debounce: Duration, callback: EdgeCallback) -> Result<()> {
        if self.no_interrupts.load(Ordering::SeqCst) {
            return Err(Error::Unsupported("edge detection".to_string()));
        }
        self.callbacks.lock().unwrap().insert(pin, callback);
        Ok(())
    }

    fn release_all(&self) {
        self.callbacks.lock().unwrap().clear();
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}
