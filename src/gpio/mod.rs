//! Digital I/O boundary
//!
//! ## Responsibilities
//!
//! - Abstract input pins (pull-up, falling-edge interrupt) and output pins
//! - Process-wide acquisition with guaranteed release ([`GpioSession`])

#[cfg(feature = "rpi")]
mod rppal_backend;

#[cfg(feature = "rpi")]
pub use rppal_backend::RppalGpio;

use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;

/// Pin level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

/// Invoked from the hardware layer's thread on every accepted falling edge
pub type EdgeCallback = Box<dyn FnMut() + Send + 'static>;

/// Hardware digital I/O
pub trait GpioBackend: Send + Sync {
    fn configure_input(&self, pin: u8, pull_up: bool) -> Result<()>;

    fn configure_output(&self, pin: u8, initial: Level) -> Result<()>;

    fn read_level(&self, pin: u8) -> Result<Level>;

    fn write_level(&self, pin: u8, level: Level) -> Result<()>;

    /// `Error::Unsupported` when edge detection is unavailable
    fn register_falling_edge(&self, pin: u8, debounce: Duration, callback: EdgeCallback) -> Result<()>;

    /// Drop every configured pin and interrupt
    fn release_all(&self);
}

/// Scoped GPIO ownership: pins are released when the session is dropped
pub struct GpioSession {
    backend: Arc<dyn GpioBackend>,
    led_pins: Vec<u8>,
    released: bool,
}

impl GpioSession {
    pub fn new(backend: Arc<dyn GpioBackend>) -> Self {
        Self {
            backend,
            led_pins: Vec::new(),
            released: false,
        }
    }

    pub fn backend(&self) -> Arc<dyn GpioBackend> {
        Arc::clone(&self.backend)
    }

    /// Configure a button input (pull-up, active low)
    pub fn acquire_button(&self, pin: u8) -> Result<()> {
        self.backend.configure_input(pin, true)
    }

    /// Configure an LED output, initially low
    pub fn acquire_led(&mut self, pin: u8) -> Result<()> {
        self.backend.configure_output(pin, Level::Low)?;
        self.led_pins.push(pin);
        Ok(())
    }

    /// Drive LEDs low and release every pin
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        for pin in self.led_pins.drain(..) {
            if let Err(e) = self.backend.write_level(pin, Level::Low) {
                tracing::warn!(pin = pin, error = %e, "Failed to switch LED off");
            }
        }
        self.backend.release_all();
        tracing::info!("GPIO released");
    }
}

impl Drop for GpioSession {
    fn drop(&mut self) {
        self.release();
    }
}
