//! Raspberry Pi GPIO backend (rppal)

use super::{EdgeCallback, GpioBackend, Level};
use crate::error::{Error, Result};
use rppal::gpio::{Gpio, InputPin, OutputPin, Trigger};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// BCM-numbered pins on the local SoC
pub struct RppalGpio {
    gpio: Gpio,
    inputs: Mutex<HashMap<u8, InputPin>>,
    outputs: Mutex<HashMap<u8, OutputPin>>,
}

impl RppalGpio {
    pub fn new() -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| Error::Gpio(format!("GPIO unavailable: {}", e)))?;
        Ok(Self {
            gpio,
            inputs: Mutex::new(HashMap::new()),
            outputs: Mutex::new(HashMap::new()),
        })
    }

    fn inputs(&self) -> Result<MutexGuard<'_, HashMap<u8, InputPin>>> {
        self.inputs
            .lock()
            .map_err(|_| Error::Gpio("input pin table poisoned".to_string()))
    }

    fn outputs(&self) -> Result<MutexGuard<'_, HashMap<u8, OutputPin>>> {
        self.outputs
            .lock()
            .map_err(|_| Error::Gpio("output pin table poisoned".to_string()))
    }
}

fn to_rppal(level: Level) -> rppal::gpio::Level {
    match level {
        Level::Low => rppal::gpio::Level::Low,
        Level::High => rppal::gpio::Level::High,
    }
}

fn from_rppal(level: rppal::gpio::Level) -> Level {
    match level {
        rppal::gpio::Level::Low => Level::Low,
        rppal::gpio::Level::High => Level::High,
    }
}

impl GpioBackend for RppalGpio {
    fn configure_input(&self, pin: u8, pull_up: bool) -> Result<()> {
        let raw = self
            .gpio
            .get(pin)
            .map_err(|e| Error::Gpio(format!("GPIO {}: {}", pin, e)))?;
        let input = if pull_up {
            raw.into_input_pullup()
        } else {
            raw.into_input()
        };
        self.inputs()?.insert(pin, input);
        Ok(())
    }

    fn configure_output(&self, pin: u8, initial: Level) -> Result<()> {
        let raw = self
            .gpio
            .get(pin)
            .map_err(|e| Error::Gpio(format!("GPIO {}: {}", pin, e)))?;
        let output = match initial {
            Level::Low => raw.into_output_low(),
            Level::High => raw.into_output_high(),
        };
        self.outputs()?.insert(pin, output);
        Ok(())
    }

    fn read_level(&self, pin: u8) -> Result<Level> {
        let inputs = self.inputs()?;
        let input = inputs
            .get(&pin)
            .ok_or_else(|| Error::Gpio(format!("GPIO {} is not configured as input", pin)))?;
        Ok(from_rppal(input.read()))
    }

    fn write_level(&self, pin: u8, level: Level) -> Result<()> {
        let mut outputs = self.outputs()?;
        let output = outputs
            .get_mut(&pin)
            .ok_or_else(|| Error::Gpio(format!("GPIO {} is not configured as output", pin)))?;
        output.write(to_rppal(level));
        Ok(())
    }

    fn register_falling_edge(&self, pin: u8, debounce: Duration, mut callback: EdgeCallback) -> Result<()> {
        let mut inputs = self.inputs()?;
        let input = inputs
            .get_mut(&pin)
            .ok_or_else(|| Error::Gpio(format!("GPIO {} is not configured as input", pin)))?;

        let debounce = (!debounce.is_zero()).then_some(debounce);
        input
            .set_async_interrupt(Trigger::FallingEdge, debounce, move |_event| callback())
            .map_err(|e| Error::Unsupported(format!("edge detection on GPIO {}: {}", pin, e)))
    }

    fn release_all(&self) {
        // rppal resets pins to their original mode when dropped
        if let Ok(mut inputs) = self.inputs() {
            for input in inputs.values_mut() {
                let _ = input.clear_async_interrupt();
            }
            inputs.clear();
        }
        if let Ok(mut outputs) = self.outputs() {
            outputs.clear();
        }
    }
}
