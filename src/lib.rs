//! Privacy button controller
//!
//! A physical button per camera toggles privacy (video blackout, status LED,
//! IR illuminator) on a UniFi Protect console. Privacy switches itself off
//! after a per-camera timeout and survives restarts through per-camera state
//! files.
//!
//! ## Modules
//!
//! - [`config`]: camera document and upstream credentials
//! - [`camera_platform`]: upstream boundary and the Protect client
//! - [`gpio`]: digital I/O boundary and the Raspberry Pi backend
//! - [`button_input`]: debounced press detection
//! - [`privacy_control`]: privacy/LED/IR call sequencing
//! - [`privacy_controller`]: per-camera state machine and worker
//! - [`state_store`]: state file persistence
//! - [`scheduler`]: multi-camera loop
//! - [`lifecycle`]: startup and shutdown
//! - [`cli`]: command line

pub mod button_input;
pub mod camera_platform;
pub mod cli;
pub mod config;
pub mod error;
pub mod gpio;
pub mod lifecycle;
pub mod privacy_control;
pub mod privacy_controller;
pub mod scheduler;
pub mod state_store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};
