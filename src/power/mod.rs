//! # Power Module
//!
//! Interface power switching.
//!
//! This module handles:
//! - The binary power state commanded every cycle
//! - The actuator boundary the controller drives
//! - A sysfs GPIO implementation for the USB power switch

pub mod gpio;

use async_trait::async_trait;

pub use gpio::SysfsGpioActuator;

/// Commanded interface power
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    On,
    Off,
}

impl PowerState {
    /// Logic level written to the switch pin
    pub fn level(self) -> u8 {
        match self {
            PowerState::On => 1,
            PowerState::Off => 0,
        }
    }
}

impl std::fmt::Display for PowerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PowerState::On => write!(f, "ON"),
            PowerState::Off => write!(f, "OFF"),
        }
    }
}

/// Drives the physical power switch
///
/// Implementations must be idempotent: the controller issues the command
/// every cycle without tracking what it sent last time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PowerActuator: Send + Sync {
    /// Apply `state`. With `enabled = false` no hardware is touched.
    async fn set(&self, state: PowerState, enabled: bool);
}
