//! # Sysfs GPIO Power Switch
//!
//! Drives the USB power switch through the Linux sysfs GPIO interface.
//!
//! ## Pin Layout
//!
//! - `<root>/export` - write the pin number to expose `<root>/gpio<N>`
//! - `<root>/gpio<N>/direction` - `in`, `out`, or `high`/`low` to set output
//!   and level in one step
//! - `<root>/gpio<N>/value` - `0` or `1`
//!
//! The current level is read back before every write so repeated commands
//! leave the pin untouched.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Result, WatchdogError};
use crate::power::{PowerActuator, PowerState};

/// USB power switch on a sysfs GPIO pin
#[derive(Debug, Clone)]
pub struct SysfsGpioActuator {
    root: PathBuf,
    pin: u32,
}

impl SysfsGpioActuator {
    /// Create an actuator for `pin` under the sysfs `root` (usually `/sys/class/gpio`)
    pub fn new(root: impl Into<PathBuf>, pin: u32) -> Self {
        Self {
            root: root.into(),
            pin,
        }
    }

    pub fn pin(&self) -> u32 {
        self.pin
    }

    fn pin_dir(&self) -> PathBuf {
        self.root.join(format!("gpio{}", self.pin))
    }

    /// Drive the pin to `state`
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - the level changed
    /// * `Ok(false)` - the pin was already at the requested level
    ///
    /// # Errors
    ///
    /// Returns `Gpio` if the pin cannot be exported, configured or written.
    pub async fn apply(&self, state: PowerState) -> Result<bool> {
        let pin_dir = self.pin_dir();

        if !tokio::fs::try_exists(&pin_dir).await? {
            debug!("Exporting GPIO {}", self.pin);
            write_attr(&self.root.join("export"), &self.pin.to_string()).await?;
        }

        let direction = read_attr(&pin_dir.join("direction")).await?;
        if direction != "out" {
            // "high"/"low" switches to output at the requested level without a glitch
            let initial = match state {
                PowerState::On => "high",
                PowerState::Off => "low",
            };
            write_attr(&pin_dir.join("direction"), initial).await?;
            return Ok(true);
        }

        let value_path = pin_dir.join("value");
        let current = read_attr(&value_path).await?;
        if current == state.level().to_string() {
            return Ok(false);
        }

        write_attr(&value_path, &state.level().to_string()).await?;
        Ok(true)
    }
}

async fn read_attr(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map(|s| s.trim().to_string())
        .map_err(|e| WatchdogError::Gpio(format!("Failed to read {}: {}", path.display(), e)))
}

async fn write_attr(path: &Path, value: &str) -> Result<()> {
    tokio::fs::write(path, value)
        .await
        .map_err(|e| WatchdogError::Gpio(format!("Failed to write {}: {}", path.display(), e)))
}

#[async_trait]
impl PowerActuator for SysfsGpioActuator {
    async fn set(&self, state: PowerState, enabled: bool) {
        if !enabled {
            debug!("No power switch present, USB power {} not applied", state);
            return;
        }

        match self.apply(state).await {
            Ok(true) => info!("USB power {}", state),
            Ok(false) => debug!("USB power already {}", state),
            Err(e) => warn!("Failed to switch USB power {} on GPIO {}: {}", state, self.pin, e),
        }
    }
}
