//! # Configuration Module
//!
//! Handles loading and validating the watchdog configuration from TOML files.
//!
//! The snapshot is re-read on every control cycle, so edits to the file take
//! effect on the next iteration without a restart. A file that cannot be read,
//! parsed or validated never stops the loop: [`FileConfigProvider`] logs the
//! failure and hands out [`Config::default`], which disables GPS control and
//! therefore keeps the interface powered.

use async_trait::async_trait;
use serde::de::Error;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error};

use crate::error::{Result, WatchdogError};
use crate::geo::Hotspot;

/// Configuration snapshot for one control cycle
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Gate interface power on proximity to a hotspot
    #[serde(default, alias = "enable")]
    pub enable_gps_control: bool,

    #[serde(default = "default_max_distance_miles", alias = "max_miles")]
    pub max_distance_miles: f64,

    #[serde(default = "default_poll_interval_seconds", alias = "check_interval_secs")]
    pub poll_interval_seconds: u64,

    /// Platforms without a controllable switch still log the power decision
    #[serde(default = "default_power_switch_present")]
    pub power_switch_present: bool,

    #[serde(default)]
    pub hotspots: Vec<Hotspot>,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub power: PowerConfig,
}

/// Network interface and recovery configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NetworkConfig {
    #[serde(default = "default_interface")]
    pub interface: String,

    #[serde(default = "default_probe_host")]
    pub probe_host: String,

    #[serde(default = "default_probe_attempts")]
    pub probe_attempts: u32,

    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    #[serde(default = "default_bounce_down_delay_secs")]
    pub bounce_down_delay_secs: u64,

    #[serde(default = "default_bounce_up_delay_secs")]
    pub bounce_up_delay_secs: u64,

    #[serde(default = "default_startup_grace_secs")]
    pub startup_grace_secs: u64,
}

/// GPIO power switch configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PowerConfig {
    /// BCM pin number driving the USB power switch
    #[serde(default = "default_gpio_pin")]
    pub gpio_pin: u32,

    #[serde(default = "default_gpio_root")]
    pub gpio_root: PathBuf,
}

// Default value functions
fn default_max_distance_miles() -> f64 { 1.0 }
fn default_poll_interval_seconds() -> u64 { 3600 }
fn default_power_switch_present() -> bool { true }

fn default_interface() -> String { "wlan1".to_string() }
fn default_probe_host() -> String { "8.8.8.8".to_string() }
fn default_probe_attempts() -> u32 { 3 }
fn default_probe_timeout_secs() -> u64 { 2 }
fn default_bounce_down_delay_secs() -> u64 { 5 }
fn default_bounce_up_delay_secs() -> u64 { 30 }
fn default_startup_grace_secs() -> u64 { 60 }

fn default_gpio_pin() -> u32 { 16 }
fn default_gpio_root() -> PathBuf { PathBuf::from("/sys/class/gpio") }

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_gps_control: false,
            max_distance_miles: default_max_distance_miles(),
            poll_interval_seconds: default_poll_interval_seconds(),
            power_switch_present: default_power_switch_present(),
            hotspots: Vec::new(),
            network: NetworkConfig::default(),
            power: PowerConfig::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            probe_host: default_probe_host(),
            probe_attempts: default_probe_attempts(),
            probe_timeout_secs: default_probe_timeout_secs(),
            bounce_down_delay_secs: default_bounce_down_delay_secs(),
            bounce_up_delay_secs: default_bounce_up_delay_secs(),
            startup_grace_secs: default_startup_grace_secs(),
        }
    }
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            gpio_pin: default_gpio_pin(),
            gpio_root: default_gpio_root(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use wlan_watchdog::config::Config;
    ///
    /// let config = Config::load("/etc/wlan-watchdog/config.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Interval between control cycles
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    /// Validate configuration values
    ///
    /// Hotspot coordinates are deliberately not checked here: a malformed
    /// hotspot is skipped by the proximity evaluator instead of discarding the
    /// whole file.
    fn validate(&self) -> Result<()> {
        if !self.max_distance_miles.is_finite() || self.max_distance_miles <= 0.0 {
            return Err(WatchdogError::Config(
                toml::de::Error::custom("max_distance_miles must be a positive number")
            ));
        }

        if self.poll_interval_seconds == 0 {
            return Err(WatchdogError::Config(
                toml::de::Error::custom("poll_interval_seconds must be greater than 0")
            ));
        }

        if self.network.interface.is_empty() {
            return Err(WatchdogError::Config(
                toml::de::Error::custom("network interface cannot be empty")
            ));
        }

        if self.network.probe_host.is_empty() {
            return Err(WatchdogError::Config(
                toml::de::Error::custom("probe_host cannot be empty")
            ));
        }

        if self.network.probe_attempts == 0 || self.network.probe_attempts > 20 {
            return Err(WatchdogError::Config(
                toml::de::Error::custom("probe_attempts must be between 1 and 20")
            ));
        }

        if self.network.probe_timeout_secs == 0 || self.network.probe_timeout_secs > 60 {
            return Err(WatchdogError::Config(
                toml::de::Error::custom("probe_timeout_secs must be between 1 and 60")
            ));
        }

        for (name, value) in [
            ("bounce_down_delay_secs", self.network.bounce_down_delay_secs),
            ("bounce_up_delay_secs", self.network.bounce_up_delay_secs),
            ("startup_grace_secs", self.network.startup_grace_secs),
        ] {
            if value > 600 {
                return Err(WatchdogError::Config(
                    toml::de::Error::custom(format!("{} must be at most 600", name))
                ));
            }
        }

        if self.power.gpio_root.as_os_str().is_empty() {
            return Err(WatchdogError::Config(
                toml::de::Error::custom("gpio_root cannot be empty")
            ));
        }

        Ok(())
    }
}

/// Source of a fresh configuration snapshot each cycle
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Load the current snapshot. Never fails; falls back to defaults.
    async fn load(&self) -> Config;
}

/// Reads the configuration from a TOML file on every call
#[derive(Debug, Clone)]
pub struct FileConfigProvider {
    path: PathBuf,
}

impl FileConfigProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ConfigProvider for FileConfigProvider {
    async fn load(&self) -> Config {
        let parsed = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Config::parse(&contents),
            Err(e) => Err(WatchdogError::Io(e)),
        };

        match parsed {
            Ok(config) => {
                debug!(
                    path = %self.path.display(),
                    hotspots = config.hotspots.len(),
                    "Loaded configuration"
                );
                config
            }
            Err(e) => {
                error!("Failed to load config from {}: {}", self.path.display(), e);
                Config::default()
            }
        }
    }
}
