//! # Error Types
//!
//! Custom error types for WLAN Watchdog using `thiserror`.
//!
//! These errors never escape a control cycle: every adapter converts them into
//! a negative signal (default config, no fix, no SSID, unreachable) at the
//! collaborator boundary and logs them.

use thiserror::Error;

/// Main error type for WLAN Watchdog
#[derive(Debug, Error)]
pub enum WatchdogError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Position file could not be decoded
    #[error("Position decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// Position fix is present but unusable
    #[error("Position error: {0}")]
    Position(String),

    /// Distance could not be computed between two coordinates
    #[error("Geodesic error: {0}")]
    Geodesic(String),

    /// GPIO power switch errors
    #[error("GPIO error: {0}")]
    Gpio(String),

    /// External command (iw, ping, ip) failed to run
    #[error("Command error: {0}")]
    Command(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for WLAN Watchdog
pub type Result<T> = std::result::Result<T, WatchdogError>;
