//! # WLAN Watchdog Library
//!
//! GPS-gated power and connectivity watchdog for a boat's wireless interface.
//!
//! Each poll cycle the controller powers the USB radio only when the boat is
//! near a known hotspot, checks that the interface is associated and can reach
//! the internet, and bounces the link once when it cannot.

pub mod config;
pub mod controller;
pub mod error;
pub mod geo;
pub mod logging;
pub mod network;
pub mod power;
