//! # Network Module
//!
//! Association, upstream reachability and interface bounce.
//!
//! This module handles:
//! - The probe boundary the controller drives
//! - Per-cycle connectivity status
//! - A Linux implementation shelling out to `iw`, `ping` and `ip`

pub mod linux;

use async_trait::async_trait;
use std::time::Duration;

pub use linux::LinuxNetworkProbe;

/// Connectivity observed during one cycle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectivityStatus {
    /// SSID the interface is associated with, if any
    pub associated_ssid: Option<String>,

    /// Whether the probe host answered through the interface
    pub upstream_reachable: bool,
}

impl ConnectivityStatus {
    /// Associated and able to reach the probe host
    pub fn is_healthy(&self) -> bool {
        self.associated_ssid.is_some() && self.upstream_reachable
    }
}

/// Queries and recovers the wireless interface
///
/// Every failure is reported as a negative signal (no SSID, unreachable);
/// nothing here returns an error to the controller.
#[async_trait]
pub trait NetworkProbe: Send + Sync {
    /// SSID the interface is currently associated with
    async fn current_ssid(&self, iface: &str) -> Option<String>;

    /// Whether `target_host` answers through `iface`
    async fn upstream_reachable(
        &self,
        iface: &str,
        target_host: &str,
        attempts: u32,
        timeout: Duration,
    ) -> bool;

    /// Take the interface down, wait `down_delay`, bring it up, wait `up_delay`
    async fn bounce(&self, iface: &str, down_delay: Duration, up_delay: Duration);
}
