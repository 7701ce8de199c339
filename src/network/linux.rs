//! # Linux Network Probe
//!
//! Implements [`NetworkProbe`] with the standard wireless and iproute tools:
//!
//! - Association: `iw dev <iface> link`
//! - Reachability: `ping -I <iface> -c <attempts> -W <timeout> <host>`
//! - Bounce: `ip link set dev <iface> down|up`
//!
//! Every command runs under a hard timeout and is killed if it overruns. The
//! settle wait after a bounce ends early on shutdown; the down phase always
//! completes so the interface is brought back up.

use async_trait::async_trait;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Result, WatchdogError};
use crate::network::NetworkProbe;

/// Upper bound for `iw` and `ip` invocations
const COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Slack added on top of the ping deadline
const PING_GRACE: Duration = Duration::from_secs(5);

/// Network probe backed by `iw`, `ping` and `ip`
#[derive(Debug, Clone)]
pub struct LinuxNetworkProbe {
    iw: String,
    ping: String,
    ip: String,
    shutdown: CancellationToken,
}

impl Default for LinuxNetworkProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl LinuxNetworkProbe {
    pub fn new() -> Self {
        Self::with_programs("iw", "ping", "ip")
    }

    /// Use alternative binaries (absolute paths, wrappers)
    pub fn with_programs(iw: &str, ping: &str, ip: &str) -> Self {
        Self {
            iw: iw.to_string(),
            ping: ping.to_string(),
            ip: ip.to_string(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Cut the post-bounce settle wait short when `token` is cancelled
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Set the administrative state of `iface`
    async fn set_link(&self, iface: &str, state: &str) -> Result<()> {
        let output = run(&self.ip, &["link", "set", "dev", iface, state], COMMAND_TIMEOUT).await?;
        if !output.status.success() {
            return Err(WatchdogError::Command(format!(
                "{} link set dev {} {} failed: {}",
                self.ip,
                iface,
                state,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

/// Run `program` with `args`, killing it after `limit`
async fn run(program: &str, args: &[&str], limit: Duration) -> Result<Output> {
    debug!("Running {} {}", program, args.join(" "));

    let child = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output();

    match tokio::time::timeout(limit, child).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(WatchdogError::Command(format!("Failed to run {}: {}", program, e))),
        Err(_) => Err(WatchdogError::Command(format!(
            "{} timed out after {}s",
            program,
            limit.as_secs()
        ))),
    }
}

/// Extract the SSID from `iw dev <iface> link` output
///
/// ```text
/// Connected to aa:bb:cc:dd:ee:ff (on wlan1)
///         SSID: Dock-WiFi
///         freq: 2437
/// ```
pub fn parse_iw_link(output: &str) -> Option<String> {
    if output.trim_start().starts_with("Not connected") {
        return None;
    }

    output
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("SSID:"))
        .map(str::trim)
        .filter(|ssid| !ssid.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl NetworkProbe for LinuxNetworkProbe {
    async fn current_ssid(&self, iface: &str) -> Option<String> {
        match run(&self.iw, &["dev", iface, "link"], COMMAND_TIMEOUT).await {
            Ok(output) if output.status.success() => {
                parse_iw_link(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(output) => {
                warn!(
                    "{} dev {} link failed: {}",
                    self.iw,
                    iface,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                None
            }
            Err(e) => {
                warn!("Could not query association on {}: {}", iface, e);
                None
            }
        }
    }

    async fn upstream_reachable(
        &self,
        iface: &str,
        target_host: &str,
        attempts: u32,
        timeout: Duration,
    ) -> bool {
        let count = attempts.max(1).to_string();
        let wait = timeout.as_secs().max(1).to_string();
        let limit = timeout.max(Duration::from_secs(1)) * attempts.max(1) + PING_GRACE;

        match run(
            &self.ping,
            &["-I", iface, "-c", count.as_str(), "-W", wait.as_str(), target_host],
            limit,
        )
        .await
        {
            Ok(output) => {
                let reachable = output.status.success();
                debug!(iface, target_host, reachable, "Reachability probe finished");
                reachable
            }
            Err(e) => {
                warn!("Reachability probe via {} failed: {}", iface, e);
                false
            }
        }
    }

    async fn bounce(&self, iface: &str, down_delay: Duration, up_delay: Duration) {
        info!("Bouncing {}", iface);

        if let Err(e) = self.set_link(iface, "down").await {
            warn!("Failed to bring {} down: {}", iface, e);
        }
        tokio::time::sleep(down_delay).await;

        if let Err(e) = self.set_link(iface, "up").await {
            warn!("Failed to bring {} up: {}", iface, e);
        }

        tokio::select! {
            _ = self.shutdown.cancelled() => {
                debug!("Shutdown requested, skipping settle wait on {}", iface);
            }
            _ = tokio::time::sleep(up_delay) => {}
        }
    }
}
