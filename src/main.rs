//! # WLAN Watchdog
//!
//! Keeps a boat's USB Wi-Fi radio powered only near known hotspots and
//! recovers stalled associations.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Parse command line, set up logging
//!    - Wire the file-backed config and position providers, the sysfs GPIO
//!      switch and the Linux network probe into the controller
//!
//! 2. **Main Loop**
//!    - Power on at boot, wait the startup grace period
//!    - Every poll interval: decide power, check connectivity, bounce once if
//!      degraded
//!
//! 3. **Graceful Shutdown**
//!    - Ctrl+C or SIGTERM interrupts the current sleep
//!    - A cycle in progress finishes first
//!
//! # Examples
//!
//! ```bash
//! wlan-watchdog --config /etc/wlan-watchdog/config.toml --log-dir /var/log/wlan-watchdog
//! ```
//!
//! Expected output:
//! ```text
//! INFO wlan_watchdog::controller: Starting wlan watchdog
//! INFO wlan_watchdog::controller: Powering wlan1 on at startup
//! INFO wlan_watchdog::controller: Boat is near: Dock
//! INFO wlan_watchdog::controller: Cycle complete power=ON ssid="Dock-WiFi" reachable=true bounced=false
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use wlan_watchdog::config::{Config, ConfigProvider, FileConfigProvider};
use wlan_watchdog::controller::Controller;
use wlan_watchdog::geo::JsonFilePositionProvider;
use wlan_watchdog::logging;
use wlan_watchdog::network::LinuxNetworkProbe;
use wlan_watchdog::power::SysfsGpioActuator;

/// GPS-gated Wi-Fi power and connectivity watchdog.
#[derive(Parser, Debug)]
#[command(name = "wlan-watchdog", version, about)]
struct Cli {
    /// Configuration file, re-read every cycle.
    #[arg(long, default_value = "/etc/wlan-watchdog/config.toml")]
    config: PathBuf,

    /// Last-known position written by the GPS daemon.
    #[arg(long, default_value = "/var/cache/boat/current_position.json")]
    gps_path: PathBuf,

    /// Also write logs to a daily-rotating file in this directory.
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Run a single cycle without the startup grace period and exit.
    #[arg(long, default_value_t = false)]
    once: bool,

    /// Validate the configuration, print the effective values and exit.
    #[arg(long, default_value_t = false)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.check_config {
        let config = Config::load(&cli.config)
            .with_context(|| format!("invalid configuration {}", cli.config.display()))?;
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let _log_guard = logging::init(cli.log_dir.as_deref())?;

    info!("WLAN Watchdog v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_provider = FileConfigProvider::new(&cli.config);
    let position_provider = JsonFilePositionProvider::new(&cli.gps_path);
    info!(
        config = %config_provider.path().display(),
        gps_path = %position_provider.path().display(),
        "Using files"
    );

    // The switch pin is fixed for the process lifetime
    let boot_config = config_provider.load().await;
    let power = SysfsGpioActuator::new(&boot_config.power.gpio_root, boot_config.power.gpio_pin);
    info!("USB power switch on GPIO {}", power.pin());

    let cancel = CancellationToken::new();
    let controller = Controller::new(
        Box::new(config_provider),
        Box::new(position_provider),
        Box::new(power),
        Box::new(LinuxNetworkProbe::new().with_shutdown(cancel.clone())),
    );

    if cli.once {
        let report = controller.run_cycle().await;
        info!("Single cycle finished: {:?}", report);
        return Ok(());
    }

    spawn_signal_handler(cancel.clone())?;

    controller.run(cancel).await;
    Ok(())
}

/// Cancel `cancel` on Ctrl+C or SIGTERM
fn spawn_signal_handler(cancel: CancellationToken) -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;

    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    error!("Failed to listen for Ctrl+C: {}", e);
                }
                info!("Received Ctrl+C, shutting down...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
            }
        }
        cancel.cancel();
    });

    Ok(())
}
