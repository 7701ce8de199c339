//! # Controller Module
//!
//! The power/connectivity control loop.
//!
//! Each cycle runs the same sequence and keeps nothing for the next one:
//!
//! 1. **Decide power** - load config and position, pick ON/OFF, command the switch
//! 2. **Check connectivity** - association, then upstream reachability
//! 3. **Recover** - only when degraded: one bounce, one diagnostic re-query
//! 4. **Sleep** - `poll_interval_seconds`, interrupted by cancellation
//!
//! Recovery does not escalate. A link that stays broken gets the same single
//! bounce every cycle.

pub mod decision;

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{Config, ConfigProvider};
use crate::geo::PositionProvider;
use crate::network::{ConnectivityStatus, NetworkProbe};
use crate::power::{PowerActuator, PowerState};

pub use decision::{decide_power, DecisionReason, PowerDecision};

/// Result of the bounce performed in a degraded cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryOutcome {
    /// Association observed after the bounce, for diagnostics only
    pub ssid_after_bounce: Option<String>,
}

/// Everything one cycle decided and observed
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub decision: PowerDecision,
    pub connectivity: ConnectivityStatus,
    pub recovery: Option<RecoveryOutcome>,
    /// Sleep before the next cycle, from this cycle's snapshot
    pub poll_interval: Duration,
}

/// Power/connectivity controller
///
/// Holds only its collaborators; every cycle re-derives its inputs.
pub struct Controller {
    config: Box<dyn ConfigProvider>,
    position: Box<dyn PositionProvider>,
    power: Box<dyn PowerActuator>,
    network: Box<dyn NetworkProbe>,
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller").finish_non_exhaustive()
    }
}

impl Controller {
    pub fn new(
        config: Box<dyn ConfigProvider>,
        position: Box<dyn PositionProvider>,
        power: Box<dyn PowerActuator>,
        network: Box<dyn NetworkProbe>,
    ) -> Self {
        Self {
            config,
            position,
            power,
            network,
        }
    }

    /// Run until `cancel` fires
    ///
    /// Powers the interface on, waits the startup grace period, then cycles
    /// forever. Cancellation interrupts any sleep immediately; a cycle already
    /// in progress is completed so the interface is never left down.
    ///
    /// # Returns
    ///
    /// * `u64` - number of completed cycles
    pub async fn run(&self, cancel: CancellationToken) -> u64 {
        info!("Starting wlan watchdog");

        if !self.startup(&cancel).await {
            info!("Cancelled during startup grace period");
            return 0;
        }

        let mut cycles: u64 = 0;
        while !cancel.is_cancelled() {
            let report = self.run_cycle().await;
            cycles += 1;

            debug!("Sleeping {}s until next check", report.poll_interval.as_secs());
            if !sleep_or_cancel(&cancel, report.poll_interval).await {
                break;
            }
        }

        info!("Watchdog stopped after {} cycles", cycles);
        cycles
    }

    /// Fail-safe power on at boot, then wait for the position cache to warm up
    ///
    /// Returns false if cancelled while waiting.
    async fn startup(&self, cancel: &CancellationToken) -> bool {
        let config = self.config.load().await;
        info!(
            poll_interval_seconds = config.poll_interval_seconds,
            startup_grace_secs = config.network.startup_grace_secs,
            "Powering {} on at startup",
            config.network.interface
        );
        self.power.set(PowerState::On, config.power_switch_present).await;

        sleep_or_cancel(cancel, Duration::from_secs(config.network.startup_grace_secs)).await
    }

    /// Execute one full cycle without sleeping
    pub async fn run_cycle(&self) -> CycleReport {
        let config = self.config.load().await;

        let decision = self.decide_power(&config).await;
        let connectivity = self.check_connectivity(&config).await;

        let recovery = if connectivity.is_healthy() {
            None
        } else {
            Some(self.recover(&config).await)
        };

        info!(
            power = %decision.state,
            ssid = connectivity.associated_ssid.as_deref().unwrap_or("-"),
            reachable = connectivity.upstream_reachable,
            bounced = recovery.is_some(),
            "Cycle complete"
        );

        CycleReport {
            decision,
            connectivity,
            recovery,
            poll_interval: config.poll_interval(),
        }
    }

    /// Choose and command interface power
    ///
    /// The command is issued every cycle, even when unchanged.
    pub async fn decide_power(&self, config: &Config) -> PowerDecision {
        let position = self.position.read().await;
        let decision = decide_power(config, position.as_ref());

        match &decision.reason {
            DecisionReason::GpsControlDisabled => {
                info!("GPS control disabled, keeping USB power ON")
            }
            DecisionReason::NoFix => info!("Missing GPS, keeping USB power ON"),
            DecisionReason::NearHotspot(name) => info!("Boat is near: {}", name),
            DecisionReason::Away => info!("Boat is away, USB power OFF"),
        }

        if !config.power_switch_present {
            info!("No power switch present, USB power {} is logical only", decision.state);
        }
        self.power.set(decision.state, config.power_switch_present).await;

        decision
    }

    /// Query association and, if associated, upstream reachability
    pub async fn check_connectivity(&self, config: &Config) -> ConnectivityStatus {
        let iface = &config.network.interface;
        let associated_ssid = self.network.current_ssid(iface).await;

        let Some(ssid) = associated_ssid else {
            warn!("{} is not associated", iface);
            return ConnectivityStatus {
                associated_ssid: None,
                upstream_reachable: false,
            };
        };

        let upstream_reachable = self
            .network
            .upstream_reachable(
                iface,
                &config.network.probe_host,
                config.network.probe_attempts,
                Duration::from_secs(config.network.probe_timeout_secs),
            )
            .await;

        if upstream_reachable {
            debug!("{} associated with {} and online", iface, ssid);
        } else {
            warn!(
                "{} associated with {} but {} is unreachable",
                iface, ssid, config.network.probe_host
            );
        }

        ConnectivityStatus {
            associated_ssid: Some(ssid),
            upstream_reachable,
        }
    }

    /// Bounce the interface once and re-query association for the log
    ///
    /// No reachability retry; further recovery waits for the next cycle.
    pub async fn recover(&self, config: &Config) -> RecoveryOutcome {
        let iface = &config.network.interface;

        self.network
            .bounce(
                iface,
                Duration::from_secs(config.network.bounce_down_delay_secs),
                Duration::from_secs(config.network.bounce_up_delay_secs),
            )
            .await;

        let ssid_after_bounce = self.network.current_ssid(iface).await;
        match &ssid_after_bounce {
            Some(ssid) => info!("{} re-associated with {} after bounce", iface, ssid),
            None => warn!("{} still not associated after bounce", iface),
        }

        RecoveryOutcome { ssid_after_bounce }
    }
}

/// Sleep for `duration` unless cancelled first
///
/// Returns false if cancellation won.
async fn sleep_or_cancel(cancel: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::mocks::MockConfigProvider;
    use crate::geo::position::mocks::MockPositionProvider;
    use crate::geo::{Hotspot, Position};
    use crate::network::mocks::{MockNetworkProbe, ProbeCall};
    use crate::power::mocks::RecordingPowerActuator;
    use crate::power::MockPowerActuator;
    use async_trait::async_trait;
    use mockall::predicate::eq;

    fn dock_config() -> Config {
        Config {
            enable_gps_control: true,
            hotspots: vec![Hotspot::new("Dock", 10.0005, 20.0005)],
            ..Config::default()
        }
    }

    fn far_config() -> Config {
        Config {
            enable_gps_control: true,
            hotspots: vec![Hotspot::new("Dock", 11.0, 20.0005)],
            ..Config::default()
        }
    }

    fn boat() -> Option<Position> {
        Some(Position::new(10.0, 20.0))
    }

    struct Harness {
        config: MockConfigProvider,
        position: MockPositionProvider,
        power: RecordingPowerActuator,
        network: MockNetworkProbe,
    }

    impl Harness {
        fn new(config: Config, fix: Option<Position>, ssid: Option<&str>, reachable: bool) -> Self {
            Self {
                config: MockConfigProvider::new(config),
                position: MockPositionProvider::new(fix),
                power: RecordingPowerActuator::new(),
                network: MockNetworkProbe::new(ssid, reachable),
            }
        }

        fn controller(&self) -> Controller {
            Controller::new(
                Box::new(self.config.clone()),
                Box::new(self.position.clone()),
                Box::new(self.power.clone()),
                Box::new(self.network.clone()),
            )
        }
    }

    /// Config provider that cancels the token on its Nth load
    #[derive(Clone)]
    struct CancelAfterLoads {
        inner: MockConfigProvider,
        cancel: CancellationToken,
        limit: u32,
    }

    #[async_trait]
    impl ConfigProvider for CancelAfterLoads {
        async fn load(&self) -> Config {
            let config = self.inner.load().await;
            if self.inner.load_count() >= self.limit {
                self.cancel.cancel();
            }
            config
        }
    }

    #[tokio::test]
    async fn test_near_dock_powers_on() {
        let h = Harness::new(dock_config(), boat(), Some("Dock-WiFi"), true);

        let report = h.controller().run_cycle().await;

        assert_eq!(report.decision.state, PowerState::On);
        assert_eq!(report.decision.reason, DecisionReason::NearHotspot("Dock".into()));
        assert_eq!(h.power.get_commands(), vec![(PowerState::On, true)]);
    }

    #[tokio::test]
    async fn test_far_from_dock_powers_off() {
        let h = Harness::new(far_config(), boat(), Some("Dock-WiFi"), true);

        let report = h.controller().run_cycle().await;

        assert_eq!(report.decision.state, PowerState::Off);
        assert_eq!(h.power.get_commands(), vec![(PowerState::Off, true)]);
    }

    #[tokio::test]
    async fn test_gps_disabled_powers_on() {
        let mut config = far_config();
        config.enable_gps_control = false;
        let h = Harness::new(config, boat(), Some("Dock-WiFi"), true);

        let report = h.controller().run_cycle().await;

        assert_eq!(report.decision.state, PowerState::On);
        assert_eq!(report.decision.reason, DecisionReason::GpsControlDisabled);
    }

    #[tokio::test]
    async fn test_missing_fix_powers_on_and_still_checks_connectivity() {
        let h = Harness::new(far_config(), None, Some("Dock-WiFi"), true);

        let report = h.controller().run_cycle().await;

        assert_eq!(report.decision.state, PowerState::On);
        assert_eq!(report.decision.reason, DecisionReason::NoFix);
        assert_eq!(h.network.reachability_count(), 1);
    }

    #[tokio::test]
    async fn test_absent_switch_logs_decision_without_driving_pin() {
        let mut config = far_config();
        config.power_switch_present = false;
        let h = Harness::new(config, boat(), Some("Dock-WiFi"), true);

        let report = h.controller().run_cycle().await;

        assert_eq!(report.decision.state, PowerState::Off);
        assert_eq!(h.power.get_commands(), vec![(PowerState::Off, false)]);
        assert_eq!(h.power.transition_count(), 0);
    }

    #[tokio::test]
    async fn test_power_command_reissued_every_cycle() {
        let h = Harness::new(dock_config(), boat(), Some("Dock-WiFi"), true);
        let controller = h.controller();

        controller.run_cycle().await;
        controller.run_cycle().await;

        assert_eq!(
            h.power.get_commands(),
            vec![(PowerState::On, true), (PowerState::On, true)]
        );
        assert_eq!(h.power.transition_count(), 1);
    }

    #[tokio::test]
    async fn test_power_command_with_mockall() {
        let mut power = MockPowerActuator::new();
        power
            .expect_set()
            .with(eq(PowerState::Off), eq(true))
            .times(1)
            .return_const(());

        let network = MockNetworkProbe::new(Some("Dock-WiFi"), true);
        let controller = Controller::new(
            Box::new(MockConfigProvider::new(far_config())),
            Box::new(MockPositionProvider::new(boat())),
            Box::new(power),
            Box::new(network),
        );

        controller.run_cycle().await;
    }

    #[tokio::test]
    async fn test_healthy_cycle_skips_recovery() {
        let h = Harness::new(dock_config(), boat(), Some("Dock-WiFi"), true);

        let report = h.controller().run_cycle().await;

        assert!(report.connectivity.is_healthy());
        assert_eq!(report.recovery, None);
        assert_eq!(h.network.bounce_count(), 0);
        assert_eq!(
            h.network.get_calls(),
            vec![
                ProbeCall::CurrentSsid("wlan1".into()),
                ProbeCall::UpstreamReachable {
                    iface: "wlan1".into(),
                    host: "8.8.8.8".into(),
                    attempts: 3,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_associated_but_unreachable_bounces_once() {
        let h = Harness::new(dock_config(), boat(), Some("Dock-WiFi"), false);

        let report = h.controller().run_cycle().await;

        assert_eq!(report.connectivity.associated_ssid.as_deref(), Some("Dock-WiFi"));
        assert!(!report.connectivity.upstream_reachable);
        assert_eq!(
            report.recovery,
            Some(RecoveryOutcome {
                ssid_after_bounce: Some("Dock-WiFi".into())
            })
        );
        assert_eq!(h.network.bounce_count(), 1);
        assert_eq!(h.network.reachability_count(), 1, "no reachability retry after bounce");
        assert_eq!(h.network.ssid_count(), 2, "one diagnostic re-query");
        assert_eq!(report.poll_interval, Duration::from_secs(3600));
    }

    #[tokio::test]
    async fn test_unassociated_bounces_without_reachability_probe() {
        let h = Harness::new(dock_config(), boat(), None, true);
        h.network.script_ssids(vec![None, Some("Dock-WiFi")]);

        let report = h.controller().run_cycle().await;

        assert_eq!(report.connectivity, ConnectivityStatus::default());
        assert_eq!(h.network.reachability_count(), 0);
        assert_eq!(h.network.bounce_count(), 1);
        assert_eq!(
            report.recovery,
            Some(RecoveryOutcome {
                ssid_after_bounce: Some("Dock-WiFi".into())
            })
        );
        assert_eq!(
            h.network.get_calls().last(),
            Some(&ProbeCall::CurrentSsid("wlan1".into()))
        );
    }

    #[tokio::test]
    async fn test_bounce_uses_configured_delays() {
        let mut config = dock_config();
        config.network.interface = "wlan0".into();
        config.network.bounce_down_delay_secs = 3;
        config.network.bounce_up_delay_secs = 40;
        let h = Harness::new(config, boat(), None, false);

        h.controller().run_cycle().await;

        assert!(h.network.get_calls().contains(&ProbeCall::Bounce {
            iface: "wlan0".into(),
            down: Duration::from_secs(3),
            up: Duration::from_secs(40),
        }));
    }

    #[tokio::test]
    async fn test_persistent_failure_is_not_escalated() {
        let h = Harness::new(dock_config(), boat(), Some("Dock-WiFi"), false);
        let controller = h.controller();

        for _ in 0..3 {
            controller.run_cycle().await;
        }

        let bounces: Vec<_> = h
            .network
            .get_calls()
            .into_iter()
            .filter(|c| matches!(c, ProbeCall::Bounce { .. }))
            .collect();
        assert_eq!(bounces.len(), 3);
        assert!(bounces.windows(2).all(|w| w[0] == w[1]), "identical bounce every cycle");
    }

    #[tokio::test]
    async fn test_config_reloaded_each_cycle() {
        let h = Harness::new(dock_config(), boat(), Some("Dock-WiFi"), true);
        let controller = h.controller();

        assert_eq!(controller.run_cycle().await.decision.state, PowerState::On);

        h.config.set_config(far_config());
        assert_eq!(controller.run_cycle().await.decision.state, PowerState::Off);
        assert_eq!(h.config.load_count(), 2);
    }

    #[tokio::test]
    async fn test_recovery_follows_link_each_cycle() {
        let h = Harness::new(dock_config(), boat(), Some("Dock-WiFi"), false);
        let controller = h.controller();

        assert!(controller.run_cycle().await.recovery.is_some());

        h.network.set_reachable(true);
        assert!(controller.run_cycle().await.recovery.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_bounded_by_cancellation() {
        let h = Harness::new(dock_config(), boat(), Some("Dock-WiFi"), true);
        let cancel = CancellationToken::new();

        // One load at startup plus three cycles
        let config = CancelAfterLoads {
            inner: h.config.clone(),
            cancel: cancel.clone(),
            limit: 4,
        };
        let controller = Controller::new(
            Box::new(config),
            Box::new(h.position.clone()),
            Box::new(h.power.clone()),
            Box::new(h.network.clone()),
        );

        let cycles = controller.run(cancel).await;

        assert_eq!(cycles, 3);
        assert_eq!(h.position.read_count(), 3);
        // Startup power-on plus one command per cycle
        assert_eq!(h.power.get_commands().len(), 4);
        assert_eq!(h.power.get_commands()[0], (PowerState::On, true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_startup_powers_on_before_first_decision() {
        let h = Harness::new(far_config(), boat(), Some("Dock-WiFi"), true);
        let cancel = CancellationToken::new();
        let config = CancelAfterLoads {
            inner: h.config.clone(),
            cancel: cancel.clone(),
            limit: 2,
        };
        let controller = Controller::new(
            Box::new(config),
            Box::new(h.position.clone()),
            Box::new(h.power.clone()),
            Box::new(h.network.clone()),
        );

        let start = tokio::time::Instant::now();
        assert_eq!(controller.run(cancel).await, 1);

        assert_eq!(
            h.power.get_commands(),
            vec![(PowerState::On, true), (PowerState::Off, true)]
        );
        // Grace period only; the poll sleep was cut short by cancellation
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(60) && elapsed < Duration::from_secs(61));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_startup_runs_no_cycles() {
        let h = Harness::new(dock_config(), boat(), Some("Dock-WiFi"), true);
        let cancel = CancellationToken::new();
        let controller = h.controller();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        assert_eq!(controller.run(cancel).await, 0);
        assert_eq!(h.position.read_count(), 0);
        assert_eq!(h.power.get_commands(), vec![(PowerState::On, true)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_or_cancel() {
        let cancel = CancellationToken::new();
        assert!(sleep_or_cancel(&cancel, Duration::from_secs(3600)).await);

        cancel.cancel();
        assert!(!sleep_or_cancel(&cancel, Duration::from_secs(3600)).await);
    }

    #[test]
    fn test_debug_impl() {
        let h = Harness::new(Config::default(), None, None, false);
        assert!(format!("{:?}", h.controller()).starts_with("Controller"));
    }
}
