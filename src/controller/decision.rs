//! # Power Decision
//!
//! Pure mapping from a configuration snapshot and an optional fix to the
//! power state for this cycle. Whenever a signal is missing or GPS control is
//! off, the answer is ON.

use crate::config::Config;
use crate::geo::{find_nearby, Position};
use crate::power::PowerState;

/// Why a power state was chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionReason {
    /// `enable_gps_control` is false
    GpsControlDisabled,
    /// GPS control is on but there is no position fix
    NoFix,
    /// Within range of the named hotspot
    NearHotspot(String),
    /// No hotspot within range
    Away,
}

impl std::fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionReason::GpsControlDisabled => write!(f, "GPS control disabled"),
            DecisionReason::NoFix => write!(f, "no GPS fix"),
            DecisionReason::NearHotspot(name) => write!(f, "near {}", name),
            DecisionReason::Away => write!(f, "away from all hotspots"),
        }
    }
}

/// Power state chosen for one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerDecision {
    pub state: PowerState,
    pub reason: DecisionReason,
}

impl PowerDecision {
    fn on(reason: DecisionReason) -> Self {
        Self {
            state: PowerState::On,
            reason,
        }
    }
}

/// Decide interface power from `config` and the current fix
///
/// # Examples
///
/// ```
/// use wlan_watchdog::config::Config;
/// use wlan_watchdog::controller::decision::decide_power;
/// use wlan_watchdog::power::PowerState;
///
/// // GPS control is off by default, so power stays on
/// let decision = decide_power(&Config::default(), None);
/// assert_eq!(decision.state, PowerState::On);
/// ```
pub fn decide_power(config: &Config, position: Option<&Position>) -> PowerDecision {
    if !config.enable_gps_control {
        return PowerDecision::on(DecisionReason::GpsControlDisabled);
    }

    let Some(position) = position else {
        return PowerDecision::on(DecisionReason::NoFix);
    };

    match find_nearby(position, &config.hotspots, config.max_distance_miles) {
        Some(name) => PowerDecision::on(DecisionReason::NearHotspot(name.to_string())),
        None => PowerDecision {
            state: PowerState::Off,
            reason: DecisionReason::Away,
        },
    }
}
