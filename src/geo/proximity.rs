//! # Proximity Evaluator
//!
//! Maps a position and an ordered hotspot list to the first hotspot within
//! range. Hotspots are checked in configured order and the first match wins,
//! even when a later hotspot is closer; overlapping geofences therefore
//! resolve deterministically.

use tracing::{debug, warn};

use crate::geo::geodesic::distance_miles;
use crate::geo::{Hotspot, Position};

/// Find the first hotspot within `max_distance_miles` of `position`
///
/// A hotspot whose distance cannot be computed (missing, non-numeric or
/// out-of-range coordinates) is treated as out of range and skipped.
///
/// # Examples
///
/// ```
/// use wlan_watchdog::geo::{find_nearby, Hotspot, Position};
///
/// let hotspots = vec![Hotspot::new("Dock", 10.0005, 20.0005)];
/// let nearby = find_nearby(&Position::new(10.0, 20.0), &hotspots, 1.0);
/// assert_eq!(nearby, Some("Dock"));
/// ```
pub fn find_nearby<'a>(
    position: &Position,
    hotspots: &'a [Hotspot],
    max_distance_miles: f64,
) -> Option<&'a str> {
    for hotspot in hotspots {
        let Some(target) = hotspot.position() else {
            warn!("Skipping hotspot {:?}: missing or non-numeric coordinates", hotspot.name);
            continue;
        };

        match distance_miles(position, &target) {
            Ok(miles) => {
                debug!(hotspot = %hotspot.name, miles, "Distance to hotspot");
                if miles <= max_distance_miles {
                    return Some(hotspot.name.as_str());
                }
            }
            Err(e) => {
                warn!("Skipping hotspot {:?}: {}", hotspot.name, e);
            }
        }
    }

    None
}
