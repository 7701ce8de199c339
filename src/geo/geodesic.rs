//! # Geodesic Distance
//!
//! Surface distance on the WGS-84 ellipsoid, computed with `geo`'s
//! [`Geodesic`] metric (Karney's algorithm). Coordinates are checked first so
//! a malformed fix or hotspot is reported as an error instead of yielding a
//! meaningless distance.

use ::geo::{Distance, Geodesic, Point};

use crate::error::{Result, WatchdogError};
use crate::geo::Position;

/// Metres in one statute mile
pub const METERS_PER_MILE: f64 = 1_609.344;

/// Check that a position is a usable WGS-84 coordinate
///
/// # Errors
///
/// Returns `Geodesic` if either component is non-finite or out of range.
pub fn validate(position: &Position) -> Result<()> {
    if !position.latitude.is_finite() || !position.longitude.is_finite() {
        return Err(WatchdogError::Geodesic(format!(
            "non-finite coordinate {}",
            position
        )));
    }

    if !(-90.0..=90.0).contains(&position.latitude) {
        return Err(WatchdogError::Geodesic(format!(
            "latitude {} out of range",
            position.latitude
        )));
    }

    if !(-180.0..=180.0).contains(&position.longitude) {
        return Err(WatchdogError::Geodesic(format!(
            "longitude {} out of range",
            position.longitude
        )));
    }

    Ok(())
}

/// `geo` points are (x = longitude, y = latitude)
fn to_point(position: &Position) -> Point<f64> {
    Point::new(position.longitude, position.latitude)
}

/// Ellipsoidal distance between two positions in metres
///
/// # Errors
///
/// Returns `Geodesic` if a coordinate is invalid.
///
/// # Examples
///
/// ```
/// use wlan_watchdog::geo::Position;
/// use wlan_watchdog::geo::geodesic::distance_meters;
///
/// let d = distance_meters(&Position::new(0.0, 0.0), &Position::new(1.0, 0.0))?;
/// assert!((d - 110_574.389).abs() < 0.01);
/// # Ok::<(), wlan_watchdog::error::WatchdogError>(())
/// ```
pub fn distance_meters(from: &Position, to: &Position) -> Result<f64> {
    validate(from)?;
    validate(to)?;

    let meters = Geodesic::distance(to_point(from), to_point(to));
    if !meters.is_finite() {
        return Err(WatchdogError::Geodesic(format!(
            "no distance between {} and {}",
            from, to
        )));
    }

    Ok(meters)
}

/// Ellipsoidal distance between two positions in statute miles
pub fn distance_miles(from: &Position, to: &Position) -> Result<f64> {
    Ok(distance_meters(from, to)? / METERS_PER_MILE)
}
