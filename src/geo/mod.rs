//! # Geolocation Module
//!
//! Position and hotspot types plus the proximity evaluator.
//!
//! This module handles:
//! - WGS-84 ellipsoidal distance (via `geo`'s geodesic metric)
//! - First-match hotspot lookup within a distance threshold
//! - Reading the last-known GPS fix from the position cache file

pub mod geodesic;
pub mod position;
pub mod proximity;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

pub use position::{JsonFilePositionProvider, PositionProvider};
pub use proximity::find_nearby;

/// A fix in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// A named reference point gating interface power
///
/// Coordinates are optional: a missing or non-numeric value is kept as `None`
/// so one bad entry does not reject the rest of the configuration. Such a
/// hotspot never matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    #[serde(default)]
    pub name: String,

    #[serde(
        default,
        alias = "lat",
        deserialize_with = "lenient_coordinate",
        skip_serializing_if = "Option::is_none"
    )]
    pub latitude: Option<f64>,

    #[serde(
        default,
        alias = "lon",
        deserialize_with = "lenient_coordinate",
        skip_serializing_if = "Option::is_none"
    )]
    pub longitude: Option<f64>,
}

impl Hotspot {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude: Some(latitude),
            longitude: Some(longitude),
        }
    }

    /// The hotspot's position, if both coordinates are numeric
    pub fn position(&self) -> Option<Position> {
        Some(Position::new(self.latitude?, self.longitude?))
    }
}

/// Accept any number; anything else becomes `None`
fn lenient_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Coordinate {
        Number(f64),
        Other(IgnoredAny),
    }

    Ok(match Coordinate::deserialize(deserializer)? {
        Coordinate::Number(value) => Some(value),
        Coordinate::Other(_) => None,
    })
}
