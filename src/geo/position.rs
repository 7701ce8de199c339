//! # Position Provider
//!
//! Reads the last-known GPS fix written by the boat's GPS daemon.
//!
//! The cache file is JSON:
//!
//! ```json
//! {"lat": 47.6062, "lon": -122.3321, "timestamp": "2026-06-01T12:00:00Z"}
//! ```
//!
//! `timestamp` is optional. A stale fix is used exactly like a fresh one; its
//! age is only reported in the debug log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{Result, WatchdogError};
use crate::geo::geodesic;
use crate::geo::Position;

/// Source of the last-known position fix
#[async_trait]
pub trait PositionProvider: Send + Sync {
    /// Read the current fix. Never fails; `None` means "no fix".
    async fn read(&self) -> Option<Position>;
}

/// On-disk layout of the position cache
#[derive(Debug, Deserialize)]
struct PositionRecord {
    #[serde(alias = "latitude")]
    lat: f64,

    #[serde(alias = "longitude")]
    lon: f64,

    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

/// Reads the fix from a JSON file on every call
#[derive(Debug, Clone)]
pub struct JsonFilePositionProvider {
    path: PathBuf,
}

impl JsonFilePositionProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_fix(&self) -> Result<Position> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        parse_fix(&contents)
    }
}

/// Decode and sanity-check a position record
fn parse_fix(contents: &str) -> Result<Position> {
    let record: PositionRecord = serde_json::from_str(contents)?;
    let position = Position::new(record.lat, record.lon);

    geodesic::validate(&position)
        .map_err(|e| WatchdogError::Position(format!("unusable fix: {}", e)))?;

    if let Some(timestamp) = record.timestamp {
        let age = Utc::now().signed_duration_since(timestamp);
        debug!(
            age_secs = age.num_seconds(),
            "Position fix taken at {}",
            timestamp.to_rfc3339()
        );
    }

    Ok(position)
}

#[async_trait]
impl PositionProvider for JsonFilePositionProvider {
    async fn read(&self) -> Option<Position> {
        match self.read_fix().await {
            Ok(position) => {
                debug!("GPS fix {}", position);
                Some(position)
            }
            Err(e) => {
                warn!("No GPS: {} ({})", e, self.path.display());
                None
            }
        }
    }
}
