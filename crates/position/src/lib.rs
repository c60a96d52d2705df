//! Position Provider
//!
//! Samples a position source on a fixed interval in the background and
//! publishes the latest fix. Readers take a snapshot without waiting; the
//! value may be stale, and is unset until the first sample arrives.

mod provider;
mod source;

pub use provider::{PositionHandle, PositionProvider};
pub use source::{PositionSource, SimulatedSource};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Position error types
#[derive(Error, Debug)]
pub enum PositionError {
    #[error("No fix available")]
    NoFix,

    #[error("Configuration error: {0}")]
    Config(String),
}

/// A single position fix (degrees)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub lat: f64,
    pub long: f64,
}

/// Latest known coordinates; both fields are `None` before the first fix
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GpsCoords {
    pub lat: Option<f64>,
    pub long: Option<f64>,
}

impl GpsCoords {
    pub fn unset() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.lat.is_some() && self.long.is_some()
    }
}

impl From<Position> for GpsCoords {
    fn from(p: Position) -> Self {
        Self {
            lat: Some(p.lat),
            long: Some(p.long),
        }
    }
}

/// Position sampling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionConfig {
    /// Run the background sampler
    pub enabled: bool,
    /// Sampling interval (milliseconds)
    pub interval_ms: u64,
}

impl Default for PositionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 1000,
        }
    }
}

impl PositionConfig {
    pub fn validate(&self) -> Result<(), PositionError> {
        if self.interval_ms == 0 {
            return Err(PositionError::Config("interval_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.interval_ms)
    }
}
