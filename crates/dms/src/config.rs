//! DMS configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::geometry::{EyeIndices, LEFT_EYE, RIGHT_EYE};
use crate::DmsError;

/// DMS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// EAR below this counts as eyes closed
    pub ear_threshold: f32,

    /// Continuous eye closure before the alarm (seconds)
    pub wait_time_secs: f64,

    /// Landmark indices P1..P6 of each eye
    pub left_eye: EyeIndices,
    pub right_eye: EyeIndices,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            ear_threshold: 0.18,
            wait_time_secs: 1.0,
            left_eye: LEFT_EYE,
            right_eye: RIGHT_EYE,
        }
    }
}

impl DmsConfig {
    /// Create strict config (alarm sooner, on milder closure)
    pub fn strict() -> Self {
        Self {
            ear_threshold: 0.21,
            wait_time_secs: 0.7,
            ..Default::default()
        }
    }

    /// Create lenient config
    pub fn lenient() -> Self {
        Self {
            ear_threshold: 0.15,
            wait_time_secs: 2.0,
            ..Default::default()
        }
    }

    /// Reject thresholds that cannot drive the state machine
    pub fn validate(&self) -> Result<(), DmsError> {
        if !self.ear_threshold.is_finite() || self.ear_threshold < 0.0 {
            return Err(DmsError::Config(format!(
                "ear_threshold must be a non-negative number, got {}",
                self.ear_threshold
            )));
        }
        self.wait_time()?;
        Ok(())
    }

    /// `wait_time_secs` as a duration
    pub fn wait_time(&self) -> Result<Duration, DmsError> {
        Duration::try_from_secs_f64(self.wait_time_secs).map_err(|_| {
            DmsError::Config(format!(
                "wait_time_secs must be a non-negative number, got {}",
                self.wait_time_secs
            ))
        })
    }
}
