//! Driver state tracking

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Phase of the drowsiness state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DetectorPhase {
    /// Eyes open, no face, or no usable signal
    #[default]
    Alert,
    /// Eyes closed, not yet for `wait_time`
    Accumulating,
    /// Eyes closed for at least `wait_time`
    Alarmed,
}

impl DetectorPhase {
    pub fn is_alarmed(self) -> bool {
        self == DetectorPhase::Alarmed
    }
}

/// Snapshot of the drowsiness state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrowsinessState {
    /// Last time `drowsy_time` was advanced or reset
    pub start_time: Instant,
    /// Continuous time with eyes below the EAR threshold
    pub drowsy_time: Duration,
    /// Level-triggered alarm output
    pub emit_alarm: bool,
    pub phase: DetectorPhase,
}

impl DrowsinessState {
    /// Fresh state at `now`
    pub fn alert(now: Instant) -> Self {
        Self {
            start_time: now,
            drowsy_time: Duration::ZERO,
            emit_alarm: false,
            phase: DetectorPhase::Alert,
        }
    }
}
