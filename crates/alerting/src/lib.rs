//! Alerting System
//!
//! Turns the level-triggered drowsiness signal into one-shot alarm events:
//! one per episode, repeated every `alarm_threshold` while it lasts.

mod coordinator;

pub use coordinator::{AlarmCoordinator, AlarmDecision, AlarmState, AlertConfig};

use thiserror::Error;

/// Alerting error types
#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Configuration error: {0}")]
    Config(String),
}
