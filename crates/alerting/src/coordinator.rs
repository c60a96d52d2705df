//! Alarm Coordinator Implementation

use debounce::{DurationAccumulator, ResetPolicy, Tick};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::AlertError;

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Seconds between repeat alarms during one sustained episode (default: 3)
    pub alarm_threshold_secs: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            alarm_threshold_secs: 3.0,
        }
    }
}

impl AlertConfig {
    /// `alarm_threshold_secs` as a duration; must be positive
    pub fn alarm_threshold(&self) -> Result<Duration, AlertError> {
        match Duration::try_from_secs_f64(self.alarm_threshold_secs) {
            Ok(d) if !d.is_zero() => Ok(d),
            _ => Err(AlertError::Config(format!(
                "alarm_threshold_secs must be a positive number, got {}",
                self.alarm_threshold_secs
            ))),
        }
    }
}

/// What the caller should do for this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmDecision {
    /// Not drowsy
    Silent,
    /// Rising edge: play the alarm and send one notification
    Fire,
    /// Still drowsy, alarm already fired for this window
    Sustained,
}

impl AlarmDecision {
    pub fn should_fire(self) -> bool {
        self == AlarmDecision::Fire
    }
}

/// Snapshot of the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmState {
    pub start_time: Instant,
    pub alarm_time: Duration,
    pub alarm_threshold: Duration,
    pub playing: bool,
}

/// Edge detector and cooldown for the drowsiness alarm
///
/// Performs no side effects; acting on [`AlarmDecision::Fire`] is up to
/// the caller, and the outcome of that action is never fed back.
#[derive(Debug, Clone)]
pub struct AlarmCoordinator {
    cooldown: DurationAccumulator,
    playing: bool,
    /// Alarms fired this session
    fire_count: usize,
}

impl AlarmCoordinator {
    /// Create a coordinator; rejects a non-positive threshold
    pub fn new(config: &AlertConfig, now: Instant) -> Result<Self, AlertError> {
        let threshold = config.alarm_threshold()?;
        info!("Creating alarm coordinator with threshold {:?}", threshold);
        Ok(Self::with_threshold(threshold, now))
    }

    pub fn with_threshold(alarm_threshold: Duration, now: Instant) -> Self {
        Self {
            cooldown: DurationAccumulator::new(alarm_threshold, ResetPolicy::Rearm, now),
            playing: false,
            fire_count: 0,
        }
    }

    /// Advance by one frame with the detector's output
    pub fn update(&mut self, emit_alarm: bool, now: Instant) -> AlarmDecision {
        if !emit_alarm {
            self.silence(now);
            return AlarmDecision::Silent;
        }

        let tick = self.cooldown.tick(now);

        let decision = if self.playing {
            AlarmDecision::Sustained
        } else {
            self.playing = true;
            self.fire_count += 1;
            info!(count = self.fire_count, "DROWSINESS alarm fired");
            AlarmDecision::Fire
        };

        if tick == Tick::Rearmed {
            debug!("Alarm window elapsed, re-arming");
            self.playing = false;
        }

        decision
    }

    /// Falling edge: cancel the cooldown immediately
    pub fn silence(&mut self, now: Instant) {
        if self.playing {
            debug!("Drowsiness ended, alarm silenced");
        }
        self.playing = false;
        self.cooldown.reset(now);
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn fire_count(&self) -> usize {
        self.fire_count
    }

    pub fn state(&self) -> AlarmState {
        AlarmState {
            start_time: self.cooldown.start(),
            alarm_time: self.cooldown.elapsed(),
            alarm_threshold: self.cooldown.threshold(),
            playing: self.playing,
        }
    }
}
