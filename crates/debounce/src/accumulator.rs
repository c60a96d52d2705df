//! Duration accumulator implementation

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// What happens once the accumulated time reaches the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResetPolicy {
    /// Keep accumulating; stays past the threshold until reset
    Latch,
    /// Reset to zero as soon as the threshold is reached
    Rearm,
}

/// Outcome of a single [`DurationAccumulator::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Still below the threshold
    Pending,
    /// At or past the threshold (latching accumulator)
    Reached,
    /// Threshold reached and the accumulator was cleared (re-arming accumulator)
    Rearmed,
}

impl Tick {
    /// Whether the threshold was reached on this tick
    pub fn crossed(self) -> bool {
        !matches!(self, Tick::Pending)
    }
}

/// Time accumulated while a condition holds
#[derive(Debug, Clone)]
pub struct DurationAccumulator {
    /// Last time the accumulator was advanced or reset
    start: Instant,
    /// Time accumulated since the last reset
    elapsed: Duration,
    threshold: Duration,
    policy: ResetPolicy,
}

impl DurationAccumulator {
    /// Create an empty accumulator starting at `now`
    pub fn new(threshold: Duration, policy: ResetPolicy, now: Instant) -> Self {
        Self {
            start: now,
            elapsed: Duration::ZERO,
            threshold,
            policy,
        }
    }

    /// Add the time since the previous call, then apply the reset policy
    pub fn tick(&mut self, now: Instant) -> Tick {
        self.advance(now);

        if self.elapsed < self.threshold {
            return Tick::Pending;
        }

        match self.policy {
            ResetPolicy::Latch => Tick::Reached,
            ResetPolicy::Rearm => {
                self.reset(now);
                Tick::Rearmed
            }
        }
    }

    /// Like [`tick`](Self::tick), calling `on_cross` with the accumulated
    /// time when the threshold is reached
    pub fn tick_with<F>(&mut self, now: Instant, on_cross: F) -> Tick
    where
        F: FnOnce(Duration),
    {
        self.advance(now);
        let accumulated = self.elapsed;
        let tick = self.tick(now);
        if tick.crossed() {
            on_cross(accumulated);
        }
        tick
    }

    /// Add the time since the previous call without checking the threshold
    pub fn advance(&mut self, now: Instant) -> Duration {
        // Out-of-order timestamps add nothing
        self.elapsed += now.saturating_duration_since(self.start);
        self.start = self.start.max(now);
        self.elapsed
    }

    /// Drop accumulated time and restart from `now`
    pub fn reset(&mut self, now: Instant) {
        self.start = now;
        self.elapsed = Duration::ZERO;
    }

    /// Whether the accumulated time is at or past the threshold
    pub fn reached(&self) -> bool {
        self.elapsed >= self.threshold
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn start(&self) -> Instant {
        self.start
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn policy(&self) -> ResetPolicy {
        self.policy
    }

    /// Change the threshold; accumulated time is kept
    pub fn set_threshold(&mut self, threshold: Duration) {
        self.threshold = threshold;
    }
}
