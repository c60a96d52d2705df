//! Debounced Duration Accumulator
//!
//! Accumulates elapsed time while a condition holds and reports when a
//! threshold has been crossed. Used for both the drowsy-time and the
//! alarm-cooldown timers.

mod accumulator;

pub use accumulator::{DurationAccumulator, ResetPolicy, Tick};
