//! Position sources

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{Position, PositionError};

/// Something that can be asked for the current position
///
/// Called from the sampler task once per interval; should return quickly.
pub trait PositionSource {
    fn sample(&mut self) -> Result<Position, PositionError>;
}

impl<S: PositionSource + ?Sized> PositionSource for Box<S> {
    fn sample(&mut self) -> Result<Position, PositionError> {
        (**self).sample()
    }
}

/// Random coordinates in `[0.1, 1.1)`, for running without a receiver
#[derive(Debug)]
pub struct SimulatedSource {
    rng: StdRng,
}

impl SimulatedSource {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic sequence
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionSource for SimulatedSource {
    fn sample(&mut self) -> Result<Position, PositionError> {
        Ok(Position {
            lat: self.rng.gen::<f64>() + 0.1,
            long: self.rng.gen::<f64>() + 0.1,
        })
    }
}
