//! Driver Monitoring System (DMS)
//!
//! Drowsiness detection from facial landmarks:
//! - Eye Aspect Ratio (EAR) from six landmarks per eye
//! - Debounced eye-closure timer with a level-triggered alarm output
//!
//! The landmark model is external and plugged in through [`LandmarkDetector`].

pub mod analysis;
pub mod config;
pub mod detector;
pub mod geometry;
pub mod state;

pub use analysis::DmsAnalysis;
pub use config::DmsConfig;
pub use detector::{DrowsinessDetector, LandmarkDetector};
pub use geometry::{EarReading, EyeIndices, EyeLandmarks, Point};
pub use state::{DetectorPhase, DrowsinessState};

use camera_capture::VideoFrame;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// DMS error types
#[derive(Error, Debug)]
pub enum DmsError {
    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Driver monitoring module: landmark model + drowsiness state machine
pub struct DmsModule<D> {
    config: DmsConfig,
    wait_time: Duration,
    landmarks: D,
    drowsiness: DrowsinessDetector,
}

impl<D: LandmarkDetector> DmsModule<D> {
    /// Create a new DMS module; rejects invalid thresholds
    pub fn new(config: DmsConfig, landmarks: D, now: Instant) -> Result<Self, DmsError> {
        config.validate()?;
        Ok(Self {
            wait_time: config.wait_time()?,
            landmarks,
            drowsiness: DrowsinessDetector::new(now),
            config,
        })
    }

    /// Analyze a single frame for driver state
    ///
    /// Never fails: model errors and unusable eye geometry reset the
    /// state machine to alert.
    pub fn analyze(&mut self, frame: &VideoFrame, now: Instant) -> DmsAnalysis {
        metrics::counter!("dms_frames_total").increment(1);

        let landmarks = match self.landmarks.detect(frame) {
            Ok(landmarks) => landmarks,
            Err(e) => {
                warn!(sequence = frame.sequence, "Landmark detection failed: {}", e);
                metrics::counter!("dms_landmark_errors_total").increment(1);
                None
            }
        };

        let reading = landmarks.as_deref().map(|points| {
            geometry::ear(
                points,
                &self.config.left_eye,
                &self.config.right_eye,
                frame.width,
                frame.height,
            )
        });

        let signal = reading.filter(EarReading::is_available);
        if reading.is_some() && signal.is_none() {
            debug!(sequence = frame.sequence, "Face found but eye geometry unusable");
        }

        let emit_alarm = self.drowsiness.evaluate(
            signal.is_some(),
            signal.map_or(0.0, |r| r.ear),
            self.config.ear_threshold,
            self.wait_time,
            now,
        );
        if emit_alarm {
            metrics::counter!("dms_alarm_frames_total").increment(1);
        }

        DmsAnalysis {
            sequence: frame.sequence,
            face_detected: reading.is_some(),
            ear: reading.map(|r| r.ear),
            eyes: signal.and_then(|r| r.eyes),
            phase: self.drowsiness.phase(),
            drowsy_time: self.drowsiness.drowsy_time(),
            emit_alarm,
        }
    }

    /// Current state machine snapshot
    pub fn state(&self) -> DrowsinessState {
        self.drowsiness.state()
    }

    pub fn config(&self) -> &DmsConfig {
        &self.config
    }
}
