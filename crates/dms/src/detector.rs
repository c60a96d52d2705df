//! Landmark detector interface and the drowsiness state machine

use camera_capture::VideoFrame;
use debounce::{DurationAccumulator, ResetPolicy, Tick};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::geometry::Point;
use crate::state::{DetectorPhase, DrowsinessState};
use crate::DmsError;

/// Facial landmark model (face mesh or similar)
///
/// Returns normalized landmarks of the first face, or `None` when no face
/// was found.
pub trait LandmarkDetector {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<Vec<Point>>, DmsError>;
}

impl<D: LandmarkDetector + ?Sized> LandmarkDetector for Box<D> {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<Vec<Point>>, DmsError> {
        (**self).detect(frame)
    }
}

/// Drowsy-time accumulator driven by the per-frame EAR
///
/// Output is level-triggered: `true` on every frame while the eyes have
/// been closed for at least `wait_time`.
#[derive(Debug, Clone)]
pub struct DrowsinessDetector {
    drowsy: DurationAccumulator,
    emit_alarm: bool,
    phase: DetectorPhase,
}

impl DrowsinessDetector {
    pub fn new(now: Instant) -> Self {
        Self {
            drowsy: DurationAccumulator::new(Duration::ZERO, ResetPolicy::Latch, now),
            emit_alarm: false,
            phase: DetectorPhase::Alert,
        }
    }

    /// Advance the state machine by one frame
    pub fn evaluate(
        &mut self,
        face_found: bool,
        ear: f32,
        ear_threshold: f32,
        wait_time: Duration,
        now: Instant,
    ) -> bool {
        // A missing face is ambiguous (occlusion, lost tracking), never "eyes closed"
        let eyes_closed = face_found && ear < ear_threshold;
        if !eyes_closed {
            self.reset(now);
            return false;
        }

        self.drowsy.set_threshold(wait_time);
        match self.drowsy.tick(now) {
            Tick::Pending => {
                self.emit_alarm = false;
                self.phase = DetectorPhase::Accumulating;
            }
            Tick::Reached | Tick::Rearmed => {
                if !self.emit_alarm {
                    info!(
                        drowsy_ms = self.drowsy.elapsed().as_millis() as u64,
                        "Eyes closed past wait time"
                    );
                }
                self.emit_alarm = true;
                self.phase = DetectorPhase::Alarmed;
            }
        }

        self.emit_alarm
    }

    /// Return to the alert state
    pub fn reset(&mut self, now: Instant) {
        if self.phase != DetectorPhase::Alert {
            debug!(
                drowsy_ms = self.drowsy.elapsed().as_millis() as u64,
                "Drowsiness state reset"
            );
        }
        self.drowsy.reset(now);
        self.emit_alarm = false;
        self.phase = DetectorPhase::Alert;
    }

    pub fn phase(&self) -> DetectorPhase {
        self.phase
    }

    pub fn drowsy_time(&self) -> Duration {
        self.drowsy.elapsed()
    }

    pub fn emit_alarm(&self) -> bool {
        self.emit_alarm
    }

    pub fn state(&self) -> DrowsinessState {
        DrowsinessState {
            start_time: self.drowsy.start(),
            drowsy_time: self.drowsy.elapsed(),
            emit_alarm: self.emit_alarm,
            phase: self.phase,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EAR_THRESHOLD: f32 = 0.18;
    const WAIT: Duration = Duration::from_secs(1);

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    /// Feed `ear_at(t)` every 100ms from t=0 to `until_ms` inclusive
    fn run(
        detector: &mut DrowsinessDetector,
        t0: Instant,
        until_ms: u64,
        ear_at: impl Fn(u64) -> f32,
    ) -> Vec<(u64, bool)> {
        (0..=until_ms)
            .step_by(100)
            .map(|t| {
                let out = detector.evaluate(true, ear_at(t), EAR_THRESHOLD, WAIT, t0 + ms(t));
                (t, out)
            })
            .collect()
    }

    #[test]
    fn test_alarm_after_wait_time() {
        let t0 = Instant::now();
        let mut detector = DrowsinessDetector::new(t0);
        let outputs = run(&mut detector, t0, 1200, |_| 0.10);

        let first_alarm = outputs.iter().find(|(_, on)| *on).map(|(t, _)| *t);
        assert_eq!(first_alarm, Some(1000));
        assert!(outputs.iter().filter(|(t, _)| *t < 1000).all(|(_, on)| !on));
        assert_eq!(detector.phase(), DetectorPhase::Alarmed);
    }

    #[test]
    fn test_eyes_open_before_wait_time_never_alarms() {
        let t0 = Instant::now();
        let mut detector = DrowsinessDetector::new(t0);
        let outputs = run(&mut detector, t0, 800, |t| if t < 800 { 0.10 } else { 0.25 });

        assert!(outputs.iter().all(|(_, on)| !on));
        assert_eq!(detector.drowsy_time(), Duration::ZERO);
        assert_eq!(detector.phase(), DetectorPhase::Alert);
        assert_eq!(detector.state().start_time, t0 + ms(800));
    }

    #[test]
    fn test_single_open_frame_resets_accumulation() {
        let t0 = Instant::now();
        let mut detector = DrowsinessDetector::new(t0);
        run(&mut detector, t0, 600, |_| 0.10);
        assert_eq!(detector.phase(), DetectorPhase::Accumulating);
        assert_eq!(detector.drowsy_time(), ms(600));

        assert!(!detector.evaluate(true, 0.30, EAR_THRESHOLD, WAIT, t0 + ms(700)));
        assert_eq!(detector.drowsy_time(), Duration::ZERO);

        // Closure must start over
        assert!(!detector.evaluate(true, 0.10, EAR_THRESHOLD, WAIT, t0 + ms(1500)));
        assert!(detector.evaluate(true, 0.10, EAR_THRESHOLD, WAIT, t0 + ms(1700)));
    }

    #[test]
    fn test_no_face_never_alarms() {
        let t0 = Instant::now();
        let mut detector = DrowsinessDetector::new(t0);
        for t in (0..5000).step_by(100) {
            assert!(!detector.evaluate(false, 0.0, EAR_THRESHOLD, WAIT, t0 + ms(t)));
            assert_eq!(detector.drowsy_time(), Duration::ZERO);
        }
        assert_eq!(detector.phase(), DetectorPhase::Alert);
    }

    #[test]
    fn test_lost_face_resets_alarm() {
        let t0 = Instant::now();
        let mut detector = DrowsinessDetector::new(t0);
        run(&mut detector, t0, 1500, |_| 0.10);
        assert!(detector.emit_alarm());

        assert!(!detector.evaluate(false, 0.10, EAR_THRESHOLD, WAIT, t0 + ms(1600)));
        assert_eq!(detector.state(), DrowsinessState::alert(t0 + ms(1600)));
    }

    #[test]
    fn test_alarmed_is_idempotent_and_monotone() {
        let t0 = Instant::now();
        let mut detector = DrowsinessDetector::new(t0);
        run(&mut detector, t0, 1000, |_| 0.10);

        let mut last = detector.drowsy_time();
        for t in (1100..3000).step_by(100) {
            assert!(detector.evaluate(true, 0.10, EAR_THRESHOLD, WAIT, t0 + ms(t)));
            assert!(detector.drowsy_time() > last);
            last = detector.drowsy_time();
        }
        assert_eq!(detector.phase(), DetectorPhase::Alarmed);
    }

    #[test]
    fn test_raised_wait_time_withdraws_alarm() {
        let t0 = Instant::now();
        let mut detector = DrowsinessDetector::new(t0);
        run(&mut detector, t0, 1000, |_| 0.10);
        assert!(detector.emit_alarm());

        let longer = Duration::from_secs(5);
        assert!(!detector.evaluate(true, 0.10, EAR_THRESHOLD, longer, t0 + ms(1100)));
        assert_eq!(detector.phase(), DetectorPhase::Accumulating);
        assert!(!detector.emit_alarm());
        assert_eq!(detector.drowsy_time(), ms(1100));
    }

    #[test]
    fn test_ear_at_threshold_counts_as_open() {
        let t0 = Instant::now();
        let mut detector = DrowsinessDetector::new(t0);
        run(&mut detector, t0, 2000, |_| EAR_THRESHOLD);
        assert_eq!(detector.phase(), DetectorPhase::Alert);
    }

    #[test]
    fn test_nan_ear_is_treated_as_open() {
        let t0 = Instant::now();
        let mut detector = DrowsinessDetector::new(t0);
        run(&mut detector, t0, 500, |_| 0.10);
        assert!(!detector.evaluate(true, f32::NAN, EAR_THRESHOLD, WAIT, t0 + ms(600)));
        assert_eq!(detector.drowsy_time(), Duration::ZERO);
    }
}
