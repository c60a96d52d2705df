//! DMS analysis results

use serde::Serialize;
use std::time::Duration;

use crate::geometry::EyeLandmarks;
use crate::state::DetectorPhase;

/// Per-frame DMS result
#[derive(Debug, Clone, Default, Serialize)]
pub struct DmsAnalysis {
    /// Frame sequence number
    pub sequence: u32,

    /// Whether the landmark model found a face
    pub face_detected: bool,

    /// Two-eye average EAR, if a face was found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ear: Option<f32>,

    /// Pixel points of (left, right) eye, for overlays
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eyes: Option<(EyeLandmarks, EyeLandmarks)>,

    /// State machine phase after this frame
    pub phase: DetectorPhase,

    /// Continuous eye closure so far
    pub drowsy_time: Duration,

    /// Level-triggered drowsiness output
    pub emit_alarm: bool,
}

impl DmsAnalysis {
    /// Whether the frame carried a usable EAR signal
    pub fn has_signal(&self) -> bool {
        self.eyes.is_some()
    }

    /// One-line overlay text, e.g. for a debug display
    pub fn overlay_text(&self) -> String {
        match self.ear {
            Some(ear) if self.emit_alarm => format!("EAR {:.3} | WARNING: DROWSINESS", ear),
            Some(ear) => format!("EAR {:.3} | closed {:.1}s", ear, self.drowsy_time.as_secs_f32()),
            None => "No face".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_text() {
        let mut analysis = DmsAnalysis {
            face_detected: true,
            ear: Some(0.1),
            drowsy_time: Duration::from_millis(500),
            ..Default::default()
        };
        assert_eq!(analysis.overlay_text(), "EAR 0.100 | closed 0.5s");

        analysis.emit_alarm = true;
        assert!(analysis.overlay_text().ends_with("WARNING: DROWSINESS"));

        assert_eq!(DmsAnalysis::default().overlay_text(), "No face");
    }
}
