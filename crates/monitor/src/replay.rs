//! Landmark trace replay
//!
//! Stands in for a camera and a landmark model. A trace is JSON lines,
//! one frame per line:
//!
//! ```text
//! {"width": 640, "height": 480, "landmarks": [[0.41, 0.38], ...]}
//! {"width": 640, "height": 480, "landmarks": null}
//! ```
//!
//! Landmarks are normalized; `null` means no face in that frame.

use camera_capture::{CameraError, FrameSource, VideoFrame};
use dms::{DmsError, LandmarkDetector, Point};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::MonitorError;

/// One recorded frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceFrame {
    pub width: u32,
    pub height: u32,
    pub landmarks: Option<Vec<[f32; 2]>>,
}

/// A loaded trace
#[derive(Debug, Clone)]
pub struct Trace {
    frames: Arc<[TraceFrame]>,
}

impl Trace {
    pub fn load(path: &Path) -> Result<Self, MonitorError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| MonitorError::Trace(format!("{}: {}", path.display(), e)))?;
        let trace = Self::parse(&text)?;
        info!("Loaded {} frames from {}", trace.len(), path.display());
        Ok(trace)
    }

    /// Parse JSON lines; blank lines are skipped
    pub fn parse(text: &str) -> Result<Self, MonitorError> {
        let frames = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str::<TraceFrame>(line)
                    .map_err(|e| MonitorError::Trace(format!("line {}: {}", i + 1, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            frames: frames.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame source over the trace
    pub fn frames(&self) -> TraceFrames {
        TraceFrames {
            frames: self.frames.clone(),
            next: 0,
        }
    }

    /// Landmark detector answering from the trace by frame sequence
    pub fn landmarks(&self) -> TraceLandmarks {
        TraceLandmarks {
            frames: self.frames.clone(),
        }
    }
}

/// Yields one empty frame per trace line
#[derive(Debug)]
pub struct TraceFrames {
    frames: Arc<[TraceFrame]>,
    next: usize,
}

impl FrameSource for TraceFrames {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CameraError> {
        let Some(frame) = self.frames.get(self.next) else {
            return Ok(None);
        };
        let sequence = u32::try_from(self.next)
            .map_err(|_| CameraError::Stream("trace too long".to_string()))?;
        self.next += 1;
        Ok(Some(VideoFrame::empty(frame.width, frame.height, sequence)))
    }
}

/// Recorded landmarks, looked up by `VideoFrame::sequence`
#[derive(Debug, Clone)]
pub struct TraceLandmarks {
    frames: Arc<[TraceFrame]>,
}

impl LandmarkDetector for TraceLandmarks {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<Vec<Point>>, DmsError> {
        let recorded = self
            .frames
            .get(frame.sequence as usize)
            .ok_or_else(|| DmsError::Inference(format!("frame {} not in trace", frame.sequence)))?;

        Ok(recorded
            .landmarks
            .as_ref()
            .map(|points| points.iter().map(|&[x, y]| Point::new(x, y)).collect()))
    }
}
