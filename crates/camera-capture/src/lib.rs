//! Camera Capture Interface
//!
//! Frame types shared by the drowsiness pipeline and the trait that
//! capture drivers implement. Drivers themselves (V4L2, RTSP, replay)
//! live outside the detection core.

pub mod frame;

pub use frame::{FrameSource, VideoFrame};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Streaming error: {0}")]
    Stream(String),
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Target FPS
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self::cabin()
    }
}

impl CameraConfig {
    /// Create cabin camera config
    pub fn cabin() -> Self {
        Self { fps: 30 }
    }

    /// Interval between frames at the target rate
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_interval() {
        let config = CameraConfig { fps: 20 };
        assert_eq!(config.frame_interval(), std::time::Duration::from_millis(50));
    }

    #[test]
    fn test_zero_fps_does_not_divide_by_zero() {
        let config = CameraConfig { fps: 0 };
        assert_eq!(config.frame_interval(), std::time::Duration::from_secs(1));
    }
}
