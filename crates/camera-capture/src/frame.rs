//! Video frame types and the frame source trait

use crate::CameraError;

/// Decoded RGB video frame
#[derive(Debug, Clone, Default)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3); empty for replayed frames
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    /// Frame without pixel data, for sources that only carry geometry
    pub fn empty(width: u32, height: u32, sequence: u32) -> Self {
        Self {
            width,
            height,
            sequence,
            ..Default::default()
        }
    }
}

/// Source of frames for the monitoring loop
///
/// Returns `Ok(None)` when the stream has ended.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CameraError>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CameraError> {
        (**self).next_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Countdown(u32);

    impl FrameSource for Countdown {
        fn next_frame(&mut self) -> Result<Option<VideoFrame>, CameraError> {
            if self.0 == 0 {
                return Ok(None);
            }
            self.0 -= 1;
            Ok(Some(VideoFrame::empty(640, 480, self.0)))
        }
    }

    #[test]
    fn test_empty_frame_keeps_geometry() {
        let frame = VideoFrame::empty(640, 480, 7);
        assert!(frame.data.is_empty());
        assert_eq!((frame.width, frame.height, frame.sequence), (640, 480, 7));
    }

    #[test]
    fn test_boxed_source_drains() {
        let mut source: Box<dyn FrameSource> = Box::new(Countdown(2));
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_none());
    }
}
