//! Eye landmark geometry and the Eye Aspect Ratio (EAR)

use serde::{Deserialize, Serialize};

/// Six landmark indices for one eye, ordered P1..P6:
/// outer corner, two upper-lid points, inner corner, two lower-lid points
pub type EyeIndices = [usize; 6];

/// Left eye in face-mesh numbering
pub const LEFT_EYE: EyeIndices = [362, 385, 387, 263, 373, 380];

/// Right eye in face-mesh numbering
pub const RIGHT_EYE: EyeIndices = [33, 160, 158, 133, 153, 144];

/// 2D point (normalized or pixel coordinates depending on context)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// Pixel coordinates of the six points of one eye
pub type EyeLandmarks = [Point; 6];

/// Averaged EAR for one frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EarReading {
    /// Two-eye average; 0.0 when `eyes` is `None`
    pub ear: f32,
    /// Pixel points of (left, right) eye, `None` when geometry was unusable
    pub eyes: Option<(EyeLandmarks, EyeLandmarks)>,
}

impl EarReading {
    /// Reading for unusable geometry
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn is_available(&self) -> bool {
        self.eyes.is_some()
    }
}

/// Euclidean distance between two points
pub fn distance(a: Point, b: Point) -> f32 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Map a normalized landmark to pixel coordinates
///
/// Returns `None` for coordinates outside `[0, 1]`.
pub fn normalized_to_pixel(point: Point, width: u32, height: u32) -> Option<Point> {
    if width == 0 || height == 0 {
        return None;
    }
    let valid = |v: f32| v.is_finite() && (0.0..=1.0).contains(&v);
    if !valid(point.x) || !valid(point.y) {
        return None;
    }
    let x = (point.x * width as f32).floor().min((width - 1) as f32);
    let y = (point.y * height as f32).floor().min((height - 1) as f32);
    Some(Point::new(x, y))
}

/// EAR of a single eye: (|P2-P6| + |P3-P5|) / (2 |P1-P4|)
///
/// `None` when the eye corners coincide.
pub fn eye_aspect_ratio(eye: &EyeLandmarks) -> Option<f32> {
    let horizontal = distance(eye[0], eye[3]);
    if horizontal <= f32::EPSILON {
        return None;
    }
    let vertical = distance(eye[1], eye[5]) + distance(eye[2], eye[4]);
    Some(vertical / (2.0 * horizontal))
}

fn eye_pixels(
    landmarks: &[Point],
    indices: &EyeIndices,
    width: u32,
    height: u32,
) -> Option<EyeLandmarks> {
    let mut eye = [Point::default(); 6];
    for (slot, &idx) in eye.iter_mut().zip(indices) {
        *slot = normalized_to_pixel(*landmarks.get(idx)?, width, height)?;
    }
    Some(eye)
}

/// Average EAR of both eyes from a full set of normalized landmarks
///
/// Never fails: a missing index, an out-of-frame landmark or degenerate
/// eye geometry yields [`EarReading::unavailable`].
pub fn ear(
    landmarks: &[Point],
    left: &EyeIndices,
    right: &EyeIndices,
    frame_w: u32,
    frame_h: u32,
) -> EarReading {
    let eyes = eye_pixels(landmarks, left, frame_w, frame_h)
        .zip(eye_pixels(landmarks, right, frame_w, frame_h));

    let Some((left_eye, right_eye)) = eyes else {
        return EarReading::unavailable();
    };

    match (eye_aspect_ratio(&left_eye), eye_aspect_ratio(&right_eye)) {
        (Some(l), Some(r)) => EarReading {
            ear: (l + r) / 2.0,
            eyes: Some((left_eye, right_eye)),
        },
        _ => EarReading::unavailable(),
    }
}
