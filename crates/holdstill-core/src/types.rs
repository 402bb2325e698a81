use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single 2D facial keypoint in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Sparse set of canonical face-mesh landmarks observed in one frame.
///
/// Indices address the 468-point canonical mesh; an index absent from the
/// set means that point was not detected this frame. Immutable once built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandmarkSet {
    points: HashMap<u16, Point>,
}

impl LandmarkSet {
    /// Build a landmark set from `(index, point)` pairs. Later duplicates win.
    pub fn from_points(points: impl IntoIterator<Item = (u16, Point)>) -> Self {
        Self {
            points: points.into_iter().collect(),
        }
    }

    pub fn get(&self, index: u16) -> Option<Point> {
        self.points.get(&index).copied()
    }

    pub fn contains(&self, index: u16) -> bool {
        self.points.contains_key(&index)
    }

    /// How many of the given canonical indices were observed this frame.
    pub fn count_present(&self, indices: &[u16]) -> usize {
        indices.iter().filter(|i| self.contains(**i)).count()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Axis-aligned bounding box of a detected face, top-left to bottom-right,
/// in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Width, clamped non-negative for degenerate detections.
    pub fn width(&self) -> f32 {
        (self.max.x - self.min.x).max(0.0)
    }

    /// Height, clamped non-negative for degenerate detections.
    pub fn height(&self) -> f32 {
        (self.max.y - self.min.y).max(0.0)
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// Width over height; 0.0 when the box has no height.
    pub fn aspect_ratio(&self) -> f32 {
        let h = self.height();
        if h > 0.0 {
            self.width() / h
        } else {
            0.0
        }
    }
}

/// Dimensions of the camera frame an observation was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: f32,
    pub height: f32,
}

impl FrameSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// One detected face in one frame. A frame yields zero, one, or many.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceObservation {
    pub landmarks: LandmarkSet,
    pub bounding_box: BoundingBox,
}

/// Per-observation anatomical presence check. Recomputed fresh every
/// observation, never merged across frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub has_left_eye: bool,
    pub has_right_eye: bool,
    pub has_nose: bool,
    pub has_mouth: bool,
    pub is_full_face: bool,
}

/// Discrete positioning verdict for one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionClass {
    /// Centered and within the accepted size band.
    Good,
    /// Near-threshold; a directional nudge should fix it.
    Warning,
    /// Far off center, too near, or too far.
    Error,
    /// Foreign object present or failed anatomical validation.
    Invalid,
}

/// Why an observation failed to advance the session. Every fault is
/// recovered locally by resetting progress and re-entering search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuidanceFault {
    /// No face observed in the frame.
    NoFace,
    /// More than one face observed in the frame.
    ForeignObject,
    /// Gross occlusion (hand over face, degenerate detection).
    Occluded,
    /// Eyes, nose, or mouth missing from the landmark set.
    IncompleteFace,
    /// Face outside the centering thresholds.
    OffCenter,
    /// Face outside the accepted size band.
    SizeOutOfRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_set_empty() {
        let set = LandmarkSet::default();
        assert!(set.is_empty());
        assert_eq!(set.count_present(&[1, 2, 3]), 0);
        assert!(set.get(0).is_none());
    }

    #[test]
    fn test_landmark_set_count_present() {
        let set = LandmarkSet::from_points([
            (1, Point::new(10.0, 10.0)),
            (5, Point::new(20.0, 20.0)),
        ]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.count_present(&[1, 2, 5]), 2);
        assert_eq!(set.count_present(&[7, 8]), 0);
    }

    #[test]
    fn test_bounding_box_dimensions() {
        let bbox = BoundingBox::new(Point::new(100.0, 50.0), Point::new(300.0, 250.0));
        assert_eq!(bbox.width(), 200.0);
        assert_eq!(bbox.height(), 200.0);
        assert_eq!(bbox.center(), Point::new(200.0, 150.0));
        assert!((bbox.aspect_ratio() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_bounding_box_degenerate_clamps_to_zero() {
        // Inverted corners must not produce negative dimensions
        let bbox = BoundingBox::new(Point::new(300.0, 250.0), Point::new(100.0, 50.0));
        assert_eq!(bbox.width(), 0.0);
        assert_eq!(bbox.height(), 0.0);
        assert_eq!(bbox.aspect_ratio(), 0.0);
    }

    #[test]
    fn test_frame_center() {
        let frame = FrameSize::new(640.0, 480.0);
        assert_eq!(frame.center(), Point::new(320.0, 240.0));
    }
}
