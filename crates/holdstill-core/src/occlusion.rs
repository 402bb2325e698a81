//! Gross occlusion detection (hand over face, degenerate detections).
//!
//! Applies stricter per-group presence floors than plain validation, plus a
//! bounding-box sanity check that catches partial detections such as a hand
//! edge misread as a face.

use crate::landmarks::{LEFT_EYE_INDICES, MOUTH_INDICES, NOSE_INDICES, RIGHT_EYE_INDICES};
use crate::types::{BoundingBox, LandmarkSet};

// Stricter floors than `validate_landmarks`: a mostly-hidden group reads
// as occlusion even when a stray point or two survives.
const EYE_OCCLUSION_MIN: usize = 3;
const NOSE_OCCLUSION_MIN: usize = 2;
const MOUTH_OCCLUSION_MIN: usize = 3;

/// Smallest box side that can still be a real face at supported resolutions.
const MIN_BOX_SIDE_PX: f32 = 40.0;

/// Plausible face boxes are roughly square; anything outside this band is a
/// degenerate or partial detection.
const MIN_ASPECT_RATIO: f32 = 0.5;
const MAX_ASPECT_RATIO: f32 = 2.0;

/// Whether the observation looks covered or degenerate.
///
/// Short-circuits the rest of the pipeline: a covered face must never
/// advance progress.
pub fn is_covered(landmarks: &LandmarkSet, bounding_box: &BoundingBox) -> bool {
    let sparse_group = landmarks.count_present(&LEFT_EYE_INDICES) < EYE_OCCLUSION_MIN
        || landmarks.count_present(&RIGHT_EYE_INDICES) < EYE_OCCLUSION_MIN
        || landmarks.count_present(&NOSE_INDICES) < NOSE_OCCLUSION_MIN
        || landmarks.count_present(&MOUTH_INDICES) < MOUTH_OCCLUSION_MIN;

    if sparse_group {
        return true;
    }

    let width = bounding_box.width();
    let height = bounding_box.height();
    if width < MIN_BOX_SIDE_PX || height < MIN_BOX_SIDE_PX {
        return true;
    }

    let aspect = bounding_box.aspect_ratio();
    !(MIN_ASPECT_RATIO..=MAX_ASPECT_RATIO).contains(&aspect)
}
