//! Landmark presence evaluation.
//!
//! Classifies whether the eye, nose, and mouth regions are visible in a raw
//! landmark set by counting observed points in fixed canonical index groups
//! of the 468-point face mesh.

use crate::types::{LandmarkSet, ValidationResult};

// --- Canonical face-mesh index groups ---
pub(crate) const LEFT_EYE_INDICES: [u16; 8] = [263, 249, 390, 373, 374, 380, 381, 382];
pub(crate) const RIGHT_EYE_INDICES: [u16; 8] = [33, 7, 163, 144, 145, 153, 154, 155];
pub(crate) const NOSE_INDICES: [u16; 4] = [1, 2, 98, 327];
pub(crate) const MOUTH_INDICES: [u16; 8] = [61, 291, 0, 17, 39, 269, 181, 405];

// Lenient presence floors for "detected at all". The occlusion detector
// applies stricter floors to the same groups.
const EYE_DETECT_MIN: usize = 1;
const NOSE_DETECT_MIN: usize = 1;
const MOUTH_DETECT_MIN: usize = 1;

/// Evaluate which anatomical groups are present in `landmarks`.
///
/// Pure and deterministic; an empty set yields all-false.
pub fn validate_landmarks(landmarks: &LandmarkSet) -> ValidationResult {
    let has_left_eye = landmarks.count_present(&LEFT_EYE_INDICES) >= EYE_DETECT_MIN;
    let has_right_eye = landmarks.count_present(&RIGHT_EYE_INDICES) >= EYE_DETECT_MIN;
    let has_nose = landmarks.count_present(&NOSE_INDICES) >= NOSE_DETECT_MIN;
    let has_mouth = landmarks.count_present(&MOUTH_INDICES) >= MOUTH_DETECT_MIN;

    ValidationResult {
        has_left_eye,
        has_right_eye,
        has_nose,
        has_mouth,
        is_full_face: has_left_eye && has_right_eye && has_nose && has_mouth,
    }
}
