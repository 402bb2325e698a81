//! Positional scoring of a face bounding box against the frame.
//!
//! Pure function of its inputs; the session layer supplies the upstream
//! foreign-object and full-face flags and owns everything stateful.

use crate::config::GuidanceConfig;
use crate::prompts;
use crate::types::{BoundingBox, FrameSize, GuidanceFault, PositionClass};

/// Outcome of scoring one observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionReport {
    pub class: PositionClass,
    /// True only for [`PositionClass::Good`].
    pub is_centered: bool,
    /// Text for the status surface.
    pub status: &'static str,
    /// Text for the voice channel, when the situation warrants speaking.
    pub voice: Option<&'static str>,
    /// Fault classification for non-Good outcomes.
    pub fault: Option<GuidanceFault>,
}

/// Classify centering and size of `bounding_box` relative to the frame.
///
/// Precedence (first match wins): foreign object → Invalid, not full-face →
/// Invalid, centered and sized → Good, within the warning band → Warning,
/// otherwise Error. Warning and Error carry a directional hint when the
/// size is off; otherwise Warning nudges toward the center and Error asks
/// for the face to be brought into the frame.
pub fn score_position(
    bounding_box: &BoundingBox,
    frame: FrameSize,
    config: &GuidanceConfig,
    foreign_object: bool,
    is_full_face: bool,
) -> PositionReport {
    if foreign_object {
        return PositionReport {
            class: PositionClass::Invalid,
            is_centered: false,
            status: prompts::FOREIGN_OBJECT,
            voice: None,
            fault: Some(GuidanceFault::ForeignObject),
        };
    }
    if !is_full_face {
        return PositionReport {
            class: PositionClass::Invalid,
            is_centered: false,
            status: prompts::INCOMPLETE_FACE,
            voice: Some(prompts::INCOMPLETE_FACE),
            fault: Some(GuidanceFault::IncompleteFace),
        };
    }

    let face_center = bounding_box.center();
    let frame_center = frame.center();
    let distance_x = (face_center.x - frame_center.x).abs();
    let distance_y = (face_center.y - frame_center.y).abs();

    let face_size = bounding_box.width().max(bounding_box.height());
    let frame_side = frame.width.min(frame.height);
    let min_size = frame_side * config.min_face_size_fraction;
    let max_size = frame_side * config.max_face_size_fraction;

    let size_ok = face_size > min_size && face_size < max_size;
    let is_centered = distance_x < frame.width * config.center_threshold_fraction
        && distance_y < frame.height * config.center_threshold_fraction
        && size_ok;

    if is_centered {
        return PositionReport {
            class: PositionClass::Good,
            is_centered: true,
            status: prompts::HOLD_STILL,
            voice: Some(prompts::HOLD_STILL),
            fault: None,
        };
    }

    let within_warning = distance_x < frame.width * config.warning_threshold_fraction
        && distance_y < frame.height * config.warning_threshold_fraction;
    let class = if within_warning {
        PositionClass::Warning
    } else {
        PositionClass::Error
    };

    // Size hints apply to both classes; the fallback hint depends on how
    // far off the face is.
    let (message, fault) = if face_size <= min_size {
        (prompts::MOVE_CLOSER, GuidanceFault::SizeOutOfRange)
    } else if face_size >= max_size {
        (prompts::MOVE_BACK, GuidanceFault::SizeOutOfRange)
    } else if class == PositionClass::Warning {
        (prompts::MOVE_TO_CENTER, GuidanceFault::OffCenter)
    } else {
        (prompts::INTO_FRAME, GuidanceFault::OffCenter)
    };

    PositionReport {
        class,
        is_centered: false,
        status: message,
        voice: Some(message),
        fault: Some(fault),
    }
}
