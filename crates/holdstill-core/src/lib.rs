//! holdstill-core — Guided face-capture classification logic.
//!
//! Pure, clock-free building blocks: landmark presence validation,
//! occlusion detection, and positional scoring of a detected face
//! against the frame. The session layer (`holdstill-session`) drives
//! these per observation and owns all timing and state.

pub mod config;
pub mod landmarks;
pub mod occlusion;
pub mod position;
pub mod prompts;
pub mod types;

pub use config::{ConfigError, GuidanceConfig};
pub use landmarks::validate_landmarks;
pub use occlusion::is_covered;
pub use position::{score_position, PositionReport};
pub use types::{
    BoundingBox, FaceObservation, FrameSize, GuidanceFault, LandmarkSet, Point, PositionClass,
    ValidationResult,
};
