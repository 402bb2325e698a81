//! User-facing guidance text.
//!
//! Every prompt the engine can emit lives here so the status surface, the
//! voice channel, and the tests all agree on exact wording.

pub const SEARCHING: &str = "Position your face inside the frame";
pub const FOREIGN_OBJECT: &str = "Multiple faces detected. Make sure only you are in view";
pub const FACE_COVERED: &str = "Face covered. Remove anything blocking your face";
pub const INCOMPLETE_FACE: &str = "Show your whole face. Eyes, nose and mouth must be visible";

pub const HOLD_STILL: &str = "Perfect. Hold still";
pub const MOVE_CLOSER: &str = "Move a little closer";
pub const MOVE_BACK: &str = "Move back slightly";
pub const MOVE_TO_CENTER: &str = "Move your face toward the center";
pub const INTO_FRAME: &str = "Bring your face fully into the frame";

pub const MILESTONE_EARLY: &str = "Good, keep holding";
pub const MILESTONE_HALFWAY: &str = "More than halfway there";
pub const MILESTONE_ALMOST: &str = "Almost done, don't move";

pub const CAPTURING: &str = "Capturing now";
pub const CAPTURE_SUCCESS: &str = "Capture complete";
pub const CAPTURE_FAILED: &str = "Capture failed, let's try again";
pub const SESSION_CLOSED: &str = "Session closed";
