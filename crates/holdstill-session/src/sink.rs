//! Collaborator seams. The engine decides what to say and when; the sinks
//! own rendering, audio, and image capture.

/// Status text surface plus an independent error channel.
pub trait StatusSink: Send {
    fn status(&mut self, message: &str);
    fn error(&mut self, message: &str);
}

/// Speech synthesis collaborator. `speak` starts an utterance; the
/// collaborator reports completion back through
/// [`SessionHandle::voice_finished`](crate::SessionHandle::voice_finished).
pub trait VoiceSink: Send {
    fn speak(&mut self, text: &str);
    /// Cancel the in-flight utterance, if any.
    fn cancel(&mut self);
}

/// Receives the capture trigger once a stable, centered face has been held
/// for the full progress run. Fired at most once per run.
pub trait CaptureSink: Send {
    fn trigger(&mut self);
}

/// Delivery class for spoken prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoicePriority {
    /// Debounced: suppressed while another utterance is in flight, when the
    /// text repeats, or when voice is disabled.
    Normal,
    /// Terminal prompts (capture complete, occlusion, session closed):
    /// cancel the in-flight utterance and speak regardless of the toggle.
    High,
}
