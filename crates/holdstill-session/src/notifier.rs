//! Notification debouncing.
//!
//! Suppresses redundant status/voice emissions and serializes overlapping
//! voice requests. Owns the last-emitted message history — the session's
//! single writer for those fields.

use crate::sink::{CaptureSink, StatusSink, VoicePriority, VoiceSink};

pub struct Notifier {
    status_sink: Box<dyn StatusSink>,
    voice_sink: Box<dyn VoiceSink>,
    capture_sink: Box<dyn CaptureSink>,
    last_status: Option<String>,
    last_voice: Option<String>,
    /// An utterance is in flight until the collaborator reports completion.
    speaking: bool,
    voice_enabled: bool,
}

impl Notifier {
    pub fn new(
        status_sink: Box<dyn StatusSink>,
        voice_sink: Box<dyn VoiceSink>,
        capture_sink: Box<dyn CaptureSink>,
    ) -> Self {
        Self {
            status_sink,
            voice_sink,
            capture_sink,
            last_status: None,
            last_voice: None,
            speaking: false,
            voice_enabled: true,
        }
    }

    /// Write to the status surface, unless the text is unchanged.
    pub fn status(&mut self, message: &str) {
        if self.last_status.as_deref() == Some(message) {
            tracing::trace!(message, "status suppressed: unchanged");
            return;
        }
        self.status_sink.status(message);
        self.last_status = Some(message.to_string());
    }

    /// Write to the error surface. Errors are not debounced; the surface is
    /// independent of the status channel.
    pub fn error(&mut self, message: &str) {
        self.status_sink.error(message);
    }

    /// Request a spoken prompt. Normal-priority requests are dropped while
    /// another utterance is in flight, when the text matches the previous
    /// utterance, or when voice is disabled. High-priority requests cancel
    /// the in-flight utterance and bypass the enabled toggle.
    pub fn voice(&mut self, message: &str, priority: VoicePriority) {
        match priority {
            VoicePriority::High => {
                if self.speaking {
                    self.voice_sink.cancel();
                }
            }
            VoicePriority::Normal => {
                if !self.voice_enabled {
                    tracing::trace!(message, "voice suppressed: disabled");
                    return;
                }
                if self.speaking {
                    tracing::trace!(message, "voice suppressed: utterance in flight");
                    return;
                }
                if self.last_voice.as_deref() == Some(message) {
                    tracing::trace!(message, "voice suppressed: unchanged");
                    return;
                }
            }
        }
        self.voice_sink.speak(message);
        self.speaking = true;
        self.last_voice = Some(message.to_string());
    }

    /// The collaborator finished (or failed) the current utterance.
    pub fn voice_finished(&mut self) {
        self.speaking = false;
    }

    pub fn set_voice_enabled(&mut self, enabled: bool) {
        self.voice_enabled = enabled;
    }

    /// Cancel any in-flight utterance.
    pub fn cancel_voice(&mut self) {
        if self.speaking {
            self.voice_sink.cancel();
            self.speaking = false;
        }
    }

    /// Fire the capture trigger.
    pub fn trigger_capture(&mut self) {
        self.capture_sink.trigger();
    }

    /// Drop debounce history and cancel any in-flight utterance; used when
    /// the session resets.
    pub fn clear(&mut self) {
        self.cancel_voice();
        self.last_status = None;
        self.last_voice = None;
    }
}
