//! The guidance state machine.
//!
//! Consumes one frame's observations at a time, classifies them through the
//! core evaluators, and accumulates hold-still progress while the face stays
//! centered. Synchronous and clock-free: the session actor owns the timers
//! and calls [`GuidanceMachine::handle_tick`] on its schedule, so every
//! transition here is a deterministic unit-test target.

use holdstill_core::{
    is_covered, prompts, score_position, validate_landmarks, FaceObservation, FrameSize,
    GuidanceConfig, GuidanceFault,
};

use crate::notifier::Notifier;
use crate::sink::VoicePriority;
use crate::SessionError;

/// Lifecycle phase of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Pre-session; submitting observations is a contract violation.
    Idle,
    /// No usable face in the latest frame.
    Searching,
    /// A full face is visible but not yet centered.
    Validating,
    /// Centered; progress accumulates on every tick.
    Stabilizing,
    /// Progress hit 100; capture in flight, all inputs ignored.
    Capturing,
    /// Capture confirmed; terminal until the session is reset.
    Done,
}

const PROGRESS_COMPLETE: u8 = 100;

/// Emitted once when progress first crosses each mark.
const MILESTONES: [(u8, &str); 3] = [
    (30, prompts::MILESTONE_EARLY),
    (60, prompts::MILESTONE_HALFWAY),
    (85, prompts::MILESTONE_ALMOST),
];

pub struct GuidanceMachine {
    config: GuidanceConfig,
    notifier: Notifier,
    phase: SessionPhase,
    progress: u8,
    is_centered: bool,
    /// Index into [`MILESTONES`] of the next mark to announce.
    next_milestone: usize,
}

impl GuidanceMachine {
    pub fn new(config: GuidanceConfig, notifier: Notifier) -> Self {
        Self {
            config,
            notifier,
            phase: SessionPhase::Idle,
            progress: 0,
            is_centered: false,
            next_milestone: 0,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn is_capturing(&self) -> bool {
        self.phase == SessionPhase::Capturing
    }

    /// Whether the progress tick source should be running right now.
    pub fn wants_tick(&self) -> bool {
        self.phase == SessionPhase::Stabilizing && self.is_centered
    }

    /// Begin a session: Idle → Searching. Ignored with a warning elsewhere.
    pub fn start(&mut self) {
        if self.phase != SessionPhase::Idle {
            tracing::warn!(phase = ?self.phase, "start ignored: session already running");
            return;
        }
        self.phase = SessionPhase::Searching;
        tracing::debug!("session started, searching for a face");
    }

    /// Feed one frame's worth of observations through the classifiers.
    ///
    /// A no-op while capture is in flight or after completion; an error
    /// before [`start`](Self::start).
    pub fn handle_frame(
        &mut self,
        frame: FrameSize,
        observations: &[FaceObservation],
    ) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Idle => return Err(SessionError::NotStarted),
            SessionPhase::Capturing | SessionPhase::Done => {
                tracing::trace!(phase = ?self.phase, "observation ignored");
                return Ok(());
            }
            _ => {}
        }

        match observations {
            [] => self.reject_frame(GuidanceFault::NoFace),
            [observation] => self.evaluate(frame, observation),
            _ => self.reject_frame(GuidanceFault::ForeignObject),
        }
        Ok(())
    }

    /// Advance progress by one tick while centered.
    ///
    /// Called off the session's tick source; if the source outlives
    /// centering (it should not), this resets progress defensively.
    pub fn handle_tick(&mut self) {
        if !self.wants_tick() {
            if matches!(self.phase, SessionPhase::Searching | SessionPhase::Validating) {
                self.progress = 0;
                self.next_milestone = 0;
            }
            return;
        }

        self.progress = self
            .progress
            .saturating_add(self.config.progress_step_per_tick)
            .min(PROGRESS_COMPLETE);
        tracing::trace!(progress = self.progress, "tick");

        while let Some(&(mark, text)) = MILESTONES.get(self.next_milestone) {
            if self.progress < mark {
                break;
            }
            self.next_milestone += 1;
            self.notifier.status(text);
            self.notifier.voice(text, VoicePriority::Normal);
        }

        if self.progress == PROGRESS_COMPLETE {
            self.phase = SessionPhase::Capturing;
            tracing::info!("hold complete, triggering capture");
            self.notifier.status(prompts::CAPTURING);
            self.notifier.voice(prompts::CAPTURING, VoicePriority::High);
            self.notifier.trigger_capture();
        }
    }

    /// The capture collaborator reported back.
    pub fn capture_completed(&mut self, result: Result<(), String>) {
        if self.phase != SessionPhase::Capturing {
            tracing::warn!(phase = ?self.phase, "capture completion ignored: no capture in flight");
            return;
        }
        match result {
            Ok(()) => {
                self.phase = SessionPhase::Done;
                tracing::info!("capture confirmed");
                self.notifier.status(prompts::CAPTURE_SUCCESS);
                self.notifier
                    .voice(prompts::CAPTURE_SUCCESS, VoicePriority::High);
            }
            Err(reason) => {
                tracing::warn!(%reason, "capture failed, returning to search");
                self.lose_centering();
                self.phase = SessionPhase::Searching;
                self.notifier.error(prompts::CAPTURE_FAILED);
                self.notifier.status(prompts::CAPTURE_FAILED);
            }
        }
    }

    pub fn voice_finished(&mut self) {
        self.notifier.voice_finished();
    }

    pub fn set_voice_enabled(&mut self, enabled: bool) {
        self.notifier.set_voice_enabled(enabled);
    }

    /// Explicit close: interrupt any utterance, announce, zero all state.
    pub fn shutdown(&mut self) {
        tracing::info!("session closing");
        self.notifier.cancel_voice();
        self.notifier.status(prompts::SESSION_CLOSED);
        self.notifier
            .voice(prompts::SESSION_CLOSED, VoicePriority::High);
        self.phase = SessionPhase::Idle;
        self.lose_centering();
    }

    /// Silent teardown (all handles dropped): zero state, no prompts.
    pub fn reset(&mut self) {
        self.phase = SessionPhase::Idle;
        self.lose_centering();
        self.notifier.clear();
    }

    fn evaluate(&mut self, frame: FrameSize, observation: &FaceObservation) {
        // Anatomical validation first: a wholly missing group reads as an
        // incomplete face, a sparse-but-present one as occlusion.
        let validation = validate_landmarks(&observation.landmarks);
        if !validation.is_full_face {
            return self.reject_frame(GuidanceFault::IncompleteFace);
        }
        if is_covered(&observation.landmarks, &observation.bounding_box) {
            return self.reject_frame(GuidanceFault::Occluded);
        }

        let report = score_position(&observation.bounding_box, frame, &self.config, false, true);
        if report.is_centered {
            if !self.is_centered {
                self.is_centered = true;
                self.phase = SessionPhase::Stabilizing;
                tracing::debug!("face centered, stabilizing");
            }
        } else {
            if self.is_centered {
                tracing::debug!(fault = ?report.fault, "centering lost");
            }
            self.lose_centering();
            self.phase = SessionPhase::Validating;
        }

        // Always forwarded; the notifier decides whether anything is emitted.
        self.notifier.status(report.status);
        if let Some(text) = report.voice {
            self.notifier.voice(text, VoicePriority::Normal);
        }
    }

    fn reject_frame(&mut self, fault: GuidanceFault) {
        tracing::debug!(?fault, "observation rejected");
        self.lose_centering();
        self.phase = SessionPhase::Searching;
        match fault {
            GuidanceFault::NoFace => {
                self.notifier.status(prompts::SEARCHING);
                self.notifier.voice(prompts::SEARCHING, VoicePriority::Normal);
            }
            GuidanceFault::ForeignObject => {
                // Error surface only; this prompt is never voiced.
                self.notifier.error(prompts::FOREIGN_OBJECT);
            }
            GuidanceFault::Occluded => {
                self.notifier.status(prompts::FACE_COVERED);
                self.notifier
                    .voice(prompts::FACE_COVERED, VoicePriority::High);
            }
            GuidanceFault::IncompleteFace => {
                self.notifier.status(prompts::INCOMPLETE_FACE);
                self.notifier
                    .voice(prompts::INCOMPLETE_FACE, VoicePriority::Normal);
            }
            // Off-center and size faults flow through the positional report.
            GuidanceFault::OffCenter | GuidanceFault::SizeOutOfRange => {}
        }
    }

    fn lose_centering(&mut self) {
        self.is_centered = false;
        self.progress = 0;
        self.next_milestone = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::test_support::{Recorder, Transcript};
    use holdstill_core::{BoundingBox, LandmarkSet, Point};

    const FRAME: FrameSize = FrameSize {
        width: 640.0,
        height: 480.0,
    };

    fn machine_with(config: GuidanceConfig) -> (GuidanceMachine, Transcript) {
        let recorder = Recorder::default();
        let transcript = recorder.transcript();
        let notifier = Notifier::new(
            Box::new(recorder.clone()),
            Box::new(recorder.clone()),
            Box::new(recorder),
        );
        let mut machine = GuidanceMachine::new(config, notifier);
        machine.start();
        (machine, transcript)
    }

    fn machine() -> (GuidanceMachine, Transcript) {
        machine_with(GuidanceConfig::default())
    }

    fn full_landmarks() -> LandmarkSet {
        let indices: [u16; 28] = [
            263, 249, 390, 373, 374, 380, 381, 382, // left eye
            33, 7, 163, 144, 145, 153, 154, 155, // right eye
            1, 2, 98, 327, // nose
            61, 291, 0, 17, 39, 269, 181, 405, // mouth
        ];
        LandmarkSet::from_points(indices.iter().map(|&i| (i, Point::new(320.0, 240.0))))
    }

    fn observation(x1: f32, y1: f32, x2: f32, y2: f32) -> FaceObservation {
        FaceObservation {
            landmarks: full_landmarks(),
            bounding_box: BoundingBox::new(Point::new(x1, y1), Point::new(x2, y2)),
        }
    }

    /// Centered 200 px face in a 640x480 frame.
    fn centered() -> FaceObservation {
        observation(220.0, 140.0, 420.0, 340.0)
    }

    /// Small face in the top-left corner.
    fn corner() -> FaceObservation {
        observation(20.0, 20.0, 120.0, 120.0)
    }

    #[test]
    fn test_submit_before_start_rejected() {
        let recorder = Recorder::default();
        let notifier = Notifier::new(
            Box::new(recorder.clone()),
            Box::new(recorder.clone()),
            Box::new(recorder),
        );
        let mut machine = GuidanceMachine::new(GuidanceConfig::default(), notifier);
        let result = machine.handle_frame(FRAME, &[centered()]);
        assert_eq!(result, Err(SessionError::NotStarted));
    }

    #[test]
    fn test_centered_face_enters_stabilizing() {
        let (mut m, t) = machine();
        m.handle_frame(FRAME, &[centered()]).unwrap();
        assert_eq!(m.phase(), SessionPhase::Stabilizing);
        assert!(m.wants_tick());
        assert_eq!(t.statuses(), vec![prompts::HOLD_STILL]);
    }

    #[test]
    fn test_repeat_centered_observation_is_idempotent() {
        let (mut m, _t) = machine();
        m.handle_frame(FRAME, &[centered()]).unwrap();
        for _ in 0..5 {
            m.handle_tick();
        }
        let before = m.progress();

        m.handle_frame(FRAME, &[centered()]).unwrap();
        assert_eq!(m.progress(), before);
        assert_eq!(m.phase(), SessionPhase::Stabilizing);
        assert!(m.wants_tick());
    }

    #[test]
    fn test_progress_reaches_capture_exactly_once() {
        let (mut m, t) = machine();
        m.handle_frame(FRAME, &[centered()]).unwrap();
        for _ in 0..150 {
            m.handle_tick();
        }
        assert_eq!(m.progress(), 100);
        assert_eq!(m.phase(), SessionPhase::Capturing);
        assert!(!m.wants_tick());
        assert_eq!(t.captures(), 1);
    }

    #[test]
    fn test_progress_strictly_increases_per_tick() {
        let (mut m, _t) = machine();
        m.handle_frame(FRAME, &[centered()]).unwrap();
        for expected in 1..=10u8 {
            m.handle_tick();
            assert_eq!(m.progress(), expected);
        }
    }

    #[test]
    fn test_milestones_announced_once_each() {
        let config = GuidanceConfig {
            progress_step_per_tick: 30,
            ..Default::default()
        };
        let (mut m, t) = machine_with(config);
        m.handle_frame(FRAME, &[centered()]).unwrap();
        m.voice_finished();
        for _ in 0..4 {
            m.handle_tick();
            m.voice_finished();
        }

        assert_eq!(m.progress(), 100);
        for milestone in [
            prompts::MILESTONE_EARLY,
            prompts::MILESTONE_HALFWAY,
            prompts::MILESTONE_ALMOST,
        ] {
            let count = t.statuses().iter().filter(|s| s == &milestone).count();
            assert_eq!(count, 1, "milestone {milestone:?} announced {count} times");
        }
    }

    #[test]
    fn test_loss_of_center_resets_progress() {
        let (mut m, _t) = machine();
        m.handle_frame(FRAME, &[centered()]).unwrap();
        for _ in 0..10 {
            m.handle_tick();
        }
        assert_eq!(m.progress(), 10);

        m.handle_frame(FRAME, &[corner()]).unwrap();
        assert_eq!(m.progress(), 0);
        assert_eq!(m.phase(), SessionPhase::Validating);
        assert!(!m.wants_tick());
    }

    #[test]
    fn test_occluded_face_interrupts_with_high_priority() {
        let (mut m, t) = machine();
        m.handle_frame(FRAME, &[centered()]).unwrap();
        for _ in 0..10 {
            m.handle_tick();
        }

        // Sparse eye group: present but below the occlusion floor
        let mut covered = centered();
        let mut points: Vec<(u16, Point)> = [
            33u16, 7, 163, 144, 145, 153, 154, 155, // right eye, full
            1, 2, 98, 327, // nose
            61, 291, 0, 17, 39, 269, 181, 405, // mouth
        ]
        .iter()
        .map(|&i| (i, Point::new(320.0, 240.0)))
        .collect();
        points.push((263, Point::new(320.0, 240.0)));
        points.push((249, Point::new(320.0, 240.0)));
        covered.landmarks = LandmarkSet::from_points(points);

        m.handle_frame(FRAME, &[covered]).unwrap();
        assert_eq!(m.progress(), 0);
        assert_eq!(m.phase(), SessionPhase::Searching);
        assert!(t.spoken().contains(&prompts::FACE_COVERED.to_string()));
        assert_eq!(t.cancels(), 1);
    }

    #[test]
    fn test_missing_group_reads_as_incomplete_face() {
        let (mut m, t) = machine();
        // Left eye wholly absent, everything else full
        let indices: [u16; 20] = [
            33, 7, 163, 144, 145, 153, 154, 155, // right eye
            1, 2, 98, 327, // nose
            61, 291, 0, 17, 39, 269, 181, 405, // mouth
        ];
        let mut obs = centered();
        obs.landmarks =
            LandmarkSet::from_points(indices.iter().map(|&i| (i, Point::new(320.0, 240.0))));

        m.handle_frame(FRAME, &[obs]).unwrap();
        assert_eq!(m.phase(), SessionPhase::Searching);
        assert_eq!(t.statuses(), vec![prompts::INCOMPLETE_FACE]);
    }

    #[test]
    fn test_foreign_object_uses_error_channel_only() {
        let (mut m, t) = machine();
        m.handle_frame(FRAME, &[centered()]).unwrap();
        for _ in 0..10 {
            m.handle_tick();
        }

        m.handle_frame(FRAME, &[centered(), corner()]).unwrap();
        assert_eq!(m.progress(), 0);
        assert_eq!(t.errors(), vec![prompts::FOREIGN_OBJECT]);
        assert!(!t.spoken().contains(&prompts::FOREIGN_OBJECT.to_string()));

        // Immediate repeat: error surface again, voice still silent
        m.handle_frame(FRAME, &[centered(), corner()]).unwrap();
        assert_eq!(t.errors().len(), 2);
        assert!(!t.spoken().contains(&prompts::FOREIGN_OBJECT.to_string()));
    }

    #[test]
    fn test_empty_frame_prompts_search() {
        let (mut m, t) = machine();
        m.handle_frame(FRAME, &[]).unwrap();
        assert_eq!(m.phase(), SessionPhase::Searching);
        assert_eq!(t.statuses(), vec![prompts::SEARCHING]);
    }

    #[test]
    fn test_observations_ignored_while_capturing() {
        let config = GuidanceConfig {
            progress_step_per_tick: 100,
            ..Default::default()
        };
        let (mut m, t) = machine_with(config);
        m.handle_frame(FRAME, &[centered()]).unwrap();
        m.handle_tick();
        assert!(m.is_capturing());
        assert_eq!(t.captures(), 1);

        m.handle_frame(FRAME, &[corner()]).unwrap();
        assert_eq!(m.progress(), 100);
        assert!(m.is_capturing());
        assert_eq!(t.captures(), 1);
    }

    #[test]
    fn test_capture_success_is_terminal() {
        let config = GuidanceConfig {
            progress_step_per_tick: 100,
            ..Default::default()
        };
        let (mut m, t) = machine_with(config);
        m.handle_frame(FRAME, &[centered()]).unwrap();
        m.handle_tick();
        m.capture_completed(Ok(()));

        assert_eq!(m.phase(), SessionPhase::Done);
        assert!(t.statuses().contains(&prompts::CAPTURE_SUCCESS.to_string()));

        m.handle_frame(FRAME, &[centered()]).unwrap();
        assert_eq!(m.phase(), SessionPhase::Done);
    }

    #[test]
    fn test_capture_failure_returns_to_search() {
        let config = GuidanceConfig {
            progress_step_per_tick: 100,
            ..Default::default()
        };
        let (mut m, t) = machine_with(config);
        m.handle_frame(FRAME, &[centered()]).unwrap();
        m.handle_tick();
        m.capture_completed(Err("sink unavailable".into()));

        assert_eq!(m.phase(), SessionPhase::Searching);
        assert_eq!(m.progress(), 0);
        assert!(!m.is_capturing());
        assert!(t.errors().contains(&prompts::CAPTURE_FAILED.to_string()));

        // The session is recoverable: centering works again
        m.handle_frame(FRAME, &[centered()]).unwrap();
        assert_eq!(m.phase(), SessionPhase::Stabilizing);
    }

    #[test]
    fn test_encouragement_spoken_once_while_held() {
        let (mut m, t) = machine();
        m.handle_frame(FRAME, &[centered()]).unwrap();
        m.voice_finished();
        m.handle_frame(FRAME, &[centered()]).unwrap();
        m.voice_finished();
        m.handle_frame(FRAME, &[centered()]).unwrap();

        let count = t
            .spoken()
            .iter()
            .filter(|s| s == &prompts::HOLD_STILL)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_shutdown_zeroes_state_and_announces() {
        let (mut m, t) = machine();
        m.handle_frame(FRAME, &[centered()]).unwrap();
        for _ in 0..10 {
            m.handle_tick();
        }

        m.shutdown();
        assert_eq!(m.phase(), SessionPhase::Idle);
        assert_eq!(m.progress(), 0);
        assert!(!m.wants_tick());
        assert!(t.spoken().contains(&prompts::SESSION_CLOSED.to_string()));
        assert_eq!(t.cancels(), 1);
    }

    #[test]
    fn test_defensive_tick_outside_stabilizing() {
        let (mut m, _t) = machine();
        m.handle_frame(FRAME, &[corner()]).unwrap();
        m.handle_tick();
        assert_eq!(m.progress(), 0);
        assert_eq!(m.phase(), SessionPhase::Validating);
    }
}
