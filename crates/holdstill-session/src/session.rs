//! Session actor and its clone-safe handle.
//!
//! One tokio task owns the [`GuidanceMachine`]; callers talk to it over a
//! bounded mpsc channel with oneshot replies. The progress tick is an
//! interval that exists only while the machine asks for one, so at most a
//! single tick source is ever alive. Because a lone task owns all state,
//! every mutation is a critical section by construction: a tick can never
//! observe a half-applied frame evaluation.

use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::Instrument;

use holdstill_core::{ConfigError, FaceObservation, FrameSize, GuidanceConfig};

use crate::machine::GuidanceMachine;
use crate::notifier::Notifier;
use crate::sink::{CaptureSink, StatusSink, VoiceSink};
use crate::SessionError;

const REQUEST_QUEUE_DEPTH: usize = 16;

enum SessionRequest {
    Start {
        reply: oneshot::Sender<()>,
    },
    Submit {
        frame: FrameSize,
        observations: Vec<FaceObservation>,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Progress {
        reply: oneshot::Sender<u8>,
    },
    IsCapturing {
        reply: oneshot::Sender<bool>,
    },
    CaptureCompleted {
        result: Result<(), String>,
    },
    VoiceFinished,
    SetVoiceEnabled {
        enabled: bool,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
}

/// Admits at most one observation batch per detection interval. Frames in
/// between are discarded, not queued — a sampling policy, not a backlog.
struct FrameGate {
    interval: Duration,
    last_admitted: Option<Instant>,
}

impl FrameGate {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_admitted: None,
        }
    }

    fn admit(&mut self, now: Instant) -> bool {
        match self.last_admitted {
            Some(prev) if now.duration_since(prev) < self.interval => false,
            _ => {
                self.last_admitted = Some(now);
                true
            }
        }
    }
}

/// Factory for spawned guidance sessions.
pub struct Session;

impl Session {
    /// Validate the config and spawn the session actor.
    ///
    /// The actor starts in Idle; call [`SessionHandle::start`] to begin
    /// evaluating observations. Sinks are owned by the actor for its
    /// whole life.
    pub fn spawn(
        config: GuidanceConfig,
        status_sink: Box<dyn StatusSink>,
        voice_sink: Box<dyn VoiceSink>,
        capture_sink: Box<dyn CaptureSink>,
    ) -> Result<SessionHandle, ConfigError> {
        config.validate()?;

        let session_id = uuid::Uuid::new_v4();
        let notifier = Notifier::new(status_sink, voice_sink, capture_sink);
        let machine = GuidanceMachine::new(config.clone(), notifier);
        let (tx, rx) = mpsc::channel(REQUEST_QUEUE_DEPTH);

        let span = tracing::info_span!("session", id = %session_id);
        tokio::spawn(run_session(rx, machine, config).instrument(span));
        tracing::info!(id = %session_id, "session spawned");

        Ok(SessionHandle { tx })
    }
}

/// Clone-safe handle to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionRequest>,
}

impl SessionHandle {
    /// Begin the session: the machine leaves Idle and starts searching.
    pub async fn start(&self) -> Result<(), SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SessionRequest::Start { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| SessionError::Closed)
    }

    /// Submit one frame's observations. Batches arriving faster than the
    /// detection interval are silently sampled away.
    pub async fn submit(
        &self,
        frame: FrameSize,
        observations: Vec<FaceObservation>,
    ) -> Result<(), SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SessionRequest::Submit {
            frame,
            observations,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| SessionError::Closed)?
    }

    /// Current progress, 0–100.
    pub async fn progress(&self) -> Result<u8, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SessionRequest::Progress { reply: reply_tx })
            .await?;
        reply_rx.await.map_err(|_| SessionError::Closed)
    }

    /// Whether a capture is currently in flight.
    pub async fn is_capturing(&self) -> Result<bool, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SessionRequest::IsCapturing { reply: reply_tx })
            .await?;
        reply_rx.await.map_err(|_| SessionError::Closed)
    }

    /// The capture collaborator finished; `Err` carries a failure reason.
    pub async fn capture_completed(&self, result: Result<(), String>) -> Result<(), SessionError> {
        self.send(SessionRequest::CaptureCompleted { result }).await
    }

    /// The speech collaborator finished (or failed) the current utterance.
    pub async fn voice_finished(&self) -> Result<(), SessionError> {
        self.send(SessionRequest::VoiceFinished).await
    }

    pub async fn set_voice_enabled(&self, enabled: bool) -> Result<(), SessionError> {
        self.send(SessionRequest::SetVoiceEnabled { enabled }).await
    }

    /// Close the session: one atomic step that stops the tick source,
    /// cancels any in-flight utterance, zeroes state, and exits the actor.
    pub async fn stop(&self) -> Result<(), SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SessionRequest::Stop { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| SessionError::Closed)
    }

    async fn send(&self, request: SessionRequest) -> Result<(), SessionError> {
        self.tx
            .send(request)
            .await
            .map_err(|_| SessionError::Closed)
    }
}

async fn run_session(
    mut rx: mpsc::Receiver<SessionRequest>,
    mut machine: GuidanceMachine,
    config: GuidanceConfig,
) {
    let mut gate = FrameGate::new(Duration::from_millis(config.detection_interval_ms));
    let tick_period = Duration::from_millis(config.progress_tick_ms);
    let mut tick: Option<tokio::time::Interval> = None;

    loop {
        tokio::select! {
            request = rx.recv() => {
                let Some(request) = request else {
                    // All handles dropped: silent teardown
                    machine.reset();
                    break;
                };
                if handle_request(&mut machine, &mut gate, request) {
                    break;
                }
            }
            _ = next_tick(&mut tick) => {
                machine.handle_tick();
            }
        }

        // Reconcile the tick source with the machine's demand. Dropping the
        // interval is what "stops the timer"; at most one exists at a time.
        if machine.wants_tick() {
            if tick.is_none() {
                let mut interval =
                    tokio::time::interval_at(tokio::time::Instant::now() + tick_period, tick_period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                tick = Some(interval);
            }
        } else {
            tick = None;
        }
    }
    tracing::debug!("session task exiting");
}

/// Apply one request to the machine. Returns true when the actor must exit.
fn handle_request(
    machine: &mut GuidanceMachine,
    gate: &mut FrameGate,
    request: SessionRequest,
) -> bool {
    match request {
        SessionRequest::Start { reply } => {
            machine.start();
            let _ = reply.send(());
        }
        SessionRequest::Submit {
            frame,
            observations,
            reply,
        } => {
            let result = if gate.admit(Instant::now()) {
                machine.handle_frame(frame, &observations)
            } else {
                tracing::trace!(count = observations.len(), "frame discarded by sampling gate");
                Ok(())
            };
            let _ = reply.send(result);
        }
        SessionRequest::Progress { reply } => {
            let _ = reply.send(machine.progress());
        }
        SessionRequest::IsCapturing { reply } => {
            let _ = reply.send(machine.is_capturing());
        }
        SessionRequest::CaptureCompleted { result } => {
            machine.capture_completed(result);
        }
        SessionRequest::VoiceFinished => {
            machine.voice_finished();
        }
        SessionRequest::SetVoiceEnabled { enabled } => {
            machine.set_voice_enabled(enabled);
        }
        SessionRequest::Stop { reply } => {
            machine.shutdown();
            let _ = reply.send(());
            return true;
        }
    }
    false
}

/// Await the next progress tick; pends forever while no source is running.
async fn next_tick(tick: &mut Option<tokio::time::Interval>) {
    match tick {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
