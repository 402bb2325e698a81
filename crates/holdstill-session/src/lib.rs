//! holdstill-session — Guided-capture session orchestration.
//!
//! Wraps the pure classifiers from `holdstill-core` in a state machine that
//! coaches the user into position and fires an automatic capture once a
//! valid, centered face has been held long enough. One tokio actor task
//! owns all mutable state; collaborators plug in through the sink traits.

pub mod machine;
pub mod notifier;
pub mod session;
pub mod sink;

pub use machine::{GuidanceMachine, SessionPhase};
pub use notifier::Notifier;
pub use session::{Session, SessionHandle};
pub use sink::{CaptureSink, StatusSink, VoicePriority, VoiceSink};

use thiserror::Error;

/// Contract and lifecycle errors surfaced to the embedding caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// An operation arrived before `start()` — a programming-contract
    /// violation, reported rather than silently ignored.
    #[error("session has not been started")]
    NotStarted,
    /// The session task is gone (stopped or crashed); the handle is stale.
    #[error("session is closed")]
    Closed,
}
