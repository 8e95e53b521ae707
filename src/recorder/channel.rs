//! Video recorder collaborator
//!
//! Defines the interface to the external screen recorder. Commands are requests;
//! the recorder confirms each state change asynchronously through the
//! [`StateTimingSink`] it receives on start, possibly after the command returned.

use crate::recorder::anchors::StateTimingSink;
use async_trait::async_trait;
use thiserror::Error;

/// Errors reported by a recorder
#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("Recorder refused: {0}")]
    Refused(String),

    #[error("Recorder unavailable: {0}")]
    Unavailable(String),

    #[error("Already recording")]
    AlreadyRecording,

    #[error("Not recording")]
    NotRecording,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for recorder operations
pub type RecorderResult<T> = Result<T, RecorderError>;

/// Recorder state transitions that produce an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecorderState {
    Started,
    Paused,
    Resumed,
    Stopped,
}

impl RecorderState {
    /// Key used in the metadata sidecar's `recorder_state_events` map.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecorderState::Started => "started",
            RecorderState::Paused => "paused",
            RecorderState::Resumed => "resumed",
            RecorderState::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for RecorderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for the external video recorder
///
/// Managed by the [`SessionController`](crate::recorder::SessionController).
#[async_trait]
pub trait VideoRecorder: Send + Sync {
    /// Recorder identifier used in logs (e.g. "local-clock", "obs")
    fn id(&self) -> &str;

    /// Request a new recording. Confirmations for this recording go to `timings`.
    async fn start(&mut self, timings: StateTimingSink) -> RecorderResult<()>;

    async fn pause(&mut self) -> RecorderResult<()>;

    async fn resume(&mut self) -> RecorderResult<()>;

    async fn stop(&mut self) -> RecorderResult<()>;

    /// Whether a recording request is outstanding
    fn is_recording(&self) -> bool;
}
