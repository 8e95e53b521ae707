//! Error taxonomy for capture, session control and playback.

use crate::capture::input::InputClass;
use crate::recorder::channel::RecorderError;
use crate::recorder::session::SessionSummary;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// OS hook failure for one input class. Capture for that class is disabled and
/// the session continues degraded.
#[derive(Error, Debug, Clone)]
pub enum CaptureError {
    #[error("Failed to install {class} hook: {reason}")]
    HookFailed { class: InputClass, reason: String },

    #[error("{class} capture is not supported on this platform")]
    Unsupported { class: InputClass },
}

impl CaptureError {
    pub fn class(&self) -> InputClass {
        match self {
            CaptureError::HookFailed { class, .. } | CaptureError::Unsupported { class } => *class,
        }
    }
}

/// The session was never created; the controller stays idle.
#[derive(Error, Debug)]
pub enum SessionStartError {
    #[error("A recording session is already active")]
    AlreadyActive,

    #[error("Failed to create recording directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to open event log {path}: {source}")]
    EventLog {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to start event log writer: {0}")]
    Writer(#[source] io::Error),

    #[error("Recorder refused to start: {0}")]
    RecorderRefused(#[source] RecorderError),
}

/// One cleanup step that failed during a best-effort stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopFailure {
    pub step: &'static str,
    pub reason: String,
}

impl std::fmt::Display for StopFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.step, self.reason)
    }
}

/// Stop finished every step it could; the partial session is on disk.
#[derive(Error, Debug)]
#[error("Session stopped with {} failed step(s): {}", .failures.len(), join_failures(.failures))]
pub struct SessionStopError {
    pub summary: SessionSummary,
    pub failures: Vec<StopFailure>,
}

fn join_failures(failures: &[StopFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Pause/resume could not be applied.
#[derive(Error, Debug)]
pub enum ControlError {
    #[error("Recorder rejected {command}: {source}")]
    Recorder {
        command: &'static str,
        #[source]
        source: RecorderError,
    },
}

/// Fatal for a single playback run; the source log and video are untouched.
#[derive(Error, Debug)]
pub enum PlaybackInputError {
    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(f64),

    #[error("Invalid video dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Event log not found at {path}: {source}")]
    LogMissing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No events found in {0}")]
    EmptyLog(PathBuf),

    #[error("No events to align")]
    NoEvents,

    #[error("Failed to write playback output {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize config for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failure while applying an [`Intent`](crate::recorder::Intent).
#[derive(Error, Debug)]
pub enum IntentError {
    #[error(transparent)]
    Start(#[from] SessionStartError),

    #[error(transparent)]
    Stop(#[from] SessionStopError),

    #[error(transparent)]
    Control(#[from] ControlError),
}
