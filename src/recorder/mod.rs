//! Recording session lifecycle
//!
//! The controller drives a [`VideoRecorder`] and the capture sources together,
//! owning one [`RecordingSession`] at a time. Each session writes its own event
//! log and timing sidecar.

pub mod anchors;
pub mod channel;
pub mod controller;
pub mod local;
pub mod session;
pub mod state;
pub mod writer;

pub use anchors::{AnchorManager, SessionAnchors, StateTimingSink, METADATA_FILENAME};
pub use channel::{RecorderError, RecorderResult, RecorderState, VideoRecorder};
pub use controller::SessionController;
pub use local::LocalClockRecorder;
pub use session::{latest_recording, RecordingSession, SessionSummary};
pub use state::{Intent, RecordingState};
pub use writer::{EventLogWriter, EVENTS_FILENAME};
