//! Timeline Capture
//!
//! Records pointer and keyboard input alongside an external screen recorder and
//! aligns the captured events to the recorded video's frames afterwards.

pub mod capture;
pub mod commands;
pub mod config;
pub mod error;
pub mod processing;
pub mod recorder;

pub use capture::{CaptureGate, EventKind, InputClass, InputEvent, InputSource, ManualSource};
pub use config::CaptureConfig;
pub use processing::{FrameAnnotationMap, PlaybackRun, SyncEngine, VideoProperties};
pub use recorder::{Intent, LocalClockRecorder, RecordingState, SessionController, SessionSummary, VideoRecorder};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "timeline_capture=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
