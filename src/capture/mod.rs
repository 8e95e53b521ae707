//! Input capture
//!
//! This module provides the capture clock, the event model, the capture gate and
//! the input sources that feed it.

pub mod clock;
pub mod input;
pub mod source;

#[cfg(feature = "os-hooks")]
pub mod hooks;

pub use clock::now_monotonic;
pub use input::{CaptureAdapter, CaptureGate, CaptureState, EventKind, InputClass, InputEvent};
pub use source::{InputSource, ManualHandle, ManualSource};

/// Sources for the live OS hooks, one per input class.
#[cfg(feature = "os-hooks")]
pub fn default_sources() -> Vec<Box<dyn InputSource>> {
    vec![
        Box::new(hooks::RdevSource::pointer()),
        Box::new(hooks::RdevSource::keyboard()),
    ]
}

#[cfg(not(feature = "os-hooks"))]
pub fn default_sources() -> Vec<Box<dyn InputSource>> {
    tracing::warn!("Built without the os-hooks feature; no OS input will be captured");
    Vec::new()
}
