//! Input event capture
//!
//! The event model, and the gate that turns OS callbacks into queued, timestamped
//! events while honoring the session's pause state.

pub mod channel;
pub mod types;

pub use channel::{CaptureAdapter, CaptureGate, CaptureState, GateStats};
pub use types::{EventKind, InputClass, InputEvent};
