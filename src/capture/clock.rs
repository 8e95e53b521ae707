//! Process-wide monotonic capture clock
//!
//! Every capture timestamp is seconds since a fixed origin taken the first time the
//! clock is read. In-process recorders stamp their anchors with the same clock, so
//! their anchors share its origin.

use std::sync::OnceLock;
use std::time::Instant;

static ORIGIN: OnceLock<Instant> = OnceLock::new();

/// Seconds elapsed on the capture clock.
pub fn now_monotonic() -> f64 {
    ORIGIN.get_or_init(Instant::now).elapsed().as_secs_f64()
}

/// Human-readable description stored in session metadata.
pub const CLOCK_DESCRIPTION: &str = "monotonic seconds since process capture origin";
