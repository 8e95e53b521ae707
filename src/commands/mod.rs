//! Command handlers
//!
//! Entry points the binary dispatches to. Each handler owns its runtime-facing
//! setup (controller, sources, output files) and leaves the logic to the library.

pub mod processing;
pub mod recording;
