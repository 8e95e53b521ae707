//! Per-frame overlay descriptions
//!
//! Turns a retained frame into the text and cursor markers a renderer draws on
//! top of it. Rendering itself happens elsewhere.

use crate::capture::input::EventKind;
use crate::processing::frames::RetainedFrame;
use crate::processing::timeline::TimelineEvent;
use serde::{Deserialize, Serialize};

pub const OVERLAYS_FILENAME: &str = "overlays.jsonl";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerStyle {
    Move,
    Click,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorMarker {
    pub x: f64,
    pub y: f64,
    pub style: MarkerStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameOverlay {
    pub native_index: u64,
    pub output_index: u64,
    pub header: String,
    pub lines: Vec<String>,
    pub markers: Vec<CursorMarker>,
}

impl FrameOverlay {
    pub fn compose(frame: &RetainedFrame) -> Self {
        Self {
            native_index: frame.native_index,
            output_index: frame.output_index,
            header: format!("Frame: {} | Time: {:.2}s", frame.native_index, frame.time_sec),
            lines: frame.events.iter().map(describe).collect(),
            markers: frame.active.iter().filter_map(marker).collect(),
        }
    }
}

/// One line of overlay text for an event.
pub fn describe(event: &TimelineEvent) -> String {
    match event.kind() {
        EventKind::Move { x, y } => format!("Move: ({}, {})", x, y),
        EventKind::Click { x, y, button, pressed } => {
            let edge = if *pressed { "" } else { " released" };
            format!("Click: {}{} at ({}, {})", button, edge, x, y)
        }
        EventKind::ClickComplete {
            x, y, button, duration, ..
        } => format!("Click COMPLETE: {} at ({}, {}) [Duration: {:.3}s]", button, x, y, duration),
        EventKind::Scroll { x, y, dx, dy } => format!("Scroll: dx={}, dy={} at ({}, {})", dx, dy, x, y),
        EventKind::Press { name } => format!("Key: {} pressed", name),
        EventKind::Release { name } => format!("Key: {} released", name),
        EventKind::PressComplete { name, duration, .. } => {
            format!("Key COMPLETE: {} [Duration: {:.3}s]", name, duration)
        }
        EventKind::Pause => "Recording paused".to_string(),
        EventKind::Resume => "Recording resumed".to_string(),
    }
}

fn marker(event: &TimelineEvent) -> Option<CursorMarker> {
    let style = match event.kind() {
        EventKind::Move { .. } => MarkerStyle::Move,
        EventKind::Click { .. } | EventKind::ClickComplete { .. } => MarkerStyle::Click,
        _ => return None,
    };
    let (x, y) = event.kind().position()?;
    Some(CursorMarker { x, y, style })
}
