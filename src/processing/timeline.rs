//! Event log loading and timeline alignment
//!
//! Raw capture timestamps are rebased onto the video timeline using the
//! recorder's first `started` anchor. Without one, the first event becomes
//! time zero and the run is flagged as degraded.

use crate::capture::input::{EventKind, InputEvent};
use crate::error::PlaybackInputError;
use crate::recorder::anchors::{SessionAnchors, METADATA_FILENAME};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An event positioned on the video timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// Seconds since the baseline; negative when captured before it.
    pub relative_time_sec: f64,
    #[serde(flatten)]
    pub event: InputEvent,
}

impl TimelineEvent {
    pub fn kind(&self) -> &EventKind {
        &self.event.kind
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// Baseline is the recorder's first `started` anchor.
    StartedAnchor,
    /// No usable anchor; baseline is the first event's timestamp.
    FirstEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub timestamp: f64,
    pub alignment: Alignment,
}

impl Baseline {
    pub fn is_degraded(&self) -> bool {
        self.alignment == Alignment::FirstEvent
    }
}

/// Parsed event log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pub events: Vec<InputEvent>,
    /// Lines that could not be parsed, e.g. a partial final line after a crash.
    pub skipped_lines: usize,
}

/// Read a JSON-lines event log, skipping lines that do not parse.
pub fn read_event_log(path: &Path) -> Result<EventLog, PlaybackInputError> {
    let data = std::fs::read(path).map_err(|source| PlaybackInputError::LogMissing {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&data);

    let mut log = EventLog::default();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<InputEvent>(line) {
            Ok(event) => log.events.push(event),
            Err(err) => {
                log.skipped_lines += 1;
                tracing::warn!(line = line_no + 1, "Skipping unreadable event line: {}", err);
            }
        }
    }

    if log.events.is_empty() {
        return Err(PlaybackInputError::EmptyLog(path.to_path_buf()));
    }
    tracing::info!(
        path = %path.display(),
        events = log.events.len(),
        skipped = log.skipped_lines,
        "Loaded event log"
    );
    Ok(log)
}

/// Load the session sidecar next to the log, if there is a readable one.
pub fn read_anchors(recording_dir: &Path) -> Option<SessionAnchors> {
    let path = recording_dir.join(METADATA_FILENAME);
    match SessionAnchors::load(&path) {
        Ok(anchors) => Some(anchors),
        Err(err) => {
            tracing::warn!(path = %path.display(), "Session metadata unavailable: {}", err);
            None
        }
    }
}

/// Pick the time-zero reference. `events` must not be empty.
pub fn select_baseline(anchors: Option<&SessionAnchors>, events: &[InputEvent]) -> Option<Baseline> {
    if let Some(timestamp) = anchors.and_then(SessionAnchors::started_anchor) {
        return Some(Baseline {
            timestamp,
            alignment: Alignment::StartedAnchor,
        });
    }

    let first = events.first()?;
    tracing::warn!(
        baseline = first.timestamp,
        "AlignmentDegraded: no started anchor, aligning to the first event"
    );
    Some(Baseline {
        timestamp: first.timestamp,
        alignment: Alignment::FirstEvent,
    })
}

/// Rebase every event against `baseline`, ordered by relative time. Events
/// with equal times keep their log order.
pub fn align(events: Vec<InputEvent>, baseline: &Baseline) -> Vec<TimelineEvent> {
    let mut aligned: Vec<TimelineEvent> = events
        .into_iter()
        .map(|event| TimelineEvent {
            relative_time_sec: event.timestamp - baseline.timestamp,
            event,
        })
        .collect();
    aligned.sort_by(|a, b| a.relative_time_sec.total_cmp(&b.relative_time_sec));
    aligned
}

/// Scrolls that moved nothing carry no information for annotation.
pub fn is_zero_scroll(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Scroll { dx, dy, .. } if *dx == 0.0 && *dy == 0.0)
}
