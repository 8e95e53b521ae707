//! Session timing anchors
//!
//! Collects platform metadata and the recorder's state-change timestamps for one
//! session and persists them as the `metadata.json` sidecar. Timestamps are kept
//! in the recorder's clock domain; reconciling them with capture time is the
//! playback engine's job.

use crate::capture::clock::CLOCK_DESCRIPTION;
use crate::recorder::channel::RecorderState;
use chrono::{DateTime, Local};
use parking_lot::Mutex as ParkingMutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

pub const METADATA_FILENAME: &str = "metadata.json";

/// Metadata + timing bundle persisted once per session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionAnchors {
    pub session_id: String,
    pub platform: String,
    pub natural_scrolling: bool,
    pub recording_path: PathBuf,
    pub capture_clock: String,
    pub started_at: Option<DateTime<Local>>,
    pub ended_at: Option<DateTime<Local>>,
    /// State name -> timestamps in the recorder's clock, in arrival order.
    pub recorder_state_events: BTreeMap<String, Vec<f64>>,
    pub disabled_inputs: Vec<String>,
    pub warnings: Vec<String>,
    pub degraded: bool,
}

impl SessionAnchors {
    /// First `started` anchor, the playback baseline.
    pub fn started_anchor(&self) -> Option<f64> {
        self.state_timings(RecorderState::Started).first().copied()
    }

    pub fn state_timings(&self, state: RecorderState) -> &[f64] {
        self.recorder_state_events
            .get(state.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn load(path: &Path) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        serde_json::from_slice(&data).map_err(std::io::Error::from)
    }
}

struct Shared {
    anchors: ParkingMutex<SessionAnchors>,
    notify: Notify,
}

/// Handle a recorder uses to publish state confirmations.
#[derive(Clone)]
pub struct StateTimingSink {
    shared: Arc<Shared>,
}

impl StateTimingSink {
    pub fn record(&self, state: RecorderState, timestamp: f64) {
        self.record_named(state.as_str(), timestamp);
    }

    /// Record a state by name, for recorders that report states beyond the four
    /// the controller drives.
    pub fn record_named(&self, state: &str, timestamp: f64) {
        tracing::debug!(state, timestamp, "Recorder state timing");
        self.shared
            .anchors
            .lock()
            .recorder_state_events
            .entry(state.to_string())
            .or_default()
            .push(timestamp);
        self.shared.notify.notify_waiters();
    }
}

pub struct AnchorManager {
    path: PathBuf,
    shared: Arc<Shared>,
}

impl AnchorManager {
    pub fn new(session_id: &str, recording_dir: &Path, natural_scrolling: bool) -> Self {
        let anchors = SessionAnchors {
            session_id: session_id.to_string(),
            natural_scrolling,
            recording_path: recording_dir.to_path_buf(),
            ..SessionAnchors::default()
        };
        Self {
            path: recording_dir.join(METADATA_FILENAME),
            shared: Arc::new(Shared {
                anchors: ParkingMutex::new(anchors),
                notify: Notify::new(),
            }),
        }
    }

    /// Capture session-start metadata before recording begins.
    pub fn collect(&self) {
        let mut anchors = self.shared.anchors.lock();
        anchors.platform = format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH);
        anchors.capture_clock = CLOCK_DESCRIPTION.to_string();
        anchors.started_at = Some(Local::now());
    }

    pub fn end_collect(&self) {
        self.shared.anchors.lock().ended_at = Some(Local::now());
    }

    pub fn record_state_timing(&self, state: RecorderState, timestamp: f64) {
        self.sink().record(state, timestamp);
    }

    pub fn sink(&self) -> StateTimingSink {
        StateTimingSink {
            shared: self.shared.clone(),
        }
    }

    pub fn has_state(&self, state: RecorderState) -> bool {
        !self.shared.anchors.lock().state_timings(state).is_empty()
    }

    /// Wait until the recorder has confirmed `state`, or `timeout` elapses.
    pub async fn wait_for_state(&self, state: RecorderState, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.shared.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.has_state(state) {
                return true;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.has_state(state);
            }
        }
    }

    pub fn add_warning(&self, warning: impl Into<String>) {
        let mut anchors = self.shared.anchors.lock();
        anchors.warnings.push(warning.into());
        anchors.degraded = true;
    }

    pub fn mark_input_disabled(&self, description: impl Into<String>) {
        let mut anchors = self.shared.anchors.lock();
        anchors.disabled_inputs.push(description.into());
        anchors.degraded = true;
    }

    pub fn snapshot(&self) -> SessionAnchors {
        self.shared.anchors.lock().clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the sidecar.
    pub fn save(&self) -> std::io::Result<()> {
        let snapshot = self.snapshot();
        let data = serde_json::to_vec_pretty(&snapshot).map_err(std::io::Error::from)?;
        std::fs::write(&self.path, data)?;
        tracing::info!(path = %self.path.display(), "Session metadata saved");
        Ok(())
    }
}
