//! Recording session
//!
//! Owns everything one capture run needs: its directory, the capture gate and
//! queue, the writer thread and the anchor manager. A session is consumed when it
//! is finished or discarded, so it can never be restarted.

use crate::capture::input::{CaptureGate, GateStats};
use crate::config::CaptureConfig;
use crate::error::{SessionStartError, StopFailure};
use crate::recorder::anchors::AnchorManager;
use crate::recorder::writer::{spawn_writer, DrainReport, EventLogWriter, EVENTS_FILENAME};
use chrono::Local;
use crossbeam_channel::bounded;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use uuid::Uuid;

/// What a finished session left on disk.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub dir: PathBuf,
    pub events_written: u64,
    pub write_failures: u64,
    pub discarded_while_paused: u64,
    pub disabled_inputs: Vec<String>,
    pub warnings: Vec<String>,
    pub degraded: bool,
}

pub struct RecordingSession {
    id: Uuid,
    dir: PathBuf,
    gate: Arc<CaptureGate>,
    writer: Option<JoinHandle<DrainReport>>,
    anchors: AnchorManager,
}

impl RecordingSession {
    /// Allocate a fresh directory and empty log, and start the writer.
    pub fn create(config: &CaptureConfig) -> Result<Self, SessionStartError> {
        let id = Uuid::new_v4();
        let dir = allocate_session_dir(&config.recordings_dir, &id)?;
        let log_path = dir.join(EVENTS_FILENAME);

        let writer = match EventLogWriter::create(&log_path) {
            Ok(writer) => writer,
            Err(source) => {
                remove_dir(&dir);
                return Err(SessionStartError::EventLog {
                    path: log_path,
                    source,
                });
            }
        };

        let (tx, rx) = bounded(config.queue_capacity);
        let gate = CaptureGate::open(tx);
        let writer = match spawn_writer(writer, rx) {
            Ok(handle) => handle,
            Err(source) => {
                gate.close();
                remove_dir(&dir);
                return Err(SessionStartError::Writer(source));
            }
        };

        let anchors = AnchorManager::new(&id.to_string(), &dir, config.natural_scrolling);
        tracing::info!(session = %id, dir = %dir.display(), "Recording session created");

        Ok(Self {
            id,
            dir,
            gate,
            writer: Some(writer),
            anchors,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn gate(&self) -> &Arc<CaptureGate> {
        &self.gate
    }

    pub fn anchors(&self) -> &AnchorManager {
        &self.anchors
    }

    pub fn capture_stats(&self) -> GateStats {
        self.gate.stats()
    }

    /// Close the queue and wait for the writer to drain it.
    fn close_log(&mut self) -> Result<DrainReport, StopFailure> {
        self.gate.close();
        let Some(handle) = self.writer.take() else {
            return Ok(DrainReport::default());
        };
        let report = handle.join().map_err(|_| StopFailure {
            step: "writer_drain",
            reason: "event log writer panicked".to_string(),
        })?;
        if report.failed > 0 {
            return Err(StopFailure {
                step: "writer_drain",
                reason: format!(
                    "{} event(s) failed to write: {}",
                    report.failed,
                    report.last_error.clone().unwrap_or_default()
                ),
            });
        }
        Ok(report)
    }

    /// Abandon a session that never started recording.
    pub fn discard(mut self) {
        let _ = self.close_log();
        remove_dir(&self.dir);
        tracing::info!(session = %self.id, "Recording session discarded");
    }

    /// Drain and close the log, then persist the sidecar. Every step runs even if
    /// an earlier one failed; failures are appended to `failures`.
    pub fn finish(mut self, failures: &mut Vec<StopFailure>) -> SessionSummary {
        let report = match self.close_log() {
            Ok(report) => report,
            Err(failure) => {
                failures.push(failure);
                DrainReport::default()
            }
        };

        for error in self.gate.disabled_inputs() {
            self.anchors.mark_input_disabled(error.to_string());
        }
        for failure in failures.iter() {
            self.anchors.add_warning(failure.to_string());
        }
        self.anchors.end_collect();
        if let Err(err) = self.anchors.save() {
            failures.push(StopFailure {
                step: "save_metadata",
                reason: err.to_string(),
            });
        }

        let stats = self.gate.stats();
        let anchors = self.anchors.snapshot();
        tracing::info!(
            session = %self.id,
            written = report.written,
            discarded_paused = stats.discarded_paused,
            backpressure_waits = stats.backpressure_waits,
            "Recording session finished"
        );

        SessionSummary {
            session_id: self.id.to_string(),
            dir: self.dir.clone(),
            events_written: report.written,
            write_failures: report.failed,
            discarded_while_paused: stats.discarded_paused,
            disabled_inputs: anchors.disabled_inputs,
            warnings: anchors.warnings,
            degraded: anchors.degraded || !failures.is_empty(),
        }
    }
}

fn allocate_session_dir(root: &Path, id: &Uuid) -> Result<PathBuf, SessionStartError> {
    let dir_err = |path: &Path, source| SessionStartError::Directory {
        path: path.to_path_buf(),
        source,
    };
    std::fs::create_dir_all(root).map_err(|source| dir_err(root, source))?;

    let base = format!("recording-{}", Local::now().format("%Y-%m-%d_%H-%M-%S"));
    let candidate = root.join(&base);
    match std::fs::create_dir(&candidate) {
        Ok(()) => Ok(candidate),
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
            let short = id.simple().to_string();
            let fallback = root.join(format!("{}-{}", base, &short[..8]));
            std::fs::create_dir(&fallback).map_err(|source| dir_err(&fallback, source))?;
            Ok(fallback)
        }
        Err(source) => Err(dir_err(&candidate, source)),
    }
}

fn remove_dir(dir: &Path) {
    if let Err(err) = std::fs::remove_dir_all(dir) {
        tracing::warn!(dir = %dir.display(), "Failed to remove session directory: {}", err);
    }
}

/// Most recently created session directory under `root`.
pub fn latest_recording(root: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(root).ok()?;
    entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_dir())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("recording-"))
        .max_by_key(|entry| entry.file_name())
        .map(|entry| entry.path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::input::InputClass;
    use crate::recorder::anchors::METADATA_FILENAME;

    fn config_in(dir: &Path) -> CaptureConfig {
        CaptureConfig {
            recordings_dir: dir.to_path_buf(),
            ..CaptureConfig::default()
        }
    }

    #[test]
    fn test_create_allocates_directory_and_log() {
        let root = tempfile::tempdir().unwrap();
        let session = RecordingSession::create(&config_in(root.path())).unwrap();
        assert!(session.dir().join(EVENTS_FILENAME).exists());
        assert!(session
            .dir()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("recording-"));
        session.discard();
    }

    #[test]
    fn test_same_second_sessions_get_distinct_dirs() {
        let root = tempfile::tempdir().unwrap();
        let config = config_in(root.path());
        let a = RecordingSession::create(&config).unwrap();
        let b = RecordingSession::create(&config).unwrap();
        assert_ne!(a.dir(), b.dir());
        a.discard();
        b.discard();
    }

    #[test]
    fn test_discard_removes_directory() {
        let root = tempfile::tempdir().unwrap();
        let session = RecordingSession::create(&config_in(root.path())).unwrap();
        let dir = session.dir().to_path_buf();
        session.discard();
        assert!(!dir.exists());
    }

    #[test]
    fn test_finish_drains_and_saves() {
        let root = tempfile::tempdir().unwrap();
        let session = RecordingSession::create(&config_in(root.path())).unwrap();
        let adapter = session.gate().adapter(InputClass::Pointer);
        adapter.on_move(1.0, 2.0);
        adapter.on_move(3.0, 4.0);

        let mut failures = Vec::new();
        let summary = session.finish(&mut failures);
        assert!(failures.is_empty());
        assert_eq!(summary.events_written, 2);
        assert!(!summary.degraded);
        assert!(summary.dir.join(METADATA_FILENAME).exists());
        assert!(!adapter.on_move(5.0, 6.0));
    }

    #[test]
    fn test_unwritable_root_is_a_start_error() {
        let root = tempfile::tempdir().unwrap();
        let file_root = root.path().join("not-a-dir");
        std::fs::write(&file_root, b"x").unwrap();
        let result = RecordingSession::create(&config_in(&file_root));
        assert!(matches!(result, Err(SessionStartError::Directory { .. })));
    }

    #[test]
    fn test_latest_recording_picks_newest_name() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("recording-2024-01-01_10-00-00")).unwrap();
        std::fs::create_dir(root.path().join("recording-2024-03-01_09-00-00")).unwrap();
        std::fs::create_dir(root.path().join("other")).unwrap();
        let latest = latest_recording(root.path()).unwrap();
        assert!(latest.ends_with("recording-2024-03-01_09-00-00"));
    }
}
