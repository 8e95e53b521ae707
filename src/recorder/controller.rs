//! Recording session controller
//!
//! Drives one [`RecordingSession`] at a time through
//! `Idle -> Recording -> {Paused <-> Recording} -> Stopped`, coordinating the
//! input sources, the capture gate, the anchor manager and the external recorder.

use crate::config::CaptureConfig;
use crate::error::{ControlError, IntentError, SessionStartError, SessionStopError, StopFailure};
use crate::recorder::channel::{RecorderState, VideoRecorder};
use crate::recorder::session::{RecordingSession, SessionSummary};
use crate::recorder::state::{Intent, RecordingState};
use crate::capture::source::InputSource;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

pub struct SessionController {
    config: CaptureConfig,
    recorder: Box<dyn VideoRecorder>,
    sources: Vec<Box<dyn InputSource>>,
    state: RecordingState,
    active: Option<RecordingSession>,
}

impl SessionController {
    pub fn new(
        config: CaptureConfig,
        recorder: Box<dyn VideoRecorder>,
        sources: Vec<Box<dyn InputSource>>,
    ) -> Self {
        Self {
            config,
            recorder,
            sources,
            state: RecordingState::Idle,
            active: None,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn active_session_dir(&self) -> Option<&Path> {
        self.active.as_ref().map(RecordingSession::dir)
    }

    pub fn active_session(&self) -> Option<&RecordingSession> {
        self.active.as_ref()
    }

    /// Idle/Stopped -> Recording. Returns the new session's directory.
    pub async fn start(&mut self) -> Result<PathBuf, SessionStartError> {
        if self.active.is_some() {
            tracing::warn!("Start rejected: a session is already active");
            return Err(SessionStartError::AlreadyActive);
        }

        let session = match RecordingSession::create(&self.config) {
            Ok(session) => session,
            Err(err) => {
                self.state = RecordingState::Idle;
                return Err(err);
            }
        };

        session.anchors().collect();
        if let Err(err) = self.recorder.start(session.anchors().sink()).await {
            tracing::error!(recorder = self.recorder.id(), "Recorder refused to start: {}", err);
            session.discard();
            self.state = RecordingState::Idle;
            return Err(SessionStartError::RecorderRefused(err));
        }

        for source in self.sources.iter_mut() {
            let adapter = session.gate().adapter(source.input_class());
            if let Err(err) = source.register(adapter) {
                session.gate().report_capture_error(err);
            } else {
                tracing::debug!(source = source.name(), "Input source registered");
            }
        }

        let dir = session.dir().to_path_buf();
        tracing::info!(session = %session.id(), recorder = self.recorder.id(), "Recording started");
        self.active = Some(session);
        self.state = RecordingState::Recording;
        Ok(dir)
    }

    /// Recording -> Paused. Returns `false` when ignored.
    pub async fn pause(&mut self) -> Result<bool, ControlError> {
        if self.state != RecordingState::Recording {
            tracing::debug!(state = %self.state, "Pause ignored");
            return Ok(false);
        }
        let Some(session) = self.active.as_ref() else {
            return Ok(false);
        };

        self.recorder
            .pause()
            .await
            .map_err(|source| ControlError::Recorder {
                command: "pause",
                source,
            })?;
        session.gate().pause();
        self.state = RecordingState::Paused;
        tracing::info!("Recording paused");
        Ok(true)
    }

    /// Paused -> Recording. Returns `false` when ignored.
    pub async fn resume(&mut self) -> Result<bool, ControlError> {
        if self.state != RecordingState::Paused {
            tracing::debug!(state = %self.state, "Resume ignored");
            return Ok(false);
        }
        let Some(session) = self.active.as_ref() else {
            return Ok(false);
        };

        self.recorder
            .resume()
            .await
            .map_err(|source| ControlError::Recorder {
                command: "resume",
                source,
            })?;
        session.gate().resume();
        self.state = RecordingState::Recording;
        tracing::info!("Recording resumed");
        Ok(true)
    }

    /// {Recording, Paused} -> Stopped, best effort.
    ///
    /// Order: stop the recorder and wait for its `stopped` confirmation, unregister
    /// every source, close the queue and drain the writer, then end collection and
    /// save the sidecar. A failing step never skips the ones after it. Returns
    /// `Ok(None)` when there was nothing to stop.
    pub async fn stop(&mut self) -> Result<Option<SessionSummary>, SessionStopError> {
        let Some(session) = self.active.take() else {
            tracing::debug!(state = %self.state, "Stop ignored");
            return Ok(None);
        };
        let mut failures = Vec::new();

        match self.recorder.stop().await {
            Ok(()) => {
                let timeout = Duration::from_millis(self.config.stop_confirmation_timeout_ms);
                if !session
                    .anchors()
                    .wait_for_state(RecorderState::Stopped, timeout)
                    .await
                {
                    tracing::warn!(?timeout, "Recorder did not confirm stop; stopped anchor missing");
                    session
                        .anchors()
                        .add_warning("recorder stop confirmation not received");
                }
            }
            Err(err) => {
                tracing::error!(recorder = self.recorder.id(), "Recorder failed to stop: {}", err);
                failures.push(StopFailure {
                    step: "recorder_stop",
                    reason: err.to_string(),
                });
            }
        }

        for source in self.sources.iter_mut() {
            source.unregister();
        }

        let summary = session.finish(&mut failures);
        self.state = RecordingState::Stopped;

        if failures.is_empty() {
            tracing::info!(dir = %summary.dir.display(), "Recording stopped");
            Ok(Some(summary))
        } else {
            tracing::warn!(dir = %summary.dir.display(), failures = failures.len(), "Recording stopped with failures");
            Err(SessionStopError { summary, failures })
        }
    }

    pub async fn handle_intent(&mut self, intent: Intent) -> Result<(), IntentError> {
        match (intent, self.state) {
            (Intent::ToggleRecord, state) if state.is_active() => {
                self.stop().await?;
            }
            (Intent::ToggleRecord, _) => {
                self.start().await?;
            }
            (Intent::TogglePause, RecordingState::Recording) => {
                self.pause().await?;
            }
            (Intent::TogglePause, RecordingState::Paused) => {
                self.resume().await?;
            }
            (Intent::TogglePause, state) => {
                tracing::warn!(%state, "Cannot pause/resume: not recording");
            }
        }
        Ok(())
    }

    /// Apply intents until the channel closes, then stop any active session.
    pub async fn run_intents(&mut self, mut intents: mpsc::Receiver<Intent>) {
        while let Some(intent) = intents.recv().await {
            if let Err(err) = self.handle_intent(intent).await {
                tracing::error!(?intent, "Intent failed: {}", err);
            }
        }
        if let Err(err) = self.stop().await {
            tracing::error!("Final stop failed: {}", err);
        }
    }
}
