//! In-process recorder stamped with the capture clock
//!
//! Acknowledges every command immediately and confirms it with a capture-clock
//! timestamp. Used for input-only sessions, where the anchors then share the
//! event log's clock origin exactly.

use crate::capture::clock::now_monotonic;
use crate::recorder::anchors::StateTimingSink;
use crate::recorder::channel::{RecorderError, RecorderResult, RecorderState, VideoRecorder};
use async_trait::async_trait;

#[derive(Default)]
pub struct LocalClockRecorder {
    timings: Option<StateTimingSink>,
    paused: bool,
}

impl LocalClockRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn confirm(&self, state: RecorderState) -> RecorderResult<()> {
        let timings = self.timings.as_ref().ok_or(RecorderError::NotRecording)?;
        timings.record(state, now_monotonic());
        Ok(())
    }
}

#[async_trait]
impl VideoRecorder for LocalClockRecorder {
    fn id(&self) -> &str {
        "local-clock"
    }

    async fn start(&mut self, timings: StateTimingSink) -> RecorderResult<()> {
        if self.timings.is_some() {
            return Err(RecorderError::AlreadyRecording);
        }
        self.timings = Some(timings);
        self.paused = false;
        self.confirm(RecorderState::Started)
    }

    async fn pause(&mut self) -> RecorderResult<()> {
        if self.paused {
            return Ok(());
        }
        self.confirm(RecorderState::Paused)?;
        self.paused = true;
        Ok(())
    }

    async fn resume(&mut self) -> RecorderResult<()> {
        if !self.paused {
            return Ok(());
        }
        self.confirm(RecorderState::Resumed)?;
        self.paused = false;
        Ok(())
    }

    async fn stop(&mut self) -> RecorderResult<()> {
        self.confirm(RecorderState::Stopped)?;
        self.timings = None;
        self.paused = false;
        Ok(())
    }

    fn is_recording(&self) -> bool {
        self.timings.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::anchors::AnchorManager;

    #[tokio::test]
    async fn test_confirms_each_transition() {
        let dir = tempfile::tempdir().unwrap();
        let anchors = AnchorManager::new("s", dir.path(), false);
        let mut recorder = LocalClockRecorder::new();

        recorder.start(anchors.sink()).await.unwrap();
        recorder.pause().await.unwrap();
        recorder.resume().await.unwrap();
        recorder.stop().await.unwrap();

        let snapshot = anchors.snapshot();
        for state in [
            RecorderState::Started,
            RecorderState::Paused,
            RecorderState::Resumed,
            RecorderState::Stopped,
        ] {
            assert_eq!(snapshot.state_timings(state).len(), 1, "{}", state);
        }
        assert!(!recorder.is_recording());
    }

    #[tokio::test]
    async fn test_stop_without_start_is_rejected() {
        let mut recorder = LocalClockRecorder::new();
        assert!(matches!(recorder.stop().await, Err(RecorderError::NotRecording)));
    }
}
