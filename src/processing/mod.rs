//! Playback synchronization
//!
//! Post-recording pass that aligns a session's event log to its video and
//! produces per-frame annotations. Each run reads the log and sidecar and
//! never modifies them, so repeated runs over the same inputs give the same
//! result.

pub mod frames;
pub mod overlay;
pub mod pairing;
pub mod timeline;

pub use frames::{FrameAnnotationMap, RetainedFrame, VideoProperties, FRAME_MAP_FILENAME};
pub use overlay::{FrameOverlay, OVERLAYS_FILENAME};
pub use timeline::{Alignment, Baseline, TimelineEvent};

use crate::capture::input::InputEvent;
use crate::config::CaptureConfig;
use crate::error::PlaybackInputError;
use crate::recorder::anchors::SessionAnchors;
use crate::recorder::writer::EVENTS_FILENAME;
use frames::{chunk_size, validate_fps, walk_frames};
use pairing::merge_pairs;
use std::io::Write;
use std::path::Path;
use timeline::{align, is_zero_scroll, read_anchors, read_event_log, select_baseline};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncEngine {
    pub output_fps: f64,
    pub persistence_frames: u64,
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::from_config(&CaptureConfig::default())
    }
}

/// Everything one playback run produced.
#[derive(Debug, Clone)]
pub struct PlaybackRun {
    pub baseline: Baseline,
    pub chunk_size: u64,
    pub frames: Vec<RetainedFrame>,
    pub annotations: FrameAnnotationMap,
    pub stats: PlaybackStats,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackStats {
    pub events_read: usize,
    pub skipped_lines: usize,
    pub zero_scrolls: usize,
    pub merged_pairs: usize,
    pub dropped_after_end: usize,
}

impl PlaybackRun {
    pub fn overlays(&self) -> impl Iterator<Item = FrameOverlay> + '_ {
        self.frames.iter().map(FrameOverlay::compose)
    }

    pub fn is_degraded(&self) -> bool {
        self.baseline.is_degraded()
    }
}

impl SyncEngine {
    pub fn from_config(config: &CaptureConfig) -> Self {
        Self {
            output_fps: config.output_fps,
            persistence_frames: config.annotation_persistence_frames,
        }
    }

    /// Align `events` to the video and map them onto its retained frames.
    pub fn run(
        &self,
        events: Vec<InputEvent>,
        anchors: Option<&SessionAnchors>,
        video: &VideoProperties,
    ) -> Result<PlaybackRun, PlaybackInputError> {
        video.validate()?;
        validate_fps(self.output_fps)?;

        let mut stats = PlaybackStats {
            events_read: events.len(),
            ..PlaybackStats::default()
        };
        let baseline = select_baseline(anchors, &events).ok_or(PlaybackInputError::NoEvents)?;

        let mut aligned = align(events, &baseline);
        let before = aligned.len();
        aligned.retain(|event| !is_zero_scroll(event.kind()));
        stats.zero_scrolls = before - aligned.len();

        let (paired, pairing) = merge_pairs(aligned, video.fps);
        stats.merged_pairs = pairing.merged;

        let chunk = chunk_size(video.fps, self.output_fps);
        let walk = walk_frames(&paired, video, chunk, self.persistence_frames);
        stats.dropped_after_end = walk.dropped_after_end;
        let annotations = FrameAnnotationMap::from_walk(&walk, video.fps, self.output_fps, chunk);

        tracing::info!(
            baseline = baseline.timestamp,
            alignment = ?baseline.alignment,
            chunk_size = chunk,
            retained_frames = walk.frames.len(),
            annotated_frames = annotations.frames.len(),
            "Playback alignment complete"
        );

        Ok(PlaybackRun {
            baseline,
            chunk_size: chunk,
            frames: walk.frames,
            annotations,
            stats,
        })
    }

    /// Run over a session directory's event log and sidecar.
    pub fn run_recording(&self, recording_dir: &Path, video: &VideoProperties) -> Result<PlaybackRun, PlaybackInputError> {
        video.validate()?;
        let log = read_event_log(&recording_dir.join(EVENTS_FILENAME))?;
        let anchors = read_anchors(recording_dir);
        let mut run = self.run(log.events, anchors.as_ref(), video)?;
        run.stats.skipped_lines = log.skipped_lines;
        Ok(run)
    }
}

/// Write `frame_action_map.json` into `recording_dir`.
pub fn write_annotation_map(recording_dir: &Path, run: &PlaybackRun) -> Result<(), PlaybackInputError> {
    let path = recording_dir.join(FRAME_MAP_FILENAME);
    run.annotations.save(&path)?;
    tracing::info!(path = %path.display(), frames = run.annotations.frames.len(), "Wrote frame annotation map");
    Ok(())
}

/// Write one overlay description per retained frame as JSON lines.
pub fn write_overlays(recording_dir: &Path, run: &PlaybackRun) -> Result<(), PlaybackInputError> {
    let path = recording_dir.join(OVERLAYS_FILENAME);
    let output_err = |source| PlaybackInputError::Output {
        path: path.clone(),
        source,
    };

    let file = std::fs::File::create(&path).map_err(output_err)?;
    let mut out = std::io::BufWriter::new(file);
    for overlay in run.overlays() {
        serde_json::to_writer(&mut out, &overlay).map_err(|err| output_err(err.into()))?;
        out.write_all(b"\n").map_err(output_err)?;
    }
    out.flush().map_err(output_err)?;
    tracing::info!(path = %path.display(), frames = run.frames.len(), "Wrote frame overlays");
    Ok(())
}
