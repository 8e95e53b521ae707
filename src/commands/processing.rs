//! Playback commands
//!
//! Runs the sync engine over a finished session and writes its outputs next to
//! the event log.

use crate::processing::{write_annotation_map, write_overlays, PlaybackRun, SyncEngine, VideoProperties};
use anyhow::Context;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct PlaybackRequest {
    pub video: VideoProperties,
    pub engine: SyncEngine,
    /// Also write per-frame overlay records
    pub overlays: bool,
}

/// Align the session in `recording_dir` to its video and persist the frame map.
pub fn playback(recording_dir: &Path, request: &PlaybackRequest) -> anyhow::Result<PlaybackRun> {
    tracing::info!(
        dir = %recording_dir.display(),
        fps = request.video.fps,
        frames = request.video.total_frames,
        output_fps = request.engine.output_fps,
        "Processing recording"
    );

    let run = request
        .engine
        .run_recording(recording_dir, &request.video)
        .with_context(|| format!("Failed to align {}", recording_dir.display()))?;

    write_annotation_map(recording_dir, &run)?;
    if request.overlays {
        write_overlays(recording_dir, &run)?;
    }

    if run.is_degraded() {
        tracing::warn!("Alignment is degraded: no recorder start anchor was found");
    }
    tracing::info!(
        events = run.stats.events_read,
        merged = run.stats.merged_pairs,
        annotated_frames = run.annotations.frames.len(),
        dropped = run.stats.dropped_after_end,
        "Playback complete"
    );

    Ok(run)
}
