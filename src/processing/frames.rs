//! Frame mapping
//!
//! Buckets aligned events into native video frames and walks the retained
//! output frames, collecting the events each one should carry.

use crate::error::PlaybackInputError;
use crate::processing::timeline::TimelineEvent;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::path::Path;

pub const FRAME_MAP_FILENAME: &str = "frame_action_map.json";

/// Absorbs float error so an event exactly on a frame boundary lands in that frame.
const FRAME_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoProperties {
    pub fps: f64,
    pub width: u32,
    pub height: u32,
    pub total_frames: u64,
}

impl VideoProperties {
    pub fn validate(&self) -> Result<(), PlaybackInputError> {
        validate_fps(self.fps)?;
        if self.width == 0 || self.height == 0 {
            return Err(PlaybackInputError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    pub fn duration_sec(&self) -> f64 {
        self.total_frames as f64 / self.fps
    }
}

pub fn validate_fps(fps: f64) -> Result<(), PlaybackInputError> {
    if fps.is_finite() && fps > 0.0 {
        Ok(())
    } else {
        Err(PlaybackInputError::InvalidFrameRate(fps))
    }
}

/// Native frame an aligned time falls into. Times before the baseline clamp to frame 0.
pub fn native_frame_index(relative_time_sec: f64, fps: f64) -> u64 {
    if relative_time_sec <= 0.0 {
        return 0;
    }
    (relative_time_sec * fps + FRAME_EPSILON).floor() as u64
}

/// Native frames per retained output frame, at least one.
pub fn chunk_size(native_fps: f64, output_fps: f64) -> u64 {
    ((native_fps / output_fps).round() as u64).max(1)
}

/// One output frame and the events it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct RetainedFrame {
    pub native_index: u64,
    pub output_index: u64,
    pub time_sec: f64,
    /// Events that occurred since the previous retained frame, up to and including this one.
    pub events: Vec<TimelineEvent>,
    /// Events still inside their persistence window at this frame.
    pub active: Vec<TimelineEvent>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameWalk {
    pub frames: Vec<RetainedFrame>,
    /// Events whose frame is past the end of the video.
    pub dropped_after_end: usize,
}

/// Walk the retained frames of `video`, sampling every `chunk` native frames.
///
/// `events` must be ordered by relative time. Each event is delivered to the
/// first retained frame at or after its own native frame, and stays active for
/// `persistence_frames` native frames (at least through the frame delivering it).
pub fn walk_frames(
    events: &[TimelineEvent],
    video: &VideoProperties,
    chunk: u64,
    persistence_frames: u64,
) -> FrameWalk {
    let chunk = chunk.max(1);
    let persistence_frames = persistence_frames.max(1);
    let mut walk = FrameWalk::default();

    let mut next = 0;
    let mut active: VecDeque<(u64, &TimelineEvent)> = VecDeque::new();

    for (output_index, native_index) in (0..video.total_frames).step_by(chunk as usize).enumerate() {
        let mut arrived = Vec::new();
        while let Some(event) = events.get(next) {
            let frame = native_frame_index(event.relative_time_sec, video.fps);
            if frame > native_index {
                break;
            }
            arrived.push(event.clone());
            // Always visible in the frame that delivers it, even when chunking skipped its own frame.
            let expires = (frame + persistence_frames).max(native_index + 1);
            active.push_back((expires, event));
            next += 1;
        }

        while active.front().is_some_and(|(expires, _)| *expires <= native_index) {
            active.pop_front();
        }

        walk.frames.push(RetainedFrame {
            native_index,
            output_index: output_index as u64,
            time_sec: native_index as f64 / video.fps,
            events: arrived,
            active: active.iter().map(|(_, event)| (*event).clone()).collect(),
        });
    }

    walk.dropped_after_end = events.len() - next;
    if walk.dropped_after_end > 0 {
        tracing::warn!(
            dropped = walk.dropped_after_end,
            total_frames = video.total_frames,
            "Events past the last video frame were not mapped"
        );
    }
    walk
}

/// Events each native frame carries, keyed by the native index of retained frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameAnnotations {
    pub output_index: u64,
    pub time_sec: f64,
    pub events: Vec<TimelineEvent>,
}

/// Persisted frame -> events lookup. Only frames that carry events are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameAnnotationMap {
    pub native_fps: f64,
    pub output_fps: f64,
    pub chunk_size: u64,
    pub frames: BTreeMap<u64, FrameAnnotations>,
}

impl FrameAnnotationMap {
    pub fn from_walk(walk: &FrameWalk, native_fps: f64, output_fps: f64, chunk_size: u64) -> Self {
        let frames = walk
            .frames
            .iter()
            .filter(|frame| !frame.events.is_empty())
            .map(|frame| {
                (
                    frame.native_index,
                    FrameAnnotations {
                        output_index: frame.output_index,
                        time_sec: frame.time_sec,
                        events: frame.events.clone(),
                    },
                )
            })
            .collect();
        Self {
            native_fps,
            output_fps,
            chunk_size,
            frames,
        }
    }

    pub fn events_at(&self, native_index: u64) -> &[TimelineEvent] {
        self.frames
            .get(&native_index)
            .map(|frame| frame.events.as_slice())
            .unwrap_or(&[])
    }

    pub fn event_count(&self) -> usize {
        self.frames.values().map(|frame| frame.events.len()).sum()
    }

    pub fn save(&self, path: &Path) -> Result<(), PlaybackInputError> {
        let output_err = |source| PlaybackInputError::Output {
            path: path.to_path_buf(),
            source,
        };
        let data = serde_json::to_vec_pretty(self).map_err(|err| output_err(err.into()))?;
        std::fs::write(path, data).map_err(output_err)
    }

    pub fn load(path: &Path) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        serde_json::from_slice(&data).map_err(std::io::Error::from)
    }
}
