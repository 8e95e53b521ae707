//! Capture and playback configuration
//!
//! Stored as JSON. A missing file is created with defaults; missing keys are
//! filled from defaults so older files keep working.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "config.json";
const RECORDINGS_DIRNAME: &str = "TimelineCapture_Recordings";
const APP_DIRNAME: &str = "timeline-capture";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Root under which each session gets its own directory
    pub recordings_dir: PathBuf,
    pub natural_scrolling: bool,
    /// Capture queue bound; producers wait on the writer once it is full
    pub queue_capacity: usize,
    /// How long stop waits for the recorder's `stopped` confirmation
    pub stop_confirmation_timeout_ms: u64,
    pub output_fps: f64,
    /// Native frames an event stays active (visible) after the frame it occurs in
    pub annotation_persistence_frames: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            recordings_dir: default_recordings_dir(),
            natural_scrolling: cfg!(target_os = "macos"),
            queue_capacity: 20_000,
            stop_confirmation_timeout_ms: 2_000,
            output_fps: 30.0,
            annotation_persistence_frames: 5,
        }
    }
}

pub fn default_recordings_dir() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(RECORDINGS_DIRNAME)
}

/// `<config dir>/timeline-capture/config.json`, or the working directory when the
/// platform has no config dir.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .map(|dir| dir.join(APP_DIRNAME))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_FILENAME)
}

impl CaptureConfig {
    /// Load `path`, creating it with defaults if it does not exist.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            let config: CaptureConfig =
                serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?;
            return Ok(config.normalized());
        }

        let config = CaptureConfig::default();
        config.save(path)?;
        tracing::info!(path = %path.display(), "Created default config");
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let payload = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, payload).map_err(write_err)
    }

    /// Clamp values into usable ranges.
    pub fn normalized(mut self) -> Self {
        self.queue_capacity = self.queue_capacity.max(1);
        if !(self.output_fps.is_finite() && self.output_fps > 0.0) {
            self.output_fps = CaptureConfig::default().output_fps;
        }
        self.annotation_persistence_frames = self.annotation_persistence_frames.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILENAME);

        let config = CaptureConfig::load_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config, CaptureConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults_and_normalizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, r#"{"queue_capacity": 0, "output_fps": -5, "unknown": 1}"#).unwrap();

        let config = CaptureConfig::load_or_create(&path).unwrap();
        assert_eq!(config.queue_capacity, 1);
        assert_eq!(config.output_fps, 30.0);
        assert_eq!(config.stop_confirmation_timeout_ms, 2_000);
    }

    #[cfg(unix)]
    #[test]
    fn test_unserializable_config_is_not_reported_as_parse_error() {
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        let config = CaptureConfig {
            recordings_dir: PathBuf::from(std::ffi::OsStr::from_bytes(b"rec\xff")),
            ..CaptureConfig::default()
        };

        assert!(matches!(
            config.save(&path),
            Err(ConfigError::Serialize { .. })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            CaptureConfig::load_or_create(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
