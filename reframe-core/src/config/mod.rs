//! Configuration structures and constants for the reframe-core library.
//!
//! `CoreConfig` is the explicit configuration context handed to the pipeline
//! at job start. It is read-only for the duration of a job; nothing in the
//! library keeps process-wide mutable configuration.

mod builder;
pub mod utils;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

pub use builder::CoreConfigBuilder;

// Default constants

/// Default ffmpeg video encoder used when reassembling frames.
pub const DEFAULT_VIDEO_ENCODER: &str = "libx264";

/// Default CRF value for the reassembled video. Lower is higher quality.
pub const DEFAULT_VIDEO_QUALITY: u8 = 18;

/// Highest CRF value accepted by the common ffmpeg encoders.
pub const MAX_VIDEO_QUALITY: u8 = 51;

/// Default ffmpeg `-loglevel` value.
pub const DEFAULT_FFMPEG_LOG_LEVEL: &str = "error";

/// Processors enabled when nothing else is configured.
pub const DEFAULT_FRAME_PROCESSORS: &[&str] = &["face_enhancer"];

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "REFRAME_";

/// Main configuration structure for the reframe-core library.
///
/// All fields have defaults, so a config file only needs to name the
/// values it changes.
///
/// # Examples
///
/// ```rust
/// use reframe_core::config::CoreConfigBuilder;
///
/// let config = CoreConfigBuilder::new()
///     .execution_threads(4)
///     .video_encoder("libx265")
///     .video_quality(22)
///     .keep_frames(true)
///     .build();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Worker pool size for frame dispatch
    pub execution_threads: usize,

    /// Backend identifiers reported alongside progress (observability only)
    pub execution_providers: Vec<String>,

    /// Memory budget in GB reported alongside progress (observability only)
    pub max_memory_gb: Option<u64>,

    /// ffmpeg encoder passed to `-c:v` during assembly
    pub video_encoder: String,

    /// CRF passed to `-crf` during assembly
    pub video_quality: u8,

    /// ffmpeg `-loglevel` value
    pub ffmpeg_log_level: String,

    /// Probe the source frame rate instead of assembling at 30 fps
    pub keep_fps: bool,

    /// Remux the original audio track onto the processed video
    pub keep_audio: bool,

    /// Leave the extracted frames on disk after the job
    pub keep_frames: bool,

    /// Processors requested at startup, in application order
    pub frame_processors: Vec<String>,

    /// ffmpeg binary
    pub ffmpeg_path: PathBuf,

    /// ffprobe binary
    pub ffprobe_path: PathBuf,

    /// Directory holding model files for processors that need them
    pub models_dir: PathBuf,

    /// Abort the job when more than this fraction of frames fail in one
    /// processor. `None` keeps going regardless of failures.
    pub max_failed_frame_ratio: Option<f64>,

    /// Remove the workspace even when the job fails
    pub clean_on_failure: bool,

    /// Draw a progress bar on stderr during dispatch
    pub show_progress: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            execution_threads: default_execution_threads(),
            execution_providers: vec!["cpu".to_string()],
            max_memory_gb: None,
            video_encoder: DEFAULT_VIDEO_ENCODER.to_string(),
            video_quality: DEFAULT_VIDEO_QUALITY,
            ffmpeg_log_level: DEFAULT_FFMPEG_LOG_LEVEL.to_string(),
            keep_fps: true,
            keep_audio: true,
            keep_frames: false,
            frame_processors: DEFAULT_FRAME_PROCESSORS
                .iter()
                .map(|name| name.to_string())
                .collect(),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            models_dir: PathBuf::from("models"),
            max_failed_frame_ratio: None,
            clean_on_failure: false,
            show_progress: true,
        }
    }
}

fn default_execution_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl CoreConfig {
    /// Starts a builder from the defaults.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::new()
    }

    /// Loads a configuration from a JSON file. Missing keys take defaults.
    pub fn from_json_file(path: &Path) -> CoreResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: CoreConfig = serde_json::from_str(&contents)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Writes the configuration to a JSON file.
    pub fn save_json_file(&self, path: &Path) -> CoreResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Applies `REFRAME_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(utils::env_lookup)
    }

    /// Applies `REFRAME_*` overrides read through `lookup`.
    pub fn with_overrides_from<L>(mut self, lookup: L) -> Self
    where
        L: Fn(&str) -> Option<String>,
    {
        let key = |name: &str| format!("{ENV_PREFIX}{name}");

        self.execution_threads =
            utils::get_usize(&lookup, &key("EXECUTION_THREADS"), self.execution_threads);
        self.video_encoder =
            utils::get_string(&lookup, &key("VIDEO_ENCODER"), self.video_encoder);
        self.video_quality = utils::get_u8(&lookup, &key("VIDEO_QUALITY"), self.video_quality);
        self.ffmpeg_log_level =
            utils::get_string(&lookup, &key("FFMPEG_LOG_LEVEL"), self.ffmpeg_log_level);
        self.keep_fps = utils::get_bool(&lookup, &key("KEEP_FPS"), self.keep_fps);
        self.keep_audio = utils::get_bool(&lookup, &key("KEEP_AUDIO"), self.keep_audio);
        self.keep_frames = utils::get_bool(&lookup, &key("KEEP_FRAMES"), self.keep_frames);
        self.ffmpeg_path = utils::get_path(&lookup, &key("FFMPEG_PATH"), self.ffmpeg_path);
        self.ffprobe_path = utils::get_path(&lookup, &key("FFPROBE_PATH"), self.ffprobe_path);
        self.models_dir = utils::get_path(&lookup, &key("MODELS_DIR"), self.models_dir);
        self
    }

    /// Checks that the configuration can drive a job.
    pub fn validate(&self) -> CoreResult<()> {
        if self.execution_threads == 0 {
            return Err(CoreError::Config(
                "execution_threads must be at least 1".to_string(),
            ));
        }
        if self.video_quality > MAX_VIDEO_QUALITY {
            return Err(CoreError::Config(format!(
                "video_quality must be between 0 and {MAX_VIDEO_QUALITY}, got {}",
                self.video_quality
            )));
        }
        if self.video_encoder.trim().is_empty() {
            return Err(CoreError::Config("video_encoder must not be empty".to_string()));
        }
        if let Some(ratio) = self.max_failed_frame_ratio {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(CoreError::Config(format!(
                    "max_failed_frame_ratio must be within 0.0..=1.0, got {ratio}"
                )));
            }
        }
        Ok(())
    }
}
