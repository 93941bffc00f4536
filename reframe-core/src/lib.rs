//! Core library for frame-by-frame video and image processing.
//!
//! A job takes a target (image or video), splits videos into frames with
//! ffmpeg, runs every active frame processor over the frames on a bounded
//! worker pool, reassembles the video, restores the original audio and moves
//! the result into place.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use reframe_core::{CoreConfig, Gateway, Pipeline, ProcessingJob, ProcessorContext,
//!     ProcessorRegistry, StatusReporter};
//!
//! let config = CoreConfig::builder()
//!     .execution_threads(4)
//!     .frame_processors(vec!["color_invert".to_string()])
//!     .build();
//! config.validate().unwrap();
//!
//! let status = StatusReporter::headless();
//! let registry = ProcessorRegistry::builtin(ProcessorContext::new(config.clone(), status.clone()));
//! let gateway = Gateway::from_config(&config, status);
//!
//! let pipeline = Pipeline::new(config, registry, gateway);
//! let job = ProcessingJob::new(None, "/videos/clip.mp4", "/videos/out/");
//! let report = pipeline.run(&job).unwrap();
//! println!("{report}");
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod external;
pub mod file_logging;
pub mod processing;
pub mod processors;
pub mod progress;
pub mod status;
pub mod temp_files;
pub mod util;
pub mod utils;

// Re-exports for public API
pub use config::{CoreConfig, CoreConfigBuilder};
pub use discovery::{MediaKind, is_image, is_video};
pub use error::{CoreError, CoreResult};
pub use external::{Gateway, SidecarTranscoder, Transcoder};
pub use processing::{
    AudioOutcome, DispatchSummary, Pipeline, move_temp, normalize_output_path,
    process_video_frames, restore_audio,
};
pub use processors::{FrameProcessor, ProcessorContext, ProcessorRegistry, ToggleStore};
pub use progress::{CancellationToken, ProgressState};
pub use status::StatusReporter;
pub use temp_files::TempWorkspace;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One unit of work: a target to process, an optional source identity
/// reference handed to processors, and where the result should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingJob {
    pub source_path: Option<PathBuf>,
    pub target_path: PathBuf,
    /// A file path, or an existing directory to place a derived name in.
    pub output_path: PathBuf,
}

impl ProcessingJob {
    pub fn new(
        source_path: Option<&Path>,
        target_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source_path: source_path.map(Path::to_path_buf),
            target_path: target_path.into(),
            output_path: output_path.into(),
        }
    }
}

/// Result of one processor over a job's frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorRun {
    pub name: String,
    pub summary: DispatchSummary,
}

/// Statistics about a finished job.
///
/// Returned by `Pipeline::run` for every job that produced an output.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub target: PathBuf,
    pub output: PathBuf,
    pub kind: MediaKind,
    pub frame_count: usize,
    /// Frame rate the video was assembled at; `None` for images.
    pub fps: Option<f64>,
    pub processors: Vec<ProcessorRun>,
    /// `None` for images.
    pub audio: Option<AudioOutcome>,
    pub elapsed: Duration,
}

impl JobReport {
    pub(crate) fn new(
        job: &ProcessingJob,
        output: &Path,
        kind: MediaKind,
        frame_count: usize,
        fps: Option<f64>,
        processors: Vec<ProcessorRun>,
        audio: Option<AudioOutcome>,
    ) -> Self {
        Self {
            target: job.target_path.clone(),
            output: output.to_path_buf(),
            kind,
            frame_count,
            fps,
            processors,
            audio,
            elapsed: Duration::ZERO,
        }
    }

    /// Frames that failed in any processor.
    pub fn failed_frames(&self) -> usize {
        self.processors.iter().map(|run| run.summary.failed_frames).sum()
    }
}

impl fmt::Display for JobReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} -> {}", self.target.display(), self.output.display())?;
        write!(f, "  {} frame(s)", self.frame_count)?;
        if let Some(fps) = self.fps {
            write!(f, " at {fps:.3} fps")?;
        }
        writeln!(f, " in {}", utils::format_duration(self.elapsed.as_secs_f64()))?;
        for run in &self.processors {
            writeln!(f, "  {}: {}", run.name, run.summary)?;
        }
        if let Some(audio) = self.audio {
            writeln!(f, "  audio: {audio}")?;
        }
        Ok(())
    }
}
