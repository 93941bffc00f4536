// ============================================================================
// reframe-core/src/processors/mod.rs
// ============================================================================
//
// FRAME PROCESSORS: The Per-Frame Plugin Contract
//
// A frame processor is a named unit with five capabilities:
// - pre_check:     one-time readiness check (model files present, ...)
// - pre_start:     job-level precondition check (target kind, ...)
// - process_frame: pure transform of one decoded frame
// - process_image: transform a single image target into the output path
// - process_video: transform a batch of frame files in place
//
// The batch entry points have default implementations built on
// process_frame, so most processors only implement the transform. A batch
// never fails as a whole: unreadable frames and transform errors are logged
// and counted in the returned BatchReport.

use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::ProcessingJob;
use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::progress::ProgressState;
use crate::status::StatusReporter;
use crate::utils::display_name;

pub mod color_invert;
pub mod face_enhancer;
pub mod registry;
pub mod toggles;

pub use color_invert::ColorInvert;
pub use face_enhancer::{BackendLoader, EnhancementBackend, FaceEnhancer, backend_loader};
pub use registry::{ProcessorFactory, ProcessorRegistry};
pub use toggles::ToggleStore;

/// A decoded frame. Frames are extracted as 8-bit RGB.
pub type Frame = RgbImage;

/// What a processor sees when it is constructed.
#[derive(Debug, Clone)]
pub struct ProcessorContext {
    pub config: CoreConfig,
    pub status: StatusReporter,
}

impl ProcessorContext {
    pub fn new(config: CoreConfig, status: StatusReporter) -> Self {
        Self { config, status }
    }
}

/// Outcome of a batch of frame files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Frames transformed and written back
    pub processed: usize,
    /// Frames that could not be read, transformed, or written
    pub failed: usize,
}

/// The plugin contract driven by the pipeline.
pub trait FrameProcessor: Send + Sync {
    /// Registry name, e.g. `face_enhancer`.
    fn name(&self) -> &str;

    /// Scope used on the status channel.
    fn scope(&self) -> &str;

    fn status(&self) -> &StatusReporter;

    /// Idempotent readiness check. Safe to call on every run.
    fn pre_check(&self) -> bool;

    /// Returns false when `job` should not proceed.
    fn pre_start(&self, job: &ProcessingJob) -> bool;

    /// Transforms one frame.
    fn process_frame(&self, source: Option<&Path>, frame: Frame) -> anyhow::Result<Frame>;

    /// Transforms each frame file in place, continuing past failures.
    fn process_frames(
        &self,
        source: Option<&Path>,
        frame_paths: &[PathBuf],
        progress: &ProgressState,
    ) -> BatchReport {
        process_frame_files(self, source, frame_paths, progress)
    }

    /// Transforms `target` and writes the result to `output`.
    fn process_image(&self, source: Option<&Path>, target: &Path, output: &Path) -> CoreResult<()> {
        let frame = image::open(target)?.to_rgb8();
        let result = self
            .process_frame(source, frame)
            .map_err(|e| CoreError::Processor {
                processor: self.name().to_string(),
                message: format!("{e:#}"),
            })?;
        result.save(output)?;
        Ok(())
    }

    /// Batch entry point used by the dispatch engine.
    fn process_video(
        &self,
        source: Option<&Path>,
        frame_paths: &[PathBuf],
        progress: &ProgressState,
    ) -> BatchReport {
        self.process_frames(source, frame_paths, progress)
    }
}

/// Reads, transforms, and overwrites each frame file, keeping its name.
pub fn process_frame_files<P>(
    processor: &P,
    source: Option<&Path>,
    frame_paths: &[PathBuf],
    progress: &ProgressState,
) -> BatchReport
where
    P: FrameProcessor + ?Sized,
{
    let status = processor.status();
    let scope = processor.scope();
    let mut report = BatchReport::default();

    for path in frame_paths {
        let frame_name = display_name(path);
        progress.set_message(frame_name.clone());
        status.debug(scope, format!("Processing frame: {}", path.display()));

        let frame = match image::open(path) {
            Ok(image) => image.to_rgb8(),
            Err(e) => {
                status.warn(scope, format!("Warning: Could not read frame {}: {e}", path.display()));
                report.failed += 1;
                continue;
            }
        };

        let written = processor
            .process_frame(source, frame)
            .and_then(|result| result.save(path).map_err(anyhow::Error::from));
        match written {
            Ok(()) => {
                status.debug(scope, format!("Successfully processed frame: {}", path.display()));
                report.processed += 1;
            }
            Err(e) => {
                status.error(scope, format!("Error processing frame {frame_name}: {e:#}"));
                report.failed += 1;
            }
        }
    }

    report
}
