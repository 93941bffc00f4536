// ============================================================================
// reframe-core/src/processing/video.rs
// ============================================================================
//
// JOB ORCHESTRATION: Running One Target Through the Active Processors
//
// The Pipeline owns everything a job needs: the configuration, the processor
// registry, the transcoder gateway, the toggle store, and a cancellation
// token. `run` executes the stages as strict barriers:
//
//   resolve processors -> pre_check -> pre_start -> (image | video path)
//
// Video path:
//   reset workspace -> extract -> list frames -> dispatch per processor
//   -> fps -> assemble -> restore audio / move -> clean -> verify
//
// Image path:
//   copy target to output -> process_image in place per processor -> verify
//
// The output may never be the target itself; that is rejected before any
// stage runs. A failed image job removes its partial output.
//
// Job-level errors propagate to the caller. The workspace is left on disk
// for diagnosis unless `clean_on_failure` is set.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use super::audio::{AudioOutcome, restore_audio};
use super::dispatch::{DispatchSummary, process_video_frames};
use super::frames::{create_video, extract_frames};
use super::output::{is_same_file, move_temp, normalize_output_path};
use crate::config::CoreConfig;
use crate::discovery::{MediaKind, is_image, is_video, media_kind};
use crate::error::{CoreError, CoreResult};
use crate::external::{FALLBACK_FPS, Gateway};
use crate::processors::{FrameProcessor, ProcessorRegistry, ToggleStore};
use crate::progress::{CancellationToken, ProgressMetadata, ProgressState};
use crate::status::{SCOPE_CORE, StatusReporter};
use crate::temp_files::TempWorkspace;
use crate::utils::format_duration;
use crate::{JobReport, ProcessingJob, ProcessorRun};

type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Runs processing jobs.
pub struct Pipeline {
    config: CoreConfig,
    registry: ProcessorRegistry,
    gateway: Gateway,
    status: StatusReporter,
    toggles: ToggleStore,
    cancel: CancellationToken,
    on_progress: Option<ProgressCallback>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("toggles", &self.toggles)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl Pipeline {
    /// Creates a pipeline. Status messages go to the gateway's reporter.
    pub fn new(config: CoreConfig, registry: ProcessorRegistry, gateway: Gateway) -> Self {
        let status = gateway.status().clone();
        Self {
            config,
            registry,
            gateway,
            status,
            toggles: ToggleStore::new(),
            cancel: CancellationToken::new(),
            on_progress: None,
        }
    }

    /// Uses `toggles` (typically shared with a UI) instead of an empty store.
    pub fn with_toggles(mut self, toggles: ToggleStore) -> Self {
        self.toggles = toggles;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Called with `(completed, total)` after every frame task.
    pub fn with_progress_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn registry(&self) -> &ProcessorRegistry {
        &self.registry
    }

    pub fn toggles(&self) -> &ToggleStore {
        &self.toggles
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Runs `job` to completion.
    pub fn run(&self, job: &ProcessingJob) -> CoreResult<JobReport> {
        let started = Instant::now();

        let processors = self
            .registry
            .active_set(&self.config.frame_processors, &self.toggles)?;
        for processor in &processors {
            if !processor.pre_check() {
                return Err(CoreError::PreconditionFailed {
                    processor: processor.name().to_string(),
                    check: "pre_check",
                });
            }
        }
        for processor in &processors {
            if !processor.pre_start(job) {
                return Err(CoreError::PreconditionFailed {
                    processor: processor.name().to_string(),
                    check: "pre_start",
                });
            }
        }

        let output = normalize_output_path(
            job.source_path.as_deref(),
            &job.target_path,
            &job.output_path,
        );
        let kind = media_kind(&job.target_path)
            .ok_or_else(|| CoreError::UnsupportedTarget(job.target_path.clone()))?;
        if is_same_file(&job.target_path, &output) {
            self.status
                .error(SCOPE_CORE, "Output path must differ from the target path.");
            return Err(CoreError::OutputIsTarget(output));
        }

        let mut report = match kind {
            MediaKind::Image => self.run_image(job, &processors, &output)?,
            MediaKind::Video => {
                let result = self.run_video(job, &processors, &output);
                if result.is_err() && self.config.clean_on_failure {
                    self.discard_workspace(&job.target_path);
                }
                result?
            }
        };
        report.elapsed = started.elapsed();
        log::info!(
            "Job finished in {}: {}",
            format_duration(report.elapsed.as_secs_f64()),
            output.display()
        );
        Ok(report)
    }

    fn run_image(
        &self,
        job: &ProcessingJob,
        processors: &[Arc<dyn FrameProcessor>],
        output: &Path,
    ) -> CoreResult<JobReport> {
        let source = job.source_path.as_deref();
        fs::copy(&job.target_path, output)?;

        let runs = match self.process_image_in_place(processors, source, output) {
            Ok(runs) => runs,
            Err(e) => {
                self.discard_output(output);
                return Err(e);
            }
        };

        if !is_image(output) {
            self.status.error(SCOPE_CORE, "Processing to image failed!");
            return Err(CoreError::OutputVerification(output.to_path_buf()));
        }
        self.status.update(SCOPE_CORE, "Processing to image succeed!");

        Ok(JobReport::new(job, output, MediaKind::Image, 1, None, runs, None))
    }

    fn process_image_in_place(
        &self,
        processors: &[Arc<dyn FrameProcessor>],
        source: Option<&Path>,
        output: &Path,
    ) -> CoreResult<Vec<ProcessorRun>> {
        let mut runs = Vec::with_capacity(processors.len());
        for processor in processors {
            self.status.update(processor.scope(), "Progressing...");
            processor.process_image(source, output, output)?;
            runs.push(ProcessorRun {
                name: processor.name().to_string(),
                summary: DispatchSummary {
                    total_tasks: 1,
                    completed_tasks: 1,
                    processed_frames: 1,
                    ..DispatchSummary::default()
                },
            });
        }
        Ok(runs)
    }

    fn run_video(
        &self,
        job: &ProcessingJob,
        processors: &[Arc<dyn FrameProcessor>],
        output: &Path,
    ) -> CoreResult<JobReport> {
        let target = job.target_path.as_path();
        let source = job.source_path.as_deref();
        let workspace = TempWorkspace::for_target(target);

        self.status.update(SCOPE_CORE, "Creating temp resources...");
        workspace.clean(false)?;
        workspace.create()?;

        extract_frames(&self.gateway, target)?;
        let frames = workspace.list_frames()?;
        if frames.is_empty() {
            return Err(CoreError::FrameExtraction(target.to_path_buf()));
        }
        log::debug!("Extracted {} frames into {}", frames.len(), workspace.path().display());

        let mut runs = Vec::with_capacity(processors.len());
        for processor in processors {
            self.check_cancelled()?;
            let summary = self.dispatch(processor.as_ref(), source, &frames)?;
            if summary.was_cancelled() {
                self.status.warn(SCOPE_CORE, "Processing was cancelled.");
                return Err(CoreError::Cancelled);
            }
            self.check_failure_threshold(processor.name(), &summary)?;
            runs.push(ProcessorRun {
                name: processor.name().to_string(),
                summary,
            });
        }
        self.check_cancelled()?;

        let fps = if self.config.keep_fps {
            self.status.update(SCOPE_CORE, "Detecting fps...");
            self.gateway.detect_fps(target)
        } else {
            FALLBACK_FPS
        };
        create_video(&self.gateway, &self.config, target, fps)?;

        let audio = if self.config.keep_audio {
            if self.config.keep_fps {
                self.status.update(SCOPE_CORE, "Restoring audio...");
            } else {
                self.status.update(
                    SCOPE_CORE,
                    "Restoring audio might cause issues as fps are not kept...",
                );
            }
            restore_audio(&self.gateway, target, output)?
        } else {
            move_temp(target, output)?;
            AudioOutcome::Skipped
        };

        workspace.clean(self.config.keep_frames)?;

        if !is_video(output) {
            self.status.error(SCOPE_CORE, "Processing to video failed!");
            return Err(CoreError::OutputVerification(output.to_path_buf()));
        }
        self.status.update(SCOPE_CORE, "Processing to video succeed!");

        Ok(JobReport::new(
            job,
            output,
            MediaKind::Video,
            frames.len(),
            Some(fps),
            runs,
            Some(audio),
        ))
    }

    fn dispatch(
        &self,
        processor: &dyn FrameProcessor,
        source: Option<&Path>,
        frames: &[PathBuf],
    ) -> CoreResult<DispatchSummary> {
        self.status.update(processor.scope(), "Progressing...");

        let mut progress = ProgressState::new(
            frames.len(),
            ProgressMetadata::from_config(&self.config),
            self.config.show_progress,
        );
        if let Some(callback) = &self.on_progress {
            let callback = Arc::clone(callback);
            progress = progress.with_callback(move |done, total| callback(done, total));
        }

        let summary = process_video_frames(
            source,
            frames,
            |source, paths, progress| processor.process_video(source, paths, progress),
            &progress,
            self.config.execution_threads,
            &self.cancel,
        )?;
        progress.finish();

        if summary.failed_frames > 0 {
            self.status.warn(
                processor.scope(),
                format!("{} of {} frames failed", summary.failed_frames, summary.total_tasks),
            );
        }
        log::info!("[{}] {summary}", processor.scope());
        Ok(summary)
    }

    fn check_failure_threshold(&self, name: &str, summary: &DispatchSummary) -> CoreResult<()> {
        let Some(max_ratio) = self.config.max_failed_frame_ratio else {
            return Ok(());
        };
        if summary.failure_ratio() > max_ratio {
            self.status.error(
                SCOPE_CORE,
                format!(
                    "Too many failed frames in {name}: {} of {}",
                    summary.failed_frames, summary.total_tasks
                ),
            );
            return Err(CoreError::FrameFailureThreshold {
                processor: name.to_string(),
                failed: summary.failed_frames,
                total: summary.total_tasks,
                max_ratio,
            });
        }
        Ok(())
    }

    fn check_cancelled(&self) -> CoreResult<()> {
        if self.cancel.is_cancelled() {
            self.status.warn(SCOPE_CORE, "Processing was cancelled.");
            return Err(CoreError::Cancelled);
        }
        Ok(())
    }

    fn discard_output(&self, output: &Path) {
        if let Err(e) = fs::remove_file(output) {
            log::warn!("Failed to remove partial output {}: {e}", output.display());
        }
    }

    fn discard_workspace(&self, target: &Path) {
        if let Err(e) = TempWorkspace::for_target(target).clean(false) {
            log::warn!("Failed to clean workspace after error: {e}");
        }
    }
}
