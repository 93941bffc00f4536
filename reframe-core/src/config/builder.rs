// ============================================================================
// reframe-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for CoreConfig
//
// Fluent API for assembling a CoreConfig. Every field starts at its default,
// so callers only name what they change.

use std::path::PathBuf;

use super::CoreConfig;

/// Builder for creating CoreConfig instances.
///
/// # Examples
///
/// ```rust
/// use reframe_core::config::CoreConfigBuilder;
///
/// let config = CoreConfigBuilder::new()
///     .execution_threads(2)
///     .frame_processors(["color_invert"])
///     .keep_audio(false)
///     .build();
/// assert_eq!(config.frame_processors, vec!["color_invert".to_string()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
}

impl CoreConfigBuilder {
    /// Creates a new CoreConfigBuilder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the worker pool size used during frame dispatch.
    pub fn execution_threads(mut self, threads: usize) -> Self {
        self.config.execution_threads = threads;
        self
    }

    /// Sets the backend identifiers shown alongside progress.
    pub fn execution_providers<I, S>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.execution_providers = providers.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the memory budget (in GB) shown alongside progress.
    pub fn max_memory_gb(mut self, gb: u64) -> Self {
        self.config.max_memory_gb = Some(gb);
        self
    }

    /// Sets the ffmpeg video encoder.
    ///
    /// # Arguments
    ///
    /// * `encoder` - Any encoder name ffmpeg accepts for `-c:v`
    pub fn video_encoder(mut self, encoder: impl Into<String>) -> Self {
        self.config.video_encoder = encoder.into();
        self
    }

    /// Sets the CRF value for the reassembled video.
    pub fn video_quality(mut self, crf: u8) -> Self {
        self.config.video_quality = crf;
        self
    }

    /// Sets the ffmpeg `-loglevel` value.
    pub fn ffmpeg_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.ffmpeg_log_level = level.into();
        self
    }

    pub fn keep_fps(mut self, keep: bool) -> Self {
        self.config.keep_fps = keep;
        self
    }

    pub fn keep_audio(mut self, keep: bool) -> Self {
        self.config.keep_audio = keep;
        self
    }

    pub fn keep_frames(mut self, keep: bool) -> Self {
        self.config.keep_frames = keep;
        self
    }

    /// Sets the processors requested at startup, in application order.
    pub fn frame_processors<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.frame_processors = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn ffmpeg_path(mut self, path: PathBuf) -> Self {
        self.config.ffmpeg_path = path;
        self
    }

    pub fn ffprobe_path(mut self, path: PathBuf) -> Self {
        self.config.ffprobe_path = path;
        self
    }

    pub fn models_dir(mut self, path: PathBuf) -> Self {
        self.config.models_dir = path;
        self
    }

    /// Aborts a job once more than `ratio` of its frames fail in one processor.
    pub fn max_failed_frame_ratio(mut self, ratio: f64) -> Self {
        self.config.max_failed_frame_ratio = Some(ratio);
        self
    }

    pub fn clean_on_failure(mut self, clean: bool) -> Self {
        self.config.clean_on_failure = clean;
        self
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.config.show_progress = show;
        self
    }

    /// Builds the CoreConfig.
    pub fn build(self) -> CoreConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_only_named_fields() {
        let config = CoreConfigBuilder::new()
            .execution_threads(2)
            .video_quality(30)
            .max_failed_frame_ratio(0.25)
            .build();

        let defaults = CoreConfig::default();
        assert_eq!(config.execution_threads, 2);
        assert_eq!(config.video_quality, 30);
        assert_eq!(config.max_failed_frame_ratio, Some(0.25));
        assert_eq!(config.video_encoder, defaults.video_encoder);
        assert_eq!(config.keep_audio, defaults.keep_audio);
    }
}
