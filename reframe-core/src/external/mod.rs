// ============================================================================
// reframe-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with ffmpeg and ffprobe
//
// This module encapsulates every external tool the pipeline launches. The
// `Transcoder` trait is the seam: production code uses `SidecarTranscoder`,
// which drives ffmpeg through the ffmpeg-sidecar crate and reads stream
// metadata through the ffprobe crate, while tests inject their own
// implementation.
//
// KEY COMPONENTS:
// - Transcoder: trait for running ffmpeg and probing a target's frame rate
// - SidecarTranscoder: ffmpeg-sidecar / ffprobe implementation
// - Gateway: adds the fixed ffmpeg flags, turns exit codes into a boolean,
//   and reports failures on the status channel
// - check_dependency: verifies a binary can be started

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use ::ffprobe::FfProbeError;

use crate::config::CoreConfig;
use crate::error::{
    CoreError, CoreResult, command_failed_error, command_start_error, command_wait_error,
};
use crate::status::StatusReporter;
use crate::util::command::{CommandOutput, format_command};

/// Fixed ffmpeg flags and `Gateway::run_transcode`.
pub mod ffmpeg;

/// Frame-rate probing with a lenient fallback.
pub mod ffprobe;

pub use self::ffmpeg::FFMPEG_FIXED_FLAGS;
pub use self::ffprobe::{FALLBACK_FPS, parse_frame_rate};

// ============================================================================
// TRANSCODER ABSTRACTION
// ============================================================================

/// Something that can run ffmpeg and probe media.
pub trait Transcoder: Send + Sync {
    /// Runs ffmpeg with the complete argument list.
    ///
    /// The gateway has already prepended its fixed flags; implementations
    /// must not add arguments of their own. A non-zero exit is reported
    /// through `CommandOutput`, not as `Err`; `Err` means ffmpeg could not
    /// be run at all.
    fn ffmpeg(&self, args: &[String]) -> CoreResult<CommandOutput>;

    /// Returns the raw `r_frame_rate` of the first video stream of `target`,
    /// e.g. `30000/1001`.
    fn probe_frame_rate(&self, target: &Path) -> CoreResult<String>;
}

/// Transcoder backed by the ffmpeg-sidecar and ffprobe crates.
#[derive(Debug, Clone)]
pub struct SidecarTranscoder {
    ffmpeg_path: PathBuf,
    ffprobe_path: PathBuf,
}

impl SidecarTranscoder {
    pub fn new(ffmpeg_path: impl Into<PathBuf>, ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(&config.ffmpeg_path, &config.ffprobe_path)
    }

    /// Verifies that both binaries can be started.
    pub fn check_dependencies(&self) -> CoreResult<()> {
        check_dependency(&self.ffmpeg_path)?;
        check_dependency(&self.ffprobe_path)?;
        Ok(())
    }
}

impl Default for SidecarTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl Transcoder for SidecarTranscoder {
    fn ffmpeg(&self, args: &[String]) -> CoreResult<CommandOutput> {
        log::debug!("Running ffmpeg (sidecar): {}", format_command(&self.ffmpeg_path, args));

        let mut cmd = FfmpegCommand::new_with_path(&self.ffmpeg_path);
        cmd.args(args);
        let mut child = cmd
            .spawn()
            .map_err(|e| command_start_error("ffmpeg (sidecar)", e))?;

        let mut stderr_buffer = String::new();
        let events = child.iter().map_err(|e| {
            command_failed_error("ffmpeg (sidecar)", format!("Failed to get event iterator: {e}"))
        })?;
        for event in events {
            match event {
                FfmpegEvent::Log(_level, message) => {
                    stderr_buffer.push_str(&message);
                    stderr_buffer.push('\n');
                }
                FfmpegEvent::Error(error) => {
                    stderr_buffer.push_str(&format!("ERROR: {error}\n"));
                }
                _ => {}
            }
        }

        let status = child
            .wait()
            .map_err(|e| command_wait_error("ffmpeg (sidecar)", e))?;
        Ok(CommandOutput {
            exit_code: status.code(),
            stdout: String::new(),
            stderr: stderr_buffer,
        })
    }

    fn probe_frame_rate(&self, target: &Path) -> CoreResult<String> {
        log::debug!(
            "Running ffprobe (via crate) for frame rate on: {}",
            target.display()
        );
        let config = ::ffprobe::Config::builder()
            .ffprobe_bin(&self.ffprobe_path)
            .build();
        let metadata = ::ffprobe::ffprobe_config(config, target)
            .map_err(|e| map_ffprobe_error(e, "frame rate"))?;

        metadata
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .map(|s| s.r_frame_rate.clone())
            .ok_or_else(|| {
                CoreError::FfprobeParse(format!("No video stream found in {}", target.display()))
            })
    }
}

fn map_ffprobe_error(err: FfProbeError, context: &str) -> CoreError {
    match err {
        FfProbeError::Io(io_err) => command_start_error(format!("ffprobe ({context})"), io_err),
        FfProbeError::Status(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            command_failed_error(format!("ffprobe ({context})"), stderr.trim().to_string())
        }
        FfProbeError::Deserialize(err) => {
            CoreError::FfprobeParse(format!("ffprobe {context} output deserialization: {err}"))
        }
        _ => CoreError::FfprobeParse(format!("Unknown ffprobe error during {context}: {err:?}")),
    }
}

// ============================================================================
// GATEWAY
// ============================================================================

/// The pipeline's only route to the external tools.
///
/// Nothing on the gateway returns an error: failed runs come back as
/// `false` (or the fallback frame rate) and are logged on the status channel.
#[derive(Clone)]
pub struct Gateway {
    transcoder: Arc<dyn Transcoder>,
    log_level: String,
    status: StatusReporter,
}

impl Gateway {
    pub fn new(
        transcoder: Arc<dyn Transcoder>,
        log_level: impl Into<String>,
        status: StatusReporter,
    ) -> Self {
        Self {
            transcoder,
            log_level: log_level.into(),
            status,
        }
    }

    /// Gateway over the sidecar transcoder, using the binaries and log level from
    /// `config`.
    pub fn from_config(config: &CoreConfig, status: StatusReporter) -> Self {
        Self::new(
            Arc::new(SidecarTranscoder::from_config(config)),
            config.ffmpeg_log_level.clone(),
            status,
        )
    }

    pub fn status(&self) -> &StatusReporter {
        &self.status
    }
}

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks if a required external command is available and executable.
///
/// Runs `<cmd> -version` and only looks at whether the process could start.
///
/// # Returns
///
/// * `Ok(())` - The command started
/// * `Err(CoreError::DependencyNotFound)` - The command does not exist
/// * `Err(CoreError::CommandStart)` - The command exists but failed to start
pub fn check_dependency(cmd: &Path) -> CoreResult<()> {
    let name = cmd.display().to_string();
    let result = Command::new(cmd)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {}", name);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{}' not found.", name);
            Err(CoreError::DependencyNotFound(name))
        }
        Err(e) => {
            log::error!("Failed to start dependency check command '{}': {}", name, e);
            Err(CoreError::CommandStart(name, e))
        }
    }
}
