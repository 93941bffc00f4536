// ============================================================================
// reframe-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Custom Error Types for reframe-core
//
// This module defines the error type used throughout the library. Errors fall
// into three groups:
// - Startup-fatal: an unresolvable processor name. Nothing is attempted.
// - Job-level: extraction, assembly, or a missing intermediate artifact. The
//   job aborts and the error is surfaced to the caller.
// - Setup: configuration, logging, and worker pool construction.
//
// Frame-level failures and the degraded fallbacks (silent video, fixed fps)
// never become errors. They are logged and counted instead.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Custom error type for reframe-core.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Required dependency '{0}' not found. Please install it and ensure it's in your PATH.")]
    DependencyNotFound(String),

    #[error("Failed to start command '{0}': {1}")]
    CommandStart(String, io::Error),

    #[error("Failed while waiting for command '{0}': {1}")]
    CommandWait(String, io::Error),

    #[error("Command '{0}' failed: {1}")]
    CommandFailed(String, String),

    #[error("ffprobe output could not be used: {0}")]
    FfprobeParse(String),

    #[error("Unknown frame processor '{0}'")]
    UnknownProcessor(String),

    #[error("Frame processor '{processor}' failed its {check} check")]
    PreconditionFailed {
        processor: String,
        check: &'static str,
    },

    #[error("Frame processor '{processor}' failed: {message}")]
    Processor { processor: String, message: String },

    #[error("Failed to extract frames from {}", .0.display())]
    FrameExtraction(PathBuf),

    #[error("Failed to create video at {}", .0.display())]
    VideoAssembly(PathBuf),

    #[error("Temporary output file not found: {}. Ensure that frames were extracted and the video was created successfully.", .0.display())]
    MissingIntermediate(PathBuf),

    #[error("Output was not produced as expected: {}", .0.display())]
    OutputVerification(PathBuf),

    #[error("Output path is the target itself: {}", .0.display())]
    OutputIsTarget(PathBuf),

    #[error("Target is neither an image nor a video: {}", .0.display())]
    UnsupportedTarget(PathBuf),

    #[error("{failed} of {total} frames failed in processor '{processor}', above the allowed ratio of {max_ratio}")]
    FrameFailureThreshold {
        processor: String,
        failed: usize,
        total: usize,
        max_ratio: f64,
    },

    #[error("Processing was cancelled")]
    Cancelled,

    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl CoreError {
    /// Returns true for errors that indicate a misconfigured processor set.
    ///
    /// These are raised before any workspace is created, and callers should
    /// treat them as fatal rather than retrying the job.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CoreError::UnknownProcessor(_))
    }
}

/// Result type for reframe-core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Helper for the common "command could not be spawned" case.
pub(crate) fn command_start_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandStart(cmd.into(), err)
}

pub(crate) fn command_wait_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandWait(cmd.into(), err)
}

pub(crate) fn command_failed_error(cmd: impl Into<String>, message: impl Into<String>) -> CoreError {
    CoreError::CommandFailed(cmd.into(), message.into())
}
