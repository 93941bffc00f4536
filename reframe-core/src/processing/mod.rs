//! Job-level processing stages and their orchestration.
//!
//! Each stage lives in its own submodule and talks to ffmpeg only through the
//! [`Gateway`](crate::external::Gateway). The [`Pipeline`] runs them in order:
//! extraction, per-processor dispatch, assembly, audio restoration, output.

/// Frame extraction from the target and video assembly from the frames
pub mod frames;

/// Bounded worker-pool fan-out of frame tasks
pub mod dispatch;

/// Remuxing the original audio back onto the processed video
pub mod audio;

/// Moving the finished artifact into place and output path naming
pub mod output;

/// Whole-job orchestration
pub mod video;

pub use audio::{AudioOutcome, restore_audio};
pub use dispatch::{DispatchSummary, TaskOutcome, process_video_frames};
pub use frames::{create_video, extract_frames};
pub use output::{is_same_file, move_temp, normalize_output_path};
pub use video::Pipeline;
