//! Audio restoration.
//!
//! Frames carry no audio, so the assembled video is silent. This stage copies
//! its picture stream untouched and takes the first audio stream from the
//! original target. When that fails (the target has no audio, or a stream
//! ffmpeg cannot remux) the silent video is delivered instead; a missing
//! audio track never fails a job.

use std::fmt;
use std::path::Path;

use super::output::move_temp;
use crate::error::CoreResult;
use crate::external::Gateway;
use crate::status::SCOPE_CORE;
use crate::temp_files::TempWorkspace;

/// What ended up at the output path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioOutcome {
    /// Processed video with the target's audio.
    Restored,
    /// Remux failed; the silent processed video was moved into place.
    SilentFallback,
    /// Audio was not requested; the silent processed video was moved into place.
    Skipped,
}

impl fmt::Display for AudioOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AudioOutcome::Restored => "restored",
            AudioOutcome::SilentFallback => "silent (restore failed)",
            AudioOutcome::Skipped => "silent (not requested)",
        };
        f.write_str(text)
    }
}

/// ffmpeg arguments (after the fixed prefix) for the audio remux.
pub fn restore_audio_args(target: &Path, output: &Path) -> Vec<String> {
    let temp_output = TempWorkspace::for_target(target).temp_output_path();
    vec![
        "-i".to_string(),
        temp_output.to_string_lossy().into_owned(),
        "-i".to_string(),
        target.to_string_lossy().into_owned(),
        "-c:v".to_string(),
        "copy".to_string(),
        "-map".to_string(),
        "0:v:0".to_string(),
        "-map".to_string(),
        "1:a:0".to_string(),
        "-y".to_string(),
        output.to_string_lossy().into_owned(),
    ]
}

/// Writes the processed video of `target` to `output` with the target's
/// audio, or without it if the remux fails.
///
/// Only fails if the fallback itself cannot deliver the silent video.
pub fn restore_audio(gateway: &Gateway, target: &Path, output: &Path) -> CoreResult<AudioOutcome> {
    if gateway.run_transcode(&restore_audio_args(target, output)) {
        log::debug!("Audio restored into {}", output.display());
        return Ok(AudioOutcome::Restored);
    }

    gateway.status().warn(
        SCOPE_CORE,
        "Restoring audio failed, delivering the processed video without audio.",
    );
    move_temp(target, output)?;
    Ok(AudioOutcome::SilentFallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_audio_args_map_video_then_audio() {
        let args = restore_audio_args(Path::new("/m/clip.mp4"), Path::new("/out/final.mp4"));
        assert_eq!(
            args,
            vec![
                "-i",
                "/m/temp/clip/temp.mp4",
                "-i",
                "/m/clip.mp4",
                "-c:v",
                "copy",
                "-map",
                "0:v:0",
                "-map",
                "1:a:0",
                "-y",
                "/out/final.mp4",
            ]
        );
    }
}
