//! ffmpeg invocation through the gateway.

use super::Gateway;
use crate::status::SCOPE_FFMPEG;

/// Flags placed before every caller-supplied ffmpeg argument. The log level
/// follows them.
pub const FFMPEG_FIXED_FLAGS: &[&str] = &["-hide_banner", "-hwaccel", "auto"];

impl Gateway {
    /// Fixed prefix for every ffmpeg invocation, log level included.
    pub fn ffmpeg_prefix(&self) -> Vec<String> {
        let mut prefix: Vec<String> = FFMPEG_FIXED_FLAGS.iter().map(|s| s.to_string()).collect();
        prefix.push("-loglevel".to_string());
        prefix.push(self.log_level.clone());
        prefix
    }

    /// Runs ffmpeg with the fixed prefix followed by `args`.
    ///
    /// Returns true iff ffmpeg exited with status 0. On any other outcome the
    /// captured output is reported on the status channel and false is
    /// returned; this never fails with an error.
    pub fn run_transcode(&self, args: &[String]) -> bool {
        let mut full_args = self.ffmpeg_prefix();
        full_args.extend_from_slice(args);

        match self.transcoder.ffmpeg(&full_args) {
            Ok(output) if output.success() => true,
            Ok(output) => {
                let code = output
                    .exit_code
                    .map_or_else(|| "signal".to_string(), |c| c.to_string());
                self.status.error(
                    SCOPE_FFMPEG,
                    format!("FFmpeg error (exit {code}): {}", output.combined()),
                );
                false
            }
            Err(e) => {
                self.status.error(SCOPE_FFMPEG, format!("FFmpeg error: {e}"));
                false
            }
        }
    }
}
