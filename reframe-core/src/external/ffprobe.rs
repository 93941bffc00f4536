//! Frame-rate probing.
//!
//! `detect_fps` is lenient: if ffprobe cannot be run, fails, finds no video
//! stream, or reports anything other than a `numerator/denominator` rational, the
//! pipeline assembles at [`FALLBACK_FPS`]. Callers that need the true rate
//! must not rely on this function to surface probe errors.

use std::path::Path;

use super::Gateway;
use crate::status::SCOPE_FFMPEG;

/// Frame rate used whenever the probe result cannot be used.
pub const FALLBACK_FPS: f64 = 30.0;

/// Parses an ffprobe `r_frame_rate` value such as `30000/1001`.
///
/// Returns `None` for anything that is not two integers separated by a
/// single slash, and for a zero denominator.
pub fn parse_frame_rate(raw: &str) -> Option<f64> {
    let (num, den) = raw.trim().split_once('/')?;
    let num: i64 = num.trim().parse().ok()?;
    let den: i64 = den.trim().parse().ok()?;
    if den == 0 {
        return None;
    }
    Some(num as f64 / den as f64)
}

impl Gateway {
    /// Detects the frame rate of `target`, or returns [`FALLBACK_FPS`].
    pub fn detect_fps(&self, target: &Path) -> f64 {
        let raw = match self.transcoder.probe_frame_rate(target) {
            Ok(raw) => raw,
            Err(e) => {
                self.status.warn(
                    SCOPE_FFMPEG,
                    format!(
                        "Frame rate probe failed for {}: {e}. Falling back to {FALLBACK_FPS} fps.",
                        target.display()
                    ),
                );
                return FALLBACK_FPS;
            }
        };

        match parse_frame_rate(&raw) {
            Some(fps) => {
                log::debug!("Detected {fps} fps for {}", target.display());
                fps
            }
            None => {
                self.status.warn(
                    SCOPE_FFMPEG,
                    format!(
                        "Unrecognized frame rate '{}' for {}. Falling back to {FALLBACK_FPS} fps.",
                        raw.trim(),
                        target.display()
                    ),
                );
                FALLBACK_FPS
            }
        }
    }
}
