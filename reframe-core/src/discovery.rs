//! Media kind detection.
//!
//! Targets are classified by extension (case-insensitive). `is_image` and
//! `is_video` additionally require the path to be an existing file.

use std::path::Path;

/// Extensions treated as still images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "webp"];

/// Extensions treated as videos.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm", "flv"];

/// What kind of media a target is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

fn extension_in(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| allowed.iter().any(|a| ext.eq_ignore_ascii_case(a)))
}

/// True if `path` has an image extension. Does not touch the filesystem.
#[must_use]
pub fn has_image_extension(path: &Path) -> bool {
    extension_in(path, IMAGE_EXTENSIONS)
}

/// True if `path` is an existing file with an image extension.
#[must_use]
pub fn is_image(path: &Path) -> bool {
    path.is_file() && has_image_extension(path)
}

/// True if `path` is an existing file with a video extension.
#[must_use]
pub fn is_video(path: &Path) -> bool {
    path.is_file() && extension_in(path, VIDEO_EXTENSIONS)
}

/// Classifies an existing target, or `None` if it is neither.
pub fn media_kind(path: &Path) -> Option<MediaKind> {
    if is_image(path) {
        Some(MediaKind::Image)
    } else if is_video(path) {
        Some(MediaKind::Video)
    } else {
        None
    }
}
