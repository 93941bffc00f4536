//! Temporary workspace management.
//!
//! Every target gets a deterministic scratch directory next to it:
//! `<target dir>/temp/<target stem>/`. Extracted frames (`0001.png`, ...) and
//! the silent assembled video (`temp.mp4`) live there until the job cleans up.
//!
//! Paths are derived purely from the target path, so two jobs against
//! different targets never share a workspace. They may share the `temp`
//! parent, which is only removed once it is empty.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::CoreResult;

/// Name of the scratch root created next to each target.
pub const TEMP_ROOT_NAME: &str = "temp";

/// Extension of extracted frame artifacts.
pub const FRAME_EXTENSION: &str = "png";

/// ffmpeg output pattern for frame artifacts: four digit, zero padded.
pub const FRAME_PATTERN: &str = "%04d.png";

/// File name of the assembled video inside the workspace.
pub const TEMP_OUTPUT_NAME: &str = "temp.mp4";

/// Returns `dirname(target)/temp/basename_without_ext(target)`. Does no I/O.
pub fn workspace_path(target: &Path) -> PathBuf {
    let parent = target.parent().unwrap_or_else(|| Path::new(""));
    let stem = target.file_stem().unwrap_or_default();
    parent.join(TEMP_ROOT_NAME).join(stem)
}

/// Per-target scratch directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempWorkspace {
    path: PathBuf,
}

impl TempWorkspace {
    pub fn for_target(target: &Path) -> Self {
        Self {
            path: workspace_path(target),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the assembled (silent) video.
    pub fn temp_output_path(&self) -> PathBuf {
        self.path.join(TEMP_OUTPUT_NAME)
    }

    /// ffmpeg pattern that reads or writes the numbered frame sequence.
    pub fn frame_pattern(&self) -> PathBuf {
        self.path.join(FRAME_PATTERN)
    }

    /// Creates the workspace and any missing parents. Idempotent.
    pub fn create(&self) -> CoreResult<()> {
        fs::create_dir_all(&self.path)?;
        log::debug!("Workspace ready at {}", self.path.display());
        Ok(())
    }

    /// Removes the workspace unless `keep_frames` is set, then removes the
    /// shared `temp` parent if that left it empty.
    ///
    /// Absent directories are not an error.
    pub fn clean(&self, keep_frames: bool) -> CoreResult<()> {
        if !keep_frames {
            match fs::remove_dir_all(&self.path) {
                Ok(()) => log::debug!("Removed workspace {}", self.path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        if let Some(parent) = self.path.parent() {
            remove_dir_if_empty(parent)?;
        }
        Ok(())
    }

    /// Lists frame artifacts in lexical (and therefore numeric) order.
    ///
    /// Returns an empty list if the workspace does not exist.
    pub fn list_frames(&self) -> CoreResult<Vec<PathBuf>> {
        let read_dir = match fs::read_dir(&self.path) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut frames = Vec::new();
        for entry in read_dir {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let is_frame = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == FRAME_EXTENSION);
            if is_frame {
                frames.push(path);
            }
        }
        frames.sort();
        Ok(frames)
    }
}

/// Removes `dir` only if it exists and has no entries. Another job may be
/// writing into it concurrently, so "not empty" is not an error either.
fn remove_dir_if_empty(dir: &Path) -> CoreResult<()> {
    let mut entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    if entries.next().is_some() {
        return Ok(());
    }
    match fs::remove_dir(dir) {
        Ok(()) => {
            log::debug!("Removed empty scratch root {}", dir.display());
            Ok(())
        }
        Err(e)
            if e.kind() == io::ErrorKind::NotFound
                || e.kind() == io::ErrorKind::DirectoryNotEmpty =>
        {
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
