//! Output finalization.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};
use crate::temp_files::TempWorkspace;

/// Moves the assembled temporary video of `target` to `output`, replacing
/// any existing file there.
///
/// Fails with `MissingIntermediate` if the temporary video was never
/// produced. Falls back to copy-and-delete when a rename is not possible,
/// e.g. across filesystems.
pub fn move_temp(target: &Path, output: &Path) -> CoreResult<()> {
    let temp_output = TempWorkspace::for_target(target).temp_output_path();
    if !temp_output.is_file() {
        return Err(CoreError::MissingIntermediate(temp_output));
    }

    match fs::remove_file(output) {
        Ok(()) => log::debug!("Replaced existing output {}", output.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    if let Err(e) = fs::rename(&temp_output, output) {
        log::debug!(
            "Rename of {} failed ({e}), copying instead",
            temp_output.display()
        );
        fs::copy(&temp_output, output)?;
        fs::remove_file(&temp_output)?;
    }
    Ok(())
}

/// True if `a` and `b` name the same existing file, through links and
/// relative components. Paths that cannot be resolved are never the same.
pub fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Resolves the final output path for a job.
///
/// When `output` is an existing directory and both a source and a target are
/// known, the file name becomes `{source stem}-{target stem}{target ext}`
/// inside it. Otherwise `output` is returned unchanged.
pub fn normalize_output_path(source: Option<&Path>, target: &Path, output: &Path) -> PathBuf {
    let Some(source) = source else {
        return output.to_path_buf();
    };
    if source.as_os_str().is_empty() || target.as_os_str().is_empty() || !output.is_dir() {
        return output.to_path_buf();
    }

    let source_stem = source.file_stem().unwrap_or_default().to_string_lossy();
    let target_stem = target.file_stem().unwrap_or_default().to_string_lossy();
    let extension = target
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    output.join(format!("{source_stem}-{target_stem}{extension}"))
}
