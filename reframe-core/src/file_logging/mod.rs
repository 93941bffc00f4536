//! Per-job file logging.
//!
//! The library itself only talks to the `log` facade. Embedders that want a
//! log file per job can install a `log4rs` file appender through
//! [`setup_file_logging`]; the default file name carries a local timestamp.

mod setup;

use std::path::{Path, PathBuf};

pub use setup::setup_file_logging;

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Builds `<log_dir>/reframe_<target stem>_<timestamp>.log`.
pub fn default_log_file(log_dir: &Path, target: &Path) -> PathBuf {
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "job".to_string());
    log_dir.join(format!("reframe_{stem}_{}.log", get_timestamp()))
}
