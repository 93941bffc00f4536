//! File logging installs a process-wide logger, so it gets its own test
//! binary.

use log::LevelFilter;
use reframe_core::file_logging::{default_log_file, setup_file_logging};
use reframe_core::status::{SCOPE_CORE, StatusReporter};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[test]
fn test_status_lines_reach_log_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let log_file = default_log_file(&dir.path().join("logs"), Path::new("/media/clip.mp4"));

    setup_file_logging(&log_file, LevelFilter::Info)?;
    let status = StatusReporter::headless();
    status.update(SCOPE_CORE, "Extracting frames...");
    status.debug(SCOPE_CORE, "below the file level");
    log::logger().flush();

    let contents = fs::read_to_string(&log_file)?;
    assert!(contents.contains("[INFO] [REFRAME.CORE] Extracting frames..."));
    assert!(!contents.contains("below the file level"));

    // A second global logger cannot be installed.
    assert!(setup_file_logging(&dir.path().join("other.log"), LevelFilter::Info).is_err());
    Ok(())
}
