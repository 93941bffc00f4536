use log::LevelFilter;
use log4rs::{
    append::file::FileAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};
use std::path::Path;

use crate::error::{CoreError, CoreResult};

/// Installs a global `log4rs` logger writing to `log_file`.
///
/// Fails if another global logger is already installed.
pub fn setup_file_logging(log_file: &Path, log_level: LevelFilter) -> CoreResult<()> {
    // Create log directory if it doesn't exist
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Status lines already carry their scope, so the pattern stays minimal.
    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] {m}{n}",
        )))
        .build(log_file)
        .map_err(CoreError::Io)?;

    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(file_appender)))
        .build(Root::builder().appender("file").build(log_level))
        .map_err(|e| CoreError::Logging(e.to_string()))?;

    log4rs::init_config(config).map_err(|e| CoreError::Logging(e.to_string()))?;

    Ok(())
}
