//! Scoped status reporting.
//!
//! Every status update is written through the `log` facade as
//! `[SCOPE] message` and then forwarded to an optional UI callback. The
//! channel is observability only; nothing reads state back from it.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Scope for orchestrator messages.
pub const SCOPE_CORE: &str = "REFRAME.CORE";

/// Scope for transcoder diagnostics.
pub const SCOPE_FFMPEG: &str = "REFRAME.FFMPEG";

/// Severity of a status update. Decides which `log` macro is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Debug,
    Info,
    Warning,
    Error,
}

type UiCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Handle to the status channel. Cheap to clone and safe to share across
/// worker threads.
#[derive(Clone, Default)]
pub struct StatusReporter {
    ui: Option<UiCallback>,
}

impl fmt::Debug for StatusReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusReporter")
            .field("has_ui", &self.ui.is_some())
            .finish()
    }
}

impl StatusReporter {
    /// Reporter that only logs.
    pub fn headless() -> Self {
        Self::default()
    }

    /// Reporter that also forwards each message to `callback`.
    pub fn with_ui<F>(callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            ui: Some(Arc::new(callback)),
        }
    }

    pub fn update(&self, scope: &str, message: impl AsRef<str>) {
        self.emit(StatusLevel::Info, scope, message.as_ref());
    }

    pub fn debug(&self, scope: &str, message: impl AsRef<str>) {
        self.emit(StatusLevel::Debug, scope, message.as_ref());
    }

    pub fn warn(&self, scope: &str, message: impl AsRef<str>) {
        self.emit(StatusLevel::Warning, scope, message.as_ref());
    }

    pub fn error(&self, scope: &str, message: impl AsRef<str>) {
        self.emit(StatusLevel::Error, scope, message.as_ref());
    }

    fn emit(&self, level: StatusLevel, scope: &str, message: &str) {
        match level {
            StatusLevel::Debug => log::debug!("[{scope}] {message}"),
            StatusLevel::Info => log::info!("[{scope}] {message}"),
            StatusLevel::Warning => log::warn!("[{scope}] {message}"),
            StatusLevel::Error => log::error!("[{scope}] {message}"),
        }

        // Per-frame debug chatter stays out of the UI.
        if level == StatusLevel::Debug {
            return;
        }
        if let Some(ui) = &self.ui {
            if panic::catch_unwind(AssertUnwindSafe(|| ui(message))).is_err() {
                log::error!("[{scope}] Failed to update status: UI callback panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_ui_callback_receives_messages() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let status = StatusReporter::with_ui(move |msg| sink.lock().unwrap().push(msg.to_string()));

        status.update(SCOPE_CORE, "Extracting frames...");
        status.debug(SCOPE_CORE, "not forwarded");
        status.warn(SCOPE_FFMPEG, "FFmpeg error: boom");

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec!["Extracting frames...".to_string(), "FFmpeg error: boom".to_string()]
        );
    }

    #[test]
    fn test_panicking_ui_callback_is_contained() {
        let status = StatusReporter::with_ui(|_| panic!("ui went away"));
        status.update(SCOPE_CORE, "still fine");
    }
}
