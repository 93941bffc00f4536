// ============================================================================
// reframe-core/src/progress.rs
// ============================================================================
//
// PROGRESS REPORTING: Frame Dispatch Progress and Cancellation
//
// ProgressState is the only structure worker threads mutate concurrently.
// The completed counter is atomic; the indicatif bar is internally
// synchronized. Everything else is fixed when the state is created.
//
// CancellationToken is a shared flag the dispatch engine checks before
// starting each frame task.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use indicatif::{ProgressBar, ProgressStyle};

use crate::config::CoreConfig;

const BAR_TEMPLATE: &str =
    "{msg}: {percent:>3}%|{wide_bar}| {pos}/{len} [{elapsed_precise}<{eta_precise}, {per_sec}] {prefix}";

// ============================================================================
// METADATA
// ============================================================================

/// Context shown next to the progress bar. Observability only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressMetadata {
    pub execution_providers: Vec<String>,
    pub execution_threads: usize,
    pub max_memory_gb: Option<u64>,
}

impl ProgressMetadata {
    pub fn from_config(config: &CoreConfig) -> Self {
        Self {
            execution_providers: config.execution_providers.clone(),
            execution_threads: config.execution_threads,
            max_memory_gb: config.max_memory_gb,
        }
    }
}

impl fmt::Display for ProgressMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "execution_providers={:?}, execution_threads={}, max_memory={}",
            self.execution_providers,
            self.execution_threads,
            self.max_memory_gb
                .map_or_else(|| "unbounded".to_string(), |gb| format!("{gb}GB"))
        )
    }
}

// ============================================================================
// PROGRESS STATE
// ============================================================================

type CompletionCallback = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Aggregate frames-completed counter for one dispatch.
pub struct ProgressState {
    total: usize,
    completed: AtomicUsize,
    metadata: ProgressMetadata,
    bar: ProgressBar,
    on_advance: Option<CompletionCallback>,
}

impl ProgressState {
    /// Creates a state for `total` tasks. The bar is only drawn when
    /// `show_bar` is set.
    pub fn new(total: usize, metadata: ProgressMetadata, show_bar: bool) -> Self {
        let bar = if show_bar {
            ProgressBar::new(total as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::with_template(BAR_TEMPLATE) {
            bar.set_style(style);
        }
        bar.set_message("Processing");
        bar.set_prefix(metadata.to_string());

        Self {
            total,
            completed: AtomicUsize::new(0),
            metadata,
            bar,
            on_advance: None,
        }
    }

    /// Hidden progress with default metadata.
    pub fn hidden(total: usize) -> Self {
        Self::new(total, ProgressMetadata::default(), false)
    }

    /// Registers a callback invoked with `(completed, total)` after every
    /// completed task.
    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.on_advance = Some(Box::new(callback));
        self
    }

    /// Records one completed task and returns the new completed count.
    pub fn advance(&self) -> usize {
        let completed = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        self.bar.inc(1);
        if let Some(callback) = &self.on_advance {
            callback(completed, self.total);
        }
        completed
    }

    /// Shows the frame currently being worked on next to the bar.
    pub fn set_message(&self, message: impl Into<String>) {
        self.bar.set_message(message.into());
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn metadata(&self) -> &ProgressMetadata {
        &self.metadata
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl fmt::Debug for ProgressState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressState")
            .field("total", &self.total)
            .field("completed", &self.completed())
            .field("metadata", &self.metadata)
            .finish()
    }
}

// ============================================================================
// CANCELLATION
// ============================================================================

/// Cooperative cancellation flag shared between the caller and workers.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::thread;

    #[test]
    fn test_concurrent_advance_counts_every_task() {
        let progress = Arc::new(ProgressState::hidden(800));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let progress = Arc::clone(&progress);
                thread::spawn(move || {
                    for _ in 0..100 {
                        progress.advance();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(progress.completed(), 800);
    }

    #[test]
    fn test_callback_sees_running_count() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress = ProgressState::hidden(2)
            .with_callback(move |done, total| sink.lock().unwrap().push((done, total)));
        progress.advance();
        progress.advance();
        assert_eq!(*seen.lock().unwrap(), vec![(1, 2), (2, 2)]);
    }

    #[test]
    fn test_metadata_display() {
        let metadata = ProgressMetadata {
            execution_providers: vec!["cuda".to_string()],
            execution_threads: 4,
            max_memory_gb: Some(16),
        };
        assert_eq!(
            metadata.to_string(),
            "execution_providers=[\"cuda\"], execution_threads=4, max_memory=16GB"
        );
    }

    #[test]
    fn test_cancellation_is_shared() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
