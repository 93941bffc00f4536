// ============================================================================
// reframe-core/src/processing/dispatch.rs
// ============================================================================
//
// DISPATCH ENGINE: Bounded Fan-Out of Frame Tasks
//
// One task per frame path runs on a dedicated rayon pool sized by the
// configured thread budget. Each task hands a single-element batch to the
// processor's batch function. Tasks are isolated from each other:
// - a batch function reports its own read/transform failures in BatchReport
// - a panic is caught at the task boundary and recorded as a failed frame
// - a cancelled token makes every task that has not started yet a no-op
//
// The call returns only after every task has settled, so assembly can never
// observe a half-processed frame set.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::error::{CoreError, CoreResult};
use crate::processors::BatchReport;
use crate::progress::{CancellationToken, ProgressState};

// ============================================================================
// TASK RESULTS
// ============================================================================

/// How a single frame task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The batch function returned; failures inside it are in the report.
    Completed(BatchReport),
    /// The batch function panicked.
    Panicked(String),
    /// Skipped because cancellation was requested before it started.
    Cancelled,
}

/// Aggregate of every task in one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
    pub cancelled_tasks: usize,
    pub processed_frames: usize,
    pub failed_frames: usize,
}

impl DispatchSummary {
    /// Folds per-task outcomes into a summary.
    pub fn from_outcomes(outcomes: &[TaskOutcome]) -> Self {
        let mut summary = Self {
            total_tasks: outcomes.len(),
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome {
                TaskOutcome::Completed(report) => {
                    summary.completed_tasks += 1;
                    summary.processed_frames += report.processed;
                    summary.failed_frames += report.failed;
                }
                TaskOutcome::Panicked(_) => {
                    summary.failed_tasks += 1;
                    summary.failed_frames += 1;
                }
                TaskOutcome::Cancelled => summary.cancelled_tasks += 1,
            }
        }
        summary
    }

    /// Tasks that ran to an end, successful or not.
    pub fn settled_tasks(&self) -> usize {
        self.completed_tasks + self.failed_tasks
    }

    /// Failed frames over all frames dispatched. Zero for an empty dispatch.
    pub fn failure_ratio(&self) -> f64 {
        if self.total_tasks == 0 {
            return 0.0;
        }
        self.failed_frames as f64 / self.total_tasks as f64
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled_tasks > 0
    }
}

impl fmt::Display for DispatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frames processed, {} failed, {} cancelled ({} tasks)",
            self.processed_frames, self.failed_frames, self.cancelled_tasks, self.total_tasks
        )
    }
}

// ============================================================================
// DISPATCH
// ============================================================================

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn run_task<F>(
    source: Option<&Path>,
    frame_path: &PathBuf,
    batch_fn: &F,
    progress: &ProgressState,
    cancel: &CancellationToken,
) -> TaskOutcome
where
    F: Fn(Option<&Path>, &[PathBuf], &ProgressState) -> BatchReport + Sync,
{
    if cancel.is_cancelled() {
        return TaskOutcome::Cancelled;
    }

    let batch = std::slice::from_ref(frame_path);
    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| batch_fn(source, batch, progress))) {
        Ok(report) => TaskOutcome::Completed(report),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            log::error!("Frame task for {} panicked: {}", frame_path.display(), message);
            TaskOutcome::Panicked(message)
        }
    };
    progress.advance();
    outcome
}

/// Applies `batch_fn` to every frame in `frame_paths` on a pool of `threads`
/// workers and waits for all of them.
///
/// Frame failures never fail the call; they are counted in the returned
/// summary. The only error is failing to build the pool. `progress` is
/// advanced once for every task that ran, whether it succeeded or not.
pub fn process_video_frames<F>(
    source: Option<&Path>,
    frame_paths: &[PathBuf],
    batch_fn: F,
    progress: &ProgressState,
    threads: usize,
    cancel: &CancellationToken,
) -> CoreResult<DispatchSummary>
where
    F: Fn(Option<&Path>, &[PathBuf], &ProgressState) -> BatchReport + Sync,
{
    let threads = threads.max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|index| format!("reframe-worker-{index}"))
        .build()
        .map_err(|e| CoreError::WorkerPool(e.to_string()))?;

    log::debug!(
        "Dispatching {} frame tasks on {} worker threads",
        frame_paths.len(),
        threads
    );

    let outcomes: Vec<TaskOutcome> = pool.install(|| {
        frame_paths
            .par_iter()
            .map(|path| run_task(source, path, &batch_fn, progress, cancel))
            .collect()
    });

    let summary = DispatchSummary::from_outcomes(&outcomes);
    log::debug!("Dispatch finished: {summary}");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_from_outcomes() {
        let outcomes = vec![
            TaskOutcome::Completed(BatchReport { processed: 1, failed: 0 }),
            TaskOutcome::Completed(BatchReport { processed: 0, failed: 1 }),
            TaskOutcome::Panicked("boom".to_string()),
            TaskOutcome::Cancelled,
        ];
        let summary = DispatchSummary::from_outcomes(&outcomes);
        assert_eq!(summary.total_tasks, 4);
        assert_eq!(summary.completed_tasks, 2);
        assert_eq!(summary.failed_tasks, 1);
        assert_eq!(summary.cancelled_tasks, 1);
        assert_eq!(summary.processed_frames, 1);
        assert_eq!(summary.failed_frames, 2);
        assert_eq!(summary.settled_tasks(), 3);
        assert!((summary.failure_ratio() - 0.5).abs() < f64::EPSILON);
        assert!(summary.was_cancelled());
    }

    #[test]
    fn test_empty_dispatch() {
        let summary = process_video_frames(
            None,
            &[],
            |_, _, _| BatchReport::default(),
            &ProgressState::hidden(0),
            2,
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(summary, DispatchSummary::default());
        assert_eq!(summary.failure_ratio(), 0.0);
    }

    #[test]
    fn test_panic_message_variants() {
        let owned: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn std::any::Any + Send> = Box::new("borrowed");
        let other: Box<dyn std::any::Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(borrowed.as_ref()), "borrowed");
        assert_eq!(panic_message(other.as_ref()), "unknown panic payload");
    }
}
