//! Progress callbacks for pipeline runs.

use crate::pipeline::{DatasetError, SkipReason};

/// Progress callback for a batch of datasets.
///
/// `index` is the dataset's position in the plan. With parallel runs the
/// callbacks arrive out of order and from worker threads.
pub trait PipelineProgress: Send + Sync {
    /// Called when a dataset starts processing.
    fn on_start(&self, dataset: &str, index: usize, total: usize);

    /// Called when a dataset finishes, with its published row count or error.
    fn on_complete(
        &self,
        dataset: &str,
        index: usize,
        total: usize,
        result: Result<usize, &DatasetError>,
    );

    /// Called when a dataset is skipped without counting as a failure.
    fn on_skip(&self, dataset: &str, reason: &SkipReason);

    /// Called when the entire batch is done.
    fn on_batch_complete(&self, succeeded: usize, skipped: usize, failed: usize);
}

/// Forwards progress events to `tracing`.
pub struct LogProgress;

impl PipelineProgress for LogProgress {
    fn on_start(&self, dataset: &str, index: usize, total: usize) {
        tracing::info!("[{}/{}] processing {dataset}", index + 1, total);
    }

    fn on_complete(
        &self,
        dataset: &str,
        index: usize,
        total: usize,
        result: Result<usize, &DatasetError>,
    ) {
        match result {
            Ok(rows) => tracing::info!("[{}/{}] {dataset}: {rows} rows", index + 1, total),
            Err(e) => tracing::error!("[{}/{}] {dataset} failed: {e}", index + 1, total),
        }
    }

    fn on_skip(&self, dataset: &str, reason: &SkipReason) {
        tracing::warn!("skipping {dataset}: {reason}");
    }

    fn on_batch_complete(&self, succeeded: usize, skipped: usize, failed: usize) {
        if failed == 0 {
            tracing::info!("done: {succeeded} published, {skipped} skipped");
        } else {
            tracing::warn!("done: {succeeded} published, {skipped} skipped, {failed} failed");
        }
    }
}
