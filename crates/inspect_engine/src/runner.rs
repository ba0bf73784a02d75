use std::pin::pin;

use futures_util::stream::{self, StreamExt};
use inspect_core::{Accumulator, Progress, ResultRecord, WorkItem};
use inspect_logging::{inspect_debug, inspect_info, inspect_warn};
use tokio_util::sync::CancellationToken;

use crate::check::StatusChecker;

/// Receives progress and checkpoint callbacks, one at a time, from the runner.
pub trait RunObserver: Send {
    /// Called once per processed URL, before the next one is reported.
    fn on_progress(&mut self, progress: &Progress);
    /// Called after every append; the snapshot includes the item just processed.
    fn on_checkpoint(&mut self, accumulator: &Accumulator);
}

/// Observers can be stacked, e.g. a progress printer and a checkpoint store.
impl<A: RunObserver, B: RunObserver> RunObserver for (A, B) {
    fn on_progress(&mut self, progress: &Progress) {
        self.0.on_progress(progress);
        self.1.on_progress(progress);
    }

    fn on_checkpoint(&mut self, accumulator: &Accumulator) {
        self.0.on_checkpoint(accumulator);
        self.1.on_checkpoint(accumulator);
    }
}

#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Maximum number of checks in flight. Results are still recorded in input order.
    pub concurrency: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub accumulator: Accumulator,
    /// Residual URLs processed in this run.
    pub processed: usize,
    /// Residual set size at start.
    pub total: usize,
    /// The run stopped early; `accumulator` is a valid partial checkpoint.
    pub cancelled: bool,
}

/// Drives a residual work set through a status checker.
#[derive(Debug, Clone, Default)]
pub struct BatchRunner {
    settings: RunSettings,
}

impl BatchRunner {
    pub fn new(settings: RunSettings) -> Self {
        Self { settings }
    }

    /// Checks every residual URL in input order, starting from the seeded records.
    ///
    /// Cancellation is honoured between items and while a check is in flight;
    /// the in-flight item is then dropped and never half-recorded.
    pub async fn run(
        &self,
        residual: Vec<WorkItem>,
        seeded: &[ResultRecord],
        checker: &dyn StatusChecker,
        observer: &mut dyn RunObserver,
        cancel: &CancellationToken,
    ) -> RunReport {
        let total = residual.len();
        let mut accumulator = Accumulator::from_seeded(seeded);
        let concurrency = self.settings.concurrency.max(1);
        inspect_info!(
            "Starting run: {} to check, {} carried forward, concurrency {}",
            total,
            seeded.len(),
            concurrency
        );

        let mut outcomes = pin!(stream::iter(residual)
            .map(|identifier| async move {
                let outcome = checker.check(&identifier).await;
                (identifier, outcome)
            })
            .buffered(concurrency));

        let mut completed = 0;
        let mut cancelled = false;
        while completed < total {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                next = outcomes.next() => next,
            };
            let Some((identifier, outcome)) = next else {
                cancelled = cancel.is_cancelled();
                break;
            };

            completed += 1;
            accumulator.push(ResultRecord::new(identifier.clone(), outcome.clone()));
            let progress = Progress {
                completed,
                total,
                identifier,
                outcome,
            };
            inspect_debug!("{}", progress);
            observer.on_progress(&progress);
            observer.on_checkpoint(&accumulator);
        }

        if cancelled {
            inspect_warn!("Run cancelled after {} of {} URLs", completed, total);
        } else {
            inspect_info!(
                "Run finished: {} checked, {} failed overall",
                completed,
                accumulator.failure_count()
            );
        }

        RunReport {
            accumulator,
            processed: completed,
            total,
            cancelled,
        }
    }
}
