//! Inspect core: pure data model and reconciliation of prior results.
mod progress;
mod reconcile;
mod record;

pub use progress::Progress;
pub use reconcile::{merge_resumed, reconcile, DuplicatePolicy, ReconcileOptions, Reconciliation};
pub use record::{Accumulator, Outcome, RawRecord, ResultRecord, WorkItem};
