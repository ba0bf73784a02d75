use std::collections::HashSet;

use crate::{RawRecord, ResultRecord, WorkItem};

/// What to do with a URL that appears more than once among unchecked rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Check every occurrence.
    #[default]
    Preserve,
    /// Check the first occurrence only.
    FirstWins,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileOptions {
    pub duplicates: DuplicatePolicy,
    /// Put rows whose prior outcome is an error back into the work set.
    pub retry_failed: bool,
}

/// The split between work still to do and results carried forward.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reconciliation {
    pub residual: Vec<WorkItem>,
    pub seeded: Vec<ResultRecord>,
    /// Unchecked rows dropped because the URL was already seeded or repeated.
    pub skipped_duplicates: usize,
    /// Failed rows moved back to the residual set.
    pub requeued_failures: usize,
}

impl Reconciliation {
    /// True when nothing is left to check; the runner must not be started.
    pub fn is_noop(&self) -> bool {
        self.residual.is_empty()
    }
}

/// Combines rows read back from a progress file with the input rows.
///
/// The progress rows come first. Input rows for a URL that already has a
/// result in the progress file are dropped, so each result is carried forward
/// once and the progress file wins over older results in the input.
pub fn merge_resumed(resumed: Vec<RawRecord>, input: Vec<RawRecord>) -> Vec<RawRecord> {
    let covered: HashSet<String> = resumed
        .iter()
        .filter(|record| record.prior_outcome().is_some())
        .map(|record| record.identifier.clone())
        .collect();
    let mut merged = resumed;
    merged.extend(
        input
            .into_iter()
            .filter(|record| !covered.contains(&record.identifier)),
    );
    merged
}

/// Partitions input rows into residual work and seeded results.
///
/// Input order is preserved in both halves. A URL that already has a seeded
/// result is never queued again, whatever the duplicate policy.
pub fn reconcile<I>(raw: I, options: ReconcileOptions) -> Reconciliation
where
    I: IntoIterator<Item = RawRecord>,
{
    let mut seeded = Vec::new();
    let mut candidates = Vec::new();
    let mut requeued_failures = 0;

    for record in raw {
        match record.prior_outcome() {
            Some(outcome) if options.retry_failed && outcome.is_failure() => {
                requeued_failures += 1;
                candidates.push(record.identifier);
            }
            Some(outcome) => seeded.push(ResultRecord::new(record.identifier, outcome)),
            None => candidates.push(record.identifier),
        }
    }

    let done: HashSet<&str> = seeded.iter().map(|r| r.identifier.as_str()).collect();
    let mut queued: HashSet<&str> = HashSet::new();
    let mut residual = Vec::with_capacity(candidates.len());
    let mut skipped_duplicates = 0;

    for identifier in &candidates {
        if done.contains(identifier.as_str()) {
            skipped_duplicates += 1;
            continue;
        }
        let first = queued.insert(identifier.as_str());
        if !first && options.duplicates == DuplicatePolicy::FirstWins {
            skipped_duplicates += 1;
            continue;
        }
        residual.push(identifier.clone());
    }

    Reconciliation {
        residual,
        seeded,
        skipped_duplicates,
        requeued_failures,
    }
}
