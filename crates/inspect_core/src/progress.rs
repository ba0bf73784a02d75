use std::fmt;

use crate::Outcome;

/// Emitted once per processed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// Number of residual URLs processed so far, starting at 1.
    pub completed: usize,
    /// Size of the residual set; fixed for the whole run.
    pub total: usize,
    pub identifier: String,
    pub outcome: Outcome,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.completed as f64 / self.total as f64
    }

    pub fn is_last(&self) -> bool {
        self.completed == self.total
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} done: {} --> {}",
            self.completed, self.total, self.identifier, self.outcome
        )
    }
}
