use std::fmt;

/// A single URL awaiting an index-status check.
pub type WorkItem = String;

const ERROR_PREFIX: &str = "ERROR:";

/// Result of checking one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The inspection API returned a structured index status.
    Indexed {
        coverage_state: String,
        verdict: Option<String>,
        last_crawl_time: Option<String>,
    },
    /// The check could not be completed; the message says why.
    CheckFailed { message: String },
}

impl Outcome {
    pub fn indexed(coverage_state: impl Into<String>) -> Self {
        Outcome::Indexed {
            coverage_state: coverage_state.into(),
            verdict: None,
            last_crawl_time: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Outcome::CheckFailed {
            message: message.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::CheckFailed { .. })
    }

    pub fn verdict(&self) -> Option<&str> {
        match self {
            Outcome::Indexed { verdict, .. } => verdict.as_deref(),
            Outcome::CheckFailed { .. } => None,
        }
    }

    pub fn last_crawl_time(&self) -> Option<&str> {
        match self {
            Outcome::Indexed {
                last_crawl_time, ..
            } => last_crawl_time.as_deref(),
            Outcome::CheckFailed { .. } => None,
        }
    }

    /// Parses the status text written to a checkpoint.
    ///
    /// Empty or whitespace-only text means "not checked yet" and yields `None`.
    /// Text starting with `error:` in any case is a failed check.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        let head_len = ERROR_PREFIX.len();
        if trimmed.len() >= head_len
            && trimmed.is_char_boundary(head_len)
            && trimmed[..head_len].eq_ignore_ascii_case(ERROR_PREFIX)
        {
            return Some(Outcome::failed(trimmed[head_len..].trim()));
        }
        Some(Outcome::indexed(trimmed))
    }

    /// Attaches the optional metadata columns to an `Indexed` outcome.
    pub fn with_metadata(self, verdict: Option<String>, last_crawl_time: Option<String>) -> Self {
        match self {
            Outcome::Indexed { coverage_state, .. } => Outcome::Indexed {
                coverage_state,
                verdict: non_empty(verdict),
                last_crawl_time: non_empty(last_crawl_time),
            },
            failed @ Outcome::CheckFailed { .. } => failed,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Indexed { coverage_state, .. } => write!(f, "{coverage_state}"),
            Outcome::CheckFailed { message } => write!(f, "{ERROR_PREFIX} {message}"),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// One processed URL. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub identifier: String,
    pub outcome: Outcome,
}

impl ResultRecord {
    pub fn new(identifier: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            identifier: identifier.into(),
            outcome,
        }
    }
}

/// One row of an input file, possibly carrying the result of an earlier run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRecord {
    pub identifier: String,
    pub outcome: Option<String>,
    pub verdict: Option<String>,
    pub last_crawl_time: Option<String>,
}

impl RawRecord {
    pub fn pending(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Default::default()
        }
    }

    pub fn completed(identifier: impl Into<String>, outcome: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            outcome: Some(outcome.into()),
            ..Default::default()
        }
    }

    /// The prior outcome, if this row was already checked.
    pub fn prior_outcome(&self) -> Option<Outcome> {
        let outcome = Outcome::parse(self.outcome.as_deref()?)?;
        Some(outcome.with_metadata(self.verdict.clone(), self.last_crawl_time.clone()))
    }
}

/// Ordered results of a run: seeded records first, then processing order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Accumulator {
    records: Vec<ResultRecord>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seeded(seeded: &[ResultRecord]) -> Self {
        Self {
            records: seeded.to_vec(),
        }
    }

    pub fn push(&mut self, record: ResultRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn failure_count(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.outcome.is_failure())
            .count()
    }

    pub fn into_records(self) -> Vec<ResultRecord> {
        self.records
    }
}

impl From<Vec<ResultRecord>> for Accumulator {
    fn from(records: Vec<ResultRecord>) -> Self {
        Self { records }
    }
}
