use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use inspect_core::{Accumulator, Progress, ResultRecord};
use inspect_logging::{inspect_debug, inspect_error};
use thiserror::Error;

use crate::persist::{AtomicFileWriter, PersistError};
use crate::runner::RunObserver;

pub const PARTIAL_CHECKPOINT_FILENAME: &str = "gsc_results_partial.csv";
pub const CHECKPOINT_COLUMNS: [&str; 4] = ["url", "status", "verdict", "last_crawl_time"];

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush csv buffer: {0}")]
    Flush(String),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

/// Serializes records as checkpoint CSV in accumulator order.
pub fn encode_checkpoint(records: &[ResultRecord]) -> Result<String, CheckpointError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CHECKPOINT_COLUMNS)?;
    for record in records {
        let status = record.outcome.to_string();
        writer.write_record([
            record.identifier.as_str(),
            status.as_str(),
            record.outcome.verdict().unwrap_or(""),
            record.outcome.last_crawl_time().unwrap_or(""),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| CheckpointError::Flush(err.error().to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Timestamped name for the result file of a completed run.
pub fn final_result_filename<Tz>(finished_at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!(
        "gsc_results_final_{}.csv",
        finished_at.format("%Y%m%d_%H%M%S")
    )
}

/// Checkpoint files in one output directory.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    writer: AtomicFileWriter,
}

impl CheckpointStore {
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(output_dir),
        }
    }

    pub fn output_dir(&self) -> &Path {
        self.writer.dir()
    }

    pub fn partial_path(&self) -> PathBuf {
        self.writer.dir().join(PARTIAL_CHECKPOINT_FILENAME)
    }

    pub fn save_partial(&self, accumulator: &Accumulator) -> Result<PathBuf, CheckpointError> {
        self.save_as(PARTIAL_CHECKPOINT_FILENAME, accumulator)
    }

    pub fn save_as(
        &self,
        filename: &str,
        accumulator: &Accumulator,
    ) -> Result<PathBuf, CheckpointError> {
        let content = encode_checkpoint(accumulator.records())?;
        let path = self.writer.write(filename, content)?;
        inspect_debug!("Wrote {} records to {:?}", accumulator.len(), path);
        Ok(path)
    }
}

/// Persists the partial checkpoint after every item.
///
/// A failed write is logged and the run continues; the next item retries it.
impl RunObserver for CheckpointStore {
    fn on_progress(&mut self, _progress: &Progress) {}

    fn on_checkpoint(&mut self, accumulator: &Accumulator) {
        if let Err(err) = self.save_partial(accumulator) {
            inspect_error!(
                "Failed to write checkpoint to {:?}: {}",
                self.partial_path(),
                err
            );
        }
    }
}
