use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use inspect_core::{merge_resumed, reconcile};
use inspect_engine::{
    final_result_filename, load_records, BatchRunner, CheckpointStore, GscChecker,
    ServiceAccountKey, ServiceAccountTokenProvider, StaticTokenProvider, TokenProvider,
};
use inspect_logging::{inspect_info, inspect_warn};
use tokio_util::sync::CancellationToken;

use crate::config::{AppConfig, CredentialSource};
use crate::observer::ConsoleProgress;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// URLs checked in this run.
    pub checked: usize,
    /// Residual set size at start.
    pub remaining: usize,
    /// Results carried forward from earlier runs.
    pub carried_forward: usize,
    /// Error outcomes in the full result set.
    pub failures: usize,
    pub cancelled: bool,
    pub partial_path: PathBuf,
    pub final_path: Option<PathBuf>,
}

fn token_provider(config: &AppConfig) -> Result<Arc<dyn TokenProvider>> {
    match &config.credentials {
        CredentialSource::AccessToken(token) => Ok(Arc::new(StaticTokenProvider::new(token))),
        CredentialSource::ServiceAccount(path) => {
            let key = ServiceAccountKey::from_file(path)
                .with_context(|| format!("invalid service-account key {}", path.display()))?;
            inspect_info!("Using service account {}", key.client_email);
            let provider = ServiceAccountTokenProvider::new(key, config.checker.request_timeout)?;
            Ok(Arc::new(provider))
        }
    }
}

/// Loads input, reconciles it against earlier results and checks what is left.
///
/// Everything that can fail fatally (credentials, input, config) fails here
/// before the first inspection request.
pub async fn execute(config: &AppConfig, cancel: CancellationToken) -> Result<RunSummary> {
    let tokens = token_provider(config)?;
    let store = CheckpointStore::new(config.output_dir.clone());

    let mut resumed = Vec::new();
    if config.resume {
        let partial = store.partial_path();
        if partial.exists() {
            let prior = load_records(&partial)
                .with_context(|| format!("failed to load progress file {}", partial.display()))?;
            inspect_info!("Resuming from {} prior rows in {:?}", prior.records.len(), partial);
            resumed = prior.records;
        } else {
            inspect_warn!("No progress file at {:?}; starting fresh", partial);
        }
    }
    let input = load_records(&config.input)
        .with_context(|| format!("failed to load {}", config.input.display()))?;

    let split = reconcile(merge_resumed(resumed, input.records), config.reconcile);
    inspect_info!(
        "{} URLs already have results, {} to check ({} duplicates skipped, {} failures re-queued)",
        split.seeded.len(),
        split.residual.len(),
        split.skipped_duplicates,
        split.requeued_failures
    );

    if split.is_noop() {
        return Ok(RunSummary {
            checked: 0,
            remaining: 0,
            carried_forward: split.seeded.len(),
            failures: split.seeded.iter().filter(|r| r.outcome.is_failure()).count(),
            cancelled: false,
            partial_path: store.partial_path(),
            final_path: None,
        });
    }

    let checker = GscChecker::new(config.site_url.as_str(), &config.checker, tokens)
        .context("failed to set up the inspection client")?;
    let runner = BatchRunner::new(config.run.clone());
    let mut observer = (ConsoleProgress::stdout(), store.clone());
    let remaining = split.residual.len();
    let report = runner
        .run(split.residual, &split.seeded, &checker, &mut observer, &cancel)
        .await;

    // The runner checkpoints after every item; this also covers a run
    // cancelled before its first item finished.
    let partial_path = store
        .save_partial(&report.accumulator)
        .context("failed to write progress file")?;

    let final_path = if report.cancelled {
        None
    } else {
        let filename = final_result_filename(&Local::now());
        let path = store
            .save_as(&filename, &report.accumulator)
            .context("failed to write final results")?;
        Some(path)
    };

    Ok(RunSummary {
        checked: report.processed,
        remaining,
        carried_forward: split.seeded.len(),
        failures: report.accumulator.failure_count(),
        cancelled: report.cancelled,
        partial_path,
        final_path,
    })
}
