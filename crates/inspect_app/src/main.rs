mod cli;
mod config;
mod observer;
mod run;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use inspect_logging::{inspect_error, inspect_warn, level_for_verbosity, LogDestination};
use tokio_util::sync::CancellationToken;

use cli::Cli;
use config::{load_file_config, AppConfig, FileConfig};
use run::RunSummary;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let destination = match &cli.log_file {
        Some(path) => LogDestination::Both(path.clone()),
        None => LogDestination::Terminal,
    };
    inspect_logging::initialize(destination, level_for_verbosity(cli.verbose));

    match try_main(cli).await {
        Ok(summary) => {
            report(&summary);
            ExitCode::SUCCESS
        }
        Err(err) => {
            inspect_error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn try_main(cli: Cli) -> Result<RunSummary> {
    let file_config = match &cli.config {
        Some(path) => load_file_config(path)?,
        None => FileConfig::default(),
    };
    let config = AppConfig::resolve(&cli, file_config)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            inspect_warn!("Interrupted; stopping after saving progress");
            on_signal.cancel();
        }
    });

    run::execute(&config, cancel).await
}

fn report(summary: &RunSummary) {
    println!("{}", summary_message(summary));
}

fn summary_message(summary: &RunSummary) -> String {
    if summary.remaining == 0 {
        return format!(
            "Nothing left to check: all {} URLs already have results ({} errors).",
            summary.carried_forward, summary.failures
        );
    }
    if summary.cancelled {
        // The progress file only holds finished URLs; the rest of the list
        // comes from the original input.
        return format!(
            "Stopped after {} of {} URLs. Progress saved to {}; rerun with the same --input and --resume to continue.",
            summary.checked,
            summary.remaining,
            summary.partial_path.display()
        );
    }
    let mut message = format!(
        "Done: {} checked, {} carried forward, {} errors.",
        summary.checked, summary.carried_forward, summary.failures
    );
    if let Some(path) = &summary.final_path {
        message.push_str(&format!("\nResults written to {}", path.display()));
    }
    message
}
