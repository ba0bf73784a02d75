use std::path::PathBuf;

use clap::Parser;

/// Batch-check Search Console index status, resumable from a progress file.
#[derive(Debug, Parser)]
#[command(name = "gsc-inspect", version)]
pub struct Cli {
    /// URL list or a previous progress file (.csv, .txt, .xlsx)
    #[arg(short, long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Search Console property, exactly as registered (e.g. https://www.example.com/)
    #[arg(long, env = "GSC_SITE_URL")]
    pub site_url: Option<String>,

    /// Service-account JSON key
    #[arg(long, env = "GSC_CREDENTIALS", value_name = "FILE")]
    pub credentials: Option<PathBuf>,

    /// Pre-issued OAuth access token; takes precedence over --credentials
    #[arg(long, env = "GSC_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Directory for the progress and result CSV files [default: ./output]
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Also load the progress file from the output directory and skip what it already covers
    #[arg(long)]
    pub resume: bool,

    /// Number of inspections in flight [default: 1]
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Check each URL once even if it is listed several times
    #[arg(long)]
    pub dedupe: bool,

    /// Check again URLs whose previous result was an error
    #[arg(long)]
    pub retry_failed: bool,

    /// Per-request timeout in seconds [default: 60]
    #[arg(long, value_name = "SECS")]
    pub request_timeout_secs: Option<u64>,

    /// Override the inspection API base URL
    #[arg(long, hide = true)]
    pub api_base: Option<String>,

    /// RON file with defaults for any of the options above
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Also write the log to this file
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
