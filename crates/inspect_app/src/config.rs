use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use inspect_core::{DuplicatePolicy, ReconcileOptions};
use inspect_engine::{CheckerSettings, RunSettings};
use inspect_logging::inspect_info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::Cli;

const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("no Search Console property given (--site-url or GSC_SITE_URL)")]
    MissingSiteUrl,
    #[error("no credentials given (--credentials, GSC_CREDENTIALS or --access-token)")]
    MissingCredentials,
    #[error("concurrency must be at least 1")]
    InvalidConcurrency,
    #[error("timeouts must be at least one second")]
    InvalidTimeout,
}

/// Optional defaults read from a RON file, e.g.
///
/// ```ron
/// (
///     site_url: Some("sc-domain:example.com"),
///     credentials: Some("service-account.json"),
///     concurrency: Some(2),
/// )
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub site_url: Option<String>,
    pub credentials: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub concurrency: Option<usize>,
    pub dedupe: Option<bool>,
    pub retry_failed: Option<bool>,
    pub request_timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub api_base: Option<String>,
}

pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = ron::from_str(&content).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    inspect_info!("Loaded config from {:?}", path);
    Ok(config)
}

#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    ServiceAccount(PathBuf),
    AccessToken(String),
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::ServiceAccount(path) => {
                f.debug_tuple("ServiceAccount").field(path).finish()
            }
            CredentialSource::AccessToken(_) => f.write_str("AccessToken(..)"),
        }
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub input: PathBuf,
    pub site_url: String,
    pub credentials: CredentialSource,
    pub output_dir: PathBuf,
    pub resume: bool,
    pub reconcile: ReconcileOptions,
    pub run: RunSettings,
    pub checker: CheckerSettings,
}

impl AppConfig {
    /// Command-line values win over file values, which win over defaults.
    pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let site_url = cli
            .site_url
            .clone()
            .or(file.site_url)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingSiteUrl)?;

        let credentials = match (&cli.access_token, &cli.credentials) {
            (Some(token), _) if !token.trim().is_empty() => {
                CredentialSource::AccessToken(token.trim().to_string())
            }
            (_, Some(path)) => CredentialSource::ServiceAccount(path.clone()),
            _ => file
                .credentials
                .map(CredentialSource::ServiceAccount)
                .ok_or(ConfigError::MissingCredentials)?,
        };

        let concurrency = cli.concurrency.or(file.concurrency).unwrap_or(1);
        if concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }

        let mut checker = CheckerSettings::default();
        if let Some(secs) = cli.request_timeout_secs.or(file.request_timeout_secs) {
            checker.request_timeout = timeout(secs)?;
        }
        if let Some(secs) = file.connect_timeout_secs {
            checker.connect_timeout = timeout(secs)?;
        }
        if let Some(base) = cli.api_base.clone().or(file.api_base) {
            checker.api_base = base;
        }

        let duplicates = if cli.dedupe || file.dedupe.unwrap_or(false) {
            DuplicatePolicy::FirstWins
        } else {
            DuplicatePolicy::Preserve
        };

        Ok(Self {
            input: cli.input.clone(),
            site_url,
            credentials,
            output_dir: cli
                .output_dir
                .clone()
                .or(file.output_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            resume: cli.resume,
            reconcile: ReconcileOptions {
                duplicates,
                retry_failed: cli.retry_failed || file.retry_failed.unwrap_or(false),
            },
            run: RunSettings { concurrency },
            checker,
        })
    }
}

fn timeout(secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::InvalidTimeout);
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["gsc-inspect", "--input", "urls.txt"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_apply_when_only_required_values_are_given() {
        let cli = parse(&["--site-url", "https://www.example.com/", "--credentials", "sa.json"]);
        let config = AppConfig::resolve(&cli, FileConfig::default()).unwrap();

        assert_eq!(config.site_url, "https://www.example.com/");
        assert_eq!(
            config.credentials,
            CredentialSource::ServiceAccount(PathBuf::from("sa.json"))
        );
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.run.concurrency, 1);
        assert_eq!(config.reconcile, ReconcileOptions::default());
        assert_eq!(config.checker.request_timeout, Duration::from_secs(60));
        assert!(!config.resume);
    }

    #[test]
    fn command_line_overrides_file() {
        let cli = parse(&[
            "--site-url",
            "sc-domain:cli.example",
            "--concurrency",
            "3",
            "--access-token",
            "tok",
            "--dedupe",
        ]);
        let file = FileConfig {
            site_url: Some("sc-domain:file.example".into()),
            credentials: Some("file.json".into()),
            concurrency: Some(8),
            retry_failed: Some(true),
            request_timeout_secs: Some(15),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, file).unwrap();

        assert_eq!(config.site_url, "sc-domain:cli.example");
        assert_eq!(config.credentials, CredentialSource::AccessToken("tok".into()));
        assert_eq!(config.run.concurrency, 3);
        assert_eq!(config.reconcile.duplicates, DuplicatePolicy::FirstWins);
        assert!(config.reconcile.retry_failed);
        assert_eq!(config.checker.request_timeout, Duration::from_secs(15));
    }

    #[test]
    fn missing_site_url_is_rejected() {
        let cli = parse(&["--credentials", "sa.json", "--site-url", "  "]);
        assert!(matches!(
            AppConfig::resolve(&cli, FileConfig::default()),
            Err(ConfigError::MissingSiteUrl)
        ));
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let cli = parse(&["--site-url", "https://www.example.com/"]);
        assert!(matches!(
            AppConfig::resolve(&cli, FileConfig::default()),
            Err(ConfigError::MissingCredentials)
        ));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let cli = parse(&["--site-url", "x", "--credentials", "sa.json", "--concurrency", "0"]);
        assert!(matches!(
            AppConfig::resolve(&cli, FileConfig::default()),
            Err(ConfigError::InvalidConcurrency)
        ));
    }

    #[test]
    fn ron_file_is_parsed() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("inspect.ron");
        fs::write(
            &path,
            r#"(site_url: Some("sc-domain:example.com"), concurrency: Some(2), dedupe: Some(true))"#,
        )
        .unwrap();

        let file = load_file_config(&path).unwrap();

        assert_eq!(file.site_url.as_deref(), Some("sc-domain:example.com"));
        assert_eq!(file.concurrency, Some(2));
        assert_eq!(file.dedupe, Some(true));
    }

    #[test]
    fn unknown_ron_fields_are_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("inspect.ron");
        fs::write(&path, "(sight_url: None)").unwrap();

        assert!(matches!(
            load_file_config(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn access_token_is_not_printed() {
        let source = CredentialSource::AccessToken("secret".into());
        assert_eq!(format!("{source:?}"), "AccessToken(..)");
    }
}
