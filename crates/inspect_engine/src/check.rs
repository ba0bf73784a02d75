use std::sync::Arc;
use std::time::Duration;

use inspect_core::Outcome;
use inspect_logging::{inspect_debug, inspect_warn};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::credentials::TokenProvider;
use crate::types::{map_reqwest_error, CheckError, CheckFailureKind};

pub const DEFAULT_API_BASE: &str = "https://searchconsole.googleapis.com";
const INSPECT_PATH: &str = "v1/urlInspection/index:inspect";

#[derive(Debug, Clone)]
pub struct CheckerSettings {
    pub api_base: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for CheckerSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Checks one URL. Never fails: every problem becomes `Outcome::CheckFailed`,
/// so one bad URL cannot abort a batch.
#[async_trait::async_trait]
pub trait StatusChecker: Send + Sync {
    async fn check(&self, url: &str) -> Outcome;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InspectRequest<'a> {
    inspection_url: &'a str,
    site_url: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InspectResponse {
    inspection_result: Option<InspectionResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InspectionResult {
    index_status_result: Option<IndexStatusResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexStatusResult {
    coverage_state: Option<String>,
    verdict: Option<String>,
    last_crawl_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// URL Inspection API client for one Search Console property.
pub struct GscChecker {
    site_url: String,
    endpoint: String,
    client: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
}

impl GscChecker {
    pub fn new(
        site_url: impl Into<String>,
        settings: &CheckerSettings,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self, CheckError> {
        let base = url::Url::parse(&format!("{}/", settings.api_base.trim_end_matches('/')))
            .map_err(|err| CheckError::new(CheckFailureKind::InvalidUrl, err.to_string()))?;
        let endpoint = base
            .join(INSPECT_PATH)
            .map_err(|err| CheckError::new(CheckFailureKind::InvalidUrl, err.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| CheckError::new(CheckFailureKind::Network, err.to_string()))?;
        Ok(Self {
            site_url: site_url.into(),
            endpoint: endpoint.to_string(),
            client,
            tokens,
        })
    }

    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    async fn inspect(&self, url: &str) -> Result<Outcome, CheckError> {
        let token = self.tokens.access_token().await?;
        let request = InspectRequest {
            inspection_url: url,
            site_url: &self.site_url,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        let parsed: InspectResponse = serde_json::from_str(&body).map_err(|err| {
            CheckError::new(CheckFailureKind::MalformedResponse, err.to_string())
        })?;
        let index_status = parsed
            .inspection_result
            .and_then(|result| result.index_status_result)
            .ok_or_else(|| {
                CheckError::new(
                    CheckFailureKind::MalformedResponse,
                    "missing inspectionResult.indexStatusResult",
                )
            })?;
        let coverage_state = index_status
            .coverage_state
            .filter(|state| !state.trim().is_empty())
            .ok_or_else(|| {
                CheckError::new(CheckFailureKind::MalformedResponse, "missing coverageState")
            })?;

        Ok(Outcome::indexed(coverage_state)
            .with_metadata(index_status.verdict, index_status.last_crawl_time))
    }
}

#[async_trait::async_trait]
impl StatusChecker for GscChecker {
    async fn check(&self, url: &str) -> Outcome {
        match self.inspect(url).await {
            Ok(outcome) => {
                inspect_debug!("Inspected {} -> {}", url, outcome);
                outcome
            }
            Err(err) => {
                inspect_warn!("Inspection of {} failed: {}", url, err);
                Outcome::failed(err.to_string())
            }
        }
    }
}

fn status_error(status: StatusCode, body: &str) -> CheckError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| status.to_string());
    let kind = match status {
        StatusCode::TOO_MANY_REQUESTS => CheckFailureKind::RateLimited,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CheckFailureKind::Auth,
        other => CheckFailureKind::HttpStatus(other.as_u16()),
    };
    CheckError::new(kind, message)
}
