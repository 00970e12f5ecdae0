use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::config::BackendSettings;
use crate::error::BackendError;
use crate::models::analysis::{detail_message, AnalysisRequest, AnalyzeResponse, HealthResponse};

/// The remote analysis service.
///
/// `health` answers whether the backend reports itself ready; `analyze` runs
/// one recommendation request. Implementations never retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn health(&self) -> Result<bool, BackendError>;

    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalyzeResponse, BackendError>;
}

/// HTTP client for the analysis backend.
pub struct HttpBackend {
    base_url: String,
    client: Client,
    request_timeout: Duration,
    health_timeout: Duration,
}

impl HttpBackend {
    pub fn new(settings: &BackendSettings) -> Result<Self, BackendError> {
        let client = Client::builder()
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            client,
            request_timeout: Duration::from_secs(settings.request_timeout_secs),
            health_timeout: Duration::from_secs(settings.health_timeout_secs),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn map_request_error(&self, e: reqwest::Error, timeout: Duration) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout(timeout.as_secs())
        } else if e.is_connect() {
            BackendError::Connect(self.base_url.clone())
        } else {
            BackendError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl AnalysisBackend for HttpBackend {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn health(&self) -> Result<bool, BackendError> {
        let response = self
            .client
            .get(self.endpoint("health"))
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(|e| self.map_request_error(e, self.health_timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                detail: None,
            });
        }

        let parsed: HealthResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        debug!(ok = parsed.ok, "Health probe answered");
        Ok(parsed.ok)
    }

    #[instrument(skip(self, request), fields(report_len = request.report_text().len()))]
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalyzeResponse, BackendError> {
        let response = self
            .client
            .post(self.endpoint("analyze"))
            .timeout(self.request_timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_request_error(e, self.request_timeout))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_request_error(e, self.request_timeout))?;

        if !status.is_success() {
            let detail = detail_message(&body);
            warn!(
                status = status.as_u16(),
                has_detail = detail.is_some(),
                "Analysis request rejected"
            );
            return Err(BackendError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        serde_json::from_slice(&body).map_err(|e| BackendError::Decode(e.to_string()))
    }
}
