use crate::common::{HttpError, RateLimitConfig, RequestRateLimiter};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

const ENHANCEMENTS_PATH: &str = "/api/location-enhancements";

/// Connection settings for the enhancement API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    base_url: String,
    /// Per-request timeout in seconds (default: 30)
    timeout_secs: Option<u64>,
    #[serde(default)]
    rate_limit: RateLimitConfig,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: None,
            rate_limit: RateLimitConfig::default(),
        }
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(30))
    }

    pub fn rate_limit(&self) -> &RateLimitConfig {
        &self.rate_limit
    }
}

/// Body of `POST /api/location-enhancements`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancementRequest {
    pub ghl_location_id: String,
    pub directory_name: String,
    pub user_id: i64,
    pub enhancement_config: Map<String, Value>,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
}

/// Client for the location enhancement endpoint.
///
/// Cheap to clone: the underlying connection pool and rate limiter are shared.
#[derive(Debug, Clone)]
pub struct EnhancementClient {
    http: reqwest::Client,
    endpoint: String,
    timeout: Duration,
    rate_limiter: Option<RequestRateLimiter>,
}

impl EnhancementClient {
    pub fn new(config: &ApiConfig) -> Result<Self, HttpError> {
        let timeout = config.timeout();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HttpError::ClientCreation {
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            endpoint: format!(
                "{}{}",
                config.base_url().trim_end_matches('/'),
                ENHANCEMENTS_PATH
            ),
            timeout,
            rate_limiter: config.rate_limit().build(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Creates one enhancement and returns the API's JSON response.
    ///
    /// # Errors
    ///
    /// Non-success responses become [`HttpError::Status`] carrying the body's
    /// `error` field, or `HTTP <status>` when the body has none.
    pub async fn create_enhancement(
        &self,
        request: &EnhancementRequest,
    ) -> Result<Value, HttpError> {
        if let Some(rate_limiter) = &self.rate_limiter {
            rate_limiter.acquire().await;
        }

        log::debug!(
            "Creating enhancement for location '{}' in directory '{}'",
            request.ghl_location_id,
            request.directory_name
        );

        let response = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .filter(|error| !error.is_empty())
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(HttpError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| HttpError::InvalidResponse {
                expected: "JSON body".to_string(),
                actual: e.to_string(),
            })
    }

    fn transport_error(&self, error: reqwest::Error) -> HttpError {
        if error.is_timeout() {
            HttpError::Timeout {
                url: self.endpoint.clone(),
                seconds: self.timeout.as_secs(),
            }
        } else {
            HttpError::RequestFailed {
                url: self.endpoint.clone(),
                reason: error.to_string(),
            }
        }
    }
}
