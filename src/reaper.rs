use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tokio::time::sleep;
use tracing::{debug, warn};

use roost_core::{parse_listing, ApiError, CoreError, Thing};

use crate::auth::Authenticator;
use crate::rate_limit::RateLimiter;

/// Listing fetch seam between streams and the network.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetches one page of the listing at `path`, newest first.
    async fn fetch(&self, path: &str) -> Result<Vec<Thing>, CoreError>;
}

/// Retry behavior for transient fetch failures.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts before a transient failure is surfaced to the stream.
    pub max_attempts: u32,
    /// Base delay for exponential backoff (in milliseconds)
    pub base_delay_ms: u64,
    /// Maximum delay between retries (in milliseconds)
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Maximum jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 2000,
            max_delay_ms: 60000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.2, // jitter to prevent thundering herd
        }
    }
}

/// Calculate delay with exponential backoff and jitter
fn calculate_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let exponential_delay = if attempt == 0 {
        Duration::from_millis(config.base_delay_ms)
    } else {
        let multiplier = config.backoff_multiplier.powi(attempt as i32);
        let delay_ms = (config.base_delay_ms as f64 * multiplier) as u64;
        Duration::from_millis(delay_ms.min(config.max_delay_ms))
    };

    let jitter_range = (exponential_delay.as_millis() as f64 * config.jitter_factor) as u64;
    let jitter = fastrand::u64(0..=jitter_range);
    let final_delay = exponential_delay + Duration::from_millis(jitter);

    final_delay.min(Duration::from_millis(config.max_delay_ms))
}

/// How one fetch attempt failed, and what that means for the next one.
enum Failure {
    /// The access token was rejected; refresh and retry exactly once.
    Unauthorized,
    /// Worth another attempt after a backoff, or after `retry_after`
    /// when the server said how long to wait.
    Transient {
        error: CoreError,
        retry_after: Option<Duration>,
    },
    /// Not retryable at this layer.
    Fatal(CoreError),
}

/// The sole gateway to the listing endpoints.
///
/// Hides token acquisition, token refresh and transient-failure retry
/// behind [`Fetch::fetch`]. Every attempt, including retries, waits for
/// a rate token first, so the global request budget holds no matter
/// where a request originates.
pub struct Reaper {
    http: Client,
    base_url: String,
    auth: Option<Arc<Authenticator>>,
    limiter: Arc<RateLimiter>,
    retry: RetryConfig,
}

impl Reaper {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        auth: Option<Arc<Authenticator>>,
        limiter: Arc<RateLimiter>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            auth,
            limiter,
            retry,
        }
    }

    async fn attempt(&self, url: &str, token: Option<&str>) -> Result<Vec<Thing>, Failure> {
        let mut request = self.http.get(url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                return Err(if e.is_timeout() {
                    Failure::Transient {
                        error: ApiError::RequestTimeout.into(),
                        retry_after: None,
                    }
                } else if e.is_connect() {
                    Failure::Transient {
                        error: CoreError::Network(e),
                        retry_after: None,
                    }
                } else {
                    Failure::Fatal(CoreError::Network(e))
                });
            }
        };

        let status = response.status();
        if status.is_success() {
            let body = match response.bytes().await {
                Ok(body) => body,
                Err(e) => {
                    return Err(Failure::Transient {
                        error: CoreError::Network(e),
                        retry_after: None,
                    })
                }
            };
            return match parse_listing(&body) {
                Ok(things) => Ok(things),
                // A malformed body is usually the upstream having a
                // moment, not a permanent condition.
                Err(e) => Err(Failure::Transient {
                    error: e,
                    retry_after: None,
                }),
            };
        }

        match status {
            StatusCode::UNAUTHORIZED => Err(Failure::Unauthorized),
            StatusCode::FORBIDDEN => Err(Failure::Fatal(
                ApiError::Forbidden {
                    resource: url.to_string(),
                }
                .into(),
            )),
            StatusCode::NOT_FOUND => Err(Failure::Fatal(
                ApiError::NotFound {
                    resource: url.to_string(),
                }
                .into(),
            )),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                Err(Failure::Transient {
                    error: ApiError::RateLimitExceeded { retry_after }.into(),
                    retry_after: Some(Duration::from_secs(retry_after)),
                })
            }
            s if s.is_server_error() => Err(Failure::Transient {
                error: ApiError::ServerError {
                    status_code: s.as_u16(),
                }
                .into(),
                retry_after: None,
            }),
            s => Err(Failure::Fatal(
                ApiError::InvalidResponse {
                    details: format!("unexpected status {s}"),
                }
                .into(),
            )),
        }
    }
}

#[async_trait]
impl Fetch for Reaper {
    async fn fetch(&self, path: &str) -> Result<Vec<Thing>, CoreError> {
        let url = format!("{}{}", self.base_url, path);
        let mut failures = 0u32;
        let mut refreshed = false;

        loop {
            self.limiter.acquire().await;

            let token = match &self.auth {
                Some(auth) => Some(auth.access_token().await?),
                None => None,
            };

            match self.attempt(&url, token.as_deref()).await {
                Ok(things) => {
                    debug!(path, count = things.len(), "fetched listing");
                    return Ok(things);
                }
                Err(Failure::Unauthorized) => {
                    let Some(auth) = &self.auth else {
                        return Err(ApiError::AuthenticationFailed {
                            reason: format!("{url} rejected an anonymous request"),
                        }
                        .into());
                    };
                    if refreshed {
                        return Err(ApiError::InvalidToken.into());
                    }
                    refreshed = true;
                    warn!(path, "access token rejected, refreshing once");
                    auth.invalidate(token.as_deref().unwrap_or_default()).await;
                }
                Err(Failure::Transient { error, retry_after }) => {
                    failures += 1;
                    if failures >= self.retry.max_attempts {
                        warn!(path, attempts = failures, "giving up on fetch: {error}");
                        return Err(error);
                    }
                    let delay =
                        retry_after.unwrap_or_else(|| calculate_delay(failures - 1, &self.retry));
                    debug!(
                        path,
                        attempt = failures,
                        delay_ms = delay.as_millis() as u64,
                        "transient fetch failure, backing off: {error}"
                    );
                    sleep(delay).await;
                }
                Err(Failure::Fatal(error)) => return Err(error),
            }
        }
    }
}
