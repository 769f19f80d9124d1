use std::time::{Duration, SystemTime};

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use roost_core::{ApiError, CoreError};

use crate::config::AppSecrets;

/// Slack subtracted from the advertised token lifetime so a token is
/// refreshed before the server starts rejecting it.
const EXPIRY_SLACK: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct Credential {
    access_token: String,
    expires_at: SystemTime,
}

impl Credential {
    fn expired(&self) -> bool {
        SystemTime::now() >= self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expiry")]
    expires_in: u64,
    #[serde(default)]
    scope: String,
}

fn default_expiry() -> u64 {
    3600
}

/// Acquires and refreshes the OAuth2 credential behind every
/// authenticated fetch.
///
/// One authenticator is shared by the whole run, since every stream acts
/// as the same logged-in user. The mutex around the held credential is
/// the refresh critical section: at most one refresh is in flight, and
/// every caller queued behind it observes the refreshed value instead of
/// racing to fetch its own.
#[derive(Debug)]
pub struct Authenticator {
    http: Client,
    app: AppSecrets,
    token_url: String,
    credential: Mutex<Option<Credential>>,
}

impl Authenticator {
    pub fn new(http: Client, app: AppSecrets, token_url: impl Into<String>) -> Self {
        Self {
            http,
            app,
            token_url: token_url.into(),
            credential: Mutex::new(None),
        }
    }

    /// Returns a valid access token, refreshing first if none is held or
    /// the held one has expired.
    pub async fn access_token(&self) -> Result<String, CoreError> {
        let mut slot = self.credential.lock().await;
        if let Some(credential) = slot.as_ref() {
            if !credential.expired() {
                return Ok(credential.access_token.clone());
            }
            debug!("held access token expired, refreshing");
        }

        let fresh = self.request_token().await?;
        let token = fresh.access_token.clone();
        *slot = Some(fresh);
        Ok(token)
    }

    /// Drops the held credential if it is still the one the server
    /// rejected. Concurrent streams reporting the same stale token cause
    /// exactly one refresh on the next `access_token` call; a stream
    /// whose rejection raced a finished refresh leaves the fresh
    /// credential alone.
    pub async fn invalidate(&self, rejected: &str) {
        let mut slot = self.credential.lock().await;
        if slot.as_ref().map(|c| c.access_token.as_str()) == Some(rejected) {
            warn!("access token rejected upstream, discarding");
            *slot = None;
        }
    }

    async fn request_token(&self) -> Result<Credential, CoreError> {
        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.app.id, Some(&self.app.secret))
            .form(&[
                ("grant_type", "password"),
                ("username", self.app.username.as_str()),
                ("password", self.app.password.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::AuthenticationFailed {
                reason: format!("token endpoint returned {status}"),
            }
            .into());
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            CoreError::Api(ApiError::AuthenticationFailed {
                reason: format!("malformed token response: {e}"),
            })
        })?;
        if body.access_token.is_empty() {
            return Err(ApiError::AuthenticationFailed {
                reason: "token endpoint returned an empty access token".to_string(),
            }
            .into());
        }

        let lifetime = Duration::from_secs(body.expires_in).saturating_sub(EXPIRY_SLACK);
        info!(scope = %body.scope, expires_in = body.expires_in, "acquired access token");
        Ok(Credential {
            access_token: body.access_token,
            expires_at: SystemTime::now() + lifetime,
        })
    }
}
