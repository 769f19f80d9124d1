use std::time::Duration;

use roost_core::{ConfigError, CoreError};

/// Url to exchange script-app credentials for an access token. Token
/// issuance has its own budget upstream and is never admitted through
/// the feed rate limiter.
pub(crate) const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Whether the run is backed by a logged-in session.
///
/// Hostname and rate floor are pure functions of this; nothing else in
/// the framework branches on login state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    Authenticated,
}

impl Identity {
    /// Host all listing requests go to.
    pub fn host(self) -> &'static str {
        match self {
            Identity::Authenticated => "https://oauth.reddit.com",
            Identity::Anonymous => "https://www.reddit.com",
        }
    }

    /// Compliance floor on the interval between requests. Anonymous
    /// clients get half the budget of a logged-in one.
    pub fn floor(self) -> Duration {
        match self {
            Identity::Authenticated => Duration::from_secs(1),
            Identity::Anonymous => Duration::from_secs(2),
        }
    }
}

/// Script-app credentials for a logged-in session.
#[derive(Debug, Clone)]
pub struct AppSecrets {
    pub id: String,
    pub secret: String,
    pub username: String,
    pub password: String,
}

/// Caller-facing configuration for one engine run.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// User agent sent with every request. Reddit rejects empty and
    /// browser-impersonating agents, so make it descriptive.
    pub agent: String,
    /// Present for a logged-in session; absent runs anonymously against
    /// the public host with a doubled rate floor.
    pub app: Option<AppSecrets>,
    /// Desired interval between requests. Clamped up to the identity's
    /// compliance floor.
    pub rate: Duration,
    /// Subreddits watched for new posts.
    pub subreddits: Vec<String>,
    /// Users watched for new posts and comments.
    pub users: Vec<String>,
    /// Whether to watch the logged-in account's inbox.
    pub inbox: bool,
}

impl Config {
    pub fn identity(&self) -> Identity {
        if self.app.is_some() {
            Identity::Authenticated
        } else {
            Identity::Anonymous
        }
    }

    /// Validates the configuration before any request is made, so setup
    /// mistakes never reach the concurrent core.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.agent.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "agent".to_string(),
            }
            .into());
        }

        if self.inbox && self.app.is_none() {
            return Err(ConfigError::LoginRequired {
                feature: "inbox".to_string(),
            }
            .into());
        }

        if let Some(app) = &self.app {
            for (field, value) in [
                ("app.id", &app.id),
                ("app.secret", &app.secret),
                ("app.username", &app.username),
                ("app.password", &app.password),
            ] {
                if value.is_empty() {
                    return Err(ConfigError::MissingField {
                        field: field.to_string(),
                    }
                    .into());
                }
            }
        }

        Ok(())
    }
}
