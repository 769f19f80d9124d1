use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Reddit API error: {0}")]
    Api(#[from] ApiError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Handler failed for {target}: {source}")]
    Handler {
        target: String,
        source: anyhow::Error,
    },

    #[error("Stream {target}: {source}")]
    Stream {
        target: String,
        #[source]
        source: Box<CoreError>,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CoreError {
    /// Wraps an error with the stream target it originated from, so the
    /// terminal run result names the failing subscription.
    pub fn in_stream(target: impl Into<String>, source: CoreError) -> Self {
        CoreError::Stream {
            target: target.into(),
            source: Box::new(source),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CoreError::Internal {
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum ApiError {
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Access token rejected after a refresh")]
    InvalidToken,

    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Forbidden access to resource: {resource}")]
    Forbidden { resource: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },
}

#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("{feature} requires a logged-in session")]
    LoginRequired { feature: String },
}
