use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, NytError>;

#[derive(Debug, Clone, Error)]
pub enum NytError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Rate limited (status 429)")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl NytError {
    /// Failures that will not go away by asking again: the credential was refused.
    pub fn is_fatal(&self) -> bool {
        matches!(self, NytError::Api { status: 401 | 403, .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            NytError::RateLimited { .. } => Some(429),
            NytError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for NytError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NytError::Timeout(err.to_string())
        } else {
            NytError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for NytError {
    fn from(err: serde_json::Error) -> Self {
        NytError::Parse(err.to_string())
    }
}
