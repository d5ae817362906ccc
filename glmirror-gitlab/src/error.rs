//! Error types for GitLab API operations

use glmirror_core::FetchError;
use reqwest::StatusCode;
use thiserror::Error;

/// Result type for GitLab operations
pub type Result<T> = std::result::Result<T, GitLabError>;

/// Longest response body quoted in an error
const MAX_BODY_CHARS: usize = 200;

/// Errors that can occur when talking to the GitLab API
#[derive(Error, Debug)]
pub enum GitLabError {
    /// The request did not produce a response
    #[error("HTTP request error: {0}")]
    Http(String),

    /// The server answered with a non-200 status
    #[error("GitLab API returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The body was not the expected JSON
    #[error("JSON deserialization error: {0}")]
    Deserialize(String),

    /// The configured base URL is unusable
    #[error("Invalid GitLab URL: {0}")]
    InvalidUrl(String),

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl GitLabError {
    /// Classify a status code and response body.
    ///
    /// GitLab error bodies look like `{"message": "..."}` or `{"error": "..."}`;
    /// anything else is quoted (truncated) as-is.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.get("message")
                    .or_else(|| v.get("error"))
                    .map(|m| match m.as_str() {
                        Some(s) => s.to_string(),
                        None => m.to_string(),
                    })
            })
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    status.canonical_reason().unwrap_or("no body").to_string()
                } else {
                    trimmed.chars().take(MAX_BODY_CHARS).collect()
                }
            });

        Self::Status {
            status: status.as_u16(),
            message,
        }
    }
}

/// Strip the request URL, which carries the token, before keeping the message
impl From<reqwest::Error> for GitLabError {
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_decode() {
            Self::Deserialize(err.to_string())
        } else {
            Self::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GitLabError {
    fn from(err: serde_json::Error) -> Self {
        Self::Deserialize(err.to_string())
    }
}

impl From<GitLabError> for FetchError {
    fn from(err: GitLabError) -> Self {
        match err {
            GitLabError::Status { status, message } => FetchError::Status { status, message },
            GitLabError::Deserialize(msg) => FetchError::Decode(msg),
            other => FetchError::Transport(other.to_string()),
        }
    }
}
