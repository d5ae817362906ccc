//! Error types for glmirror

use std::time::Duration;

use thiserror::Error;

use crate::source::FetchError;

/// Result type alias for glmirror operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for glmirror operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Listing groups, projects or branches failed
    #[error("GitLab fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// An external command exited unsuccessfully
    #[error("`{command}` failed ({status}): {stderr}")]
    Command {
        /// Redacted command line
        command: String,
        /// Exit status description
        status: String,
        /// Captured standard error, trimmed
        stderr: String,
    },

    /// An external command did not finish in time and was killed
    #[error("`{command}` timed out after {timeout:?}")]
    Timeout {
        /// Redacted command line
        command: String,
        /// The limit that was exceeded
        timeout: Duration,
    },

    /// Local repository inspection error
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
