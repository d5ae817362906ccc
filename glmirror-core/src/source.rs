//! The read-only API seam the orchestrator enumerates groups, projects and branches through

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{Branch, Group, Project};

/// Why a listing call produced no data.
///
/// Kept separate from an empty `Vec` so callers can tell "nothing there" from
/// "could not ask".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request never got a response (DNS, connect, TLS, timeout)
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with something other than 200 OK
    #[error("unexpected HTTP status {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// The response body was not the expected JSON array
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Whether the server rejected the token
    pub fn is_auth(&self) -> bool {
        matches!(self, FetchError::Status { status: 401 | 403, .. })
    }
}

/// Source of groups, projects and branches
#[async_trait]
pub trait ProjectSource: Send + Sync {
    /// List every group visible to the token
    async fn list_groups(&self) -> Result<Vec<Group>, FetchError>;

    /// List the projects of one group
    async fn list_projects(&self, group_id: u64) -> Result<Vec<Project>, FetchError>;

    /// List the branches of one project
    async fn list_branches(&self, project_id: u64) -> Result<Vec<Branch>, FetchError>;
}
