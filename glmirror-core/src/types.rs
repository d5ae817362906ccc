//! Groups, projects and branches as the orchestrator sees them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A GitLab group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Numeric group id
    pub id: u64,
    /// Display name
    pub name: String,
    /// Full namespaced path (e.g. "platform/backend")
    pub full_path: String,
}

/// A GitLab project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Numeric project id
    pub id: u64,
    /// Display name
    pub name: String,
    /// Namespaced path, used as the local directory relative to the mirror root
    pub path_with_namespace: String,
    /// SSH clone URL (e.g. "git@gitlab.com:group/project.git")
    pub ssh_url: String,
    /// HTTP(S) clone URL (e.g. "https://gitlab.com/group/project.git")
    pub http_url: String,
    /// Default branch as reported by GitLab, if any
    pub default_branch: Option<String>,
}

/// A branch of a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Branch name
    pub name: String,
    /// Timestamp of the last commit on the branch
    pub committed_at: Option<DateTime<Utc>>,
    /// Whether GitLab flags this as the project's default branch
    pub is_default: bool,
}

impl Branch {
    /// Create a branch with no commit information
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            committed_at: None,
            is_default: false,
        }
    }
}

/// The branch whose last commit is the most recent.
///
/// Earlier entries win ties, and branches without a timestamp never beat one
/// that has one. Returns `None` only for an empty slice.
pub fn last_activity_branch(branches: &[Branch]) -> Option<&Branch> {
    let mut iter = branches.iter();
    let mut best = iter.next()?;
    for branch in iter {
        if branch.committed_at > best.committed_at {
            best = branch;
        }
    }
    Some(best)
}
