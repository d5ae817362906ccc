//! GitLab REST API response shapes and their conversion to core types

use chrono::{DateTime, Utc};
use glmirror_core::{Branch, Group, Project};
use serde::Deserialize;

/// Entry of `GET /groups`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiGroup {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub full_path: Option<String>,
}

/// Entry of `GET /groups/:id/projects`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiProject {
    pub id: u64,
    pub name: String,
    pub path_with_namespace: String,
    #[serde(default)]
    pub ssh_url_to_repo: Option<String>,
    #[serde(default)]
    pub http_url_to_repo: Option<String>,
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// Entry of `GET /projects/:id/repository/branches`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiBranch {
    pub name: String,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub commit: Option<ApiCommit>,
}

/// The `commit` object embedded in a branch
#[derive(Debug, Clone, Deserialize)]
pub struct ApiCommit {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub committed_date: Option<DateTime<Utc>>,
}

impl From<ApiGroup> for Group {
    fn from(g: ApiGroup) -> Self {
        let full_path = g
            .full_path
            .or(g.path)
            .unwrap_or_else(|| g.name.clone());
        Group {
            id: g.id,
            name: g.name,
            full_path,
        }
    }
}

impl From<ApiProject> for Project {
    fn from(p: ApiProject) -> Self {
        Project {
            id: p.id,
            name: p.name,
            path_with_namespace: p.path_with_namespace,
            ssh_url: p.ssh_url_to_repo.unwrap_or_default(),
            http_url: p.http_url_to_repo.unwrap_or_default(),
            default_branch: p.default_branch,
        }
    }
}

impl From<ApiBranch> for Branch {
    fn from(b: ApiBranch) -> Self {
        Branch {
            name: b.name,
            committed_at: b.commit.and_then(|c| c.committed_date),
            is_default: b.default,
        }
    }
}
