//! glmirror GitLab - REST API v4 client
//!
//! Implements [`glmirror_core::ProjectSource`] over GitLab's groups, group
//! projects and repository branches endpoints.

mod client;
mod error;
mod types;

pub use client::{next_page, ClientOptions, GitLabClient, API_PREFIX, MAX_PER_PAGE};
pub use error::{GitLabError, Result};
pub use types::{ApiBranch, ApiCommit, ApiGroup, ApiProject};
