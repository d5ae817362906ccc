//! glmirror core - mirror every project and branch of a GitLab instance onto local disk
//!
//! This crate holds the pieces that do not depend on a particular HTTP stack:
//! configuration, secrets, the `ProjectSource` API seam, the `CommandRunner`
//! process seam, the git invoker and the mirror orchestrator.

pub mod config;
pub mod error;
pub mod git;
pub mod mirror;
pub mod secrets;
pub mod source;
pub mod types;

pub use config::{
    default_mirror_root, CliOverrides, CloneMode, Config, DefaultBranchSource, ExistingPolicy,
    GitLabConfig, MirrorConfig,
};
pub use error::{Error, Result};
pub use git::{CommandOutput, CommandRunner, CommandSpec, GitInvoker, LocalRepo, ProcessRunner};
pub use mirror::{Mirror, MirrorFailure, MirrorOptions, MirrorReport};
pub use secrets::{GitLabSecrets, Secrets};
pub use source::{FetchError, ProjectSource};
pub use types::{last_activity_branch, Branch, Group, Project};
