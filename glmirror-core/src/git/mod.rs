//! Git operations for glmirror
//!
//! Cloning and branch checkout shell out to the `git` binary through a
//! [`CommandRunner`]; inspection of existing mirrors uses git2.

mod invoker;
mod repo;
mod runner;

pub use invoker::{embed_token, project_dir, GitInvoker};
pub use repo::LocalRepo;
pub use runner::{CommandOutput, CommandRunner, CommandSpec, ProcessRunner};
