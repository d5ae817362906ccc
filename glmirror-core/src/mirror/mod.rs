//! The mirror orchestrator
//!
//! A single sequential pass: list groups, list each group's projects, list
//! each project's branches, clone the default branch and check out every
//! other branch. Only a failed group listing aborts the pass; every other
//! failure is logged, counted in the [`MirrorReport`] and skipped.

mod report;

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::config::{DefaultBranchSource, ExistingPolicy, MirrorConfig};
use crate::git::{project_dir, CommandRunner, GitInvoker, LocalRepo};
use crate::source::ProjectSource;
use crate::types::{last_activity_branch, Branch, Group, Project};
use crate::{Error, Result};

pub use report::{MirrorFailure, MirrorReport};

/// Settings for one mirror pass
#[derive(Debug, Clone)]
pub struct MirrorOptions {
    /// Directory every project path is resolved against
    pub root: PathBuf,
    /// Fixed default branch name, also the fallback for other sources
    pub default_branch: String,
    /// Where the cloned branch name comes from
    pub default_branch_source: DefaultBranchSource,
    /// What to do with directories that already exist
    pub on_existing: ExistingPolicy,
    /// Log planned commands instead of running them
    pub dry_run: bool,
}

impl MirrorOptions {
    /// Options rooted at `root` with default branch "master"
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let defaults = MirrorConfig::default();
        Self {
            root: root.into(),
            default_branch: defaults.default_branch,
            default_branch_source: defaults.default_branch_source,
            on_existing: defaults.on_existing,
            dry_run: false,
        }
    }

    /// Build options from the mirror section of the configuration
    pub fn from_config(config: &MirrorConfig) -> Result<Self> {
        Ok(Self {
            root: config.root_dir()?,
            default_branch: config.default_branch.clone(),
            default_branch_source: config.default_branch_source,
            on_existing: config.on_existing,
            dry_run: false,
        })
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Mirrors every project reachable through a [`ProjectSource`]
pub struct Mirror<S, R> {
    source: S,
    git: GitInvoker<R>,
    options: MirrorOptions,
}

impl<S, R> std::fmt::Debug for Mirror<S, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mirror")
            .field("git", &self.git)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<S: ProjectSource, R: CommandRunner> Mirror<S, R> {
    /// Create an orchestrator
    pub fn new(source: S, git: GitInvoker<R>, options: MirrorOptions) -> Self {
        Self {
            source,
            git,
            options,
        }
    }

    /// Get the git invoker
    pub fn git(&self) -> &GitInvoker<R> {
        &self.git
    }

    /// Get the pass options
    pub fn options(&self) -> &MirrorOptions {
        &self.options
    }

    /// Run one full pass.
    ///
    /// Fails only when the root cannot be created or the group listing fails.
    pub async fn run(&self) -> Result<MirrorReport> {
        let root = &self.options.root;
        info!(
            root = %root.display(),
            clone_mode = %self.git.clone_mode(),
            dry_run = self.options.dry_run,
            "Starting mirror pass"
        );

        if !self.options.dry_run {
            std::fs::create_dir_all(root).map_err(|e| {
                Error::Other(format!(
                    "Failed to create mirror root {}: {}",
                    root.display(),
                    e
                ))
            })?;
        }

        let groups = self.source.list_groups().await.map_err(|e| {
            error!(error = %e, "Failed to list groups");
            Error::Fetch(e)
        })?;
        info!(count = groups.len(), "Fetched groups");

        let mut report = MirrorReport {
            dry_run: self.options.dry_run,
            groups: groups.len(),
            ..Default::default()
        };

        for group in &groups {
            self.mirror_group(group, &mut report).await;
        }

        info!(
            groups = report.groups,
            projects = report.projects,
            cloned = report.projects_cloned,
            refreshed = report.projects_refreshed,
            branches = report.branches_checked_out,
            failures = report.failures.len(),
            "Mirror pass finished"
        );

        Ok(report)
    }

    async fn mirror_group(&self, group: &Group, report: &mut MirrorReport) {
        let projects = match self.source.list_projects(group.id).await {
            Ok(projects) => projects,
            Err(e) => {
                warn!(group = %group.full_path, error = %e, "Failed to list projects, skipping group");
                report.groups_failed += 1;
                report.fail(format!("group {}", group.full_path), &e);
                return;
            }
        };

        info!(group = %group.full_path, count = projects.len(), "Fetched projects");
        report.projects += projects.len();

        for project in &projects {
            self.mirror_project(project, report).await;
        }
    }

    async fn mirror_project(&self, project: &Project, report: &mut MirrorReport) {
        let path = project.path_with_namespace.as_str();

        let branches = match self.source.list_branches(project.id).await {
            Ok(branches) => branches,
            Err(e) => {
                warn!(project = %path, error = %e, "Failed to list branches, skipping project");
                report.projects_failed += 1;
                report.fail(path, &e);
                return;
            }
        };

        if branches.is_empty() {
            warn!(project = %path, "Project has no branches, skipping");
            report.projects_empty += 1;
            return;
        }

        let dir = match project_dir(&self.options.root, project) {
            Ok(dir) => dir,
            Err(e) => {
                warn!(project = %path, error = %e, "Skipping project");
                report.projects_failed += 1;
                report.fail(path, &e);
                return;
            }
        };

        let default_branch = self.resolve_default_branch(project, &branches);
        debug!(project = %path, default_branch = %default_branch, branches = branches.len(), "Mirroring project");

        if dir.exists() {
            match self.options.on_existing {
                ExistingPolicy::Skip => {
                    info!(project = %path, dir = %dir.display(), "Directory exists, skipping");
                    report.projects_existing += 1;
                    return;
                }
                ExistingPolicy::Fetch if LocalRepo::is_repo(&dir) => {
                    self.refresh_project(project, &dir, &default_branch, &branches, report)
                        .await;
                    return;
                }
                ExistingPolicy::Fetch | ExistingPolicy::Clone => {}
            }
        }

        if self.options.dry_run {
            info!(project = %path, branch = %default_branch, "Would clone");
        } else if let Err(e) = self
            .git
            .clone(&default_branch, project, &self.options.root)
            .await
        {
            warn!(project = %path, branch = %default_branch, error = %e, "Clone failed, skipping branches");
            report.clone_failures += 1;
            report.fail(format!("{}@{}", path, default_branch), &e);
            return;
        }
        report.projects_cloned += 1;

        let others = branches.iter().filter(|b| b.name != default_branch);
        self.checkout_branches(path, &dir, others, report).await;
    }

    async fn refresh_project(
        &self,
        project: &Project,
        dir: &Path,
        default_branch: &str,
        branches: &[Branch],
        report: &mut MirrorReport,
    ) {
        let path = project.path_with_namespace.as_str();

        if self.options.dry_run {
            info!(project = %path, "Would fetch existing mirror");
        } else if let Err(e) = self.git.fetch(dir).await {
            warn!(project = %path, error = %e, "Fetch failed, skipping branches");
            report.fetch_failures += 1;
            report.fail(path, &e);
            return;
        }
        report.projects_refreshed += 1;

        let local = match LocalRepo::open(dir).and_then(|repo| repo.local_branches()) {
            Ok(local) => local,
            Err(e) => {
                warn!(project = %path, error = %e, "Could not read local branches");
                Vec::new()
            }
        };

        let missing = branches
            .iter()
            .filter(|b| b.name != default_branch && !local.contains(&b.name));
        self.checkout_branches(path, dir, missing, report).await;
    }

    async fn checkout_branches<'a>(
        &self,
        path: &str,
        dir: &Path,
        branches: impl Iterator<Item = &'a Branch>,
        report: &mut MirrorReport,
    ) {
        for branch in branches {
            if self.options.dry_run {
                info!(project = %path, branch = %branch.name, "Would check out");
                report.branches_checked_out += 1;
                continue;
            }

            match self.git.checkout_branch(&branch.name, dir).await {
                Ok(()) => report.branches_checked_out += 1,
                Err(e) => {
                    warn!(project = %path, branch = %branch.name, error = %e, "Checkout failed");
                    report.checkout_failures += 1;
                    report.fail(format!("{}@{}", path, branch.name), &e);
                }
            }
        }
    }

    /// The branch to clone for `project`
    pub fn resolve_default_branch(&self, project: &Project, branches: &[Branch]) -> String {
        let fixed = &self.options.default_branch;
        match self.options.default_branch_source {
            DefaultBranchSource::Fixed => fixed.clone(),
            DefaultBranchSource::Project => project
                .default_branch
                .clone()
                .or_else(|| {
                    branches
                        .iter()
                        .find(|b| b.is_default)
                        .map(|b| b.name.clone())
                })
                .unwrap_or_else(|| fixed.clone()),
            DefaultBranchSource::LastActivity => last_activity_branch(branches)
                .filter(|b| b.committed_at.is_some())
                .map(|b| b.name.clone())
                .unwrap_or_else(|| fixed.clone()),
        }
    }
}
