//! Clone and checkout through the git binary

use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};
use url::Url;

use super::runner::{CommandOutput, CommandRunner, CommandSpec};
use crate::config::CloneMode;
use crate::types::Project;
use crate::{Error, Result};

/// Username GitLab expects when a token is used as an HTTP password
const OAUTH2_USER: &str = "oauth2";

/// Rewrite an HTTP(S) clone URL to carry `oauth2:<token>@` in its authority
pub fn embed_token(http_url: &str, token: &str) -> Result<Url> {
    let mut url = Url::parse(http_url)
        .map_err(|e| Error::Config(format!("Invalid HTTP clone URL {}: {}", http_url, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Config(format!(
            "Expected an http(s) clone URL, got {}",
            http_url
        )));
    }

    url.set_username(OAUTH2_USER)
        .and_then(|_| url.set_password(Some(token)))
        .map_err(|_| Error::Config(format!("Cannot add credentials to {}", http_url)))?;

    Ok(url)
}

/// The local directory for a project: `<root>/<path_with_namespace>`.
///
/// Rejects namespaced paths that are empty, absolute or climb out of `root`.
pub fn project_dir(root: &Path, project: &Project) -> Result<PathBuf> {
    let relative = Path::new(&project.path_with_namespace);
    let well_formed = relative.components().count() > 0
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

    if !well_formed {
        return Err(Error::Config(format!(
            "Refusing unsafe project path: {:?}",
            project.path_with_namespace
        )));
    }

    Ok(root.join(relative))
}

/// Issues the git commands that materialise a mirror
pub struct GitInvoker<R> {
    runner: R,
    git_path: String,
    clone_mode: CloneMode,
    token: String,
}

impl<R> std::fmt::Debug for GitInvoker<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitInvoker")
            .field("git_path", &self.git_path)
            .field("clone_mode", &self.clone_mode)
            .finish_non_exhaustive()
    }
}

impl<R: CommandRunner> GitInvoker<R> {
    /// Create an invoker running `git` from PATH
    pub fn new(runner: R, clone_mode: CloneMode, token: impl Into<String>) -> Self {
        Self {
            runner,
            git_path: "git".to_string(),
            clone_mode,
            token: token.into(),
        }
    }

    /// Set a custom path to the git executable
    pub fn with_git_path(mut self, path: impl Into<String>) -> Self {
        self.git_path = path.into();
        self
    }

    /// Get the underlying runner
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Get the clone transport
    pub fn clone_mode(&self) -> CloneMode {
        self.clone_mode
    }

    fn git(&self, current_dir: impl Into<PathBuf>) -> CommandSpec {
        CommandSpec::new(&self.git_path, current_dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .redact(&self.token)
    }

    /// The URL a project is cloned from.
    ///
    /// SSH mode returns the project's SSH URL unchanged; HTTP mode embeds
    /// the token. The result may contain the token, so never log it.
    pub fn clone_url(&self, project: &Project) -> Result<String> {
        match self.clone_mode {
            CloneMode::Ssh => Ok(project.ssh_url.clone()),
            CloneMode::Http => Ok(embed_token(&project.http_url, &self.token)?.to_string()),
        }
    }

    /// `git clone -b <branch> <url> <path_with_namespace>`, run from `root`
    pub fn clone_command(&self, branch: &str, project: &Project, root: &Path) -> Result<CommandSpec> {
        project_dir(root, project)?;

        let mut spec = self.git(root);
        let url = match self.clone_mode {
            CloneMode::Ssh => project.ssh_url.clone(),
            CloneMode::Http => {
                let url = embed_token(&project.http_url, &self.token)?;
                // The URL form is percent-encoded and may differ from the raw token
                if let Some(encoded) = url.password() {
                    spec = spec.redact(encoded);
                }
                url.to_string()
            }
        };

        Ok(spec.args([
            "clone",
            "-b",
            branch,
            url.as_str(),
            project.path_with_namespace.as_str(),
        ]))
    }

    /// `git checkout -b <branch> origin/<branch>`, run inside the project
    pub fn checkout_command(&self, branch: &str, workdir: &Path) -> CommandSpec {
        self.git(workdir)
            .args(["checkout", "-b", branch])
            .arg(format!("origin/{}", branch))
    }

    /// `git fetch --all --prune`, run inside the project
    pub fn fetch_command(&self, workdir: &Path) -> CommandSpec {
        self.git(workdir).args(["fetch", "--all", "--prune"])
    }

    /// Clone `branch` of `project` into `<root>/<path_with_namespace>`
    pub async fn clone(&self, branch: &str, project: &Project, root: &Path) -> Result<()> {
        let spec = self.clone_command(branch, project, root)?;
        self.execute(&spec).await
    }

    /// Create a local branch tracking `origin/<branch>` in `workdir`
    pub async fn checkout_branch(&self, branch: &str, workdir: &Path) -> Result<()> {
        self.execute(&self.checkout_command(branch, workdir)).await
    }

    /// Refresh every remote of the repository in `workdir`
    pub async fn fetch(&self, workdir: &Path) -> Result<()> {
        self.execute(&self.fetch_command(workdir)).await
    }

    async fn execute(&self, spec: &CommandSpec) -> Result<()> {
        let command = spec.display();
        info!(command = %command, dir = %spec.current_dir.display(), "Running git");

        let output = self.runner.run(spec).await?;
        log_output(spec, &output);

        if !output.success {
            return Err(Error::Command {
                command,
                status: output.status_text(),
                stderr: spec.redact_text(output.stderr.trim()),
            });
        }

        Ok(())
    }
}

fn log_output(spec: &CommandSpec, output: &CommandOutput) {
    let stdout = spec.redact_text(output.stdout.trim());
    let stderr = spec.redact_text(output.stderr.trim());

    if !stdout.is_empty() {
        debug!(stdout = %stdout, "git stdout");
    }

    if output.success {
        // git writes progress to stderr even when it succeeds
        if !stderr.is_empty() {
            info!(stderr = %stderr, "git stderr");
        }
    } else {
        warn!(status = %output.status_text(), stderr = %stderr, "git failed");
    }
}
