//! Configuration management for glmirror
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (GLMIRROR_*)
//! 3. Config file (~/.config/glmirror/config.toml)
//! 4. Default values
//!
//! The access token is not part of this file; see [`crate::secrets`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// How repositories are cloned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloneMode {
    /// Use the project's SSH URL verbatim
    #[default]
    Ssh,
    /// Use the HTTP URL with the token embedded as an oauth2 credential
    Http,
}

impl CloneMode {
    /// Get the short name for this mode
    pub fn name(&self) -> &'static str {
        match self {
            CloneMode::Ssh => "ssh",
            CloneMode::Http => "http",
        }
    }
}

impl fmt::Display for CloneMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for CloneMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ssh" => Ok(CloneMode::Ssh),
            "http" | "https" => Ok(CloneMode::Http),
            _ => Err(format!("Unknown clone mode: {} (expected ssh or http)", s)),
        }
    }
}

/// Where the name of the branch to clone comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DefaultBranchSource {
    /// Always the configured `default_branch` name
    #[default]
    Fixed,
    /// The project's default branch as reported by GitLab
    Project,
    /// The branch with the most recent commit
    LastActivity,
}

impl DefaultBranchSource {
    /// Get the short name for this source
    pub fn name(&self) -> &'static str {
        match self {
            DefaultBranchSource::Fixed => "fixed",
            DefaultBranchSource::Project => "project",
            DefaultBranchSource::LastActivity => "last-activity",
        }
    }
}

impl fmt::Display for DefaultBranchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for DefaultBranchSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed" => Ok(DefaultBranchSource::Fixed),
            "project" => Ok(DefaultBranchSource::Project),
            "last-activity" | "last_activity" | "latest" => Ok(DefaultBranchSource::LastActivity),
            _ => Err(format!(
                "Unknown default branch source: {} (expected fixed, project or last-activity)",
                s
            )),
        }
    }
}

/// What to do when a project's directory already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExistingPolicy {
    /// Fetch into the existing repository and check out new branches
    #[default]
    Fetch,
    /// Leave the directory alone
    Skip,
    /// Attempt the clone anyway
    Clone,
}

impl ExistingPolicy {
    /// Get the short name for this policy
    pub fn name(&self) -> &'static str {
        match self {
            ExistingPolicy::Fetch => "fetch",
            ExistingPolicy::Skip => "skip",
            ExistingPolicy::Clone => "clone",
        }
    }
}

impl fmt::Display for ExistingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ExistingPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fetch" => Ok(ExistingPolicy::Fetch),
            "skip" => Ok(ExistingPolicy::Skip),
            "clone" => Ok(ExistingPolicy::Clone),
            _ => Err(format!(
                "Unknown existing-directory policy: {} (expected fetch, skip or clone)",
                s
            )),
        }
    }
}

/// GitLab API settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GitLabConfig {
    /// Base URL of the GitLab instance
    pub url: String,

    /// Page size for list requests (GitLab caps this at 100)
    pub per_page: u32,

    /// Follow `X-Next-Page` instead of stopping after the first page
    pub paginate: bool,

    /// Upper bound on pages fetched per listing
    pub max_pages: u32,

    /// Timeout for a single HTTP request
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            url: "https://gitlab.com".to_string(),
            per_page: 100,
            paginate: true,
            max_pages: 1000,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Mirroring settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Local root directory; projects land in `<root>/<path_with_namespace>`
    pub root: Option<PathBuf>,

    /// Clone transport
    pub clone_mode: CloneMode,

    /// Branch cloned first when `default_branch_source` is `fixed`, and the
    /// fallback for the other sources
    pub default_branch: String,

    /// Where the cloned branch name comes from
    pub default_branch_source: DefaultBranchSource,

    /// What to do with a project directory that already exists
    pub on_existing: ExistingPolicy,

    /// Path to the git executable
    pub git_path: String,

    /// Timeout for a single git invocation
    #[serde(with = "humantime_serde")]
    pub command_timeout: Duration,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            root: None,
            clone_mode: CloneMode::default(),
            default_branch: "master".to_string(),
            default_branch_source: DefaultBranchSource::default(),
            on_existing: ExistingPolicy::default(),
            git_path: "git".to_string(),
            command_timeout: Duration::from_secs(600),
        }
    }
}

impl MirrorConfig {
    /// The configured root, or `~/.cache/glmirror/mirrors`
    pub fn root_dir(&self) -> Result<PathBuf> {
        match &self.root {
            Some(root) => Ok(root.clone()),
            None => default_mirror_root(),
        }
    }
}

/// Get the default mirror root directory
///
/// Returns `~/.cache/glmirror/mirrors`
pub fn default_mirror_root() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .ok_or_else(|| Error::Config("Could not determine cache directory".to_string()))?;

    Ok(cache_dir.join("glmirror").join("mirrors"))
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub gitlab_url: Option<String>,
    pub root: Option<PathBuf>,
    pub clone_mode: Option<CloneMode>,
    pub default_branch: Option<String>,
    pub default_branch_source: Option<DefaultBranchSource>,
    pub on_existing: Option<ExistingPolicy>,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// GitLab API configuration
    pub gitlab: GitLabConfig,

    /// Mirroring configuration
    pub mirror: MirrorConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/glmirror/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("glmirror").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - GLMIRROR_GITLAB_URL: GitLab base URL
    /// - GLMIRROR_ROOT: Mirror root directory
    /// - GLMIRROR_CLONE_MODE: ssh or http
    /// - GLMIRROR_DEFAULT_BRANCH: Branch cloned first
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = lookup("GLMIRROR_GITLAB_URL") {
            self.gitlab.url = url;
        }

        if let Some(root) = lookup("GLMIRROR_ROOT") {
            self.mirror.root = Some(PathBuf::from(root));
        }

        if let Some(mode) = lookup("GLMIRROR_CLONE_MODE") {
            self.mirror.clone_mode = mode.parse().map_err(Error::Config)?;
        }

        if let Some(branch) = lookup("GLMIRROR_DEFAULT_BRANCH") {
            self.mirror.default_branch = branch;
        }

        Ok(self)
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, cli: CliOverrides) -> Self {
        if let Some(url) = cli.gitlab_url {
            self.gitlab.url = url;
        }

        if let Some(root) = cli.root {
            self.mirror.root = Some(root);
        }

        if let Some(mode) = cli.clone_mode {
            self.mirror.clone_mode = mode;
        }

        if let Some(branch) = cli.default_branch {
            self.mirror.default_branch = branch;
        }

        if let Some(source) = cli.default_branch_source {
            self.mirror.default_branch_source = source;
        }

        if let Some(policy) = cli.on_existing {
            self.mirror.on_existing = policy;
        }

        self
    }

    /// Reject settings that cannot work
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.gitlab.url)
            .map_err(|e| Error::Config(format!("Invalid GitLab URL {}: {}", self.gitlab.url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "GitLab URL must be http or https: {}",
                self.gitlab.url
            )));
        }

        if self.gitlab.per_page == 0 {
            return Err(Error::Config("gitlab.per_page must be at least 1".to_string()));
        }

        if self.mirror.default_branch.trim().is_empty() {
            return Err(Error::Config("mirror.default_branch must not be empty".to_string()));
        }

        if self.mirror.command_timeout.is_zero() {
            return Err(Error::Config("mirror.command_timeout must be positive".to_string()));
        }

        Ok(())
    }

    /// Load configuration with all overrides applied, then validate it
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(config_path: Option<&Path>, cli: CliOverrides) -> Result<Self> {
        let base = match config_path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load()?,
        };
        let config = base.with_env_overrides()?.with_cli_overrides(cli);
        config.validate()?;
        Ok(config)
    }
}
