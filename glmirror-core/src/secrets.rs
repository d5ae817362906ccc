//! Secrets management for glmirror
//!
//! The GitLab token is stored separately from configuration to avoid accidental
//! sharing. The secrets file is located at `~/.config/glmirror/secrets.toml`
//! and must have restrictive permissions (0600 on Unix).
//!
//! Loading priority:
//! 1. Environment variable (GITLAB_TOKEN)
//! 2. Secrets file (~/.config/glmirror/secrets.toml)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Environment variable holding the personal access token
pub const TOKEN_ENV: &str = "GITLAB_TOKEN";

/// Secrets structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Secrets {
    /// GitLab configuration
    pub gitlab: GitLabSecrets,
}

/// GitLab-related secrets
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GitLabSecrets {
    /// GitLab personal access token
    pub token: Option<String>,
}

impl std::fmt::Debug for GitLabSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitLabSecrets")
            .field("token", &self.token.as_ref().map(|_| "****"))
            .finish()
    }
}

impl Secrets {
    /// Load secrets from the default location
    ///
    /// Returns default (empty) secrets if file doesn't exist
    pub fn load() -> Result<Self> {
        let secrets_path = Self::default_secrets_path();

        if let Some(path) = secrets_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load secrets from a specific file with permission checking
    pub fn load_from_file(path: &Path) -> Result<Self> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let metadata = std::fs::metadata(path).map_err(Error::Io)?;
            let mode = metadata.permissions().mode();

            if mode & 0o077 != 0 {
                return Err(Error::Config(format!(
                    "Secrets file {} has insecure permissions {:o}. \
                     Please run: chmod 600 {}",
                    path.display(),
                    mode & 0o777,
                    path.display()
                )));
            }

            debug!(path = %path.display(), mode = format!("{:o}", mode & 0o777), "Secrets file permissions OK");
        }

        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        let mut secrets: Secrets = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse secrets: {}", e)))?;

        if let Some(ref mut token) = secrets.gitlab.token {
            *token = token.trim().to_string();
        }

        Ok(secrets)
    }

    /// Get the default secrets file path
    ///
    /// Returns `~/.config/glmirror/secrets.toml` on Unix
    pub fn default_secrets_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("glmirror").join("secrets.toml"))
    }

    /// Get the GitLab token with environment variable override
    ///
    /// Priority: GITLAB_TOKEN env var > secrets file
    pub fn gitlab_token(&self) -> Option<String> {
        self.gitlab_token_from(std::env::var(TOKEN_ENV).ok())
    }

    fn gitlab_token_from(&self, env_token: Option<String>) -> Option<String> {
        if let Some(token) = env_token {
            let token = token.trim().to_string();
            if !token.is_empty() {
                debug!("Using GitLab token from {} environment variable", TOKEN_ENV);
                return Some(token);
            }
        }

        if let Some(ref token) = self.gitlab.token {
            if !token.is_empty() {
                debug!("Using GitLab token from secrets file");
                return Some(token.clone());
            }
        }

        None
    }

    /// Create a template secrets file
    ///
    /// Creates parent directories if needed and sets secure permissions.
    /// Uses the default location when `path` is `None`.
    pub fn create_template(path: Option<&Path>) -> Result<PathBuf> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_secrets_path()
                .ok_or_else(|| Error::Config("Could not determine secrets path".to_string()))?,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(Error::Io)?;
        }

        // Don't overwrite existing file
        if path.exists() {
            return Err(Error::Config(format!(
                "Secrets file already exists at {}",
                path.display()
            )));
        }

        let template = r#"# glmirror secrets
# This file contains sensitive credentials - do not share or commit to version control
#
# IMPORTANT: This file must have restrictive permissions (chmod 600)

[gitlab]
# GitLab personal access token
# Create at: <your GitLab>/-/user_settings/personal_access_tokens
# Required scopes: read_api, read_repository
token = ""
"#;

        std::fs::write(&path, template).map_err(Error::Io)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&path, perms).map_err(Error::Io)?;
        }

        warn!(path = %path.display(), "Created secrets template - please edit and add your token");

        Ok(path)
    }
}
