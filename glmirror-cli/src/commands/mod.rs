//! CLI command implementations

pub mod list;
pub mod mirror;

pub use list::ListArgs;
pub use mirror::MirrorArgs;

use glmirror_core::Config;
use glmirror_core::Secrets;
use glmirror_gitlab::GitLabClient;

/// Load the GitLab token from GITLAB_TOKEN or the secrets file
fn load_token() -> anyhow::Result<String> {
    let secrets = Secrets::load()?;
    secrets.gitlab_token().ok_or_else(|| {
        anyhow::anyhow!(
            "GitLab token not found. Set GITLAB_TOKEN environment variable \
             or add it to ~/.config/glmirror/secrets.toml (see `glmirror init-secrets`)"
        )
    })
}

/// Build an API client from configuration and the loaded token
fn gitlab_client(config: &Config, token: &str) -> anyhow::Result<GitLabClient> {
    Ok(GitLabClient::from_config(&config.gitlab, token)?)
}
