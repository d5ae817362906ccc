//! Mirror command - clone every project's default branch and check out the rest

use std::process::ExitCode;

use clap::Args;
use glmirror_core::{
    CliOverrides, Config, DefaultBranchSource, ExistingPolicy, GitInvoker, Mirror, MirrorOptions,
    ProcessRunner,
};

use super::{gitlab_client, load_token};

/// Arguments for the mirror command
#[derive(Args, Debug)]
pub struct MirrorArgs {
    /// Show what would be executed without running git
    #[arg(long)]
    pub dry_run: bool,

    /// Branch cloned first (overrides config and env)
    #[arg(long)]
    pub default_branch: Option<String>,

    /// Where the cloned branch comes from: fixed, project or last-activity
    #[arg(long)]
    pub default_branch_source: Option<DefaultBranchSource>,

    /// What to do when a project directory exists: fetch, skip or clone
    #[arg(long)]
    pub on_existing: Option<ExistingPolicy>,
}

impl MirrorArgs {
    /// Fold this command's flags into the global overrides
    pub fn apply(&self, mut overrides: CliOverrides) -> CliOverrides {
        overrides.default_branch = self.default_branch.clone();
        overrides.default_branch_source = self.default_branch_source;
        overrides.on_existing = self.on_existing;
        overrides
    }

    /// Execute the mirror command
    pub async fn execute(&self, verbose: bool, config: &Config) -> anyhow::Result<ExitCode> {
        let token = load_token()?;
        let client = gitlab_client(config, &token)?;

        let runner = ProcessRunner::new().with_timeout(config.mirror.command_timeout);
        let git = GitInvoker::new(runner, config.mirror.clone_mode, token)
            .with_git_path(&config.mirror.git_path);
        let options = MirrorOptions::from_config(&config.mirror)?.with_dry_run(self.dry_run);

        println!("glmirror");
        println!("========");
        println!();
        println!("GitLab: {}", config.gitlab.url);
        println!("Root: {}", options.root.display());
        println!("Clone mode: {}", config.mirror.clone_mode);
        if verbose {
            println!("Default branch: {} ({})", options.default_branch, options.default_branch_source);
            println!("Existing directories: {}", options.on_existing);
        }
        println!();

        let report = Mirror::new(client, git, options).run().await?;

        println!();
        print!("{}", report);

        if report.has_failures() {
            Ok(ExitCode::FAILURE)
        } else {
            Ok(ExitCode::SUCCESS)
        }
    }
}
