//! List command - show what a mirror pass would see

use clap::Args;
use glmirror_core::{Branch, Config, Project, ProjectSource};

use super::{gitlab_client, load_token};

/// Arguments for the list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only list groups and projects, skip the per-project branch requests
    #[arg(long)]
    pub no_branches: bool,
}

impl ListArgs {
    /// Execute the list command
    pub async fn execute(&self, verbose: bool, config: &Config) -> anyhow::Result<()> {
        let token = load_token()?;
        let client = gitlab_client(config, &token)?;

        let groups = client.list_groups().await?;
        if groups.is_empty() {
            println!("No groups visible to this token.");
            return Ok(());
        }

        for group in &groups {
            if verbose {
                println!("{} (id {})", group.full_path, group.id);
            } else {
                println!("{}", group.full_path);
            }

            let projects = match client.list_projects(group.id).await {
                Ok(projects) => projects,
                Err(e) => {
                    println!("  ! failed to list projects: {}", e);
                    continue;
                }
            };

            for project in &projects {
                println!("  {}", project.path_with_namespace);
                if self.no_branches {
                    continue;
                }

                match client.list_branches(project.id).await {
                    Ok(branches) if branches.is_empty() => println!("    (no branches)"),
                    Ok(branches) => {
                        for branch in &branches {
                            println!("    {}", branch_line(project, branch));
                        }
                    }
                    Err(e) => println!("    ! failed to list branches: {}", e),
                }
            }
        }

        Ok(())
    }
}

/// One branch row: default marker, name and last commit time
fn branch_line(project: &Project, branch: &Branch) -> String {
    let is_default =
        branch.is_default || project.default_branch.as_deref() == Some(branch.name.as_str());
    let marker = if is_default { "*" } else { " " };
    match branch.committed_at {
        Some(at) => format!("{} {} ({})", marker, branch.name, at.format("%Y-%m-%d %H:%M")),
        None => format!("{} {}", marker, branch.name),
    }
}
