//! glmirror CLI - mirror every GitLab project and branch onto local disk

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use glmirror_core::{CliOverrides, CloneMode, Config, Secrets};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{ListArgs, MirrorArgs};

/// glmirror: clone every project and branch visible to a GitLab token
#[derive(Parser, Debug)]
#[command(name = "glmirror")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to read instead of ~/.config/glmirror/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// GitLab base URL (overrides config and env)
    #[arg(long, global = true, env = "GLMIRROR_GITLAB_URL")]
    gitlab_url: Option<String>,

    /// Local mirror root directory (overrides config and env)
    #[arg(long, global = true, env = "GLMIRROR_ROOT")]
    root: Option<PathBuf>,

    /// Clone transport: ssh or http (overrides config and env)
    #[arg(long, global = true)]
    clone_mode: Option<CloneMode>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Clone or refresh every project and branch
    #[command(visible_alias = "m")]
    Mirror(MirrorArgs),

    /// List groups, projects and branches without cloning
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// Show current configuration
    Config,

    /// Create a secrets file template for the GitLab token
    InitSecrets,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut overrides = CliOverrides {
        gitlab_url: cli.gitlab_url.clone(),
        root: cli.root.clone(),
        clone_mode: cli.clone_mode,
        ..Default::default()
    };
    if let Some(Commands::Mirror(args)) = &cli.command {
        overrides = args.apply(overrides);
    }

    let config = Config::load_with_overrides(cli.config.as_deref(), overrides)?;

    if cli.verbose {
        tracing::info!(
            gitlab_url = %config.gitlab.url,
            clone_mode = %config.mirror.clone_mode,
            root = ?config.mirror.root,
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("glmirror {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Mirror(args)) => {
            return args.execute(cli.verbose, &config).await;
        }
        Some(Commands::List(args)) => {
            args.execute(cli.verbose, &config).await?;
        }
        Some(Commands::Config) => {
            print_config(&config, cli.config.as_deref());
        }
        Some(Commands::InitSecrets) => {
            let path = Secrets::create_template(None)?;
            println!("Created {}", path.display());
            println!("Add your token there, or set the GITLAB_TOKEN environment variable.");
        }
        None => {
            println!("glmirror - mirror every GitLab project and branch onto local disk");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_config(config: &Config, explicit_path: Option<&std::path::Path>) {
    println!("glmirror Configuration");
    println!("======================");
    println!();
    println!("GitLab:");
    println!("  url: {}", config.gitlab.url);
    println!("  per_page: {}", config.gitlab.per_page);
    println!("  paginate: {}", config.gitlab.paginate);
    println!("  max_pages: {}", config.gitlab.max_pages);
    println!("  request_timeout: {:?}", config.gitlab.request_timeout);
    println!();
    println!("Mirror:");
    match config.mirror.root_dir() {
        Ok(root) => println!("  root: {}", root.display()),
        Err(e) => println!("  root: (unavailable: {})", e),
    }
    println!("  clone_mode: {}", config.mirror.clone_mode);
    println!("  default_branch: {}", config.mirror.default_branch);
    println!("  default_branch_source: {}", config.mirror.default_branch_source);
    println!("  on_existing: {}", config.mirror.on_existing);
    println!("  git_path: {}", config.mirror.git_path);
    println!("  command_timeout: {:?}", config.mirror.command_timeout);
    println!();

    let path = explicit_path
        .map(std::path::Path::to_path_buf)
        .or_else(Config::default_config_path);
    if let Some(path) = path {
        println!("Config file: {}", path.display());
        if path.exists() {
            println!("  (exists)");
        } else {
            println!("  (not found - using defaults)");
        }
    }

    let token = Secrets::load()
        .map(|s| s.gitlab_token().is_some())
        .unwrap_or(false);
    println!(
        "Token: {}",
        if token { "available" } else { "not found (set GITLAB_TOKEN or run init-secrets)" }
    );
}
