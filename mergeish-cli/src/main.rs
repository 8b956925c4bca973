//! mergeish CLI - manage multiple git repositories as a single monorepo
//!
//! Every command fans out over the repositories listed in `mergeish.toml`
//! and prints one line per repository.

mod commands;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use mergeish_core::{parse_duration, SettingsOverrides};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{AddArgs, BranchArgs, CommitArgs, Context, GitArgs, PrArgs, PullArgs, PushArgs};

/// mergeish: keep several git repositories in lockstep
#[derive(Parser, Debug)]
#[command(name = "mergeish")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (searched upward from the current directory otherwise)
    #[arg(short, long, global = true, env = "MERGEISH_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use ASCII status markers instead of emoji
    #[arg(long, global = true)]
    no_emoji: bool,

    /// Work on all repositories concurrently (overrides config and env)
    #[arg(long, global = true, conflicts_with = "sequential")]
    parallel: bool,

    /// Work on one repository at a time (overrides config and env)
    #[arg(long, global = true)]
    sequential: bool,

    /// Maximum number of repositories worked on at once
    #[arg(long, global = true)]
    max_concurrency: Option<usize>,

    /// Deadline for each repository, e.g. `90s` or `5m`
    #[arg(long, global = true, value_parser = parse_duration)]
    timeout: Option<Duration>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Create a mergeish.toml in the current directory
    Init,

    /// Add a repository to the workspace config
    Add(AddArgs),

    /// Show the effective configuration
    Config,

    /// Clone all configured repositories
    Clone,

    /// Fetch all repositories
    Fetch,

    /// Pull all repositories
    Pull(PullArgs),

    /// Push all repositories
    Push(PushArgs),

    /// List, create, delete, or switch branches across repositories
    #[command(visible_alias = "br")]
    Branch(BranchArgs),

    /// Commit changes across repositories
    #[command(visible_alias = "ci")]
    Commit(CommitArgs),

    /// Show the status of all repositories
    #[command(visible_alias = "st")]
    Status,

    /// Run a git command in every repository
    Git(GitArgs),

    /// Manage pull requests
    Pr(PrArgs),
}

impl Cli {
    fn overrides(&self) -> SettingsOverrides {
        let parallel = match (self.parallel, self.sequential) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };

        SettingsOverrides {
            parallel,
            max_concurrency: self.max_concurrency,
            timeout: self.timeout,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let ctx = Context {
        config_path: cli.config.clone(),
        overrides: cli.overrides(),
        no_emoji: cli.no_emoji,
    };

    match cli.command {
        Some(Commands::Version) => {
            println!("mergeish {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init) => commands::setup::init(&ctx)?,
        Some(Commands::Add(args)) => args.execute(&ctx)?,
        Some(Commands::Config) => commands::setup::show_config(&ctx)?,
        Some(Commands::Clone) => commands::sync::clone(&ctx).await?,
        Some(Commands::Fetch) => commands::sync::fetch(&ctx).await?,
        Some(Commands::Pull(args)) => args.execute(&ctx).await?,
        Some(Commands::Push(args)) => args.execute(&ctx).await?,
        Some(Commands::Branch(args)) => args.execute(&ctx).await?,
        Some(Commands::Commit(args)) => args.execute(&ctx).await?,
        Some(Commands::Status) => commands::sync::status(&ctx).await?,
        Some(Commands::Git(args)) => args.execute(&ctx).await?,
        Some(Commands::Pr(args)) => args.execute(&ctx).await?,
        None => {
            println!("mergeish - manage multiple git repositories as a single monorepo");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
