//! Workspace setup commands: init, add, config

use std::path::PathBuf;

use clap::Args;
use mergeish_core::{RepoConfig, RepoUrl, WorkspaceConfig, DEFAULT_CONFIG_FILE};

use super::Context;

/// Create a default config file
pub fn init(ctx: &Context) -> anyhow::Result<()> {
    let path = ctx
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    if path.exists() {
        println!("Config file {} already exists", path.display());
        return Ok(());
    }

    WorkspaceConfig::write_template(&path)?;
    println!("{} Created {}", ctx.ok_mark(), path.display());
    println!("Add repositories with 'mergeish add <url>' and run 'mergeish clone'");
    Ok(())
}

/// Add a repository to the workspace config
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Clone URL, `owner/repo` shorthand, or local path
    pub url: String,

    /// Location relative to the workspace root (defaults to the repository name)
    #[arg(short, long)]
    pub path: Option<String>,
}

impl AddArgs {
    pub fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let config_path = ctx.config_path()?;
        let url = RepoUrl::parse(&self.url)?;
        let path = self
            .path
            .clone()
            .unwrap_or_else(|| url.default_path().to_string());

        WorkspaceConfig::append_repo(
            &config_path,
            RepoConfig {
                url: url.clone_url.clone(),
                path: path.clone(),
            },
        )?;

        println!("{} Added {} ({})", ctx.ok_mark(), path, url.clone_url);
        Ok(())
    }
}

/// Print the effective configuration
pub fn show_config(ctx: &Context) -> anyhow::Result<()> {
    let path = ctx.config_path().ok();
    let config = match &path {
        Some(path) => WorkspaceConfig::load_with_overrides(path, &ctx.overrides)?,
        None => WorkspaceConfig::default()
            .with_env_overrides()?
            .with_cli_overrides(&ctx.overrides)?,
    };
    let settings = &config.settings;

    println!("mergeish Configuration");
    println!("======================");
    println!();
    println!("Settings:");
    println!("  default_branch: {}", settings.default_branch);
    println!("  parallel: {}", settings.parallel);
    match settings.max_concurrency {
        Some(max) => println!("  max_concurrency: {}", max),
        None => println!("  max_concurrency: (unbounded)"),
    }
    match settings.timeout {
        Some(timeout) => println!("  timeout: {:?}", timeout),
        None => println!("  timeout: (none)"),
    }
    println!();

    match &path {
        Some(path) => {
            println!("Config file: {}", path.display());
            println!("Repositories: {}", config.repos.len());
            for repo in &config.repos {
                println!("  {} <- {}", repo.path, repo.url);
            }
        }
        None => println!("Config file: (not found - using defaults)"),
    }

    if let Some(user) = WorkspaceConfig::user_config_path() {
        let state = if user.exists() { "exists" } else { "not found" };
        println!("User defaults: {} ({})", user.display(), state);
    }

    Ok(())
}
