//! Clone, fetch, pull, push, and status commands

use std::io::{self, BufRead, Write};

use clap::Args;
use mergeish_core::{CloneStatus, PushOptions, RepoStatus};

use super::{finish, Context};

pub async fn clone(ctx: &Context) -> anyhow::Result<()> {
    let workspace = ctx.load_workspace()?;

    println!("Cloning repositories...");
    let batch = workspace.clone_all().await;
    ctx.report(&batch, |status| match status {
        CloneStatus::Cloned => None,
        CloneStatus::AlreadyCloned => Some(status.to_string()),
    });

    finish(&batch, "clone")?;
    println!("Done!");
    Ok(())
}

pub async fn fetch(ctx: &Context) -> anyhow::Result<()> {
    let workspace = ctx.load_workspace()?;

    println!("Fetching repositories...");
    let batch = workspace.fetch().await;
    ctx.report(&batch, |_| None);

    finish(&batch, "fetch")?;
    println!("Done!");
    Ok(())
}

/// Pull all repositories
#[derive(Args, Debug)]
pub struct PullArgs {
    /// Rebase local commits onto the upstream
    #[arg(short, long)]
    pub rebase: bool,
}

impl PullArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let workspace = ctx.load_workspace()?;

        println!("Pulling repositories...");
        let batch = workspace.pull(self.rebase).await?;
        ctx.warn_if_inconsistent(&batch);
        ctx.report(&batch, |_| None);

        finish(&batch, "pull")?;
        println!("Done!");
        Ok(())
    }
}

/// Push all repositories
#[derive(Args, Debug)]
pub struct PushArgs {
    /// Force push, overwriting the remote branch
    #[arg(short, long)]
    pub force: bool,

    /// Skip the force push confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Push new branches to origin and track them
    #[arg(short = 'u', long)]
    pub set_upstream: bool,
}

impl PushArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let workspace = ctx.load_workspace()?;

        let consistency = workspace.check_branch_consistency().await?;
        if !consistency.consistent {
            anyhow::bail!("repositories are on different branches, cannot push");
        }

        if self.force && !self.yes && !confirm("Force push? This may overwrite remote changes.")? {
            println!("Aborted");
            return Ok(());
        }

        println!("Pushing {}...", consistency.reference_branch);
        let batch = workspace
            .push(PushOptions {
                force: self.force,
                set_upstream: self.set_upstream,
            })
            .await?;
        ctx.report(&batch, |_| None);

        finish(&batch, "push")?;
        println!("Done!");
        Ok(())
    }
}

fn confirm(question: &str) -> anyhow::Result<bool> {
    print!("{} [y/N]: ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y"))
}

pub async fn status(ctx: &Context) -> anyhow::Result<()> {
    let workspace = ctx.load_workspace()?;

    let batch = workspace.status().await;
    ctx.warn_if_inconsistent(&batch);

    for outcome in &batch {
        println!("{}:", outcome.name());
        match outcome.result() {
            Ok(status) => print_status(status),
            Err(e) => println!("  error: {}", e),
        }
        println!();
    }

    finish(&batch, "report status")
}

fn print_status(status: &RepoStatus) {
    let mut tracking = Vec::new();
    if status.ahead > 0 {
        tracking.push(format!("↑{}", status.ahead));
    }
    if status.behind > 0 {
        tracking.push(format!("↓{}", status.behind));
    }

    if tracking.is_empty() {
        println!("  branch: {}", status.branch);
    } else {
        println!("  branch: {} ({})", status.branch, tracking.join(" "));
    }

    if status.has_changes() {
        println!("  changes: {} file(s)", status.files.len());
        for file in &status.files {
            println!("    {:>2} {}", file.code.trim(), file.path);
        }
    } else {
        println!("  changes: none");
    }
}
