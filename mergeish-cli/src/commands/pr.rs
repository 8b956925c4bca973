//! Pull request commands

use clap::{Args, Subcommand};
use mergeish_core::PrCreateRequest;

use super::{finish, Context};

/// Manage pull requests for the current branch
#[derive(Args, Debug)]
pub struct PrArgs {
    #[command(subcommand)]
    pub command: PrCommands,
}

#[derive(Subcommand, Debug)]
pub enum PrCommands {
    /// Show the pull request of every repository
    Status,

    /// Open a pull request in every repository
    Create {
        /// Pull request title
        #[arg(short, long)]
        title: String,

        /// Pull request body
        #[arg(short, long, default_value = "")]
        body: String,

        /// Base branch (defaults to the repository's default branch)
        #[arg(long)]
        base: Option<String>,

        /// Build the body from the commit subjects of every repository
        #[arg(long)]
        infer: bool,
    },

    /// Close the pull request of every repository
    Close,

    /// Open every pull request in the browser
    Open,
}

impl PrArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        match &self.command {
            PrCommands::Status => status(ctx).await,
            PrCommands::Create {
                title,
                body,
                base,
                infer,
            } => {
                let request = PrCreateRequest {
                    title: title.clone(),
                    body: body.clone(),
                    base: base.clone(),
                    infer_body: *infer,
                };
                create(ctx, request).await
            }
            PrCommands::Close => close(ctx).await,
            PrCommands::Open => open(ctx).await,
        }
    }
}

async fn status(ctx: &Context) -> anyhow::Result<()> {
    let workspace = ctx.load_workspace()?;
    let batch = workspace.pr_status().await?;
    ctx.warn_if_inconsistent(&batch);

    for outcome in &batch {
        match outcome.result() {
            Ok(Some(pr)) => {
                println!(
                    "  {} {}: #{} {} ({})",
                    ctx.ok_mark(),
                    outcome.name(),
                    pr.number,
                    pr.title,
                    pr.state
                );
                println!("      {}", pr.url);
            }
            Ok(None) => println!("  {} {}: no PR", ctx.skip_mark(), outcome.name()),
            Err(e) => println!("  {} {}: {}", ctx.fail_mark(), outcome.name(), e),
        }
    }

    finish(&batch, "look up pull requests")
}

async fn create(ctx: &Context, request: PrCreateRequest) -> anyhow::Result<()> {
    let workspace = ctx.load_workspace()?;

    println!("Creating pull requests...");
    let batch = workspace.create_prs(request).await?;
    ctx.report(&batch, |created| {
        if created.existed {
            Some(format!("already exists {}", created.pull_request.url))
        } else {
            Some(created.pull_request.url.clone())
        }
    });

    finish(&batch, "create pull requests")
}

async fn close(ctx: &Context) -> anyhow::Result<()> {
    let workspace = ctx.load_workspace()?;

    println!("Closing pull requests...");
    let batch = workspace.close_prs().await?;
    ctx.report(&batch, |_| None);

    finish(&batch, "close pull requests")
}

async fn open(ctx: &Context) -> anyhow::Result<()> {
    let workspace = ctx.load_workspace()?;
    let batch = workspace.pr_status().await?;

    let mut attempted = 0;
    let mut opened = 0;
    for outcome in &batch {
        match outcome.result() {
            Ok(Some(pr)) => {
                attempted += 1;
                match open_in_browser(&pr.url) {
                    Ok(()) => {
                        opened += 1;
                        println!("  {} {}: {}", ctx.ok_mark(), outcome.name(), pr.url);
                    }
                    Err(e) => {
                        tracing::warn!(url = %pr.url, error = %e, "Failed to open browser");
                        println!("  {} {}: {}", ctx.fail_mark(), outcome.name(), e);
                    }
                }
            }
            Ok(None) => println!("  {} {}: no PR", ctx.skip_mark(), outcome.name()),
            Err(e) => println!("  {} {}: {}", ctx.fail_mark(), outcome.name(), e),
        }
    }

    if attempted == 0 {
        println!("No PRs to open");
    } else {
        println!("Opened {} of {} PR(s)", opened, attempted);
    }
    finish(&batch, "look up pull requests")
}

fn open_in_browser(url: &str) -> std::io::Result<()> {
    let mut cmd = if cfg!(target_os = "macos") {
        std::process::Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut cmd = std::process::Command::new("rundll32");
        cmd.arg("url.dll,FileProtocolHandler");
        cmd
    } else {
        std::process::Command::new("xdg-open")
    };
    cmd.arg(url).spawn().map(|_| ())
}
