//! Commit command

use clap::Args;
use mergeish_core::CommitStatus;

use super::{finish, Context};

/// Commit changes across repositories
#[derive(Args, Debug)]
pub struct CommitArgs {
    /// Commit message used in every repository
    #[arg(short, long)]
    pub message: Option<String>,

    /// Stage all changes before committing
    #[arg(short, long)]
    pub all: bool,
}

impl CommitArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let Some(message) = self.message.as_deref() else {
            anyhow::bail!("commit message required (-m)");
        };

        let workspace = ctx.load_workspace()?;
        let batch = workspace.commit(message, self.all).await?;

        for outcome in &batch {
            match outcome.result() {
                Ok(CommitStatus::Committed) => {
                    println!("  {} {} (committed)", ctx.ok_mark(), outcome.name())
                }
                Ok(CommitStatus::NoChanges) => {
                    println!("  {} {} (no changes)", ctx.skip_mark(), outcome.name())
                }
                Err(e) => println!("  {} {}: {}", ctx.fail_mark(), outcome.name(), e),
            }
        }

        let committed = batch
            .iter()
            .filter(|o| matches!(o.value(), Some(CommitStatus::Committed)))
            .count();
        println!();
        if committed == 0 {
            println!("No changes to commit");
        } else {
            println!("Committed to {} repositories", committed);
        }

        finish(&batch, "commit")
    }
}
