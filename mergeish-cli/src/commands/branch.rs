//! Branch command

use clap::Args;

use super::{finish, Context};

/// List, create, delete, or switch branches across repositories
#[derive(Args, Debug)]
pub struct BranchArgs {
    /// Branch to create (or delete/switch with the flags below)
    pub name: Option<String>,

    /// Delete the branch instead of creating it
    #[arg(short, long, conflicts_with = "checkout")]
    pub delete: bool,

    /// Switch to the branch, creating it where it is missing
    #[arg(long)]
    pub checkout: bool,
}

impl BranchArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let workspace = ctx.load_workspace()?;

        let Some(name) = self.name.as_deref() else {
            if self.delete || self.checkout {
                anyhow::bail!("branch name required");
            }
            let batch = workspace.current_branches().await;
            ctx.warn_if_inconsistent(&batch);
            ctx.report(&batch, |branch| Some(branch.clone()));
            return finish(&batch, "read the current branch");
        };

        if self.delete {
            println!("Deleting branch {}...", name);
            let batch = workspace.delete_branch(name).await?;
            ctx.report(&batch, |_| None);
            finish(&batch, "delete the branch")
        } else if self.checkout {
            println!("Switching to {}...", name);
            let batch = workspace.checkout(name).await?;
            ctx.report(&batch, |status| Some(status.to_string()));
            finish(&batch, "switch branches")
        } else {
            println!("Creating branch {}...", name);
            let batch = workspace.create_branch(name).await?;
            ctx.report(&batch, |_| None);
            finish(&batch, "create the branch")
        }
    }
}
