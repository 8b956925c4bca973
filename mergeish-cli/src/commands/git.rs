//! Raw git passthrough

use clap::Args;
use mergeish_core::Error;

use super::{finish, Context};

/// Run a git command in every repository
#[derive(Args, Debug)]
pub struct GitArgs {
    /// Arguments passed to git unchanged
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    pub args: Vec<String>,
}

impl GitArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let workspace = ctx.load_workspace()?;

        println!("Running: git {}", self.args.join(" "));
        println!();
        let batch = workspace.run_raw(self.args.clone()).await?;

        for outcome in &batch {
            println!("── {} ──", outcome.name());
            match outcome.result() {
                Ok(output) => {
                    let stdout = output.stdout.trim_end();
                    let stderr = output.stderr.trim_end();
                    if stdout.is_empty() && stderr.is_empty() {
                        println!("(no output)");
                    }
                    if !stdout.is_empty() {
                        println!("{}", stdout);
                    }
                    if !stderr.is_empty() {
                        println!("{}", stderr);
                    }
                }
                Err(Error::Driver { stderr, .. }) => {
                    println!("{} {}", ctx.fail_mark(), stderr.trim_end())
                }
                Err(e) => println!("{} {}", ctx.fail_mark(), e),
            }
            println!();
        }

        finish(&batch, "run git")
    }
}
