//! CLI command implementations

pub mod branch;
pub mod commit;
pub mod git;
pub mod pr;
pub mod setup;
pub mod sync;

use std::path::PathBuf;

use mergeish_core::{find_config_file, Batch, SettingsOverrides, Workspace};
use mergeish_github::GitHubDriverFactory;

pub use branch::BranchArgs;
pub use commit::CommitArgs;
pub use git::GitArgs;
pub use pr::PrArgs;
pub use setup::AddArgs;
pub use sync::{PullArgs, PushArgs};

/// Global options shared by every command
#[derive(Debug, Clone)]
pub struct Context {
    /// Explicit config file, if given
    pub config_path: Option<PathBuf>,
    /// Settings overrides from flags
    pub overrides: SettingsOverrides,
    /// Use ASCII markers
    pub no_emoji: bool,
}

impl Context {
    /// The config file to use: explicit, or found by walking up from the
    /// current directory
    pub fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => Ok(find_config_file(&std::env::current_dir()?)?),
        }
    }

    /// Load the workspace with GitHub-backed drivers
    pub fn load_workspace(&self) -> anyhow::Result<Workspace> {
        let path = self.config_path()?;
        let workspace = Workspace::load(&path, &self.overrides, &GitHubDriverFactory)?;
        tracing::debug!(
            config = %path.display(),
            repos = workspace.handles().len(),
            "Workspace loaded"
        );
        Ok(workspace)
    }

    /// Select between an emoji and its ASCII alternative
    pub fn emoji<'a>(&self, emoji_char: &'a str, ascii_alt: &'a str) -> &'a str {
        if self.no_emoji {
            ascii_alt
        } else {
            emoji_char
        }
    }

    pub fn ok_mark(&self) -> &'static str {
        self.emoji("✓", "[OK]")
    }

    pub fn fail_mark(&self) -> &'static str {
        self.emoji("✗", "[FAIL]")
    }

    pub fn skip_mark(&self) -> &'static str {
        self.emoji("-", "[SKIP]")
    }

    pub fn warn_mark(&self) -> &'static str {
        self.emoji("⚠", "[WARN]")
    }

    /// Print the warning for a batch whose repositories disagree on their branch
    pub fn warn_if_inconsistent<T>(&self, batch: &Batch<T>) {
        if batch.is_inconsistent() {
            println!(
                "{} Warning: repositories are on different branches",
                self.warn_mark()
            );
            println!();
        }
    }

    /// Print one line per repository
    ///
    /// `describe` renders a success payload; `None` prints just the name.
    pub fn report<T>(&self, batch: &Batch<T>, describe: impl Fn(&T) -> Option<String>) {
        for outcome in batch {
            match outcome.result() {
                Ok(value) => match describe(value) {
                    Some(detail) => {
                        println!("  {} {}: {}", self.ok_mark(), outcome.name(), detail)
                    }
                    None => println!("  {} {}", self.ok_mark(), outcome.name()),
                },
                Err(e) => println!("  {} {}: {}", self.fail_mark(), outcome.name(), e),
            }
        }
    }
}

/// Fail the process when any repository failed
pub fn finish<T>(batch: &Batch<T>, what: &str) -> anyhow::Result<()> {
    if batch.has_failures() {
        anyhow::bail!(
            "{} of {} repositories failed to {}",
            batch.failed_count(),
            batch.len(),
            what
        );
    }
    Ok(())
}
