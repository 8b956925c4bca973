//! Pull request operations through the GitHub CLI
//!
//! `gh` resolves the repository from the working directory's remotes and the
//! pull request from the checked-out branch, so every call only needs the
//! directory.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use mergeish_core::{PrState, PullRequest};
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::{Error, Result};

/// Fields requested from `gh pr view`
const VIEW_FIELDS: &str = "number,title,url,state,headRefName";

/// Stderr fragments meaning "this branch has no pull request"
const NO_PR_MARKERS: [&str; 2] = ["no pull requests found", "Could not resolve"];

/// `gh pr view --json` payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrView {
    number: u64,
    title: String,
    url: String,
    state: PrState,
    head_ref_name: String,
}

impl From<PrView> for PullRequest {
    fn from(view: PrView) -> Self {
        PullRequest {
            number: view.number,
            title: view.title,
            url: view.url,
            state: view.state,
            branch: view.head_ref_name,
        }
    }
}

/// `gh` invocations scoped to one working directory
#[derive(Debug, Clone)]
pub struct GhCli {
    dir: PathBuf,
}

impl GhCli {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Run `gh` with `args`, returning stdout, or stderr as the error
    async fn run(&self, args: &[&str]) -> Result<String> {
        debug!(dir = %self.dir.display(), ?args, "Running gh");

        let output = Command::new("gh")
            .args(args)
            .current_dir(&self.dir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let subcommand: Vec<&str> = args.iter().take(2).copied().collect();
            return Err(Error::Command {
                command: format!("gh {}", subcommand.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Pull request for the checked-out branch, if any
    pub async fn view(&self) -> Result<Option<PullRequest>> {
        match self.run(&["pr", "view", "--json", VIEW_FIELDS]).await {
            Ok(stdout) => parse_view(&stdout).map(Some),
            Err(Error::Command { ref stderr, .. }) if is_missing_pr(stderr) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Open a pull request for the checked-out branch and read it back
    ///
    /// A `None` base leaves the choice to `gh` (the repository default).
    pub async fn create(&self, title: &str, body: &str, base: Option<&str>) -> Result<PullRequest> {
        // gh prompts for a body unless --body is given
        let mut args = vec!["pr", "create", "--title", title, "--body", body];
        if let Some(base) = base {
            args.extend(["--base", base]);
        }
        self.run(&args).await?;

        self.view().await?.ok_or_else(|| {
            Error::Other("pull request was created but could not be read back".to_string())
        })
    }

    /// Close the pull request for the checked-out branch
    pub async fn close(&self) -> Result<()> {
        self.run(&["pr", "close"]).await.map(drop)
    }
}

fn parse_view(stdout: &str) -> Result<PullRequest> {
    let view: PrView = serde_json::from_str(stdout)?;
    Ok(view.into())
}

fn is_missing_pr(stderr: &str) -> bool {
    NO_PR_MARKERS.iter().any(|marker| stderr.contains(marker))
}
