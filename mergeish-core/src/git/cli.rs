//! Git driver backed by the `git` binary and libgit2
//!
//! Read-only queries that libgit2 answers cheaply (is this a repository, what
//! branch is checked out, does a branch exist) go through `git2`. Everything
//! that talks to a remote or mutates the repository shells out to `git` so
//! the user's credential helpers, hooks, and config apply.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use git2::{BranchType, ErrorCode, Repository};
use tokio::process::Command;
use tracing::debug;

use super::status::{parse_ahead_behind, parse_porcelain};
use crate::driver::{RawOutput, RepoStatus};
use crate::{Error, Result};

/// Remote-tracking refs tried, in order, when no base branch is given
const FALLBACK_BASES: [&str; 2] = ["origin/main", "origin/master"];

/// Git operations scoped to one working directory
#[derive(Debug, Clone)]
pub struct GitCli {
    dir: PathBuf,
    default_branch: String,
}

impl GitCli {
    /// Create a driver for the repository at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            default_branch: "main".to_string(),
        }
    }

    /// Branch tried first when inferring the base for commit listings
    pub fn with_default_branch(mut self, branch: impl Into<String>) -> Self {
        self.default_branch = branch.into();
        self
    }

    /// The working directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    async fn output(mut cmd: Command, cmdline: &str) -> Result<Output> {
        debug!(command = %cmdline, "Running");
        cmd.output()
            .await
            .map_err(|e| Error::Other(format!("Failed to run {}: {}", cmdline, e)))
    }

    /// Run git with `args`, returning stdout or a [`Error::Driver`] on failure
    async fn run(&self, args: &[&str]) -> Result<String> {
        let cmdline = format!("git {}", args.join(" "));
        let mut cmd = self.command();
        cmd.args(args);

        let output = Self::output(cmd, &cmdline).await?;
        if !output.status.success() {
            return Err(Error::driver(
                cmdline,
                String::from_utf8_lossy(&output.stderr),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn open(&self) -> Result<Repository> {
        Repository::open(&self.dir).map_err(|e| {
            if e.code() == ErrorCode::NotFound {
                Error::NotCloned
            } else {
                Error::Other(format!("Git error: {}", e))
            }
        })
    }

    /// Whether the directory is the root of a repository
    ///
    /// A subdirectory of some other repository does not count.
    pub fn is_repo_root(&self) -> bool {
        self.dir.is_dir() && Repository::open(&self.dir).is_ok()
    }

    /// Name of the checked-out branch
    ///
    /// An unborn branch reports the name HEAD points at; a detached HEAD
    /// reports `HEAD`.
    pub fn current_branch(&self) -> Result<String> {
        let repo = self.open()?;
        let head = match repo.head() {
            Ok(head) => head,
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                let head = repo
                    .find_reference("HEAD")
                    .map_err(|e| Error::Other(format!("Failed to read HEAD: {}", e)))?;
                let target = head.symbolic_target().unwrap_or("HEAD");
                return Ok(target.strip_prefix("refs/heads/").unwrap_or(target).to_string());
            }
            Err(e) => return Err(Error::Other(format!("Failed to get HEAD: {}", e))),
        };

        if head.is_branch() {
            Ok(head.shorthand().unwrap_or("HEAD").to_string())
        } else {
            Ok("HEAD".to_string())
        }
    }

    /// Whether a local branch named `name` exists
    pub fn branch_exists(&self, name: &str) -> bool {
        self.open()
            .map(|repo| repo.find_branch(name, BranchType::Local).is_ok())
            .unwrap_or(false)
    }

    /// Clone `url` into the working directory
    pub async fn clone_repo(&self, url: &str) -> Result<()> {
        let mut cmd = Command::new("git");
        cmd.arg("clone")
            .arg(url)
            .arg(&self.dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let cmdline = format!("git clone {}", url);
        let output = Self::output(cmd, &cmdline).await?;
        if !output.status.success() {
            return Err(Error::driver(
                cmdline,
                String::from_utf8_lossy(&output.stderr),
            ));
        }
        Ok(())
    }

    /// Branch, porcelain file list, and ahead/behind counts
    ///
    /// Ahead/behind is zero when the branch has no upstream.
    pub async fn status(&self) -> Result<RepoStatus> {
        let branch = self.current_branch()?;
        let porcelain = self.run(&["status", "--porcelain"]).await?;

        let (ahead, behind) = match self
            .run(&["rev-list", "--left-right", "--count", "@{upstream}...HEAD"])
            .await
        {
            Ok(counts) => parse_ahead_behind(&counts),
            Err(_) => (0, 0),
        };

        Ok(RepoStatus {
            branch,
            ahead,
            behind,
            files: parse_porcelain(&porcelain),
        })
    }

    pub async fn fetch(&self) -> Result<()> {
        self.run(&["fetch"]).await.map(drop)
    }

    pub async fn pull(&self, rebase: bool) -> Result<()> {
        let mut args = vec!["pull"];
        if rebase {
            args.push("--rebase");
        }
        self.run(&args).await.map(drop)
    }

    pub async fn push(&self, force: bool) -> Result<()> {
        let mut args = vec!["push"];
        if force {
            args.push("--force");
        }
        self.run(&args).await.map(drop)
    }

    /// Push the current branch to origin and track it
    pub async fn push_set_upstream(&self) -> Result<()> {
        let branch = self.current_branch()?;
        self.run(&["push", "-u", "origin", &branch]).await.map(drop)
    }

    pub async fn create_and_switch(&self, name: &str) -> Result<()> {
        self.run(&["checkout", "-b", name]).await.map(drop)
    }

    pub async fn switch(&self, name: &str) -> Result<()> {
        self.run(&["checkout", name]).await.map(drop)
    }

    /// Delete a fully merged local branch
    pub async fn delete_branch(&self, name: &str) -> Result<()> {
        self.run(&["branch", "-d", name]).await.map(drop)
    }

    pub async fn stage_all(&self) -> Result<()> {
        self.run(&["add", "-A"]).await.map(drop)
    }

    pub async fn has_staged_changes(&self) -> Result<bool> {
        let names = self.run(&["diff", "--cached", "--name-only"]).await?;
        Ok(!names.trim().is_empty())
    }

    pub async fn commit(&self, message: &str) -> Result<()> {
        self.run(&["commit", "-m", message]).await.map(drop)
    }

    /// Run arbitrary git arguments, capturing both streams
    pub async fn run_raw(&self, args: &[String]) -> Result<RawOutput> {
        let cmdline = format!("git {}", args.join(" "));
        let mut cmd = self.command();
        cmd.args(args);

        let output = Self::output(cmd, &cmdline).await?;
        Ok(RawOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }

    /// Subjects of commits in `base..HEAD`, newest first
    ///
    /// Without a base, the first of `origin/<default_branch>`, `origin/main`,
    /// and `origin/master` that resolves is used.
    pub async fn commit_subjects_since(&self, base: Option<&str>) -> Result<Vec<String>> {
        let base = match base {
            Some(base) => base.to_string(),
            None => self.infer_base()?,
        };

        let range = format!("{}..HEAD", base);
        let log = self.run(&["log", "--pretty=format:%s", &range]).await?;
        Ok(log
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn infer_base(&self) -> Result<String> {
        let repo = self.open()?;
        let mut candidates = vec![format!("origin/{}", self.default_branch)];
        candidates.extend(FALLBACK_BASES.iter().map(|base| base.to_string()));

        candidates
            .into_iter()
            .find(|candidate| repo.revparse_single(candidate).is_ok())
            .ok_or_else(|| Error::Other("could not determine base branch".to_string()))
    }
}
