//! Repository driver abstraction
//!
//! The engine never runs git or the code-hosting CLI itself. Everything it
//! needs from a repository goes through [`RepoDriver`], one instance per
//! repository, scoped to that repository's resolved path.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{RepoConfig, Settings};
use crate::Result;

/// Status of a single changed file, as reported by `git status --porcelain`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStatus {
    /// Path relative to the repository root
    pub path: String,
    /// Two-character porcelain code: index side then worktree side ("M ", " M", "??", ...)
    pub code: String,
}

impl FileStatus {
    /// Whether the index side of the status code records a change
    pub fn is_staged(&self) -> bool {
        self.code
            .chars()
            .next()
            .is_some_and(|c| c != ' ' && c != '?')
    }
}

/// Snapshot of a repository's working tree and tracking state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoStatus {
    /// Current branch
    pub branch: String,
    /// Commits on HEAD not on the upstream
    pub ahead: usize,
    /// Commits on the upstream not on HEAD
    pub behind: usize,
    /// Changed, staged, and untracked files
    pub files: Vec<FileStatus>,
}

impl RepoStatus {
    /// Whether the working tree has any changes
    pub fn has_changes(&self) -> bool {
        !self.files.is_empty()
    }

    /// Whether any change is staged
    pub fn has_staged_changes(&self) -> bool {
        self.files.iter().any(FileStatus::is_staged)
    }
}

/// Captured output of a raw passthrough command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutput {
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
    /// Exit code; `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
}

impl RawOutput {
    /// Whether the command exited with status zero
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Pull request state as reported by the hosting service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrState {
    Open,
    Closed,
    Merged,
}

impl fmt::Display for PrState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PrState::Open => "open",
            PrState::Closed => "closed",
            PrState::Merged => "merged",
        };
        f.write_str(s)
    }
}

/// Snapshot of a pull request for a repository's current branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// PR title
    pub title: String,
    /// Web URL
    pub url: String,
    /// Current state
    pub state: PrState,
    /// Head branch name
    pub branch: String,
}

/// Capability set the engine requires from each repository
///
/// Implementations are expected to be stateless between calls: every method
/// is a fresh external invocation against the repository's directory, so
/// concurrent calls on different repositories are independent.
#[async_trait]
pub trait RepoDriver: Send + Sync {
    /// Whether the directory exists and is the root of a repository
    fn is_cloned(&self) -> bool;

    /// Clone `url` into the driver's directory
    async fn clone_repo(&self, url: &str) -> Result<()>;

    /// Name of the checked-out branch
    async fn current_branch(&self) -> Result<String>;

    /// Branch, changed files, and ahead/behind counts
    async fn status(&self) -> Result<RepoStatus>;

    /// Fetch from the default remote
    async fn fetch(&self) -> Result<()>;

    /// Pull from the upstream, optionally rebasing
    async fn pull(&self, rebase: bool) -> Result<()>;

    /// Push to the upstream, optionally forcing
    async fn push(&self, force: bool) -> Result<()>;

    /// Push the current branch to origin and record it as upstream
    async fn push_set_upstream(&self) -> Result<()>;

    /// Whether a local branch with this name exists
    async fn branch_exists(&self, name: &str) -> bool;

    /// Create a branch from HEAD and switch to it
    async fn create_and_switch(&self, name: &str) -> Result<()>;

    /// Switch to an existing branch
    async fn switch(&self, name: &str) -> Result<()>;

    /// Delete a local branch
    async fn delete_branch(&self, name: &str) -> Result<()>;

    /// Stage every change in the working tree
    async fn stage_all(&self) -> Result<()>;

    /// Whether the index differs from HEAD
    async fn has_staged_changes(&self) -> Result<bool>;

    /// Commit the index with `message`
    async fn commit(&self, message: &str) -> Result<()>;

    /// Run an arbitrary git command, capturing both output streams
    ///
    /// An unsuccessful exit is reported through [`RawOutput::exit_code`], not
    /// as an error; errors mean the command could not be run at all.
    async fn run_raw(&self, args: &[String]) -> Result<RawOutput>;

    /// Pull request for the current branch, if one exists
    async fn get_pull_request(&self) -> Result<Option<PullRequest>>;

    /// Open a pull request for the current branch
    async fn create_pull_request(
        &self,
        title: &str,
        body: &str,
        base: Option<&str>,
    ) -> Result<PullRequest>;

    /// Close the pull request for the current branch
    async fn close_pull_request(&self) -> Result<()>;

    /// Subject lines of commits on HEAD that are not on `base`, newest first
    ///
    /// When `base` is `None` the driver infers one from the remote's default
    /// branch.
    async fn commit_subjects_since(&self, base: Option<&str>) -> Result<Vec<String>>;
}

/// Builds the driver for one repository
///
/// Receives the repository's descriptor, its resolved absolute path, and the
/// workspace settings.
pub trait DriverFactory: Send + Sync {
    /// Create a driver scoped to `path`
    fn create(&self, repo: &RepoConfig, path: &Path, settings: &Settings) -> Arc<dyn RepoDriver>;
}

impl<F> DriverFactory for F
where
    F: Fn(&RepoConfig, &Path, &Settings) -> Arc<dyn RepoDriver> + Send + Sync,
{
    fn create(&self, repo: &RepoConfig, path: &Path, settings: &Settings) -> Arc<dyn RepoDriver> {
        self(repo, path, settings)
    }
}
