//! In-memory driver for engine tests

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{RepoConfig, Settings};
use crate::driver::{FileStatus, PrState, PullRequest, RawOutput, RepoDriver, RepoStatus};
use crate::handle::RepoHandle;
use crate::workspace::Workspace;
use crate::{Error, Result};

#[derive(Debug, Default)]
struct FakeState {
    cloned: bool,
    current: String,
    branches: BTreeSet<String>,
    staged: bool,
    unstaged: bool,
    commits: Vec<String>,
    pull_request: Option<PullRequest>,
    next_pr_number: u64,
    subjects: Vec<String>,
    failures: HashMap<String, String>,
    delay: Option<Duration>,
}

/// Records every call and simulates a repository's branch/index state
#[derive(Debug, Default)]
pub(crate) struct FakeDriver {
    state: Mutex<FakeState>,
    calls: Mutex<HashMap<String, usize>>,
    dir: Mutex<Option<PathBuf>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl FakeDriver {
    /// A cloned repository checked out on `branch`
    pub fn new(branch: &str) -> Self {
        let driver = Self::default();
        {
            let mut state = lock(&driver.state);
            state.cloned = true;
            state.current = branch.to_string();
            state.branches.insert(branch.to_string());
            state.next_pr_number = 1;
        }
        driver
    }

    /// A repository that has not been cloned yet
    pub fn uncloned() -> Self {
        let driver = Self::default();
        lock(&driver.state).next_pr_number = 1;
        driver
    }

    pub fn with_branches(self, names: &[&str]) -> Self {
        lock(&self.state)
            .branches
            .extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn with_staged_changes(self) -> Self {
        lock(&self.state).staged = true;
        self
    }

    pub fn with_unstaged_changes(self) -> Self {
        lock(&self.state).unstaged = true;
        self
    }

    pub fn with_subjects(self, subjects: &[&str]) -> Self {
        lock(&self.state).subjects = subjects.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_pull_request(self, number: u64, title: &str) -> Self {
        {
            let mut state = lock(&self.state);
            let branch = state.current.clone();
            state.pull_request = Some(PullRequest {
                number,
                title: title.to_string(),
                url: format!("https://example.com/pull/{}", number),
                state: PrState::Open,
                branch,
            });
            state.next_pr_number = number + 1;
        }
        self
    }

    /// Make `op` fail with a driver error carrying `stderr`
    pub fn failing(self, op: &str, stderr: &str) -> Self {
        lock(&self.state)
            .failures
            .insert(op.to_string(), stderr.to_string());
        self
    }

    /// Delay every async operation, to shuffle completion order
    pub fn with_delay(self, delay: Duration) -> Self {
        lock(&self.state).delay = Some(delay);
        self
    }

    pub fn attach(&self, dir: &Path) {
        *lock(&self.dir) = Some(dir.to_path_buf());
    }

    /// Number of times `op` was invoked
    pub fn calls(&self, op: &str) -> usize {
        lock(&self.calls).get(op).copied().unwrap_or(0)
    }

    pub fn current(&self) -> String {
        lock(&self.state).current.clone()
    }

    pub fn has_branch(&self, name: &str) -> bool {
        lock(&self.state).branches.contains(name)
    }

    pub fn commits(&self) -> Vec<String> {
        lock(&self.state).commits.clone()
    }

    async fn record(&self, op: &str) -> Result<()> {
        *lock(&self.calls).entry(op.to_string()).or_default() += 1;

        let (delay, failure) = {
            let state = lock(&self.state);
            (state.delay, state.failures.get(op).cloned())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match failure {
            Some(stderr) => Err(Error::driver(format!("git {}", op), stderr)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RepoDriver for FakeDriver {
    fn is_cloned(&self) -> bool {
        lock(&self.state).cloned
    }

    async fn clone_repo(&self, _url: &str) -> Result<()> {
        self.record("clone").await?;
        if let Some(dir) = lock(&self.dir).as_ref() {
            std::fs::create_dir_all(dir)?;
        }
        let mut state = lock(&self.state);
        state.cloned = true;
        state.current = "main".to_string();
        state.branches.insert("main".to_string());
        Ok(())
    }

    async fn current_branch(&self) -> Result<String> {
        self.record("current_branch").await?;
        Ok(self.current())
    }

    async fn status(&self) -> Result<RepoStatus> {
        self.record("status").await?;
        let state = lock(&self.state);
        let mut files = Vec::new();
        if state.staged {
            files.push(FileStatus {
                path: "staged.txt".to_string(),
                code: "M ".to_string(),
            });
        }
        if state.unstaged {
            files.push(FileStatus {
                path: "edited.txt".to_string(),
                code: " M".to_string(),
            });
        }
        Ok(RepoStatus {
            branch: state.current.clone(),
            ahead: 0,
            behind: 0,
            files,
        })
    }

    async fn fetch(&self) -> Result<()> {
        self.record("fetch").await
    }

    async fn pull(&self, _rebase: bool) -> Result<()> {
        self.record("pull").await
    }

    async fn push(&self, _force: bool) -> Result<()> {
        self.record("push").await
    }

    async fn push_set_upstream(&self) -> Result<()> {
        self.record("push_set_upstream").await
    }

    async fn branch_exists(&self, name: &str) -> bool {
        let _ = self.record("branch_exists").await;
        self.has_branch(name)
    }

    async fn create_and_switch(&self, name: &str) -> Result<()> {
        self.record("create_and_switch").await?;
        let mut state = lock(&self.state);
        if !state.branches.insert(name.to_string()) {
            return Err(Error::driver(
                format!("git checkout -b {}", name),
                format!("fatal: a branch named '{}' already exists\n", name),
            ));
        }
        state.current = name.to_string();
        Ok(())
    }

    async fn switch(&self, name: &str) -> Result<()> {
        self.record("switch").await?;
        let mut state = lock(&self.state);
        if !state.branches.contains(name) {
            return Err(Error::driver(
                format!("git checkout {}", name),
                format!("error: pathspec '{}' did not match any file(s) known to git\n", name),
            ));
        }
        state.current = name.to_string();
        Ok(())
    }

    async fn delete_branch(&self, name: &str) -> Result<()> {
        self.record("delete_branch").await?;
        let mut state = lock(&self.state);
        if state.current == name {
            return Err(Error::driver(
                format!("git branch -d {}", name),
                "error: cannot delete branch used by worktree\n",
            ));
        }
        if !state.branches.remove(name) {
            return Err(Error::driver(
                format!("git branch -d {}", name),
                format!("error: branch '{}' not found.\n", name),
            ));
        }
        Ok(())
    }

    async fn stage_all(&self) -> Result<()> {
        self.record("stage_all").await?;
        let mut state = lock(&self.state);
        if state.unstaged {
            state.unstaged = false;
            state.staged = true;
        }
        Ok(())
    }

    async fn has_staged_changes(&self) -> Result<bool> {
        self.record("has_staged_changes").await?;
        Ok(lock(&self.state).staged)
    }

    async fn commit(&self, message: &str) -> Result<()> {
        self.record("commit").await?;
        let mut state = lock(&self.state);
        if !state.staged {
            return Err(Error::driver("git commit", "nothing to commit\n"));
        }
        state.staged = false;
        state.commits.push(message.to_string());
        Ok(())
    }

    async fn run_raw(&self, args: &[String]) -> Result<RawOutput> {
        self.record("run_raw").await?;
        if args.first().is_some_and(|a| a == "fail") {
            return Ok(RawOutput {
                stdout: String::new(),
                stderr: "fatal: boom\n".to_string(),
                exit_code: Some(1),
            });
        }
        Ok(RawOutput {
            stdout: format!("{}\n", args.join(" ")),
            stderr: String::new(),
            exit_code: Some(0),
        })
    }

    async fn get_pull_request(&self) -> Result<Option<PullRequest>> {
        self.record("get_pull_request").await?;
        Ok(lock(&self.state).pull_request.clone())
    }

    async fn create_pull_request(
        &self,
        title: &str,
        _body: &str,
        _base: Option<&str>,
    ) -> Result<PullRequest> {
        self.record("create_pull_request").await?;
        let mut state = lock(&self.state);
        if state.pull_request.is_some() {
            return Err(Error::PullRequestCreate(
                "a pull request for this branch already exists".to_string(),
            ));
        }
        let number = state.next_pr_number;
        state.next_pr_number += 1;
        let pr = PullRequest {
            number,
            title: title.to_string(),
            url: format!("https://example.com/pull/{}", number),
            state: PrState::Open,
            branch: state.current.clone(),
        };
        state.pull_request = Some(pr.clone());
        Ok(pr)
    }

    async fn close_pull_request(&self) -> Result<()> {
        self.record("close_pull_request").await?;
        let mut state = lock(&self.state);
        match state.pull_request.as_mut() {
            Some(pr) => {
                pr.state = PrState::Closed;
                Ok(())
            }
            None => Err(Error::driver(
                "gh pr close",
                "no pull requests found for branch\n",
            )),
        }
    }

    async fn commit_subjects_since(&self, _base: Option<&str>) -> Result<Vec<String>> {
        self.record("commit_subjects_since").await?;
        Ok(lock(&self.state).subjects.clone())
    }
}

/// Build handles rooted at `root`, creating directories for cloned fakes
pub(crate) fn fake_handles(
    root: &Path,
    repos: Vec<(&str, FakeDriver)>,
) -> (Vec<Arc<RepoHandle>>, Vec<Arc<FakeDriver>>) {
    let mut handles = Vec::with_capacity(repos.len());
    let mut drivers = Vec::with_capacity(repos.len());

    for (name, driver) in repos {
        let dir = root.join(name);
        driver.attach(&dir);
        if driver.is_cloned() {
            std::fs::create_dir_all(&dir).expect("create fake repo dir");
        }

        let driver = Arc::new(driver);
        let config = RepoConfig {
            url: format!("git@example.com:org/{}.git", name),
            path: name.to_string(),
        };
        handles.push(Arc::new(RepoHandle::new(
            config,
            root,
            Arc::clone(&driver) as Arc<dyn RepoDriver>,
        )));
        drivers.push(driver);
    }

    (handles, drivers)
}

/// Workspace over fake handles with default settings
pub(crate) fn fake_workspace(
    root: &Path,
    repos: Vec<(&str, FakeDriver)>,
) -> (Workspace, Vec<Arc<FakeDriver>>) {
    let (handles, drivers) = fake_handles(root, repos);
    let workspace = Workspace::from_handles(root.to_path_buf(), Settings::default(), handles);
    (workspace, drivers)
}
