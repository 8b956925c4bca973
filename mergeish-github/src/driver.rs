//! Repository driver combining `git` and `gh`

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use mergeish_core::{
    DriverFactory, GitCli, PullRequest, RawOutput, RepoConfig, RepoDriver, RepoStatus, Settings,
};

use crate::gh::GhCli;

/// Driver for a GitHub-hosted repository
#[derive(Debug, Clone)]
pub struct GitHubDriver {
    git: GitCli,
    gh: GhCli,
}

impl GitHubDriver {
    /// Create a driver for the repository at `dir`
    ///
    /// `default_branch` is the first base tried when listing commits for a
    /// pull request body.
    pub fn new(dir: &Path, default_branch: &str) -> Self {
        Self {
            git: GitCli::new(dir).with_default_branch(default_branch),
            gh: GhCli::new(dir),
        }
    }
}

#[async_trait]
impl RepoDriver for GitHubDriver {
    fn is_cloned(&self) -> bool {
        self.git.is_repo_root()
    }

    async fn clone_repo(&self, url: &str) -> mergeish_core::Result<()> {
        self.git.clone_repo(url).await
    }

    async fn current_branch(&self) -> mergeish_core::Result<String> {
        self.git.current_branch()
    }

    async fn status(&self) -> mergeish_core::Result<RepoStatus> {
        self.git.status().await
    }

    async fn fetch(&self) -> mergeish_core::Result<()> {
        self.git.fetch().await
    }

    async fn pull(&self, rebase: bool) -> mergeish_core::Result<()> {
        self.git.pull(rebase).await
    }

    async fn push(&self, force: bool) -> mergeish_core::Result<()> {
        self.git.push(force).await
    }

    async fn push_set_upstream(&self) -> mergeish_core::Result<()> {
        self.git.push_set_upstream().await
    }

    async fn branch_exists(&self, name: &str) -> bool {
        self.git.branch_exists(name)
    }

    async fn create_and_switch(&self, name: &str) -> mergeish_core::Result<()> {
        self.git.create_and_switch(name).await
    }

    async fn switch(&self, name: &str) -> mergeish_core::Result<()> {
        self.git.switch(name).await
    }

    async fn delete_branch(&self, name: &str) -> mergeish_core::Result<()> {
        self.git.delete_branch(name).await
    }

    async fn stage_all(&self) -> mergeish_core::Result<()> {
        self.git.stage_all().await
    }

    async fn has_staged_changes(&self) -> mergeish_core::Result<bool> {
        self.git.has_staged_changes().await
    }

    async fn commit(&self, message: &str) -> mergeish_core::Result<()> {
        self.git.commit(message).await
    }

    async fn run_raw(&self, args: &[String]) -> mergeish_core::Result<RawOutput> {
        self.git.run_raw(args).await
    }

    async fn get_pull_request(&self) -> mergeish_core::Result<Option<PullRequest>> {
        self.gh.view().await.map_err(|e| e.into_lookup())
    }

    async fn create_pull_request(
        &self,
        title: &str,
        body: &str,
        base: Option<&str>,
    ) -> mergeish_core::Result<PullRequest> {
        self.gh
            .create(title, body, base)
            .await
            .map_err(|e| e.into_create())
    }

    async fn close_pull_request(&self) -> mergeish_core::Result<()> {
        Ok(self.gh.close().await?)
    }

    async fn commit_subjects_since(&self, base: Option<&str>) -> mergeish_core::Result<Vec<String>> {
        self.git.commit_subjects_since(base).await
    }
}

/// Builds a [`GitHubDriver`] for each configured repository
#[derive(Debug, Clone, Copy, Default)]
pub struct GitHubDriverFactory;

impl DriverFactory for GitHubDriverFactory {
    fn create(&self, _repo: &RepoConfig, path: &Path, settings: &Settings) -> Arc<dyn RepoDriver> {
        Arc::new(GitHubDriver::new(path, &settings.default_branch))
    }
}
