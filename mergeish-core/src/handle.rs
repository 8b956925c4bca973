//! Repository handles
//!
//! A [`RepoHandle`] pairs one configured repository with its resolved location
//! and the driver scoped to that location. Every operation except
//! [`RepoHandle::clone_repo`] requires the repository to be cloned and fails
//! with [`Error::NotCloned`] without calling the driver otherwise.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::RepoConfig;
use crate::driver::{PullRequest, RawOutput, RepoDriver, RepoStatus};
use crate::{Error, Result};

/// Handle to one managed repository
pub struct RepoHandle {
    config: RepoConfig,
    path: PathBuf,
    driver: Arc<dyn RepoDriver>,
}

impl fmt::Debug for RepoHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepoHandle")
            .field("name", &self.config.path)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RepoHandle {
    /// Create a handle for `config`, resolving its path against `root`
    pub fn new(config: RepoConfig, root: &Path, driver: Arc<dyn RepoDriver>) -> Self {
        let path = root.join(&config.path);
        Self {
            config,
            path,
            driver,
        }
    }

    /// Display name (the configured path)
    pub fn name(&self) -> &str {
        &self.config.path
    }

    /// The repository's descriptor
    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    /// Resolved location on disk
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the resolved path is a directory holding a repository root
    pub fn is_cloned(&self) -> bool {
        self.path.is_dir() && self.driver.is_cloned()
    }

    /// Fail with [`Error::NotCloned`] unless the repository is cloned
    pub fn ensure_cloned(&self) -> Result<()> {
        if self.is_cloned() {
            Ok(())
        } else {
            Err(Error::NotCloned)
        }
    }

    /// Clone the repository, creating parent directories as needed
    ///
    /// Does not check whether the repository is already cloned; the clone
    /// workflow does that so it can report the skip.
    pub async fn clone_repo(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::Other(format!(
                    "Failed to create parent directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        self.driver.clone_repo(&self.config.url).await
    }

    pub async fn current_branch(&self) -> Result<String> {
        self.ensure_cloned()?;
        self.driver.current_branch().await
    }

    pub async fn status(&self) -> Result<RepoStatus> {
        self.ensure_cloned()?;
        self.driver.status().await
    }

    pub async fn fetch(&self) -> Result<()> {
        self.ensure_cloned()?;
        self.driver.fetch().await
    }

    pub async fn pull(&self, rebase: bool) -> Result<()> {
        self.ensure_cloned()?;
        self.driver.pull(rebase).await
    }

    pub async fn push(&self, force: bool) -> Result<()> {
        self.ensure_cloned()?;
        self.driver.push(force).await
    }

    pub async fn push_set_upstream(&self) -> Result<()> {
        self.ensure_cloned()?;
        self.driver.push_set_upstream().await
    }

    pub async fn branch_exists(&self, name: &str) -> Result<bool> {
        self.ensure_cloned()?;
        Ok(self.driver.branch_exists(name).await)
    }

    pub async fn create_and_switch(&self, name: &str) -> Result<()> {
        self.ensure_cloned()?;
        self.driver.create_and_switch(name).await
    }

    pub async fn switch(&self, name: &str) -> Result<()> {
        self.ensure_cloned()?;
        self.driver.switch(name).await
    }

    pub async fn delete_branch(&self, name: &str) -> Result<()> {
        self.ensure_cloned()?;
        self.driver.delete_branch(name).await
    }

    pub async fn stage_all(&self) -> Result<()> {
        self.ensure_cloned()?;
        self.driver.stage_all().await
    }

    pub async fn has_staged_changes(&self) -> Result<bool> {
        self.ensure_cloned()?;
        self.driver.has_staged_changes().await
    }

    pub async fn commit(&self, message: &str) -> Result<()> {
        self.ensure_cloned()?;
        self.driver.commit(message).await
    }

    pub async fn run_raw(&self, args: &[String]) -> Result<RawOutput> {
        self.ensure_cloned()?;
        self.driver.run_raw(args).await
    }

    pub async fn get_pull_request(&self) -> Result<Option<PullRequest>> {
        self.ensure_cloned()?;
        self.driver.get_pull_request().await
    }

    pub async fn create_pull_request(
        &self,
        title: &str,
        body: &str,
        base: Option<&str>,
    ) -> Result<PullRequest> {
        self.ensure_cloned()?;
        self.driver.create_pull_request(title, body, base).await
    }

    pub async fn close_pull_request(&self) -> Result<()> {
        self.ensure_cloned()?;
        self.driver.close_pull_request().await
    }

    pub async fn commit_subjects_since(&self, base: Option<&str>) -> Result<Vec<String>> {
        self.ensure_cloned()?;
        self.driver.commit_subjects_since(base).await
    }
}
