//! Workspace: the configured set of repositories and the workflows over them
//!
//! Every workflow follows the same shape: validate its inputs, check branch
//! consistency when the operation requires it, fan the per-repository action
//! out through [`FanOut`], and hand back a [`Batch`] with one outcome per
//! repository in configuration order.

mod branch;
mod commit;
mod phase;
mod pull_request;
mod sync;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{Settings, SettingsOverrides, WorkspaceConfig};
use crate::consistency::{check_consistency, BranchConsistency};
use crate::driver::DriverFactory;
use crate::executor::FanOut;
use crate::handle::RepoHandle;
use crate::{Error, Result};

pub use branch::CheckoutStatus;
pub use commit::CommitStatus;
pub use phase::WorkflowPhase;
pub use pull_request::{PrCreateRequest, PrCreated};
pub use sync::{CloneStatus, PushOptions};

use phase::WorkflowRun;

/// A loaded workspace
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    settings: Settings,
    handles: Vec<Arc<RepoHandle>>,
    executor: FanOut,
}

impl Workspace {
    /// Build a workspace rooted at `root`, creating one driver per repository
    pub fn new(config: WorkspaceConfig, root: impl Into<PathBuf>, factory: &dyn DriverFactory) -> Self {
        let root = root.into();
        let handles = config
            .repos
            .into_iter()
            .map(|repo| {
                let path = root.join(&repo.path);
                let driver = factory.create(&repo, &path, &config.settings);
                Arc::new(RepoHandle::new(repo, &root, driver))
            })
            .collect();

        Self::from_handles(root, config.settings, handles)
    }

    /// Load `config_path` with overrides applied; the workspace root is the
    /// directory containing the file
    pub fn load(
        config_path: &Path,
        overrides: &SettingsOverrides,
        factory: &dyn DriverFactory,
    ) -> Result<Self> {
        let config = WorkspaceConfig::load_with_overrides(config_path, overrides)?;

        let parent = config_path.parent().unwrap_or_else(|| Path::new(""));
        let root = if parent.is_absolute() {
            parent.to_path_buf()
        } else {
            std::env::current_dir()?.join(parent)
        };

        debug!(root = %root.display(), repos = config.repos.len(), "Loaded workspace");
        Ok(Self::new(config, root, factory))
    }

    /// Assemble a workspace from prebuilt handles
    pub fn from_handles(root: PathBuf, settings: Settings, handles: Vec<Arc<RepoHandle>>) -> Self {
        let executor = FanOut::from_settings(&settings);
        Self {
            root,
            settings,
            handles,
            executor,
        }
    }

    /// Replace the fan-out executor
    pub fn with_executor(mut self, executor: FanOut) -> Self {
        self.executor = executor;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Handles in configuration order
    pub fn handles(&self) -> &[Arc<RepoHandle>] {
        &self.handles
    }

    pub fn executor(&self) -> &FanOut {
        &self.executor
    }

    /// Compare the current branch of every cloned repository
    pub async fn check_branch_consistency(&self) -> Result<BranchConsistency> {
        check_consistency(&self.handles).await
    }

    /// Hard pre-condition: fail unless every cloned repository is on the same branch
    async fn require_consistency(&self, run: &mut WorkflowRun, operation: &str) -> Result<()> {
        let consistency = self
            .check_branch_consistency()
            .await
            .map_err(|e| run.fail(e))?;

        if !consistency.consistent {
            return Err(run.fail(Error::BranchInconsistency {
                reference: consistency.reference_branch,
                operation: operation.to_string(),
            }));
        }

        run.advance(WorkflowPhase::ConsistencyChecked);
        Ok(())
    }

    /// Warn-only pre-condition: report disagreement but let the workflow run
    async fn observe_consistency(
        &self,
        run: &mut WorkflowRun,
        operation: &str,
    ) -> Result<BranchConsistency> {
        let consistency = self
            .check_branch_consistency()
            .await
            .map_err(|e| run.fail(e))?;

        if !consistency.consistent {
            warn!(
                reference = %consistency.reference_branch,
                operation,
                "Repositories are on different branches"
            );
        }

        run.advance(WorkflowPhase::ConsistencyChecked);
        Ok(consistency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepoConfig;
    use crate::driver::RepoDriver;
    use crate::testing::{fake_handles, FakeDriver};
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[test]
    fn test_new_resolves_paths_against_root() {
        let config = WorkspaceConfig {
            settings: Settings::default(),
            repos: vec![
                RepoConfig {
                    url: "git@example.com:org/a.git".to_string(),
                    path: "a".to_string(),
                },
                RepoConfig {
                    url: "git@example.com:org/b.git".to_string(),
                    path: "libs/b".to_string(),
                },
            ],
        };

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_by_factory = Arc::clone(&seen);
        let factory = move |_repo: &RepoConfig, path: &Path, _settings: &Settings| {
            seen_by_factory.lock().unwrap().push(path.to_path_buf());
            Arc::new(FakeDriver::new("main")) as Arc<dyn RepoDriver>
        };

        let workspace = Workspace::new(config, "/ws", &factory);
        let names: Vec<_> = workspace.handles().iter().map(|h| h.name()).collect();
        assert_eq!(names, ["a", "libs/b"]);
        assert_eq!(
            *seen.lock().unwrap(),
            [PathBuf::from("/ws/a"), PathBuf::from("/ws/libs/b")]
        );
        assert!(workspace.executor().parallel);
    }

    #[test]
    fn test_load_uses_config_directory_as_root() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mergeish.toml");
        std::fs::write(
            &path,
            "[settings]\nparallel = false\n\n[[repos]]\nurl = \"git@example.com:a.git\"\npath = \"a\"\n",
        )
        .unwrap();

        let factory = |_repo: &RepoConfig, _path: &Path, _settings: &Settings| {
            Arc::new(FakeDriver::uncloned()) as Arc<dyn RepoDriver>
        };
        let workspace = Workspace::load(&path, &SettingsOverrides::default(), &factory).unwrap();

        assert_eq!(workspace.root(), temp.path());
        assert_eq!(workspace.handles()[0].path(), temp.path().join("a"));
        assert!(!workspace.executor().parallel);
    }

    #[tokio::test]
    async fn test_require_consistency_rejects_divergent_branches() {
        let temp = TempDir::new().unwrap();
        let (handles, _) = fake_handles(
            temp.path(),
            vec![("a", FakeDriver::new("main")), ("b", FakeDriver::new("dev"))],
        );
        let workspace =
            Workspace::from_handles(temp.path().to_path_buf(), Settings::default(), handles);

        let mut run = WorkflowRun::start("test");
        let err = workspace.require_consistency(&mut run, "push").await.unwrap_err();
        assert!(matches!(
            err,
            Error::BranchInconsistency { ref reference, .. } if reference == "main"
        ));
        assert_eq!(run.phase(), WorkflowPhase::Failed);
    }
}
