//! Clone, fetch, pull, push, status, and raw passthrough

use std::fmt;

use tracing::{debug, info, instrument};

use super::{Workspace, WorkflowPhase, WorkflowRun};
use crate::consistency::BranchConsistency;
use crate::driver::{RawOutput, RepoStatus};
use crate::outcome::Batch;
use crate::{Error, Result};

/// What the clone workflow did for one repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneStatus {
    Cloned,
    AlreadyCloned,
}

impl fmt::Display for CloneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloneStatus::Cloned => write!(f, "cloned"),
            CloneStatus::AlreadyCloned => write!(f, "already cloned"),
        }
    }
}

/// Options for the push workflow
#[derive(Debug, Clone, Copy, Default)]
pub struct PushOptions {
    /// Overwrite the remote branch
    pub force: bool,
    /// Push to origin under the current branch name and record it as upstream
    pub set_upstream: bool,
}

impl Workspace {
    /// Clone every repository that is not cloned yet
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn clone_all(&self) -> Batch<CloneStatus> {
        let mut run = WorkflowRun::start("clone");
        run.advance(WorkflowPhase::Dispatched);

        let outcomes = self
            .executor
            .run_all(&self.handles, |handle| async move {
                if handle.is_cloned() {
                    debug!(repo = handle.name(), "Already cloned");
                    return Ok(CloneStatus::AlreadyCloned);
                }
                debug!(repo = handle.name(), url = %handle.config().url, "Cloning");
                handle.clone_repo().await?;
                Ok(CloneStatus::Cloned)
            })
            .await;

        run.advance(WorkflowPhase::Aggregated);
        let batch = Batch::new(outcomes);
        info!(
            succeeded = batch.succeeded_count(),
            failed = batch.failed_count(),
            "Clone finished"
        );
        batch
    }

    /// Fetch every repository from its default remote
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn fetch(&self) -> Batch<()> {
        let mut run = WorkflowRun::start("fetch");
        run.advance(WorkflowPhase::Dispatched);

        let outcomes = self
            .executor
            .run_all(&self.handles, |handle| async move { handle.fetch().await })
            .await;

        run.advance(WorkflowPhase::Aggregated);
        Batch::new(outcomes)
    }

    /// Pull every repository; branch disagreement is reported, not rejected
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn pull(&self, rebase: bool) -> Result<Batch<()>> {
        let mut run = WorkflowRun::start("pull");
        let consistency = self.observe_consistency(&mut run, "pull").await?;
        run.advance(WorkflowPhase::Dispatched);

        let outcomes = self
            .executor
            .run_all(&self.handles, move |handle| async move {
                handle.pull(rebase).await
            })
            .await;

        run.advance(WorkflowPhase::Aggregated);
        let batch = Batch::new(outcomes).with_consistency(consistency);
        info!(
            succeeded = batch.succeeded_count(),
            failed = batch.failed_count(),
            "Pull finished"
        );
        Ok(batch)
    }

    /// Push every repository; all cloned repositories must share a branch
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn push(&self, options: PushOptions) -> Result<Batch<()>> {
        let mut run = WorkflowRun::start("push");
        self.require_consistency(&mut run, "push").await?;
        run.advance(WorkflowPhase::Dispatched);

        let outcomes = self
            .executor
            .run_all(&self.handles, move |handle| async move {
                if options.set_upstream {
                    handle.push_set_upstream().await
                } else {
                    handle.push(options.force).await
                }
            })
            .await;

        run.advance(WorkflowPhase::Aggregated);
        let batch = Batch::new(outcomes);
        info!(
            succeeded = batch.succeeded_count(),
            failed = batch.failed_count(),
            force = options.force,
            "Push finished"
        );
        Ok(batch)
    }

    /// Snapshot every repository
    ///
    /// Uncloned repositories yield a `NotCloned` outcome. Branch consistency
    /// is derived from the successful snapshots.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn status(&self) -> Batch<RepoStatus> {
        let mut run = WorkflowRun::start("status");
        run.advance(WorkflowPhase::Dispatched);

        let outcomes = self
            .executor
            .run_all(&self.handles, |handle| async move { handle.status().await })
            .await;

        run.advance(WorkflowPhase::Aggregated);
        let consistency = BranchConsistency::from_branches(
            outcomes
                .iter()
                .filter_map(|o| o.value())
                .map(|status| &status.branch),
        );
        Batch::new(outcomes).with_consistency(consistency)
    }

    /// Run an arbitrary git command in every repository
    ///
    /// A non-zero exit becomes a per-repository [`Error::Driver`] carrying the
    /// command's stderr, or its stdout when stderr is empty.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn run_raw(&self, args: Vec<String>) -> Result<Batch<RawOutput>> {
        let mut run = WorkflowRun::start("git");
        if args.is_empty() {
            return Err(run.fail(Error::InvalidInput(
                "no git arguments given".to_string(),
            )));
        }
        run.advance(WorkflowPhase::Dispatched);

        let command = format!("git {}", args.join(" "));
        let outcomes = self
            .executor
            .run_all(&self.handles, move |handle| {
                let args = args.clone();
                let command = command.clone();
                async move {
                    let output = handle.run_raw(&args).await?;
                    if output.success() {
                        return Ok(output);
                    }
                    let diagnostic = if output.stderr.trim().is_empty() {
                        output.stdout
                    } else {
                        output.stderr
                    };
                    Err(Error::driver(command, diagnostic))
                }
            })
            .await;

        run.advance(WorkflowPhase::Aggregated);
        Ok(Batch::new(outcomes))
    }
}
