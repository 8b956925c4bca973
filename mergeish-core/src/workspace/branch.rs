//! Branch workflows: create, delete, checkout, list

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::{Workspace, WorkflowPhase, WorkflowRun};
use crate::consistency::BranchConsistency;
use crate::outcome::Batch;
use crate::{Error, Result};

/// What checkout did for one repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStatus {
    /// Switched to an existing branch
    Switched,
    /// Branch did not exist and was created from HEAD
    Created,
}

impl fmt::Display for CheckoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckoutStatus::Switched => write!(f, "switched"),
            CheckoutStatus::Created => write!(f, "created"),
        }
    }
}

fn require_branch_name(run: &mut WorkflowRun, name: &str) -> Result<Arc<str>> {
    let name = name.trim();
    if name.is_empty() {
        return Err(run.fail(Error::InvalidInput("branch name is required".to_string())));
    }
    Ok(Arc::from(name))
}

impl Workspace {
    /// Create `name` from HEAD in every repository and switch to it
    ///
    /// Repositories that already have the branch fail individually with
    /// [`Error::BranchAlreadyExists`]; the others proceed.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn create_branch(&self, name: &str) -> Result<Batch<()>> {
        let mut run = WorkflowRun::start("branch create");
        let name = require_branch_name(&mut run, name)?;
        run.advance(WorkflowPhase::Dispatched);

        let outcomes = self
            .executor
            .run_all(&self.handles, move |handle| {
                let name = Arc::clone(&name);
                async move {
                    if handle.branch_exists(&name).await? {
                        return Err(Error::BranchAlreadyExists(name.to_string()));
                    }
                    debug!(repo = handle.name(), branch = %name, "Creating branch");
                    handle.create_and_switch(&name).await
                }
            })
            .await;

        run.advance(WorkflowPhase::Aggregated);
        let batch = Batch::new(outcomes);
        info!(
            succeeded = batch.succeeded_count(),
            failed = batch.failed_count(),
            "Branch create finished"
        );
        Ok(batch)
    }

    /// Delete the local branch `name` in every repository
    ///
    /// A repository currently on `name` fails with
    /// [`Error::CannotDeleteCurrentBranch`] and one without the branch fails
    /// with [`Error::BranchNotFound`], both without a delete attempt.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn delete_branch(&self, name: &str) -> Result<Batch<()>> {
        let mut run = WorkflowRun::start("branch delete");
        let name = require_branch_name(&mut run, name)?;
        run.advance(WorkflowPhase::Dispatched);

        let outcomes = self
            .executor
            .run_all(&self.handles, move |handle| {
                let name = Arc::clone(&name);
                async move {
                    if handle.current_branch().await? == *name {
                        return Err(Error::CannotDeleteCurrentBranch(name.to_string()));
                    }
                    if !handle.branch_exists(&name).await? {
                        return Err(Error::BranchNotFound(name.to_string()));
                    }
                    handle.delete_branch(&name).await
                }
            })
            .await;

        run.advance(WorkflowPhase::Aggregated);
        Ok(Batch::new(outcomes))
    }

    /// Switch every repository to `name`, creating it where it is missing
    ///
    /// Partial failure leaves repositories on different branches; nothing is
    /// rolled back.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn checkout(&self, name: &str) -> Result<Batch<CheckoutStatus>> {
        let mut run = WorkflowRun::start("checkout");
        let name = require_branch_name(&mut run, name)?;
        run.advance(WorkflowPhase::Dispatched);

        let outcomes = self
            .executor
            .run_all(&self.handles, move |handle| {
                let name = Arc::clone(&name);
                async move {
                    if handle.branch_exists(&name).await? {
                        handle.switch(&name).await?;
                        Ok(CheckoutStatus::Switched)
                    } else {
                        handle.create_and_switch(&name).await?;
                        Ok(CheckoutStatus::Created)
                    }
                }
            })
            .await;

        run.advance(WorkflowPhase::Aggregated);
        let batch = Batch::new(outcomes);
        info!(
            succeeded = batch.succeeded_count(),
            failed = batch.failed_count(),
            "Checkout finished"
        );
        Ok(batch)
    }

    /// Current branch of every repository
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn current_branches(&self) -> Batch<String> {
        let mut run = WorkflowRun::start("branch list");
        run.advance(WorkflowPhase::Dispatched);

        let outcomes = self
            .executor
            .run_all(&self.handles, |handle| async move { handle.current_branch().await })
            .await;

        run.advance(WorkflowPhase::Aggregated);
        let consistency =
            BranchConsistency::from_branches(outcomes.iter().filter_map(|o| o.value()));
        Batch::new(outcomes).with_consistency(consistency)
    }
}
