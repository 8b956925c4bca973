//! Commit workflow

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::{Workspace, WorkflowPhase, WorkflowRun};
use crate::outcome::Batch;
use crate::{Error, Result};

/// What the commit workflow did for one repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStatus {
    Committed,
    /// Nothing was staged; not a failure
    NoChanges,
}

impl fmt::Display for CommitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitStatus::Committed => write!(f, "committed"),
            CommitStatus::NoChanges => write!(f, "no changes"),
        }
    }
}

impl Workspace {
    /// Commit staged changes in every repository with the same message
    ///
    /// With `add_all` every change is staged first. Repositories with nothing
    /// staged report [`CommitStatus::NoChanges`].
    #[instrument(skip(self, message), fields(root = %self.root.display()))]
    pub async fn commit(&self, message: &str, add_all: bool) -> Result<Batch<CommitStatus>> {
        let mut run = WorkflowRun::start("commit");
        if message.trim().is_empty() {
            return Err(run.fail(Error::InvalidInput(
                "commit message is required".to_string(),
            )));
        }
        self.require_consistency(&mut run, "commit").await?;
        run.advance(WorkflowPhase::Dispatched);

        let message: Arc<str> = Arc::from(message);
        let outcomes = self
            .executor
            .run_all(&self.handles, move |handle| {
                let message = Arc::clone(&message);
                async move {
                    if add_all {
                        handle.stage_all().await?;
                    }
                    if !handle.has_staged_changes().await? {
                        debug!(repo = handle.name(), "Nothing staged");
                        return Ok(CommitStatus::NoChanges);
                    }
                    handle.commit(&message).await?;
                    Ok(CommitStatus::Committed)
                }
            })
            .await;

        run.advance(WorkflowPhase::Aggregated);
        let batch = Batch::new(outcomes);
        let committed = batch
            .iter()
            .filter(|o| o.value() == Some(&CommitStatus::Committed))
            .count();
        info!(committed, failed = batch.failed_count(), "Commit finished");
        Ok(batch)
    }
}
