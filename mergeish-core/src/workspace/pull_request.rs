//! Pull request workflows: status, create, close, body inference

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::{Workspace, WorkflowPhase, WorkflowRun};
use crate::driver::PullRequest;
use crate::outcome::Batch;
use crate::{Error, Result};

/// Input to [`Workspace::create_prs`]
#[derive(Debug, Clone, Default)]
pub struct PrCreateRequest {
    /// PR title (required)
    pub title: String,
    /// PR body; may be empty
    pub body: String,
    /// Base branch; the hosting service's default when `None`
    pub base: Option<String>,
    /// Build the body from commit subjects when `body` is empty
    pub infer_body: bool,
}

/// Pull request for one repository after the create workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrCreated {
    pub pull_request: PullRequest,
    /// True when the PR was already open and was reused
    pub existed: bool,
}

impl Workspace {
    /// Look up the pull request for each repository's current branch
    ///
    /// A repository without a PR yields `Ok(None)`.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn pr_status(&self) -> Result<Batch<Option<PullRequest>>> {
        let mut run = WorkflowRun::start("pr status");
        let consistency = self.observe_consistency(&mut run, "pr status").await?;
        run.advance(WorkflowPhase::Dispatched);

        let outcomes = self
            .executor
            .run_all(&self.handles, |handle| async move {
                handle.get_pull_request().await
            })
            .await;

        run.advance(WorkflowPhase::Aggregated);
        Ok(Batch::new(outcomes).with_consistency(consistency))
    }

    /// Open a pull request in every repository, reusing any that already exist
    #[instrument(skip(self, request), fields(root = %self.root.display(), title = %request.title))]
    pub async fn create_prs(&self, request: PrCreateRequest) -> Result<Batch<PrCreated>> {
        let mut run = WorkflowRun::start("pr create");
        if request.title.trim().is_empty() {
            return Err(run.fail(Error::InvalidInput(
                "pull request title is required".to_string(),
            )));
        }
        self.require_consistency(&mut run, "create pull requests")
            .await?;

        let mut body = request.body;
        if request.infer_body && body.is_empty() {
            body = self.infer_pr_body(request.base.as_deref()).await;
        }

        run.advance(WorkflowPhase::Dispatched);

        let title: Arc<str> = Arc::from(request.title);
        let body: Arc<str> = Arc::from(body);
        let base: Option<Arc<str>> = request.base.map(Arc::from);
        let outcomes = self
            .executor
            .run_all(&self.handles, move |handle| {
                let (title, body, base) = (Arc::clone(&title), Arc::clone(&body), base.clone());
                async move {
                    if let Some(existing) = handle.get_pull_request().await? {
                        debug!(repo = handle.name(), number = existing.number, "Pull request exists");
                        return Ok(PrCreated {
                            pull_request: existing,
                            existed: true,
                        });
                    }
                    let created = handle
                        .create_pull_request(&title, &body, base.as_deref())
                        .await?;
                    Ok(PrCreated {
                        pull_request: created,
                        existed: false,
                    })
                }
            })
            .await;

        run.advance(WorkflowPhase::Aggregated);
        let batch = Batch::new(outcomes);
        info!(
            succeeded = batch.succeeded_count(),
            failed = batch.failed_count(),
            "Pull request create finished"
        );
        Ok(batch)
    }

    /// Close the pull request for every repository's current branch
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn close_prs(&self) -> Result<Batch<()>> {
        let mut run = WorkflowRun::start("pr close");
        self.require_consistency(&mut run, "close pull requests")
            .await?;
        run.advance(WorkflowPhase::Dispatched);

        let outcomes = self
            .executor
            .run_all(&self.handles, |handle| async move {
                handle.close_pull_request().await
            })
            .await;

        run.advance(WorkflowPhase::Aggregated);
        Ok(Batch::new(outcomes))
    }

    /// Build a pull request body from the commit subjects of every cloned
    /// repository
    ///
    /// Subjects are listed once each, in repository order then commit order.
    /// Repositories whose commits cannot be read are skipped. Returns an empty
    /// string when there is nothing to list.
    pub async fn infer_pr_body(&self, base: Option<&str>) -> String {
        let base: Option<Arc<str>> = base.map(Arc::from);
        let outcomes = self
            .executor
            .run_all(&self.handles, move |handle| {
                let base = base.clone();
                async move {
                    if !handle.is_cloned() {
                        return Ok(Vec::new());
                    }
                    handle.commit_subjects_since(base.as_deref()).await
                }
            })
            .await;

        let mut subjects = Vec::new();
        for outcome in &outcomes {
            match outcome.result() {
                Ok(list) => subjects.extend(list.iter().map(String::as_str)),
                Err(e) => warn!(repo = outcome.name(), error = %e, "Skipping commits"),
            }
        }

        render_changes(subjects)
    }
}

/// `## Changes` section listing each non-empty subject once
fn render_changes<'a>(subjects: impl IntoIterator<Item = &'a str>) -> String {
    let mut seen = HashSet::new();
    let mut body = String::new();

    for subject in subjects {
        if subject.is_empty() || !seen.insert(subject) {
            continue;
        }
        if body.is_empty() {
            body.push_str("## Changes\n\n");
        }
        body.push_str("- ");
        body.push_str(subject);
        body.push('\n');
    }

    body
}
