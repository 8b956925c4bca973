//! Lifecycle of a single multi-repository workflow run

use std::fmt;

use tracing::debug;

/// Phase of a workflow run
///
/// `NotStarted → ConsistencyChecked (when required) → Dispatched → Aggregated`,
/// or `→ Failed` when a pre-condition rejects the run before dispatch. There is
/// no way back from `Dispatched`: per-repository effects are permanent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowPhase {
    #[default]
    NotStarted,
    /// Branch agreement was verified
    ConsistencyChecked,
    /// Work was handed to the fan-out executor
    Dispatched,
    /// Every repository reported an outcome
    Aggregated,
    /// Rejected before any repository was touched
    Failed,
}

impl WorkflowPhase {
    /// Whether moving from `self` to `next` is a legal transition
    pub fn can_advance_to(&self, next: WorkflowPhase) -> bool {
        use WorkflowPhase::*;
        matches!(
            (self, next),
            (NotStarted, ConsistencyChecked)
                | (NotStarted, Dispatched)
                | (NotStarted, Failed)
                | (ConsistencyChecked, Dispatched)
                | (ConsistencyChecked, Failed)
                | (Dispatched, Aggregated)
        )
    }

    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowPhase::Aggregated | WorkflowPhase::Failed)
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            WorkflowPhase::NotStarted => "not started",
            WorkflowPhase::ConsistencyChecked => "branch consistency checked",
            WorkflowPhase::Dispatched => "dispatched to repositories",
            WorkflowPhase::Aggregated => "outcomes aggregated",
            WorkflowPhase::Failed => "rejected before dispatch",
        }
    }
}

impl fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Tracks and logs the phase of one workflow run
#[derive(Debug)]
pub(crate) struct WorkflowRun {
    workflow: &'static str,
    phase: WorkflowPhase,
}

impl WorkflowRun {
    pub(crate) fn start(workflow: &'static str) -> Self {
        Self {
            workflow,
            phase: WorkflowPhase::NotStarted,
        }
    }

    pub(crate) fn advance(&mut self, next: WorkflowPhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal workflow transition {:?} -> {:?}",
            self.phase,
            next
        );
        debug!(workflow = self.workflow, from = ?self.phase, to = ?next, "Workflow phase");
        self.phase = next;
    }

    /// Mark the run rejected and hand back the error for propagation
    pub(crate) fn fail<E>(&mut self, err: E) -> E {
        self.advance(WorkflowPhase::Failed);
        err
    }

    pub(crate) fn phase(&self) -> WorkflowPhase {
        self.phase
    }
}
