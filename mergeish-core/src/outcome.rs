//! Per-repository outcomes of a fan-out

use std::sync::Arc;

use crate::consistency::BranchConsistency;
use crate::handle::RepoHandle;
use crate::{Error, Result};

/// Result of running one operation against one repository
///
/// Holds exactly one of a value or an error, together with the handle it was
/// produced for.
#[derive(Debug)]
pub struct Outcome<T> {
    handle: Arc<RepoHandle>,
    result: Result<T>,
}

impl<T> Outcome<T> {
    /// Create an outcome for `handle`
    pub fn new(handle: Arc<RepoHandle>, result: Result<T>) -> Self {
        Self { handle, result }
    }

    /// The repository this outcome belongs to
    pub fn handle(&self) -> &Arc<RepoHandle> {
        &self.handle
    }

    /// Display name of the repository
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    pub fn result(&self) -> &Result<T> {
        &self.result
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn is_err(&self) -> bool {
        self.result.is_err()
    }

    /// The success payload, if any
    pub fn value(&self) -> Option<&T> {
        self.result.as_ref().ok()
    }

    /// The failure, if any
    pub fn error(&self) -> Option<&Error> {
        self.result.as_ref().err()
    }

    pub fn into_result(self) -> Result<T> {
        self.result
    }
}

/// Whether any outcome failed
pub fn has_errors<T>(outcomes: &[Outcome<T>]) -> bool {
    outcomes.iter().any(Outcome::is_err)
}

/// Ordered outcomes of one workflow run
///
/// `consistency` is set for workflows that look at branch agreement without
/// requiring it (pull, status, pull request status) so callers can warn.
#[derive(Debug)]
pub struct Batch<T> {
    pub consistency: Option<BranchConsistency>,
    pub outcomes: Vec<Outcome<T>>,
}

impl<T> Batch<T> {
    pub fn new(outcomes: Vec<Outcome<T>>) -> Self {
        Self {
            consistency: None,
            outcomes,
        }
    }

    pub fn with_consistency(mut self, consistency: BranchConsistency) -> Self {
        self.consistency = Some(consistency);
        self
    }

    /// Whether any repository failed
    pub fn has_failures(&self) -> bool {
        has_errors(&self.outcomes)
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_err()).count()
    }

    pub fn succeeded_count(&self) -> usize {
        self.outcomes.len() - self.failed_count()
    }

    /// Whether the repositories were seen to disagree on their branch
    pub fn is_inconsistent(&self) -> bool {
        self.consistency.as_ref().is_some_and(|c| !c.consistent)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Outcome<T>> {
        self.outcomes.iter()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

impl<'a, T> IntoIterator for &'a Batch<T> {
    type Item = &'a Outcome<T>;
    type IntoIter = std::slice::Iter<'a, Outcome<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepoConfig;
    use crate::testing::FakeDriver;
    use std::path::Path;

    fn handle(name: &str) -> Arc<RepoHandle> {
        let config = RepoConfig {
            url: format!("git@example.com:{}.git", name),
            path: name.to_string(),
        };
        Arc::new(RepoHandle::new(
            config,
            Path::new("/ws"),
            Arc::new(FakeDriver::new("main")),
        ))
    }

    #[test]
    fn test_batch_counts() {
        let batch = Batch::new(vec![
            Outcome::new(handle("a"), Ok(())),
            Outcome::new(handle("b"), Err(Error::NotCloned)),
            Outcome::new(handle("c"), Ok(())),
        ]);

        assert!(batch.has_failures());
        assert_eq!(batch.failed_count(), 1);
        assert_eq!(batch.succeeded_count(), 2);
        assert!(!batch.is_inconsistent());

        let names: Vec<_> = batch.iter().map(Outcome::name).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn test_outcome_accessors() {
        let ok = Outcome::new(handle("a"), Ok(7));
        assert_eq!(ok.value(), Some(&7));
        assert!(ok.error().is_none());

        let failed: Outcome<i32> = Outcome::new(handle("b"), Err(Error::NotCloned));
        assert!(failed.value().is_none());
        assert!(matches!(failed.error(), Some(Error::NotCloned)));
    }
}
