//! Branch consistency across repositories

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::handle::RepoHandle;
use crate::Result;

/// Whether every cloned repository is on the same branch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchConsistency {
    /// Current branch of the first cloned repository; empty when none are cloned
    pub reference_branch: String,
    /// True when every cloned repository is on `reference_branch`
    pub consistent: bool,
}

impl BranchConsistency {
    /// Fold a sequence of branch names, in repository order
    ///
    /// An empty sequence is vacuously consistent.
    pub fn from_branches<I, S>(branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut reference: Option<String> = None;
        let mut consistent = true;

        for branch in branches {
            let branch = branch.as_ref();
            match &reference {
                None => reference = Some(branch.to_string()),
                Some(first) if first != branch => consistent = false,
                Some(_) => {}
            }
        }

        Self {
            reference_branch: reference.unwrap_or_default(),
            consistent,
        }
    }
}

impl fmt::Display for BranchConsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.consistent {
            write!(f, "all repositories on {:?}", self.reference_branch)
        } else {
            write!(f, "repositories diverge from {:?}", self.reference_branch)
        }
    }
}

/// Read the current branch of every cloned handle and compare them
///
/// Uncloned handles are skipped. A mismatch does not stop the scan, but a
/// failure to read any cloned repository's branch fails the whole check.
pub async fn check_consistency(handles: &[Arc<RepoHandle>]) -> Result<BranchConsistency> {
    let mut branches = Vec::with_capacity(handles.len());

    for handle in handles {
        if !handle.is_cloned() {
            continue;
        }
        branches.push(handle.current_branch().await?);
    }

    Ok(BranchConsistency::from_branches(branches))
}
