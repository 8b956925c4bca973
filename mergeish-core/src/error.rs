//! Error types for mergeish

use std::time::Duration;

use thiserror::Error;

/// Result type alias for mergeish operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for mergeish operations
///
/// Per-repository errors end up inside an [`Outcome`](crate::Outcome) and never
/// abort sibling repositories. Workflow pre-condition errors
/// ([`Error::BranchInconsistency`], [`Error::InvalidInput`]) are returned
/// before any repository is touched.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The repository has not been cloned into its configured path
    #[error("not cloned")]
    NotCloned,

    /// Branch creation refused because the branch is already present
    #[error("branch {0:?} already exists")]
    BranchAlreadyExists(String),

    /// A referenced branch does not exist
    #[error("branch {0:?} not found")]
    BranchNotFound(String),

    /// Deleting the checked-out branch is refused per repository
    #[error("cannot delete current branch {0:?}")]
    CannotDeleteCurrentBranch(String),

    /// Cloned repositories disagree on their current branch
    #[error("repositories are on different branches (first is {reference:?}), cannot {operation}")]
    BranchInconsistency {
        /// Branch of the first cloned repository
        reference: String,
        /// Workflow that was refused
        operation: String,
    },

    /// An external tool exited unsuccessfully; `stderr` is kept verbatim
    #[error("{} failed: {}", .command, .stderr.trim_end())]
    Driver {
        /// The command line that was run
        command: String,
        /// Diagnostic output of the tool
        stderr: String,
    },

    /// Looking up the pull request for the current branch failed
    #[error("pull request lookup failed: {0}")]
    PullRequestLookup(String),

    /// Creating a pull request failed
    #[error("pull request creation failed: {0}")]
    PullRequestCreate(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or malformed workflow input (empty commit message, no title, ...)
    #[error("{0}")]
    InvalidInput(String),

    /// A unit of fan-out work exceeded the configured deadline
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a [`Error::Driver`] from a command line and its diagnostic output
    pub fn driver(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Error::Driver {
            command: command.into(),
            stderr: stderr.into(),
        }
    }
}
