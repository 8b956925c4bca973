//! Error types for GitHub CLI operations

use thiserror::Error;

/// Result type for GitHub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving `gh`
#[derive(Error, Debug)]
pub enum Error {
    /// `gh` could not be started
    #[error("failed to run gh: {0}")]
    Spawn(#[from] std::io::Error),

    /// `gh` exited unsuccessfully
    #[error("{} failed: {}", .command, .stderr.trim_end())]
    Command { command: String, stderr: String },

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map into the engine's pull request lookup failure
    pub fn into_lookup(self) -> mergeish_core::Error {
        mergeish_core::Error::PullRequestLookup(self.to_string())
    }

    /// Map into the engine's pull request creation failure
    pub fn into_create(self) -> mergeish_core::Error {
        mergeish_core::Error::PullRequestCreate(self.to_string())
    }
}

impl From<Error> for mergeish_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Command { command, stderr } => mergeish_core::Error::Driver { command, stderr },
            Error::Spawn(e) => mergeish_core::Error::Io(e),
            other => mergeish_core::Error::Other(other.to_string()),
        }
    }
}
