//! Core library for mergeish
//!
//! This crate contains the workspace orchestration engine: configuration,
//! repository handles, the fan-out executor, branch consistency checks, and
//! the multi-repository workflows built on them.

pub mod config;
pub mod consistency;
pub mod driver;
pub mod error;
pub mod executor;
pub mod git;
pub mod handle;
pub mod outcome;
pub mod workspace;

#[cfg(test)]
mod testing;

pub use config::{
    find_config_file, parse_duration, RepoConfig, Settings, SettingsOverrides, WorkspaceConfig,
    DEFAULT_CONFIG_FILE,
};
pub use consistency::{check_consistency, BranchConsistency};
pub use driver::{
    DriverFactory, FileStatus, PrState, PullRequest, RawOutput, RepoDriver, RepoStatus,
};
pub use error::{Error, Result};
pub use executor::FanOut;
pub use git::{GitCli, RepoUrl};
pub use handle::RepoHandle;
pub use outcome::{has_errors, Batch, Outcome};
pub use workspace::{
    CheckoutStatus, CloneStatus, CommitStatus, PrCreateRequest, PrCreated, PushOptions, Workspace,
    WorkflowPhase,
};
