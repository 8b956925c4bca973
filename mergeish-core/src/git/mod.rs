//! Git operations for mergeish
//!
//! This module provides the git half of a repository driver and parsing of
//! repository URLs.

mod cli;
mod status;
mod url;

pub use cli::GitCli;
pub use url::RepoUrl;
