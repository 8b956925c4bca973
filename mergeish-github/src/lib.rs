//! mergeish GitHub - pull request integration for mergeish
//!
//! This crate drives the GitHub CLI (`gh`) for pull request operations and
//! combines it with the core git driver into a complete repository driver.

mod driver;
mod error;
mod gh;

pub use driver::{GitHubDriver, GitHubDriverFactory};
pub use error::{Error, Result};
pub use gh::GhCli;
