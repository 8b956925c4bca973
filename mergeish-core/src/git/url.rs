//! Repository URL parsing

use std::path::Path;

use crate::{Error, Result};

/// Parsed repository location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoUrl {
    /// Repository owner or organization, when the URL names one
    pub owner: Option<String>,
    /// Repository name without any `.git` suffix
    pub name: String,
    /// URL to clone from
    pub clone_url: String,
}

impl RepoUrl {
    /// Parse a repository URL, shorthand, or local path
    ///
    /// Supports:
    /// - `https://github.com/owner/repo` (with or without `.git`)
    /// - `git@github.com:owner/repo.git`
    /// - `ssh://git@host/owner/repo.git`, `file:///srv/git/repo.git`
    /// - `owner/repo` (assumes GitHub)
    /// - a local path such as `../repo` or `/srv/git/repo.git`
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(Error::Config("Repository URL is empty".to_string()));
        }

        if input.contains("://") {
            return Self::parse_url(input);
        }

        // scp-like syntax: user@host:owner/repo.git
        if let Some((user_host, path)) = input.split_once(':') {
            if user_host.contains('@') && !path.is_empty() {
                return Self::from_path(path, input.to_string());
            }
        }

        // owner/repo shorthand
        let is_local = input.starts_with('.') || input.starts_with('/') || input.starts_with('~');
        if !is_local {
            let parts: Vec<&str> = input.split('/').collect();
            if parts.len() == 2 && parts.iter().all(|p| !p.is_empty()) {
                let owner = parts[0].to_string();
                let name = strip_git_suffix(parts[1]).to_string();
                return Ok(Self {
                    clone_url: format!("https://github.com/{}/{}.git", owner, name),
                    owner: Some(owner),
                    name,
                });
            }
        }

        let name = Path::new(input)
            .file_name()
            .and_then(|n| n.to_str())
            .map(strip_git_suffix)
            .filter(|n| !n.is_empty() && *n != "..")
            .ok_or_else(|| invalid(input))?;

        Ok(Self {
            owner: None,
            name: name.to_string(),
            clone_url: input.to_string(),
        })
    }

    fn parse_url(input: &str) -> Result<Self> {
        let url = url::Url::parse(input).map_err(|_| invalid(input))?;
        Self::from_path(url.path(), input.to_string())
    }

    fn from_path(path: &str, clone_url: String) -> Result<Self> {
        let segments: Vec<&str> = path
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let name = segments
            .last()
            .map(|s| strip_git_suffix(s))
            .filter(|n| !n.is_empty())
            .ok_or_else(|| invalid(&clone_url))?;
        let owner = (segments.len() >= 2).then(|| segments[segments.len() - 2].to_string());

        Ok(Self {
            owner,
            name: name.to_string(),
            clone_url,
        })
    }

    /// Workspace-relative path used when none is given explicitly
    pub fn default_path(&self) -> &str {
        &self.name
    }
}

fn strip_git_suffix(name: &str) -> &str {
    name.strip_suffix(".git").unwrap_or(name)
}

fn invalid(input: &str) -> Error {
    Error::Config(format!(
        "Invalid repository URL: {}. Expected format: owner/repo, https://github.com/owner/repo, git@github.com:owner/repo.git, or a local path",
        input
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shorthand() {
        let url = RepoUrl::parse("owner/repo").unwrap();
        assert_eq!(url.owner.as_deref(), Some("owner"));
        assert_eq!(url.name, "repo");
        assert_eq!(url.clone_url, "https://github.com/owner/repo.git");
    }

    #[test]
    fn test_parse_https() {
        let url = RepoUrl::parse("https://github.com/owner/repo").unwrap();
        assert_eq!(url.owner.as_deref(), Some("owner"));
        assert_eq!(url.name, "repo");
        assert_eq!(url.clone_url, "https://github.com/owner/repo");

        let url = RepoUrl::parse("https://gitlab.com/group/sub/tool.git").unwrap();
        assert_eq!(url.owner.as_deref(), Some("sub"));
        assert_eq!(url.default_path(), "tool");
    }

    #[test]
    fn test_parse_ssh() {
        let url = RepoUrl::parse("git@github.com:owner/repo.git").unwrap();
        assert_eq!(url.owner.as_deref(), Some("owner"));
        assert_eq!(url.name, "repo");
        assert_eq!(url.clone_url, "git@github.com:owner/repo.git");

        let url = RepoUrl::parse("ssh://git@example.com:2222/team/api.git").unwrap();
        assert_eq!(url.name, "api");
    }

    #[test]
    fn test_parse_local_path() {
        let url = RepoUrl::parse("../upstream/lib.git").unwrap();
        assert_eq!(url.owner, None);
        assert_eq!(url.name, "lib");
        assert_eq!(url.clone_url, "../upstream/lib.git");

        let url = RepoUrl::parse("/srv/git/tools").unwrap();
        assert_eq!(url.default_path(), "tools");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(RepoUrl::parse("").is_err());
        assert!(RepoUrl::parse("https://github.com/").is_err());
        assert!(RepoUrl::parse("..").is_err());
    }
}
