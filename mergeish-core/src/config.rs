//! Configuration management for mergeish
//!
//! A workspace is described by a `mergeish.toml` file whose directory is the
//! workspace root. Settings are resolved with the following priority (highest
//! to lowest):
//! 1. CLI flags
//! 2. Environment variables (MERGEISH_*)
//! 3. Workspace file (`mergeish.toml`)
//! 4. User defaults (~/.config/mergeish/config.toml, `[settings]` only)
//! 5. Default values

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// File name searched for when no config path is given
pub const DEFAULT_CONFIG_FILE: &str = "mergeish.toml";

const CONFIG_TEMPLATE: &str = "\
# Settings left out here fall back to ~/.config/mergeish/config.toml
[settings]
";

/// A single managed repository
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RepoConfig {
    /// Clone URL
    pub url: String,
    /// Location relative to the workspace root
    pub path: String,
}

/// Workspace-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Branch used as the base when inferring pull request bodies
    pub default_branch: String,

    /// Run per-repository work concurrently
    pub parallel: bool,

    /// Maximum number of repositories worked on at once (unbounded when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,

    /// Deadline for each repository's unit of work
    #[serde(
        default,
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_branch: "main".to_string(),
            parallel: true,
            max_concurrency: None,
            timeout: None,
        }
    }
}

/// Root configuration structure (the contents of `mergeish.toml`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Workspace settings
    pub settings: Settings,

    /// Managed repositories, in configuration order
    pub repos: Vec<RepoConfig>,
}

/// Settings overrides coming from the command line
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    /// Force parallel (`Some(true)`) or sequential (`Some(false)`) execution
    pub parallel: Option<bool>,
    /// Concurrency ceiling
    pub max_concurrency: Option<usize>,
    /// Per-repository deadline
    pub timeout: Option<Duration>,
}

/// Shape of the user defaults file; only settings are honoured there
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UserDefaults {
    settings: Option<Settings>,
}

impl WorkspaceConfig {
    /// Load and validate a workspace config file
    ///
    /// Settings missing from the workspace file are taken from the user
    /// defaults file when one exists.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let base = Self::user_settings()?.unwrap_or_default();
        Self::parse_with_defaults(&contents, base)
    }

    /// Parse a config from TOML text using built-in defaults
    pub fn parse(contents: &str) -> Result<Self> {
        Self::parse_with_defaults(contents, Settings::default())
    }

    fn parse_with_defaults(contents: &str, base: Settings) -> Result<Self> {
        let mut value: toml::Table = toml::from_str(contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;

        // Layer the file's [settings] over the base settings
        let mut settings = match toml::Value::try_from(&base) {
            Ok(toml::Value::Table(table)) => table,
            Ok(_) => toml::Table::new(),
            Err(e) => return Err(Error::Config(format!("Failed to encode settings: {}", e))),
        };
        if let Some(toml::Value::Table(file_settings)) = value.remove("settings") {
            settings.extend(file_settings);
        }
        value.insert("settings".to_string(), toml::Value::Table(settings));

        let config: Self = toml::Value::Table(value)
            .try_into()
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Check the config for errors
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for (i, repo) in self.repos.iter().enumerate() {
            if repo.url.trim().is_empty() {
                return Err(Error::Config(format!("repo {}: url is required", i)));
            }
            if repo.path.trim().is_empty() {
                return Err(Error::Config(format!("repo {}: path is required", i)));
            }

            let path = Path::new(&repo.path);
            if path.is_absolute() {
                return Err(Error::Config(format!(
                    "repo {}: path {:?} must be relative to the workspace root",
                    i, repo.path
                )));
            }
            if path.components().any(|c| matches!(c, Component::ParentDir)) {
                return Err(Error::Config(format!(
                    "repo {}: path {:?} must stay inside the workspace root",
                    i, repo.path
                )));
            }

            if !seen.insert(normalize(path)) {
                return Err(Error::Config(format!(
                    "repo {}: duplicate path {:?}",
                    i, repo.path
                )));
            }
        }

        if self.settings.max_concurrency == Some(0) {
            return Err(Error::Config(
                "settings.max_concurrency must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Write a starter config file with an empty `[settings]` table
    ///
    /// No setting is written, so user defaults keep applying until the
    /// workspace file sets a key itself.
    pub fn write_template(path: &Path) -> Result<()> {
        std::fs::write(path, CONFIG_TEMPLATE)
            .map_err(|e| Error::Other(format!("Failed to write {}: {}", path.display(), e)))
    }

    /// Append a repository to the `repos` array of a config file
    ///
    /// Only the array changes; the file's other keys are written back as
    /// they were read, without resolved defaults.
    pub fn append_repo(path: &Path, repo: RepoConfig) -> Result<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&contents)?.add_repo(repo.clone())?;

        let mut table: toml::Table = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        let entry = toml::Value::try_from(&repo)
            .map_err(|e| Error::Other(format!("Failed to serialize repo: {}", e)))?;
        match table.entry("repos").or_insert(toml::Value::Array(Vec::new())) {
            toml::Value::Array(repos) => repos.push(entry),
            _ => return Err(Error::Config("repos must be an array".to_string())),
        }

        let contents = toml::to_string_pretty(&table)
            .map_err(|e| Error::Other(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)
            .map_err(|e| Error::Other(format!("Failed to write {}: {}", path.display(), e)))
    }

    /// Append a repository, rejecting the addition if it breaks validation
    pub fn add_repo(&mut self, repo: RepoConfig) -> Result<()> {
        self.repos.push(repo);
        if let Err(e) = self.validate() {
            self.repos.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Get the user defaults file path
    ///
    /// Returns `~/.config/mergeish/config.toml` on Unix
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mergeish").join("config.toml"))
    }

    fn user_settings() -> Result<Option<Settings>> {
        let Some(path) = Self::user_config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path).map_err(Error::Io)?;
        let defaults: UserDefaults = toml::from_str(&contents).map_err(|e| {
            Error::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        Ok(defaults.settings)
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - MERGEISH_PARALLEL: `true`/`false`
    /// - MERGEISH_MAX_CONCURRENCY: positive integer
    /// - MERGEISH_TIMEOUT: humantime duration such as `90s` or `5m`
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(parallel) = std::env::var("MERGEISH_PARALLEL") {
            self.settings.parallel = parse_bool(&parallel).ok_or_else(|| {
                Error::Config(format!("MERGEISH_PARALLEL: invalid boolean {:?}", parallel))
            })?;
        }

        if let Ok(max) = std::env::var("MERGEISH_MAX_CONCURRENCY") {
            let max = max.parse::<usize>().map_err(|e| {
                Error::Config(format!("MERGEISH_MAX_CONCURRENCY: {}", e))
            })?;
            self.settings.max_concurrency = Some(max);
        }

        if let Ok(timeout) = std::env::var("MERGEISH_TIMEOUT") {
            let timeout = parse_duration(&timeout)
                .map_err(|e| Error::Config(format!("MERGEISH_TIMEOUT: {}", e)))?;
            self.settings.timeout = Some(timeout);
        }

        self.validate()?;
        Ok(self)
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, overrides: &SettingsOverrides) -> Result<Self> {
        if let Some(parallel) = overrides.parallel {
            self.settings.parallel = parallel;
        }

        if let Some(max) = overrides.max_concurrency {
            self.settings.max_concurrency = Some(max);
        }

        if let Some(timeout) = overrides.timeout {
            self.settings.timeout = Some(timeout);
        }

        self.validate()?;
        Ok(self)
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > workspace file > user defaults > built-in defaults
    pub fn load_with_overrides(path: &Path, overrides: &SettingsOverrides) -> Result<Self> {
        Self::load(path)?
            .with_env_overrides()?
            .with_cli_overrides(overrides)
    }
}

/// Search for `mergeish.toml` starting from `start_dir` and walking up to
/// parent directories
pub fn find_config_file(start_dir: &Path) -> Result<PathBuf> {
    for dir in start_dir.ancestors() {
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    Err(Error::Config(format!(
        "config file {} not found in {} or any parent directory",
        DEFAULT_CONFIG_FILE,
        start_dir.display()
    )))
}

/// Parse a human-readable duration such as `90s`, `5m`, or `1h 30m`
pub fn parse_duration(input: &str) -> Result<Duration> {
    humantime_serde::re::humantime::parse_duration(input.trim())
        .map_err(|e| Error::InvalidInput(format!("invalid duration {:?}: {}", input, e)))
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = WorkspaceConfig::default();
        assert!(config.repos.is_empty());
        assert_eq!(config.settings.default_branch, "main");
        assert!(config.settings.parallel);
        assert!(config.settings.max_concurrency.is_none());
        assert!(config.settings.timeout.is_none());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[settings]
default_branch = "develop"
parallel = false
max_concurrency = 4
timeout = "90s"

[[repos]]
url = "git@github.com:org/api.git"
path = "services/api"

[[repos]]
url = "https://github.com/org/web"
path = "web"
"#;
        let config = WorkspaceConfig::parse(toml).unwrap();
        assert_eq!(config.settings.default_branch, "develop");
        assert!(!config.settings.parallel);
        assert_eq!(config.settings.max_concurrency, Some(4));
        assert_eq!(config.settings.timeout, Some(Duration::from_secs(90)));
        assert_eq!(config.repos.len(), 2);
        assert_eq!(config.repos[0].path, "services/api");
        assert_eq!(config.repos[1].url, "https://github.com/org/web");
    }

    #[test]
    fn test_partial_settings_keep_defaults() {
        let toml = r#"
[settings]
parallel = false
"#;
        let config = WorkspaceConfig::parse(toml).unwrap();
        assert!(!config.settings.parallel);
        assert_eq!(config.settings.default_branch, "main");
    }

    #[test]
    fn test_file_settings_layer_over_user_defaults() {
        let base = Settings {
            default_branch: "trunk".to_string(),
            parallel: false,
            max_concurrency: Some(2),
            timeout: None,
        };
        let config = WorkspaceConfig::parse_with_defaults(
            "[settings]\nparallel = true\n",
            base,
        )
        .unwrap();
        assert_eq!(config.settings.default_branch, "trunk");
        assert!(config.settings.parallel);
        assert_eq!(config.settings.max_concurrency, Some(2));
    }

    #[test]
    fn test_validate_missing_url() {
        let toml = r#"
[[repos]]
url = ""
path = "a"
"#;
        let err = WorkspaceConfig::parse(toml).unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("url is required")));
    }

    #[test]
    fn test_validate_missing_path() {
        let toml = r#"
[[repos]]
url = "git@example.com:a.git"
path = ""
"#;
        let err = WorkspaceConfig::parse(toml).unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("path is required")));
    }

    #[test]
    fn test_validate_duplicate_path() {
        let toml = r#"
[[repos]]
url = "git@example.com:a.git"
path = "lib"

[[repos]]
url = "git@example.com:b.git"
path = "./lib"
"#;
        let err = WorkspaceConfig::parse(toml).unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("duplicate path")));
    }

    #[test]
    fn test_validate_escaping_path() {
        let toml = r#"
[[repos]]
url = "git@example.com:a.git"
path = "../outside"
"#;
        assert!(WorkspaceConfig::parse(toml).is_err());
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let toml = "[settings]\nmax_concurrency = 0\n";
        assert!(WorkspaceConfig::parse(toml).is_err());
    }

    #[test]
    fn test_add_repo_rolls_back_on_duplicate() {
        let mut config = WorkspaceConfig::default();
        config
            .add_repo(RepoConfig {
                url: "git@example.com:a.git".to_string(),
                path: "a".to_string(),
            })
            .unwrap();

        let result = config.add_repo(RepoConfig {
            url: "git@example.com:other.git".to_string(),
            path: "a".to_string(),
        });
        assert!(result.is_err());
        assert_eq!(config.repos.len(), 1);
    }

    #[test]
    fn test_cli_overrides() {
        let overrides = SettingsOverrides {
            parallel: Some(false),
            max_concurrency: Some(3),
            timeout: Some(Duration::from_secs(30)),
        };
        let config = WorkspaceConfig::default()
            .with_cli_overrides(&overrides)
            .unwrap();

        assert!(!config.settings.parallel);
        assert_eq!(config.settings.max_concurrency, Some(3));
        assert_eq!(config.settings.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_template_and_appended_repos_leave_settings_unset() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(DEFAULT_CONFIG_FILE);

        WorkspaceConfig::write_template(&path).unwrap();
        let repo = RepoConfig {
            url: "git@example.com:a.git".to_string(),
            path: "a".to_string(),
        };
        WorkspaceConfig::append_repo(&path, repo.clone()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("parallel"));
        assert!(!contents.contains("default_branch"));

        let base = Settings {
            default_branch: "develop".to_string(),
            parallel: false,
            ..Settings::default()
        };
        let config = WorkspaceConfig::parse_with_defaults(&contents, base).unwrap();
        assert_eq!(config.settings.default_branch, "develop");
        assert!(!config.settings.parallel);
        assert_eq!(config.repos, [repo]);
    }

    #[test]
    fn test_append_repo_keeps_written_settings() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[settings]\ntimeout = \"5m\"\n").unwrap();

        WorkspaceConfig::append_repo(
            &path,
            RepoConfig {
                url: "git@example.com:a.git".to_string(),
                path: "a".to_string(),
            },
        )
        .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("parallel"));
        let config = WorkspaceConfig::parse(&contents).unwrap();
        assert_eq!(config.settings.timeout, Some(Duration::from_secs(300)));
        assert_eq!(config.repos.len(), 1);
    }

    #[test]
    fn test_append_repo_rejects_duplicate_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(DEFAULT_CONFIG_FILE);
        WorkspaceConfig::write_template(&path).unwrap();

        let repo = |url: &str| RepoConfig {
            url: url.to_string(),
            path: "a".to_string(),
        };
        WorkspaceConfig::append_repo(&path, repo("git@example.com:a.git")).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let err = WorkspaceConfig::append_repo(&path, repo("git@example.com:b.git")).unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("duplicate path")));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("90s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration(" 5m ").unwrap(), Duration::from_secs(300));
        assert!(matches!(parse_duration("soon"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_find_config_file_walks_up() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&config_path, "").unwrap();

        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_config_file(&nested).unwrap(), config_path);
    }

    #[test]
    fn test_find_config_file_missing() {
        let temp = TempDir::new().unwrap();
        // An ancestor of the temp dir may hold a config
        if let Err(e) = find_config_file(temp.path()) {
            assert!(matches!(e, Error::Config(_)));
        }
    }
}
