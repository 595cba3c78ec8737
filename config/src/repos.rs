//! Repository configuration
//!
//! Implements repos.conf:
//! - Repository definitions (`[name]` sections with a `location`)
//! - Repository priorities (file order, then the `priority` key)
//! - The `[DEFAULT]` section (`main-repo`)

use crate::portage::config_dir_files;
use crate::{ConfigError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Repository configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReposConfig {
    /// Main repository named by `[DEFAULT] main-repo`
    pub main_repo: Option<String>,
    /// Repository definitions, in file order
    pub repos: IndexMap<String, Repository>,
}

impl ReposConfig {
    /// Create a new repository configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a repository, rejecting duplicate names
    pub fn add_repo(&mut self, repo: Repository) -> Result<()> {
        if self.repos.contains_key(&repo.name) {
            return Err(ConfigError::Invalid(format!(
                "repository '{}' defined twice",
                repo.name
            )));
        }
        self.repos.insert(repo.name.clone(), repo);
        Ok(())
    }

    /// Get a repository by name
    pub fn get_repo(&self, name: &str) -> Option<&Repository> {
        self.repos.get(name)
    }

    /// Check if a repository exists
    pub fn has_repo(&self, name: &str) -> bool {
        self.repos.contains_key(name)
    }

    /// Get repository names in file order
    pub fn repo_names(&self) -> Vec<&str> {
        self.repos.keys().map(|s| s.as_str()).collect()
    }

    /// Get all repositories, highest priority first
    ///
    /// The main repository comes first; repositories of equal priority keep
    /// their file order.
    pub fn repos_by_priority(&self) -> Vec<&Repository> {
        let mut repos: Vec<&Repository> = self.repos.values().collect();
        repos.sort_by_key(|r| {
            let is_main = self.main_repo.as_deref() == Some(r.name.as_str());
            (!is_main, std::cmp::Reverse(r.priority))
        });
        repos
    }
}

/// A single repository definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Repository name
    pub name: String,
    /// Local location
    pub location: PathBuf,
    /// Priority (higher = more important)
    pub priority: i32,
}

impl Repository {
    /// Create a new repository
    pub fn new(name: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            priority: 0,
        }
    }

    /// Set priority
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Parse a repos.conf file or directory
///
/// Relative locations are resolved against the directory holding
/// `repos.conf`, whether it is a file or a directory of `*.conf` files.
pub fn parse_repos_conf(path: &Path) -> Result<ReposConfig> {
    let mut config = ReposConfig::new();
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    if path.is_dir() {
        for file in config_dir_files(path)? {
            if file.extension().map(|s| s != "conf").unwrap_or(true) {
                continue;
            }
            let content = std::fs::read_to_string(&file)?;
            parse_repos_conf_content(&content, base, &mut config)?;
        }
    } else {
        let content = std::fs::read_to_string(path)?;
        parse_repos_conf_content(&content, base, &mut config)?;
    }

    Ok(config)
}

/// Parse repos.conf content (INI-like format)
pub fn parse_repos_conf_content(content: &str, base: &Path, config: &mut ReposConfig) -> Result<()> {
    let mut current_section: Option<String> = None;
    let mut current_values: HashMap<String, String> = HashMap::new();

    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            if let Some(section) = current_section.take() {
                save_section(&section, &current_values, base, config)?;
            }

            current_section = Some(line[1..line.len() - 1].trim().to_string());
            current_values.clear();
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            current_values.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    if let Some(section) = current_section {
        save_section(&section, &current_values, base, config)?;
    }

    Ok(())
}

fn save_section(
    section: &str,
    values: &HashMap<String, String>,
    base: &Path,
    config: &mut ReposConfig,
) -> Result<()> {
    if section == "DEFAULT" {
        if let Some(v) = values.get("main-repo") {
            config.main_repo = Some(v.clone());
        }
        return Ok(());
    }

    let location = values.get("location").ok_or_else(|| {
        ConfigError::Invalid(format!("repository '{}' has no location", section))
    })?;
    let location = PathBuf::from(location);
    let location = if location.is_relative() {
        base.join(location)
    } else {
        location
    };

    let priority = match values.get("priority") {
        Some(v) => v.parse().map_err(|_| {
            ConfigError::Invalid(format!("repository '{}' has invalid priority '{}'", section, v))
        })?,
        None => 0,
    };

    config.add_repo(Repository::new(section, location).with_priority(priority))
}
