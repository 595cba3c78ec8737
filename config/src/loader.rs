//! Configuration loading utilities
//!
//! Locates the configuration directory and loads it into a [`PortageConfig`].

use crate::{ConfigError, PortageConfig, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable overriding the home directory used to find `.pkgenv`
pub const PKGENV_HOME: &str = "PKGENV_HOME";

/// System-wide configuration directory
pub const SYSTEM_CONFIG_DIR: &str = "/etc/pkgenv";

/// Name of the per-user configuration directory
pub const USER_CONFIG_DIR: &str = ".pkgenv";

/// Configuration loader
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Root path for configuration
    root: PathBuf,
    /// Whether to use default values when the root is missing
    use_defaults: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            use_defaults: true,
        }
    }

    /// Create a loader for the ambient configuration
    ///
    /// `$PKGENV_HOME/.pkgenv` if `PKGENV_HOME` is set, else `~/.pkgenv` if it
    /// exists, else `/etc/pkgenv`.
    pub fn from_env() -> Self {
        let pkgenv_home = std::env::var_os(PKGENV_HOME).map(PathBuf::from);
        Self::new(resolve_config_dir(pkgenv_home.as_deref(), dirs::home_dir().as_deref()))
    }

    /// Set whether to use defaults for a missing configuration directory
    pub fn use_defaults(mut self, use_defaults: bool) -> Self {
        self.use_defaults = use_defaults;
        self
    }

    /// Load the complete configuration
    pub fn load(&self) -> Result<PortageConfig> {
        if !self.root.exists() {
            if self.use_defaults {
                debug!("No configuration at {}, using defaults", self.root.display());
                return Ok(PortageConfig {
                    config_root: self.root.clone(),
                    ..PortageConfig::default()
                });
            }
            return Err(ConfigError::NotFound(self.root.clone()));
        }

        PortageConfig::load(&self.root)
    }

    /// Get the configuration root path
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Pick the configuration directory from an optional `PKGENV_HOME` and home directory
pub fn resolve_config_dir(pkgenv_home: Option<&Path>, home: Option<&Path>) -> PathBuf {
    if let Some(dir) = pkgenv_home {
        return dir.join(USER_CONFIG_DIR);
    }

    if let Some(home) = home {
        let user_dir = home.join(USER_CONFIG_DIR);
        if user_dir.is_dir() {
            return user_dir;
        }
    }

    PathBuf::from(SYSTEM_CONFIG_DIR)
}
