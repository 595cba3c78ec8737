//! Global make.conf configuration
//!
//! make.conf is a TOML file carrying the global policy inputs:
//!
//! ```toml
//! arch = "amd64"
//! use = "X wayland -gtk"
//! accept_keywords = "amd64 ~amd64"
//! accept_license = "* -NVIDIA"
//! ```

use crate::{KeywordConfig, LicenseConfig, Result, UseConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// make.conf settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MakeConf {
    /// Architecture keyword; defaults to the repository profile ARCH or the host
    pub arch: Option<String>,
    /// Global USE flags
    #[serde(rename = "use")]
    pub use_flags: String,
    /// ACCEPT_KEYWORDS
    pub accept_keywords: String,
    /// ACCEPT_LICENSE
    pub accept_license: String,
}

impl Default for MakeConf {
    fn default() -> Self {
        Self {
            arch: None,
            use_flags: String::new(),
            accept_keywords: String::new(),
            accept_license: "*".to_string(),
        }
    }
}

impl MakeConf {
    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse TOML content
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Global USE configuration
    pub fn use_config(&self) -> UseConfig {
        let mut config = UseConfig::new();
        config.set_use(&self.use_flags);
        config
    }

    /// Global keyword configuration for `arch`
    ///
    /// The stable `arch` keyword is always accepted before ACCEPT_KEYWORDS is
    /// applied, so `-*` in ACCEPT_KEYWORDS can still withdraw it.
    pub fn keyword_config(&self, arch: &str) -> Result<KeywordConfig> {
        let mut config = KeywordConfig::new(arch);
        config.set_accept_keywords(&self.accept_keywords)?;
        Ok(config)
    }

    /// Global license configuration
    pub fn license_config(&self) -> LicenseConfig {
        LicenseConfig::new(&self.accept_license)
    }
}
