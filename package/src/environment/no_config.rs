//! An environment over one repository with no user configuration

use super::{Environment, RepositoryRoot};
use crate::accept::AcceptancePolicy;
use crate::db::PackageDatabase;
use crate::error::json_type_name;
use crate::repository::Repository;
use crate::use_flags::UseFlagPolicy;
use crate::{Error, Result};
use pkgenv_config::{detect_arch, MaskConfig};
use std::path::Path;
use tracing::info;

/// Environment with default policy over a single repository
///
/// USE flags are disabled unless the repository profile forces them, the
/// accepted keyword is the profile ARCH (or the host architecture) and every
/// license is accepted.
#[derive(Debug)]
pub struct NoConfigEnvironment {
    root: RepositoryRoot,
    db: PackageDatabase,
    use_policy: UseFlagPolicy,
    acceptance: AcceptancePolicy,
    masks: MaskConfig,
}

impl NoConfigEnvironment {
    /// Read the repository at `root`
    pub fn new(root: impl Into<RepositoryRoot>) -> Result<Self> {
        let root = root.into();
        let repo = Repository::load(root.path())?;
        let arch = repo
            .arch()
            .map(String::from)
            .unwrap_or_else(|| detect_arch().to_string());

        info!(
            "No-config environment for repository {} at {} (arch {})",
            repo.name(),
            root.path().display(),
            arch
        );

        Ok(Self {
            db: PackageDatabase::builder().add_repository(repo)?.build(),
            use_policy: UseFlagPolicy::disabled(),
            acceptance: AcceptancePolicy::for_arch(&arch),
            masks: MaskConfig::new(),
            root,
        })
    }

    /// Build from a dynamic argument, which must be a path string
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::String(path) => Self::new(path.as_str()),
            other => Err(Error::Type {
                method: "new".to_string(),
                expected: "string",
                got: json_type_name(other).to_string(),
            }),
        }
    }

    /// The repository root this environment was built from
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// The single repository
    pub fn repository(&self) -> Option<&Repository> {
        self.db.favourite_repository()
    }
}

impl Environment for NoConfigEnvironment {
    fn package_database(&self) -> &PackageDatabase {
        &self.db
    }

    fn use_policy(&self) -> &UseFlagPolicy {
        &self.use_policy
    }

    fn acceptance_policy(&self) -> &AcceptancePolicy {
        &self.acceptance
    }

    fn user_masks(&self) -> &MaskConfig {
        &self.masks
    }
}
