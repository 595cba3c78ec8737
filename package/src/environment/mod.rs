//! Package environments
//!
//! An [`Environment`] answers the questions a package manager asks before it
//! considers a package version: which USE flags are on, which keywords and
//! licenses are accepted, why a version is masked, and what a package set
//! contains.
//!
//! Two environments exist:
//! - [`DefaultEnvironment`]: the process-wide environment built from the
//!   ambient configuration, reached through [`DefaultEnvironment::instance`]
//! - [`NoConfigEnvironment`]: an environment over a single repository with
//!   default policy and no user configuration

pub mod default;
pub mod dispatch;
pub mod no_config;

pub use default::DefaultEnvironment;
pub use no_config::NoConfigEnvironment;

use crate::accept::AcceptancePolicy;
use crate::db::PackageDatabase;
use crate::depspec::DepAtom;
use crate::mask::MaskReasons;
use crate::repository::Repository;
use crate::sets::PackageSetResolver;
use crate::types::PackageDatabaseEntry;
use crate::use_flags::UseFlagPolicy;
use crate::{Error, Result};
use pkgenv_config::{MaskConfig, SetsConfig};
use std::fs::DirEntry;
use std::path::{Path, PathBuf};

/// Environment queries
///
/// Implementors provide the policies; the queries themselves are shared.
/// Every query that names a package version fails with
/// [`Error::NoSuchRepository`] when its repository is not registered.
pub trait Environment: Send + Sync {
    /// The repositories visible to this environment
    fn package_database(&self) -> &PackageDatabase;

    /// USE flag states
    fn use_policy(&self) -> &UseFlagPolicy;

    /// Keyword and license accept rules
    fn acceptance_policy(&self) -> &AcceptancePolicy;

    /// User package.mask and package.unmask
    fn user_masks(&self) -> &MaskConfig;

    /// User-defined package sets, if this environment has any
    fn user_sets(&self) -> Option<&SetsConfig> {
        None
    }

    /// Is a USE flag enabled, globally or for a package version
    fn query_use(&self, flag: &str, pde: Option<&PackageDatabaseEntry>) -> Result<bool> {
        self.use_policy().query(flag, pde, self.package_database())
    }

    /// Is a keyword accepted, globally or for a package version
    fn accept_keyword(&self, keyword: &str, pde: Option<&PackageDatabaseEntry>) -> Result<bool> {
        let pkg = self
            .check_repository(pde)?
            .zip(pde)
            .map(|(repo, pde)| repo.package_ref(pde));
        Ok(self.acceptance_policy().accept_keyword(keyword, pkg.as_ref()))
    }

    /// Is a license accepted, globally or for a package version
    fn accept_license(&self, license: &str, pde: Option<&PackageDatabaseEntry>) -> Result<bool> {
        let pkg = self
            .check_repository(pde)?
            .zip(pde)
            .map(|(repo, pde)| repo.package_ref(pde));
        Ok(self.acceptance_policy().accept_license(license, pkg.as_ref()))
    }

    /// Why a package version is masked; empty when it is not
    fn mask_reasons(&self, pde: &PackageDatabaseEntry) -> Result<MaskReasons> {
        crate::mask::mask_reasons(self, pde)
    }

    /// Expand a named package set
    fn package_set(&self, name: &str) -> Result<DepAtom> {
        PackageSetResolver::new(self.package_database(), self.user_sets()).resolve(name)
    }

    /// The entry's repository; [`Error::NoSuchRepository`] if it is unknown
    fn check_repository(&self, pde: Option<&PackageDatabaseEntry>) -> Result<Option<&Repository>> {
        pde.map(|pde| self.package_database().fetch_repository(&pde.repository))
            .transpose()
    }
}

/// The root directory of a repository, for [`NoConfigEnvironment`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRoot(PathBuf);

impl RepositoryRoot {
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Build from an open directory entry, which must be a directory
    pub fn from_dir_entry(entry: &DirEntry) -> Result<Self> {
        let file_type = entry.file_type()?;
        let is_dir = file_type.is_dir() || (file_type.is_symlink() && entry.path().is_dir());
        if !is_dir {
            return Err(Error::Type {
                method: "new".to_string(),
                expected: "directory",
                got: entry.path().display().to_string(),
            });
        }
        Ok(Self(entry.path()))
    }
}

impl From<&str> for RepositoryRoot {
    fn from(path: &str) -> Self {
        Self(PathBuf::from(path))
    }
}

impl From<String> for RepositoryRoot {
    fn from(path: String) -> Self {
        Self(PathBuf::from(path))
    }
}

impl From<&Path> for RepositoryRoot {
    fn from(path: &Path) -> Self {
        Self(path.to_path_buf())
    }
}

impl From<PathBuf> for RepositoryRoot {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl TryFrom<&DirEntry> for RepositoryRoot {
    type Error = Error;

    fn try_from(entry: &DirEntry) -> Result<Self> {
        Self::from_dir_entry(entry)
    }
}
