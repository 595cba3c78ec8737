//! Core type definitions for environment queries

use crate::{Error, Result};
use pkgenv_config::atom::split_name_version;
use pkgenv_config::PackageRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use pkgenv_config::VersionSpec;

/// Package identifier with category and name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PackageId {
    pub category: String,
    pub name: String,
}

impl PackageId {
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.category, self.name)
    }

    /// Parse a package identifier from string (e.g., "sys-apps/systemd")
    pub fn parse(s: &str) -> Option<Self> {
        match s.split_once('/') {
            Some((category, name))
                if !category.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Some(Self::new(category, name))
            }
            _ => None,
        }
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.name)
    }
}

/// A concrete package version in a named repository
///
/// Written as `category/name-version::repository`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "EntryFields", into = "EntryFields")]
pub struct PackageDatabaseEntry {
    pub id: PackageId,
    pub version: VersionSpec,
    pub repository: String,
}

impl PackageDatabaseEntry {
    pub fn new(id: PackageId, version: VersionSpec, repository: impl Into<String>) -> Self {
        Self {
            id,
            version,
            repository: repository.into(),
        }
    }

    /// Parse `category/name-version::repository`
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let (cpv, repository) = s
            .rsplit_once("::")
            .ok_or_else(|| Error::InvalidPackageSpec(format!("missing ::repository: {}", s)))?;
        if repository.is_empty() {
            return Err(Error::InvalidPackageSpec(format!("empty repository: {}", s)));
        }

        let (category, name_version) = cpv
            .split_once('/')
            .ok_or_else(|| Error::InvalidPackageSpec(format!("missing category: {}", s)))?;
        let (name, version) = split_name_version(name_version)
            .ok_or_else(|| Error::InvalidPackageSpec(format!("missing version: {}", s)))?;
        let id = PackageId::parse(&format!("{}/{}", category, name))
            .ok_or_else(|| Error::InvalidPackageSpec(s.to_string()))?;
        let version =
            VersionSpec::parse(version).map_err(|_| Error::InvalidVersion(version.to_string()))?;

        Ok(Self::new(id, version, repository))
    }

    pub fn category(&self) -> &str {
        &self.id.category
    }

    pub fn name(&self) -> &str {
        &self.id.name
    }

    /// Borrowed view used for atom matching
    ///
    /// The slot lives in repository metadata, so it is unknown here; use
    /// `Repository::package_ref` to match slot atoms.
    pub fn as_package_ref(&self) -> PackageRef<'_> {
        PackageRef {
            category: &self.id.category,
            name: &self.id.name,
            version: &self.version,
            slot: None,
            repository: Some(&self.repository),
        }
    }
}

impl fmt::Display for PackageDatabaseEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}::{}", self.id, self.version, self.repository)
    }
}

impl FromStr for PackageDatabaseEntry {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Serialized form: `{"name": "cat/pkg", "version": "1.0", "repository": "repo"}`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryFields {
    name: String,
    version: String,
    repository: String,
}

impl TryFrom<EntryFields> for PackageDatabaseEntry {
    type Error = Error;

    fn try_from(fields: EntryFields) -> Result<Self> {
        let id = PackageId::parse(&fields.name)
            .ok_or_else(|| Error::InvalidPackageSpec(fields.name.clone()))?;
        let version = VersionSpec::parse(&fields.version)
            .map_err(|_| Error::InvalidVersion(fields.version.clone()))?;
        Ok(Self::new(id, version, fields.repository))
    }
}

impl From<PackageDatabaseEntry> for EntryFields {
    fn from(entry: PackageDatabaseEntry) -> Self {
        Self {
            name: entry.id.full_name(),
            version: entry.version.to_string(),
            repository: entry.repository,
        }
    }
}
