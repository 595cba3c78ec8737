//! Package database
//!
//! An ordered registry of repositories keyed by name. Registration order is
//! priority order: the first repository is the favourite and wins lookups.

use crate::repository::Repository;
use crate::types::PackageDatabaseEntry;
use crate::{Error, Result};
use pkgenv_config::PackageAtom;
use tracing::debug;

/// Registry of repositories
#[derive(Debug, Clone, Default)]
pub struct PackageDatabase {
    repositories: Vec<Repository>,
}

impl PackageDatabase {
    /// Start building a database
    pub fn builder() -> PackageDatabaseBuilder {
        PackageDatabaseBuilder::default()
    }

    /// Look up a repository by name
    pub fn fetch_repository(&self, name: &str) -> Result<&Repository> {
        self.repositories
            .iter()
            .find(|repo| repo.name() == name)
            .ok_or_else(|| Error::NoSuchRepository(name.to_string()))
    }

    /// Check if a repository is registered
    pub fn has_repository(&self, name: &str) -> bool {
        self.repositories.iter().any(|repo| repo.name() == name)
    }

    /// Repositories in priority order
    pub fn repositories(&self) -> &[Repository] {
        &self.repositories
    }

    /// Repository names in priority order
    pub fn repository_names(&self) -> Vec<&str> {
        self.repositories.iter().map(|repo| repo.name()).collect()
    }

    /// The highest priority repository
    pub fn favourite_repository(&self) -> Option<&Repository> {
        self.repositories.first()
    }

    /// All package versions matching an atom, in repository priority order
    pub fn query(&self, atom: &PackageAtom) -> Vec<PackageDatabaseEntry> {
        let results: Vec<_> = self
            .repositories
            .iter()
            .flat_map(|repo| repo.query(atom))
            .collect();
        debug!("Query {} matched {} entries", atom, results.len());
        results
    }
}

/// Builder for [`PackageDatabase`]
#[derive(Debug, Default)]
pub struct PackageDatabaseBuilder {
    repositories: Vec<Repository>,
}

impl PackageDatabaseBuilder {
    /// Register a repository with lower priority than those already added
    pub fn add_repository(mut self, repository: Repository) -> Result<Self> {
        if self.repositories.iter().any(|r| r.name() == repository.name()) {
            return Err(Error::DuplicateRepository(repository.name().to_string()));
        }
        self.repositories.push(repository);
        Ok(self)
    }

    pub fn build(self) -> PackageDatabase {
        PackageDatabase {
            repositories: self.repositories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn repo(name: &str, cpv: &str) -> Repository {
        Repository::builder(name)
            .package(cpv, "test", "")
            .unwrap()
            .build()
    }

    #[test]
    fn test_fetch_repository() {
        let db = PackageDatabase::builder()
            .add_repository(repo("first", "foo/bar-1.0"))
            .unwrap()
            .add_repository(repo("second", "foo/bar-2.0"))
            .unwrap()
            .build();

        assert_eq!(db.fetch_repository("second").unwrap().name(), "second");
        assert!(db.has_repository("first"));
        assert!(!db.has_repository("third"));
        assert_matches!(db.fetch_repository("third"), Err(Error::NoSuchRepository(name)) if name == "third");
        assert_eq!(db.repository_names(), vec!["first", "second"]);
        assert_eq!(db.favourite_repository().unwrap().name(), "first");
    }

    #[test]
    fn test_duplicate_repository() {
        let result = PackageDatabase::builder()
            .add_repository(repo("dup", "foo/bar-1.0"))
            .unwrap()
            .add_repository(repo("dup", "foo/bar-2.0"));
        assert_matches!(result, Err(Error::DuplicateRepository(_)));
    }

    #[test]
    fn test_query_in_priority_order() {
        let db = PackageDatabase::builder()
            .add_repository(repo("overlay", "foo/bar-2.0"))
            .unwrap()
            .add_repository(repo("main", "foo/bar-1.0"))
            .unwrap()
            .build();

        let found: Vec<String> = db
            .query(&"foo/bar".parse().unwrap())
            .iter()
            .map(|pde| pde.to_string())
            .collect();
        assert_eq!(found, vec!["foo/bar-2.0::overlay", "foo/bar-1.0::main"]);
    }

    #[test]
    fn test_empty_database() {
        let db = PackageDatabase::default();
        assert!(db.favourite_repository().is_none());
        assert!(db.query(&"*/*".parse().unwrap()).is_empty());
    }
}
