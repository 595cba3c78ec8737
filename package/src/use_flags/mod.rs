//! USE flag resolution
//!
//! Resolution order for a flag, first answer wins:
//! 1. repository profile `use.mask` (disabled) and `use.force` (enabled),
//!    only when a package is given
//! 2. package.use entries naming the exact package
//! 3. wildcard package.use entries (`cat/*`, `*/*`) matching the package
//! 4. the global USE setting
//! 5. disabled

use crate::db::PackageDatabase;
use crate::types::PackageDatabaseEntry;
use crate::Result;
use pkgenv_config::UseConfig;
use tracing::debug;

/// Configured USE flag states
#[derive(Debug, Clone, Default)]
pub struct UseFlagPolicy {
    config: UseConfig,
}

impl UseFlagPolicy {
    pub fn new(config: UseConfig) -> Self {
        Self { config }
    }

    /// A policy with every flag disabled apart from profile forces
    pub fn disabled() -> Self {
        Self::default()
    }

    /// The underlying configuration
    pub fn config(&self) -> &UseConfig {
        &self.config
    }

    /// Resolve a flag, optionally for a package version
    pub fn query(
        &self,
        flag: &str,
        pde: Option<&PackageDatabaseEntry>,
        db: &PackageDatabase,
    ) -> Result<bool> {
        let Some(pde) = pde else {
            return Ok(self.config.global_state(flag).unwrap_or(false));
        };

        let repo = db.fetch_repository(&pde.repository)?;
        if repo.is_use_masked(flag) {
            debug!("USE {} masked by profile of {} for {}", flag, repo.name(), pde);
            return Ok(false);
        }
        if repo.is_use_forced(flag) {
            debug!("USE {} forced by profile of {} for {}", flag, repo.name(), pde);
            return Ok(true);
        }

        let pkg = repo.package_ref(pde);
        let state = self
            .config
            .package_state(flag, &pkg, false)
            .or_else(|| self.config.package_state(flag, &pkg, true))
            .or_else(|| self.config.global_state(flag))
            .unwrap_or(false);

        debug!("USE {} for {}: {}", flag, pde, state);
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Repository;
    use crate::Error;
    use pkgenv_config::{PackageAtom, UseFlag};

    fn database() -> PackageDatabase {
        let repo = Repository::builder("testrepo")
            .package("foo/bar-1.0", "test", "")
            .unwrap()
            .use_mask("masked")
            .use_force("forced")
            .use_mask("both")
            .use_force("both")
            .build();
        PackageDatabase::builder()
            .add_repository(repo)
            .unwrap()
            .build()
    }

    fn policy() -> UseFlagPolicy {
        let mut config = UseConfig::new();
        config.set_use("enabled masked -off");
        config.add_package_use(
            PackageAtom::new("foo", "bar"),
            vec![UseFlag::enabled("sometimes_enabled"), UseFlag::enabled("off")],
        );
        config.add_package_use("foo/*".parse().unwrap(), vec![UseFlag::enabled("wild"), UseFlag::disabled("off")]);
        UseFlagPolicy::new(config)
    }

    fn pde() -> PackageDatabaseEntry {
        PackageDatabaseEntry::parse("foo/bar-1.0::testrepo").unwrap()
    }

    #[test]
    fn test_global() {
        let db = database();
        let policy = policy();
        assert!(policy.query("enabled", None, &db).unwrap());
        assert!(!policy.query("not_enabled", None, &db).unwrap());
        assert!(!policy.query("sometimes_enabled", None, &db).unwrap());
        assert!(!policy.query("forced", None, &db).unwrap());
    }

    #[test]
    fn test_package_overrides() {
        let db = database();
        let policy = policy();
        let pde = pde();
        assert!(policy.query("sometimes_enabled", Some(&pde), &db).unwrap());
        assert!(policy.query("wild", Some(&pde), &db).unwrap());
        // exact entries win over wildcard entries
        assert!(policy.query("off", Some(&pde), &db).unwrap());
    }

    #[test]
    fn test_slot_entries() {
        let db = database();
        let mut config = UseConfig::new();
        config.add_package_use("foo/bar:0".parse().unwrap(), vec![UseFlag::enabled("slot_zero")]);
        config.add_package_use("foo/bar:1".parse().unwrap(), vec![UseFlag::enabled("slot_one")]);
        let policy = UseFlagPolicy::new(config);

        assert!(policy.query("slot_zero", Some(&pde()), &db).unwrap());
        assert!(!policy.query("slot_one", Some(&pde()), &db).unwrap());
    }

    #[test]
    fn test_profile_mask_and_force() {
        let db = database();
        let policy = policy();
        let pde = pde();
        assert!(!policy.query("masked", Some(&pde), &db).unwrap());
        assert!(policy.query("forced", Some(&pde), &db).unwrap());
        assert!(!policy.query("both", Some(&pde), &db).unwrap());
    }

    #[test]
    fn test_unknown_repository() {
        let db = database();
        let pde = PackageDatabaseEntry::parse("foo/bar-1.0::nosuchrepo").unwrap();
        assert!(matches!(
            UseFlagPolicy::disabled().query("x", Some(&pde), &db),
            Err(Error::NoSuchRepository(_))
        ));
    }
}
