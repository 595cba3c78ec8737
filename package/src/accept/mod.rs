//! Keyword and license acceptance

use pkgenv_config::{Keyword, KeywordConfig, LicenseConfig, PackageRef};
use tracing::debug;

/// Configured accept rules for keywords and licenses
#[derive(Debug, Clone)]
pub struct AcceptancePolicy {
    keywords: KeywordConfig,
    licenses: LicenseConfig,
}

impl AcceptancePolicy {
    pub fn new(keywords: KeywordConfig, licenses: LicenseConfig) -> Self {
        Self { keywords, licenses }
    }

    /// Accept the stable keyword of `arch` and every license
    pub fn for_arch(arch: &str) -> Self {
        Self::new(KeywordConfig::new(arch), LicenseConfig::accept_all())
    }

    pub fn keywords(&self) -> &KeywordConfig {
        &self.keywords
    }

    pub fn licenses(&self) -> &LicenseConfig {
        &self.licenses
    }

    /// Check a keyword, globally or for a package version
    ///
    /// Malformed keywords are never accepted.
    pub fn accept_keyword(&self, keyword: &str, pkg: Option<&PackageRef<'_>>) -> bool {
        let keyword = match Keyword::parse(keyword) {
            Ok(keyword) => keyword,
            Err(e) => {
                debug!("Rejecting keyword: {}", e);
                return false;
            }
        };

        let accepted = self.keywords.accepts_globally(&keyword)
            || pkg
                .map(|pkg| self.keywords.accepts_for(&keyword, pkg))
                .unwrap_or(false);

        debug!(
            "Keyword {} {}: {}",
            keyword,
            pkg.map(|p| format!("{}/{}-{}", p.category, p.name, p.version))
                .unwrap_or_default(),
            accepted
        );
        accepted
    }

    /// Check a license, globally or for a package version
    pub fn accept_license(&self, license: &str, pkg: Option<&PackageRef<'_>>) -> bool {
        match pkg {
            Some(pkg) => self.licenses.is_accepted_for(license, pkg),
            None => self.licenses.is_accepted(license),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PackageDatabaseEntry;
    use pkgenv_config::PackageAtom;

    fn pde(s: &str) -> PackageDatabaseEntry {
        PackageDatabaseEntry::parse(s).unwrap()
    }

    fn policy() -> AcceptancePolicy {
        let mut keywords = KeywordConfig::new("test");
        keywords.add_package_keywords(PackageAtom::new("foo", "bar"), vec![Keyword::testing("test")]);

        let mut licenses = LicenseConfig::new("* -EVIL");
        licenses.add_package_license(PackageAtom::new("foo", "bar"), vec!["EVIL".to_string()]);

        AcceptancePolicy::new(keywords, licenses)
    }

    #[test]
    fn test_keywords() {
        let policy = policy();
        assert!(policy.accept_keyword("test", None));
        assert!(!policy.accept_keyword("bad", None));
        assert!(!policy.accept_keyword("~test", None));
        assert!(!policy.accept_keyword("~", None));

        let bar = pde("foo/bar-1.0::testrepo");
        let baz = pde("foo/baz-1.0::testrepo");
        assert!(policy.accept_keyword("~test", Some(&bar.as_package_ref())));
        assert!(!policy.accept_keyword("~test", Some(&baz.as_package_ref())));
        assert!(policy.accept_keyword("test", Some(&baz.as_package_ref())));
    }

    #[test]
    fn test_slot_keywords() {
        let mut keywords = KeywordConfig::new("test");
        keywords.add_package_keywords("foo/bar:2".parse().unwrap(), vec![Keyword::testing("test")]);
        let policy = AcceptancePolicy::new(keywords, LicenseConfig::accept_all());

        let two = pde("foo/bar-2.0::testrepo");
        let slotted = |slot| PackageRef {
            slot: Some(slot),
            ..two.as_package_ref()
        };
        assert!(policy.accept_keyword("~test", Some(&slotted("2"))));
        assert!(!policy.accept_keyword("~test", Some(&slotted("1"))));
        assert!(!policy.accept_keyword("~test", Some(&two.as_package_ref())));
    }

    #[test]
    fn test_licenses() {
        let policy = policy();
        assert!(policy.accept_license("MIT", None));
        assert!(!policy.accept_license("EVIL", None));
        let bar = pde("foo/bar-1.0::testrepo");
        let baz = pde("foo/baz-1.0::testrepo");
        assert!(policy.accept_license("EVIL", Some(&bar.as_package_ref())));
        assert!(!policy.accept_license("EVIL", Some(&baz.as_package_ref())));
    }

    #[test]
    fn test_for_arch() {
        let policy = AcceptancePolicy::for_arch("test");
        assert!(policy.accept_keyword("test", None));
        assert!(!policy.accept_keyword("~test", None));
        assert!(policy.accept_license("ANYTHING", None));
    }
}
