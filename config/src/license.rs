//! License acceptance configuration
//!
//! Implements ACCEPT_LICENSE handling:
//! - `*` accepts everything, `-*` rejects everything
//! - `NAME` / `-NAME` accept or reject a single license
//! - `@GROUP` / `-@GROUP` accept or reject a license group
//! - Per-package license acceptance (package.license)
//!
//! Rules are evaluated left to right and the last matching rule wins, so
//! `* -GPL-3` accepts everything except GPL-3.

use crate::atom::PackageRef;
use crate::PackageAtom;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// License configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseConfig {
    /// Global ACCEPT_LICENSE rules
    pub accept_license: Vec<String>,
    /// Per-package license acceptance
    pub package: Vec<PackageLicenseEntry>,
    /// License groups available to `@GROUP` rules
    pub groups: LicenseGroups,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self::accept_all()
    }
}

impl LicenseConfig {
    /// Create a license configuration from an ACCEPT_LICENSE string
    pub fn new(accept_license: &str) -> Self {
        Self {
            accept_license: Self::parse_license_string(accept_license),
            package: Vec::new(),
            groups: LicenseGroups::default(),
        }
    }

    /// Accept all licenses
    pub fn accept_all() -> Self {
        Self::new("*")
    }

    /// Accept free licenses only
    pub fn accept_free() -> Self {
        Self::new("@FREE")
    }

    /// Add per-package license rules
    pub fn add_package_license(&mut self, atom: PackageAtom, licenses: Vec<String>) {
        self.package.push(PackageLicenseEntry { atom, licenses });
    }

    /// Evaluate the global rules for a license
    pub fn is_accepted(&self, license: &str) -> bool {
        self.evaluate(&self.accept_license, license).unwrap_or(false)
    }

    /// Evaluate the per-package rules matching `pkg`
    ///
    /// Returns `Some(false)` if any matching entry explicitly rejects the
    /// license, `Some(true)` if one accepts it, and `None` if no entry has an
    /// opinion.
    pub fn package_decision(&self, license: &str, pkg: &PackageRef<'_>) -> Option<bool> {
        let mut decision = None;
        for entry in self.package.iter().filter(|e| e.atom.matches(pkg)) {
            match self.evaluate(&entry.licenses, license) {
                Some(false) => return Some(false),
                Some(true) => decision = Some(true),
                None => {}
            }
        }
        decision
    }

    /// Check if a license is accepted for a specific package
    pub fn is_accepted_for(&self, license: &str, pkg: &PackageRef<'_>) -> bool {
        self.package_decision(license, pkg)
            .unwrap_or_else(|| self.is_accepted(license))
    }

    /// Evaluate a rule list; the last matching rule wins
    pub fn evaluate(&self, rules: &[String], license: &str) -> Option<bool> {
        let mut result = None;
        for rule in rules {
            let (accept, pattern) = match rule.strip_prefix('-') {
                Some(rest) => (false, rest),
                None => (true, rule.as_str()),
            };

            let matched = if pattern == "*" {
                true
            } else if let Some(group) = pattern.strip_prefix('@') {
                self.groups.contains(group, license)
            } else {
                pattern == license
            };

            if matched {
                result = Some(accept);
            }
        }
        result
    }

    /// Parse an ACCEPT_LICENSE string
    pub fn parse_license_string(s: &str) -> Vec<String> {
        s.split_whitespace().map(|s| s.to_string()).collect()
    }
}

/// Per-package license entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageLicenseEntry {
    /// The package atom
    pub atom: PackageAtom,
    /// License rules for this package
    pub licenses: Vec<String>,
}

/// Named license groups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseGroups {
    groups: HashMap<String, HashSet<String>>,
}

impl LicenseGroups {
    /// Check whether `license` belongs to `group` (case-insensitive group name)
    pub fn contains(&self, group: &str, license: &str) -> bool {
        self.groups
            .get(&group.to_uppercase())
            .map(|members| members.contains(license))
            .unwrap_or(false)
    }

    /// Define or replace a group
    pub fn insert(&mut self, group: &str, licenses: impl IntoIterator<Item = String>) {
        self.groups
            .insert(group.to_uppercase(), licenses.into_iter().collect());
    }

    /// Names of all known groups
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.groups.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for LicenseGroups {
    fn default() -> Self {
        let mut groups = Self {
            groups: HashMap::new(),
        };

        let free_software = [
            "GPL-2", "GPL-2+", "GPL-3", "GPL-3+", "LGPL-2", "LGPL-2.1", "LGPL-2.1+", "LGPL-3",
            "AGPL-3", "Apache-2.0", "BSD", "BSD-2", "BSD-3", "MIT", "ISC", "MPL-2.0",
            "Artistic-2", "Zlib", "WTFPL", "Unlicense", "CC0-1.0", "public-domain", "HPND",
            "PSF-2", "Ruby", "PHP-3.01",
        ];
        let free_documents = ["FDL-1.2", "FDL-1.3", "CC-BY-4.0", "CC-BY-SA-4.0", "OFL-1.1"];
        let osi_approved = [
            "MIT", "Apache-2.0", "GPL-2", "GPL-3", "LGPL-2.1", "LGPL-3", "BSD-2", "BSD-3",
            "MPL-2.0", "ISC", "Artistic-2", "Zlib", "EPL-1.0", "EPL-2.0", "CDDL",
        ];
        let copyleft = [
            "GPL-2", "GPL-2+", "GPL-3", "GPL-3+", "LGPL-2", "LGPL-2.1", "LGPL-3", "AGPL-3",
            "MPL-2.0",
        ];
        let gpl_compatible = [
            "MIT", "BSD", "BSD-2", "BSD-3", "ISC", "LGPL-2", "LGPL-2.1", "Apache-2.0", "MPL-2.0",
            "Zlib", "public-domain",
        ];

        fn owned(list: &[&str]) -> Vec<String> {
            list.iter().map(|s| s.to_string()).collect()
        }

        groups.insert("FREE-SOFTWARE", owned(&free_software));
        groups.insert("FSF-APPROVED", owned(&free_software));
        groups.insert("FREE-DOCUMENTS", owned(&free_documents));
        groups.insert(
            "FREE",
            owned(&free_software).into_iter().chain(owned(&free_documents)),
        );
        groups.insert("OSI-APPROVED", owned(&osi_approved));
        groups.insert("COPYLEFT", owned(&copyleft));
        groups.insert("GPL-COMPATIBLE", owned(&gpl_compatible));
        groups.insert(
            "BINARY-REDISTRIBUTABLE",
            owned(&free_software).into_iter().chain(owned(&free_documents)),
        );

        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VersionSpec;

    #[test]
    fn test_default_accepts_all() {
        let config = LicenseConfig::default();
        assert!(config.is_accepted("MIT"));
        assert!(config.is_accepted("SOME-PROPRIETARY-LICENSE"));
    }

    #[test]
    fn test_negation_and_groups() {
        let config = LicenseConfig::new("* -GPL-3");
        assert!(config.is_accepted("MIT"));
        assert!(!config.is_accepted("GPL-3"));

        let config = LicenseConfig::new("@FREE -@COPYLEFT");
        assert!(config.is_accepted("MIT"));
        assert!(!config.is_accepted("GPL-2"));
        assert!(!config.is_accepted("NVIDIA"));

        let config = LicenseConfig::new("-* MIT");
        assert!(config.is_accepted("MIT"));
        assert!(!config.is_accepted("BSD"));
    }

    #[test]
    fn test_group_names_are_case_insensitive() {
        let groups = LicenseGroups::default();
        assert!(groups.contains("free", "MIT"));
        assert!(groups.contains("OSI-APPROVED", "Apache-2.0"));
        assert!(!groups.contains("NO-SUCH-GROUP", "MIT"));
        assert!(groups.names().contains(&"COPYLEFT"));
    }

    #[test]
    fn test_per_package_license() {
        let mut config = LicenseConfig::accept_free();
        config.add_package_license(
            PackageAtom::new("x11-drivers", "nvidia-drivers"),
            vec!["NVIDIA".to_string()],
        );
        config.add_package_license(PackageAtom::new("app-misc", "strict"), vec!["-MIT".to_string()]);

        let version = VersionSpec::parse("1.0").unwrap();
        let nvidia = PackageRef {
            category: "x11-drivers",
            name: "nvidia-drivers",
            version: &version,
            slot: None,
            repository: None,
        };
        let strict = PackageRef {
            category: "app-misc",
            name: "strict",
            ..nvidia
        };
        let other = PackageRef {
            category: "app-misc",
            name: "other",
            ..nvidia
        };

        assert!(config.is_accepted_for("NVIDIA", &nvidia));
        assert!(!config.is_accepted_for("NVIDIA", &other));
        assert!(!config.is_accepted_for("MIT", &strict));
        assert!(config.is_accepted_for("MIT", &other));
    }
}
