//! USE flag configuration
//!
//! Implements USE flag handling:
//! - Global USE flags (`use = "..."` in make.conf, `-flag` disables, `-*` resets)
//! - Per-package USE flags (package.use)

use crate::atom::PackageRef;
use crate::PackageAtom;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Complete USE flag configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UseConfig {
    /// Global USE flag states, in the order they were set
    pub global: IndexMap<String, bool>,
    /// Per-package USE flags (from package.use), in file order
    pub package: Vec<PackageUseEntry>,
}

impl UseConfig {
    /// Create a new empty USE configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a USE string such as "X wayland -gtk"
    pub fn set_use(&mut self, s: &str) {
        for flag in Self::parse_use_string(s) {
            if flag.name == "*" && !flag.enabled {
                self.global.clear();
                continue;
            }
            self.global.insert(flag.name, flag.enabled);
        }
    }

    /// Explicit global state of a flag, if any
    pub fn global_state(&self, flag: &str) -> Option<bool> {
        self.global.get(flag).copied()
    }

    /// Add a per-package USE flag entry
    pub fn add_package_use(&mut self, atom: PackageAtom, flags: Vec<UseFlag>) {
        self.package.push(PackageUseEntry { atom, flags });
    }

    /// State of a flag from per-package entries matching `pkg`
    ///
    /// `wildcard` selects which entries are consulted: entries naming the exact
    /// package (`false`) or wildcard entries such as `cat/*` (`true`). The last
    /// matching entry wins.
    pub fn package_state(&self, flag: &str, pkg: &PackageRef<'_>, wildcard: bool) -> Option<bool> {
        self.package
            .iter()
            .filter(|entry| entry.atom.is_wildcard() == wildcard && entry.atom.matches(pkg))
            .flat_map(|entry| entry.flags.iter())
            .filter(|f| f.name == flag)
            .last()
            .map(|f| f.enabled)
    }

    /// Parse a USE string (e.g., "X wayland -gtk systemd")
    pub fn parse_use_string(s: &str) -> Vec<UseFlag> {
        s.split_whitespace().map(UseFlag::parse).collect()
    }
}

/// A single USE flag with enable/disable state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseFlag {
    /// The flag name
    pub name: String,
    /// Whether the flag is enabled
    pub enabled: bool,
}

impl UseFlag {
    /// Create a new enabled USE flag
    pub fn enabled(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
        }
    }

    /// Create a new disabled USE flag
    pub fn disabled(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: false,
        }
    }

    /// Parse a USE flag string (e.g., "-gtk" or "systemd")
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        match s.strip_prefix('-') {
            Some(name) => Self::disabled(name),
            None => Self::enabled(s.strip_prefix('+').unwrap_or(s)),
        }
    }
}

impl std::fmt::Display for UseFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.enabled {
            write!(f, "-")?;
        }
        write!(f, "{}", self.name)
    }
}

/// Per-package USE flag entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageUseEntry {
    /// The package atom
    pub atom: PackageAtom,
    /// USE flags for this package
    pub flags: Vec<UseFlag>,
}
