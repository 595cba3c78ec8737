//! Package sets configuration
//!
//! User-defined package sets: one file per set under `sets/`, plus the
//! `world` file. Each line is an atom or a `@set` reference.

use crate::portage::config_dir_files;
use crate::{PackageAtom, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Well-known set names
pub mod well_known {
    /// The world set - user-selected packages
    pub const WORLD: &str = "world";
    /// The system set - core system packages from the profile
    pub const SYSTEM: &str = "system";
    /// Every package in every repository
    pub const EVERYTHING: &str = "everything";
}

/// Package sets configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetsConfig {
    /// Available package sets, by name
    pub sets: IndexMap<String, PackageSet>,
}

impl SetsConfig {
    /// Create a new sets configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a set by name
    pub fn get(&self, name: &str) -> Option<&PackageSet> {
        let name = name.strip_prefix('@').unwrap_or(name);
        self.sets.get(name)
    }

    /// Check if a set exists
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Insert a set, replacing any set of the same name
    pub fn insert(&mut self, set: PackageSet) {
        self.sets.insert(set.name.clone(), set);
    }

    /// List all set names
    pub fn names(&self) -> Vec<&str> {
        self.sets.keys().map(|s| s.as_str()).collect()
    }

    /// Load sets from a directory; the file name (minus `.conf`) is the set name
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let mut config = Self::new();

        if !dir.is_dir() {
            return Ok(config);
        }

        for path in config_dir_files(dir)? {
            let Some(file_name) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };

            let name = file_name.strip_suffix(".conf").unwrap_or(file_name);
            let content = std::fs::read_to_string(&path)?;
            config.insert(PackageSet::parse(name, &content));
        }

        Ok(config)
    }
}

/// A package set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSet {
    /// Set name
    pub name: String,
    /// Packages in this set, in file order
    pub atoms: Vec<PackageAtom>,
    /// References to other sets, in file order
    pub references: Vec<String>,
}

impl PackageSet {
    /// Create a new empty set
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            atoms: Vec::new(),
            references: Vec::new(),
        }
    }

    /// Add an atom to the set
    pub fn add(&mut self, atom: PackageAtom) {
        if !self.atoms.contains(&atom) {
            self.atoms.push(atom);
        }
    }

    /// Check if the set directly contains a package
    pub fn contains(&self, category: &str, name: &str) -> bool {
        self.atoms.iter().any(|atom| atom.matches_cpn(category, name))
    }

    /// Parse a set file
    pub fn parse(name: &str, content: &str) -> Self {
        let mut set = Self::new(name);

        for line in content.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(reference) = line.strip_prefix('@') {
                set.references.push(reference.to_string());
                continue;
            }

            match line.parse::<PackageAtom>() {
                Ok(atom) => set.add(atom),
                Err(e) => warn!("Skipping invalid entry '{}' in set {}: {}", line, name, e),
            }
        }

        set
    }

    /// Number of atoms in the set
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    /// Check if set is empty
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty() && self.references.is_empty()
    }
}
