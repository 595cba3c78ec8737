//! Package set expansion
//!
//! Expands a named set into a [`DepAtom`] tree. Known sets, in lookup order:
//! - `everything`: every package in every repository
//! - `system`: the `*`-prefixed entries of the repository profiles
//! - user sets (`sets/<name>` and `world`), when the environment has them
//! - repository sets (`<repo>/sets/<name>.conf`), in priority order
//!
//! `@name` references inside a set expand into nested groups.

use crate::db::PackageDatabase;
use crate::depspec::{DepAtom, DepTree};
use crate::{Error, Result};
use pkgenv_config::sets::well_known;
use pkgenv_config::{PackageAtom, PackageSet, SetsConfig};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;
use tracing::debug;

fn set_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_+.-]*$").expect("set name pattern is a valid regex")
    })
}

/// Validate a set name, stripping an optional leading `@`
pub fn normalize_set_name(name: &str) -> Result<&str> {
    let name = name.strip_prefix('@').unwrap_or(name);
    if set_name_regex().is_match(name) {
        Ok(name)
    } else {
        Err(Error::SetName(name.to_string()))
    }
}

/// Resolves set names against a package database and optional user sets
#[derive(Debug, Clone, Copy)]
pub struct PackageSetResolver<'a> {
    db: &'a PackageDatabase,
    user_sets: Option<&'a SetsConfig>,
}

impl<'a> PackageSetResolver<'a> {
    pub fn new(db: &'a PackageDatabase, user_sets: Option<&'a SetsConfig>) -> Self {
        Self { db, user_sets }
    }

    /// Expand a set into a fresh tree
    pub fn resolve(&self, name: &str) -> Result<DepAtom> {
        let name = normalize_set_name(name)?;
        let mut stack = Vec::new();
        let tree = self.expand(name, &mut stack)?;
        debug!("Set {} expanded to {} atoms", name, tree.leaves().len());
        Ok(tree)
    }

    /// Names of every set that can be resolved
    pub fn set_names(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = [well_known::EVERYTHING, well_known::SYSTEM]
            .iter()
            .map(|s| s.to_string())
            .collect();
        if let Some(user_sets) = self.user_sets {
            names.extend(user_sets.names().into_iter().map(String::from));
        }
        for repo in self.db.repositories() {
            names.extend(repo.set_names().into_iter().map(String::from));
        }
        names.into_iter().collect()
    }

    fn expand(&self, name: &str, stack: &mut Vec<String>) -> Result<DepAtom> {
        if stack.iter().any(|s| s == name) {
            return Err(Error::SetName(format!(
                "{} (cycle: {} -> {})",
                name,
                stack.join(" -> "),
                name
            )));
        }

        match name {
            well_known::EVERYTHING => Ok(self.everything()),
            well_known::SYSTEM => Ok(self.system()),
            _ => {
                let set = self
                    .find(name)
                    .ok_or_else(|| Error::SetName(name.to_string()))?;

                stack.push(name.to_string());
                let mut children: Vec<DepAtom> =
                    set.atoms.iter().cloned().map(DepTree::Leaf).collect();
                for reference in &set.references {
                    let reference = normalize_set_name(reference)?;
                    children.push(self.expand(reference, stack)?);
                }
                stack.pop();

                Ok(DepTree::All(children))
            }
        }
    }

    fn find(&self, name: &str) -> Option<&'a PackageSet> {
        if let Some(set) = self.user_sets.and_then(|sets| sets.get(name)) {
            return Some(set);
        }
        self.db.repositories().iter().find_map(|repo| repo.set(name))
    }

    fn everything(&self) -> DepAtom {
        let ids: BTreeSet<_> = self
            .db
            .repositories()
            .iter()
            .flat_map(|repo| repo.package_ids())
            .collect();
        DepTree::All(
            ids.into_iter()
                .map(|id| DepTree::Leaf(PackageAtom::new(id.category.as_str(), id.name.as_str())))
                .collect(),
        )
    }

    fn system(&self) -> DepAtom {
        let mut atoms: Vec<PackageAtom> = Vec::new();
        for repo in self.db.repositories() {
            for atom in repo.system_packages() {
                if !atoms.contains(atom) {
                    atoms.push(atom.clone());
                }
            }
        }
        DepTree::All(atoms.into_iter().map(DepTree::Leaf).collect())
    }
}
