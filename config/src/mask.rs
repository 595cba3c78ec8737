//! Package masking and unmasking configuration
//!
//! Implements package.mask and package.unmask files. The same file format is
//! used by repository profiles, so the parser is shared.

use crate::atom::PackageRef;
use crate::PackageAtom;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Package masking configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaskConfig {
    /// Masked packages (package.mask)
    pub masked: Vec<MaskEntry>,
    /// Unmasked packages (package.unmask)
    pub unmasked: Vec<MaskEntry>,
}

impl MaskConfig {
    /// Create a new mask configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a package mask
    pub fn add_mask(&mut self, atom: PackageAtom, reason: Option<String>) {
        self.masked.push(MaskEntry::new(atom, reason));
    }

    /// Add a package unmask
    pub fn add_unmask(&mut self, atom: PackageAtom, reason: Option<String>) {
        self.unmasked.push(MaskEntry::new(atom, reason));
    }

    /// First package.mask entry matching `pkg`
    pub fn find_mask(&self, pkg: &PackageRef<'_>) -> Option<&MaskEntry> {
        self.masked.iter().find(|entry| entry.atom.matches(pkg))
    }

    /// Check if package.unmask lifts masks for `pkg`
    pub fn is_unmasked(&self, pkg: &PackageRef<'_>) -> bool {
        self.unmasked.iter().any(|entry| entry.atom.matches(pkg))
    }
}

/// A mask or unmask entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskEntry {
    /// Package atom
    pub atom: PackageAtom,
    /// Reason for masking (from the comment block above the entry)
    pub reason: Option<String>,
    /// Who added this mask (a comment line with an email address)
    pub author: Option<String>,
}

impl MaskEntry {
    pub fn new(atom: PackageAtom, reason: Option<String>) -> Self {
        Self {
            atom,
            reason,
            author: None,
        }
    }
}

/// Parse package.mask / package.unmask content
///
/// Comment lines directly above a block of atoms become the reason for every
/// atom in that block; a blank line ends the block.
pub fn parse_mask_file(content: &str) -> Vec<MaskEntry> {
    let mut entries = Vec::new();
    let mut reason = String::new();
    let mut author = None;

    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() {
            reason.clear();
            author = None;
            continue;
        }

        if let Some(comment) = line.strip_prefix('#') {
            let comment = comment.trim();
            if comment.contains('<') && comment.contains('@') {
                author = Some(comment.to_string());
            } else if !comment.is_empty() {
                if !reason.is_empty() {
                    reason.push(' ');
                }
                reason.push_str(comment);
            }
            continue;
        }

        match PackageAtom::parse_restriction(line) {
            Ok(atom) => entries.push(MaskEntry {
                atom,
                reason: (!reason.is_empty()).then(|| reason.clone()),
                author: author.clone(),
            }),
            Err(e) => warn!("Skipping invalid mask entry '{}': {}", line, e),
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VersionSpec;

    #[test]
    fn test_parse_mask_file() {
        let content = r#"
# Jane Dev <jane@example.org> (2024-01-01)
# Breaks the world.
# Removal in 30 days.
>=foo/bar-2
foo/baz

not-an-atom
foo/qux
"#;
        let entries = parse_mask_file(content);
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries[0].reason.as_deref(),
            Some("Breaks the world. Removal in 30 days.")
        );
        assert!(entries[0].author.as_deref().unwrap().contains("jane@example.org"));
        assert_eq!(entries[1].reason, entries[0].reason);
        assert_eq!(entries[2].reason, None);
    }

    #[test]
    fn test_mask_and_unmask() {
        let mut config = MaskConfig::new();
        config.add_mask(">=foo/bar-2".parse().unwrap(), None);
        config.add_unmask("=foo/bar-3".parse().unwrap(), None);

        let two = VersionSpec::parse("2.0").unwrap();
        let three = VersionSpec::parse("3").unwrap();
        let pkg = |version| PackageRef {
            category: "foo",
            name: "bar",
            version,
            slot: None,
            repository: None,
        };

        assert!(config.find_mask(&pkg(&two)).is_some());
        assert!(!config.is_unmasked(&pkg(&two)));
        assert!(config.is_unmasked(&pkg(&three)));
    }
}
