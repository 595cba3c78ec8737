//! Package atom parsing and matching
//!
//! Implements package atoms like:
//! - `category/package`
//! - `>=category/package-1.0`
//! - `=category/package-1.2*`
//! - `category/package:slot`
//! - `category/package::repository`
//! - `category/package[use_flag]`
//! - `category/*`, `*/*`, `dev-*/foo` (wildcards, for configuration files)

use crate::{ConfigError, Result, VersionSpec};
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Version comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum VersionOp {
    /// No version constraint
    #[default]
    Any,
    /// Exact version match (=)
    Equal,
    /// Greater than (>)
    Greater,
    /// Greater than or equal (>=)
    GreaterEqual,
    /// Less than (<)
    Less,
    /// Less than or equal (<=)
    LessEqual,
    /// Version glob match (=*), e.g., =category/package-1.0*
    GlobEqual,
    /// Same version, any revision (~)
    RevisionBump,
}

/// Borrowed view of a concrete package version, as seen by atom matching
#[derive(Debug, Clone, Copy)]
pub struct PackageRef<'a> {
    pub category: &'a str,
    pub name: &'a str,
    pub version: &'a VersionSpec,
    /// SLOT value, with an optional `/subslot`; `None` when unknown
    pub slot: Option<&'a str>,
    pub repository: Option<&'a str>,
}

/// A package atom representing a package specification
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageAtom {
    /// Version operator
    pub operator: VersionOp,
    /// Package category (e.g., "sys-apps"), may be a glob in configuration files
    pub category: String,
    /// Package name (e.g., "systemd"), may be a glob in configuration files
    pub name: String,
    /// Version (present whenever the operator is not `Any`)
    pub version: Option<VersionSpec>,
    /// Slot specification (optional)
    pub slot: Option<String>,
    /// Sub-slot specification (optional)
    pub subslot: Option<String>,
    /// Repository restriction (optional)
    pub repository: Option<String>,
    /// USE flag requirements
    pub use_deps: Vec<UseDep>,
}

impl PackageAtom {
    /// Create a new package atom with just category and name
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            operator: VersionOp::Any,
            category: category.into(),
            name: name.into(),
            version: None,
            slot: None,
            subslot: None,
            repository: None,
            use_deps: Vec::new(),
        }
    }

    /// Parse an atom for a configuration file or mask list
    ///
    /// USE dependencies are rejected: they restrict installed state, which
    /// a package version on its own does not have.
    pub fn parse_restriction(s: &str) -> Result<Self> {
        let atom: Self = s.parse()?;
        if !atom.use_deps.is_empty() {
            return Err(ConfigError::InvalidAtom(format!(
                "USE dependencies are not allowed here: {}",
                s.trim()
            )));
        }
        Ok(atom)
    }

    /// Get the fully qualified package name (category/name)
    pub fn cpn(&self) -> String {
        format!("{}/{}", self.category, self.name)
    }

    /// Check if this is a wildcard atom (e.g., `*/package`, `category/*`, `dev-*/foo`)
    pub fn is_wildcard(&self) -> bool {
        is_glob(&self.category) || is_glob(&self.name)
    }

    /// Check if this atom names the given category/name
    pub fn matches_cpn(&self, category: &str, name: &str) -> bool {
        glob_matches(&self.category, category) && glob_matches(&self.name, name)
    }

    /// Check if this atom matches a concrete package version
    pub fn matches(&self, pkg: &PackageRef<'_>) -> bool {
        if !self.matches_cpn(pkg.category, pkg.name) {
            return false;
        }

        if let Some(ref repo) = self.repository {
            if pkg.repository != Some(repo.as_str()) {
                return false;
            }
        }

        if !self.matches_slot(pkg.slot) {
            return false;
        }

        let Some(ref wanted) = self.version else {
            return true;
        };

        match self.operator {
            VersionOp::Any => true,
            VersionOp::Equal => pkg.version == wanted,
            VersionOp::Greater => pkg.version > wanted,
            VersionOp::GreaterEqual => pkg.version >= wanted,
            VersionOp::Less => pkg.version < wanted,
            VersionOp::LessEqual => pkg.version <= wanted,
            VersionOp::GlobEqual => pkg.version.starts_with(wanted),
            VersionOp::RevisionBump => pkg.version.eq_ignoring_revision(wanted),
        }
    }

    /// A package whose slot is unknown never matches a slot atom
    fn matches_slot(&self, pkg_slot: Option<&str>) -> bool {
        let Some(ref wanted) = self.slot else {
            return true;
        };
        let Some(pkg_slot) = pkg_slot else {
            return false;
        };

        // SLOT="2" carries an implicit subslot equal to the slot
        let (slot, subslot) = pkg_slot.split_once('/').unwrap_or((pkg_slot, pkg_slot));
        if slot != wanted.as_str() {
            return false;
        }
        self.subslot.as_deref().map_or(true, |wanted| subslot == wanted)
    }
}

fn is_glob(s: &str) -> bool {
    s.contains(['*', '?', '['])
}

fn glob_matches(pattern: &str, value: &str) -> bool {
    if !is_glob(pattern) {
        return pattern == value;
    }
    Pattern::new(pattern)
        .map(|p| p.matches(value))
        .unwrap_or(false)
}

impl FromStr for PackageAtom {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConfigError::InvalidAtom("empty atom".to_string()));
        }

        let mut remaining = s;

        // Parse operator
        let operator = if let Some(rest) = remaining.strip_prefix(">=") {
            remaining = rest;
            VersionOp::GreaterEqual
        } else if let Some(rest) = remaining.strip_prefix("<=") {
            remaining = rest;
            VersionOp::LessEqual
        } else if let Some(rest) = remaining.strip_prefix('>') {
            remaining = rest;
            VersionOp::Greater
        } else if let Some(rest) = remaining.strip_prefix('<') {
            remaining = rest;
            VersionOp::Less
        } else if let Some(rest) = remaining.strip_prefix('~') {
            remaining = rest;
            VersionOp::RevisionBump
        } else if let Some(rest) = remaining.strip_prefix('=') {
            remaining = rest;
            VersionOp::Equal
        } else {
            VersionOp::Any
        };

        // Extract USE deps [flag1,flag2]
        let mut use_deps = Vec::new();
        if let Some(start) = remaining.find('[') {
            let end = remaining
                .find(']')
                .ok_or_else(|| ConfigError::InvalidAtom(format!("unclosed USE deps: {}", s)))?;
            if end < start {
                return Err(ConfigError::InvalidAtom(format!("malformed USE deps: {}", s)));
            }
            for dep in remaining[start + 1..end].split(',') {
                use_deps.push(dep.trim().parse()?);
            }
            remaining = &remaining[..start];
        }

        // Extract repository ::repo
        let mut repository = None;
        if let Some(idx) = remaining.find("::") {
            repository = Some(remaining[idx + 2..].to_string());
            remaining = &remaining[..idx];
        }

        // Extract slot :slot/subslot
        let mut slot = None;
        let mut subslot = None;
        if let Some(idx) = remaining.find(':') {
            let slot_str = &remaining[idx + 1..];
            if let Some((s, sub)) = slot_str.split_once('/') {
                slot = Some(s.to_string());
                subslot = Some(sub.to_string());
            } else {
                slot = Some(slot_str.to_string());
            }
            remaining = &remaining[..idx];
        }

        // Trailing * on an = atom turns it into a glob match
        let operator = match remaining.strip_suffix('*') {
            Some(rest) if operator == VersionOp::Equal => {
                remaining = rest;
                VersionOp::GlobEqual
            }
            _ => operator,
        };

        let (category, name_version) = remaining
            .split_once('/')
            .ok_or_else(|| ConfigError::InvalidAtom(format!("missing category: {}", s)))?;
        if name_version.contains('/') {
            return Err(ConfigError::InvalidAtom(format!("too many '/': {}", s)));
        }

        let (name, version) = if operator != VersionOp::Any {
            let (name, version) = split_name_version(name_version)
                .ok_or_else(|| ConfigError::InvalidAtom(format!("missing version: {}", s)))?;
            (name.to_string(), Some(VersionSpec::parse(version)?))
        } else if split_name_version(name_version)
            .is_some_and(|(_, version)| VersionSpec::parse(version).is_ok())
        {
            return Err(ConfigError::InvalidAtom(format!(
                "version without an operator: {}",
                s
            )));
        } else {
            (name_version.to_string(), None)
        };

        if category.is_empty() || name.is_empty() {
            return Err(ConfigError::InvalidAtom(format!("invalid atom: {}", s)));
        }

        Ok(PackageAtom {
            operator,
            category: category.to_string(),
            name,
            version,
            slot,
            subslot,
            repository,
            use_deps,
        })
    }
}

/// Split `name-1.0-r1` into (`name`, `1.0-r1`) at the last `-<digit>`
pub fn split_name_version(s: &str) -> Option<(&str, &str)> {
    let bytes = s.as_bytes();
    (0..bytes.len().saturating_sub(1))
        .rev()
        .find(|&i| bytes[i] == b'-' && bytes[i + 1].is_ascii_digit())
        .map(|i| (&s[..i], &s[i + 1..]))
        .filter(|(name, _)| !name.is_empty())
}

impl fmt::Display for PackageAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operator {
            VersionOp::Any => {}
            VersionOp::Equal | VersionOp::GlobEqual => write!(f, "=")?,
            VersionOp::Greater => write!(f, ">")?,
            VersionOp::GreaterEqual => write!(f, ">=")?,
            VersionOp::Less => write!(f, "<")?,
            VersionOp::LessEqual => write!(f, "<=")?,
            VersionOp::RevisionBump => write!(f, "~")?,
        }

        write!(f, "{}/{}", self.category, self.name)?;

        if let Some(ref ver) = self.version {
            write!(f, "-{}", ver)?;
        }

        if self.operator == VersionOp::GlobEqual {
            write!(f, "*")?;
        }

        if let Some(ref slot) = self.slot {
            write!(f, ":{}", slot)?;
            if let Some(ref subslot) = self.subslot {
                write!(f, "/{}", subslot)?;
            }
        }

        if let Some(ref repo) = self.repository {
            write!(f, "::{}", repo)?;
        }

        if !self.use_deps.is_empty() {
            write!(f, "[")?;
            for (i, dep) in self.use_deps.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}", dep)?;
            }
            write!(f, "]")?;
        }

        Ok(())
    }
}

/// USE flag dependency in an atom
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UseDep {
    /// The USE flag name
    pub flag: String,
    /// Whether the flag must be enabled (true) or disabled (false)
    pub enabled: bool,
    /// Default value if flag is not set
    pub default: Option<bool>,
    /// Whether this is a conditional dependency (use?)
    pub conditional: bool,
}

impl FromStr for UseDep {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConfigError::InvalidUseFlag("empty USE dep".to_string()));
        }

        let conditional = s.ends_with('?');
        let mut flag = s.strip_suffix('?').unwrap_or(s);

        let mut default = None;
        if let Some(rest) = flag.strip_suffix("(+)") {
            default = Some(true);
            flag = rest;
        } else if let Some(rest) = flag.strip_suffix("(-)") {
            default = Some(false);
            flag = rest;
        }

        let (flag, enabled) = match flag.strip_prefix('-').or_else(|| flag.strip_prefix('!')) {
            Some(rest) => (rest, false),
            None => (flag, true),
        };

        if flag.is_empty() {
            return Err(ConfigError::InvalidUseFlag(s.to_string()));
        }

        Ok(UseDep {
            flag: flag.to_string(),
            enabled,
            default,
            conditional,
        })
    }
}

impl fmt::Display for UseDep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.enabled {
            write!(f, "-")?;
        }
        write!(f, "{}", self.flag)?;
        if let Some(def) = self.default {
            write!(f, "({})", if def { "+" } else { "-" })?;
        }
        if self.conditional {
            write!(f, "?")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg<'a>(version: &'a VersionSpec, repo: Option<&'a str>) -> PackageRef<'a> {
        PackageRef {
            category: "foo",
            name: "bar",
            version,
            slot: None,
            repository: repo,
        }
    }

    #[test]
    fn test_parse_simple_atom() {
        let atom: PackageAtom = "sys-apps/systemd".parse().unwrap();
        assert_eq!(atom.category, "sys-apps");
        assert_eq!(atom.name, "systemd");
        assert_eq!(atom.operator, VersionOp::Any);
        assert!(atom.version.is_none());
    }

    #[test]
    fn test_parse_versioned_atom() {
        let atom: PackageAtom = ">=sys-apps/systemd-250-r1".parse().unwrap();
        assert_eq!(atom.name, "systemd");
        assert_eq!(atom.version.as_ref().unwrap().as_str(), "250-r1");
        assert_eq!(atom.operator, VersionOp::GreaterEqual);
    }

    #[test]
    fn test_parse_glob_atom() {
        let atom: PackageAtom = "=dev-lang/python-3.11*".parse().unwrap();
        assert_eq!(atom.operator, VersionOp::GlobEqual);
        assert_eq!(atom.to_string(), "=dev-lang/python-3.11*");
    }

    #[test]
    fn test_parse_slot_repo_use() {
        let atom: PackageAtom = "dev-lang/python:3.11::gentoo[sqlite,-tk]".parse().unwrap();
        assert_eq!(atom.slot.as_deref(), Some("3.11"));
        assert_eq!(atom.repository.as_deref(), Some("gentoo"));
        assert_eq!(atom.use_deps.len(), 2);
        assert!(!atom.use_deps[1].enabled);
    }

    #[test]
    fn test_parse_invalid() {
        assert!("".parse::<PackageAtom>().is_err());
        assert!("systemd".parse::<PackageAtom>().is_err());
        assert!(">=sys-apps/systemd".parse::<PackageAtom>().is_err());
        assert!("a/b/c".parse::<PackageAtom>().is_err());
    }

    #[test]
    fn test_version_needs_operator() {
        assert!("foo/bar-1.0".parse::<PackageAtom>().is_err());
        assert!("foo/bar-1.0:2".parse::<PackageAtom>().is_err());
        // a dash-digit that is not a version stays part of the name
        let atom: PackageAtom = "x11-libs/gtk-2-extra".parse().unwrap();
        assert_eq!(atom.name, "gtk-2-extra");
        assert_eq!("foo/bar-baz".parse::<PackageAtom>().unwrap().name, "bar-baz");
    }

    #[test]
    fn test_slot_matching() {
        let one = VersionSpec::parse("1.0").unwrap();
        let two = VersionSpec::parse("2.0").unwrap();
        let slot_one = PackageRef {
            slot: Some("1"),
            ..pkg(&one, None)
        };
        let slot_two = PackageRef {
            slot: Some("2/2.1"),
            ..pkg(&two, None)
        };

        let atom: PackageAtom = "foo/bar:2".parse().unwrap();
        assert!(!atom.matches(&slot_one));
        assert!(atom.matches(&slot_two));
        // unknown slot
        assert!(!atom.matches(&pkg(&two, None)));

        let atom: PackageAtom = "foo/bar:2/2.1".parse().unwrap();
        assert!(atom.matches(&slot_two));
        let atom: PackageAtom = "foo/bar:2/2.0".parse().unwrap();
        assert!(!atom.matches(&slot_two));
        let atom: PackageAtom = "foo/bar:1/1".parse().unwrap();
        assert!(atom.matches(&slot_one));

        let atom: PackageAtom = ">=foo/bar-1.0:1".parse().unwrap();
        assert!(atom.matches(&slot_one));
        assert!(!atom.matches(&slot_two));
    }

    #[test]
    fn test_parse_restriction() {
        assert!(PackageAtom::parse_restriction("foo/bar:2::testrepo").is_ok());
        assert!(matches!(
            PackageAtom::parse_restriction("foo/bar[ssl]"),
            Err(ConfigError::InvalidAtom(_))
        ));
    }

    #[test]
    fn test_version_matching() {
        let one = VersionSpec::parse("1.0").unwrap();
        let two = VersionSpec::parse("2.0").unwrap();

        let atom: PackageAtom = ">=foo/bar-2".parse().unwrap();
        assert!(!atom.matches(&pkg(&one, None)));
        assert!(atom.matches(&pkg(&two, None)));

        let atom: PackageAtom = "~foo/bar-1.0-r3".parse().unwrap();
        assert!(atom.matches(&pkg(&one, None)));

        let atom: PackageAtom = "=foo/bar-1*".parse().unwrap();
        assert!(atom.matches(&pkg(&one, None)));
        assert!(!atom.matches(&pkg(&two, None)));
    }

    #[test]
    fn test_repository_matching() {
        let one = VersionSpec::parse("1.0").unwrap();
        let atom: PackageAtom = "foo/bar::testrepo".parse().unwrap();
        assert!(atom.matches(&pkg(&one, Some("testrepo"))));
        assert!(!atom.matches(&pkg(&one, Some("other"))));
        assert!(!atom.matches(&pkg(&one, None)));
    }

    #[test]
    fn test_wildcards() {
        let atom: PackageAtom = "foo/*".parse().unwrap();
        assert!(atom.is_wildcard());
        assert!(atom.matches_cpn("foo", "bar"));
        assert!(!atom.matches_cpn("baz", "bar"));

        let atom: PackageAtom = "*/*".parse().unwrap();
        assert!(atom.matches_cpn("anything", "goes"));

        let atom = PackageAtom::new("foo", "bar");
        assert!(!atom.is_wildcard());
    }

    #[test]
    fn test_split_name_version() {
        assert_eq!(split_name_version("bar-1.0"), Some(("bar", "1.0")));
        assert_eq!(split_name_version("foo-bar-2.0-r1"), Some(("foo-bar", "2.0-r1")));
        assert_eq!(split_name_version("bar"), None);
        assert_eq!(split_name_version("-1.0"), None);
    }
}
