//! Package version parsing and ordering
//!
//! Versions look like `1.2.3b_beta2_p1-r3`: dotted numeric components, an
//! optional trailing letter, any number of suffixes and an optional revision.
//!
//! Ordering rules:
//! - the first component is compared numerically
//! - later components are compared numerically, unless either side has a
//!   leading zero, in which case both are compared as strings with trailing
//!   zeros removed (`1.01 < 1.1`, `1.0 == 1.00`)
//! - more components win when all shared components are equal
//! - suffixes order as `_alpha < _beta < _pre < _rc < (none) < _p`
//! - a missing revision is `-r0`

use crate::{ConfigError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::OnceLock;

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d+(?:\.\d+)*)([a-z])?((?:_(?:alpha|beta|pre|rc|p)\d*)*)(?:-r(\d+))?$")
            .expect("version pattern is a valid regex")
    })
}

/// Version suffix kinds, in ascending order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SuffixKind {
    Alpha,
    Beta,
    Pre,
    Rc,
    P,
}

impl SuffixKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuffixKind::Alpha => "alpha",
            SuffixKind::Beta => "beta",
            SuffixKind::Pre => "pre",
            SuffixKind::Rc => "rc",
            SuffixKind::P => "p",
        }
    }
}

/// A single `_kindN` suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Suffix {
    pub kind: SuffixKind,
    pub number: u64,
}

/// A parsed, totally ordered package version
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionSpec {
    text: String,
    components: Vec<String>,
    letter: Option<char>,
    suffixes: Vec<Suffix>,
    revision: u64,
}

impl VersionSpec {
    /// Parse a version string such as `1.0`, `2.3b_rc1` or `4.1-r2`
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let caps = version_regex()
            .captures(s)
            .ok_or_else(|| ConfigError::InvalidVersion(s.to_string()))?;

        let components = caps[1].split('.').map(|c| c.to_string()).collect();
        let letter = caps.get(2).and_then(|m| m.as_str().chars().next());

        let mut suffixes = Vec::new();
        if let Some(m) = caps.get(3) {
            for part in m.as_str().split('_').filter(|p| !p.is_empty()) {
                suffixes.push(parse_suffix(part).ok_or_else(|| ConfigError::InvalidVersion(s.to_string()))?);
            }
        }

        let revision = match caps.get(4) {
            Some(m) => m
                .as_str()
                .parse()
                .map_err(|_| ConfigError::InvalidVersion(s.to_string()))?,
            None => 0,
        };

        Ok(Self {
            text: s.to_string(),
            components,
            letter,
            suffixes,
            revision,
        })
    }

    /// The version as originally written
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Revision number (`-rN`), zero when absent
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Compare two versions ignoring their revisions (the `~` atom operator)
    pub fn eq_ignoring_revision(&self, other: &VersionSpec) -> bool {
        self.cmp_without_revision(other) == Ordering::Equal
    }

    /// Prefix match used by `=cat/pkg-1.2*` atoms
    pub fn starts_with(&self, prefix: &VersionSpec) -> bool {
        self.text.starts_with(prefix.as_str())
    }

    fn cmp_without_revision(&self, other: &VersionSpec) -> Ordering {
        compare_numeric(&self.components[0], &other.components[0])
            .then_with(|| compare_components(&self.components[1..], &other.components[1..]))
            .then_with(|| self.letter.cmp(&other.letter))
            .then_with(|| compare_suffixes(&self.suffixes, &other.suffixes))
    }
}

fn parse_suffix(part: &str) -> Option<Suffix> {
    const KINDS: [(&str, SuffixKind); 5] = [
        ("alpha", SuffixKind::Alpha),
        ("beta", SuffixKind::Beta),
        ("pre", SuffixKind::Pre),
        ("rc", SuffixKind::Rc),
        ("p", SuffixKind::P),
    ];

    for (name, kind) in KINDS {
        if let Some(rest) = part.strip_prefix(name) {
            let number = if rest.is_empty() { 0 } else { rest.parse().ok()? };
            return Some(Suffix { kind, number });
        }
    }
    None
}

fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_components(a: &[String], b: &[String]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        let ord = if x.starts_with('0') || y.starts_with('0') {
            x.trim_end_matches('0').cmp(y.trim_end_matches('0'))
        } else {
            compare_numeric(x, y)
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

fn compare_suffixes(a: &[Suffix], b: &[Suffix]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        let ord = x.kind.cmp(&y.kind).then(x.number.cmp(&y.number));
        if ord != Ordering::Equal {
            return ord;
        }
    }

    // An extra `_p` makes a version newer, any other extra suffix older.
    match a.len().cmp(&b.len()) {
        Ordering::Equal => Ordering::Equal,
        Ordering::Greater if a[b.len()].kind == SuffixKind::P => Ordering::Greater,
        Ordering::Greater => Ordering::Less,
        Ordering::Less if b[a.len()].kind == SuffixKind::P => Ordering::Less,
        Ordering::Less => Ordering::Greater,
    }
}

impl Ord for VersionSpec {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_without_revision(other)
            .then(self.revision.cmp(&other.revision))
    }
}

impl PartialOrd for VersionSpec {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for VersionSpec {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionSpec {}

impl Hash for VersionSpec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Must agree with `Ord`: hash the normalized form of each component.
        let first = self.components[0].trim_start_matches('0');
        first.hash(state);
        for component in &self.components[1..] {
            if component.starts_with('0') {
                (1u8, component.trim_end_matches('0')).hash(state);
            } else {
                (0u8, component.as_str()).hash(state);
            }
        }
        self.letter.hash(state);
        self.suffixes.hash(state);
        self.revision.hash(state);
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl FromStr for VersionSpec {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VersionSpec {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<VersionSpec> for String {
    fn from(v: VersionSpec) -> Self {
        v.text
    }
}
