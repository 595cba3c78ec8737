//! Keyword acceptance configuration
//!
//! Implements ACCEPT_KEYWORDS handling:
//! - Architecture keywords (amd64, arm64, test, ...)
//! - Stability levels (stable, testing `~`, broken `-`)
//! - Wildcards (`*` any stable, `~*` any testing, `**` anything)
//! - Per-package keyword acceptance
//!
//! Keywords are compared structurally: accepting `amd64` says nothing about
//! `~amd64`, and accepting `~amd64` says nothing about `amd64`.

use crate::atom::PackageRef;
use crate::{ConfigError, PackageAtom, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Keyword stability levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeywordStability {
    /// Stable release (`arch`)
    Stable,
    /// Testing/unstable (`~arch`)
    Testing,
    /// Known broken (`-arch`)
    Broken,
    /// Accept anything (`**`)
    Any,
}

/// A single keyword: a base token plus its stability tier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Keyword {
    /// The architecture token, `*` for wildcards
    pub arch: String,
    /// The stability level
    pub stability: KeywordStability,
}

impl Keyword {
    /// Parse a keyword string
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s == "**" {
            return Ok(Self {
                arch: "*".to_string(),
                stability: KeywordStability::Any,
            });
        }

        let (stability, arch) = if let Some(rest) = s.strip_prefix('~') {
            (KeywordStability::Testing, rest)
        } else if let Some(rest) = s.strip_prefix('-') {
            (KeywordStability::Broken, rest)
        } else {
            (KeywordStability::Stable, s)
        };

        if arch.is_empty() || arch.starts_with(['~', '-']) || arch.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidKeyword(s.to_string()));
        }

        Ok(Self {
            arch: arch.to_string(),
            stability,
        })
    }

    /// Create a stable keyword
    pub fn stable(arch: impl Into<String>) -> Self {
        Self {
            arch: arch.into(),
            stability: KeywordStability::Stable,
        }
    }

    /// Create a testing keyword
    pub fn testing(arch: impl Into<String>) -> Self {
        Self {
            arch: arch.into(),
            stability: KeywordStability::Testing,
        }
    }

    /// Whether this keyword is a wildcard (`*`, `~*`, `**`)
    pub fn is_wildcard(&self) -> bool {
        self.arch == "*"
    }

    /// Check if this keyword, used as an acceptance rule, accepts `other`
    pub fn accepts(&self, other: &Keyword) -> bool {
        if other.stability == KeywordStability::Broken {
            return false;
        }

        match self.stability {
            KeywordStability::Any => true,
            KeywordStability::Broken => false,
            stability if self.is_wildcard() => stability == other.stability,
            _ => self == other,
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stability {
            KeywordStability::Stable => write!(f, "{}", self.arch),
            KeywordStability::Testing => write!(f, "~{}", self.arch),
            KeywordStability::Broken => write!(f, "-{}", self.arch),
            KeywordStability::Any => write!(f, "**"),
        }
    }
}

impl FromStr for Keyword {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Keyword acceptance configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywordConfig {
    /// Global ACCEPT_KEYWORDS (e.g., "amd64")
    pub accept_keywords: HashSet<Keyword>,
    /// Per-package keyword acceptance (package.accept_keywords)
    pub package: Vec<PackageKeywordEntry>,
    /// Architecture
    pub arch: String,
}

impl KeywordConfig {
    /// Create a keyword configuration accepting the stable keyword of an architecture
    pub fn new(arch: impl Into<String>) -> Self {
        let arch = arch.into();
        let mut accept_keywords = HashSet::new();
        accept_keywords.insert(Keyword::stable(arch.clone()));

        Self {
            accept_keywords,
            package: Vec::new(),
            arch,
        }
    }

    /// Accept testing packages (~arch)
    pub fn accept_testing(&mut self) {
        self.accept_keywords.insert(Keyword::testing(self.arch.clone()));
    }

    /// Apply an ACCEPT_KEYWORDS string; `-*` clears what was accepted so far
    pub fn set_accept_keywords(&mut self, s: &str) -> Result<()> {
        for token in s.split_whitespace() {
            if token == "-*" {
                self.accept_keywords.clear();
                continue;
            }
            // `-kw` and `-~kw` withdraw a previously accepted keyword
            if let Some(withdrawn) = token.strip_prefix('-') {
                self.accept_keywords.remove(&Keyword::parse(withdrawn)?);
                continue;
            }
            self.accept_keywords.insert(Keyword::parse(token)?);
        }
        Ok(())
    }

    /// Add per-package keyword acceptance
    pub fn add_package_keywords(&mut self, atom: PackageAtom, keywords: Vec<Keyword>) {
        self.package.push(PackageKeywordEntry { atom, keywords });
    }

    /// Check a keyword against the global ACCEPT_KEYWORDS only
    pub fn accepts_globally(&self, keyword: &Keyword) -> bool {
        self.accept_keywords.iter().any(|k| k.accepts(keyword))
    }

    /// Check a keyword against per-package entries matching `pkg`
    pub fn accepts_for(&self, keyword: &Keyword, pkg: &PackageRef<'_>) -> bool {
        self.package
            .iter()
            .filter(|entry| entry.atom.matches(pkg))
            .flat_map(|entry| entry.keywords.iter())
            .any(|k| k.accepts(keyword))
    }

    /// Parse a whitespace separated keyword list
    pub fn parse_keywords_string(s: &str) -> Result<Vec<Keyword>> {
        s.split_whitespace().map(Keyword::parse).collect()
    }
}

/// Per-package keyword entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageKeywordEntry {
    /// The package atom
    pub atom: PackageAtom,
    /// Keywords to accept for this package
    pub keywords: Vec<Keyword>,
}

/// Detect the architecture keyword of the running host
pub fn detect_arch() -> &'static str {
    #[cfg(target_arch = "x86_64")]
    return "amd64";

    #[cfg(target_arch = "x86")]
    return "x86";

    #[cfg(target_arch = "aarch64")]
    return "arm64";

    #[cfg(target_arch = "arm")]
    return "arm";

    #[cfg(target_arch = "powerpc64")]
    return "ppc64";

    #[cfg(target_arch = "riscv64")]
    return "riscv";

    #[cfg(not(any(
        target_arch = "x86_64",
        target_arch = "x86",
        target_arch = "aarch64",
        target_arch = "arm",
        target_arch = "powerpc64",
        target_arch = "riscv64"
    )))]
    return "unknown";
}
