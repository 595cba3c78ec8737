//! Package repositories
//!
//! A repository is a named, read-only source of package metadata: the
//! keywords, license and slot declared by each package version, the profile
//! masks and USE masks/forces, and the package sets it defines.
//!
//! Repositories are either read from disk with [`Repository::load`] or built
//! in memory with [`Repository::builder`].
//!
//! ```text
//! <repo>/profiles/repo_name
//! <repo>/profiles/make.defaults          ARCH="amd64"
//! <repo>/profiles/package.mask
//! <repo>/profiles/use.mask
//! <repo>/profiles/use.force
//! <repo>/profiles/packages               *sys-apps/baselayout
//! <repo>/sets/<name>.conf
//! <repo>/<category>/<name>/<name>-<version>.ebuild
//! ```

use crate::depspec::{parse_license, LicenseTree};
use crate::types::{PackageDatabaseEntry, PackageId, VersionSpec};
use crate::{Error, Result};
use pkgenv_config::atom::split_name_version;
use pkgenv_config::mask::parse_mask_file;
use pkgenv_config::{ConfigError, Keyword, MaskEntry, PackageAtom, PackageRef, PackageSet, SetsConfig};
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Top-level directories that never hold packages
const NON_CATEGORY_DIRS: &[&str] = &["profiles", "sets", "metadata", "eclass", "licenses"];

/// Metadata declared by one package version
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EbuildMetadata {
    /// KEYWORDS
    pub keywords: Vec<Keyword>,
    /// LICENSE
    pub license: Option<LicenseTree>,
    /// SLOT
    pub slot: String,
}

impl EbuildMetadata {
    /// Build metadata from KEYWORDS and LICENSE strings
    pub fn parse(keywords: &str, license: &str) -> Result<Self> {
        let keywords = keywords
            .split_whitespace()
            .map(Keyword::parse)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let license = if license.trim().is_empty() {
            None
        } else {
            Some(parse_license(license)?)
        };
        Ok(Self {
            keywords,
            license,
            slot: "0".to_string(),
        })
    }
}

/// A named package repository
#[derive(Debug, Clone)]
pub struct Repository {
    name: String,
    location: Option<PathBuf>,
    arch: Option<String>,
    packages: BTreeMap<PackageId, BTreeMap<VersionSpec, EbuildMetadata>>,
    profile_masks: Vec<MaskEntry>,
    use_mask: HashSet<String>,
    use_force: HashSet<String>,
    system: Vec<PackageAtom>,
    sets: SetsConfig,
}

impl Repository {
    /// Start building an in-memory repository
    pub fn builder(name: impl Into<String>) -> RepositoryBuilder {
        RepositoryBuilder::new(name)
    }

    /// Read a repository from disk
    ///
    /// The name comes from `profiles/repo_name`, else the directory name.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_inner(path, None)
    }

    /// Read a repository configured under `name`, e.g. a repos.conf section
    ///
    /// The configured name wins over `profiles/repo_name`.
    pub fn load_named(path: &Path, name: &str) -> Result<Self> {
        Self::load_inner(path, Some(name))
    }

    fn load_inner(path: &Path, configured: Option<&str>) -> Result<Self> {
        if !path.is_dir() {
            return Err(ConfigError::NotFound(path.to_path_buf()).into());
        }

        let profiles = path.join("profiles");

        let declared = match read_optional(&profiles.join("repo_name"))? {
            Some(content) => content.lines().next().unwrap_or("").trim().to_string(),
            None => String::new(),
        };
        let name = match configured {
            Some(configured) => {
                if !declared.is_empty() && declared != configured {
                    warn!(
                        "Repository at {} calls itself '{}' but is configured as '{}'",
                        path.display(),
                        declared,
                        configured
                    );
                }
                configured.to_string()
            }
            None if declared.is_empty() => path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.to_string())
                .ok_or_else(|| Error::InvalidPackageSpec(format!("unnamed repository at {}", path.display())))?,
            None => declared,
        };

        let mut builder = RepositoryBuilder::new(name);
        builder.location = Some(path.to_path_buf());

        if let Some(content) = read_optional(&profiles.join("make.defaults"))? {
            if let Some(arch) = parse_assignments(&content).remove("ARCH") {
                builder = builder.arch(arch);
            }
        }

        if let Some(content) = read_optional(&profiles.join("package.mask"))? {
            builder.profile_masks = parse_mask_file(&content);
        }

        if let Some(content) = read_optional(&profiles.join("use.mask"))? {
            apply_flag_list(&mut builder.use_mask, &content);
        }

        if let Some(content) = read_optional(&profiles.join("use.force"))? {
            apply_flag_list(&mut builder.use_force, &content);
        }

        if let Some(content) = read_optional(&profiles.join("packages"))? {
            builder.system = parse_profile_packages(&content);
        }

        builder.sets = SetsConfig::load_from_dir(&path.join("sets"))?;

        for entry in WalkDir::new(path)
            .min_depth(3)
            .max_depth(3)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() != 1
                    || e.file_name()
                        .to_str()
                        .map(|n| !n.starts_with('.') && !NON_CATEGORY_DIRS.contains(&n))
                        .unwrap_or(false)
            })
        {
            let entry = entry?;
            let file = entry.path();
            if !entry.file_type().is_file() || file.extension().map(|e| e != "ebuild").unwrap_or(true) {
                continue;
            }

            match read_ebuild(file) {
                Ok(Some((id, version, metadata))) => {
                    builder.insert(id, version, metadata);
                }
                Ok(None) => warn!("Ignoring misplaced ebuild {}", file.display()),
                Err(e) => warn!("Skipping ebuild {}: {}", file.display(), e),
            }
        }

        let repo = builder.build();
        debug!(
            "Loaded repository {} from {} ({} packages)",
            repo.name,
            path.display(),
            repo.packages.len()
        );
        Ok(repo)
    }

    /// Repository name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// On-disk location, if read from disk
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// Profile ARCH
    pub fn arch(&self) -> Option<&str> {
        self.arch.as_deref()
    }

    /// All packages, sorted
    pub fn package_ids(&self) -> impl Iterator<Item = &PackageId> {
        self.packages.keys()
    }

    /// Versions of a package, ascending
    pub fn versions(&self, id: &PackageId) -> Vec<&VersionSpec> {
        self.packages
            .get(id)
            .map(|versions| versions.keys().collect())
            .unwrap_or_default()
    }

    /// Every package version as a database entry
    pub fn entries(&self) -> Vec<PackageDatabaseEntry> {
        self.packages
            .iter()
            .flat_map(|(id, versions)| {
                versions
                    .keys()
                    .map(move |v| PackageDatabaseEntry::new(id.clone(), v.clone(), self.name.clone()))
            })
            .collect()
    }

    /// Package versions matching an atom
    pub fn query(&self, atom: &PackageAtom) -> Vec<PackageDatabaseEntry> {
        if atom
            .repository
            .as_deref()
            .map(|r| r != self.name)
            .unwrap_or(false)
        {
            return Vec::new();
        }

        self.entries()
            .into_iter()
            .filter(|pde| atom.matches(&self.package_ref(pde)))
            .collect()
    }

    /// View of a package version for atom matching, with its SLOT when known
    pub fn package_ref<'a>(&'a self, pde: &'a PackageDatabaseEntry) -> PackageRef<'a> {
        PackageRef {
            slot: self.metadata(pde).map(|m| m.slot.as_str()),
            ..pde.as_package_ref()
        }
    }

    /// Metadata declared by a package version
    pub fn metadata(&self, pde: &PackageDatabaseEntry) -> Option<&EbuildMetadata> {
        self.packages.get(&pde.id)?.get(&pde.version)
    }

    /// Keywords declared by a package version; empty when the version is unknown
    pub fn keywords(&self, pde: &PackageDatabaseEntry) -> &[Keyword] {
        self.metadata(pde)
            .map(|m| m.keywords.as_slice())
            .unwrap_or(&[])
    }

    /// License expression declared by a package version
    pub fn license(&self, pde: &PackageDatabaseEntry) -> Option<&LicenseTree> {
        self.metadata(pde)?.license.as_ref()
    }

    /// First profile package.mask entry matching a package version
    pub fn profile_mask(&self, pde: &PackageDatabaseEntry) -> Option<&MaskEntry> {
        let pkg = self.package_ref(pde);
        self.profile_masks.iter().find(|entry| entry.atom.matches(&pkg))
    }

    /// Check if the profile masks a USE flag
    pub fn is_use_masked(&self, flag: &str) -> bool {
        self.use_mask.contains(flag)
    }

    /// Check if the profile forces a USE flag
    pub fn is_use_forced(&self, flag: &str) -> bool {
        self.use_force.contains(flag)
    }

    /// Atoms of the profile `system` set
    pub fn system_packages(&self) -> &[PackageAtom] {
        &self.system
    }

    /// A set defined by this repository
    pub fn set(&self, name: &str) -> Option<&PackageSet> {
        self.sets.get(name)
    }

    /// Names of sets defined by this repository
    pub fn set_names(&self) -> Vec<&str> {
        self.sets.names()
    }
}

/// Builder for in-memory repositories
#[derive(Debug)]
pub struct RepositoryBuilder {
    name: String,
    location: Option<PathBuf>,
    arch: Option<String>,
    packages: BTreeMap<PackageId, BTreeMap<VersionSpec, EbuildMetadata>>,
    profile_masks: Vec<MaskEntry>,
    use_mask: HashSet<String>,
    use_force: HashSet<String>,
    system: Vec<PackageAtom>,
    sets: SetsConfig,
}

impl RepositoryBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: None,
            arch: None,
            packages: BTreeMap::new(),
            profile_masks: Vec::new(),
            use_mask: HashSet::new(),
            use_force: HashSet::new(),
            system: Vec::new(),
            sets: SetsConfig::new(),
        }
    }

    /// Set the profile ARCH
    pub fn arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = Some(arch.into());
        self
    }

    /// Add a package version, e.g. `package("foo/bar-1.0:2", "~amd64", "MIT")`
    ///
    /// The SLOT defaults to `0`.
    pub fn package(mut self, cpv: &str, keywords: &str, license: &str) -> Result<Self> {
        let (cpv, slot) = match cpv.split_once(':') {
            Some((cpv, slot)) if !slot.is_empty() => (cpv, Some(slot)),
            Some(_) => return Err(Error::InvalidPackageSpec(cpv.to_string())),
            None => (cpv, None),
        };
        let (id, version) = parse_cpv(cpv)?;
        let mut metadata = EbuildMetadata::parse(keywords, license)?;
        if let Some(slot) = slot {
            metadata.slot = slot.to_string();
        }
        self.insert(id, version, metadata);
        Ok(self)
    }

    /// Add a profile package.mask entry
    pub fn profile_mask(mut self, atom: PackageAtom) -> Self {
        self.profile_masks.push(MaskEntry::new(atom, None));
        self
    }

    /// Mask a USE flag in the profile
    pub fn use_mask(mut self, flag: impl Into<String>) -> Self {
        self.use_mask.insert(flag.into());
        self
    }

    /// Force a USE flag in the profile
    pub fn use_force(mut self, flag: impl Into<String>) -> Self {
        self.use_force.insert(flag.into());
        self
    }

    /// Add a package to the profile `system` set
    pub fn system_package(mut self, atom: PackageAtom) -> Self {
        self.system.push(atom);
        self
    }

    /// Define a repository set
    pub fn set(mut self, set: PackageSet) -> Self {
        self.sets.insert(set);
        self
    }

    fn insert(&mut self, id: PackageId, version: VersionSpec, metadata: EbuildMetadata) {
        self.packages.entry(id).or_default().insert(version, metadata);
    }

    pub fn build(self) -> Repository {
        Repository {
            name: self.name,
            location: self.location,
            arch: self.arch,
            packages: self.packages,
            profile_masks: self.profile_masks,
            use_mask: self.use_mask,
            use_force: self.use_force,
            system: self.system,
            sets: self.sets,
        }
    }
}

/// Split `category/name-version`
fn parse_cpv(cpv: &str) -> Result<(PackageId, VersionSpec)> {
    let (category, name_version) = cpv
        .split_once('/')
        .ok_or_else(|| Error::InvalidPackageSpec(cpv.to_string()))?;
    let (name, version) =
        split_name_version(name_version).ok_or_else(|| Error::InvalidPackageSpec(cpv.to_string()))?;
    let version = VersionSpec::parse(version).map_err(|_| Error::InvalidVersion(version.to_string()))?;
    Ok((PackageId::new(category, name), version))
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    if path.is_file() {
        Ok(Some(std::fs::read_to_string(path)?))
    } else {
        Ok(None)
    }
}

fn assignment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^[ \t]*([A-Za-z_][A-Za-z0-9_]*)=(?:"([^"]*)"|'([^']*)'|([^\s#]*))"#)
            .expect("assignment pattern is a valid regex")
    })
}

/// Parse `KEY="value"` assignments; whitespace inside values is normalized
fn parse_assignments(content: &str) -> HashMap<String, String> {
    assignment_regex()
        .captures_iter(content)
        .map(|caps| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str())
                .unwrap_or("");
            (
                caps[1].to_string(),
                value.split_whitespace().collect::<Vec<_>>().join(" "),
            )
        })
        .collect()
}

/// Apply a use.mask / use.force file: `flag` adds, `-flag` removes
fn apply_flag_list(flags: &mut HashSet<String>, content: &str) {
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.strip_prefix('-') {
            Some(flag) => {
                flags.remove(flag);
            }
            None => {
                flags.insert(line.to_string());
            }
        }
    }
}

/// Parse profiles/packages; only `*`-prefixed entries belong to the system set
fn parse_profile_packages(content: &str) -> Vec<PackageAtom> {
    let mut atoms = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        let Some(atom) = line.strip_prefix('*') else {
            continue;
        };
        match atom.parse::<PackageAtom>() {
            Ok(atom) => atoms.push(atom),
            Err(e) => warn!("Skipping invalid profile package '{}': {}", line, e),
        }
    }
    atoms
}

/// Read `<cat>/<pkg>/<pkg>-<ver>.ebuild`; `None` when the file name does not match its directory
fn read_ebuild(path: &Path) -> Result<Option<(PackageId, VersionSpec, EbuildMetadata)>> {
    let component = |p: Option<&Path>| {
        p.and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .map(|n| n.to_string())
    };

    let package_dir = path.parent();
    let (Some(category), Some(name), Some(stem)) = (
        component(package_dir.and_then(|p| p.parent())),
        component(package_dir),
        path.file_stem().and_then(|s| s.to_str()),
    ) else {
        return Ok(None);
    };

    let Some(version) = stem
        .strip_prefix(name.as_str())
        .and_then(|rest| rest.strip_prefix('-'))
    else {
        return Ok(None);
    };
    let version = VersionSpec::parse(version).map_err(|_| Error::InvalidVersion(version.to_string()))?;

    let vars = parse_assignments(&std::fs::read_to_string(path)?);
    let mut metadata = EbuildMetadata::default();

    for token in vars.get("KEYWORDS").map(|s| s.as_str()).unwrap_or("").split_whitespace() {
        match Keyword::parse(token) {
            Ok(keyword) => metadata.keywords.push(keyword),
            Err(e) => warn!("Ignoring keyword in {}: {}", path.display(), e),
        }
    }

    if let Some(license) = vars.get("LICENSE").filter(|l| !l.is_empty()) {
        match parse_license(license) {
            Ok(tree) => metadata.license = Some(tree),
            Err(e) => warn!("Ignoring LICENSE in {}: {}", path.display(), e),
        }
    }

    metadata.slot = vars
        .get("SLOT")
        .cloned()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "0".to_string());

    Ok(Some((PackageId::new(category, name), version, metadata)))
}
