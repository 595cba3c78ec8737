//! Complete Portage-style configuration
//!
//! This module brings together all configuration components into a
//! unified user configuration that mirrors the /etc/portage structure.

use crate::keywords::PackageKeywordEntry;
use crate::license::PackageLicenseEntry;
use crate::use_flags::PackageUseEntry;
use crate::{
    Keyword, KeywordConfig, LicenseConfig, MakeConf, MaskConfig, PackageAtom, PackageSet,
    ReposConfig, Result, SetsConfig, UseConfig,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Complete user configuration
///
/// This mirrors the structure of /etc/portage:
/// - make.conf -> Global settings
/// - repos.conf -> Repository configuration
/// - package.use -> Per-package USE flags
/// - package.accept_keywords -> Per-package keywords
/// - package.license -> Per-package licenses
/// - package.mask -> Package masks
/// - package.unmask -> Package unmasks
/// - sets -> Custom package sets
/// - world -> The world set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortageConfig {
    /// Global make.conf settings
    pub make_conf: MakeConf,

    /// Repository configuration (repos.conf)
    pub repos: ReposConfig,

    /// Per-package USE flags (package.use)
    pub package_use: Vec<PackageUseEntry>,

    /// Per-package keywords (package.accept_keywords); an empty list means `~ARCH`
    pub package_keywords: Vec<PackageKeywordEntry>,

    /// Per-package licenses (package.license)
    pub package_license: Vec<PackageLicenseEntry>,

    /// Package masks and unmasks (package.mask, package.unmask)
    pub package_mask: MaskConfig,

    /// User package sets, including world
    pub sets: SetsConfig,

    /// Configuration root path
    pub config_root: PathBuf,
}

impl PortageConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the filesystem
    pub fn load(config_root: &Path) -> Result<Self> {
        let mut config = Self {
            config_root: config_root.to_path_buf(),
            ..Self::default()
        };

        let make_conf_path = config_root.join("make.conf");
        if make_conf_path.exists() {
            config.make_conf = MakeConf::load(&make_conf_path)?;
        }

        let repos_conf_path = config_root.join("repos.conf");
        if repos_conf_path.exists() {
            config.repos = crate::repos::parse_repos_conf(&repos_conf_path)?;
        }

        let package_use_path = config_root.join("package.use");
        if package_use_path.exists() {
            config.package_use = load_package_use(&package_use_path)?;
        }

        let keywords_path = config_root.join("package.accept_keywords");
        if keywords_path.exists() {
            config.package_keywords = load_package_keywords(&keywords_path)?;
        }

        let license_path = config_root.join("package.license");
        if license_path.exists() {
            config.package_license = load_package_license(&license_path)?;
        }

        let mask_path = config_root.join("package.mask");
        if mask_path.exists() {
            let content = read_config_path(&mask_path)?;
            config.package_mask.masked = crate::mask::parse_mask_file(&content);
        }

        let unmask_path = config_root.join("package.unmask");
        if unmask_path.exists() {
            let content = read_config_path(&unmask_path)?;
            config.package_mask.unmasked = crate::mask::parse_mask_file(&content);
        }

        let sets_path = config_root.join("sets");
        if sets_path.exists() {
            config.sets = SetsConfig::load_from_dir(&sets_path)?;
        }

        let world_path = config_root.join("world");
        if world_path.exists() {
            let content = std::fs::read_to_string(&world_path)?;
            config
                .sets
                .insert(PackageSet::parse(crate::sets::well_known::WORLD, &content));
        }

        debug!(
            "Loaded configuration from {}: {} repositories, {} package.use entries",
            config_root.display(),
            config.repos.repos.len(),
            config.package_use.len()
        );

        Ok(config)
    }

    /// Effective USE configuration: make.conf globals plus package.use
    pub fn use_config(&self) -> UseConfig {
        let mut config = self.make_conf.use_config();
        config.package.extend(self.package_use.iter().cloned());
        config
    }

    /// Effective keyword configuration for `arch`
    ///
    /// package.accept_keywords entries without keywords accept `~arch`.
    pub fn keyword_config(&self, arch: &str) -> Result<KeywordConfig> {
        let mut config = self.make_conf.keyword_config(arch)?;
        for entry in &self.package_keywords {
            let keywords = if entry.keywords.is_empty() {
                vec![Keyword::testing(arch)]
            } else {
                entry.keywords.clone()
            };
            config.add_package_keywords(entry.atom.clone(), keywords);
        }
        Ok(config)
    }

    /// Effective license configuration: ACCEPT_LICENSE plus package.license
    pub fn license_config(&self) -> LicenseConfig {
        let mut config = self.make_conf.license_config();
        config.package.extend(self.package_license.iter().cloned());
        config
    }

    /// Get all repositories, highest priority first
    pub fn repositories(&self) -> Vec<&crate::repos::Repository> {
        self.repos.repos_by_priority()
    }
}

/// Split a `atom rest...` line, warning about unparsable atoms
fn parse_atom_line<'a>(line: &'a str, file: &str) -> Option<(PackageAtom, Vec<&'a str>)> {
    let mut parts = line.split_whitespace();
    let atom_str = parts.next()?;
    match PackageAtom::parse_restriction(atom_str) {
        Ok(atom) => Some((atom, parts.collect())),
        Err(e) => {
            warn!("Skipping invalid {} entry '{}': {}", file, line, e);
            None
        }
    }
}

fn config_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Load package.use from a path (file or directory)
fn load_package_use(path: &Path) -> Result<Vec<PackageUseEntry>> {
    let content = read_config_path(path)?;
    let mut entries = Vec::new();

    for line in config_lines(&content) {
        let Some((atom, flags)) = parse_atom_line(line, "package.use") else {
            continue;
        };
        if flags.is_empty() {
            warn!("Skipping package.use entry without flags: '{}'", line);
            continue;
        }
        entries.push(PackageUseEntry {
            atom,
            flags: UseConfig::parse_use_string(&flags.join(" ")),
        });
    }

    Ok(entries)
}

/// Load package.accept_keywords from a path
fn load_package_keywords(path: &Path) -> Result<Vec<PackageKeywordEntry>> {
    let content = read_config_path(path)?;
    let mut entries = Vec::new();

    for line in config_lines(&content) {
        let Some((atom, keywords)) = parse_atom_line(line, "package.accept_keywords") else {
            continue;
        };
        match KeywordConfig::parse_keywords_string(&keywords.join(" ")) {
            Ok(keywords) => entries.push(PackageKeywordEntry { atom, keywords }),
            Err(e) => warn!("Skipping package.accept_keywords entry '{}': {}", line, e),
        }
    }

    Ok(entries)
}

/// Load package.license from a path
fn load_package_license(path: &Path) -> Result<Vec<PackageLicenseEntry>> {
    let content = read_config_path(path)?;
    let mut entries = Vec::new();

    for line in config_lines(&content) {
        let Some((atom, licenses)) = parse_atom_line(line, "package.license") else {
            continue;
        };
        if licenses.is_empty() {
            warn!("Skipping package.license entry without licenses: '{}'", line);
            continue;
        }
        entries.push(PackageLicenseEntry {
            atom,
            licenses: licenses.iter().map(|s| s.to_string()).collect(),
        });
    }

    Ok(entries)
}

/// Read content from a path (file or directory)
pub fn read_config_path(path: &Path) -> Result<String> {
    if path.is_dir() {
        let mut content = String::new();
        for file_path in config_dir_files(path)? {
            content.push_str(&std::fs::read_to_string(file_path)?);
            content.push('\n');
        }
        Ok(content)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}

/// Regular files of a configuration directory, sorted by name
///
/// Hidden files and editor backups (`name~`) are skipped. Unreadable entries
/// are logged and skipped.
pub fn config_dir_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };

        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            warn!("Skipping non UTF-8 file name in {}", dir.display());
            continue;
        };
        if name.starts_with('.') || name.ends_with('~') {
            debug!("Skipping {}", path.display());
            continue;
        }
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
