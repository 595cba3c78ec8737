//! pkgenv configuration
//!
//! This crate parses the user configuration consulted by the package
//! environment, modelled on Gentoo's make.conf and /etc/portage structure.
//!
//! # Overview
//!
//! - [`version`]: Package version parsing and ordering
//! - [`atom`]: Package atoms (`>=cat/pkg-1.0:slot::repo[use]`)
//! - [`make_conf`]: Global settings (USE, ACCEPT_KEYWORDS, ACCEPT_LICENSE)
//! - [`portage`]: Complete configuration container
//! - [`use_flags`]: USE flag system
//! - [`keywords`]: Keyword acceptance (ACCEPT_KEYWORDS)
//! - [`license`]: License acceptance (ACCEPT_LICENSE) and license groups
//! - [`mask`]: Package masking/unmasking
//! - [`repos`]: Repository configuration (repos.conf)
//! - [`sets`]: User package sets (@world, custom)
//! - [`loader`]: Locating and loading the configuration directory
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pkgenv_config::ConfigLoader;
//!
//! let config = ConfigLoader::from_env().load().unwrap();
//! let keywords = config.keyword_config("amd64").unwrap();
//! println!("accepted: {:?}", keywords.accept_keywords);
//! ```
//!
//! # Configuration Structure
//!
//! ```text
//! ~/.pkgenv/
//! ├── make.conf                 # Global settings (TOML)
//! ├── repos.conf                # Repository configuration
//! ├── package.use               # Per-package USE flags
//! ├── package.accept_keywords   # Per-package keywords
//! ├── package.license           # Per-package licenses
//! ├── package.mask              # Package masks
//! ├── package.unmask            # Package unmasks
//! ├── sets/                     # Custom package sets
//! └── world                     # User-selected packages
//! ```

pub mod atom;
pub mod error;
pub mod keywords;
pub mod license;
pub mod loader;
pub mod make_conf;
pub mod mask;
pub mod portage;
pub mod repos;
pub mod sets;
pub mod use_flags;
pub mod version;

pub use atom::{PackageAtom, PackageRef, UseDep, VersionOp};
pub use error::{ConfigError, Result};
pub use keywords::{detect_arch, Keyword, KeywordConfig, KeywordStability, PackageKeywordEntry};
pub use license::{LicenseConfig, LicenseGroups, PackageLicenseEntry};
pub use loader::ConfigLoader;
pub use make_conf::MakeConf;
pub use mask::{MaskConfig, MaskEntry};
pub use portage::PortageConfig;
pub use repos::{ReposConfig, Repository};
pub use sets::{PackageSet, SetsConfig};
pub use use_flags::{PackageUseEntry, UseConfig, UseFlag};
pub use version::VersionSpec;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ConfigError, ConfigLoader, Keyword, KeywordConfig, LicenseConfig, MakeConf, MaskConfig,
        PackageAtom, PackageRef, PortageConfig, ReposConfig, Result, SetsConfig, UseConfig,
        UseFlag, VersionSpec,
    };
}
