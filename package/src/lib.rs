//! Package environment queries
//!
//! Answers the policy questions a package manager asks about package
//! versions in its repositories.
//!
//! # Architecture
//!
//! - **Repository**: ebuild metadata, profile masks and sets read from disk
//! - **Database**: the ordered set of repositories an environment sees
//! - **Policies**: USE flag states, keyword and license acceptance
//! - **Masking**: the reasons a package version is unavailable
//! - **Sets**: named package sets expanded into dependency trees
//! - **Environment**: the default, configuration-backed environment and the
//!   single-repository environment with no user configuration

pub mod accept;
pub mod db;
pub mod depspec;
pub mod environment;
pub mod error;
pub mod mask;
pub mod repository;
pub mod sets;
pub mod types;
pub mod use_flags;

pub use accept::AcceptancePolicy;
pub use db::{PackageDatabase, PackageDatabaseBuilder};
pub use depspec::{DepAtom, DepTree, LicenseTree};
pub use environment::{DefaultEnvironment, Environment, NoConfigEnvironment, RepositoryRoot};
pub use error::{Error, Result};
pub use mask::{MaskReason, MaskReasons};
pub use repository::{EbuildMetadata, Repository, RepositoryBuilder};
pub use sets::PackageSetResolver;
pub use types::*;
pub use use_flags::UseFlagPolicy;
