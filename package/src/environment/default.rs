//! The process-wide default environment

use super::Environment;
use crate::accept::AcceptancePolicy;
use crate::db::PackageDatabase;
use crate::repository::Repository;
use crate::use_flags::UseFlagPolicy;
use crate::Result;
use parking_lot::Mutex;
use pkgenv_config::{detect_arch, ConfigLoader, MaskConfig, PortageConfig, SetsConfig};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

static INSTANCE: OnceLock<DefaultEnvironment> = OnceLock::new();
static INIT: Mutex<()> = parking_lot::const_mutex(());

/// The environment built from the user's configuration
///
/// There is exactly one per process. It is created on the first call to
/// [`DefaultEnvironment::instance`] from the configuration directory chosen
/// by [`ConfigLoader::from_env`], and is immutable afterwards.
#[derive(Debug)]
pub struct DefaultEnvironment {
    config_root: PathBuf,
    arch: String,
    db: PackageDatabase,
    use_policy: UseFlagPolicy,
    acceptance: AcceptancePolicy,
    masks: MaskConfig,
    sets: SetsConfig,
}

impl DefaultEnvironment {
    /// The shared instance, created on first use
    ///
    /// If loading the configuration fails the error is returned and the next
    /// call tries again.
    pub fn instance() -> Result<&'static DefaultEnvironment> {
        if let Some(env) = INSTANCE.get() {
            return Ok(env);
        }

        let _guard = INIT.lock();
        if let Some(env) = INSTANCE.get() {
            return Ok(env);
        }

        let env = Self::from_config(ConfigLoader::from_env().load()?)?;
        Ok(INSTANCE.get_or_init(|| env))
    }

    pub(crate) fn from_config(config: PortageConfig) -> Result<Self> {
        let mut builder = PackageDatabase::builder();
        for repo in config.repositories() {
            debug!("Loading repository {} from {}", repo.name, repo.location.display());
            builder = builder.add_repository(Repository::load_named(&repo.location, &repo.name)?)?;
        }
        let db = builder.build();

        let arch = config
            .make_conf
            .arch
            .clone()
            .or_else(|| {
                db.favourite_repository()
                    .and_then(|r| r.arch())
                    .map(String::from)
            })
            .unwrap_or_else(|| detect_arch().to_string());

        let acceptance =
            AcceptancePolicy::new(config.keyword_config(&arch)?, config.license_config());

        info!(
            "Default environment from {} (arch {}, repositories: {})",
            config.config_root.display(),
            arch,
            db.repository_names().join(", ")
        );

        Ok(Self {
            use_policy: UseFlagPolicy::new(config.use_config()),
            acceptance,
            masks: config.package_mask,
            sets: config.sets,
            config_root: config.config_root,
            arch,
            db,
        })
    }

    /// The configuration directory this environment was loaded from
    pub fn config_root(&self) -> &Path {
        &self.config_root
    }

    /// The architecture keyword in effect
    pub fn arch(&self) -> &str {
        &self.arch
    }
}

impl Environment for DefaultEnvironment {
    fn package_database(&self) -> &PackageDatabase {
        &self.db
    }

    fn use_policy(&self) -> &UseFlagPolicy {
        &self.use_policy
    }

    fn acceptance_policy(&self) -> &AcceptancePolicy {
        &self.acceptance
    }

    fn user_masks(&self) -> &MaskConfig {
        &self.masks
    }

    fn user_sets(&self) -> Option<&SetsConfig> {
        Some(&self.sets)
    }
}
