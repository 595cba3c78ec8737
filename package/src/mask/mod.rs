//! Package masking
//!
//! Computes why a package version is unavailable. Reasons are independent
//! and additive:
//! - `keyword`: none of its KEYWORDS is accepted
//! - `license`: its LICENSE expression is not satisfied
//! - `profile`: a repository profile package.mask entry matches
//! - `user`: a user package.mask entry matches
//!
//! A user package.unmask entry lifts `profile` and `user` masks only.

use crate::environment::Environment;
use crate::types::PackageDatabaseEntry;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

/// Why a package version is masked
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskReason {
    /// No declared keyword is accepted
    Keyword,
    /// The license expression is not accepted
    License,
    /// Masked by the repository profile
    Profile,
    /// Masked by the user's package.mask
    User,
}

impl MaskReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaskReason::Keyword => "keyword",
            MaskReason::License => "license",
            MaskReason::Profile => "profile",
            MaskReason::User => "user",
        }
    }
}

impl fmt::Display for MaskReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A duplicate-free, ordered set of mask reasons
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaskReasons(BTreeSet<MaskReason>);

impl MaskReasons {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reason: MaskReason) {
        self.0.insert(reason);
    }

    pub fn contains(&self, reason: MaskReason) -> bool {
        self.0.contains(&reason)
    }

    /// True when the package version is not masked
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = MaskReason> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<MaskReason> for MaskReasons {
    fn from_iter<I: IntoIterator<Item = MaskReason>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for MaskReasons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|r| r.as_str()).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

/// Compute the mask reasons of a package version in an environment
pub fn mask_reasons<E>(env: &E, pde: &PackageDatabaseEntry) -> Result<MaskReasons>
where
    E: Environment + ?Sized,
{
    let repo = env.package_database().fetch_repository(&pde.repository)?;
    let mut reasons = MaskReasons::new();

    let keywords = repo.keywords(pde);
    let mut keyword_ok = false;
    for keyword in keywords {
        if env.accept_keyword(&keyword.to_string(), Some(pde))? {
            keyword_ok = true;
            break;
        }
    }
    if !keyword_ok {
        reasons.insert(MaskReason::Keyword);
    }

    if let Some(license) = repo.license(pde) {
        let accepted = license.evaluate(
            &|name: &String| env.accept_license(name, Some(pde)),
            &|flag: &str| env.query_use(flag, Some(pde)),
        )?;
        if !accepted {
            reasons.insert(MaskReason::License);
        }
    }

    let pkg = repo.package_ref(pde);
    let user_masks = env.user_masks();
    let unmasked = user_masks.is_unmasked(&pkg);

    if repo.profile_mask(pde).is_some() && !unmasked {
        reasons.insert(MaskReason::Profile);
    }
    if user_masks.find_mask(&pkg).is_some() && !unmasked {
        reasons.insert(MaskReason::User);
    }

    debug!("Mask reasons for {}: {}", pde, reasons);
    Ok(reasons)
}
