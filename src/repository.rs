//! Repository root validation for `--no-config`
//!
//! A repository root is a directory holding `category/package/*.ebuild`
//! trees and, usually, a `profiles/` directory.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

/// Files that identify a repository root, checked in order
pub const REPOSITORY_MARKERS: &[&str] = &["profiles/repo_name", "metadata/layout.conf"];

/// Validate that a path is a usable repository root
///
/// Returns the canonicalized path. A directory without any marker file is
/// still accepted; its name is then taken from the directory name.
pub fn validate_repository(path: &Path) -> Result<PathBuf> {
    let canonical_path = path
        .canonicalize()
        .with_context(|| format!("Failed to resolve repository path: {}", path.display()))?;

    if !canonical_path.is_dir() {
        bail!(
            "Repository path is not a directory: {}",
            canonical_path.display()
        );
    }

    if !REPOSITORY_MARKERS
        .iter()
        .any(|marker| canonical_path.join(marker).is_file())
    {
        tracing::warn!(
            "{} has no {}; using the directory name as repository name",
            canonical_path.display(),
            REPOSITORY_MARKERS.join(" or ")
        );
    }

    Ok(canonical_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("profiles")).unwrap();
        std::fs::write(dir.path().join("profiles/repo_name"), "testrepo\n").unwrap();

        let path = validate_repository(dir.path()).unwrap();
        assert!(path.is_absolute());
        assert!(path.join("profiles/repo_name").is_file());
    }

    #[test]
    fn test_validate_missing() {
        assert!(validate_repository(Path::new("/nonexistent/pkgenv/repo")).is_err());
    }

    #[test]
    fn test_validate_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("not-a-repo");
        std::fs::write(&file, "").unwrap();

        let err = validate_repository(&file).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }
}
