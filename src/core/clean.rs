//! Clean logic
//!
//! Removes the files a build leaves behind: glue source, object and
//! linker staging output, and with `all` the extension itself.

use std::path::Path;

use serde::Serialize;

use crate::core::artifacts::ArtifactSet;
use crate::error::FilesystemError;
use crate::infra::filesystem::remove_file_if_exists;

/// Result of clean operation
#[derive(Debug, Default, Serialize)]
pub struct CleanResult {
    /// Files that were removed
    pub removed: Vec<String>,
    /// Files that didn't exist (skipped)
    pub skipped: Vec<String>,
}

/// Remove build artifacts for one module
///
/// # Arguments
///
/// * `artifacts` - Artifact paths of the module
/// * `all` - Also remove the built extension
pub fn clean_artifacts(artifacts: &ArtifactSet, all: bool) -> Result<CleanResult, FilesystemError> {
    let mut result = CleanResult::default();

    let mut targets: Vec<&Path> = artifacts.transient().to_vec();
    if all {
        targets.push(&artifacts.extension);
    }

    for path in targets {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        if remove_file_if_exists(path)? {
            tracing::info!("Removed {}", path.display());
            result.removed.push(name);
        } else {
            result.skipped.push(name);
        }
    }

    Ok(result)
}

/// Check if any removable artifact exists
pub fn has_build_artifacts(artifacts: &ArtifactSet, all: bool) -> bool {
    artifacts.transient().iter().any(|p| p.exists()) || (all && artifacts.extension.exists())
}
