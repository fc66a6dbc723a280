//! CLI implementation for `spicebind clean`
//!
//! Removes the glue source, object and staging files of the configured
//! module, and the extension itself with `--all`.

use anyhow::{Context, Result};

use crate::cli::output::{is_json, print_detail, print_json, print_success};
use crate::core::clean::{clean_artifacts, has_build_artifacts};
use crate::core::config::BuildConfig;

/// Execute the clean command
pub async fn execute(config: &BuildConfig, all: bool) -> Result<()> {
    let artifacts = config.artifacts()?;

    if !has_build_artifacts(&artifacts, all) {
        if is_json() {
            print_json(&serde_json::json!({ "status": "success", "removed": [] }))?;
        } else {
            print_success("Nothing to clean");
        }
        return Ok(());
    }

    let result = clean_artifacts(&artifacts, all).with_context(|| "Failed to clean build artifacts")?;

    if is_json() {
        print_json(&serde_json::json!({
            "status": "success",
            "removed": result.removed,
            "skipped": result.skipped,
        }))?;
        return Ok(());
    }

    print_success("Cleaned build artifacts:");
    for file in &result.removed {
        print_detail(&format!("Removed {file}"));
    }
    Ok(())
}
