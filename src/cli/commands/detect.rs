//! CLI command for `spicebind detect`
//!
//! Asks a Python interpreter for its include directory and NumPy's
//! site-packages, and optionally records them in the config file.

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::output::{is_json, print_detail, print_info, print_json, print_success, print_warning};
use crate::config::defaults::{NUMPY_INCLUDE_CANDIDATES, PYTHON_HEADER};
use crate::core::config::{find_numpy_include, ConfigFile};
use crate::infra::filesystem::write_file;
use crate::infra::python::probe;

/// Execute the detect command
pub async fn execute(config_file: &Path, python: &str, write: bool) -> Result<()> {
    let paths = probe(python).with_context(|| format!("Failed to query {python}"))?;

    let has_header = paths.include.join(PYTHON_HEADER).is_file();
    let numpy_include = find_numpy_include(&paths.site_packages);

    if write {
        let mut file = ConfigFile::load_or_default(config_file)?;
        file.python.include = Some(paths.include.clone());
        file.python.site_packages = Some(paths.site_packages.clone());
        write_file(config_file, &file.to_toml()?)?;
        tracing::info!("Wrote {}", config_file.display());
    }

    if is_json() {
        print_json(&serde_json::json!({
            "status": "success",
            "paths": paths,
            "python_header_found": has_header,
            "numpy_include": numpy_include,
            "written": write.then(|| config_file.display().to_string()),
        }))?;
        return Ok(());
    }

    print_info(&format!("Detected with {}:", paths.interpreter));
    print_detail(&format!("python.include       = {}", paths.include.display()));
    print_detail(&format!("python.site_packages = {}", paths.site_packages.display()));

    if !has_header {
        print_warning(&format!(
            "{PYTHON_HEADER} is missing from {}; install the Python development headers",
            paths.include.display()
        ));
    }
    if numpy_include.is_none() {
        print_warning(&format!(
            "No NumPy headers under {} (looked in {})",
            paths.site_packages.display(),
            NUMPY_INCLUDE_CANDIDATES.join(", ")
        ));
    }

    if write {
        print_success(&format!("Saved to {}", config_file.display()));
    } else {
        print_detail("Run with --write to save these to the config file");
    }
    Ok(())
}
