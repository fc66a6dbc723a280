//! Python interpreter probing
//!
//! Asks an interpreter where its C headers and site-packages live so the
//! operator does not have to look them up by hand.

use std::path::PathBuf;
use std::process::Command;

use serde::Serialize;

use crate::error::DetectError;

const INCLUDE_PROBE: &str = "import sysconfig; print(sysconfig.get_paths()['include'])";
const SITE_PACKAGES_PROBE: &str = "import sysconfig; print(sysconfig.get_paths()['platlib'])";
const NUMPY_PROBE: &str = "import numpy, os; print(os.path.dirname(os.path.dirname(numpy.__file__)))";

/// Locations reported by an interpreter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PythonPaths {
    /// Interpreter that was asked
    pub interpreter: String,
    /// Directory containing `Python.h`
    pub include: PathBuf,
    /// site-packages directory holding NumPy
    pub site_packages: PathBuf,
}

/// Probe `interpreter` for its include directory and NumPy's site-packages
///
/// NumPy's own location wins over the interpreter's default platlib so
/// that user or virtualenv installs are picked up.
pub fn probe(interpreter: &str) -> Result<PythonPaths, DetectError> {
    let include = run_probe(interpreter, INCLUDE_PROBE, "its include directory")?;
    let site_packages = match run_probe(interpreter, NUMPY_PROBE, "the NumPy location") {
        Ok(dir) => dir,
        Err(DetectError::ProbeFailed { stderr, .. }) => {
            tracing::warn!("NumPy not importable with {interpreter}: {stderr}");
            run_probe(interpreter, SITE_PACKAGES_PROBE, "its site-packages directory")?
        }
        Err(e) => return Err(e),
    };

    Ok(PythonPaths {
        interpreter: interpreter.to_string(),
        include: PathBuf::from(include),
        site_packages: PathBuf::from(site_packages),
    })
}

fn run_probe(interpreter: &str, script: &str, what: &str) -> Result<String, DetectError> {
    tracing::debug!("Probing {interpreter} for {what}");
    let output = Command::new(interpreter)
        .arg("-c")
        .arg(script)
        .output()
        .map_err(|e| DetectError::Spawn {
            interpreter: interpreter.to_string(),
            error: e.to_string(),
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let value = stdout.lines().next().unwrap_or_default().trim();
    if !output.status.success() || value.is_empty() {
        return Err(DetectError::ProbeFailed {
            interpreter: interpreter.to_string(),
            what: what.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_missing_interpreter() {
        let err = probe("spicebind-no-such-python").unwrap_err();
        assert!(matches!(err, DetectError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_probe_with_fake_interpreter() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("python3");
        std::fs::write(
            &fake,
            "#!/bin/sh\ncase \"$2\" in\n  *include*) echo /opt/py/include/python3.12 ;;\n  *numpy*) echo /opt/py/site-packages ;;\nesac\n",
        )
        .unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        let paths = probe(fake.to_str().unwrap()).unwrap();

        assert_eq!(paths.include, PathBuf::from("/opt/py/include/python3.12"));
        assert_eq!(paths.site_packages, PathBuf::from("/opt/py/site-packages"));
    }
}
