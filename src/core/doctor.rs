//! Doctor command logic
//!
//! Checks the external tools and the build configuration and reports
//! issues with suggestions.

use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;

use regex::Regex;
use semver::Version;
use serde::Serialize;

use crate::config::defaults::{MIN_SWIG_VERSION, TOOLKIT_HEADER, TOOLKIT_INCLUDE_SUBDIR};
use crate::core::config::BuildConfig;
use crate::error::ConfigIssue;

/// Result of a single dependency check
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    /// Name of the dependency being checked
    pub name: String,
    /// Whether the check passed
    pub passed: bool,
    /// Version if available
    pub version: Option<String>,
    /// Error message if check failed
    pub error: Option<String>,
    /// Suggestion for fixing the issue
    pub suggestion: Option<String>,
    /// Whether this is a required or optional dependency
    pub required: bool,
}

impl CheckResult {
    /// Create a passing check result
    pub fn pass(name: &str, version: Option<String>, required: bool) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            version,
            error: None,
            suggestion: None,
            required,
        }
    }

    /// Create a failing check result
    pub fn fail(name: &str, error: &str, suggestion: Option<&str>, required: bool) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            version: None,
            error: Some(error.to_string()),
            suggestion: suggestion.map(String::from),
            required,
        }
    }
}

/// Overall doctor report
#[derive(Debug, Default, Serialize)]
pub struct DoctorReport {
    /// Individual check results
    pub checks: Vec<CheckResult>,
    /// Configuration issues found
    pub config_issues: Vec<String>,
}

impl DoctorReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_check(&mut self, result: CheckResult) {
        self.checks.push(result);
    }

    pub fn add_config_issue(&mut self, issue: &ConfigIssue) {
        self.config_issues.push(issue.to_string());
    }

    /// Check if all required checks passed and the configuration is usable
    pub fn ready_to_build(&self) -> bool {
        self.checks.iter().filter(|c| c.required).all(|c| c.passed)
            && self.config_issues.is_empty()
    }

    /// Check if all checks passed (including optional)
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed) && self.config_issues.is_empty()
    }

    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    /// Get all failed required checks
    pub fn failed_required(&self) -> Vec<&CheckResult> {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .collect()
    }
}

/// Run `program <version_arg>` and pull a version number out of its output
pub fn tool_version(program: &str, version_arg: &str) -> Option<String> {
    Command::new(program)
        .arg(version_arg)
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                extract_version(&format!("{stdout}{stderr}"))
            } else {
                None
            }
        })
}

/// Extract version string from command output
fn extract_version(output: &str) -> Option<String> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"v?(\d+\.\d+(?:\.\d+)?)").ok())
        .as_ref()?
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Parse a possibly two-component version ("4.1") as semver
fn lenient_version(version: &str) -> Option<Version> {
    Version::parse(version)
        .or_else(|_| Version::parse(&format!("{version}.0")))
        .ok()
}

/// Check whether a reported SWIG version is recent enough
pub fn swig_version_supported(version: &str) -> bool {
    match (lenient_version(version), lenient_version(MIN_SWIG_VERSION)) {
        (Some(found), Some(min)) => found >= min,
        _ => false,
    }
}

/// Check the interface generator
pub fn check_swig(program: &str) -> CheckResult {
    match tool_version(program, "-version") {
        Some(version) if swig_version_supported(&version) => {
            CheckResult::pass("SWIG", Some(version), true)
        }
        Some(version) => CheckResult::fail(
            "SWIG",
            &format!("SWIG {version} is older than {MIN_SWIG_VERSION}"),
            Some("Upgrade SWIG from https://www.swig.org/ or your package manager"),
            true,
        ),
        None => CheckResult::fail(
            "SWIG",
            &format!("'{program}' not found in PATH"),
            Some("Install SWIG from https://www.swig.org/ or set SPICEBIND_SWIG"),
            true,
        ),
    }
}

/// Check a C compiler or linker driver
pub fn check_c_tool(label: &str, program: &str, env_var: &str) -> CheckResult {
    match tool_version(program, "--version") {
        Some(version) => CheckResult::pass(label, Some(version), true),
        None if which::which(program).is_ok() => CheckResult::pass(label, None, true),
        None => CheckResult::fail(
            label,
            &format!("'{program}' not found in PATH"),
            Some(&format!("Install a C toolchain or set {env_var}")),
            true,
        ),
    }
}

/// Check a Python interpreter (optional, only `detect` needs it)
pub fn check_python(program: &str) -> CheckResult {
    match tool_version(program, "--version") {
        Some(version) => CheckResult::pass("Python (detect)", Some(version), false),
        None => CheckResult::fail(
            "Python (detect)",
            &format!("'{program}' not found in PATH"),
            Some("Only needed for 'spicebind detect'; pass --python to use another interpreter"),
            false,
        ),
    }
}

/// Run all checks for a configuration
pub fn run_doctor(config: &BuildConfig, python: &str) -> DoctorReport {
    use crate::config::env::{ENV_CC, ENV_LINKER};

    let mut report = DoctorReport::new();
    report.add_check(check_swig(&config.swig));
    report.add_check(check_c_tool("C compiler", &config.cc, ENV_CC));
    if config.linker != config.cc {
        report.add_check(check_c_tool("Linker", &config.linker, ENV_LINKER));
    }
    report.add_check(check_toolkit(&config.toolkit_dir));
    report.add_check(check_python(python));

    for issue in config.issues() {
        report.add_config_issue(&issue);
    }
    report
}

/// Whether `dir` looks like a CSPICE distribution
///
/// Same rule the build's validation applies to `toolkit.dir`.
pub fn looks_like_toolkit(dir: &Path) -> bool {
    dir.join(TOOLKIT_INCLUDE_SUBDIR)
        .join(TOOLKIT_HEADER)
        .is_file()
}

/// Check the CSPICE toolkit directory
pub fn check_toolkit(dir: &Path) -> CheckResult {
    if looks_like_toolkit(dir) {
        CheckResult::pass("CSPICE toolkit", None, true)
    } else {
        CheckResult::fail(
            "CSPICE toolkit",
            &format!(
                "no {TOOLKIT_INCLUDE_SUBDIR}/{TOOLKIT_HEADER} under '{}'",
                dir.display()
            ),
            Some("Unpack CSPICE from https://naif.jpl.nasa.gov/naif/toolkit_C.html here or symlink it as 'cspice'"),
            true,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_version_from_swig_banner() {
        let banner = "\nSWIG Version 4.1.1\n\nCompiled with g++ [x86_64-pc-linux-gnu]\n";
        assert_eq!(extract_version(banner), Some("4.1.1".to_string()));
    }

    #[test]
    fn test_extract_version_two_components() {
        assert_eq!(
            extract_version("Apple clang version 15.0"),
            Some("15.0".to_string())
        );
        assert_eq!(extract_version("no digits here"), None);
    }

    #[test]
    fn test_swig_version_gate() {
        assert!(swig_version_supported("4.1.1"));
        assert!(swig_version_supported("3.0"));
        assert!(!swig_version_supported("2.0.12"));
        assert!(!swig_version_supported("garbage"));
    }

    #[test]
    fn test_missing_tool_fails_required_check() {
        let result = check_swig("spicebind-no-such-swig");
        assert!(!result.passed);
        assert!(result.required);
        assert!(result.suggestion.is_some());
    }

    #[test]
    fn test_report_readiness() {
        let mut report = DoctorReport::new();
        report.add_check(CheckResult::pass("SWIG", Some("4.1.1".into()), true));
        report.add_check(CheckResult::fail("Python (detect)", "missing", None, false));
        assert!(report.ready_to_build());
        assert!(!report.all_passed());
        assert_eq!(report.passed_count(), 1);

        report.add_config_issue(&ConfigIssue::new("python.include", "not set"));
        assert!(!report.ready_to_build());
    }

    #[test]
    fn test_run_doctor_reports_config_issues() {
        let dir = tempfile::tempdir().unwrap();
        let config = BuildConfig::resolve(
            dir.path(),
            crate::core::config::ConfigFile::default(),
            crate::core::config::ConfigOverrides::default(),
        );

        let report = run_doctor(&config, "spicebind-no-such-python");

        assert!(report
            .config_issues
            .iter()
            .any(|i| i.starts_with("python.include")));
        assert!(!report.ready_to_build());
    }

    #[test]
    fn test_looks_like_toolkit() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!looks_like_toolkit(dir.path()));
        std::fs::create_dir_all(dir.path().join("include")).unwrap();
        std::fs::write(dir.path().join("include/SpiceUsr.h"), "").unwrap();
        assert!(looks_like_toolkit(dir.path()));
    }

    #[test]
    fn test_toolkit_check_agrees_with_validation() {
        let tree = crate::test_utils::fixtures::SpiceTree::new();
        let toolkit = tree.root().join("cspice");
        std::fs::remove_file(toolkit.join("include/SpiceUsr.h")).unwrap();

        let report = run_doctor(&tree.build_config(), "spicebind-no-such-python");

        let check = report
            .checks
            .iter()
            .find(|c| c.name == "CSPICE toolkit")
            .unwrap();
        assert!(!check.passed);
        assert!(report.config_issues.iter().any(|i| i.starts_with("toolkit.dir")));
    }
}
