//! CLI command for `spicebind doctor`
//!
//! Checks external tools and the build configuration and reports issues
//! with suggestions.

use anyhow::Result;

use crate::cli::output::{
    is_json, is_quiet, print_detail, print_info, print_json, print_success, print_warning, status,
};
use crate::core::config::BuildConfig;
use crate::core::doctor::run_doctor;

/// Execute the doctor command
pub async fn execute(config: &BuildConfig, python: &str) -> Result<()> {
    let report = run_doctor(config, python);

    // JSON output mode
    if is_json() {
        let status = if report.all_passed() {
            "success"
        } else if report.ready_to_build() {
            "warning"
        } else {
            "error"
        };
        print_json(&serde_json::json!({
            "status": status,
            "checks": report.checks,
            "config_issues": report.config_issues,
            "passed_count": report.passed_count(),
            "total_count": report.checks.len(),
        }))?;
        if !report.ready_to_build() {
            anyhow::bail!("Not ready to build");
        }
        return Ok(());
    }

    // Quiet mode - only show errors
    if is_quiet() {
        for check in report.failed_required() {
            eprintln!("{} Missing required: {}", status::ERROR, check.name);
        }
        for issue in &report.config_issues {
            eprintln!("{} {issue}", status::ERROR);
        }
        if !report.ready_to_build() {
            anyhow::bail!("Not ready to build");
        }
        return Ok(());
    }

    print_info("Checking tools...");
    println!();

    for check in &report.checks {
        let version_str = check
            .version
            .as_ref()
            .map(|v| format!(" (v{v})"))
            .unwrap_or_default();
        let required_str = if check.required { "" } else { " [optional]" };

        if check.passed {
            println!("  {} {}{version_str}{required_str}", status::SUCCESS, check.name);
        } else {
            println!("  {} {}{required_str}", status::ERROR, check.name);
            if let Some(error) = &check.error {
                print_detail(&format!("Error: {error}"));
            }
            if let Some(suggestion) = &check.suggestion {
                print_detail(&format!("Suggestion: {suggestion}"));
            }
        }
    }

    println!();
    if report.config_issues.is_empty() {
        print_success("Configuration is valid");
    } else {
        print_warning("Configuration issues:");
        for issue in &report.config_issues {
            print_detail(issue);
        }
    }

    println!();
    if report.ready_to_build() {
        print_success(&format!(
            "Ready to build ({}/{} checks passed)",
            report.passed_count(),
            report.checks.len()
        ));
        Ok(())
    } else {
        anyhow::bail!("Not ready to build; fix the issues above")
    }
}
