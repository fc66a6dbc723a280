//! Build command implementation
//!
//! Implements `spicebind build` (also the default command): validates the
//! configuration, then runs the generate/compile/link pipeline.

use std::sync::Mutex;

use anyhow::{Context, Result};
use indicatif::ProgressBar;

use crate::cli::commands::BuildArgs;
use crate::cli::output::{
    create_spinner, is_json, print_detail, print_info, print_json, print_success, print_warning,
};
use crate::core::config::{BuildConfig, ValidatedConfig};
use crate::core::pipeline::{BuildPlan, BuildReport, Pipeline, PipelineOptions};
use crate::infra::process::SystemRunner;

/// Execute the build command
pub async fn execute(config: &BuildConfig, args: &BuildArgs) -> Result<()> {
    let validated = config.validate()?;
    tracing::info!(
        "Building module '{}' for {} in {}",
        validated.module,
        validated.platform,
        validated.work_dir.display()
    );

    if args.dry_run {
        return report_plan(&validated, &BuildPlan::new(&validated));
    }

    let options = PipelineOptions {
        keep_intermediates: args.keep_intermediates,
    };
    let runner = SystemRunner;
    let spinner: Mutex<Option<ProgressBar>> = Mutex::new(None);
    let pipeline = Pipeline::new(&validated, &runner, options).with_observer(|stage| {
        let mut current = spinner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(previous) = current.take() {
            previous.finish_and_clear();
        }
        *current = Some(create_spinner(stage.description()));
    });

    let result = pipeline
        .run_until(async {
            // If the signal handler cannot be installed, never cancel.
            if tokio::signal::ctrl_c().await.is_err() {
                futures::future::pending::<()>().await;
            }
        })
        .await;

    if let Some(last) = spinner
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .take()
    {
        last.finish_and_clear();
    }

    let report = result.with_context(|| format!("Failed to build {}", validated.module))?;
    report_success(&report, args.keep_intermediates)
}

fn report_plan(config: &ValidatedConfig, plan: &BuildPlan) -> Result<()> {
    if is_json() {
        let steps: Vec<_> = plan
            .steps()
            .iter()
            .map(|(stage, invocation)| {
                serde_json::json!({
                    "stage": stage,
                    "command": invocation.command_line(),
                })
            })
            .collect();
        print_json(&serde_json::json!({
            "status": "dry-run",
            "module": config.module,
            "extension": config.artifacts.extension,
            "steps": steps,
        }))?;
        return Ok(());
    }

    print_info(&format!(
        "Dry run: would build {}",
        config.artifacts.extension.display()
    ));
    for (stage, invocation) in plan.steps() {
        // Plain println so the plan is visible even with --quiet
        println!("[{stage}] {}", invocation.command_line());
    }
    Ok(())
}

fn report_success(report: &BuildReport, kept: bool) -> Result<()> {
    if is_json() {
        print_json(&serde_json::json!({
            "status": "success",
            "report": report,
        }))?;
        return Ok(());
    }

    for stage in &report.stages {
        if let Some(diagnostics) = &stage.diagnostics {
            let count = diagnostics.lines().filter(|l| l.contains("warning")).count();
            if count > 0 {
                print_warning(&format!(
                    "[{}] {count} warning(s), rerun with -vv to see them",
                    stage.stage
                ));
            }
        }
    }

    print_success(&format!(
        "Built {} ({} bytes)",
        report.extension.display(),
        report.size
    ));
    print_detail(&format!("sha256: {}", report.sha256));
    if report.replaced_previous {
        print_detail("Replaced the previous build");
    }
    if kept {
        print_detail("Intermediate files were kept (--keep-intermediates)");
    }
    Ok(())
}
