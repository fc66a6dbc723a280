//! Build pipeline
//!
//! Turns a [`ValidatedConfig`] into a loadable extension by running the
//! interface generator, the compiler and the linker in sequence.
//!
//! Guarantees:
//! - the first failing stage aborts the run and its diagnostic is returned
//! - glue source, object and staging files are removed on every exit path,
//!   including a dropped (cancelled) run
//! - a previously built extension is only replaced once the new one has
//!   been linked successfully

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use serde::{Serialize, Serializer};

use crate::core::config::ValidatedConfig;
use crate::error::{BuildError, FilesystemError};
use crate::infra::filesystem::{remove_file_if_exists, replace_file, sha256_file};
use crate::infra::process::{ToolInvocation, ToolOutput, ToolRunner};

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Remove leftovers from an earlier run
    CleanBefore,
    /// Run the interface generator
    Generate,
    /// Compile the generated glue
    Compile,
    /// Remove a stale linker staging file
    CleanStaleOutput,
    /// Link object and static library into the staging file
    Link,
    /// Move the staging file onto the extension
    Install,
    /// Remove glue source and object
    CleanAfter,
}

impl Stage {
    /// All stages in the order they run
    pub const ALL: [Stage; 7] = [
        Stage::CleanBefore,
        Stage::Generate,
        Stage::Compile,
        Stage::CleanStaleOutput,
        Stage::Link,
        Stage::Install,
        Stage::CleanAfter,
    ];

    /// Stable kebab-case name
    pub fn name(self) -> &'static str {
        match self {
            Self::CleanBefore => "clean-before",
            Self::Generate => "generate",
            Self::Compile => "compile",
            Self::CleanStaleOutput => "clean-stale-output",
            Self::Link => "link",
            Self::Install => "install",
            Self::CleanAfter => "clean-after",
        }
    }

    /// Short progress message
    pub fn description(self) -> &'static str {
        match self {
            Self::CleanBefore => "Removing stale intermediates",
            Self::Generate => "Generating wrapper with SWIG",
            Self::Compile => "Compiling wrapper",
            Self::CleanStaleOutput => "Removing stale link output",
            Self::Link => "Linking extension",
            Self::Install => "Installing extension",
            Self::CleanAfter => "Removing intermediates",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Stage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// The three tool invocations of a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    pub generate: ToolInvocation,
    pub compile: ToolInvocation,
    pub link: ToolInvocation,
}

impl BuildPlan {
    /// Derive the invocations from a validated configuration
    pub fn new(config: &ValidatedConfig) -> Self {
        let artifacts = &config.artifacts;
        let work_dir = &config.work_dir;

        let generate = ToolInvocation::new(&config.swig, work_dir)
            .arg("-python")
            .arg(include_flag(&config.toolkit_include))
            .arg("-o")
            .arg(&artifacts.wrapper_source)
            .arg(&config.interface);

        let mut compile = ToolInvocation::new(&config.cc, work_dir).arg("-c");
        if config.platform.needs_pic() {
            compile = compile.arg("-fPIC");
        }
        let compile = compile
            .args(&config.cflags)
            .arg(include_flag(&config.python_include))
            .arg(include_flag(&config.numpy_include))
            .arg(include_flag(&config.toolkit_include))
            .arg(&artifacts.wrapper_source)
            .arg("-o")
            .arg(&artifacts.object);

        let link = ToolInvocation::new(&config.linker, work_dir)
            .args(&config.link_flags)
            .arg("-o")
            .arg(&artifacts.staging)
            .arg(&artifacts.object)
            .arg(&config.library)
            .args(config.platform.trailing_libs());

        Self {
            generate,
            compile,
            link,
        }
    }

    /// Tool stages paired with their invocation
    pub fn steps(&self) -> [(Stage, &ToolInvocation); 3] {
        [
            (Stage::Generate, &self.generate),
            (Stage::Compile, &self.compile),
            (Stage::Link, &self.link),
        ]
    }
}

fn include_flag(dir: &Path) -> String {
    format!("-I{}", dir.display())
}

/// Tuning knobs for a run
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    /// Leave glue source and object in place after the run
    pub keep_intermediates: bool,
}

/// What happened in one stage
#[derive(Debug, Clone, Serialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub duration_ms: u64,
    /// Tool stderr on a successful run (compiler warnings)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
}

/// Outcome of a successful build
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub module: String,
    pub extension: PathBuf,
    pub size: u64,
    pub sha256: String,
    /// Whether an earlier extension was replaced
    pub replaced_previous: bool,
    pub stages: Vec<StageRecord>,
}

/// Removes transient artifacts when dropped
///
/// Armed for the whole run; a dropped pipeline future therefore cleans up
/// just like a failed one.
struct TransientGuard {
    paths: Vec<PathBuf>,
}

impl TransientGuard {
    fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// Remove everything now, reporting the first failure
    fn finish(mut self) -> Result<(), BuildError> {
        for path in std::mem::take(&mut self.paths) {
            if remove_file_if_exists(&path)? {
                tracing::debug!("Removed {}", path.display());
            }
        }
        Ok(())
    }
}

impl Drop for TransientGuard {
    fn drop(&mut self) {
        for path in &self.paths {
            match remove_file_if_exists(path) {
                Ok(true) => tracing::debug!("Removed {}", path.display()),
                Ok(false) => {}
                Err(e) => tracing::warn!("{e}"),
            }
        }
    }
}

/// Sequential build of one extension
pub struct Pipeline<'a, R: ToolRunner> {
    config: &'a ValidatedConfig,
    runner: &'a R,
    options: PipelineOptions,
    plan: BuildPlan,
    current: Mutex<Stage>,
    observer: Option<Box<dyn Fn(Stage) + Send + Sync + 'a>>,
}

impl<'a, R: ToolRunner> Pipeline<'a, R> {
    pub fn new(config: &'a ValidatedConfig, runner: &'a R, options: PipelineOptions) -> Self {
        Self {
            config,
            runner,
            options,
            plan: BuildPlan::new(config),
            current: Mutex::new(Stage::CleanBefore),
            observer: None,
        }
    }

    /// Call `observer` as each stage starts
    #[must_use]
    pub fn with_observer(mut self, observer: impl Fn(Stage) + Send + Sync + 'a) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn plan(&self) -> &BuildPlan {
        &self.plan
    }

    /// Stage currently running (or the last one that ran)
    pub fn current_stage(&self) -> Stage {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run the pipeline, abandoning it if `cancel` completes first
    ///
    /// Abandoning drops the running tool (killing the child) and the
    /// cleanup guard, so intermediates are removed on cancellation too.
    pub async fn run_until<F>(&self, cancel: F) -> Result<BuildReport, BuildError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            result = self.run() => result,
            () = cancel => {
                let stage = self.current_stage();
                tracing::warn!("Build cancelled during {stage}");
                Err(BuildError::Cancelled { stage })
            }
        }
    }

    /// Run every stage in order
    pub async fn run(&self) -> Result<BuildReport, BuildError> {
        let artifacts = &self.config.artifacts;
        let mut stages = Vec::with_capacity(Stage::ALL.len());

        let guarded = if self.options.keep_intermediates {
            vec![artifacts.staging.clone()]
        } else {
            artifacts.transient().iter().map(|p| p.to_path_buf()).collect()
        };
        let guard = TransientGuard::new(guarded);

        let started = self.begin(Stage::CleanBefore);
        for path in artifacts.transient() {
            if remove_file_if_exists(path)? {
                tracing::info!("Removed stale {}", path.display());
            }
        }
        stages.push(record(Stage::CleanBefore, started, None));

        for (stage, invocation, expected) in [
            (Stage::Generate, &self.plan.generate, &artifacts.wrapper_source),
            (Stage::Compile, &self.plan.compile, &artifacts.object),
        ] {
            let started = self.begin(stage);
            let output = self.invoke(stage, invocation, expected).await?;
            stages.push(record(stage, started, warnings(stage, &output)));
        }

        let started = self.begin(Stage::CleanStaleOutput);
        remove_file_if_exists(&artifacts.staging)?;
        stages.push(record(Stage::CleanStaleOutput, started, None));

        let started = self.begin(Stage::Link);
        let output = self
            .invoke(Stage::Link, &self.plan.link, &artifacts.staging)
            .await?;
        stages.push(record(Stage::Link, started, warnings(Stage::Link, &output)));

        let started = self.begin(Stage::Install);
        let replaced_previous = artifacts.extension.exists();
        replace_file(&artifacts.staging, &artifacts.extension)?;
        stages.push(record(Stage::Install, started, None));

        let started = self.begin(Stage::CleanAfter);
        guard.finish()?;
        stages.push(record(Stage::CleanAfter, started, None));

        let size = std::fs::metadata(&artifacts.extension)
            .map(|m| m.len())
            .map_err(|e| FilesystemError::ReadFile {
                path: artifacts.extension.clone(),
                error: e.to_string(),
            })?;
        let sha256 = sha256_file(&artifacts.extension)?;
        tracing::info!(
            "Built {} ({size} bytes, sha256 {sha256})",
            artifacts.extension.display()
        );

        Ok(BuildReport {
            module: self.config.module.clone(),
            extension: artifacts.extension.clone(),
            size,
            sha256,
            replaced_previous,
            stages,
        })
    }

    fn begin(&self, stage: Stage) -> Instant {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = stage;
        tracing::info!("[{stage}] {}", stage.description());
        if let Some(observer) = &self.observer {
            observer(stage);
        }
        Instant::now()
    }

    async fn invoke(
        &self,
        stage: Stage,
        invocation: &ToolInvocation,
        expected: &Path,
    ) -> Result<ToolOutput, BuildError> {
        tracing::debug!("[{stage}] {}", invocation.command_line());
        let output = self
            .runner
            .run(invocation)
            .await
            .map_err(|e| BuildError::Spawn {
                stage,
                program: invocation.program_name(),
                error: e.to_string(),
            })?;

        if !output.success {
            let stderr = if output.stderr.trim().is_empty() {
                output.stdout.clone()
            } else {
                output.stderr.clone()
            };
            return Err(BuildError::ToolFailed {
                stage,
                program: invocation.program_name(),
                code: output.code,
                stderr,
            });
        }

        if !expected.is_file() {
            return Err(BuildError::MissingOutput {
                stage,
                path: expected.to_path_buf(),
            });
        }

        Ok(output)
    }
}

fn record(stage: Stage, started: Instant, diagnostics: Option<String>) -> StageRecord {
    StageRecord {
        stage,
        duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        diagnostics,
    }
}

/// Tolerated stderr of a successful tool
///
/// SWIG glue routinely compiles with hundreds of warnings, so the text
/// itself is only logged at debug level.
fn warnings(stage: Stage, output: &ToolOutput) -> Option<String> {
    let stderr = output.stderr.trim();
    if stderr.is_empty() {
        return None;
    }
    tracing::info!("[{stage}] tool succeeded with {} diagnostic line(s)", stderr.lines().count());
    tracing::debug!("[{stage}] diagnostics:\n{stderr}");
    Some(stderr.to_string())
}
