//! External tool invocation
//!
//! The pipeline never spawns processes directly; it hands a
//! [`ToolInvocation`] to a [`ToolRunner`]. [`SystemRunner`] is the real
//! implementation, tests substitute their own.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;

/// A single external command to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Program to execute (resolved path or bare name)
    pub program: PathBuf,
    /// Arguments, in order
    pub args: Vec<OsString>,
    /// Directory the program runs in
    pub current_dir: PathBuf,
}

impl ToolInvocation {
    /// Create an invocation with no arguments
    pub fn new(program: impl Into<PathBuf>, current_dir: &Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: current_dir.to_path_buf(),
        }
    }

    /// Append one argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Program name for messages
    pub fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    /// Shell-like rendering of the full command line
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|part| {
                let part = part.to_string_lossy();
                if part.is_empty() || part.contains(char::is_whitespace) {
                    format!("'{part}'")
                } else {
                    part.into_owned()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whether `needle` appears among the arguments
    pub fn has_arg(&self, needle: &str) -> bool {
        self.args.iter().any(|a| a == needle)
    }

    /// Argument following `flag`, if any
    pub fn arg_after(&self, flag: &str) -> Option<&OsString> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
    }
}

/// Captured result of a finished tool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToolOutput {
    /// Whether the tool reported success
    pub success: bool,
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// A successful run with no output
    pub fn ok() -> Self {
        Self {
            success: true,
            code: Some(0),
            ..Self::default()
        }
    }

    /// A failed run with the given code and stderr
    pub fn failed(code: i32, stderr: &str) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}

impl From<std::process::Output> for ToolOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Something that can run external tools
pub trait ToolRunner: Send + Sync {
    /// Run the invocation to completion and capture its output
    ///
    /// An `Err` means the process could not be started; a tool that ran
    /// and failed is reported through [`ToolOutput::success`].
    fn run<'a>(&'a self, invocation: &'a ToolInvocation)
        -> BoxFuture<'a, std::io::Result<ToolOutput>>;
}

/// Runs tools as child processes of spicebind
///
/// Children are killed if the future running them is dropped, so an
/// interrupted build does not leave a compiler writing into the working
/// directory behind our back.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run<'a>(
        &'a self,
        invocation: &'a ToolInvocation,
    ) -> BoxFuture<'a, std::io::Result<ToolOutput>> {
        async move {
            tracing::debug!("Running: {}", invocation.command_line());
            let output = tokio::process::Command::new(&invocation.program)
                .args(&invocation.args)
                .current_dir(&invocation.current_dir)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output()
                .await?;
            Ok(ToolOutput::from(output))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_quotes_whitespace() {
        let inv = ToolInvocation::new("cc", Path::new("/work"))
            .arg("-c")
            .arg("/my dir/cspice_wrap.c");
        assert_eq!(inv.command_line(), "cc -c '/my dir/cspice_wrap.c'");
    }

    #[test]
    fn test_arg_after_flag() {
        let inv = ToolInvocation::new("swig", Path::new("."))
            .args(["-python", "-o", "cspice_wrap.c", "cspice.i"]);
        assert_eq!(inv.arg_after("-o"), Some(&OsString::from("cspice_wrap.c")));
        assert_eq!(inv.arg_after("cspice.i"), None);
        assert!(inv.has_arg("-python"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_captures_failure() {
        let dir = tempfile::tempdir().unwrap();
        let inv = ToolInvocation::new("sh", dir.path())
            .arg("-c")
            .arg("echo oops >&2; exit 3");

        let output = SystemRunner.run(&inv).await.unwrap();

        assert!(!output.success);
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn test_system_runner_missing_program_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let inv = ToolInvocation::new("spicebind-no-such-tool", dir.path());
        assert!(SystemRunner.run(&inv).await.is_err());
    }
}
