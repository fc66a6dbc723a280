//! Error types for spicebind
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::pipeline::Stage;

/// A single problem found while validating the build configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Option the issue belongs to (e.g. `python.include`)
    pub option: String,
    /// What is wrong with it
    pub message: String,
}

impl ConfigIssue {
    pub fn new(option: &str, message: impl Into<String>) -> Self {
        Self {
            option: option.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.option, self.message)
    }
}

fn join_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("\n  - {i}"))
        .collect::<String>()
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Config file is not valid TOML for this schema
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Config file could not be serialized
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Unknown platform name
    #[error("Unknown platform '{name}': expected 'linux' or 'macos'")]
    UnknownPlatform { name: String },

    /// One or more options failed validation
    #[error("Invalid build configuration:{}", join_issues(issues))]
    Invalid { issues: Vec<ConfigIssue> },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to remove file
    #[error("Failed to remove file '{path}': {error}")]
    RemoveFile { path: PathBuf, error: String },

    /// Failed to rename file
    #[error("Failed to move '{from}' to '{to}': {error}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },
}

/// Build pipeline errors
#[derive(Error, Debug)]
pub enum BuildError {
    /// The tool could not be started at all
    #[error("[{stage}] failed to run '{program}': {error}")]
    Spawn {
        stage: Stage,
        program: String,
        error: String,
    },

    /// The tool ran and exited unsuccessfully
    #[error("[{stage}] '{program}' {}{}", describe_exit(*code), describe_stderr(stderr))]
    ToolFailed {
        stage: Stage,
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The tool exited successfully without producing its output
    #[error("[{stage}] expected output '{path}' was not produced")]
    MissingOutput { stage: Stage, path: PathBuf },

    /// Interrupted by the operator
    #[error("[{stage}] build cancelled")]
    Cancelled { stage: Stage },

    /// Filesystem error while managing artifacts
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated by a signal".to_string(),
    }
}

fn describe_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(":\n{trimmed}")
    }
}

impl BuildError {
    /// Stage the error originated in, if it is tied to one
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Spawn { stage, .. }
            | Self::ToolFailed { stage, .. }
            | Self::MissingOutput { stage, .. }
            | Self::Cancelled { stage } => Some(*stage),
            Self::Filesystem(_) => None,
        }
    }
}

/// Python interpreter probe errors
#[derive(Error, Debug)]
pub enum DetectError {
    /// Interpreter could not be started
    #[error("Failed to run '{interpreter}': {error}")]
    Spawn { interpreter: String, error: String },

    /// Interpreter ran but the probe script failed
    #[error("'{interpreter}' could not report {what}: {stderr}")]
    ProbeFailed {
        interpreter: String,
        what: String,
        stderr: String,
    },
}
