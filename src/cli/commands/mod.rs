//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;
pub mod clean;
pub mod detect;
pub mod doctor;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use crate::config::defaults::{CONFIG_FILE, DEFAULT_PYTHON};
use crate::config::env::{
    ENV_CC, ENV_LINKER, ENV_PYTHON_INCLUDE, ENV_SITE_PACKAGES, ENV_SWIG, ENV_TOOLKIT_DIR,
};
use crate::core::config::{BuildConfig, ConfigFile, ConfigOverrides};
use crate::core::platform::Platform;

/// Options that feed the build configuration
///
/// Each one overrides the matching `spicebind.toml` key.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Directory containing Python.h
    #[arg(long, env = ENV_PYTHON_INCLUDE, value_name = "DIR")]
    pub python_include: Option<PathBuf>,

    /// site-packages directory that holds NumPy
    #[arg(long, env = ENV_SITE_PACKAGES, value_name = "DIR")]
    pub site_packages: Option<PathBuf>,

    /// CSPICE toolkit directory [default: cspice]
    #[arg(long, env = ENV_TOOLKIT_DIR, value_name = "DIR")]
    pub toolkit_dir: Option<PathBuf>,

    /// SWIG interface file [default: cspice.i]
    #[arg(long, value_name = "FILE")]
    pub interface: Option<PathBuf>,

    /// SWIG module name [default: cspice]
    #[arg(long, value_name = "NAME")]
    pub module: Option<String>,

    /// Link for this platform (linux, macos) [default: host]
    #[arg(long)]
    pub platform: Option<Platform>,

    /// Interface generator [default: swig]
    #[arg(long, env = ENV_SWIG, value_name = "PROGRAM")]
    pub swig: Option<String>,

    /// C compiler [default: cc]
    #[arg(long, env = ENV_CC, value_name = "PROGRAM")]
    pub cc: Option<String>,

    /// Linker driver [default: cc]
    #[arg(long, env = ENV_LINKER, value_name = "PROGRAM")]
    pub linker: Option<String>,
}

impl ConfigArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            python_include: self.python_include.clone(),
            site_packages: self.site_packages.clone(),
            toolkit_dir: self.toolkit_dir.clone(),
            interface: self.interface.clone(),
            module: self.module.clone(),
            platform: self.platform,
            swig: self.swig.clone(),
            cc: self.cc.clone(),
            linker: self.linker.clone(),
        }
    }
}

/// Arguments of `spicebind build`
#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Keep the generated wrapper source and object file
    #[arg(long)]
    pub keep_intermediates: bool,

    /// Validate and print the tool invocations without running them
    #[arg(long)]
    pub dry_run: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate, compile and link the extension (default)
    Build(BuildArgs),

    /// Remove intermediate build files
    Clean {
        #[command(flatten)]
        config: ConfigArgs,

        /// Also remove the built extension
        #[arg(long)]
        all: bool,
    },

    /// Check tools and configuration
    Doctor {
        #[command(flatten)]
        config: ConfigArgs,

        /// Python interpreter used by `detect`
        #[arg(long, default_value = DEFAULT_PYTHON)]
        python: String,
    },

    /// Ask a Python interpreter where its headers and NumPy live
    Detect {
        /// Python interpreter to ask
        #[arg(long, default_value = DEFAULT_PYTHON)]
        python: String,

        /// Store the detected paths in the config file
        #[arg(long)]
        write: bool,
    },
}

impl Commands {
    /// Execute the command
    pub async fn run(self, config_path: Option<&Path>) -> Result<()> {
        let work_dir = std::env::current_dir().context("Failed to get current directory")?;
        let config_file = config_file_path(&work_dir, config_path);

        match self {
            Self::Build(args) => {
                let config = load_config(&work_dir, &config_file, config_path, &args.config)?;
                build::execute(&config, &args).await
            }
            Self::Clean { config, all } => {
                let config = load_config(&work_dir, &config_file, config_path, &config)?;
                clean::execute(&config, all).await
            }
            Self::Doctor { config, python } => {
                let config = load_config(&work_dir, &config_file, config_path, &config)?;
                doctor::execute(&config, &python).await
            }
            Self::Detect { python, write } => detect::execute(&config_file, &python, write).await,
        }
    }
}

fn config_file_path(work_dir: &Path, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => work_dir.join(path),
        None => work_dir.join(CONFIG_FILE),
    }
}

/// Merge the config file with command-line and environment overrides
///
/// An explicitly named config file must exist; the default one is optional.
fn load_config(
    work_dir: &Path,
    config_file: &Path,
    explicit: Option<&Path>,
    args: &ConfigArgs,
) -> Result<BuildConfig> {
    if explicit.is_some() && !config_file.exists() {
        bail!("Config file not found: {}", config_file.display());
    }
    let file = ConfigFile::load_or_default(config_file)?;
    Ok(BuildConfig::resolve(work_dir, file, args.overrides()))
}
