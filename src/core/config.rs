//! Build configuration
//!
//! Merges command-line flags, environment variables and `spicebind.toml`
//! into a [`BuildConfig`], then validates it into a [`ValidatedConfig`]
//! before any external tool is started.
//!
//! Precedence is flag > environment > file > default. The two Python
//! locations have no default: a build without them is rejected.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::defaults::{
    DEFAULT_CC, DEFAULT_INTERFACE, DEFAULT_LINKER, DEFAULT_MODULE, DEFAULT_SWIG,
    DEFAULT_TOOLKIT_DIR, NUMPY_HEADER, NUMPY_INCLUDE_CANDIDATES, PYTHON_HEADER,
    TOOLKIT_HEADER, TOOLKIT_INCLUDE_SUBDIR, TOOLKIT_LIBRARY,
};
use crate::core::artifacts::{is_valid_module_name, ArtifactSet};
use crate::core::platform::Platform;
use crate::error::{ConfigError, ConfigIssue};

/// `[python]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PythonSection {
    /// Directory containing `Python.h`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<PathBuf>,
    /// site-packages directory NumPy is installed in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_packages: Option<PathBuf>,
}

/// `[toolkit]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolkitSection {
    /// CSPICE distribution directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// `[interface]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InterfaceSection {
    /// SWIG interface-definition file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// SWIG module name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

/// `[tools]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swig: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linker: Option<String>,
}

/// `[build]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    /// Extra flags for the compile step
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cflags: Vec<String>,
    /// Replaces the platform's default link flags when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ldflags: Option<Vec<String>>,
}

/// Contents of `spicebind.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub python: PythonSection,
    pub toolkit: ToolkitSection,
    pub interface: InterfaceSection,
    pub tools: ToolsSection,
    pub build: BuildSection,
}

impl ConfigFile {
    /// Parse a config file from TOML text
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load a config file, treating a missing file as empty
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        tracing::debug!("Loaded config file {}", path.display());
        Self::from_toml(&content, path)
    }

    /// Serialize to TOML text
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub python_include: Option<PathBuf>,
    pub site_packages: Option<PathBuf>,
    pub toolkit_dir: Option<PathBuf>,
    pub interface: Option<PathBuf>,
    pub module: Option<String>,
    pub platform: Option<Platform>,
    pub swig: Option<String>,
    pub cc: Option<String>,
    pub linker: Option<String>,
}

/// Merged, not yet validated configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub work_dir: PathBuf,
    pub python_include: Option<PathBuf>,
    pub site_packages: Option<PathBuf>,
    pub toolkit_dir: PathBuf,
    pub interface: PathBuf,
    pub module: String,
    pub platform: Platform,
    pub swig: String,
    pub cc: String,
    pub linker: String,
    pub cflags: Vec<String>,
    pub ldflags: Option<Vec<String>>,
}

impl BuildConfig {
    /// Merge overrides on top of a config file
    pub fn resolve(work_dir: &Path, file: ConfigFile, overrides: ConfigOverrides) -> Self {
        let relative = |p: PathBuf| if p.is_absolute() { p } else { work_dir.join(p) };

        Self {
            work_dir: work_dir.to_path_buf(),
            python_include: overrides
                .python_include
                .or(file.python.include)
                .map(relative),
            site_packages: overrides
                .site_packages
                .or(file.python.site_packages)
                .map(relative),
            toolkit_dir: relative(
                overrides
                    .toolkit_dir
                    .or(file.toolkit.dir)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_TOOLKIT_DIR)),
            ),
            interface: relative(
                overrides
                    .interface
                    .or(file.interface.file)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_INTERFACE)),
            ),
            module: overrides
                .module
                .or(file.interface.module)
                .unwrap_or_else(|| DEFAULT_MODULE.to_string()),
            platform: overrides
                .platform
                .or(file.build.platform)
                .unwrap_or_else(Platform::host),
            swig: overrides
                .swig
                .or(file.tools.swig)
                .unwrap_or_else(|| DEFAULT_SWIG.to_string()),
            cc: overrides
                .cc
                .or(file.tools.cc)
                .unwrap_or_else(|| DEFAULT_CC.to_string()),
            linker: overrides
                .linker
                .or(file.tools.linker)
                .unwrap_or_else(|| DEFAULT_LINKER.to_string()),
            cflags: file.build.cflags,
            ldflags: file.build.ldflags,
        }
    }

    /// Validate against the filesystem and `PATH`
    pub fn validate(&self) -> Result<ValidatedConfig, ConfigError> {
        self.validate_with(&|tool| which::which(tool).ok())
    }

    /// Validate using a custom tool lookup
    pub fn validate_with(
        &self,
        find_tool: &dyn Fn(&str) -> Option<PathBuf>,
    ) -> Result<ValidatedConfig, ConfigError> {
        let mut issues = Vec::new();

        let python_include = match &self.python_include {
            None => {
                issues.push(ConfigIssue::new(
                    "python.include",
                    "not set (use --python-include, SPICEBIND_PYTHON_INCLUDE or spicebind.toml)",
                ));
                None
            }
            Some(dir) if !dir.is_dir() => {
                issues.push(ConfigIssue::new(
                    "python.include",
                    format!("'{}' is not a directory", dir.display()),
                ));
                None
            }
            Some(dir) if !dir.join(PYTHON_HEADER).is_file() => {
                issues.push(ConfigIssue::new(
                    "python.include",
                    format!("'{}' does not contain {PYTHON_HEADER}", dir.display()),
                ));
                None
            }
            Some(dir) => Some(dir.clone()),
        };

        let numpy_include = match &self.site_packages {
            None => {
                issues.push(ConfigIssue::new(
                    "python.site_packages",
                    "not set (use --site-packages, SPICEBIND_SITE_PACKAGES or spicebind.toml)",
                ));
                None
            }
            Some(dir) if !dir.is_dir() => {
                issues.push(ConfigIssue::new(
                    "python.site_packages",
                    format!("'{}' is not a directory", dir.display()),
                ));
                None
            }
            Some(dir) => {
                let found = find_numpy_include(dir);
                if found.is_none() {
                    issues.push(ConfigIssue::new(
                        "python.site_packages",
                        format!(
                            "no NumPy headers under '{}' (looked in {})",
                            dir.display(),
                            NUMPY_INCLUDE_CANDIDATES.join(", ")
                        ),
                    ));
                }
                found
            }
        };

        if !self.interface.is_file() {
            issues.push(ConfigIssue::new(
                "interface.file",
                format!("'{}' does not exist", self.interface.display()),
            ));
        }

        if let Some(issue) = self.module_issue() {
            issues.push(issue);
        }

        let toolkit_include = self.toolkit_dir.join(TOOLKIT_INCLUDE_SUBDIR);
        let library = self.toolkit_dir.join(TOOLKIT_LIBRARY);
        if self.toolkit_dir.is_dir() {
            if !toolkit_include.join(TOOLKIT_HEADER).is_file() {
                issues.push(ConfigIssue::new(
                    "toolkit.dir",
                    format!(
                        "'{}' does not contain {TOOLKIT_HEADER}",
                        toolkit_include.display()
                    ),
                ));
            }
            if !library.is_file() {
                issues.push(ConfigIssue::new(
                    "toolkit.dir",
                    format!("static library '{}' does not exist", library.display()),
                ));
            }
        } else {
            issues.push(ConfigIssue::new(
                "toolkit.dir",
                format!("'{}' does not exist", self.toolkit_dir.display()),
            ));
        }

        let mut resolve_tool = |option: &str, name: &str| {
            let found = find_tool(name);
            if found.is_none() {
                issues.push(ConfigIssue::new(
                    option,
                    format!("'{name}' not found in PATH"),
                ));
            }
            found
        };
        let swig = resolve_tool("tools.swig", &self.swig);
        let cc = resolve_tool("tools.cc", &self.cc);
        let linker = resolve_tool("tools.linker", &self.linker);

        match (python_include, numpy_include, swig, cc, linker) {
            (Some(python_include), Some(numpy_include), Some(swig), Some(cc), Some(linker))
                if issues.is_empty() =>
            {
                let link_flags = self
                    .ldflags
                    .clone()
                    .unwrap_or_else(|| self.platform.default_link_flags());
                Ok(ValidatedConfig {
                    artifacts: ArtifactSet::new(&self.work_dir, &self.module),
                    work_dir: self.work_dir.clone(),
                    python_include,
                    numpy_include,
                    toolkit_include,
                    library,
                    interface: self.interface.clone(),
                    module: self.module.clone(),
                    platform: self.platform,
                    swig,
                    cc,
                    linker,
                    cflags: self.cflags.clone(),
                    link_flags,
                })
            }
            _ => Err(ConfigError::Invalid { issues }),
        }
    }

    /// Artifact paths of the configured module
    ///
    /// Only needs a usable module name, so commands that merely delete
    /// artifacts work without a complete Python setup.
    pub fn artifacts(&self) -> Result<ArtifactSet, ConfigError> {
        match self.module_issue() {
            Some(issue) => Err(ConfigError::Invalid {
                issues: vec![issue],
            }),
            None => Ok(ArtifactSet::new(&self.work_dir, &self.module)),
        }
    }

    fn module_issue(&self) -> Option<ConfigIssue> {
        (!is_valid_module_name(&self.module)).then(|| {
            ConfigIssue::new(
                "interface.module",
                format!("'{}' is not a valid identifier", self.module),
            )
        })
    }

    /// Validation problems, without failing
    pub fn issues(&self) -> Vec<ConfigIssue> {
        match self.validate() {
            Ok(_) => Vec::new(),
            Err(ConfigError::Invalid { issues }) => issues,
            Err(e) => vec![ConfigIssue::new("config", e.to_string())],
        }
    }
}

/// Locate NumPy's C headers under a site-packages directory
pub fn find_numpy_include(site_packages: &Path) -> Option<PathBuf> {
    NUMPY_INCLUDE_CANDIDATES
        .iter()
        .map(|candidate| site_packages.join(candidate))
        .find(|dir| dir.join(NUMPY_HEADER).is_file())
}

/// Configuration that passed validation; every path in it exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedConfig {
    pub work_dir: PathBuf,
    pub python_include: PathBuf,
    pub numpy_include: PathBuf,
    pub toolkit_include: PathBuf,
    pub library: PathBuf,
    pub interface: PathBuf,
    pub module: String,
    pub platform: Platform,
    pub swig: PathBuf,
    pub cc: PathBuf,
    pub linker: PathBuf,
    pub cflags: Vec<String>,
    pub link_flags: Vec<String>,
    pub artifacts: ArtifactSet,
}
