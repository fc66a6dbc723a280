//! Artifact naming
//!
//! Every file the pipeline creates is named deterministically from the
//! SWIG module name and placed in the working directory.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::config::defaults::STAGING_SUFFIX;

/// Files produced by a build of one SWIG module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    /// Generated glue source (`<module>_wrap.c`)
    pub wrapper_source: PathBuf,
    /// Compiled glue object (`<module>_wrap.o`)
    pub object: PathBuf,
    /// Linker output before it replaces the extension
    pub staging: PathBuf,
    /// Final loadable extension (`_<module>.so`)
    pub extension: PathBuf,
}

impl ArtifactSet {
    /// Compute the artifact paths for `module` inside `work_dir`
    pub fn new(work_dir: &Path, module: &str) -> Self {
        let extension_name = extension_file_name(module);
        Self {
            wrapper_source: work_dir.join(format!("{module}_wrap.c")),
            object: work_dir.join(format!("{module}_wrap.o")),
            staging: work_dir.join(format!("{extension_name}{STAGING_SUFFIX}")),
            extension: work_dir.join(extension_name),
        }
    }

    /// Files that must never outlive a pipeline run
    pub fn transient(&self) -> [&Path; 3] {
        [&self.wrapper_source, &self.object, &self.staging]
    }
}

/// File name Python imports the module's native half from
pub fn extension_file_name(module: &str) -> String {
    format!("_{module}.so")
}

/// Check that a module name is usable as both a C and a Python identifier
pub fn is_valid_module_name(name: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(name))
}
