//! Test utilities
//!
//! Proptest generators and on-disk fixtures shared by unit tests.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;

    /// Generate a valid SWIG module name
    pub fn module_name() -> impl Strategy<Value = String> {
        "[a-z_][a-z0-9_]{0,20}"
    }
}

#[cfg(test)]
pub mod fixtures {
    use std::path::{Path, PathBuf};

    use tempfile::TempDir;

    use crate::core::config::{BuildConfig, ConfigFile, ConfigOverrides};

    /// A working directory laid out like a CSPICE binding checkout
    ///
    /// Contains `cspice.i`, a `cspice/` toolkit with headers and a static
    /// library, and a fake Python prefix with `Python.h` and NumPy headers.
    pub struct SpiceTree {
        dir: TempDir,
    }

    impl SpiceTree {
        pub fn new() -> Self {
            let dir = TempDir::new().expect("Failed to create temp directory");
            let tree = Self { dir };
            tree.write("cspice.i", "%module cspice\n");
            tree.write("cspice/include/SpiceUsr.h", "");
            tree.write("cspice/lib/cspice.a", "!<arch>\n");
            tree.write("python/include/Python.h", "");
            tree.write(
                "python/site-packages/numpy/core/include/numpy/arrayobject.h",
                "",
            );
            tree
        }

        pub fn root(&self) -> &Path {
            self.dir.path()
        }

        pub fn python_include(&self) -> PathBuf {
            self.root().join("python/include")
        }

        pub fn site_packages(&self) -> PathBuf {
            self.root().join("python/site-packages")
        }

        pub fn write(&self, name: &str, content: &str) {
            let path = self.root().join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).expect("Failed to create parent directories");
            }
            std::fs::write(path, content).expect("Failed to write file");
        }

        /// Configuration pointing at this tree
        pub fn build_config(&self) -> BuildConfig {
            let overrides = ConfigOverrides {
                python_include: Some(self.python_include()),
                site_packages: Some(self.site_packages()),
                ..ConfigOverrides::default()
            };
            BuildConfig::resolve(self.root(), ConfigFile::default(), overrides)
        }
    }
}
