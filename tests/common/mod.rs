//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests: a
//! temporary binding checkout with a CSPICE toolkit layout, fake Python
//! headers, and shell-script stand-ins for `swig` and `cc`.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// Fake SWIG: copies the interface into the file named by `-o`
const FAKE_SWIG: &str = r#"#!/bin/sh
out=""
iface=""
while [ $# -gt 0 ]; do
  case "$1" in
    -version) echo "SWIG Version 4.1.1"; exit 0 ;;
    -o) out="$2"; shift ;;
    -*) ;;
    *) iface="$1" ;;
  esac
  shift
done
if [ -n "$FAKE_SWIG_FAIL" ]; then
  echo "$(basename "$iface"):1: Error: Syntax error in input(1)." >&2
  exit 1
fi
{ echo "/* wrapper for $(basename "$iface") */"; cat "$iface"; } > "$out"
"#;

/// Fake C compiler/linker: concatenates its inputs into `-o`
const FAKE_CC: &str = r#"#!/bin/sh
mode=link
out=""
inputs=""
while [ $# -gt 0 ]; do
  case "$1" in
    --version) echo "cc (fake) 12.2.0"; exit 0 ;;
    -c) mode=compile ;;
    -o) out="$2"; shift ;;
    -undefined) shift ;;
    -*) ;;
    *) inputs="$inputs $1" ;;
  esac
  shift
done
if [ "$mode" = compile ]; then
  if [ -n "$FAKE_CC_FAIL_COMPILE" ]; then
    echo "cspice_wrap.c:10:10: fatal error: Python.h: No such file or directory" >&2
    exit 1
  fi
  echo "cspice_wrap.c:42:1: warning: unused variable 'resultobj'" >&2
else
  if [ -n "$FAKE_CC_FAIL_LINK" ]; then
    echo "undefined reference to 'tkvrsn_c'" >&2
    exit 1
  fi
fi
cat $inputs > "$out"
"#;

/// Fake Python used by `detect`
const FAKE_PYTHON: &str = r#"#!/bin/sh
if [ "$1" = "--version" ]; then echo "Python 3.11.4"; exit 0; fi
here="$(cd "$(dirname "$0")/.." && pwd)"
case "$2" in
  *include*) echo "$here/python/include" ;;
  *numpy*) echo "$here/python/site-packages" ;;
  *) echo "$here/python/site-packages" ;;
esac
"#;

/// Environment variables spicebind reads; cleared so the host cannot leak in
const SPICEBIND_ENV: &[&str] = &[
    "SPICEBIND_PYTHON_INCLUDE",
    "SPICEBIND_SITE_PACKAGES",
    "SPICEBIND_TOOLKIT_DIR",
    "SPICEBIND_SWIG",
    "SPICEBIND_CC",
    "SPICEBIND_LINKER",
    "RUST_LOG",
];

/// Test project context
///
/// `work` is the directory spicebind runs in; fake tools and Python
/// headers live next to it so they never show up in directory listings.
pub struct TestProject {
    /// Temporary root holding `work/`, `bin/` and `python/`
    pub dir: TempDir,
}

impl TestProject {
    /// Create a complete, buildable project
    pub fn new() -> Self {
        let project = Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        };
        project.create_file("cspice.i", "%module cspice\n%{\n#include \"SpiceUsr.h\"\n%}\n");
        project.create_file("cspice/include/SpiceUsr.h", "/* CSPICE */\n");
        project.create_file("cspice/lib/cspice.a", "!<arch>\ncspice objects\n");
        project.create_root_file("python/include/Python.h", "");
        project.create_root_file(
            "python/site-packages/numpy/core/include/numpy/arrayobject.h",
            "",
        );
        project.create_script("bin/swig", FAKE_SWIG);
        project.create_script("bin/cc", FAKE_CC);
        project.create_script("bin/python3", FAKE_PYTHON);
        project
    }

    /// Working directory spicebind runs in
    pub fn path(&self) -> PathBuf {
        self.dir.path().join("work")
    }

    pub fn python_include(&self) -> PathBuf {
        self.dir.path().join("python/include")
    }

    pub fn site_packages(&self) -> PathBuf {
        self.dir.path().join("python/site-packages")
    }

    pub fn tool(&self, name: &str) -> PathBuf {
        self.dir.path().join("bin").join(name)
    }

    /// Create a file in the working directory
    pub fn create_file(&self, name: &str, content: &str) {
        write_all(&self.path().join(name), content);
    }

    /// Create a file outside the working directory
    pub fn create_root_file(&self, name: &str, content: &str) {
        write_all(&self.dir.path().join(name), content);
    }

    fn create_script(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        write_all(&path, content);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to make script executable");
    }

    /// Check if a file exists in the working directory
    pub fn file_exists(&self, name: &str) -> bool {
        self.path().join(name).exists()
    }

    /// Read a file from the working directory
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.path().join(name)).expect("Failed to read file")
    }

    pub fn read_bytes(&self, name: &str) -> Vec<u8> {
        std::fs::read(self.path().join(name)).expect("Failed to read file")
    }

    pub fn remove_file(&self, name: &str) {
        std::fs::remove_file(self.path().join(name)).expect("Failed to remove file");
    }

    /// Every file under the working directory, relative to it
    pub fn files(&self) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        collect_files(&self.path(), &self.path(), &mut found);
        found
    }

    /// A spicebind command with the fake toolchain and Python paths set
    pub fn command(&self) -> Command {
        let mut cmd = self.bare_command();
        cmd.env("SPICEBIND_SWIG", self.tool("swig"))
            .env("SPICEBIND_CC", self.tool("cc"))
            .env("SPICEBIND_LINKER", self.tool("cc"))
            .env("SPICEBIND_PYTHON_INCLUDE", self.python_include())
            .env("SPICEBIND_SITE_PACKAGES", self.site_packages());
        cmd
    }

    /// A spicebind command with no spicebind configuration in the environment
    pub fn bare_command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_spicebind"));
        cmd.current_dir(self.path());
        for var in SPICEBIND_ENV {
            cmd.env_remove(var);
        }
        cmd
    }

    /// Run spicebind with the fake toolchain
    pub fn run(&self, args: &[&str]) -> Output {
        self.command()
            .args(args)
            .output()
            .expect("Failed to execute spicebind")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

fn write_all(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directories");
    }
    std::fs::write(path, content).expect("Failed to write file");
}

fn collect_files(root: &Path, dir: &Path, found: &mut BTreeSet<String>) {
    for entry in std::fs::read_dir(dir).expect("Failed to read directory").flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, &path, found);
        } else if let Ok(relative) = path.strip_prefix(root) {
            found.insert(relative.display().to_string());
        }
    }
}

/// Render output for assertion messages
pub fn describe(output: &Output) -> String {
    format!(
        "status={:?}\nstdout={}\nstderr={}",
        output.status.code(),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}
