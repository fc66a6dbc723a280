//! Integration tests for `spicebind clean`
//!
//! Removes intermediates by their expected names; `--all` also removes
//! the extension.

#![cfg(unix)]

mod common;

use assert_fs::prelude::*;
use predicates::prelude::*;

use common::{describe, TestProject};

fn project_with_leftovers() -> (TestProject, assert_fs::fixture::ChildPath) {
    let project = TestProject::new();
    project.create_file("cspice_wrap.c", "glue");
    project.create_file("cspice_wrap.o", "object");
    project.create_file("_cspice.so.partial", "half linked");
    project.create_file("_cspice.so", "extension");
    let work = assert_fs::fixture::ChildPath::new(project.path());
    (project, work)
}

#[test]
fn test_clean_removes_intermediates_only() {
    let (project, work) = project_with_leftovers();

    let output = project.run(&["clean"]);

    assert!(output.status.success(), "{}", describe(&output));
    work.child("cspice_wrap.c").assert(predicate::path::missing());
    work.child("cspice_wrap.o").assert(predicate::path::missing());
    work.child("_cspice.so.partial").assert(predicate::path::missing());
    work.child("_cspice.so").assert("extension");
    work.child("cspice.i").assert(predicate::path::is_file());
    work.child("cspice/lib/cspice.a").assert(predicate::path::is_file());
}

#[test]
fn test_clean_all_removes_extension() {
    let (project, work) = project_with_leftovers();

    let output = project.run(&["clean", "--all"]);

    assert!(output.status.success(), "{}", describe(&output));
    work.child("_cspice.so").assert(predicate::path::missing());
    work.child("cspice/include/SpiceUsr.h").assert(predicate::path::is_file());
}

#[test]
fn test_clean_with_nothing_to_do() {
    let project = TestProject::new();

    let output = project.run(&["clean"]);

    assert!(output.status.success(), "{}", describe(&output));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Nothing to clean"));
}

#[test]
fn test_clean_needs_no_python_configuration() {
    let (project, work) = project_with_leftovers();

    let output = project
        .bare_command()
        .arg("clean")
        .output()
        .expect("Failed to execute spicebind");

    assert!(output.status.success(), "{}", describe(&output));
    work.child("cspice_wrap.o").assert(predicate::path::missing());
}

#[test]
fn test_clean_uses_module_name() {
    let project = TestProject::new();
    let work = assert_fs::fixture::ChildPath::new(project.path());
    project.create_file("spice_wrap.c", "glue");
    project.create_file("cspice_wrap.c", "other module");

    let output = project.run(&["clean", "--module", "spice"]);

    assert!(output.status.success(), "{}", describe(&output));
    work.child("spice_wrap.c").assert(predicate::path::missing());
    work.child("cspice_wrap.c").assert("other module");
}

#[test]
fn test_clean_refuses_module_outside_work_dir() {
    let project = TestProject::new();
    project.create_root_file("victim_wrap.c", "not ours");
    let outside = assert_fs::fixture::ChildPath::new(project.dir.path());

    let output = project.run(&["clean", "--all", "--module", "../victim"]);

    assert_eq!(output.status.code(), Some(1), "{}", describe(&output));
    assert!(String::from_utf8_lossy(&output.stderr).contains("interface.module"));
    outside.child("victim_wrap.c").assert("not ours");
}

#[test]
fn test_clean_json_lists_removed_files() {
    let (project, _work) = project_with_leftovers();

    let output = project.run(&["clean", "--json"]);

    assert!(output.status.success(), "{}", describe(&output));
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    let removed: Vec<&str> = value["removed"]
        .as_array()
        .expect("removed array")
        .iter()
        .filter_map(serde_json::Value::as_str)
        .collect();
    assert_eq!(
        removed,
        vec!["cspice_wrap.c", "cspice_wrap.o", "_cspice.so.partial"]
    );
}
