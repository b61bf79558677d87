//! Integration tests for `chub build`
//!
//! This module tests:
//! - Default output naming next to the wheel
//! - Appending units to an existing bundle
//! - Scripts, includes, entrypoints and metadata in the config document
//! - Project files as build input and output
//! - Build failures leaving existing outputs untouched, with their exit codes

mod common;

use common::chub_cmd;
use predicates::prelude::*;

#[test]
fn test_build_single_wheel_default_output() {
    let workspace = common::TestWorkspace::new();
    let wheel = workspace.write_wheel("mypackage", "1.0.0");

    chub_cmd()
        .current_dir(&workspace.path)
        .arg("build")
        .arg(&wheel)
        .args(["--resolver", "none"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mypackage-1.0.0"));

    let bundle = workspace.path.join("mypackage-1.0.0.chub");
    assert!(bundle.is_file());

    let entries = workspace.bundle_entries(&bundle);
    assert!(entries.contains(&".chubconfig".to_string()));
    assert!(entries.contains(&"__main__.py".to_string()));
    assert!(entries.contains(&"mypackage-1.0.0/libs/mypackage-1.0.0-py3-none-any.whl".to_string()));
    assert!(!entries.iter().any(|e| e.contains("/scripts/") && !e.ends_with('/')));

    let config = workspace.read_config(&bundle);
    assert!(config.contains("name: mypackage"));
    assert!(config.contains("pre_install_scripts: []"));
    assert!(config.contains("post_install_scripts: []"));
    assert!(config.contains("includes: []"));
}

#[test]
fn test_build_appends_to_existing_bundle() {
    let workspace = common::TestWorkspace::new();
    let first = workspace.write_wheel("alpha", "1.0");
    let second = workspace.write_wheel("beta", "2.0");
    let bundle = workspace.path.join("out").join("suite.chub");

    workspace.build(&first, &bundle, &[]);
    workspace.build(&second, &bundle, &[]);

    let entries = workspace.bundle_entries(&bundle);
    assert!(entries.iter().any(|e| e.starts_with("alpha-1.0/")));
    assert!(entries.iter().any(|e| e.starts_with("beta-2.0/")));

    let config = workspace.read_config(&bundle);
    assert!(config.contains("name: alpha"));
    assert!(config.contains("name: beta"));
    assert!(config.find("name: alpha") < config.find("name: beta"));
}

#[test]
fn test_build_records_scripts_includes_and_metadata() {
    let workspace = common::TestWorkspace::new();
    let wheel = workspace.write_wheel("mypackage", "1.0.0");
    let script = workspace.write_file("post.sh", "#!/bin/sh\nexit 0\n");
    let check = workspace.write_file("check.sh", "#!/bin/sh\nexit 0\n");
    let notes = workspace.write_file("notes.txt", "notes");
    let bundle = workspace.path.join("app.chub");

    workspace.build(
        &wheel,
        &bundle,
        &[
            "--entrypoint",
            "mypackage.cli:main",
            "--scripts",
            script.to_str().unwrap(),
            "--pre-scripts",
            check.to_str().unwrap(),
            "--includes",
            &format!("{}::docs/", notes.display()),
            "--metadata-entry",
            "tags=cli,tools",
        ],
    );

    let entries = workspace.bundle_entries(&bundle);
    assert!(entries.contains(&"mypackage-1.0.0/scripts/post/post.sh".to_string()));
    assert!(entries.contains(&"mypackage-1.0.0/scripts/pre/check.sh".to_string()));
    assert!(entries.contains(&"mypackage-1.0.0/docs/notes.txt".to_string()));

    let config = workspace.read_config(&bundle);
    assert!(config.contains("mypackage.cli:main"));
    assert!(config.contains("pre_install_scripts:\n- check.sh"));
    assert!(config.contains("post_install_scripts:\n- post.sh"));
    assert!(config.contains("- cli"));
    assert!(config.contains("- tools"));
}

#[test]
fn test_rebuilding_same_unit_fails_and_keeps_bundle() {
    let workspace = common::TestWorkspace::new();
    let wheel = workspace.write_wheel("mypackage", "1.0.0");
    let bundle = workspace.path.join("app.chub");
    workspace.build(&wheel, &bundle, &[]);
    let before = std::fs::read(&bundle).unwrap();

    chub_cmd()
        .arg("build")
        .arg(&wheel)
        .arg("--chub")
        .arg(&bundle)
        .args(["--resolver", "none"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));

    assert_eq!(std::fs::read(&bundle).unwrap(), before);
}

#[test]
fn test_build_missing_include_is_plan_error() {
    let workspace = common::TestWorkspace::new();
    let wheel = workspace.write_wheel("mypackage", "1.0.0");
    let bundle = workspace.path.join("app.chub");

    chub_cmd()
        .arg("build")
        .arg(&wheel)
        .arg("--chub")
        .arg(&bundle)
        .args(["--resolver", "none", "-i", "does-not-exist.txt"])
        .assert()
        .code(9)
        .stderr(predicate::str::contains("does-not-exist.txt"));

    assert!(!bundle.exists());
    assert_eq!(workspace.list_dir("."), vec!["mypackage-1.0.0-py3-none-any.whl"]);
}

#[test]
fn test_build_invalid_metadata_entry() {
    let workspace = common::TestWorkspace::new();
    let wheel = workspace.write_wheel("mypackage", "1.0.0");

    chub_cmd()
        .arg("build")
        .arg(&wheel)
        .args(["--resolver", "none", "-m", "novalue"])
        .assert()
        .code(10)
        .stderr(predicate::str::contains("KEY=VALUE"));
}

#[test]
fn test_build_from_project_file() {
    let workspace = common::TestWorkspace::new();
    workspace.write_wheel("mypackage", "1.0.0");
    workspace.write_file("project/check.sh", "#!/bin/sh\n");
    workspace.write_file(
        "project/chubproject.toml",
        "[tool.chub.package]\n\
         wheel = \"../mypackage-1.0.0-py3-none-any.whl\"\n\
         chub = \"../dist/app.chub\"\n\
         entrypoint = \"mypackage.cli:main\"\n\n\
         [tool.chub.package.scripts]\n\
         pre = [\"check.sh\"]\n",
    );

    chub_cmd()
        .current_dir(&workspace.path)
        .arg("build")
        .args(["--chubproject", "project/chubproject.toml"])
        .args(["--resolver", "none", "--quiet"])
        .assert()
        .success();

    let bundle = workspace.path.join("dist").join("app.chub");
    let entries = workspace.bundle_entries(&bundle);
    assert!(entries.contains(&"mypackage-1.0.0/scripts/pre/check.sh".to_string()));
    assert!(workspace.read_config(&bundle).contains("mypackage.cli:main"));
}

#[test]
fn test_build_saves_project_file() {
    let workspace = common::TestWorkspace::new();
    let wheel = workspace.write_wheel("mypackage", "1.0.0");
    let bundle = workspace.path.join("app.chub");

    workspace.build(
        &wheel,
        &bundle,
        &["-e", "mypackage.cli:main", "--chubproject-save", "saved/chubproject.toml"],
    );

    let saved = std::fs::read_to_string(workspace.path.join("saved/chubproject.toml")).unwrap();
    assert!(saved.contains("[tool.chub.package]"));
    assert!(saved.contains("entrypoint = \"mypackage.cli:main\""));
    assert!(saved.contains("mypackage-1.0.0-py3-none-any.whl"));
}

#[test]
fn test_build_without_wheel_is_option_error() {
    let workspace = common::TestWorkspace::new();

    chub_cmd()
        .current_dir(&workspace.path)
        .arg("build")
        .args(["--resolver", "none"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--chubproject"));
}

#[test]
fn test_build_version_with_path_segments_is_plan_error() {
    let workspace = common::TestWorkspace::new();
    let wheel = workspace.write_wheel_named("evil-1.0-py3-none-any.whl", "evil", "../../../pwned");
    let bundle = workspace.path.join("out").join("evil.chub");

    chub_cmd()
        .arg("build")
        .arg(&wheel)
        .arg("--chub")
        .arg(&bundle)
        .args(["--resolver", "none"])
        .assert()
        .code(9)
        .stderr(predicate::str::contains("pwned"));

    assert!(!bundle.exists());
    assert_eq!(workspace.list_dir("."), vec!["evil-1.0-py3-none-any.whl"]);
}

#[test]
fn test_build_output_under_a_file_is_build_error() {
    let workspace = common::TestWorkspace::new();
    let wheel = workspace.write_wheel("mypackage", "1.0.0");
    workspace.write_file("blocker", "not a directory");

    chub_cmd()
        .arg("build")
        .arg(&wheel)
        .arg("--chub")
        .arg(workspace.path.join("blocker").join("app.chub"))
        .args(["--resolver", "none"])
        .assert()
        .code(10)
        .stderr(predicate::str::contains("Error:"));
}
