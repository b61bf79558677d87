//! CLI surface tests: help, version and completions

mod common;

use common::chub_cmd;
use predicates::prelude::*;

#[test]
fn test_help_lists_commands() {
    chub_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_version_command() {
    chub_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "chub {}",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn test_version_flag() {
    chub_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_run_help_mentions_flags() {
    chub_cmd()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--unpack"))
        .stdout(predicate::str::contains("--only-deps"))
        .stdout(predicate::str::contains("--venv"));
}

#[test]
fn test_completions_bash() {
    chub_cmd()
        .args(["completions", "--shell", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("chub"));
}

#[test]
fn test_completions_unknown_shell() {
    chub_cmd()
        .args(["completions", "--shell", "tcsh"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown shell"));
}

#[test]
fn test_unknown_resolver_is_rejected_by_parser() {
    chub_cmd()
        .args(["build", "app.whl", "--resolver", "conda"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("conda"));
}
