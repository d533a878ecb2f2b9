#![allow(deprecated)] // TODO: move from Command::cargo_bin to the cargo_bin_cmd! macro

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// `cloudsweep --demo` with its cache and log inside `dir`.
fn demo(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cloudsweep").unwrap();
    cmd.env_remove("RUST_LOG")
        .arg("--demo")
        .arg("--db")
        .arg(dir.join("demo.db"))
        .arg("--log-file")
        .arg(dir.join("cloudsweep.log"));
    cmd
}

fn scanned() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    demo(dir.path())
        .arg("scan")
        .assert()
        .success()
        .stdout(predicate::str::contains("resources indexed"))
        .stdout(predicate::str::contains("Job Run"));
    dir
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("cloudsweep").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("delete"))
        .stdout(predicate::str::contains("action"))
        .stdout(predicate::str::contains("logs"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("cloudsweep").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cloudsweep"));
}

#[test]
fn test_list_before_scan_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    demo(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No resources"));
}

#[test]
fn test_scan_then_list_and_search() {
    let dir = scanned();

    demo(dir.path())
        .args(["list", "--type", "project"])
        .assert()
        .success()
        .stdout(predicate::str::contains("webshop"))
        .stdout(predicate::str::contains("3 resource(s)"));

    demo(dir.path())
        .args(["list", "--type", "bucket"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown resource type"));

    demo(dir.path())
        .args(["search", "type:container", "project:webshop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ct-fr-par-0"));

    demo(dir.path())
        .args(["show", "ct-fr-par-0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"kind\": \"container\""));
}

#[test]
fn test_delete_needs_confirmation() {
    let dir = scanned();

    demo(dir.path())
        .args(["delete", "ct-fr-par-0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--yes"));
    demo(dir.path()).args(["show", "ct-fr-par-0"]).assert().success();

    demo(dir.path())
        .args(["delete", "ct-fr-par-0", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted"));
    demo(dir.path())
        .args(["show", "ct-fr-par-0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("run a scan first"));
}

#[test]
fn test_demo_logs_and_actions() {
    let dir = scanned();

    demo(dir.path())
        .args(["logs", "fn-fr-par-0-0", "-n", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("shutting down"))
        .stdout(predicate::str::contains("starting").not());

    demo(dir.path())
        .args(["action", "0d3m0000-0000-4000-8000-000000000001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Activate Cockpit"));

    demo(dir.path())
        .args(["action", "0d3m0000-0000-4000-8000-000000000001", "activate cockpit"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--demo"));
}
