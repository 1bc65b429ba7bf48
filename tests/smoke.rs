//! Smoke tests -- verify the binary runs and key subcommands exist.

use assert_cmd::Command;

#[test]
fn test_cli_help() {
    Command::cargo_bin("procwatch")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains(
            "Process monitoring, anomaly scoring",
        ));
}

#[test]
fn test_cli_version() {
    Command::cargo_bin("procwatch")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicates::str::contains("procwatch"));
}

#[test]
fn test_snapshot_subcommand_exists() {
    Command::cargo_bin("procwatch")
        .unwrap()
        .args(["snapshot", "--help"])
        .assert()
        .success();
}

#[test]
fn test_forecast_subcommand_exists() {
    Command::cargo_bin("procwatch")
        .unwrap()
        .args(["forecast", "--help"])
        .assert()
        .success();
}

#[test]
fn test_classify_subcommand_exists() {
    Command::cargo_bin("procwatch")
        .unwrap()
        .args(["classify", "--help"])
        .assert()
        .success();
}

#[test]
fn test_snapshot_runs() {
    Command::cargo_bin("procwatch")
        .unwrap()
        .args(["snapshot", "--json"])
        .assert()
        .success()
        .stdout(predicates::str::contains("pid"));
}
