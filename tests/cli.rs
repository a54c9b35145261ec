// ABOUTME: Integration tests for the deckhand CLI binary.
// ABOUTME: Validates --help output and commands against a scripted deploy CLI.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

fn deckhand_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("deckhand"))
}

#[cfg(unix)]
fn fake_cli(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("ship");
    fs::write(
        &path,
        r#"#!/bin/sh
case "$1" in
  list) echo '[{"name":"app","status":"live","public_url":"https://app.example.dev","tunnel_active":true}]' ;;
  status)
    if [ "$2" = "--json" ]; then
      echo '{"projects":[{"name":"app","status":"live","framework":"vite"}]}'
    else
      echo '{"name":"app","status":"live","tunnel_active":true,"deploys":[]}'
    fi ;;
  whoami) echo '{"logged_in":true,"email":"dev@example.com"}' ;;
  version) echo 'ship 1.2.3' ;;
  logs) echo "hello from $2" ;;
  *) echo "unknown $1" >&2; exit 2 ;;
esac
"#,
    )
    .unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[test]
fn help_shows_commands() {
    let output = deckhand_cmd().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in [
        "deploy",
        "init",
        "link",
        "refresh",
        "open-url",
        "logs",
        "stop",
        "restart",
        "destroy",
        "login",
        "logout",
        "dashboard",
        "install-cli",
    ] {
        assert!(stdout.contains(command), "help is missing {command}");
    }
}

#[test]
fn quiet_and_json_conflict() {
    deckhand_cmd()
        .args(["--quiet", "--json", "refresh"])
        .assert()
        .failure();
}

#[test]
fn deploy_without_workspace_fails() {
    deckhand_cmd()
        .args(["--workspace", "/nonexistent/deckhand-workspace", "deploy"])
        .env("DECKHAND_CLI", "/nonexistent/ship-cli")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Open a project folder"));
}

#[test]
fn deploy_without_cli_explains_install() {
    let temp_dir = tempfile::tempdir().unwrap();
    deckhand_cmd()
        .current_dir(temp_dir.path())
        .arg("deploy")
        .env("DECKHAND_CLI", "/nonexistent/ship-cli")
        .assert()
        .failure()
        .stderr(predicate::str::contains("was not found"));
}

#[test]
fn invalid_settings_file_is_reported() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join("deckhand.yml"), "tick_ceiling: 0\n").unwrap();

    deckhand_cmd()
        .current_dir(temp_dir.path())
        .arg("refresh")
        .assert()
        .failure()
        .stderr(predicate::str::contains("tick_ceiling"));
}

#[cfg(unix)]
#[test]
fn refresh_lists_projects() {
    let temp_dir = tempfile::tempdir().unwrap();
    let cli = fake_cli(temp_dir.path());

    deckhand_cmd()
        .current_dir(temp_dir.path())
        .arg("refresh")
        .env("DECKHAND_CLI", &cli)
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as dev@example.com"))
        .stdout(predicate::str::contains("https://app.example.dev"))
        .stdout(predicate::str::contains("vite"));
}

#[cfg(unix)]
#[test]
fn refresh_json_emits_views() {
    let temp_dir = tempfile::tempdir().unwrap();
    let cli = fake_cli(temp_dir.path());

    deckhand_cmd()
        .current_dir(temp_dir.path())
        .args(["--json", "refresh"])
        .env("DECKHAND_CLI", &cli)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""name":"app""#))
        .stdout(predicate::str::contains(r#""public_url":"https://app.example.dev""#));
}

#[cfg(unix)]
#[test]
fn logs_for_named_project() {
    let temp_dir = tempfile::tempdir().unwrap();
    let cli = fake_cli(temp_dir.path());

    deckhand_cmd()
        .current_dir(temp_dir.path())
        .args(["logs", "app"])
        .env("DECKHAND_CLI", &cli)
        .assert()
        .success()
        .stdout(predicate::str::contains("hello from app"));
}

#[cfg(unix)]
#[test]
fn invalid_project_name_is_rejected() {
    let temp_dir = tempfile::tempdir().unwrap();
    let cli = fake_cli(temp_dir.path());

    deckhand_cmd()
        .current_dir(temp_dir.path())
        .args(["refresh", "not a name"])
        .env("DECKHAND_CLI", &cli)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid project name"));
}
