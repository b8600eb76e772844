//! Binary-level tests for the `countdown` command.

use assert_cmd::Command;
use predicates::prelude::*;

fn countdown() -> Command {
    Command::cargo_bin("countdown").unwrap()
}

/// Writes a config with a fast tick and returns its directory and path.
fn fast_config() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{"default_duration_seconds": 2, "tick_interval_millis": 20, "sound": {"enabled": false}}"#,
    )
    .unwrap();
    (dir, path)
}

#[test]
fn test_help_lists_commands() {
    countdown()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("toggle"))
        .stdout(predicate::str::contains("run"));
}

#[test]
fn test_completions_bash() {
    countdown()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("countdown"));
}

#[test]
fn test_start_rejects_zero_duration() {
    countdown()
        .args(["start", "--duration", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("1秒から"));
}

#[test]
fn test_status_without_daemon_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_config_dir, config) = fast_config();

    countdown()
        .arg("--config")
        .arg(&config)
        .arg("--socket")
        .arg(dir.path().join("missing.sock"))
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("エラー"))
        .stderr(predicate::str::contains("countdown daemon"));
}

#[test]
fn test_invalid_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    std::fs::write(&config, r#"{"tick_interval_millis": 0}"#).unwrap();

    countdown()
        .arg("--config")
        .arg(&config)
        .args(["run", "--no-sound"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("ティック間隔"));
}

#[test]
fn test_run_foreground_completes() {
    let (_dir, config) = fast_config();

    countdown()
        .arg("--config")
        .arg(&config)
        .args(["run", "--no-sound"])
        .write_stdin("")
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .success()
        .stdout(predicate::str::contains("完了しました"));
}

#[test]
fn test_run_foreground_cancel_from_stdin() {
    let (_dir, config) = fast_config();

    countdown()
        .arg("--config")
        .arg(&config)
        .args(["run", "--duration", "1:00", "--no-sound"])
        .write_stdin("c\n")
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .code(130)
        .stdout(predicate::str::contains("キャンセルしました"));
}
