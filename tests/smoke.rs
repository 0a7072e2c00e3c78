//! Smoke tests for the serviceloop CLI
//!
//! Each test runs the compiled binary inside a temporary directory marked as
//! a repository root, so config discovery never sees files from the host.

use assert_cmd::assert::OutputAssertExt;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn isolated_dir() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join(".git")).unwrap();
    temp
}

fn serviceloop_in(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("serviceloop"));
    cmd.current_dir(dir);
    cmd.env_remove("SERVICELOOP_CONFIG");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &Path, body: &str) {
    let config_dir = dir.join(".serviceloop");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), body).unwrap();
}

#[test]
fn test_version_output() {
    let temp = isolated_dir();
    serviceloop_in(temp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("serviceloop"));
}

#[test]
fn test_stages_lists_pipeline_in_order() {
    let temp = isolated_dir();
    let output = serviceloop_in(temp.path())
        .arg("stages")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    let labels: Vec<&str> = text
        .lines()
        .map(|line| line.split_whitespace().nth(1).unwrap())
        .collect();
    assert_eq!(
        labels,
        ["Monitor", "Analyze", "Decide", "Execute", "Verify", "Optimize"]
    );
}

#[test]
fn test_stages_json() {
    let temp = isolated_dir();
    let output = serviceloop_in(temp.path())
        .args(["stages", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let rows = value.as_array().unwrap();
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[3]["stage"], "execute");
    assert_eq!(rows[3]["index"], 3);
}

#[test]
fn test_run_completes() {
    let temp = isolated_dir();
    serviceloop_in(temp.path())
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("(manual) completed"))
        .stdout(predicate::str::contains("Optimize"));
}

#[test]
fn test_run_json_output() {
    let temp = isolated_dir();
    let output = serviceloop_in(temp.path())
        .args(["run", "--json", "--trigger", "alert"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let run: serviceloop::LoopRun = serde_json::from_slice(&output).unwrap();
    assert_eq!(run.overall_status, serviceloop::RunStatus::Completed);
    assert_eq!(run.trigger, serviceloop::Trigger::Alert);
    run.check_invariants().unwrap();
}

#[test]
fn test_failed_run_exits_with_run_failed_code() {
    let temp = isolated_dir();
    serviceloop_in(temp.path())
        .args(["run", "--fail-stage", "execute"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("error"))
        .stdout(predicate::str::contains("cluster API returned 503"));
}

#[test]
fn test_unknown_trigger_is_usage_error() {
    let temp = isolated_dir();
    serviceloop_in(temp.path())
        .args(["run", "--trigger", "cron"])
        .assert()
        .code(2);
}

#[test]
fn test_config_shows_defaults() {
    let temp = isolated_dir();
    serviceloop_in(temp.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("(none, using defaults)"))
        .stdout(predicate::str::is_match(r"stage_timeout_secs\s+= 120\s+\(default\)").unwrap());
}

#[test]
fn test_config_precedence_cli_over_file() {
    let temp = isolated_dir();
    write_config(
        temp.path(),
        "[loop]\nstage_timeout_secs = 45\nauto_interval_secs = 60\n",
    );

    let output = serviceloop_in(temp.path())
        .args(["config", "--json", "--stage-timeout", "30"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["values"]["stage_timeout_secs"]["value"], "30");
    assert_eq!(value["values"]["stage_timeout_secs"]["source"], "cli");
    assert_eq!(value["values"]["auto_interval_secs"]["value"], "60");
    assert_eq!(value["values"]["auto_interval_secs"]["source"], "config");
    assert_eq!(value["values"]["auto_mode"]["source"], "default");
    assert!(value["config_path"].as_str().unwrap().ends_with("config.toml"));
}

#[test]
fn test_invalid_stage_timeout_is_config_error() {
    let temp = isolated_dir();
    serviceloop_in(temp.path())
        .args(["run", "--stage-timeout", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("stage_timeout_secs"));
}

#[test]
fn test_unknown_config_key_is_rejected() {
    let temp = isolated_dir();
    write_config(temp.path(), "[loop]\nstage_timeout = 5\n");
    serviceloop_in(temp.path())
        .arg("config")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("configuration file is invalid"));
}

#[test]
fn test_missing_explicit_config_is_rejected() {
    let temp = isolated_dir();
    serviceloop_in(temp.path())
        .args(["--config", "does-not-exist.toml", "stages"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("does-not-exist.toml"));
}

#[test]
fn test_watch_waits_for_auto_runs() {
    let temp = isolated_dir();
    let output = serviceloop_in(temp.path())
        .args(["watch", "--runs", "2", "--interval-secs", "1", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stats: serviceloop::Stats = serde_json::from_slice(&output).unwrap();
    assert_eq!(stats.total_runs, 2);
    assert_eq!(stats.success_runs, 2);
}
