//! CLI tests for Conifer
//!
//! This test suite covers:
//! - `dbi` and `short-name` output and failures
//! - `lookup` against local files in human, JSON and YAML output
//! - Config file loading and flag overrides
//! - Exit codes and error reporting on stderr

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

const HOSTS: &str = "# hosts\nname ip role\nweb01 10.0.0.1 web\ndb01 10.0.0.2 db\nshort01 10.0.0.3\n";

// Helper to get a command isolated from the caller's environment
fn conifer_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("conifer").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("NO_COLOR", "1")
        .env_remove("CONIFER_CONFIG")
        .env_remove("RUST_LOG")
        .env_remove("CONIFER_SEARCH_PATH")
        .env_remove("CONIFER_STRICT_FIELDS");
    cmd
}

fn workspace() -> TempDir {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("hosts.txt"), HOSTS).unwrap();
    dir
}

#[test]
fn test_help() {
    let dir = tempdir().unwrap();
    conifer_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("lookup"))
        .stdout(predicate::str::contains("short-name"));
}

#[test]
fn test_version() {
    let dir = tempdir().unwrap();
    conifer_cmd(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_dbi() {
    let dir = tempdir().unwrap();
    conifer_cmd(dir.path())
        .args(["dbi", "jdbc:oracle:thin:@redux.example.edu:1521:cryptoB"])
        .assert()
        .success()
        .stdout("dbi:Oracle:host=redux.example.edu;sid=cryptoB;port=1521\n");
}

#[test]
fn test_dbi_json() {
    let dir = tempdir().unwrap();
    let output = conifer_cmd(dir.path())
        .args(["-o", "json", "dbi", "jdbc:postgresql://db.example.edu:5432/mydb"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        parsed,
        serde_json::json!({"dbi": "dbi:Pg:dbname=mydb;host=db.example.edu;port=5432"})
    );
}

#[test]
fn test_dbi_unrecognized() {
    let dir = tempdir().unwrap();
    conifer_cmd(dir.path())
        .args(["dbi", "not-a-jdbc-url"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains(
            "Unable to convert jdbc string 'not-a-jdbc-url' to dbi.",
        ));
}

#[test]
fn test_short_name() {
    let dir = tempdir().unwrap();
    conifer_cmd(dir.path())
        .args([
            "short-name",
            "jdbc:oracle:thin:@kiwi.example.edu/cryptoB.kiwi.example.edu",
        ])
        .assert()
        .success()
        .stdout("cryptoB\n");
}

#[test]
fn test_short_name_yaml() {
    let dir = tempdir().unwrap();
    conifer_cmd(dir.path())
        .args(["--output", "yaml", "short-name", "jdbc:oracle:oci:@toxoprod"])
        .assert()
        .success()
        .stdout(predicate::str::contains("short_name: toxoprod"));
}

#[test]
fn test_lookup_scalar() {
    let dir = workspace();
    conifer_cmd(dir.path())
        .args(["lookup", "db01 src=hosts.txt col=ip"])
        .assert()
        .success()
        .stdout("10.0.0.2\n");
}

#[test]
fn test_lookup_multiple_queries() {
    let dir = workspace();
    conifer_cmd(dir.path())
        .args([
            "lookup",
            "web01 src=hosts.txt col=1",
            "db01 src=hosts.txt col=role",
        ])
        .assert()
        .success()
        .stdout("10.0.0.1\ndb\n");
}

#[test]
fn test_lookup_row_human() {
    let dir = workspace();
    conifer_cmd(dir.path())
        .args(["lookup", "web01 src=hosts.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("name  web01"))
        .stdout(predicate::str::contains("ip    10.0.0.1"))
        .stdout(predicate::str::contains("role  web"));
}

#[test]
fn test_lookup_row_json() {
    let dir = workspace();
    let output = conifer_cmd(dir.path())
        .args(["-o", "json", "lookup", "short01 src=hosts.txt"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        parsed,
        serde_json::json!([{"name": "short01", "ip": "10.0.0.3"}])
    );
}

#[test]
fn test_lookup_no_match_is_success() {
    let dir = workspace();
    let output = conifer_cmd(dir.path())
        .args(["-o", "json", "lookup", "nobody src=hosts.txt col=ip"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed, serde_json::json!([]));
}

#[test]
fn test_lookup_search_path_flag() {
    let dir = workspace();
    let elsewhere = tempdir().unwrap();
    conifer_cmd(elsewhere.path())
        .args(["lookup", "web01 src=hosts.txt col=role", "--search-path"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout("web\n");
}

#[test]
fn test_lookup_missing_file() {
    let dir = workspace();
    conifer_cmd(dir.path())
        .args(["lookup", "web01 src=absent.txt"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("absent.txt"));
}

#[test]
fn test_lookup_index_out_of_range() {
    let dir = workspace();
    conifer_cmd(dir.path())
        .args(["lookup", "short01 src=hosts.txt col=2"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("short01"));
}

#[test]
fn test_lookup_strict_fields_flag() {
    let dir = workspace();
    conifer_cmd(dir.path())
        .args(["lookup", "short01 src=hosts.txt col=role"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    conifer_cmd(dir.path())
        .args(["lookup", "--strict-fields", "short01 src=hosts.txt col=role"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Field 'role' not found for 'short01'"));
}

#[test]
fn test_lookup_errors_ignore() {
    let dir = workspace();
    conifer_cmd(dir.path())
        .args([
            "lookup",
            "--errors",
            "ignore",
            "web01 src=absent.txt",
            "web01 src=hosts.txt col=ip",
        ])
        .assert()
        .success()
        .stdout("10.0.0.1\n");
}

#[test]
fn test_lookup_bad_term() {
    let dir = workspace();
    conifer_cmd(dir.path())
        .args(["lookup", "web01 src=hosts.txt column=1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("column"));
}

#[test]
fn test_invalid_errors_value_is_usage_error() {
    let dir = workspace();
    conifer_cmd(dir.path())
        .args(["lookup", "--errors", "sometimes", "web01 src=hosts.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sometimes"));
}

#[test]
fn test_config_file_search_paths() {
    let data = workspace();
    let dir = tempdir().unwrap();
    let config = dir.path().join("conifer.toml");
    fs::write(
        &config,
        format!(
            "[lookup]\nsearch_paths = [{:?}]\nstrict_fields = true\n",
            data.path().display().to_string()
        ),
    )
    .unwrap();

    conifer_cmd(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["lookup", "db01 src=hosts.txt col=ip"])
        .assert()
        .success()
        .stdout("10.0.0.2\n");

    conifer_cmd(dir.path())
        .arg("-c")
        .arg(&config)
        .args(["lookup", "short01 src=hosts.txt col=role"])
        .assert()
        .code(1);
}

#[test]
fn test_env_search_path() {
    let data = workspace();
    let dir = tempdir().unwrap();
    conifer_cmd(dir.path())
        .env("CONIFER_SEARCH_PATH", data.path())
        .args(["lookup", "web01 src=hosts.txt col=0"])
        .assert()
        .success()
        .stdout("web01\n");
}

#[test]
fn test_missing_explicit_config_fails() {
    let dir = workspace();
    conifer_cmd(dir.path())
        .args(["--config", "absent.toml", "lookup", "web01 src=hosts.txt col=ip"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Config file not found: absent.toml"));

    conifer_cmd(dir.path())
        .env("CONIFER_CONFIG", dir.path().join("absent.cfg"))
        .args(["dbi", "jdbc:oracle:oci:@toxoprod"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("absent.cfg"));
}

#[test]
fn test_discovered_config_in_home() {
    let dir = workspace();
    fs::write(dir.path().join(".conifer.cfg"), "[lookup]\nstrict_fields = true\n").unwrap();

    conifer_cmd(dir.path())
        .args(["lookup", "short01 src=hosts.txt col=role"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Field 'role' not found"));
}
