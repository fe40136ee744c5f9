//! CLI integration tests
use predicates::prelude::*;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    assert_cmd::cargo::cargo_bin_cmd!("readlog")
}

#[test]
fn test_cli_help() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--allow-private"))
        .stdout(predicate::str::contains("--format"));
}

#[test]
fn test_cli_requires_url() {
    cmd().assert().failure();
}

#[test]
fn test_cli_rejects_unsupported_scheme() {
    cmd()
        .arg("ftp://example.com/file.txt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported scheme: ftp"));
}

#[test]
fn test_cli_json_failure_record() {
    let output = cmd().args(["-f", "json", "javascript:alert(1)"]).assert().failure().get_output().clone();

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["error_kind"], "invalid_url");
    assert!(json["title"].is_null());
    assert!(json["url"].is_null());
}

#[test]
fn test_cli_blocks_loopback_by_default() {
    cmd()
        .args(["-f", "json", "http://127.0.0.1:9/"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("private or loopback"));
}

#[test]
fn test_cli_strict_scheme() {
    cmd()
        .args(["--no-scheme-upgrade", "example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing scheme"));
}

#[test]
fn test_cli_accepts_kebab_case_flags() {
    cmd()
        .args(["--allow-private", "--user-agent", "readlog-test", "--no-scheme-upgrade", "example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing scheme"));
}

#[test]
fn test_cli_rejects_snake_case_flags() {
    cmd()
        .args(["--allow_private", "https://example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unexpected argument"));
}

#[test]
fn test_cli_invalid_format() {
    cmd().args(["-f", "yaml", "https://example.com"]).assert().failure();
}

#[test]
fn test_cli_output_file() {
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("preview.json");

    cmd()
        .args(["-f", "json", "-o", output.to_str().unwrap(), "mailto:someone@example.com"])
        .assert()
        .failure();

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.contains("\"success\": false"));
}

#[test]
fn test_cli_verbose() {
    cmd()
        .args(["-v", "ftp://example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Readlog"));
}
