//! End-to-end tests for the `tokensync` binary.
//!
//! Stdout is piped under `assert_cmd`, so every command runs in JSON mode.

use assert_cmd::Command;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn tokensync(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tokensync").unwrap();
    cmd.env("HOME", home)
        .env("TOKENSYNC_DB", home.join("tokens.db"))
        .env_remove("TOKENSYNC_ACTOR")
        .env_remove("NOTION_TOKEN")
        .env_remove("TOKENSYNC_NOTION_URL")
        .env_remove("RUST_LOG");
    cmd
}

fn page(id: &str, group: &str, name: &str, value: &str) -> Value {
    json!({
        "id": id,
        "properties": {
            "Name": {"type": "title", "title": [{"plain_text": name}]},
            "Group": {"type": "select", "select": {"name": group}},
            "Value": {"type": "rich_text", "rich_text": [{"plain_text": value}]}
        }
    })
}

fn write_pages(dir: &Path, pages: &[Value]) -> PathBuf {
    let path = dir.join("pages.json");
    fs::write(&path, json!({"results": pages}).to_string()).unwrap();
    path
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_version() {
    let temp = TempDir::new().unwrap();
    let output = tokensync(temp.path()).arg("version").output().unwrap();
    assert!(output.status.success());
    let body = stdout_json(&output);
    assert_eq!(body["name"], "tokensync");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_sync_then_list_and_export() {
    let temp = TempDir::new().unwrap();
    let input = write_pages(
        temp.path(),
        &[
            page("p1", "Color", "Primary", "#FF0000"),
            page("p2", "Color", "Link", "{Color/Primary}"),
        ],
    );

    let output = tokensync(temp.path())
        .arg("sync")
        .arg("--input")
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let body = stdout_json(&output);
    assert_eq!(body["success"], true);
    assert_eq!(body["collection"], "Design Tokens");
    assert_eq!(body["summary"]["created"], 2);
    assert_eq!(body["summary"]["failed"], 0);

    let output = tokensync(temp.path()).arg("list").output().unwrap();
    assert!(output.status.success());
    let body = stdout_json(&output);
    assert_eq!(body["count"], 2);
    let names: Vec<&str> = body["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Color/Link", "Color/Primary"]);

    let output = tokensync(temp.path()).arg("export").output().unwrap();
    assert!(output.status.success());
    let body = stdout_json(&output);
    assert_eq!(body["Color"]["Primary"]["$value"], "#ff0000");
    assert_eq!(body["Color"]["Link"]["$value"], "{Color/Primary}");

    let output = tokensync(temp.path()).arg("collections").output().unwrap();
    assert!(output.status.success());
    let body = stdout_json(&output);
    assert_eq!(body["count"], 1);
    assert_eq!(body["collections"][0]["entries"], 2);
}

#[test]
fn test_second_sync_skips_without_overwrite() {
    let temp = TempDir::new().unwrap();
    let input = write_pages(temp.path(), &[page("p1", "Space", "Gap", "8")]);

    tokensync(temp.path())
        .args(["sync", "--input"])
        .arg(&input)
        .assert()
        .success();

    let output = tokensync(temp.path())
        .args(["sync", "--input"])
        .arg(&input)
        .output()
        .unwrap();
    let body = stdout_json(&output);
    assert_eq!(body["summary"]["created"], 0);
    assert_eq!(body["summary"]["skipped"], 1);

    let output = tokensync(temp.path())
        .args(["sync", "--overwrite", "--input"])
        .arg(&input)
        .output()
        .unwrap();
    let body = stdout_json(&output);
    assert_eq!(body["summary"]["overwritten"], 1);
}

#[test]
fn test_dry_run_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let input = write_pages(temp.path(), &[page("p1", "Color", "Primary", "#FF0000")]);

    let output = tokensync(temp.path())
        .args(["sync", "--dry-run", "--input"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());
    let body = stdout_json(&output);
    assert_eq!(body["dry_run"], true);
    assert_eq!(body["count"], 1);
    assert_eq!(body["tokens"][0]["name"], "Primary");
    assert!(!temp.path().join("tokens.db").exists());
}

#[test]
fn test_missing_input_is_io_error() {
    let temp = TempDir::new().unwrap();
    let output = tokensync(temp.path())
        .args(["sync", "--input"])
        .arg(temp.path().join("absent.json"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(8));
    let stderr = String::from_utf8_lossy(&output.stderr);
    let last = stderr.lines().rfind(|l| !l.trim().is_empty()).unwrap();
    let err: Value = serde_json::from_str(last).unwrap();
    assert_eq!(err["error"]["code"], "IO_ERROR");
}

#[test]
fn test_empty_input_is_validation_error() {
    let temp = TempDir::new().unwrap();
    let input = write_pages(temp.path(), &[]);
    let output = tokensync(temp.path())
        .args(["sync", "--input"])
        .arg(&input)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn test_list_unknown_collection() {
    let temp = TempDir::new().unwrap();
    let output = tokensync(temp.path())
        .args(["list", "--collection", "Nope"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
}
