//! CLI integration tests for the gemini-md-export binary.

mod common;

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

use common::{conversation_page, numbered_page, temp_dir};

/// Build a command for the binary, isolated in `dir`, with fast polling.
fn exporter(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("gemini-md-export").unwrap();
    cmd.current_dir(dir)
        .env("GEMINI_MD_EXPORT_POLLER__SETTLE_DELAY_MS", "0")
        .env("GEMINI_MD_EXPORT_POLLER__RETRY_DELAY_MS", "0")
        .env_remove("RUST_LOG");
    cmd
}

fn write_page(dir: &Path, html: &str) -> String {
    let path = dir.join("chat.html");
    fs::write(&path, html).unwrap();
    path.display().to_string()
}

#[test]
fn test_export_writes_markdown_file() {
    let dir = temp_dir();
    let page = write_page(
        dir.path(),
        &conversation_page(Some("Rust tips"), &[("How do I borrow?", "<p>With <code>&amp;</code>.</p>")]),
    );
    let out = dir.path().join("out");

    let output = exporter(dir.path())
        .args(["--json", "export", &page, "--page-size", "1", "--output-dir"])
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["segment_count"], 2);

    let artifact = json["artifact"].as_str().unwrap();
    assert!(artifact.starts_with("Gemini-Rust tips-"));
    assert!(artifact.ends_with(".md"));

    let content = fs::read_to_string(out.join(artifact)).unwrap();
    assert!(content.starts_with("# Rust tips\n\n## User\n\nHow do I borrow?\n\n---\n\n## Gemini\n\n"));
    assert!(content.ends_with("\n\n---\n\n"));
}

#[test]
fn test_repeated_export_does_not_overwrite() {
    let dir = temp_dir();
    let page = write_page(dir.path(), &numbered_page(2));

    for _ in 0..2 {
        exporter(dir.path())
            .args(["export", &page, "--no-full-load"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Exported 4 segment(s) to Gemini-Numbered-"));
    }

    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".md"))
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.iter().any(|name| name.ends_with(" (1).md")));
}

#[test]
fn test_empty_page_exits_with_failure() {
    let dir = temp_dir();
    let page = write_page(dir.path(), &conversation_page(None, &[]));

    exporter(dir.path())
        .args(["export", &page])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Failed: No conversation content found"));
}

#[test]
fn test_missing_page_is_an_error() {
    let dir = temp_dir();

    exporter(dir.path())
        .args(["export", "does-not-exist.html"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to read page"));
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = temp_dir();
    let page = write_page(dir.path(), &numbered_page(1));
    let config = dir.path().join("bad.yaml");
    fs::write(&config, "poller:\n  max_attempts: 0\n").unwrap();

    exporter(dir.path())
        .args(["--config"])
        .arg(&config)
        .args(["export", &page])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("max_attempts"));
}

#[test]
fn test_project_config_file_is_honored() {
    let dir = temp_dir();
    let page = write_page(dir.path(), &conversation_page(Some("Cfg"), &[("q", "<p>a</p>")]));
    fs::create_dir_all(dir.path().join(".gemini-md-export")).unwrap();
    fs::write(
        dir.path().join(".gemini-md-export/config.yaml"),
        "export:\n  filename_prefix: Chat\nextraction:\n  response_label: Assistant\n",
    )
    .unwrap();

    let output = exporter(dir.path())
        .args(["--json", "export", &page])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    let artifact = json["artifact"].as_str().unwrap();
    assert!(artifact.starts_with("Chat-Cfg-"));
    let content = fs::read_to_string(dir.path().join(artifact)).unwrap();
    assert!(content.contains("## Assistant"));
}

#[test]
fn test_serve_answers_json_lines() {
    let dir = temp_dir();
    let page = write_page(dir.path(), &conversation_page(Some("Served"), &[("q", "<p>a</p>")]));

    let output = exporter(dir.path())
        .args(["serve", &page, "--output-dir"])
        .arg(dir.path())
        .write_stdin(
            "{\"id\":1,\"action\":\"ping\"}\n\
             not json\n\
             {\"id\":2,\"action\":\"export\",\"fullLoad\":false}\n",
        )
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let messages: Vec<Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    let by_id = |id: i64| {
        messages
            .iter()
            .find(|m| m["id"] == id)
            .unwrap_or_else(|| panic!("no response for id {id}: {messages:?}"))
    };
    assert_eq!(by_id(1)["version"], "2.0");

    let export = by_id(2);
    assert_eq!(export["success"], true);
    assert_eq!(export["turnCount"], 2);
    assert!(export["filename"].as_str().unwrap().starts_with("Gemini-Served-"));

    assert!(messages
        .iter()
        .any(|m| m["success"] == false && m["error"].as_str().unwrap_or_default().starts_with("invalid message")));
    assert!(messages
        .iter()
        .any(|m| m["type"] == "progress" && m["percent"] == 100));
}

#[test]
fn test_json_logs_go_to_stderr_only() {
    let dir = temp_dir();
    let page = write_page(dir.path(), &numbered_page(1));

    let output = exporter(dir.path())
        .env("GEMINI_MD_EXPORT_LOGGING__LEVEL", "info")
        .env("GEMINI_MD_EXPORT_LOGGING__FORMAT", "json")
        .args(["--json", "export", &page])
        .output()
        .unwrap();
    assert!(output.status.success());

    // stdout is exactly one JSON document
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "success");
    assert!(String::from_utf8_lossy(&output.stderr).contains("logger initialized"));
}

#[test]
fn test_file_logging_with_rotation_never() {
    let dir = temp_dir();
    let page = write_page(dir.path(), &numbered_page(1));
    let logs = dir.path().join("logs");

    exporter(dir.path())
        .env("GEMINI_MD_EXPORT_LOGGING__LEVEL", "debug")
        .env("GEMINI_MD_EXPORT_LOGGING__LOG_DIR", logs.display().to_string())
        .env("GEMINI_MD_EXPORT_LOGGING__ROTATION", "never")
        .args(["export", &page, "--no-full-load"])
        .assert()
        .success();

    let log = fs::read_to_string(logs.join("gemini-md-export.log")).unwrap();
    assert!(log.lines().any(|line| line.contains("artifact written")));
}

#[test]
fn test_serve_progress_precedes_its_response() {
    let dir = temp_dir();
    let page = write_page(dir.path(), &numbered_page(3));

    let output = exporter(dir.path())
        .args(["serve", &page, "--output-dir"])
        .arg(dir.path())
        .write_stdin("{\"id\":7,\"action\":\"export\",\"fullLoad\":false}\n")
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let messages: Vec<Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    let response_at = messages.iter().position(|m| m["id"] == 7).unwrap();
    let last_progress = messages
        .iter()
        .rposition(|m| m["type"] == "progress")
        .unwrap_or_else(|| panic!("no progress notifications: {messages:?}"));
    assert_eq!(messages[last_progress]["percent"], 100);
    assert!(last_progress < response_at, "{messages:?}");
    assert_eq!(response_at, messages.len() - 1);
}
