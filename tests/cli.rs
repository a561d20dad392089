//! Integration tests for the scour command line.
//!
//! These run the built binary against a fixture project and check output
//! format, flags and exit codes.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;
use tempfile::TempDir;

static FIXTURE_DIR: OnceLock<TempDir> = OnceLock::new();

/// Get or create the test fixture directory (singleton)
fn fixture_dir() -> &'static Path {
    FIXTURE_DIR.get_or_init(create_fixture_dir).path()
}

/// Create the fixture project with known content
fn create_fixture_dir() -> TempDir {
    let dir = TempDir::new().expect("Failed to create fixture dir");
    let root = dir.path();

    fs::write(
        root.join("main.rs"),
        r#"fn main() {
    println!("Hello, world!");
    let x = 42;
    // TODO: fix this
    let y = x + 1;
}

fn helper() {
    // Another function
    println!("Helper");
}
"#,
    )
    .unwrap();

    fs::write(
        root.join("lib.rs"),
        r#"pub fn add(a: i32, b: i32) -> i32 {
    a + b
}

pub fn multiply(a: i32, b: i32) -> i32 {
    // TODO: optimize this
    a * b
}
"#,
    )
    .unwrap();

    fs::write(
        root.join("notes.md"),
        "Release notes\n\nThe helper is slow. todo: profile helper and HELPER callers.\n",
    )
    .unwrap();

    // Latin-1 text, undecodable as UTF-8
    fs::write(root.join("legacy.txt"), b"caf\xE9 helper menu\n").unwrap();

    fs::create_dir_all(root.join("node_modules/dep")).unwrap();
    fs::write(root.join("node_modules/dep/index.js"), "// TODO: vendored\n").unwrap();

    dir
}

/// Get path to the scour binary
fn scour_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_scour"))
}

/// Run scour with given args against the fixture; flags go before the query
fn run_scour(args: &[&str]) -> (String, String, i32) {
    let dir = fixture_dir();
    // Keep the user's real config out of the tests
    let config = dir.join("no-such-config.json");

    let mut cmd_args: Vec<&str> = vec![
        "--color=never",
        "--no-progress",
        "--config",
        config.to_str().unwrap(),
        "-p",
        dir.to_str().unwrap(),
    ];
    cmd_args.extend(args);

    let output = Command::new(scour_binary())
        .args(&cmd_args)
        .env_remove("SCOUR_LOG")
        .output()
        .expect("Failed to run scour");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

/// File names from -l output
fn file_names(output: &str) -> HashSet<String> {
    output
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|l| Path::new(l.trim()).file_name())
        .map(|n| n.to_string_lossy().to_string())
        .collect()
}

#[test]
fn test_plain_search_heading_format() {
    let (out, _, code) = run_scour(&["fn main"]);

    assert_eq!(code, 0);
    let lines: Vec<&str> = out.lines().collect();
    assert!(lines[0].ends_with("main.rs"), "heading expected, got {:?}", lines[0]);
    assert_eq!(lines[1], "     1: fn main() {");
    assert_eq!(lines.len(), 2);
}

#[test]
fn test_no_heading_format() {
    let (out, _, code) = run_scour(&["--no-heading", "fn add"]);

    assert_eq!(code, 0);
    let line = out.lines().next().unwrap();
    assert!(line.ends_with("lib.rs:1:pub fn add(a: i32, b: i32) -> i32 {"), "got {:?}", line);
}

#[test]
fn test_no_match_exits_with_one() {
    let (out, _, code) = run_scour(&["definitely not present anywhere"]);
    assert_eq!(code, 1);
    assert!(out.is_empty());
}

#[test]
fn test_case_sensitive_by_default() {
    let (out, _, _) = run_scour(&["-l", "TODO"]);
    let files = file_names(&out);
    assert!(files.contains("main.rs"));
    assert!(files.contains("lib.rs"));
    assert!(!files.contains("notes.md"));

    let (out, _, code) = run_scour(&["-l", "-i", "TODO"]);
    assert_eq!(code, 0);
    assert!(file_names(&out).contains("notes.md"));
}

#[test]
fn test_excluded_directories_skipped() {
    let (out, _, _) = run_scour(&["-l", "-i", "todo"]);
    assert!(!file_names(&out).contains("index.js"));
}

#[test]
fn test_count() {
    let (out, _, code) = run_scour(&["-c", "println"]);
    assert_eq!(code, 0);
    let line = out.lines().next().unwrap();
    assert!(line.ends_with("main.rs:2"), "got {:?}", line);
}

#[test]
fn test_max_count_truncates() {
    let (out, err, code) = run_scour(&["-c", "-m", "1", "println"]);
    assert_eq!(code, 0);
    assert!(out.trim_end().ends_with("main.rs:1"));
    assert!(err.contains("Search truncated"), "stderr: {}", err);
}

#[test]
fn test_undecodable_file_reported() {
    let (out, err, _) = run_scour(&["-l", "helper"]);
    assert!(!file_names(&out).contains("legacy.txt"));
    assert!(err.contains("legacy.txt: unknown or unspecified encoding"), "stderr: {}", err);

    let (out, err, _) = run_scour(&["-l", "--no-messages", "-E", "utf-8", "-E", "windows-1252", "helper"]);
    assert!(file_names(&out).contains("legacy.txt"));
    assert!(err.is_empty(), "stderr: {}", err);
}

#[test]
fn test_ranked_search_orders_by_score() {
    let (out, _, code) = run_scour(&["--rank", "-l", "helper"]);
    assert_eq!(code, 0);

    let order: Vec<String> = out
        .lines()
        .filter_map(|l| Path::new(l).file_name())
        .map(|n| n.to_string_lossy().to_string())
        .collect();
    // notes.md mentions helper three times in a short file
    assert_eq!(order.first().map(String::as_str), Some("notes.md"));
    assert!(!order.contains(&"lib.rs".to_string()));
}

#[test]
fn test_json_output() {
    let (out, _, code) = run_scour(&["--json", "--rank", "helper"]);
    assert_eq!(code, 0);

    let records: Vec<serde_json::Value> = out
        .lines()
        .map(|l| serde_json::from_str(l).expect("each line is JSON"))
        .collect();
    let files: Vec<&serde_json::Value> = records.iter().filter(|r| r["type"] == "file").collect();
    assert!(!files.is_empty());
    assert!(files.iter().all(|f| f["score"].as_f64().unwrap() > 0.0));
    assert_eq!(records.last().unwrap()["type"], "summary");
    assert_eq!(records.last().unwrap()["status"], "completed");
}

#[test]
fn test_long_lines_are_cut() {
    let (out, _, _) = run_scour(&["--max-line-length", "12", "optimize"]);
    let line = out.lines().nth(1).unwrap();
    assert!(line.contains("optimize"));
    assert!(line.contains("[…]"));
}

#[test]
fn test_missing_path_fails() {
    let dir = fixture_dir().join("missing");
    let output = Command::new(scour_binary())
        .args(["--no-progress", "-p", dir.to_str().unwrap(), "main"])
        .output()
        .expect("Failed to run scour");

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unavailable"));
}

#[test]
fn test_invalid_encoding_fails() {
    let (_, err, code) = run_scour(&["-E", "no-such-encoding", "main"]);
    assert_eq!(code, 2);
    assert!(err.contains("no-such-encoding"));
}

#[test]
fn test_config_subcommand() {
    let (out, _, code) = run_scour(&["config"]);
    assert_eq!(code, 0);
    assert!(out.contains("no-such-config.json"));
    assert!(out.contains("\"max_line_length\": 100"));
    assert!(out.contains("\"max_hit_count\": 5000"));
}
