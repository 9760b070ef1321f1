//! E2E tests for `rl decode`: both grammars, keep-alives, truncated and
//! malformed frames, and the JSON lines contract.
//!
//! Each test runs the `rl` binary as a subprocess against a stream file in
//! an isolated temp directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn rl_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("rl"));
    cmd.current_dir(dir);
    cmd.env("REDLINE_LOG", "error");
    cmd
}

/// Write a stream file into `dir` and return its path.
fn stream_file(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("write stream file");
    path
}

const CHAT_STREAM: &str = concat!(
    "data: {\"content\": \"Hello\"}\n",
    "\n",
    "data: {\"content\": \", world\"}\n",
    "data: {\"done\": true}\n",
);

const REFINE_STREAM: &str = concat!(
    "data: {\"type\": \"progress\", \"data\": 42}\n",
    "data: {\"type\": \"suggestion\", \"data\": {\"original\": \"very unique\", ",
    "\"suggested\": \"unique\", \"explanation\": \"redundant modifier\"}}\n",
    "data: {\"type\": \"score\", \"data\": 7.5}\n",
    "data: {\"type\": \"summary\", \"data\": \"Tighten the opening.\"}\n",
    "data: {\"type\": \"done\", \"data\": null}\n",
);

fn json_lines(stdout: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("each output line is JSON"))
        .collect()
}

#[test]
fn decodes_a_chat_stream() {
    let dir = TempDir::new().unwrap();
    let path = stream_file(dir.path(), "chat.stream", CHAT_STREAM);

    rl_cmd(dir.path())
        .args(["decode", "--grammar", "chat"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Hello"))
        .stdout(predicate::str::contains(", world"));
}

#[test]
fn chat_stream_as_json_lines() {
    let dir = TempDir::new().unwrap();
    let path = stream_file(dir.path(), "chat.stream", CHAT_STREAM);

    let output = rl_cmd(dir.path())
        .args(["decode", "--grammar", "chat", "--json"])
        .arg(&path)
        .output()
        .expect("decode should not crash");
    assert!(output.status.success());

    let rows = json_lines(&output.stdout);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["kind"], "content");
    assert_eq!(rows[0]["data"], "Hello");
    assert_eq!(rows[1]["data"], ", world");
    assert_eq!(rows[2]["kind"], "done");
}

#[test]
fn decodes_a_refine_stream_in_order() {
    let dir = TempDir::new().unwrap();
    let path = stream_file(dir.path(), "refine.stream", REFINE_STREAM);

    let output = rl_cmd(dir.path())
        .args(["decode", "--grammar", "refine", "--json"])
        .arg(&path)
        .output()
        .expect("decode should not crash");
    assert!(output.status.success());

    let kinds: Vec<_> = json_lines(&output.stdout)
        .iter()
        .map(|row| row["kind"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(kinds, ["progress", "suggestion", "score", "summary", "done"]);
}

#[test]
fn reads_the_stream_from_stdin() {
    let dir = TempDir::new().unwrap();

    rl_cmd(dir.path())
        .args(["decode", "--grammar", "refine"])
        .write_stdin(REFINE_STREAM)
        .assert()
        .success()
        .stdout(predicate::str::contains("-> unique"))
        .stdout(predicate::str::contains("score: 7.5"));
}

#[test]
fn keep_alive_lines_produce_no_events() {
    let dir = TempDir::new().unwrap();
    let body = concat!(
        ": keep-alive\n",
        "\n",
        "data: {\"content\": \"x\"}\n",
        "\n",
        "data: {\"done\": true}\n",
    );
    let path = stream_file(dir.path(), "chat.stream", body);

    let output = rl_cmd(dir.path())
        .args(["decode", "--grammar", "chat", "--json"])
        .arg(&path)
        .output()
        .expect("decode should not crash");
    assert!(output.status.success());
    assert_eq!(json_lines(&output.stdout).len(), 2);
}

#[test]
fn malformed_frame_fails_with_a_coded_error_event() {
    let dir = TempDir::new().unwrap();
    let body = concat!(
        "data: {\"content\": \"ok so far\"}\n",
        "data: {\"content\": oops}\n",
        "data: {\"content\": \"never seen\"}\n",
    );
    let path = stream_file(dir.path(), "chat.stream", body);

    let output = rl_cmd(dir.path())
        .args(["decode", "--grammar", "chat", "--json"])
        .arg(&path)
        .output()
        .expect("decode should not crash");
    assert!(!output.status.success());

    let rows = json_lines(&output.stdout);
    assert_eq!(rows.len(), 2, "nothing after the terminal error");
    assert_eq!(rows[1]["kind"], "error");
    assert_eq!(rows[1]["data"]["code"], "E1002");
    assert_eq!(rows[1]["data"]["message"], "Malformed stream frame");
    assert!(!rows[1]["data"]["detail"].as_str().unwrap().is_empty());
}

#[test]
fn server_error_frame_fails_the_command() {
    let dir = TempDir::new().unwrap();
    let body = concat!(
        "data: {\"type\": \"progress\", \"data\": 10}\n",
        "data: {\"type\": \"error\", \"data\": \"model unavailable\"}\n",
    );
    let path = stream_file(dir.path(), "refine.stream", body);

    rl_cmd(dir.path())
        .args(["decode", "--grammar", "refine"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("decode error"));
}

#[test]
fn truncated_trailing_frame_is_dropped() {
    let dir = TempDir::new().unwrap();
    let body = concat!(
        "data: {\"type\": \"progress\", \"data\": 5}\n",
        "data: {\"type\": \"summ",
    );
    let path = stream_file(dir.path(), "refine.stream", body);

    let output = rl_cmd(dir.path())
        .args(["decode", "--grammar", "refine", "--json"])
        .arg(&path)
        .output()
        .expect("decode should not crash");
    assert!(output.status.success());

    let rows = json_lines(&output.stdout);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["kind"], "progress");
}
