//! E2E tests for `rl check`: loading an issue batch, applying a candidate,
//! dismissing, and coded errors for bad ids.

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

fn write_file(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("write file");
    path
}

const DRAFT: &str = "Their is a typo here, and another typpo there.";

fn issues_json(dir: &Path) -> PathBuf {
    write_file(
        dir,
        "issues.json",
        &format!(
            r#"{{
                "issues": [
                    {{"position": 0, "length": 5, "message": "Did you mean 'There'?",
                      "suggestions": ["There"], "severity": "error",
                      "original_text": "Their"}},
                    {{"position": 34, "length": 5, "message": "Possible typo",
                      "suggestions": ["typo"], "original_text": "typpo"}}
                ],
                "checked_text": {draft:?}
            }}"#,
            draft = DRAFT
        ),
    )
}

fn check_json(dir: &Path, content: &Path, issues: &Path, extra: &[&str]) -> Value {
    let output = rl_cmd(dir)
        .args(["check", "--json", "--content-file"])
        .arg(content)
        .arg("--issues")
        .arg(issues)
        .args(extra)
        .output()
        .expect("check should not crash");
    assert!(
        output.status.success(),
        "check failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("check --json emits one JSON snapshot")
}

#[test]
fn lists_loaded_issues() {
    let dir = TempDir::new().unwrap();
    let content = write_file(dir.path(), "draft.md", DRAFT);
    let issues = issues_json(dir.path());

    let snap = check_json(dir.path(), &content, &issues, &[]);
    let annotations = snap["annotations"].as_array().unwrap();
    assert_eq!(annotations.len(), 2);
    assert_eq!(annotations[0]["kind"], "issue");
    assert_eq!(annotations[0]["start"], 0);
    assert_eq!(annotations[0]["severity"], "error");
    assert_eq!(annotations[1]["start"], 34);
    assert_eq!(snap["content"], DRAFT);
}

#[test]
fn apply_uses_the_first_candidate_and_rebases_later_issues() {
    let dir = TempDir::new().unwrap();
    let content = write_file(dir.path(), "draft.md", DRAFT);
    let issues = issues_json(dir.path());

    let snap = check_json(dir.path(), &content, &issues, &["--apply", "0"]);
    assert_eq!(
        snap["content"],
        "There is a typo here, and another typpo there."
    );

    let annotations = snap["annotations"].as_array().unwrap();
    assert_eq!(annotations.len(), 1, "applied issue left the live set");
    assert_eq!(annotations[0]["original_text"], "typpo");
    // "Their" -> "There" is length-neutral, so the anchor is unchanged.
    assert_eq!(annotations[0]["start"], 34);
}

#[test]
fn apply_with_explicit_replacement() {
    let dir = TempDir::new().unwrap();
    let content = write_file(dir.path(), "draft.md", DRAFT);
    let issues = issues_json(dir.path());

    let snap = check_json(
        dir.path(),
        &content,
        &issues,
        &["--apply", "1", "--with", "misprint"],
    );
    assert_eq!(
        snap["content"],
        "Their is a typo here, and another misprint there."
    );
}

#[test]
fn dismiss_leaves_the_text_untouched() {
    let dir = TempDir::new().unwrap();
    let content = write_file(dir.path(), "draft.md", DRAFT);
    let issues = issues_json(dir.path());

    let snap = check_json(dir.path(), &content, &issues, &["--dismiss", "0"]);
    assert_eq!(snap["content"], DRAFT);
    assert_eq!(snap["annotations"].as_array().unwrap().len(), 1);
}

#[test]
fn unknown_id_fails_with_a_coded_error() {
    let dir = TempDir::new().unwrap();
    let content = write_file(dir.path(), "draft.md", DRAFT);
    let issues = issues_json(dir.path());

    let output = rl_cmd(dir.path())
        .args(["check", "--json", "--content-file"])
        .arg(&content)
        .arg("--issues")
        .arg(&issues)
        .args(["--apply", "99"])
        .output()
        .expect("check should not crash");
    assert!(!output.status.success());

    let error: Value = serde_json::from_slice(&output.stdout).expect("structured error JSON");
    assert_eq!(error["error_code"], "E2001");
    assert!(error["message"].as_str().unwrap().contains("a99"));
}

#[test]
fn field_flag_targets_the_named_buffer() {
    let dir = TempDir::new().unwrap();
    let content = write_file(dir.path(), "title.txt", "Teh Quick Fox");
    let issues = write_file(
        dir.path(),
        "issues.json",
        r#"{
            "issues": [
                {"position": 0, "length": 3, "message": "Did you mean 'The'?",
                 "suggestions": ["The"], "original_text": "Teh"}
            ],
            "checked_text": "Teh Quick Fox"
        }"#,
    );

    let snap = check_json(
        dir.path(),
        &content,
        &issues,
        &["--field", "title", "--apply", "0"],
    );
    assert_eq!(snap["title"], "The Quick Fox");
    assert_eq!(snap["content"], "");
    assert!(snap["annotations"].as_array().unwrap().is_empty());
}

#[test]
fn unknown_field_is_rejected_at_parse_time() {
    let dir = TempDir::new().unwrap();
    let content = write_file(dir.path(), "draft.md", DRAFT);
    let issues = issues_json(dir.path());

    rl_cmd(dir.path())
        .args(["check", "--content-file"])
        .arg(&content)
        .arg("--issues")
        .arg(&issues)
        .args(["--field", "body"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid field"));
}

#[test]
fn apply_and_dismiss_together_are_rejected() {
    let dir = TempDir::new().unwrap();
    let content = write_file(dir.path(), "draft.md", DRAFT);
    let issues = issues_json(dir.path());

    rl_cmd(dir.path())
        .args(["check", "--content-file"])
        .arg(&content)
        .arg("--issues")
        .arg(&issues)
        .args(["--apply", "0", "--dismiss", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));

    // Order does not matter: the conflict cuts both ways.
    rl_cmd(dir.path())
        .args(["check", "--content-file"])
        .arg(&content)
        .arg("--issues")
        .arg(&issues)
        .args(["--dismiss", "1", "--apply", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn out_of_bounds_issues_are_skipped_on_load() {
    let dir = TempDir::new().unwrap();
    let content = write_file(dir.path(), "draft.md", "short");
    let issues = write_file(
        dir.path(),
        "issues.json",
        r#"{
            "issues": [
                {"position": 400, "length": 5, "message": "stale",
                 "suggestions": ["x"], "original_text": "nope"},
                {"position": 0, "length": 5, "message": "fine",
                 "suggestions": ["brief"], "original_text": "short"}
            ],
            "checked_text": "short"
        }"#,
    );

    let snap = check_json(dir.path(), &content, &issues, &[]);
    let annotations = snap["annotations"].as_array().unwrap();
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0]["message"], "fine");
}

#[test]
fn human_mode_announces_the_apply() {
    let dir = TempDir::new().unwrap();
    let content = write_file(dir.path(), "draft.md", DRAFT);
    let issues = issues_json(dir.path());

    rl_cmd(dir.path())
        .args(["check", "--content-file"])
        .arg(&content)
        .arg("--issues")
        .arg(&issues)
        .args(["--apply", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("applied a0"));
}
