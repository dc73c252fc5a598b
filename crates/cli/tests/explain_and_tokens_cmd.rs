//! CLI tests for `mcfunction explain` and `mcfunction tokens`.

use std::fs;
use std::process::Command;

use assert_cmd::cargo;

fn mcf_cmd() -> Command {
    Command::new(cargo::cargo_bin!("mcfunction"))
}

#[test]
fn explain_known_code_json_returns_explanation() {
    let output = mcf_cmd()
        .args(["explain", "MCF2002", "--output", "json"])
        .output()
        .expect("run explain command");

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(json["id"], "MCF2002");
    assert!(json["explanation"].is_string());
}

#[test]
fn explain_unknown_code_json_returns_null_explanation() {
    let output = mcf_cmd()
        .args(["explain", "MCF9999", "--output", "json"])
        .output()
        .expect("run explain command");

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(json["id"], "MCF9999");
    assert!(json["explanation"].is_null());
}

#[test]
fn explain_pretty_shows_human_readable_text() {
    let output = mcf_cmd()
        .args(["explain", "MCF3001", "--output", "pretty"])
        .output()
        .expect("run explain command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("MCF3001") && stdout.contains(':'),
        "unexpected output: {stdout}"
    );
}

#[test]
fn tokens_json_lists_kinds_and_offsets() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("t.mcfunction");
    fs::write(&path, "say @a").expect("write temp mcfunction");

    let output = mcf_cmd()
        .args(["tokens", &path.to_string_lossy(), "--output", "json"])
        .output()
        .expect("run tokens command");

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    let tokens = json.as_array().expect("token array");
    let kinds: Vec<&str> = tokens.iter().filter_map(|t| t["kind"].as_str()).collect();
    assert_eq!(kinds, vec!["word", "whitespace", "selector"]);
    assert_eq!(tokens[2]["start"], 4);
    assert_eq!(tokens[2]["end"], 6);
}

#[test]
fn tokens_lex_error_exits_nonzero() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("t.mcfunction");
    fs::write(&path, "say \"open").expect("write temp mcfunction");

    let output = mcf_cmd()
        .args(["tokens", &path.to_string_lossy(), "--output", "json"])
        .output()
        .expect("run tokens command");

    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(json[0]["id"], "MCF1001");
}
