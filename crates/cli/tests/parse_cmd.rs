//! CLI tests for `mcfunction parse`: JSON tree, S-expression output, strict
//! mode and stdin input.

use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

use assert_cmd::cargo;

const SAMPLE: &str = "# setup\nexecute as @a run say hi\n$tp @s $(x) 0 0\n";

fn mcf_cmd() -> Command {
    Command::new(cargo::cargo_bin!("mcfunction"))
}

fn write_temp(content: &str) -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("load.mcfunction");
    fs::write(&path, content).expect("write temp mcfunction");
    (dir, path.to_string_lossy().to_string())
}

fn run_with_stdin(args: &[&str], stdin_body: &str) -> std::process::Output {
    let mut child = mcf_cmd()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn mcfunction command");

    {
        let stdin = child.stdin.as_mut().expect("stdin handle");
        stdin
            .write_all(stdin_body.as_bytes())
            .expect("write stdin body");
    }

    child.wait_with_output().expect("wait for output")
}

#[test]
fn parse_json_contains_document_and_diagnostics() {
    let (_dir, path) = write_temp(SAMPLE);
    let output = mcf_cmd()
        .args(["parse", &path, "--output", "json"])
        .output()
        .expect("run parse");

    assert!(
        output.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid json output");
    let statements = json["document"]["statements"]
        .as_array()
        .expect("statements array");
    assert_eq!(statements.len(), 3);
    assert_eq!(statements[0]["kind"], "Comment");
    assert_eq!(statements[1]["kind"], "Command");
    assert_eq!(statements[2]["kind"], "MacroCommand");
    assert_eq!(json["diagnostics"].as_array().map(Vec::len), Some(0));
}

#[test]
fn parse_sexp_pretty_prints_tree() {
    let (_dir, path) = write_temp("say hello\n");
    let output = mcf_cmd()
        .args(["parse", &path, "--sexp", "--output", "pretty"])
        .output()
        .expect("run parse");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        "(source_file\n  (command\n    (command_name)\n    (keyword)))"
    );
}

#[test]
fn parse_sexp_ranges() {
    let (_dir, path) = write_temp("say hello\n");
    let output = mcf_cmd()
        .args(["parse", &path, "--sexp", "--ranges", "--output", "pretty"])
        .output()
        .expect("run parse");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("(command [0, 0] - [0, 9]"),
        "unexpected output: {stdout}"
    );
}

#[test]
fn ranges_require_sexp() {
    let (_dir, path) = write_temp("say hello\n");
    let output = mcf_cmd()
        .args(["parse", &path, "--ranges"])
        .output()
        .expect("run parse");
    assert!(!output.status.success());
}

#[test]
fn parse_tolerant_reports_errors_and_exits_nonzero() {
    let (_dir, path) = write_temp("give @s stone {}\nsay ok\n");
    let output = mcf_cmd()
        .args(["parse", &path, "--output", "json"])
        .output()
        .expect("run parse");

    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid json output");
    assert_eq!(json["diagnostics"][0]["id"], "MCF2007");
    assert_eq!(
        json["document"]["statements"].as_array().map(Vec::len),
        Some(2)
    );
}

#[test]
fn parse_strict_omits_document_on_error() {
    let (_dir, path) = write_temp("say ok\nkill @x\n");
    let output = mcf_cmd()
        .args(["parse", &path, "--strict", "--output", "json"])
        .output()
        .expect("run parse");

    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid json output");
    assert!(json.get("document").is_none());
    assert_eq!(json["diagnostics"].as_array().map(Vec::len), Some(1));
    assert_eq!(json["diagnostics"][0]["id"], "MCF2009");
}

#[test]
fn parse_supports_stdin_dash_path() {
    let output = run_with_stdin(&["parse", "-", "--sexp", "--output", "json"], SAMPLE);
    assert!(
        output.status.success(),
        "parse stdin should succeed, stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid json output");
    let sexp = json["sexp"].as_str().expect("sexp string");
    assert!(sexp.starts_with("(source_file"));
    assert!(sexp.contains("(run_clause"));
}

#[test]
fn max_depth_flag_limits_nesting() {
    let (_dir, path) = write_temp("data merge entity @s {a:{b:{c:1}}}\n");
    let output = mcf_cmd()
        .args(["parse", &path, "--max-depth", "2", "--output", "json"])
        .output()
        .expect("run parse");

    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid json output");
    assert_eq!(json["diagnostics"][0]["id"], "MCF2013");
}
