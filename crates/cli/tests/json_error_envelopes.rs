//! Ensure CLI command failures honor `--output json`.

use std::process::Command;

use assert_cmd::cargo;

fn mcf_cmd() -> Command {
    Command::new(cargo::cargo_bin!("mcfunction"))
}

#[test]
fn parse_missing_file_emits_json_error_envelope() {
    let output = mcf_cmd()
        .args(["parse", "nope-does-not-exist.mcfunction", "--output", "json"])
        .output()
        .expect("run parse command");

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid json envelope");
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "command_failed");
    assert!(
        json["message"]
            .as_str()
            .is_some_and(|m| m.contains("failed to read")),
        "unexpected message: {}",
        json["message"]
    );
}

#[test]
fn missing_file_pretty_reports_on_stderr() {
    let output = mcf_cmd()
        .args(["syntax-check", "nope-does-not-exist.mcfunction", "--output", "pretty"])
        .output()
        .expect("run syntax-check command");

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("error: failed to read"), "unexpected stderr: {stderr}");
}
