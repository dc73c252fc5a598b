//! Build script for generating diagnostic code data at compile time.
//!
//! Reads `spec/diagnostics.jsonc` and writes into `OUT_DIR`:
//! - `generated_codes.rs`: one `pub const` per diagnostic, named by `constName`
//! - `generated_explain.rs`: id → long description match expression
//! - `generated_severity.rs`: id → default severity match expression

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::Path;

use mcfunction_toolchain_jsonc_strip::strip_jsonc;

fn main() {
    let spec_path = Path::new("spec/diagnostics.jsonc");
    println!("cargo:rerun-if-changed={}", spec_path.display());

    let raw = fs::read_to_string(spec_path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", spec_path.display()));
    let spec: serde_json::Value = serde_json::from_str(&strip_jsonc(&raw))
        .expect("failed to parse diagnostics.jsonc as JSON");
    let diagnostics = spec["diagnostics"]
        .as_array()
        .expect("diagnostics.jsonc: expected `diagnostics` array");

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR not set");
    let out_path = Path::new(&out_dir);

    let mut seen_ids: HashSet<&str> = HashSet::new();
    let mut seen_names: HashSet<&str> = HashSet::new();

    let mut codes =
        String::from("// Auto-generated from spec/diagnostics.jsonc. DO NOT EDIT.\n\n");
    let mut explain = String::from("match id {\n");
    let mut severity = String::from("match id {\n");

    for (i, entry) in diagnostics.iter().enumerate() {
        let id = str_field(entry, i, "id");
        let const_name = str_field(entry, i, "constName");
        let summary = str_field(entry, i, "summary");
        let description = str_field(entry, i, "description");
        let sev = str_field(entry, i, "severity");

        assert!(
            id.len() == 7
                && id.starts_with("MCF")
                && id[3..].bytes().all(|b| b.is_ascii_digit()),
            "diagnostics[{i}]: id '{id}' must look like MCF1234"
        );
        assert!(
            !const_name.is_empty()
                && const_name.as_bytes()[0].is_ascii_uppercase()
                && const_name
                    .bytes()
                    .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_'),
            "diagnostics[{i}] (id={id}): constName '{const_name}' is not SCREAMING_SNAKE_CASE"
        );
        assert!(seen_ids.insert(id), "diagnostics[{i}]: duplicate id '{id}'");
        assert!(
            seen_names.insert(const_name),
            "diagnostics[{i}] (id={id}): duplicate constName '{const_name}'"
        );

        let sev_rs = match sev {
            "error" => "Severity::Error",
            "warn" => "Severity::Warn",
            other => panic!("diagnostics[{i}] (id={id}): invalid severity '{other}'"),
        };

        codes.push_str(&format!("/// {summary}\n"));
        codes.push_str(&format!("pub const {const_name}: &str = \"{id}\";\n\n"));
        explain.push_str(&format!(
            "    \"{id}\" => Some(\"{}\"),\n",
            escape_rust_string_literal(description)
        ));
        severity.push_str(&format!("    \"{id}\" => Some({sev_rs}),\n"));
    }

    explain.push_str("    _ => None,\n}\n");
    severity.push_str("    _ => None,\n}\n");

    fs::write(out_path.join("generated_codes.rs"), &codes)
        .expect("failed to write generated_codes.rs");
    fs::write(out_path.join("generated_explain.rs"), &explain)
        .expect("failed to write generated_explain.rs");
    fs::write(out_path.join("generated_severity.rs"), &severity)
        .expect("failed to write generated_severity.rs");
}

fn str_field<'a>(entry: &'a serde_json::Value, i: usize, name: &str) -> &'a str {
    entry[name]
        .as_str()
        .unwrap_or_else(|| panic!("diagnostics[{i}] missing string field `{name}`"))
}

fn escape_rust_string_literal(value: &str) -> String {
    value.chars().flat_map(char::escape_default).collect()
}
