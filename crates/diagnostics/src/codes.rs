//! Diagnostic id constants.
//!
//! Generated from `spec/diagnostics.jsonc` at build time. Use these instead of
//! string literals so a typo is a compile error.

include!(concat!(env!("OUT_DIR"), "/generated_codes.rs"));
