/// mcfunction abstract syntax tree types.
pub mod ast;
/// Re-exports from the diagnostics crate.
pub mod diag;
/// JSON serialization helpers for the AST.
pub mod dump;
/// Parse error types and their diagnostic codes.
pub mod error;
/// Character-level recognizers and a flat tokenizer over borrowed input.
pub mod lexer;
mod macros;
mod nbt;
/// Strict and tolerant parsing of source text into a [`ast::Document`].
pub mod parser;
/// Tree-sitter style S-expression rendering of a document.
pub mod sexp;
