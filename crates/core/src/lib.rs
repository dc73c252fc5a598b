//! mcfunction toolchain core library.
//!
//! Parses Minecraft `.mcfunction` source into a positioned syntax tree.
//! The main entry points are [`parse`] (strict: first error aborts),
//! [`parse_tolerant`] (errors become diagnostics plus error nodes) and
//! [`to_sexp`] for a compact tree dump.

#![warn(missing_docs)]

/// mcfunction grammar: lexer, parser, AST, and related utilities.
pub mod grammar;

// ── Convenience re-exports ──────────────────────────────────────────────────

// Parser
pub use grammar::parser::{
    ParseOptions, ParseResult, parse, parse_strict_with_options, parse_tolerant,
    parse_with_options,
};

// Errors
pub use grammar::error::{ErrorKind, LexError, LexErrorKind, ParseError, StructuralErrorKind};

// AST
pub use grammar::ast::{Argument, Comment, CommentKind, Document, Spanned, Statement};
pub use grammar::lexer::{TokKind, Token, tokenize};

// Diagnostics (re-exported from the diagnostics crate)
pub use grammar::diag::{Diagnostic, LineIndex, Severity, Span, codes};

// Serialization helpers
pub use grammar::dump::{to_json, to_pretty_json};
pub use grammar::sexp::{to_sexp, to_sexp_with_ranges};
