//! Shared test helpers for `mcfunction_toolchain_core` integration tests.

#![allow(unreachable_pub)]

use mcfunction_toolchain_core::grammar::ast::{Argument, Command, Document, Statement};
use mcfunction_toolchain_core::grammar::parser::ParseResult;
use mcfunction_toolchain_core::{Diagnostic, Spanned};

/// A realistic function file touching every statement and argument kind.
#[allow(dead_code)]
pub const SAMPLE: &str = r#"#> my_pack:load
# Sets up scoreboards.
#! run once per reload
scoreboard objectives add timer dummy
scoreboard players set #tick timer 0
execute as @a[tag=admin,scores={timer=1}] at @s run tp @s ~ ~1 ~
setblock 0 64 0 minecraft:chest[facing=north]{Lock:"key"} replace
data merge entity @e[type=minecraft:zombie,limit=1] {CustomName:'"Bob"',Tags:["a","b"],Health:20.0f}
data get entity @s Inventory[0].id
tp @s ^ ^ ^2.5
give @p diamond 64
say hello \
    world
$tellraw @a "Hello $(name)!"
$execute as @a run tp @s $(x) $(y) $(z)
function my_pack:util/reset
"#;

/// First statement of a strict parse.
#[allow(dead_code)]
pub fn first_statement(input: &str) -> Statement {
    let doc = mcfunction_toolchain_core::parse(input)
        .unwrap_or_else(|e| panic!("failed to parse {input:?}: {e}"));
    doc.statements
        .into_iter()
        .next()
        .unwrap_or_else(|| panic!("no statements in {input:?}"))
}

/// The single plain command of `input`.
#[allow(dead_code)]
pub fn only_command(input: &str) -> Command {
    match first_statement(input) {
        Statement::Command(c) => c,
        other => panic!("expected a command for {input:?}, got {other:?}"),
    }
}

/// Argument list of the first plain or macro command.
#[allow(dead_code)]
pub fn arguments(input: &str) -> Vec<Argument> {
    match first_statement(input) {
        Statement::Command(c) => c.arguments,
        Statement::MacroCommand(m) => m.arguments,
        other => panic!("expected a command for {input:?}, got {other:?}"),
    }
}

/// Diagnostic codes of a tolerant parse, in order.
#[allow(dead_code)]
pub fn diag_codes(result: &ParseResult) -> Vec<String> {
    result
        .diagnostics
        .iter()
        .map(|d| d.id.to_string())
        .collect()
}

/// Find the first diagnostic with the given code.
#[allow(dead_code)]
pub fn find_diag<'a>(diags: &'a [Diagnostic], code: &str) -> &'a Diagnostic {
    diags
        .iter()
        .find(|d| &*d.id == code)
        .unwrap_or_else(|| panic!("expected diagnostic {code}"))
}

/// Statement spans are ordered, disjoint and inside the input.
#[allow(dead_code)]
pub fn assert_statement_spans(doc: &Document, input: &str) {
    let mut prev_end = 0;
    for statement in &doc.statements {
        let span = statement.span();
        assert!(
            span.start >= prev_end,
            "statement at {}..{} overlaps previous end {prev_end}",
            span.start,
            span.end
        );
        assert!(span.end <= input.len(), "span {span:?} past input end");
        assert!(
            input.is_char_boundary(span.start) && input.is_char_boundary(span.end),
            "span {span:?} splits a character"
        );
        prev_end = span.end;
    }
}

/// Whether `gap` is only whitespace and line continuations.
#[allow(dead_code)]
pub fn is_trivia(gap: &str) -> bool {
    gap.chars().all(|c| matches!(c, ' ' | '\t' | '\r' | '\n' | '\\'))
}
