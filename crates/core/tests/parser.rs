//! Integration tests for the mcfunction parser.
//!
//! Covers: statement splitting, comment classification, argument dispatch,
//! NBT, macros, run clauses, span tracking, tolerant recovery and the JSON
//! dump. Lexer and NBT details also have unit tests next to their code.

mod common;

use common::{
    SAMPLE, arguments, assert_statement_spans, diag_codes, find_diag, first_statement, is_trivia,
    only_command,
};
use mcfunction_toolchain_core::grammar::ast::{
    CommentKind, CoordPart, MacroFragment, MacroName, NbtValue, PairOperator, Quote,
    SelectorTarget, SubCommand,
};
use mcfunction_toolchain_core::{
    Argument, LineIndex, ParseOptions, Severity, Span, Spanned, Statement, codes, parse,
    parse_strict_with_options, parse_tolerant, parse_with_options, to_pretty_json,
};

// ─── Statements and reconstruction ──────────────────────────────────────────

#[test]
fn sample_parses_strictly() {
    let doc = parse(SAMPLE).expect("sample should parse");
    assert_eq!(doc.statements.len(), 15);
    assert!(!doc.has_errors());
    assert_statement_spans(&doc, SAMPLE);
}

#[test]
fn statement_spans_and_trivia_reconstruct_input() {
    let doc = parse(SAMPLE).unwrap();
    let mut rebuilt = String::new();
    let mut cursor = 0;
    for statement in &doc.statements {
        let span = statement.span();
        let gap = &SAMPLE[cursor..span.start];
        assert!(is_trivia(gap), "non-trivia gap {gap:?} before {span:?}");
        rebuilt.push_str(gap);
        rebuilt.push_str(&SAMPLE[span.start..span.end]);
        cursor = span.end;
    }
    let tail = &SAMPLE[cursor..];
    assert!(is_trivia(tail), "non-trivia tail {tail:?}");
    rebuilt.push_str(tail);
    assert_eq!(rebuilt, SAMPLE);
}

#[test]
fn strict_equals_tolerant_without_diagnostics() {
    let inputs = [
        SAMPLE,
        "",
        "say hi",
        "# only a comment",
        "execute as @a at @s run say hi",
        "$say $(name)",
        "data merge block 0 0 0 {Text1:\"hi\"}",
    ];
    for input in inputs {
        let strict = parse(input).unwrap_or_else(|e| panic!("{input:?}: {e}"));
        let tolerant = parse_tolerant(input);
        assert!(tolerant.diagnostics.is_empty(), "{input:?}");
        assert_eq!(strict, tolerant.document, "{input:?}");
    }
}

#[test]
fn blank_and_whitespace_lines_are_skipped() {
    let doc = parse("\n   \nsay a\n\t\n\nsay b\n").unwrap();
    assert_eq!(doc.statements.len(), 2);
}

#[test]
fn crlf_line_endings() {
    let doc = parse("say a\r\nsay b\r\n").unwrap();
    assert_eq!(doc.statements.len(), 2);
    assert_eq!(doc.statements[0].span(), Span::new(0, 5));
    assert_eq!(doc.statements[1].span(), Span::new(7, 12));
}

#[test]
fn continuation_joins_lines_into_one_statement() {
    let input = "say hello \\\n    world\nsay next";
    let doc = parse(input).unwrap();
    assert_eq!(doc.statements.len(), 2);
    let Statement::Command(cmd) = &doc.statements[0] else {
        panic!("not a command");
    };
    assert_eq!(cmd.arguments.len(), 2);
    assert_eq!(cmd.arguments[1].span().slice(input), Some("world"));
}

// ─── Comments ───────────────────────────────────────────────────────────────

#[test]
fn comment_kinds() {
    let Statement::Comment(c) = first_statement("# hello") else {
        panic!("not a comment");
    };
    assert_eq!(c.kind, CommentKind::Normal);
    assert_eq!(c.tag, "#");
    assert_eq!(c.content.as_deref(), Some(" hello"));

    let Statement::Comment(c) = first_statement("#! important") else {
        panic!("not a comment");
    };
    assert_eq!(c.kind, CommentKind::Important);
    assert_eq!(c.content.as_deref(), Some(" important"));

    let Statement::Comment(c) = first_statement("#> key: value") else {
        panic!("not a comment");
    };
    assert_eq!(c.kind, CommentKind::Directive);
    assert_eq!(c.directive_key.as_deref(), Some("key"));
    assert_eq!(c.directive_value.as_deref(), Some(" value"));
}

#[test]
fn comment_text_is_not_parsed_as_arguments() {
    let Statement::Comment(c) = first_statement("# say {broken [ \"") else {
        panic!("not a comment");
    };
    assert_eq!(c.content.as_deref(), Some(" say {broken [ \""));
}

// ─── Commands and arguments ─────────────────────────────────────────────────

#[test]
fn plain_command_with_keywords() {
    let cmd = only_command("say hello world");
    assert_eq!(cmd.name.text, "say");
    let words: Vec<&str> = cmd
        .arguments
        .iter()
        .map(|a| match a {
            Argument::Keyword(k) => k.text.as_str(),
            other => panic!("expected keyword, got {other:?}"),
        })
        .collect();
    assert_eq!(words, vec!["hello", "world"]);
}

#[test]
fn relative_coordinates_without_offsets() {
    let args = arguments("tp ~ ~ ~");
    let Argument::Coordinates(c) = &args[0] else {
        panic!("not coordinates");
    };
    assert!(
        c.parts
            .iter()
            .all(|p| matches!(p, CoordPart::Relative { offset: None, .. }))
    );
}

#[test]
fn relative_coordinates_with_offsets() {
    let args = arguments("tp ~1 ~ ~-1");
    let Argument::Coordinates(c) = &args[0] else {
        panic!("not coordinates");
    };
    let offsets: Vec<Option<f64>> = c
        .parts
        .iter()
        .map(|p| match p {
            CoordPart::Relative { offset, .. } => *offset,
            other => panic!("expected relative part, got {other:?}"),
        })
        .collect();
    assert_eq!(offsets, vec![Some(1.0), None, Some(-1.0)]);
}

#[test]
fn absolute_and_local_coordinates() {
    let args = arguments("tp 1.5 2 3");
    let Argument::Coordinates(c) = &args[0] else {
        panic!("not coordinates");
    };
    let values: Vec<f64> = c
        .parts
        .iter()
        .map(|p| match p {
            CoordPart::Absolute { value, .. } => *value,
            other => panic!("expected absolute part, got {other:?}"),
        })
        .collect();
    assert_eq!(values, vec![1.5, 2.0, 3.0]);

    let args = arguments("tp ^ ^ ^2.5");
    let Argument::Coordinates(c) = &args[0] else {
        panic!("not coordinates");
    };
    assert!(matches!(c.parts[2], CoordPart::Local { offset: Some(o), .. } if o == 2.5));
}

#[test]
fn selectors_with_and_without_filters() {
    let args = arguments("kill @e[type=minecraft:zombie,limit=1] @s");
    let Argument::Selector(s) = &args[0] else {
        panic!("not a selector");
    };
    assert_eq!(s.target, SelectorTarget::AllEntities);
    let filter = s.filter.as_ref().expect("filter");
    assert_eq!(filter.items.len(), 2);
    let Argument::Selector(s) = &args[1] else {
        panic!("not a selector");
    };
    assert_eq!(s.target, SelectorTarget::Executor);
    assert!(s.filter.is_none());
}

#[test]
fn strings_keep_quote_and_raw_value() {
    let args = arguments(r#"say "a \"b\"" 'c'"#);
    let Argument::String(s) = &args[0] else {
        panic!("not a string");
    };
    assert_eq!(s.quote, Quote::Double);
    assert_eq!(s.value, r#"a \"b\""#);
    assert_eq!(s.unescaped(), r#"a "b""#);
    assert!(matches!(&args[1], Argument::String(s) if s.quote == Quote::Single && s.value == "c"));
}

#[test]
fn booleans_fake_players_and_paths() {
    let args = arguments("scoreboard players get #global obj true");
    assert!(matches!(&args[2], Argument::FakePlayer(f) if f.name == "global"));
    assert!(matches!(&args[4], Argument::Boolean(b) if b.value));

    let args = arguments("data get entity @s Inventory[0].tag.display");
    let Argument::NbtPath(path) = &args[3] else {
        panic!("not a path");
    };
    let names: Vec<&str> = path
        .segments
        .iter()
        .filter_map(|s| s.name.as_str())
        .collect();
    assert_eq!(names, vec!["Inventory", "tag", "display"]);
    assert_eq!(path.segments[0].indices().count(), 1);
}

#[test]
fn execute_chain_nests_run_clause() {
    let cmd = only_command("execute as @a at @s run say hi");
    assert_eq!(cmd.arguments.len(), 5);
    let Argument::Run(run) = &cmd.arguments[4] else {
        panic!("not a run clause");
    };
    let SubCommand::Command(inner) = run.subcommand.as_ref() else {
        panic!("expected plain subcommand");
    };
    assert_eq!(inner.name.text, "say");
    assert_eq!(run.span.end, cmd.span.end);
}

#[test]
fn compound_with_one_colon_pair() {
    let args = arguments("data merge block 0 0 0 {Text1:\"hi\"}");
    assert!(matches!(&args[2], Argument::Coordinates(_)));
    let Argument::NbtCompound(c) = &args[3] else {
        panic!("not a compound");
    };
    assert_eq!(c.pairs.len(), 1);
    assert_eq!(c.pairs[0].key.as_str(), Some("Text1"));
    assert_eq!(c.pairs[0].operator, PairOperator::Colon);
    assert!(matches!(&c.pairs[0].value, NbtValue::String(s) if s.value == "hi"));
}

// ─── Macros ─────────────────────────────────────────────────────────────────

#[test]
fn macro_command_with_interpolation() {
    let Statement::MacroCommand(m) = first_statement("$say $(name)") else {
        panic!("not a macro command");
    };
    assert!(matches!(&m.name, MacroName::Literal(i) if i.text == "say"));
    let [Argument::Macro(arg)] = m.arguments.as_slice() else {
        panic!("expected one macro argument");
    };
    assert!(
        matches!(arg.fragments.as_slice(), [MacroFragment::Interpolation(i)] if i.expression == "name")
    );
}

#[test]
fn interpolation_outside_macro_line_is_reported() {
    let result = parse_tolerant("say $(name)\nsay ok");
    assert_eq!(diag_codes(&result), vec![codes::MACRO_OUTSIDE_MACRO_COMMAND]);
    assert_eq!(result.document.statements.len(), 2);
}

// ─── Tolerant recovery ──────────────────────────────────────────────────────

#[test]
fn malformed_compound_costs_one_diagnostic() {
    let input = "data merge block 0 0 0 {foo=}\nsay next";
    let result = parse_tolerant(input);
    assert_eq!(diag_codes(&result), vec![codes::NBT_MISSING_VALUE]);
    assert_eq!(result.document.statements.len(), 2);
    let Statement::Command(first) = &result.document.statements[0] else {
        panic!("first statement should still be a command");
    };
    assert!(matches!(first.arguments.last(), Some(Argument::Error(_))));
    assert!(matches!(&result.document.statements[1], Statement::Command(c) if c.name.text == "say"));
}

#[test]
fn several_errors_on_one_line() {
    let result = parse_tolerant("give @x stone {}");
    assert_eq!(
        diag_codes(&result),
        vec![codes::SELECTOR_UNKNOWN_TARGET, codes::NBT_EMPTY_COMPOUND]
    );
    let Statement::Command(cmd) = &result.document.statements[0] else {
        panic!("not a command");
    };
    assert!(matches!(&cmd.arguments[1], Argument::Keyword(k) if k.text == "stone"));
}

#[test]
fn unparseable_line_becomes_error_statement() {
    let input = "say ok\nSay broken\nsay after";
    let result = parse_tolerant(input);
    assert_eq!(diag_codes(&result), vec![codes::UNEXPECTED_CHARACTER]);
    assert!(matches!(&result.document.statements[1], Statement::Error(e) if e.span == Span::new(7, 17)));
    assert_eq!(result.document.statements.len(), 3);
    assert!(result.has_errors());
    assert!(result.document.has_errors());
}

#[test]
fn unterminated_string_recovers_at_line_end() {
    let result = parse_tolerant("say \"abc\nsay ok");
    assert_eq!(diag_codes(&result), vec![codes::LEX_UNTERMINATED_STRING]);
    assert!(matches!(&result.document.statements[1], Statement::Command(c) if c.name.text == "say"));
}

#[test]
fn broken_coordinate_triple_is_one_diagnostic() {
    let result = parse_tolerant("tp @s ~ ~\nsay ok");
    assert_eq!(diag_codes(&result), vec![codes::MALFORMED_COORDINATES]);
    let span = result.diagnostics[0].span.expect("span");
    assert_eq!((span.start, span.end), (6, 9));
    assert_eq!(result.document.statements.len(), 2);

    let result = parse_tolerant("tp @s ^ ^1 facing");
    assert_eq!(diag_codes(&result), vec![codes::MALFORMED_COORDINATES]);
}

#[test]
fn bad_escape_before_continuation_stays_one_statement() {
    let input = "say \"a\\\n b c\"";
    let result = parse_tolerant(input);
    assert_eq!(diag_codes(&result), vec![codes::LEX_INVALID_ESCAPE]);
    assert_eq!(result.document.statements.len(), 1);
    assert_statement_spans(&result.document, input);
}

#[test]
fn macro_line_without_interpolation_warns() {
    let result = parse_tolerant("$say hi\n$say $(name)");
    assert_eq!(diag_codes(&result), vec![codes::MACRO_WITHOUT_INTERPOLATION]);
    assert_eq!(result.diagnostics[0].severity, Severity::Warn);
    assert!(!result.has_errors());
    assert!(!result.document.has_errors());
    assert!(parse("$say hi").is_ok());
}

#[test]
fn diagnostics_point_at_the_right_line() {
    let input = "say ok\ntp ~ ~\n";
    let result = parse_tolerant(input);
    let diag = find_diag(&result.diagnostics, codes::MALFORMED_COORDINATES);
    let span = diag.span.expect("span");
    let (line, col) = LineIndex::new(input).line_col(span.start);
    assert_eq!((line, col), (1, 3));
}

#[test]
fn strict_parse_reports_first_error() {
    let cases = [
        ("kill @x", codes::SELECTOR_UNKNOWN_TARGET),
        ("function my_pack:", codes::RESOURCE_MISSING_PATH),
        ("tp ~ ~", codes::MALFORMED_COORDINATES),
        ("say a\"b\"", codes::MISSING_SEPARATOR),
        ("Say hi", codes::UNEXPECTED_CHARACTER),
        ("say \"open", codes::LEX_UNTERMINATED_STRING),
    ];
    for (input, code) in cases {
        let err = parse(input).unwrap_err();
        assert_eq!(err.code(), code, "input: {input}");
        assert!(err.span.end <= input.len());
    }
}

#[test]
fn depth_limit_in_options() {
    let input = "x [[[[1]]]]";
    let shallow = ParseOptions { max_depth: 2 };
    let err = parse_strict_with_options(input, &shallow).unwrap_err();
    assert_eq!(err.code(), codes::NESTING_TOO_DEEP);

    let result = parse_with_options(input, &shallow);
    assert_eq!(diag_codes(&result), vec![codes::NESTING_TOO_DEEP]);
    assert!(parse_with_options(input, &ParseOptions::default()).diagnostics.is_empty());
}

#[test]
fn nesting_past_the_limit_is_skipped_whole() {
    let input = format!("x {}1{}\nsay ok", "[".repeat(5_000), "]".repeat(5_000));
    let result = parse_with_options(&input, &ParseOptions { max_depth: 32 });
    assert_eq!(result.document.statements.len(), 2);
    assert_eq!(diag_codes(&result), vec![codes::NESTING_TOO_DEEP]);
}

// ─── Serialization ──────────────────────────────────────────────────────────

#[test]
fn json_dump_tags_statement_kinds() {
    let doc = parse("# c\nsay hi").unwrap();
    let json = to_pretty_json(&doc);
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let kinds: Vec<&str> = value["statements"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["Comment", "Command"]);
}
