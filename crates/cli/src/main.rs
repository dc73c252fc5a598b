mod render;

use std::fs;
use std::io::{self, Read};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mcfunction_toolchain_core::{
    Diagnostic, Document, ParseError, ParseOptions, parse_strict_with_options,
    parse_with_options, to_pretty_json, to_sexp, to_sexp_with_ranges, tokenize,
};
use mcfunction_toolchain_diagnostics as diag;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::render::{Format, print_summary, render_diagnostics};

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "mcfunction",
    version,
    about = "mcfunction toolchain: parse and syntax-check Minecraft function files"
)]
struct Cli {
    /// Output mode: "pretty" for coloured terminal output, "json" for
    /// machine-readable JSON. Defaults to "pretty" when stdout is a TTY,
    /// "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    /// Deepest allowed nesting of NBT containers and `run` clauses.
    #[arg(long, global = true, default_value_t = ParseOptions::default().max_depth)]
    max_depth: usize,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Parse a function file and print its syntax tree.
    Parse {
        /// Path to the file, or `-` for stdin.
        file: String,
        /// Print a tree-sitter style S-expression instead of JSON.
        #[arg(long)]
        sexp: bool,
        /// With `--sexp`, annotate every node with its row/column range.
        #[arg(long, requires = "sexp")]
        ranges: bool,
        /// Stop at the first error instead of recovering.
        #[arg(long)]
        strict: bool,
    },

    /// Syntax-check a function file; exits 1 when any error is found.
    #[command(alias = "check")]
    SyntaxCheck {
        /// Path to the file, or `-` for stdin.
        file: String,
    },

    /// Dump the flat token stream of a function file.
    Tokens {
        /// Path to the file, or `-` for stdin.
        file: String,
    },

    /// Explain a diagnostic ID (e.g. MCF2002).
    Explain { id: String },
}

#[derive(Serialize)]
struct ParseReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    document: Option<&'a Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sexp: Option<&'a str>,
    diagnostics: &'a [Diagnostic],
}

#[derive(Serialize)]
struct CheckReport<'a> {
    ok: bool,
    diagnostics: &'a [Diagnostic],
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() {
    init_logging();
    let cli = Cli::parse();
    let format = Format::resolve_or_detect(cli.output.as_deref());
    let options = ParseOptions {
        max_depth: cli.max_depth,
    };

    if let Err(err) = run(cli.cmd, &options, format) {
        match format {
            Format::Json => {
                let out = serde_json::json!({
                    "success": false,
                    "error": "command_failed",
                    "message": format!("{err:#}"),
                });
                println!("{out:#}");
            }
            Format::Pretty => eprintln!("error: {err:#}"),
        }
        process::exit(1);
    }
}

/// Log to stderr so stdout stays machine-readable. `RUST_LOG` overrides
/// the default `warn` filter.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cmd: Cmd, options: &ParseOptions, format: Format) -> Result<()> {
    match cmd {
        Cmd::Parse {
            file,
            sexp,
            ranges,
            strict,
        } => cmd_parse(&file, options, sexp, ranges, strict, format),
        Cmd::SyntaxCheck { file } => cmd_syntax_check(&file, options, format),
        Cmd::Tokens { file } => cmd_tokens(&file, format),
        Cmd::Explain { id } => cmd_explain(&id, format),
    }
}

// ── Commands ────────────────────────────────────────────────────────────

fn cmd_parse(
    file: &str,
    options: &ParseOptions,
    sexp: bool,
    ranges: bool,
    strict: bool,
    format: Format,
) -> Result<()> {
    let (name, input) = read_source(file)?;
    let (document, diagnostics) = if strict {
        match parse_strict_with_options(&input, options) {
            Ok(doc) => (Some(doc), Vec::new()),
            Err(err) => (None, vec![err.to_diagnostic()]),
        }
    } else {
        let res = parse_with_options(&input, options);
        (Some(res.document), res.diagnostics)
    };

    let tree = document.as_ref().map(|doc| match (sexp, ranges) {
        (true, true) => to_sexp_with_ranges(doc, &input),
        (true, false) => to_sexp(doc),
        (false, _) => to_pretty_json(doc),
    });

    match format {
        Format::Json => {
            let report = ParseReport {
                document: document.as_ref().filter(|_| !sexp),
                sexp: tree.as_deref().filter(|_| sexp),
                diagnostics: &diagnostics,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Format::Pretty => {
            // Tree to stdout, diagnostics to stderr.
            if let Some(tree) = &tree {
                println!("{tree}");
            }
            if !diagnostics.is_empty() {
                render_diagnostics(&input, &name, &diagnostics, format);
                print_summary(&diagnostics);
            }
        }
    }

    exit_on_errors(&diagnostics);
    Ok(())
}

fn cmd_syntax_check(file: &str, options: &ParseOptions, format: Format) -> Result<()> {
    let (name, input) = read_source(file)?;
    let res = parse_with_options(&input, options);
    let ok = !res.has_errors();

    match format {
        Format::Json => {
            let report = CheckReport {
                ok,
                diagnostics: &res.diagnostics,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Format::Pretty => {
            render_diagnostics(&input, &name, &res.diagnostics, format);
            print_summary(&res.diagnostics);
            if ok {
                eprintln!("syntax ok");
            }
        }
    }

    exit_on_errors(&res.diagnostics);
    Ok(())
}

fn cmd_tokens(file: &str, format: Format) -> Result<()> {
    let (name, input) = read_source(file)?;
    let tokens = match tokenize(&input) {
        Ok(tokens) => tokens,
        Err(err) => {
            let diagnostics = [ParseError::from(err).to_diagnostic()];
            render_diagnostics(&input, &name, &diagnostics, format);
            if format == Format::Pretty {
                print_summary(&diagnostics);
            }
            process::exit(1);
        }
    };

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&tokens)?),
        Format::Pretty => {
            for tok in &tokens {
                println!(
                    "{:>6}..{:<6} {:<14} {:?}",
                    tok.start,
                    tok.end,
                    format!("{:?}", tok.kind),
                    tok.text
                );
            }
        }
    }
    Ok(())
}

fn cmd_explain(id: &str, format: Format) -> Result<()> {
    match format {
        Format::Json => {
            let out = serde_json::json!({
                "id": id,
                "explanation": diag::explain(id),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            // The explanation is the command's output, so it goes to stdout.
            if let Some(text) = diag::explain(id) {
                use ariadne::Fmt;
                println!("{}: {}", id.fg(ariadne::Color::Cyan), text);
            } else {
                println!("{id}: (no explanation available)");
            }
        }
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Read `file`, or stdin when it is `-`. Returns the display name and text.
fn read_source(file: &str) -> Result<(String, String)> {
    let (name, input) = if file == "-" {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .context("failed to read stdin")?;
        ("<stdin>".to_string(), input)
    } else {
        let input =
            fs::read_to_string(file).with_context(|| format!("failed to read '{file}'"))?;
        (file.to_string(), input)
    };
    debug!(source = %name, bytes = input.len(), "read source");
    Ok((name, input))
}

/// Exit with code 1 if any diagnostic is an error.
/// Warnings and info do not cause a non-zero exit.
fn exit_on_errors(diagnostics: &[Diagnostic]) {
    if diagnostics.iter().any(Diagnostic::is_error) {
        process::exit(1);
    }
}
