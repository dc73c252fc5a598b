use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{
    ast::{
        Argument, Boolean, Command, Comment, CommentKind, CoordPart, Coordinates, Document,
        ErrorNode, FakePlayer, Identifier, Keyword, MacroCommand, MacroName, NbtKey, Number,
        Quote, ResourceLocation, RunClause, Selector, SelectorTarget, Spanned, Statement,
        StringLiteral, SubCommand,
    },
    diag::{Diagnostic, Span, codes},
    error::{ErrorKind, ParseError, StructuralErrorKind},
    lexer::{Lexer, is_blank},
};

/// Parser configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParseOptions {
    /// Deepest allowed nesting of NBT containers and `run` clauses.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { max_depth: 256 }
    }
}

/// Result of a tolerant parse.
#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    /// The parsed document, with error nodes where input was skipped.
    pub document: Document,
    /// Diagnostics in source order of discovery.
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseResult {
    /// Whether any diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

pub(super) type PResult<T> = Result<T, ParseError>;

// ─── Public API ─────────────────────────────────────────────────────────────

/// Parse strictly: the first error aborts the parse.
pub fn parse(input: &str) -> Result<Document, ParseError> {
    parse_strict_with_options(input, &ParseOptions::default())
}

/// Strict parse with explicit options.
pub fn parse_strict_with_options(
    input: &str,
    options: &ParseOptions,
) -> Result<Document, ParseError> {
    Parser::new(input, *options, false).parse_document()
}

/// Parse tolerantly: errors become diagnostics plus error nodes, and every
/// statement after a bad one is still parsed. Never fails.
pub fn parse_tolerant(input: &str) -> ParseResult {
    parse_with_options(input, &ParseOptions::default())
}

/// Tolerant parse with explicit options.
pub fn parse_with_options(input: &str, options: &ParseOptions) -> ParseResult {
    let mut parser = Parser::new(input, *options, true);
    // Tolerant mode recovers from every error at statement level at the latest.
    let document = parser.parse_document().unwrap_or_default();
    ParseResult {
        document,
        diagnostics: parser.diags,
    }
}

// ─── Parser Implementation ─────────────────────────────────────────────────

pub(super) struct Parser<'a> {
    pub(super) lx: Lexer<'a>,
    pub(super) pos: usize,
    options: ParseOptions,
    tolerant: bool,
    depth: usize,
    diags: Vec<Diagnostic>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, options: ParseOptions, tolerant: bool) -> Self {
        Self {
            lx: Lexer::new(input),
            pos: 0,
            options,
            tolerant,
            depth: 0,
            diags: Vec::new(),
        }
    }

    // ── Shared helpers ──────────────────────────────────────────────────

    pub(super) fn byte(&self) -> Option<u8> {
        self.lx.byte(self.pos)
    }

    pub(super) fn text(&self, start: usize, end: usize) -> String {
        self.lx.slice(start, end).to_string()
    }

    pub(super) fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.pos)
    }

    /// End of the whitespace-free chunk starting at `pos`, for error spans.
    pub(super) fn chunk_end(&self, pos: usize) -> usize {
        let mut i = pos;
        while self.lx.byte(i).is_some_and(|b| !is_blank(b) && b != b'\n') {
            i = self.lx.char_end(i);
        }
        i.max(self.lx.char_end(pos).min(self.lx.len()))
    }

    /// Error for a character that begins no construct.
    pub(super) fn unexpected(&self, pos: usize, what: &str) -> ParseError {
        let end = self.lx.char_end(pos);
        let found = self.lx.slice(pos, end);
        let message = if found.is_empty() || found == "\n" {
            format!("expected {what}, found end of statement")
        } else {
            format!("expected {what}, found '{}'", found.escape_default())
        };
        ParseError::structural(
            StructuralErrorKind::UnexpectedToken,
            Span::new(pos, end.min(self.lx.statement_end(pos)).max(pos)),
            message,
        )
    }

    /// Run `f` one nesting level deeper, failing once `max_depth` is reached.
    pub(super) fn nested<T>(
        &mut self,
        start: usize,
        f: impl FnOnce(&mut Self) -> PResult<T>,
    ) -> PResult<T> {
        if self.depth >= self.options.max_depth {
            return Err(ParseError::structural(
                StructuralErrorKind::NestingTooDeep,
                Span::new(start, self.lx.char_end(start)),
                format!("nesting exceeds the limit of {}", self.options.max_depth),
            ));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // ── Recovery ────────────────────────────────────────────────────────

    /// Skip from `start` over one bracket-balanced, quote-aware chunk.
    ///
    /// Outside brackets the chunk ends at whitespace; inside it runs to the
    /// matching closer. A closer that matches nothing open ends the chunk
    /// before it, and so does the end of the statement.
    pub(super) fn skip_balanced(&self, start: usize) -> usize {
        let mut open: Vec<u8> = Vec::new();
        let mut i = start;
        while let Some(b) = self.lx.byte(i) {
            match b {
                b'\n' => break,
                b'\\' if self.lx.continuation_end(i).is_some() => {
                    if open.is_empty() {
                        break;
                    }
                    i = self.lx.continuation_end(i).unwrap_or(i + 1);
                }
                _ if is_blank(b) && open.is_empty() => break,
                // A broken string swallows the rest of the statement,
                // continuation lines included.
                b'"' | b'\'' => match self.lx.quoted_string_at(i) {
                    Ok((end, _)) => i = end,
                    Err(_) => {
                        return self.lx.trim_end(i, self.lx.statement_end(i)).max(i + 1);
                    }
                },
                b'[' => {
                    open.push(b']');
                    i += 1;
                }
                b'{' => {
                    open.push(b'}');
                    i += 1;
                }
                b']' | b'}' => {
                    if open.last() != Some(&b) {
                        break;
                    }
                    open.pop();
                    i += 1;
                    if open.is_empty() {
                        break;
                    }
                }
                _ => i = self.lx.char_end(i),
            }
        }
        i
    }

    /// Record `err`, skip the malformed chunk starting at `start` and
    /// return the error placeholder covering it.
    pub(super) fn recover(&mut self, start: usize, err: ParseError) -> ErrorNode {
        let limit = self.lx.statement_end(start);
        let mut end = self.skip_balanced(start).max(err.span.end.min(limit));
        if end <= start {
            end = self.lx.char_end(start).min(self.lx.len());
        }
        debug!(
            code = err.code(),
            start,
            end,
            message = %err.message,
            "recovered from parse error"
        );
        self.diags.push(err.to_diagnostic());
        self.pos = end;
        ErrorNode {
            message: err.message,
            span: Span::new(start, end),
        }
    }

    /// Propagate `err` in strict mode; recover in tolerant mode.
    pub(super) fn recover_or_fail(&mut self, start: usize, err: ParseError) -> PResult<ErrorNode> {
        if self.tolerant {
            Ok(self.recover(start, err))
        } else {
            Err(err)
        }
    }

    fn recover_statement(&mut self, start: usize, err: ParseError) -> Statement {
        let end = self.lx.statement_end(start);
        debug!(code = err.code(), start, end, "skipping malformed statement");
        self.diags.push(err.to_diagnostic());
        self.pos = end;
        Statement::Error(ErrorNode {
            message: err.message,
            span: Span::new(start, self.lx.trim_end(start, end)),
        })
    }

    // ── Document and statements ─────────────────────────────────────────

    fn parse_document(&mut self) -> PResult<Document> {
        debug!(
            bytes = self.lx.len(),
            tolerant = self.tolerant,
            "parsing mcfunction source"
        );
        let mut statements = Vec::new();
        loop {
            self.pos = self.lx.skip_trivia(self.pos);
            match self.byte() {
                None => break,
                Some(b'\n') => {
                    self.pos += 1;
                    continue;
                }
                Some(_) => {}
            }
            let start = self.pos;
            let statement = match self.parse_statement() {
                Ok(statement) => statement,
                Err(err) if self.tolerant => self.recover_statement(start, err),
                Err(err) => return Err(err),
            };
            trace!(
                start,
                end = statement.span().end,
                kind = statement_kind(&statement),
                "statement"
            );
            statements.push(statement);
        }
        debug!(
            statements = statements.len(),
            diagnostics = self.diags.len(),
            "parse finished"
        );
        Ok(Document { statements })
    }

    fn parse_statement(&mut self) -> PResult<Statement> {
        let start = self.pos;
        match self.byte() {
            Some(b'#') => Ok(Statement::Comment(self.parse_comment())),
            Some(b'$') => {
                let command = self.parse_macro_command()?;
                self.warn_if_never_interpolated(&command);
                Ok(Statement::MacroCommand(command))
            }
            Some(b) if b.is_ascii_lowercase() => Ok(Statement::Command(self.parse_command(false)?)),
            _ => {
                let found = self.lx.char_at(start).unwrap_or('\0');
                Err(ParseError::unexpected_character(
                    found,
                    Span::new(start, self.lx.char_end(start)),
                ))
            }
        }
    }

    /// Macro lines without any `$(...)` fail to load in game.
    fn warn_if_never_interpolated(&mut self, command: &MacroCommand) {
        let span = command.span;
        if self.lx.slice(span.start, span.end).contains("$(") {
            return;
        }
        debug!(start = span.start, "macro line without interpolation");
        self.diags.push(Diagnostic::from_code(
            codes::MACRO_WITHOUT_INTERPOLATION,
            "macro line has no $(...) interpolation",
            Some(span),
        ));
    }

    fn parse_comment(&mut self) -> Comment {
        let start = self.pos;
        let (tag_end, mark) = self.lx.comment_tag_at(start);
        let end = self.lx.comment_text_end(tag_end);
        self.pos = end;
        let tag = self.text(start, tag_end);
        let span = Span::new(start, end);
        let rest = (end > tag_end).then(|| self.text(tag_end, end));

        match mark {
            Some(b'>') => {
                let body = rest.unwrap_or_default();
                let (key, value) = match body.split_once(':') {
                    Some((key, value)) => (key, (!value.is_empty()).then(|| value.to_string())),
                    None => (body.as_str(), None),
                };
                let key = key.trim_matches(|c: char| c == ' ' || c == '\t');
                Comment {
                    kind: CommentKind::Directive,
                    tag,
                    content: None,
                    directive_key: (!key.is_empty()).then(|| key.to_string()),
                    directive_value: value,
                    span,
                }
            }
            Some(_) => Comment {
                kind: CommentKind::Important,
                tag,
                content: rest,
                directive_key: None,
                directive_value: None,
                span,
            },
            None => Comment {
                kind: CommentKind::Normal,
                tag,
                content: rest,
                directive_key: None,
                directive_value: None,
                span,
            },
        }
    }

    fn parse_identifier(&mut self) -> PResult<Identifier> {
        let start = self.pos;
        match self.lx.command_name_at(start) {
            Some(end) => {
                self.pos = end;
                Ok(Identifier {
                    text: self.text(start, end),
                    span: Span::new(start, end),
                })
            }
            None => Err(self.unexpected(start, "command name").expecting("command name")),
        }
    }

    /// A plain command at `self.pos`. Inside a macro line (`in_macro`) a
    /// nested command may still contain interpolations; the caller decides
    /// what it becomes.
    fn parse_command(&mut self, in_macro: bool) -> PResult<Command> {
        let start = self.pos;
        let name = self.parse_identifier()?;
        let arguments = self.parse_arguments(in_macro)?;
        Ok(Command {
            name,
            span: Span::new(start, self.args_end(start, &arguments)),
            arguments,
        })
    }

    fn parse_macro_command(&mut self) -> PResult<MacroCommand> {
        let start = self.pos;
        self.pos = self.lx.skip_trivia(start + 1);
        let name = if self.lx.interpolation_starts(self.pos) {
            MacroName::Interpolation(self.parse_interpolation()?)
        } else if self.lx.command_name_at(self.pos).is_some() {
            MacroName::Literal(self.parse_identifier()?)
        } else {
            return Err(self
                .unexpected(self.pos, "command name or interpolation after '$'")
                .expecting("command name"));
        };
        let arguments = self.parse_arguments(true)?;
        let end = self.args_end(name.span().start, &arguments);
        Ok(MacroCommand {
            name,
            arguments,
            span: Span::new(start, end),
        })
    }

    fn args_end(&self, start: usize, arguments: &[Argument]) -> usize {
        arguments.last().map_or(self.pos, |a| a.span().end).max(start)
    }

    // ── Arguments ───────────────────────────────────────────────────────

    fn parse_arguments(&mut self, in_macro: bool) -> PResult<Vec<Argument>> {
        let mut arguments = Vec::new();
        let mut after_error = false;
        loop {
            let gap = self.pos;
            self.pos = self.lx.skip_trivia(gap);
            if self.lx.at_line_end(self.pos) {
                self.pos = gap;
                break;
            }
            let start = self.pos;
            let glued = start == gap && !after_error && !matches!(self.byte(), Some(b'[' | b'{'));
            let parsed = if glued {
                Err(ParseError::structural(
                    StructuralErrorKind::MissingSeparator,
                    Span::new(start, self.chunk_end(start)),
                    "expected whitespace between arguments",
                )
                .expecting("whitespace"))
            } else {
                self.parse_argument(in_macro)
            };
            after_error = false;
            match parsed {
                Ok(argument) => arguments.push(argument),
                Err(err) => {
                    arguments.push(Argument::Error(self.recover_or_fail(start, err)?));
                    after_error = true;
                }
            }
        }
        Ok(arguments)
    }

    /// Dispatch on the argument starting at `self.pos`.
    fn parse_argument(&mut self, in_macro: bool) -> PResult<Argument> {
        let start = self.pos;
        if self.macro_argument_at(start, false) {
            let arg = self.parse_macro_argument(false)?;
            if !in_macro {
                return Err(ParseError::structural(
                    StructuralErrorKind::MacroOutsideMacroCommand,
                    arg.span,
                    "macro interpolation is only allowed in macro commands (lines starting with '$')",
                ));
            }
            return Ok(Argument::Macro(arg));
        }

        match self.byte() {
            Some(b'~' | b'^') => return self.parse_coordinates(),
            Some(b'"' | b'\'') => {
                let string = self.parse_quoted_string()?;
                if self.path_suffix_follows() {
                    return Ok(Argument::NbtPath(self.parse_path(NbtKey::Plain(string))?));
                }
                return Ok(Argument::String(string));
            }
            Some(b'@') => return self.parse_selector().map(Argument::Selector),
            Some(b'[') => return self.parse_list().map(Argument::NbtList),
            Some(b'{') => return self.parse_compound().map(Argument::NbtCompound),
            Some(b'#') => return self.parse_fake_player().map(Argument::FakePlayer),
            _ => {}
        }

        if self.lx.coordinates_at(start).is_some() {
            return self.parse_coordinates();
        }

        let number = self.lx.suffixed_number_at(start);
        let number_end = number.map_or(start, |(end, _)| end);
        let word = self.lx.word_at(start);

        if let Some(word_end) = word
            && self.lx.byte(word_end) == Some(b':')
            && number_end <= word_end
        {
            return match self.lx.identifier_at(word_end + 1) {
                Some(path_end) => Ok(Argument::ResourceLocation(
                    self.resource_location(start, word_end, path_end),
                )),
                None => Err(ParseError::structural(
                    StructuralErrorKind::ResourceMissingPath,
                    Span::new(start, word_end + 1),
                    format!(
                        "resource location '{}' has no path after ':'",
                        self.lx.slice(start, word_end)
                    ),
                )
                .expecting("resource path")),
            };
        }

        if let Some((end, suffix)) = number
            && word.is_none_or(|w| end >= w)
        {
            self.pos = end;
            return Ok(Argument::Number(self.number(start, end, suffix)));
        }

        let Some(word_end) = word else {
            return Err(self.unexpected(start, "argument"));
        };
        if self.lx.byte(word_end).is_some_and(|b| matches!(b, b'.' | b'[' | b'{')) {
            self.pos = word_end;
            let key = NbtKey::Plain(self.bare_string(start, word_end));
            return Ok(Argument::NbtPath(self.parse_path(key)?));
        }
        self.pos = word_end;
        let span = Span::new(start, word_end);
        match self.lx.slice(start, word_end) {
            "true" => Ok(Argument::Boolean(Boolean { value: true, span })),
            "false" => Ok(Argument::Boolean(Boolean { value: false, span })),
            "run" if self.run_target_follows(word_end) => {
                self.parse_run_clause(start, in_macro).map(Argument::Run)
            }
            text => Ok(Argument::Keyword(Keyword {
                text: text.to_string(),
                span,
            })),
        }
    }

    fn parse_coordinates(&mut self) -> PResult<Argument> {
        let start = self.pos;
        let Some(parts) = self.lx.coordinates_at(start) else {
            return Err(ParseError::structural(
                StructuralErrorKind::MalformedCoordinates,
                Span::new(start, self.coordinate_run_end(start)),
                "coordinates need three parts on one line",
            ));
        };
        let parts = parts.map(|(s, e)| self.coord_part(s, e));
        self.pos = parts[2].span().end;
        Ok(Argument::Coordinates(Coordinates {
            parts,
            span: self.span_from(start),
        }))
    }

    /// End of the run of coordinate-like chunks at `start`, so that a
    /// broken triple is reported and skipped as one unit.
    fn coordinate_run_end(&self, start: usize) -> usize {
        let mut end = self.chunk_end(start);
        loop {
            let mut next = end;
            while self.lx.byte(next).is_some_and(is_blank) {
                next += 1;
            }
            let coordinate_like = match self.lx.byte(next) {
                Some(b'~' | b'^') => true,
                _ => self.lx.coord_part_at(next) == Some(self.chunk_end(next)),
            };
            if next == end || !coordinate_like {
                return end;
            }
            end = self.chunk_end(next);
        }
    }

    fn coord_part(&self, start: usize, end: usize) -> CoordPart {
        let span = Span::new(start, end);
        let offset = || {
            (end > start + 1)
                .then(|| self.lx.slice(start + 1, end).parse::<f64>().ok())
                .flatten()
        };
        match self.lx.byte(start) {
            Some(b'~') => CoordPart::Relative {
                offset: offset(),
                span,
            },
            Some(b'^') => CoordPart::Local {
                offset: offset(),
                span,
            },
            _ => {
                let suffix = self.lx.suffixed_number_at(start).and_then(|(_, s)| s);
                let n = self.number(start, end, suffix);
                CoordPart::Absolute {
                    value: n.value,
                    suffix: n.suffix,
                    span,
                }
            }
        }
    }

    /// Number node for `start..end`; `end` includes the suffix if present.
    pub(super) fn number(&self, start: usize, end: usize, suffix: Option<char>) -> Number {
        let digits_end = if suffix.is_some() { end - 1 } else { end };
        let raw = self.text(start, end);
        let value = self
            .lx
            .slice(start, digits_end)
            .parse::<f64>()
            .unwrap_or(f64::NAN);
        Number {
            value,
            suffix,
            raw,
            span: Span::new(start, end),
        }
    }

    pub(super) fn resource_location(
        &mut self,
        start: usize,
        colon: usize,
        end: usize,
    ) -> ResourceLocation {
        self.pos = end;
        ResourceLocation {
            namespace: self.text(start, colon),
            path: self.text(colon + 1, end),
            span: Span::new(start, end),
        }
    }

    pub(super) fn bare_string(&self, start: usize, end: usize) -> StringLiteral {
        StringLiteral {
            value: self.text(start, end),
            quote: Quote::Bare,
            span: Span::new(start, end),
        }
    }

    /// Quoted string at `self.pos`, without interpolations.
    pub(super) fn parse_quoted_string(&mut self) -> PResult<StringLiteral> {
        let start = self.pos;
        let quote = if self.byte() == Some(b'\'') {
            Quote::Single
        } else {
            Quote::Double
        };
        let (end, _) = self.lx.quoted_string_at(start)?;
        self.pos = end;
        Ok(StringLiteral {
            value: self.text(start + 1, end - 1),
            quote,
            span: Span::new(start, end),
        })
    }

    fn parse_selector(&mut self) -> PResult<Selector> {
        let start = self.pos;
        let target = self
            .lx
            .byte(start + 1)
            .and_then(|b| SelectorTarget::from_char(b as char));
        let Some(target) = target else {
            let end = self.lx.word_at(start + 1).unwrap_or(start + 1);
            return Err(ParseError::structural(
                StructuralErrorKind::SelectorUnknownTarget,
                Span::new(start, end),
                format!(
                    "unknown selector target '{}'",
                    self.lx.slice(start, end).escape_default()
                ),
            )
            .expecting("one of @p @a @r @s @e @n"));
        };
        self.pos = start + 2;
        let filter = if self.byte() == Some(b'[') {
            Some(self.parse_list()?)
        } else {
            None
        };
        Ok(Selector {
            target,
            filter,
            span: self.span_from(start),
        })
    }

    fn parse_fake_player(&mut self) -> PResult<FakePlayer> {
        let start = self.pos;
        match self.lx.fake_player_at(start) {
            Some(end) => {
                self.pos = end;
                Ok(FakePlayer {
                    name: self.text(start + 1, end),
                    span: Span::new(start, end),
                })
            }
            None => Err(self.unexpected(start, "fake player name after '#'")),
        }
    }

    // ── run clauses ─────────────────────────────────────────────────────

    /// `run` only starts a clause when a command or a `$` macro command
    /// follows it. `run $(cmd)` leaves `run` as a keyword.
    fn run_target_follows(&self, run_end: usize) -> bool {
        let next = self.lx.skip_trivia(run_end);
        next > run_end
            && match self.lx.byte(next) {
                Some(b'$') => !self.lx.interpolation_starts(next),
                Some(b) => b.is_ascii_lowercase(),
                None => false,
            }
    }

    fn parse_run_clause(&mut self, start: usize, in_macro: bool) -> PResult<RunClause> {
        let clause = self.nested(start, |p| {
            p.pos = p.lx.skip_trivia(p.pos);
            let subcommand = if p.byte() == Some(b'$') {
                SubCommand::MacroCommand(p.parse_macro_command()?)
            } else {
                let command = p.parse_command(in_macro)?;
                let interpolated = command
                    .arguments
                    .iter()
                    .any(|a| matches!(a, Argument::Macro(_)));
                if interpolated {
                    SubCommand::MacroCommand(MacroCommand {
                        name: MacroName::Literal(command.name),
                        arguments: command.arguments,
                        span: command.span,
                    })
                } else {
                    SubCommand::Command(command)
                }
            };
            Ok(RunClause {
                span: Span::new(start, subcommand.span().end),
                subcommand: Box::new(subcommand),
            })
        });
        // A run chain past the limit is skipped whole, not one `run` at a time.
        clause.map_err(|mut err| {
            if err.kind == ErrorKind::Structural(StructuralErrorKind::NestingTooDeep)
                && err.span.start == start
            {
                let end = self.lx.trim_end(start, self.lx.statement_end(start));
                err.span = Span::new(start, end);
            }
            err
        })
    }
}

fn statement_kind(statement: &Statement) -> &'static str {
    match statement {
        Statement::Command(_) => "command",
        Statement::MacroCommand(_) => "macro_command",
        Statement::Comment(_) => "comment",
        Statement::Error(_) => "error",
    }
}
