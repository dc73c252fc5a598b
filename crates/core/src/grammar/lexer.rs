//! Character-level recognizers over borrowed source text.
//!
//! mcfunction has no context-free token stream: whether `1 2 3` is three
//! numbers or one coordinate triple, or whether `a:b` is a resource location
//! or a pair, depends on where the parser is. The parser therefore drives a
//! [`Lexer`] directly, asking "what is the longest X starting at `pos`?".
//! Every recognizer is pure: it takes a byte offset and returns an end
//! offset, never moving any cursor itself.
//!
//! [`tokenize`] offers a flat, context-free approximation used for
//! debugging output.
//!
//! All recognizers test ASCII bytes only. UTF-8 continuation bytes are in
//! `0x80..=0xBF` and never match, so returned offsets always fall on char
//! boundaries as long as the scan starts on one.

use super::error::{LexError, LexErrorKind};

/// Word characters: keywords, namespaces and NBT keys.
pub fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

/// Characters of a resource path segment or fake player name.
pub fn is_path_byte(b: u8) -> bool {
    is_word_byte(b) || b == b'.'
}

/// Inline whitespace. `\r` counts so that CRLF files behave like LF files.
pub fn is_blank(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r')
}

fn is_suffix_byte(b: u8) -> bool {
    matches!(
        b,
        b'b' | b's' | b'l' | b'f' | b'd' | b't' | b'B' | b'S' | b'L' | b'F' | b'D' | b'T'
    )
}

/// Character that ends an unquoted macro fragment.
fn ends_fragment(b: u8) -> bool {
    b.is_ascii_whitespace() || matches!(b, b'}' | b']' | b',' | b'"' | b'\'')
}

/// Stateless scanner over one input string.
#[derive(Debug, Clone, Copy)]
pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
}

impl<'a> Lexer<'a> {
    /// Wrap `input` for scanning.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
        }
    }

    /// The full source text.
    pub fn input(&self) -> &'a str {
        self.input
    }

    /// Source length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the source is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Byte at `pos`, or `None` past the end.
    pub fn byte(&self, pos: usize) -> Option<u8> {
        self.bytes.get(pos).copied()
    }

    /// The char starting at `pos`.
    pub fn char_at(&self, pos: usize) -> Option<char> {
        self.input.get(pos..).and_then(|s| s.chars().next())
    }

    /// Byte offset just past the char starting at `pos`.
    pub fn char_end(&self, pos: usize) -> usize {
        self.char_at(pos).map_or(self.len(), |c| pos + c.len_utf8())
    }

    /// `&input[start..end]`.
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.input[start..end]
    }

    /// Whether the text at `pos` starts with `prefix`.
    pub fn starts_with(&self, pos: usize, prefix: &str) -> bool {
        self.bytes
            .get(pos..)
            .is_some_and(|rest| rest.starts_with(prefix.as_bytes()))
    }

    // ── Trivia ──────────────────────────────────────────────────────────

    /// End of a line continuation (`\`, optional spaces/tabs, line break)
    /// starting at `pos`.
    pub fn continuation_end(&self, pos: usize) -> Option<usize> {
        if self.byte(pos) != Some(b'\\') {
            return None;
        }
        let mut i = pos + 1;
        while matches!(self.byte(i), Some(b' ' | b'\t')) {
            i += 1;
        }
        if self.byte(i) == Some(b'\r') {
            i += 1;
        }
        (self.byte(i) == Some(b'\n')).then_some(i + 1)
    }

    /// Skip blanks and line continuations.
    pub fn skip_trivia(&self, mut pos: usize) -> usize {
        loop {
            match self.byte(pos) {
                Some(b) if is_blank(b) => pos += 1,
                Some(b'\\') => match self.continuation_end(pos) {
                    Some(end) => pos = end,
                    None => return pos,
                },
                _ => return pos,
            }
        }
    }

    /// Whether `pos` is at a line break or the end of input.
    pub fn at_line_end(&self, pos: usize) -> bool {
        matches!(self.byte(pos), None | Some(b'\n'))
    }

    /// Whether nothing but trivia separates `pos` from the end of the
    /// statement.
    pub fn at_statement_end(&self, pos: usize) -> bool {
        self.at_line_end(self.skip_trivia(pos))
    }

    /// Offset of the line break (or end of input) that ends the statement
    /// containing `pos`. Line continuations do not end a statement.
    pub fn statement_end(&self, mut pos: usize) -> usize {
        while let Some(b) = self.byte(pos) {
            match b {
                b'\n' => return pos,
                b'\\' => pos = self.continuation_end(pos).unwrap_or(pos + 1),
                _ => pos += 1,
            }
        }
        pos
    }

    /// `end` moved back over trailing blanks, but not before `start`.
    pub fn trim_end(&self, start: usize, mut end: usize) -> usize {
        while end > start && self.byte(end - 1).is_some_and(is_blank) {
            end -= 1;
        }
        end
    }

    // ── Numbers and coordinates ─────────────────────────────────────────

    /// End of an unsigned decimal mantissa (`12`, `1.5`, `.5`).
    fn decimal_at(&self, pos: usize) -> Option<usize> {
        let mut i = pos;
        while self.byte(i).is_some_and(|b| b.is_ascii_digit()) {
            i += 1;
        }
        let has_int = i > pos;
        if self.byte(i) == Some(b'.') && self.byte(i + 1).is_some_and(|b| b.is_ascii_digit()) {
            i += 1;
            while self.byte(i).is_some_and(|b| b.is_ascii_digit()) {
                i += 1;
            }
        } else if !has_int {
            return None;
        }
        Some(i)
    }

    /// End of a number without its type suffix: optional `-`, mantissa,
    /// optional exponent.
    pub fn number_at(&self, pos: usize) -> Option<usize> {
        let start = if self.byte(pos) == Some(b'-') { pos + 1 } else { pos };
        let mut end = self.decimal_at(start)?;
        if matches!(self.byte(end), Some(b'e' | b'E')) {
            let mut i = end + 1;
            if matches!(self.byte(i), Some(b'+' | b'-')) {
                i += 1;
            }
            if self.byte(i).is_some_and(|b| b.is_ascii_digit()) {
                while self.byte(i).is_some_and(|b| b.is_ascii_digit()) {
                    i += 1;
                }
                end = i;
            }
        }
        Some(end)
    }

    /// End of a number including an optional type suffix letter, plus the
    /// suffix itself.
    pub fn suffixed_number_at(&self, pos: usize) -> Option<(usize, Option<char>)> {
        let end = self.number_at(pos)?;
        match self.byte(end) {
            Some(b) if is_suffix_byte(b) => Some((end + 1, Some(b as char))),
            _ => Some((end, None)),
        }
    }

    /// End of a single coordinate part: `~`/`^` with an optional offset,
    /// or an absolute number.
    pub fn coord_part_at(&self, pos: usize) -> Option<usize> {
        match self.byte(pos)? {
            b'~' | b'^' => {
                let i = pos + 1;
                let digits = if self.byte(i) == Some(b'-') { i + 1 } else { i };
                Some(self.decimal_at(digits).unwrap_or(i))
            }
            _ => self.suffixed_number_at(pos).map(|(end, _)| end),
        }
    }

    /// Spans of three coordinate parts separated by inline whitespace on a
    /// single line. The triple must end at a token boundary.
    pub fn coordinates_at(&self, pos: usize) -> Option<[(usize, usize); 3]> {
        let mut parts = [(0, 0); 3];
        let mut i = pos;
        for (n, part) in parts.iter_mut().enumerate() {
            if n > 0 {
                let gap = i;
                while self.byte(i).is_some_and(is_blank) {
                    i += 1;
                }
                if i == gap {
                    return None;
                }
            }
            let end = self.coord_part_at(i)?;
            *part = (i, end);
            i = end;
        }
        if self.byte(i).is_some_and(is_path_byte) {
            return None;
        }
        Some(parts)
    }

    // ── Words ───────────────────────────────────────────────────────────

    fn run_at(&self, pos: usize, pred: impl Fn(u8) -> bool) -> Option<usize> {
        let mut i = pos;
        while self.byte(i).is_some_and(&pred) {
            i += 1;
        }
        (i > pos).then_some(i)
    }

    /// End of a keyword / namespace / NBT key: `[a-zA-Z0-9_-]+`.
    pub fn word_at(&self, pos: usize) -> Option<usize> {
        self.run_at(pos, is_word_byte)
    }

    /// End of a resource path: `[a-zA-Z0-9_.-]+` segments joined by `/`.
    pub fn identifier_at(&self, pos: usize) -> Option<usize> {
        let mut end = self.run_at(pos, is_path_byte)?;
        while self.byte(end) == Some(b'/') {
            match self.run_at(end + 1, is_path_byte) {
                Some(next) => end = next,
                None => break,
            }
        }
        Some(end)
    }

    /// End of a command name: a lowercase letter then `[a-zA-Z0-9_]*`.
    pub fn command_name_at(&self, pos: usize) -> Option<usize> {
        if !self.byte(pos)?.is_ascii_lowercase() {
            return None;
        }
        let mut i = pos + 1;
        while self
            .byte(i)
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_')
        {
            i += 1;
        }
        Some(i)
    }

    /// End of a fake player name: `#` then `[a-zA-Z0-9_.-]+`.
    pub fn fake_player_at(&self, pos: usize) -> Option<usize> {
        if self.byte(pos)? != b'#' {
            return None;
        }
        self.run_at(pos + 1, is_path_byte)
    }

    // ── Strings and macros ──────────────────────────────────────────────

    /// Scan a quoted string starting at the quote character at `pos`.
    ///
    /// Returns the end offset (past the closing quote) and whether the body
    /// contains a `$(...)` interpolation. Interpolations are skipped as a
    /// unit, so a quote inside `$(...)` does not close the string.
    pub fn quoted_string_at(&self, pos: usize) -> Result<(usize, bool), LexError> {
        let quote = self.byte(pos).unwrap_or(b'"');
        let mut i = pos + 1;
        let mut interpolated = false;
        loop {
            match self.byte(i) {
                None | Some(b'\n') => {
                    return Err(LexError::new(LexErrorKind::UnterminatedString, pos, i));
                }
                Some(b'\\') => match self.byte(i + 1) {
                    None | Some(b'\n') => {
                        return Err(LexError::new(LexErrorKind::InvalidEscape, i, i + 1));
                    }
                    Some(b'\r') if self.byte(i + 2) == Some(b'\n') => {
                        return Err(LexError::new(LexErrorKind::InvalidEscape, i, i + 1));
                    }
                    Some(_) => i = self.char_end(i + 1),
                },
                Some(b'$') if self.byte(i + 1) == Some(b'(') => {
                    i = self.interpolation_at(i)?;
                    interpolated = true;
                }
                Some(b) if b == quote => return Ok((i + 1, interpolated)),
                Some(_) => i += 1,
            }
        }
    }

    /// End of a `$(...)` interpolation starting at `pos`. The expression
    /// runs to the first `)` and may not cross a line break.
    pub fn interpolation_at(&self, pos: usize) -> Result<usize, LexError> {
        let mut i = pos + 2;
        loop {
            match self.byte(i) {
                Some(b')') => return Ok(i + 1),
                None | Some(b'\n') => {
                    let end = if i > pos + 2 && self.byte(i - 1) == Some(b'\r') {
                        i - 1
                    } else {
                        i
                    };
                    return Err(LexError::new(LexErrorKind::UnterminatedMacro, pos, end));
                }
                Some(_) => i += 1,
            }
        }
    }

    /// Whether an interpolation starts at `pos`.
    pub fn interpolation_starts(&self, pos: usize) -> bool {
        self.starts_with(pos, "$(")
    }

    /// End of an unquoted macro literal fragment starting at `pos`.
    ///
    /// Stops at whitespace, `} ] , " '`, a line continuation or the start
    /// of an interpolation. Outside keys the colon belongs to the fragment,
    /// so `minecraft:$(id)` scans as a single argument; in key position
    /// `:`, `=` and `~` end it so the pair operator stays visible.
    pub fn fragment_at(&self, pos: usize, in_key: bool) -> Option<usize> {
        let mut i = pos;
        while let Some(b) = self.byte(i) {
            let stop = match b {
                b':' | b'=' | b'~' => in_key,
                _ => ends_fragment(b),
            };
            if stop || self.interpolation_starts(i) || self.continuation_end(i).is_some() {
                break;
            }
            i = self.char_end(i);
        }
        (i > pos).then_some(i)
    }

    // ── Comments ────────────────────────────────────────────────────────

    /// End of the comment tag run starting at `#`, plus its kind letter:
    /// `b'!'`/`b'@'` for important, `b'>'` for directive, `None` otherwise.
    pub fn comment_tag_at(&self, pos: usize) -> (usize, Option<u8>) {
        let mut i = pos;
        while self.byte(i) == Some(b'#') {
            i += 1;
        }
        match self.byte(i) {
            Some(mark @ (b'!' | b'@' | b'>')) => {
                while self.byte(i) == Some(mark) {
                    i += 1;
                }
                (i, Some(mark))
            }
            _ => (i, None),
        }
    }

    /// End of comment text starting at `pos`: the rest of the line,
    /// following line continuations, excluding a trailing `\r`.
    pub fn comment_text_end(&self, pos: usize) -> usize {
        let end = self.statement_end(pos);
        if end > pos && self.byte(end - 1) == Some(b'\r') {
            end - 1
        } else {
            end
        }
    }
}

// ── Flat tokenizer ──────────────────────────────────────────────────────────

/// Classification of a flat token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokKind {
    /// A whole comment line.
    Comment,
    /// Leading `$` of a macro line.
    MacroSigil,
    /// A run of word characters (keywords, names, namespaces).
    Word,
    /// A number, optionally suffixed.
    Number,
    /// `~` or `^` with an optional offset.
    CoordPart,
    /// A quoted string.
    String,
    /// `$(...)`
    Interpolation,
    /// `@` plus one letter.
    Selector,
    /// `#name` outside line-start position.
    FakePlayer,
    /// One of `[ ] { } , = : . / ~`.
    Punct,
    /// `\` followed by a line break.
    Continuation,
    /// Spaces, tabs and carriage returns.
    Whitespace,
    /// A line feed.
    Newline,
    /// Any other character.
    Unknown,
}

/// A token that borrows its text directly from the source input.
///
/// `text` is always exactly `&input[start..end]`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Token<'a> {
    /// The classification of this token.
    pub kind: TokKind,
    /// Borrowed slice of the source input for this token.
    pub text: &'a str,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

/// Split `input` into flat tokens.
///
/// Comments are recognized only where a statement can start. Strings and
/// interpolations must be closed on their line.
pub fn tokenize(input: &str) -> Result<Vec<Token<'_>>, LexError> {
    let lx = Lexer::new(input);
    let mut toks = Vec::new();
    let mut i = 0usize;
    let mut line_start = true;
    while let Some(b) = lx.byte(i) {
        let start = i;
        let kind = match b {
            b'\n' => {
                i += 1;
                TokKind::Newline
            }
            _ if is_blank(b) => {
                while lx.byte(i).is_some_and(is_blank) {
                    i += 1;
                }
                TokKind::Whitespace
            }
            b'\\' if lx.continuation_end(i).is_some() => {
                i = lx.continuation_end(i).unwrap_or(i + 1);
                TokKind::Continuation
            }
            b'#' if line_start => {
                i = lx.comment_text_end(i);
                TokKind::Comment
            }
            b'#' if lx.fake_player_at(i).is_some() => {
                i = lx.fake_player_at(i).unwrap_or(i + 1);
                TokKind::FakePlayer
            }
            b'$' if lx.interpolation_starts(i) => {
                i = lx.interpolation_at(i)?;
                TokKind::Interpolation
            }
            b'$' if line_start => {
                i += 1;
                TokKind::MacroSigil
            }
            b'"' | b'\'' => {
                i = lx.quoted_string_at(i)?.0;
                TokKind::String
            }
            b'@' if lx.byte(i + 1).is_some_and(|c| c.is_ascii_alphabetic()) => {
                i += 2;
                TokKind::Selector
            }
            b'~' | b'^' => {
                i = lx.coord_part_at(i).unwrap_or(i + 1);
                TokKind::CoordPart
            }
            _ => {
                let num = lx.suffixed_number_at(i).map(|(end, _)| end);
                let word = lx.word_at(i);
                match (num, word) {
                    (Some(n), w) if w.is_none_or(|w| n >= w) => {
                        i = n;
                        TokKind::Number
                    }
                    (_, Some(w)) => {
                        i = w;
                        TokKind::Word
                    }
                    _ if b"[]{},=:./".contains(&b) => {
                        i += 1;
                        TokKind::Punct
                    }
                    _ => {
                        i = lx.char_end(i);
                        TokKind::Unknown
                    }
                }
            }
        };
        line_start = match kind {
            TokKind::Newline => true,
            TokKind::Whitespace | TokKind::Continuation => line_start,
            _ => false,
        };
        toks.push(Token {
            kind,
            text: &input[start..i],
            start,
            end: i,
        });
    }
    Ok(toks)
}
