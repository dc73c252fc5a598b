//! NBT lists, compounds, pairs and paths.
//!
//! Errors in scalar values propagate to the innermost enclosing container.
//! A container in value position recovers on its own in tolerant mode, so a
//! broken inner list costs one diagnostic and leaves its parent intact.

use super::{
    ast::{
        Boolean, NbtCompound, NbtKey, NbtList, NbtListItems, NbtPair, NbtPath, NbtValue,
        PairOperator, PathSegment, PathSuffix, Spanned,
    },
    diag::Span,
    error::{ParseError, StructuralErrorKind},
    parser::{PResult, Parser},
};

impl Parser<'_> {
    /// Whether a path suffix (`.`, `[` or `{`) directly follows `self.pos`.
    pub(super) fn path_suffix_follows(&self) -> bool {
        matches!(self.byte(), Some(b'.' | b'[' | b'{'))
    }

    /// `[ ... ]` at `self.pos`.
    pub(super) fn parse_list(&mut self) -> PResult<NbtList> {
        let open = self.pos;
        self.nested(open, |p| {
            p.pos = p.lx.skip_trivia(open + 1);
            if p.byte() == Some(b']') {
                p.pos += 1;
                return Ok(NbtList {
                    items: NbtListItems::Values(Vec::new()),
                    span: p.span_from(open),
                });
            }
            p.expect_content(open, b']')?;
            let items = if p.pair_starts(p.pos) {
                let mut pairs = Vec::new();
                loop {
                    pairs.push(p.parse_pair()?);
                    if p.element_separator(open, b']')? {
                        break NbtListItems::Pairs(pairs);
                    }
                }
            } else {
                let mut values = Vec::new();
                loop {
                    values.push(p.parse_nbt_value()?);
                    if p.element_separator(open, b']')? {
                        break NbtListItems::Values(values);
                    }
                }
            };
            Ok(NbtList {
                items,
                span: p.span_from(open),
            })
        })
    }

    /// `{ ... }` at `self.pos`; at least one pair.
    pub(super) fn parse_compound(&mut self) -> PResult<NbtCompound> {
        let open = self.pos;
        self.nested(open, |p| {
            p.pos = p.lx.skip_trivia(open + 1);
            if p.byte() == Some(b'}') {
                p.pos += 1;
                return Err(ParseError::structural(
                    StructuralErrorKind::NbtEmptyCompound,
                    p.span_from(open),
                    "compound must contain at least one pair",
                )
                .expecting("key:value"));
            }
            p.expect_content(open, b'}')?;
            let mut pairs = Vec::new();
            loop {
                pairs.push(p.parse_pair()?);
                if p.element_separator(open, b'}')? {
                    break;
                }
            }
            Ok(NbtCompound {
                pairs,
                span: p.span_from(open),
            })
        })
    }

    fn unclosed(&self, open: usize, close: u8) -> ParseError {
        let end = self.lx.trim_end(open, self.pos).max(open + 1);
        let message = if close == b']' {
            "list is not closed"
        } else {
            "compound is not closed"
        };
        ParseError::structural(
            StructuralErrorKind::NbtUnclosed,
            Span::new(open, end),
            message,
        )
        .expecting(if close == b']' { "]" } else { "}" })
    }

    /// Fail if the statement ends right after an opener or comma.
    fn expect_content(&self, open: usize, close: u8) -> PResult<()> {
        if self.lx.at_line_end(self.pos) {
            return Err(self.unclosed(open, close));
        }
        Ok(())
    }

    /// After an element: consume a comma (`false`) or the closer (`true`).
    fn element_separator(&mut self, open: usize, close: u8) -> PResult<bool> {
        self.pos = self.lx.skip_trivia(self.pos);
        match self.byte() {
            Some(b',') => {
                let comma = self.pos;
                self.pos = self.lx.skip_trivia(comma + 1);
                if self.byte() == Some(close) {
                    return Err(ParseError::structural(
                        StructuralErrorKind::NbtTrailingComma,
                        Span::new(comma, comma + 1),
                        "trailing comma before closing bracket",
                    ));
                }
                self.expect_content(open, close)?;
                Ok(false)
            }
            Some(b) if b == close => {
                self.pos += 1;
                Ok(true)
            }
            None | Some(b'\n' | b']' | b'}') => Err(self.unclosed(open, close)),
            Some(_) => Err(ParseError::structural(
                StructuralErrorKind::NbtMissingComma,
                Span::new(self.pos, self.lx.char_end(self.pos)),
                "expected ',' between elements",
            )
            .expecting(",")),
        }
    }

    /// Whether the element at `pos` is a key followed by a pair operator.
    fn pair_starts(&self, pos: usize) -> bool {
        let key_end = match self.lx.byte(pos) {
            Some(b'"' | b'\'') => self.lx.quoted_string_at(pos).ok().map(|(end, _)| end),
            _ if self.macro_argument_at(pos, true) => self.macro_key_end(pos),
            _ => self.lx.word_at(pos),
        };
        key_end.is_some_and(|end| {
            let op = self.lx.skip_trivia(end);
            matches!(self.lx.byte(op), Some(b'=' | b'~' | b':'))
        })
    }

    fn parse_pair(&mut self) -> PResult<NbtPair> {
        let start = self.pos;
        let key = self.parse_nbt_key()?;
        self.pos = self.lx.skip_trivia(self.pos);
        let operator = match self.byte().and_then(|b| PairOperator::from_char(b as char)) {
            Some(op) => op,
            None => {
                let end = if self.lx.at_line_end(self.pos) {
                    self.pos
                } else {
                    self.lx.char_end(self.pos)
                };
                return Err(ParseError::structural(
                    StructuralErrorKind::NbtMissingOperator,
                    Span::new(self.pos, end),
                    "expected '=', '~' or ':' after key",
                )
                .expecting("= ~ :"));
            }
        };
        self.pos = self.lx.skip_trivia(self.pos + 1);
        let value = self.parse_nbt_value()?;
        Ok(NbtPair {
            key,
            operator,
            span: self.span_from(start),
            value,
        })
    }

    /// Key of a pair or path segment at `self.pos`.
    pub(super) fn parse_nbt_key(&mut self) -> PResult<NbtKey> {
        let start = self.pos;
        if self.macro_argument_at(start, true) {
            return self.parse_macro_argument(true).map(NbtKey::Macro);
        }
        match self.byte() {
            Some(b'"' | b'\'') => self.parse_quoted_string().map(NbtKey::Plain),
            _ => match self.lx.word_at(start) {
                Some(end) => {
                    self.pos = end;
                    Ok(NbtKey::Plain(self.bare_string(start, end)))
                }
                None => Err(self.unexpected(start, "NBT key").expecting("key")),
            },
        }
    }

    /// Value inside a list or compound at `self.pos`.
    fn parse_nbt_value(&mut self) -> PResult<NbtValue> {
        let start = self.pos;
        if self.macro_argument_at(start, false) {
            return self.parse_macro_argument(false).map(NbtValue::Macro);
        }
        match self.byte() {
            Some(b'"' | b'\'') => return self.parse_quoted_string().map(NbtValue::String),
            Some(b'[') => {
                return match self.parse_list() {
                    Ok(list) => Ok(NbtValue::List(list)),
                    Err(err) => self.recover_or_fail(start, err).map(NbtValue::Error),
                };
            }
            Some(b'{') => {
                return match self.parse_compound() {
                    Ok(compound) => Ok(NbtValue::Compound(compound)),
                    Err(err) => self.recover_or_fail(start, err).map(NbtValue::Error),
                };
            }
            None | Some(b'\n' | b',' | b']' | b'}') => {
                return Err(ParseError::structural(
                    StructuralErrorKind::NbtMissingValue,
                    Span::empty(start),
                    "expected a value",
                )
                .expecting("value"));
            }
            Some(_) => {}
        }

        let number = self.lx.suffixed_number_at(start);
        let number_end = number.map_or(start, |(end, _)| end);
        let word = self.lx.word_at(start);

        if let Some(word_end) = word
            && self.lx.byte(word_end) == Some(b':')
            && number_end <= word_end
            && let Some(path_end) = self.lx.identifier_at(word_end + 1)
        {
            return Ok(NbtValue::ResourceLocation(
                self.resource_location(start, word_end, path_end),
            ));
        }
        if let Some((end, suffix)) = number
            && word.is_none_or(|w| end >= w)
        {
            self.pos = end;
            return Ok(NbtValue::Number(self.number(start, end, suffix)));
        }
        let Some(end) = word else {
            return Err(self.unexpected(start, "NBT value"));
        };
        self.pos = end;
        let span = Span::new(start, end);
        Ok(match self.lx.slice(start, end) {
            "true" => NbtValue::Boolean(Boolean { value: true, span }),
            "false" => NbtValue::Boolean(Boolean { value: false, span }),
            _ => NbtValue::String(self.bare_string(start, end)),
        })
    }

    /// Path whose first segment name has just been parsed; `self.pos` is
    /// directly after it and a suffix follows.
    pub(super) fn parse_path(&mut self, first: NbtKey) -> PResult<NbtPath> {
        let start = first_start(&first);
        let mut segments = Vec::new();
        let mut name = first;
        loop {
            let seg_start = first_start(&name);
            let mut suffixes = Vec::new();
            loop {
                match self.byte() {
                    Some(b'[') => suffixes.push(PathSuffix::Index(self.parse_list()?)),
                    Some(b'{') => suffixes.push(PathSuffix::Filter(self.parse_compound()?)),
                    _ => break,
                }
            }
            segments.push(PathSegment {
                name,
                suffixes,
                span: self.span_from(seg_start),
            });
            if self.byte() != Some(b'.') {
                break;
            }
            self.pos += 1;
            let next = self.pos;
            if !matches!(self.byte(), Some(b'"' | b'\''))
                && !self.macro_argument_at(next, true)
                && self.lx.word_at(next).is_none()
            {
                return Err(self.unexpected(next, "path segment after '.'").expecting("key"));
            }
            name = self.parse_nbt_key()?;
        }
        Ok(NbtPath {
            segments,
            span: self.span_from(start),
        })
    }
}

fn first_start(key: &NbtKey) -> usize {
    key.span().start
}
