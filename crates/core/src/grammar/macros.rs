//! Macro arguments: text mixed with `$(name)` interpolations.

use super::{
    ast::{MacroArgument, MacroFragment, MacroInterpolation, Quote, TextRun},
    diag::Span,
    lexer::is_path_byte,
    parser::{PResult, Parser},
};

impl Parser<'_> {
    /// Whether a macro argument starts at `pos`: a leading interpolation, a
    /// word glued to one, or a quoted string containing one.
    ///
    /// Outside keys the glued prefix may contain `:` so that
    /// `minecraft:$(id)` is one argument.
    pub(super) fn macro_argument_at(&self, pos: usize, in_key: bool) -> bool {
        match self.lx.byte(pos) {
            Some(b'"' | b'\'') => matches!(self.lx.quoted_string_at(pos), Ok((_, true))),
            _ => {
                let mut i = pos;
                while self
                    .lx
                    .byte(i)
                    .is_some_and(|b| is_path_byte(b) || b == b'/' || (b == b':' && !in_key))
                {
                    i += 1;
                }
                self.lx.interpolation_starts(i)
            }
        }
    }

    /// End of an unquoted macro key starting at `pos`.
    pub(super) fn macro_key_end(&self, pos: usize) -> Option<usize> {
        let mut i = pos;
        loop {
            if self.lx.interpolation_starts(i) {
                i = self.lx.interpolation_at(i).ok()?;
            } else if let Some(end) = self.lx.fragment_at(i, true) {
                i = end;
            } else {
                break;
            }
        }
        (i > pos).then_some(i)
    }

    /// Macro argument at `self.pos`. The caller has checked
    /// [`macro_argument_at`](Self::macro_argument_at).
    pub(super) fn parse_macro_argument(&mut self, in_key: bool) -> PResult<MacroArgument> {
        let start = self.pos;
        match self.byte() {
            Some(b'"') => return self.parse_quoted_macro(Quote::Double),
            Some(b'\'') => return self.parse_quoted_macro(Quote::Single),
            _ => {}
        }
        let mut fragments = Vec::new();
        loop {
            if self.lx.interpolation_starts(self.pos) {
                fragments.push(MacroFragment::Interpolation(self.parse_interpolation()?));
            } else if let Some(end) = self.lx.fragment_at(self.pos, in_key) {
                fragments.push(MacroFragment::Literal(TextRun {
                    text: self.text(self.pos, end),
                    span: Span::new(self.pos, end),
                }));
                self.pos = end;
            } else {
                break;
            }
        }
        Ok(MacroArgument {
            fragments,
            quote: Quote::Bare,
            span: self.span_from(start),
        })
    }

    fn parse_quoted_macro(&mut self, quote: Quote) -> PResult<MacroArgument> {
        let start = self.pos;
        let (end, _) = self.lx.quoted_string_at(start)?;
        let close = end - 1;
        let mut fragments = Vec::new();
        let mut run_start = start + 1;
        let mut i = run_start;
        let flush = |fragments: &mut Vec<MacroFragment>, from: usize, to: usize| {
            if to > from {
                fragments.push(MacroFragment::StringRun(TextRun {
                    text: self.text(from, to),
                    span: Span::new(from, to),
                }));
            }
        };
        while i < close {
            if self.lx.interpolation_starts(i) {
                flush(&mut fragments, run_start, i);
                let stop = self.lx.interpolation_at(i)?;
                fragments.push(MacroFragment::Interpolation(MacroInterpolation {
                    expression: self.text(i + 2, stop - 1),
                    span: Span::new(i, stop),
                }));
                i = stop;
                run_start = i;
            } else if self.lx.byte(i) == Some(b'\\') {
                i = self.lx.char_end(i + 1);
            } else {
                i = self.lx.char_end(i);
            }
        }
        flush(&mut fragments, run_start, close);
        self.pos = end;
        Ok(MacroArgument {
            fragments,
            quote,
            span: Span::new(start, end),
        })
    }

    /// `$(...)` at `self.pos`.
    pub(super) fn parse_interpolation(&mut self) -> PResult<MacroInterpolation> {
        let start = self.pos;
        let end = self.lx.interpolation_at(start)?;
        self.pos = end;
        Ok(MacroInterpolation {
            expression: self.text(start + 2, end - 1),
            span: Span::new(start, end),
        })
    }
}
