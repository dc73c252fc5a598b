use std::collections::BTreeMap;

use super::diag::{Diagnostic, Span, codes};

/// Lexical error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LexErrorKind {
    /// A quoted string reached a line break or the end of input.
    #[error("unterminated string")]
    UnterminatedString,
    /// A backslash inside a string has no character to escape.
    #[error("invalid escape sequence")]
    InvalidEscape,
    /// `$(` without a closing `)` on the same line.
    #[error("unterminated macro interpolation")]
    UnterminatedMacro,
}

/// An error raised while scanning a single token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{kind}")]
pub struct LexError {
    /// What went wrong.
    pub kind: LexErrorKind,
    /// Where the offending token starts and how far the scan got.
    pub span: Span,
}

impl LexError {
    pub(crate) fn new(kind: LexErrorKind, start: usize, end: usize) -> Self {
        Self {
            kind,
            span: Span::new(start, end),
        }
    }

    /// Diagnostic code for this error.
    pub fn code(&self) -> &'static str {
        match self.kind {
            LexErrorKind::UnterminatedString => codes::LEX_UNTERMINATED_STRING,
            LexErrorKind::InvalidEscape => codes::LEX_INVALID_ESCAPE,
            LexErrorKind::UnterminatedMacro => codes::LEX_UNTERMINATED_MACRO,
        }
    }
}

/// Structural error category: the tokens are fine but do not fit together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StructuralErrorKind {
    /// `~`/`^` (or a coordinate part) that does not form a full triple.
    #[error("malformed coordinates")]
    MalformedCoordinates,
    /// `[` or `{` without its closer before the end of the statement.
    #[error("unclosed NBT container")]
    NbtUnclosed,
    /// Key not followed by `=`, `~` or `:`.
    #[error("missing pair operator")]
    NbtMissingOperator,
    /// Two elements without a comma between them.
    #[error("missing comma")]
    NbtMissingComma,
    /// `,` directly before `]` or `}`.
    #[error("trailing comma")]
    NbtTrailingComma,
    /// Operator or comma not followed by a value.
    #[error("missing value")]
    NbtMissingValue,
    /// `{}`
    #[error("empty compound")]
    NbtEmptyCompound,
    /// `namespace:` with nothing after the colon.
    #[error("resource location without path")]
    ResourceMissingPath,
    /// `@` followed by something other than `p a r s e n`.
    #[error("unknown selector target")]
    SelectorUnknownTarget,
    /// Interpolation in a plain command.
    #[error("macro interpolation outside macro command")]
    MacroOutsideMacroCommand,
    /// Argument glued to the previous one.
    #[error("missing separator")]
    MissingSeparator,
    /// Character that cannot start an argument or value.
    #[error("unexpected token")]
    UnexpectedToken,
    /// Nesting deeper than [`ParseOptions::max_depth`](super::parser::ParseOptions::max_depth).
    #[error("nesting too deep")]
    NestingTooDeep,
}

impl StructuralErrorKind {
    /// Diagnostic code for this category.
    pub fn code(self) -> &'static str {
        match self {
            Self::MalformedCoordinates => codes::MALFORMED_COORDINATES,
            Self::NbtUnclosed => codes::NBT_UNCLOSED,
            Self::NbtMissingOperator => codes::NBT_MISSING_OPERATOR,
            Self::NbtMissingComma => codes::NBT_MISSING_COMMA,
            Self::NbtTrailingComma => codes::NBT_TRAILING_COMMA,
            Self::NbtMissingValue => codes::NBT_MISSING_VALUE,
            Self::NbtEmptyCompound => codes::NBT_EMPTY_COMPOUND,
            Self::ResourceMissingPath => codes::RESOURCE_MISSING_PATH,
            Self::SelectorUnknownTarget => codes::SELECTOR_UNKNOWN_TARGET,
            Self::MacroOutsideMacroCommand => codes::MACRO_OUTSIDE_MACRO_COMMAND,
            Self::MissingSeparator => codes::MISSING_SEPARATOR,
            Self::UnexpectedToken => codes::UNEXPECTED_TOKEN,
            Self::NestingTooDeep => codes::NESTING_TOO_DEEP,
        }
    }
}

/// Top-level error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Token-level failure.
    Lex(LexErrorKind),
    /// Tokens that do not form a valid construct.
    Structural(StructuralErrorKind),
    /// A statement whose first character starts nothing.
    UnexpectedCharacter,
}

/// A parse failure with its position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at bytes {}..{}", span.start, span.end)]
pub struct ParseError {
    /// Category.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
    /// Offending source span.
    pub span: Span,
    /// What the parser was looking for, when that is a single thing.
    pub expected: Option<&'static str>,
}

impl ParseError {
    pub(crate) fn structural(
        kind: StructuralErrorKind,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: ErrorKind::Structural(kind),
            message: message.into(),
            span,
            expected: None,
        }
    }

    pub(crate) fn unexpected_character(found: char, span: Span) -> Self {
        Self {
            kind: ErrorKind::UnexpectedCharacter,
            message: format!("unexpected character '{}' at start of statement", found.escape_default()),
            span,
            expected: Some("comment, command or macro command"),
        }
    }

    pub(crate) fn expecting(mut self, expected: &'static str) -> Self {
        self.expected = Some(expected);
        self
    }

    /// Diagnostic code for this error.
    pub fn code(&self) -> &'static str {
        match self.kind {
            ErrorKind::Lex(kind) => LexError {
                kind,
                span: self.span,
            }
            .code(),
            ErrorKind::Structural(kind) => kind.code(),
            ErrorKind::UnexpectedCharacter => codes::UNEXPECTED_CHARACTER,
        }
    }

    /// Convert into a positioned diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::from_code(self.code(), self.message.clone(), Some(self.span));
        match self.expected {
            Some(expected) => diag.with_context(BTreeMap::from([(
                "expected".to_string(),
                expected.to_string(),
            )])),
            None => diag,
        }
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        Self {
            kind: ErrorKind::Lex(err.kind),
            message: err.kind.to_string(),
            span: err.span,
            expected: None,
        }
    }
}
