use serde::{Deserialize, Serialize};
use mcfunction_toolchain_diagnostics::Span;

/// Anything in the tree that knows its source span.
pub trait Spanned {
    /// Byte span of this node in the source.
    fn span(&self) -> Span;
}

macro_rules! spanned_struct {
    ($($ty:ty),+ $(,)?) => {
        $(impl Spanned for $ty {
            fn span(&self) -> Span {
                self.span
            }
        })+
    };
}

/// A parsed mcfunction file.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Document {
    /// Statements in source order. Blank lines produce no statement.
    pub statements: Vec<Statement>,
}

/// One line-level unit of an mcfunction file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
#[non_exhaustive]
pub enum Statement {
    /// A plain command such as `say hi`.
    Command(Command),
    /// A `$`-prefixed macro command.
    MacroCommand(MacroCommand),
    /// A `#` comment line.
    Comment(Comment),
    /// A line that could not be parsed (tolerant mode only).
    Error(ErrorNode),
}

/// Comment flavour, decided by the shape of the tag run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CommentKind {
    /// `# text`
    Normal,
    /// `#! text` or `#@ text`
    Important,
    /// `#> key: value`
    Directive,
}

/// A comment line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    /// Normal, important or directive.
    #[serde(rename = "commentKind")]
    pub kind: CommentKind,
    /// The tag run, e.g. `#`, `##!` or `#>`.
    pub tag: String,
    /// Text after the tag (normal and important comments only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Directive key, trimmed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directive_key: Option<String>,
    /// Directive value: everything after the `:` verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directive_value: Option<String>,
    /// Source span of the comment, excluding the line break.
    pub span: Span,
}

/// A command name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identifier {
    /// The name text.
    pub text: String,
    /// Source span.
    pub span: Span,
}

/// A plain command: a name followed by arguments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Command {
    /// Command name, e.g. `execute`.
    pub name: Identifier,
    /// Arguments in order. Never contains [`Argument::Macro`].
    pub arguments: Vec<Argument>,
    /// Source span from the name to the end of the last argument.
    pub span: Span,
}

/// The name slot of a macro command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum MacroName {
    /// A literal command name.
    Literal(Identifier),
    /// A `$(name)` interpolation in name position.
    Interpolation(MacroInterpolation),
}

/// A `$`-prefixed command whose arguments may contain interpolations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MacroCommand {
    /// Command name or interpolation.
    pub name: MacroName,
    /// Arguments in order; may contain [`Argument::Macro`].
    pub arguments: Vec<Argument>,
    /// Source span starting at the `$`.
    pub span: Span,
}

/// A command argument.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
#[non_exhaustive]
pub enum Argument {
    /// Three coordinate parts.
    Coordinates(Coordinates),
    /// A quoted string.
    String(StringLiteral),
    /// A number.
    Number(Number),
    /// `namespace:path`
    ResourceLocation(ResourceLocation),
    /// `@a[...]`
    Selector(Selector),
    /// `[...]`
    NbtList(NbtList),
    /// `{...}`
    NbtCompound(NbtCompound),
    /// `true` / `false`
    Boolean(Boolean),
    /// `#name`
    FakePlayer(FakePlayer),
    /// `a.b[0]{c:1}`
    NbtPath(NbtPath),
    /// `run <command>`
    Run(RunClause),
    /// A bare word.
    Keyword(Keyword),
    /// Text mixed with `$(name)` interpolations (macro commands only).
    Macro(MacroArgument),
    /// Placeholder for an argument that failed to parse (tolerant mode only).
    Error(ErrorNode),
}

/// Coordinate triple.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    /// Exactly three parts.
    pub parts: [CoordPart; 3],
    /// Source span of the whole triple.
    pub span: Span,
}

/// One part of a coordinate triple.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CoordPart {
    /// Plain number, optionally with a unit suffix (`1.5`, `10d`).
    Absolute {
        /// Numeric value.
        value: f64,
        /// Unit suffix letter as written.
        #[serde(skip_serializing_if = "Option::is_none")]
        suffix: Option<char>,
        /// Source span.
        span: Span,
    },
    /// `~` with an optional offset.
    Relative {
        /// Offset after the `~`.
        #[serde(skip_serializing_if = "Option::is_none")]
        offset: Option<f64>,
        /// Source span.
        span: Span,
    },
    /// `^` with an optional offset.
    Local {
        /// Offset after the `^`.
        #[serde(skip_serializing_if = "Option::is_none")]
        offset: Option<f64>,
        /// Source span.
        span: Span,
    },
}

impl CoordPart {
    /// The offset of a relative/local part, or the value of an absolute one.
    pub fn amount(&self) -> Option<f64> {
        match self {
            CoordPart::Absolute { value, .. } => Some(*value),
            CoordPart::Relative { offset, .. } | CoordPart::Local { offset, .. } => *offset,
        }
    }
}

impl Spanned for CoordPart {
    fn span(&self) -> Span {
        match self {
            CoordPart::Absolute { span, .. }
            | CoordPart::Relative { span, .. }
            | CoordPart::Local { span, .. } => *span,
        }
    }
}

/// How a string was written.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Quote {
    /// `"..."`
    Double,
    /// `'...'`
    Single,
    /// A bare word used as a string (NBT keys and values).
    Bare,
}

impl Quote {
    /// The quote character, if any.
    pub fn as_char(self) -> Option<char> {
        match self {
            Quote::Double => Some('"'),
            Quote::Single => Some('\''),
            Quote::Bare => None,
        }
    }
}

/// A string value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StringLiteral {
    /// Text between the quotes as written, escapes not processed.
    pub value: String,
    /// Quoting style.
    pub quote: Quote,
    /// Source span including the quotes.
    pub span: Span,
}

impl StringLiteral {
    /// The value with backslash escapes resolved.
    ///
    /// `\n`, `\t` and `\r` become control characters; any other escaped
    /// character stands for itself.
    pub fn unescaped(&self) -> String {
        let mut out = String::with_capacity(self.value.len());
        let mut chars = self.value.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        }
        out
    }
}

/// A numeric literal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Number {
    /// Parsed value (suffix ignored).
    pub value: f64,
    /// Type suffix letter as written (`b`, `s`, `l`, `f`, `d`, `t`, any case).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<char>,
    /// Source text.
    pub raw: String,
    /// Source span.
    pub span: Span,
}

/// `namespace:path`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceLocation {
    /// Part before the colon.
    pub namespace: String,
    /// Part after the colon; `/`-separated segments.
    pub path: String,
    /// Source span.
    pub span: Span,
}

impl ResourceLocation {
    /// Path segments split on `/`.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/')
    }
}

/// Selector target variable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SelectorTarget {
    /// `@p`
    NearestPlayer,
    /// `@a`
    AllPlayers,
    /// `@r`
    RandomPlayer,
    /// `@s`
    Executor,
    /// `@e`
    AllEntities,
    /// `@n`
    NearestEntity,
}

impl SelectorTarget {
    /// Map the letter after `@` to a target.
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c {
            'p' => Self::NearestPlayer,
            'a' => Self::AllPlayers,
            'r' => Self::RandomPlayer,
            's' => Self::Executor,
            'e' => Self::AllEntities,
            'n' => Self::NearestEntity,
            _ => return None,
        })
    }

    /// The letter written after `@`.
    pub fn as_char(self) -> char {
        match self {
            Self::NearestPlayer => 'p',
            Self::AllPlayers => 'a',
            Self::RandomPlayer => 'r',
            Self::Executor => 's',
            Self::AllEntities => 'e',
            Self::NearestEntity => 'n',
        }
    }
}

/// Entity selector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Selector {
    /// Target variable.
    pub target: SelectorTarget,
    /// Optional `[...]` filter directly after the target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<NbtList>,
    /// Source span including the filter.
    pub span: Span,
}

/// `[...]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NbtList {
    /// Elements; pair-shaped or value-shaped, never mixed.
    pub items: NbtListItems,
    /// Source span including the brackets.
    pub span: Span,
}

/// Contents of an [`NbtList`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "shape", content = "items", rename_all = "lowercase")]
pub enum NbtListItems {
    /// `[key=value, ...]` (selector filters, block states).
    Pairs(Vec<NbtPair>),
    /// `[value, ...]`; empty lists use this shape.
    Values(Vec<NbtValue>),
}

impl NbtListItems {
    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            NbtListItems::Pairs(p) => p.len(),
            NbtListItems::Values(v) => v.len(),
        }
    }

    /// Whether the list has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `{key:value, ...}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NbtCompound {
    /// At least one pair.
    pub pairs: Vec<NbtPair>,
    /// Source span including the braces.
    pub span: Span,
}

/// Operator between an NBT key and its value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PairOperator {
    /// `=`
    Equals,
    /// `~`
    Tilde,
    /// `:`
    Colon,
}

impl PairOperator {
    /// Map an operator character.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '=' => Some(Self::Equals),
            '~' => Some(Self::Tilde),
            ':' => Some(Self::Colon),
            _ => None,
        }
    }

    /// The operator character.
    pub fn as_char(self) -> char {
        match self {
            Self::Equals => '=',
            Self::Tilde => '~',
            Self::Colon => ':',
        }
    }
}

/// `key op value`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NbtPair {
    /// Key.
    pub key: NbtKey,
    /// Operator.
    pub operator: PairOperator,
    /// Value.
    pub value: NbtValue,
    /// Source span from key to value.
    pub span: Span,
}

/// An NBT key or path segment name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum NbtKey {
    /// Bare word or quoted string.
    Plain(StringLiteral),
    /// Text with interpolations.
    Macro(MacroArgument),
}

impl NbtKey {
    /// The key text for plain keys.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            NbtKey::Plain(s) => Some(&s.value),
            NbtKey::Macro(_) => None,
        }
    }
}

impl Spanned for NbtKey {
    fn span(&self) -> Span {
        match self {
            NbtKey::Plain(s) => s.span,
            NbtKey::Macro(m) => m.span,
        }
    }
}

/// A value inside an NBT list or compound.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
#[non_exhaustive]
pub enum NbtValue {
    /// Quoted string or bare word ([`Quote::Bare`]).
    String(StringLiteral),
    /// Number.
    Number(Number),
    /// `namespace:path`
    ResourceLocation(ResourceLocation),
    /// Nested list.
    List(NbtList),
    /// Nested compound.
    Compound(NbtCompound),
    /// `true` / `false`
    Boolean(Boolean),
    /// Text with interpolations.
    Macro(MacroArgument),
    /// Placeholder for a container that failed to parse (tolerant mode only).
    Error(ErrorNode),
}

impl Spanned for NbtValue {
    fn span(&self) -> Span {
        match self {
            NbtValue::String(n) => n.span,
            NbtValue::Number(n) => n.span,
            NbtValue::ResourceLocation(n) => n.span,
            NbtValue::List(n) => n.span,
            NbtValue::Compound(n) => n.span,
            NbtValue::Boolean(n) => n.span,
            NbtValue::Macro(n) => n.span,
            NbtValue::Error(n) => n.span,
        }
    }
}

/// `true` / `false`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Boolean {
    /// Value.
    pub value: bool,
    /// Source span.
    pub span: Span,
}

/// `#name` scoreboard holder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FakePlayer {
    /// Name without the `#`.
    pub name: String,
    /// Source span including the `#`.
    pub span: Span,
}

/// Bare word argument.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Keyword {
    /// Text.
    pub text: String,
    /// Source span.
    pub span: Span,
}

/// NBT path such as `Inventory[{Slot:0b}].tag.display`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NbtPath {
    /// At least one segment; a single segment always has a suffix.
    pub segments: Vec<PathSegment>,
    /// Source span.
    pub span: Span,
}

/// One dotted segment of an [`NbtPath`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathSegment {
    /// Segment name.
    pub name: NbtKey,
    /// Index and filter suffixes in source order.
    pub suffixes: Vec<PathSuffix>,
    /// Source span including suffixes.
    pub span: Span,
}

impl PathSegment {
    /// `[...]` suffixes in order.
    pub fn indices(&self) -> impl Iterator<Item = &NbtList> {
        self.suffixes.iter().filter_map(|s| match s {
            PathSuffix::Index(l) => Some(l),
            PathSuffix::Filter(_) => None,
        })
    }

    /// `{...}` suffixes in order.
    pub fn filters(&self) -> impl Iterator<Item = &NbtCompound> {
        self.suffixes.iter().filter_map(|s| match s {
            PathSuffix::Filter(c) => Some(c),
            PathSuffix::Index(_) => None,
        })
    }
}

/// Suffix attached directly to a path segment name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum PathSuffix {
    /// `[...]`
    Index(NbtList),
    /// `{...}`
    Filter(NbtCompound),
}

/// `run <command>`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunClause {
    /// The nested command.
    pub subcommand: Box<SubCommand>,
    /// Source span from `run` to the end of the nested command.
    pub span: Span,
}

/// The command wrapped by a [`RunClause`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum SubCommand {
    /// Plain command.
    Command(Command),
    /// Macro command (explicit `$`, or interpolations inside a macro line).
    MacroCommand(MacroCommand),
}

/// `$(expression)`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MacroInterpolation {
    /// Raw text between `$(` and `)`.
    pub expression: String,
    /// Source span including `$(` and `)`.
    pub span: Span,
}

/// A literal run of source text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextRun {
    /// Text as written.
    pub text: String,
    /// Source span.
    pub span: Span,
}

/// One piece of a [`MacroArgument`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind")]
pub enum MacroFragment {
    /// Unquoted literal text.
    Literal(TextRun),
    /// `$(name)`
    Interpolation(MacroInterpolation),
    /// Literal text inside a quoted macro argument, escapes not processed.
    StringRun(TextRun),
}

/// Text mixed with interpolations, e.g. `prefix_$(id)` or `"Hi $(name)"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MacroArgument {
    /// Fragments in order; at least one is an interpolation.
    pub fragments: Vec<MacroFragment>,
    /// Quoting style of the whole argument.
    pub quote: Quote,
    /// Source span including any quotes.
    pub span: Span,
}

impl MacroArgument {
    /// The interpolations in order.
    pub fn interpolations(&self) -> impl Iterator<Item = &MacroInterpolation> {
        self.fragments.iter().filter_map(|f| match f {
            MacroFragment::Interpolation(i) => Some(i),
            _ => None,
        })
    }

    /// Rebuild the source text by concatenating the fragments.
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        let quote = self.quote.as_char();
        out.extend(quote);
        for fragment in &self.fragments {
            match fragment {
                MacroFragment::Literal(run) | MacroFragment::StringRun(run) => {
                    out.push_str(&run.text)
                }
                MacroFragment::Interpolation(i) => {
                    out.push_str("$(");
                    out.push_str(&i.expression);
                    out.push(')');
                }
            }
        }
        out.extend(quote);
        out
    }
}

/// Placeholder left where tolerant parsing skipped malformed input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorNode {
    /// The diagnostic message reported for this node.
    pub message: String,
    /// Skipped source span.
    pub span: Span,
}

spanned_struct!(
    Comment,
    Identifier,
    Command,
    MacroCommand,
    Coordinates,
    StringLiteral,
    Number,
    ResourceLocation,
    Selector,
    NbtList,
    NbtCompound,
    NbtPair,
    Boolean,
    FakePlayer,
    Keyword,
    NbtPath,
    PathSegment,
    RunClause,
    MacroInterpolation,
    TextRun,
    MacroArgument,
    ErrorNode,
);

impl Spanned for Statement {
    fn span(&self) -> Span {
        match self {
            Statement::Command(c) => c.span,
            Statement::MacroCommand(c) => c.span,
            Statement::Comment(c) => c.span,
            Statement::Error(e) => e.span,
        }
    }
}

impl Spanned for MacroName {
    fn span(&self) -> Span {
        match self {
            MacroName::Literal(i) => i.span,
            MacroName::Interpolation(i) => i.span,
        }
    }
}

impl Spanned for SubCommand {
    fn span(&self) -> Span {
        match self {
            SubCommand::Command(c) => c.span,
            SubCommand::MacroCommand(c) => c.span,
        }
    }
}

impl Spanned for Argument {
    fn span(&self) -> Span {
        match self {
            Argument::Coordinates(n) => n.span,
            Argument::String(n) => n.span,
            Argument::Number(n) => n.span,
            Argument::ResourceLocation(n) => n.span,
            Argument::Selector(n) => n.span,
            Argument::NbtList(n) => n.span,
            Argument::NbtCompound(n) => n.span,
            Argument::Boolean(n) => n.span,
            Argument::FakePlayer(n) => n.span,
            Argument::NbtPath(n) => n.span,
            Argument::Run(n) => n.span,
            Argument::Keyword(n) => n.span,
            Argument::Macro(n) => n.span,
            Argument::Error(n) => n.span,
        }
    }
}

impl Document {
    /// Whether any statement (or nested node) is an error placeholder.
    pub fn has_errors(&self) -> bool {
        self.statements
            .iter()
            .any(|s| matches!(s, Statement::Error(_)) || statement_args(s).iter().any(argument_has_error))
    }
}

fn statement_args(s: &Statement) -> &[Argument] {
    match s {
        Statement::Command(c) => &c.arguments,
        Statement::MacroCommand(c) => &c.arguments,
        Statement::Comment(_) | Statement::Error(_) => &[],
    }
}

fn argument_has_error(arg: &Argument) -> bool {
    match arg {
        Argument::Error(_) => true,
        Argument::Selector(s) => s.filter.as_ref().is_some_and(list_has_error),
        Argument::NbtList(l) => list_has_error(l),
        Argument::NbtCompound(c) => c.pairs.iter().any(|p| value_has_error(&p.value)),
        Argument::NbtPath(p) => p.segments.iter().any(|seg| {
            seg.suffixes.iter().any(|s| match s {
                PathSuffix::Index(l) => list_has_error(l),
                PathSuffix::Filter(c) => c.pairs.iter().any(|p| value_has_error(&p.value)),
            })
        }),
        Argument::Run(r) => {
            let args = match r.subcommand.as_ref() {
                SubCommand::Command(c) => &c.arguments,
                SubCommand::MacroCommand(c) => &c.arguments,
            };
            args.iter().any(argument_has_error)
        }
        _ => false,
    }
}

fn list_has_error(list: &NbtList) -> bool {
    match &list.items {
        NbtListItems::Pairs(pairs) => pairs.iter().any(|p| value_has_error(&p.value)),
        NbtListItems::Values(values) => values.iter().any(value_has_error),
    }
}

fn value_has_error(value: &NbtValue) -> bool {
    match value {
        NbtValue::Error(_) => true,
        NbtValue::List(l) => list_has_error(l),
        NbtValue::Compound(c) => c.pairs.iter().any(|p| value_has_error(&p.value)),
        _ => false,
    }
}
