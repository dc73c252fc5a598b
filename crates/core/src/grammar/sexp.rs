//! Tree-sitter style S-expression dump.
//!
//! Node names and field labels follow the mcfunction tree-sitter grammar, so
//! output can be compared against corpora written for that grammar:
//!
//! ```text
//! (source_file
//!   (command
//!     (command_name)
//!     (run_clause
//!       subcommand: (command
//!         (command_name)
//!         (keyword)))))
//! ```
//!
//! Anonymous tokens (`[`, `,`, `run`, quotes) are not printed. Index and
//! filter contents of NBT paths are flattened into the path node, as the
//! grammar hides those rules.

use std::fmt::Write as _;

use super::{
    ast::{
        Argument, Comment, CommentKind, Document, MacroArgument, MacroCommand, MacroFragment,
        NbtKey, NbtList, NbtListItems, NbtPair, NbtPath, NbtValue, PathSuffix, Quote,
        ResourceLocation, Spanned, Statement, SubCommand,
    },
    diag::{LineIndex, Span},
};

/// Render `doc` without positions.
pub fn to_sexp(doc: &Document) -> String {
    let mut w = Writer::new(None);
    w.document(doc, Span::default());
    w.out
}

/// Render `doc` with `[row, column] - [row, column]` ranges after each node
/// name. Rows and columns are 0-based; columns count bytes.
pub fn to_sexp_with_ranges(doc: &Document, source: &str) -> String {
    let index = LineIndex::new(source);
    let mut w = Writer::new(Some((&index, source)));
    w.document(doc, Span::new(0, source.len()));
    w.out
}

struct Writer<'a> {
    out: String,
    depth: usize,
    source: Option<(&'a LineIndex, &'a str)>,
}

impl<'a> Writer<'a> {
    fn new(source: Option<(&'a LineIndex, &'a str)>) -> Self {
        Self {
            out: String::new(),
            depth: 0,
            source,
        }
    }

    fn open(&mut self, field: Option<&str>, kind: &str, span: Span) {
        if !self.out.is_empty() {
            self.out.push('\n');
            for _ in 0..self.depth {
                self.out.push_str("  ");
            }
        }
        if let Some(field) = field {
            self.out.push_str(field);
            self.out.push_str(": ");
        }
        self.out.push('(');
        self.out.push_str(kind);
        if let Some((index, _)) = self.source {
            let (r1, c1) = index.line_col(span.start);
            let (r2, c2) = index.line_col(span.end);
            let _ = write!(self.out, " [{r1}, {c1}] - [{r2}, {c2}]");
        }
        self.depth += 1;
    }

    fn close(&mut self) {
        self.out.push(')');
        self.depth -= 1;
    }

    fn leaf(&mut self, field: Option<&str>, kind: &str, span: Span) {
        self.open(field, kind, span);
        self.close();
    }

    fn document(&mut self, doc: &Document, span: Span) {
        self.open(None, "source_file", span);
        for statement in &doc.statements {
            self.statement(statement);
        }
        self.close();
    }

    fn statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Command(c) => {
                self.open(None, "command", c.span);
                self.leaf(None, "command_name", c.name.span);
                self.arguments(&c.arguments);
                self.close();
            }
            Statement::MacroCommand(m) => self.macro_command(None, m),
            Statement::Comment(c) => self.comment(c),
            Statement::Error(e) => self.leaf(None, "ERROR", e.span),
        }
    }

    fn macro_command(&mut self, field: Option<&str>, m: &MacroCommand) {
        self.open(field, "macro_command", m.span);
        self.leaf(None, "command_name", m.name.span());
        self.arguments(&m.arguments);
        self.close();
    }

    fn comment(&mut self, c: &Comment) {
        let tag_end = c.span.start + c.tag.len();
        let body = Span::new(tag_end, c.span.end);
        self.open(None, "comment", c.span);
        match c.kind {
            CommentKind::Normal => {
                self.leaf(Some("tag"), "comment_tag", Span::new(c.span.start, tag_end));
                if c.content.is_some() {
                    let span = self.trim_start(body);
                    self.leaf(Some("content"), "comment_content", span);
                }
            }
            CommentKind::Important => {
                self.leaf(Some("tag"), "tag_important", Span::new(c.span.start, tag_end));
                if c.content.is_some() {
                    let span = self.trim_start(body);
                    self.leaf(Some("content"), "content_important", span);
                }
            }
            CommentKind::Directive => {
                self.leaf(Some("tag"), "tag_directive", Span::new(c.span.start, tag_end));
                let colon = self
                    .source
                    .and_then(|(_, src)| body.slice(src))
                    .and_then(|text| text.find(':'))
                    .map(|i| body.start + i);
                if c.directive_key.is_some() {
                    let key = Span::new(body.start, colon.unwrap_or(body.end));
                    let span = self.trim_start(key);
                    self.leaf(Some("key"), "key_directive", span);
                }
                if c.directive_value.is_some() {
                    let value = Span::new(colon.map_or(body.start, |i| i + 1), body.end);
                    let span = self.trim_start(value);
                    self.leaf(Some("content"), "content_directive", span);
                }
            }
        }
        self.close();
    }

    /// Move a span's start past leading blanks, which the grammar treats as
    /// trivia rather than token text.
    fn trim_start(&self, span: Span) -> Span {
        let Some(text) = self.source.and_then(|(_, src)| span.slice(src)) else {
            return span;
        };
        let skipped = text.len() - text.trim_start_matches([' ', '\t']).len();
        Span::new(span.start + skipped, span.end)
    }

    fn arguments(&mut self, arguments: &[Argument]) {
        for argument in arguments {
            self.argument(argument);
        }
    }

    fn argument(&mut self, argument: &Argument) {
        match argument {
            Argument::Coordinates(c) => self.leaf(None, "coordinates", c.span),
            Argument::String(s) => self.leaf(None, "string", s.span),
            Argument::Number(n) => self.leaf(None, "number", n.span),
            Argument::ResourceLocation(r) => self.resource_location(r),
            Argument::Selector(s) => {
                self.open(None, "selector", s.span);
                self.leaf(None, "selector_target", Span::new(s.span.start, s.span.start + 2));
                if let Some(filter) = &s.filter {
                    self.nbt_list(filter);
                }
                self.close();
            }
            Argument::NbtList(l) => self.nbt_list(l),
            Argument::NbtCompound(c) => {
                self.open(None, "nbt_compound", c.span);
                self.pairs(&c.pairs);
                self.close();
            }
            Argument::Boolean(b) => self.leaf(None, "boolean", b.span),
            Argument::FakePlayer(f) => self.leaf(None, "fake_player", f.span),
            Argument::NbtPath(p) => self.nbt_path(p),
            Argument::Run(r) => {
                self.open(None, "run_clause", r.span);
                match r.subcommand.as_ref() {
                    SubCommand::Command(c) => {
                        self.open(Some("subcommand"), "command", c.span);
                        self.leaf(None, "command_name", c.name.span);
                        self.arguments(&c.arguments);
                        self.close();
                    }
                    SubCommand::MacroCommand(m) => self.macro_command(Some("subcommand"), m),
                }
                self.close();
            }
            Argument::Keyword(k) => self.leaf(None, "keyword", k.span),
            Argument::Macro(m) => self.macro_argument(m),
            Argument::Error(e) => self.leaf(None, "ERROR", e.span),
        }
    }

    fn resource_location(&mut self, r: &ResourceLocation) {
        let colon = r.span.start + r.namespace.len();
        self.open(None, "resource_location", r.span);
        self.leaf(Some("namespace"), "namespace", Span::new(r.span.start, colon));
        self.leaf(Some("identifier"), "identifier", Span::new(colon + 1, r.span.end));
        self.close();
    }

    fn nbt_list(&mut self, list: &NbtList) {
        self.open(None, "nbt_list", list.span);
        self.list_items(&list.items);
        self.close();
    }

    fn list_items(&mut self, items: &NbtListItems) {
        match items {
            NbtListItems::Pairs(pairs) => self.pairs(pairs),
            NbtListItems::Values(values) => {
                for value in values {
                    self.value(value);
                }
            }
        }
    }

    fn pairs(&mut self, pairs: &[NbtPair]) {
        for pair in pairs {
            self.open(None, "nbt_pair", pair.span);
            self.open(Some("key"), "nbt_key", pair.key.span());
            self.key(&pair.key, "string");
            self.close();
            self.open(Some("value"), "nbt_value", pair.value.span());
            self.value(&pair.value);
            self.close();
            self.close();
        }
    }

    /// A key; `bare_kind` names a bare word (`string` in pairs, `keyword`
    /// in paths).
    fn key(&mut self, key: &NbtKey, bare_kind: &str) {
        match key {
            NbtKey::Plain(s) if s.quote == Quote::Bare => self.leaf(None, bare_kind, s.span),
            NbtKey::Plain(s) => self.leaf(None, "string", s.span),
            NbtKey::Macro(m) => self.macro_argument(m),
        }
    }

    fn value(&mut self, value: &NbtValue) {
        match value {
            NbtValue::String(s) => self.leaf(None, "string", s.span),
            NbtValue::Number(n) => self.leaf(None, "number", n.span),
            NbtValue::ResourceLocation(r) => self.resource_location(r),
            NbtValue::List(l) => self.nbt_list(l),
            NbtValue::Compound(c) => {
                self.open(None, "nbt_compound", c.span);
                self.pairs(&c.pairs);
                self.close();
            }
            NbtValue::Boolean(b) => self.leaf(None, "boolean", b.span),
            NbtValue::Macro(m) => self.macro_argument(m),
            NbtValue::Error(e) => self.leaf(None, "ERROR", e.span),
        }
    }

    fn nbt_path(&mut self, path: &NbtPath) {
        self.open(None, "nbt_path", path.span);
        for segment in &path.segments {
            self.key(&segment.name, "keyword");
            for suffix in &segment.suffixes {
                match suffix {
                    PathSuffix::Index(list) => self.list_items(&list.items),
                    PathSuffix::Filter(compound) => self.pairs(&compound.pairs),
                }
            }
        }
        self.close();
    }

    fn macro_argument(&mut self, m: &MacroArgument) {
        self.open(None, "macro_argument", m.span);
        for fragment in &m.fragments {
            match fragment {
                MacroFragment::Literal(run) => self.leaf(None, "macro_fragment", run.span),
                MacroFragment::Interpolation(i) => self.leaf(None, "macro_interpolation", i.span),
                MacroFragment::StringRun(_) => {}
            }
        }
        self.close();
    }
}
