//! # Parser
//!
//! Builds a [`Node`] tree from OGDL text.
//!
//! ## Structure rules
//!
//! - Each line holds one or more *entries* separated by `,`.
//! - An entry is a run of scalars, optionally followed by a `( … )` group
//!   whose entries become its children.
//! - One scalar makes a named node, two make a name/value pair, three or
//!   more make an unnamed group of unnamed scalars (`a b c`).
//! - The last entry of a line stays open: a following, deeper-indented line
//!   nests under it. Earlier entries on the line become its siblings.
//! - Inside an open group, line breaks and indentation carry no meaning;
//!   only `,` and `)` delimit.
//! - A trailing `|` starts a table. Every following line indented deeper
//!   than the current one is a row: a node named `0`, `1`, … holding that
//!   line's entries. Rows attach to the entry before the `|`, or to the
//!   line's parent when the `|` stands alone.
//!
//! ## Indentation
//!
//! Open entries live on an explicit stack of frames, each tagged with the
//! indentation of the line that opened it. A shallower line closes frames
//! until it lands on an indentation that was actually opened. A line that
//! lands between two levels snaps to the shallower one and becomes a
//! sibling of the entry opened there (with a warning).
//! Nothing here recurses over indentation, so depth is bounded only by
//! [`ParserConfig::max_depth`].

use crate::config::ParserConfig;
use crate::diagnostics::{DiagnosticSink, Level, NullSink};
use crate::graph::Node;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::primitives::{GROUP_CLOSE, GROUP_OPEN, SEPARATOR};
use crate::types::{ParseError, Position};

// =============================================================================
// ENTRY POINTS
// =============================================================================

/// Parse OGDL text with default limits.
pub fn parse_text(input: &[u8]) -> Result<Node, ParseError> {
    parse_text_with(input, &ParserConfig::default(), &NullSink)
}

/// Parse an OGDL string with default limits.
pub fn parse_str(input: &str) -> Result<Node, ParseError> {
    parse_text(input.as_bytes())
}

/// Parse OGDL text, reporting diagnostics to `sink`.
///
/// The returned root is unnamed and valueless; every top-level entry is
/// one of its children. Empty input yields an empty root.
pub fn parse_text_with(
    input: &[u8],
    config: &ParserConfig,
    sink: &dyn DiagnosticSink,
) -> Result<Node, ParseError> {
    let result = Lexer::from_bytes(input)
        .map_err(ParseError::from)
        .and_then(|lexer| {
            let lexer = lexer.with_max_token_len(config.max_token_len);
            Parser::new(lexer, *config, sink).parse()
        });
    if let Err(e) = &result {
        sink.log(Level::Error, &e.to_string(), Some(e.position()));
    }
    result
}

// =============================================================================
// PARSER
// =============================================================================

/// An entry that may still receive children from deeper lines.
#[derive(Debug)]
struct Frame {
    indent: usize,
    node: Node,
}

struct Parser<'a, 's> {
    lexer: Lexer<'a>,
    peeked: Option<Token>,
    config: ParserConfig,
    sink: &'s dyn DiagnosticSink,
    root: Node,
    stack: Vec<Frame>,
    base_indent: Option<usize>,
    /// Indentation level of the line being parsed.
    line_width: usize,
}

impl<'a, 's> Parser<'a, 's> {
    fn new(lexer: Lexer<'a>, config: ParserConfig, sink: &'s dyn DiagnosticSink) -> Self {
        Self {
            lexer,
            peeked: None,
            config,
            sink,
            root: Node::new(),
            stack: Vec::new(),
            base_indent: None,
            line_width: 0,
        }
    }

    fn parse(mut self) -> Result<Node, ParseError> {
        if self.lexer.has_bom() {
            self.sink.log(
                Level::Warning,
                "byte-order mark at start of input ignored",
                Some(Position::START),
            );
        }

        loop {
            let token = self.advance()?;
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::Newline | TokenKind::Comment(_) => {}
                TokenKind::Indent(width) => self.line(width, token.pos)?,
                _ => {
                    let width = self.lexer.line_indent();
                    let pos = token.pos;
                    self.peeked = Some(token);
                    self.line(width, pos)?;
                }
            }
        }

        while !self.stack.is_empty() {
            self.close_top();
        }
        if self.sink.enabled(Level::Trace) {
            self.sink.log(
                Level::Trace,
                &format!("parsed {} top-level nodes", self.root.len()),
                None,
            );
        }
        Ok(self.root)
    }

    // -------------------------------------------------------------------------
    // Lines and indentation
    // -------------------------------------------------------------------------

    fn line(&mut self, width: usize, pos: Position) -> Result<(), ParseError> {
        self.skip_trivia(false)?;
        // Blank after comments: the line does not touch the frame stack.
        let blank = match self.peek()?.kind {
            TokenKind::Newline => Some(true),
            TokenKind::Eof => Some(false),
            _ => None,
        };
        if let Some(newline) = blank {
            if newline {
                self.advance()?;
            }
            return Ok(());
        }

        let width = self.place(width, pos)?;
        self.line_width = width;
        let depth = self.stack.len() + 1;
        if depth > self.config.max_depth {
            return Err(ParseError::TooDeep {
                limit: self.config.max_depth,
                position: pos,
            });
        }

        let mut entries = self.list(depth, None)?;
        if self.sink.enabled(Level::Trace) {
            self.sink.log(
                Level::Trace,
                &format!("line at indent {}: {} entries", width, entries.len()),
                Some(pos),
            );
        }

        let last = entries.pop();
        let parent = self.parent_mut();
        for entry in entries {
            parent.push(entry);
        }
        if let Some(node) = last {
            self.stack.push(Frame {
                indent: width,
                node,
            });
        }
        Ok(())
    }

    /// Close every frame at or deeper than `width` and return the level the
    /// line belongs to.
    fn place(&mut self, width: usize, pos: Position) -> Result<usize, ParseError> {
        let base = *self.base_indent.get_or_insert(width);
        if width < base {
            return Err(ParseError::DedentPastRoot {
                indent: width,
                base,
                position: pos,
            });
        }

        let mut closed = false;
        let mut landed = false;
        while let Some(top) = self.stack.last() {
            if top.indent < width {
                break;
            }
            landed |= top.indent == width;
            closed = true;
            self.close_top();
        }
        if !closed || landed {
            return Ok(width);
        }

        // Between two levels: join the shallower one as a sibling.
        let level = self.stack.last().map_or(base, |top| top.indent);
        self.close_top();
        self.sink.log(
            Level::Warning,
            &format!(
                "indentation {} matches no open level, using {}",
                width, level
            ),
            Some(pos),
        );
        Ok(level)
    }

    fn close_top(&mut self) {
        if let Some(frame) = self.stack.pop() {
            self.parent_mut().push(frame.node);
        }
    }

    fn parent_mut(&mut self) -> &mut Node {
        match self.stack.last_mut() {
            Some(frame) => &mut frame.node,
            None => &mut self.root,
        }
    }

    // -------------------------------------------------------------------------
    // Entries
    // -------------------------------------------------------------------------

    /// Parse `,`-separated entries at `depth`.
    ///
    /// Outside a group the list ends at a line break or end of input; inside
    /// one (`group` holds the position of its `(`) it ends at the matching
    /// `)`, which is consumed.
    fn list(&mut self, depth: usize, group: Option<Position>) -> Result<Vec<Node>, ParseError> {
        let in_group = group.is_some();
        let mut entries = Vec::new();
        let mut separator: Option<Position> = None;

        loop {
            let found = self.entry(depth, in_group, &mut entries)?;
            self.skip_trivia(in_group)?;
            let token = self.advance()?;

            let at_end = match (&token.kind, group) {
                (TokenKind::GroupClose, Some(_)) => true,
                (TokenKind::Newline, None) => true,
                // A table consumed the rest of the line and the rows below it.
                (TokenKind::Indent(_) | TokenKind::Eof, None) => {
                    self.peeked = Some(token.clone());
                    true
                }
                (TokenKind::Eof, Some(open)) => {
                    return Err(ParseError::UnterminatedGroup { position: open });
                }
                _ => false,
            };

            if !found && !(at_end && separator.is_none()) {
                return Err(match separator {
                    Some(position) if at_end => ParseError::UnexpectedDelimiter {
                        delimiter: SEPARATOR,
                        position,
                    },
                    _ => unexpected(&token),
                });
            }

            if at_end {
                return Ok(entries);
            }
            match token.kind {
                TokenKind::Separator => separator = Some(token.pos),
                _ => return Err(unexpected(&token)),
            }
        }
    }

    /// Parse one entry: scalars, then an optional group or table, appending
    /// the result to `entries`.
    ///
    /// Returns `false` when the next token starts none of these.
    fn entry(
        &mut self,
        depth: usize,
        in_group: bool,
        entries: &mut Vec<Node>,
    ) -> Result<bool, ParseError> {
        let mut scalars = Vec::new();
        loop {
            self.skip_trivia(in_group)?;
            if !self.peek()?.kind.is_scalar() {
                break;
            }
            if let Some(text) = self.advance()?.kind.into_scalar() {
                scalars.push(text);
            }
        }

        let mut node = self.flatten(scalars);
        if !in_group && matches!(self.peek()?.kind, TokenKind::Table) {
            self.advance()?;
            match node.as_mut() {
                Some(parent) => {
                    let rows = self.table(depth + 1)?;
                    parent.children_mut().extend(rows);
                }
                None => {
                    let rows = self.table(depth)?;
                    entries.extend(rows);
                    return Ok(true);
                }
            }
        } else if matches!(self.peek()?.kind, TokenKind::GroupOpen) {
            let open = self.advance()?.pos;
            if depth + 1 > self.config.max_depth {
                return Err(ParseError::TooDeep {
                    limit: self.config.max_depth,
                    position: open,
                });
            }
            let children = self.list(depth + 1, Some(open))?;
            node.get_or_insert_with(Node::new)
                .children_mut()
                .extend(children);
        }
        let found = node.is_some();
        entries.extend(node);
        Ok(found)
    }

    /// Parse the rows of a table whose marker was just consumed. Rows sit
    /// at `depth`, their entries one level deeper.
    fn table(&mut self, depth: usize) -> Result<Vec<Node>, ParseError> {
        if matches!(self.peek()?.kind, TokenKind::Newline) {
            self.advance()?;
        }
        let base = self.line_width;
        let mut rows = Vec::new();
        loop {
            let token = self.advance()?;
            let width = match token.kind {
                TokenKind::Indent(width) if width > base => width,
                _ => {
                    self.peeked = Some(token);
                    break;
                }
            };
            if depth + 1 > self.config.max_depth {
                return Err(ParseError::TooDeep {
                    limit: self.config.max_depth,
                    position: token.pos,
                });
            }

            // A table inside a row nests under that row's indentation.
            self.line_width = width;
            let entries = self.list(depth + 1, None);
            self.line_width = base;
            let entries = entries?;
            if !entries.is_empty() {
                rows.push(Node::named(rows.len().to_string()).with_children(entries));
            }
        }
        if self.sink.enabled(Level::Trace) {
            self.sink.log(
                Level::Trace,
                &format!("table with {} rows", rows.len()),
                None,
            );
        }
        Ok(rows)
    }

    fn flatten(&self, mut scalars: Vec<String>) -> Option<Node> {
        match scalars.len() {
            0 => None,
            1 => scalars.pop().map(Node::named),
            2 => {
                let value = scalars.pop().unwrap_or_default();
                let name = scalars.pop().unwrap_or_default();
                Some(Node::pair(name, value))
            }
            n => {
                if self.sink.enabled(Level::Trace) {
                    self.sink.log(
                        Level::Trace,
                        &format!("grouping {} scalars", n),
                        Some(self.lexer.cursor()),
                    );
                }
                Some(Node::new().with_children(scalars.into_iter().map(Node::scalar)))
            }
        }
    }

    // -------------------------------------------------------------------------
    // Token access
    // -------------------------------------------------------------------------

    /// Skip comments, and inside groups also line breaks and indentation.
    fn skip_trivia(&mut self, in_group: bool) -> Result<(), ParseError> {
        loop {
            let skip = match self.peek()?.kind {
                TokenKind::Comment(_) => true,
                TokenKind::Newline | TokenKind::Indent(_) => in_group,
                _ => false,
            };
            if !skip {
                return Ok(());
            }
            self.advance()?;
        }
    }

    fn peek(&mut self) -> Result<&Token, ParseError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.pull()?,
        };
        Ok(self.peeked.insert(token))
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.pull(),
        }
    }

    fn pull(&mut self) -> Result<Token, ParseError> {
        match self.lexer.next() {
            Some(Ok(token)) => Ok(token),
            Some(Err(e)) => Err(e.into()),
            None => Ok(Token::new(TokenKind::Eof, self.lexer.cursor())),
        }
    }
}

/// Error for a token that cannot appear where it was found.
fn unexpected(token: &Token) -> ParseError {
    let delimiter = match token.kind {
        TokenKind::Separator => Some(SEPARATOR),
        TokenKind::GroupOpen => Some(GROUP_OPEN),
        TokenKind::GroupClose => Some(GROUP_CLOSE),
        _ => None,
    };
    match delimiter {
        Some(delimiter) => ParseError::UnexpectedDelimiter {
            delimiter,
            position: token.pos,
        },
        None => ParseError::UnexpectedToken {
            found: token.kind.describe().to_string(),
            position: token.pos,
        },
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::diagnostics::MemorySink;
    use crate::types::LexError;

    fn parse(input: &str) -> Node {
        parse_str(input).expect("parse")
    }

    fn names(node: &Node) -> Vec<&str> {
        node.iter().map(Node::name).collect()
    }

    #[test]
    fn three_scalars_form_an_implicit_group() {
        let root = parse("a b c");
        assert_eq!(root.len(), 1);
        let group = root.child(0).expect("group");
        assert_eq!(group.name(), "");
        assert_eq!(group.value(), "");
        let values: Vec<&str> = group.iter().map(Node::value).collect();
        assert_eq!(values, vec!["a", "b", "c"]);
        assert!(group.iter().all(|c| c.name().is_empty() && c.is_leaf()));
    }

    #[test]
    fn indentation_nests_under_last_entry() {
        let root = parse("group\n  x 1\n  y 2\n");
        let group = root.child(0).expect("group");
        assert_eq!(group.name(), "group");
        assert_eq!(group.child(0), Some(&Node::pair("x", "1")));
        assert_eq!(group.child(1), Some(&Node::pair("y", "2")));
    }

    #[test]
    fn dedent_returns_to_matching_level() {
        let root = parse("a\n  b\n    c\n  d\ne\n");
        assert_eq!(names(&root), vec!["a", "e"]);
        let a = root.child(0).expect("a");
        assert_eq!(names(a), vec!["b", "d"]);
        assert_eq!(names(a.child(0).expect("b")), vec!["c"]);
    }

    #[test]
    fn separators_make_siblings_and_last_stays_open() {
        let root = parse("a, b\n  c\n");
        assert_eq!(names(&root), vec!["a", "b"]);
        assert!(root.child(0).expect("a").is_leaf());
        assert_eq!(names(root.child(1).expect("b")), vec!["c"]);
    }

    #[test]
    fn groups_attach_children() {
        let root = parse("point (x 1, y 2)");
        let point = root.child(0).expect("point");
        assert_eq!(point.name(), "point");
        assert_eq!(point.child(0), Some(&Node::pair("x", "1")));
        assert_eq!(point.child(1), Some(&Node::pair("y", "2")));
    }

    #[test]
    fn nested_groups_and_bare_group() {
        let root = parse("a (b (c), d)\n(e, f)");
        let a = root.child(0).expect("a");
        assert_eq!(names(a), vec!["b", "d"]);
        assert_eq!(names(a.child(0).expect("b")), vec!["c"]);
        let bare = root.child(1).expect("bare group");
        assert_eq!(bare.name(), "");
        assert_eq!(names(bare), vec!["e", "f"]);
    }

    #[test]
    fn groups_span_lines_ignoring_indentation() {
        let root = parse("list (\n  one,\n      two # note\n, three)\nnext");
        let list = root.child(0).expect("list");
        assert_eq!(names(list), vec!["one", "two", "three"]);
        assert_eq!(names(&root), vec!["list", "next"]);
    }

    #[test]
    fn indented_lines_nest_under_group_entry() {
        let root = parse("a (b)\n  c\n");
        assert_eq!(names(root.child(0).expect("a")), vec!["b", "c"]);
    }

    #[test]
    fn quoted_and_block_scalars() {
        let root = parse("title \"Hello, world\"\ntext \\\n  line 1\n  line 2\nend");
        assert_eq!(root.child(0), Some(&Node::pair("title", "Hello, world")));
        assert_eq!(root.child(1), Some(&Node::pair("text", "line 1\nline 2")));
        assert_eq!(root.child(2), Some(&Node::named("end")));
    }

    #[test]
    fn comments_and_blank_lines_do_not_affect_structure() {
        let root = parse("# header\na\n\n# between\n  b # trailing\n");
        assert_eq!(names(&root), vec!["a"]);
        assert_eq!(names(root.child(0).expect("a")), vec!["b"]);
    }

    #[test]
    fn empty_and_whitespace_input() {
        assert_eq!(parse(""), Node::new());
        assert_eq!(parse("\n   \n# only a comment\n"), Node::new());
    }

    #[test]
    fn uniform_base_indentation_is_accepted() {
        let root = parse("  a\n    b\n  c");
        assert_eq!(names(&root), vec!["a", "c"]);
    }

    #[test]
    fn dedent_past_first_line_is_rejected() {
        let err = parse_str("  a\nb").expect_err("must fail");
        assert_eq!(
            err,
            ParseError::DedentPastRoot {
                indent: 0,
                base: 2,
                position: Position::new(2, 1, 4)
            }
        );
    }

    #[test]
    fn dedent_between_levels_snaps_to_shallower_level() {
        let sink = MemorySink::new();
        let root = parse_text_with(b"a\n    b\n  c\n   d\n", &ParserConfig::default(), &sink)
            .expect("parse");
        assert_eq!(names(&root), vec!["a", "c"]);
        assert_eq!(names(root.child(0).expect("a")), vec!["b"]);
        assert_eq!(names(root.child(1).expect("c")), vec!["d"]);
        assert_eq!(sink.count(Level::Warning), 1);

        let root = parse("a\n  b\n      c\n    d\n");
        let a = root.child(0).expect("a");
        assert_eq!(names(a), vec!["b", "d"]);
        assert_eq!(names(a.child(0).expect("b")), vec!["c"]);
    }

    #[test]
    fn table_rows_are_numbered() {
        let root = parse("t |\n  x y\n  z w, v\nnext\n");
        assert_eq!(names(&root), vec!["t", "next"]);
        let t = root.child(0).expect("t");
        assert_eq!(t.value(), "");
        assert_eq!(names(t), vec!["0", "1"]);
        assert_eq!(root.get("t.[0]").map(Node::name), Some("0"));
        assert_eq!(
            t.child(0).map(Node::children),
            Some([Node::pair("x", "y")].as_slice())
        );
        assert_eq!(names(t.child(1).expect("row 1")), vec!["z", "v"]);
    }

    #[test]
    fn bare_table_rows_attach_to_parent() {
        let root = parse("doc\n  |\n    a\n    b c\n  end\n");
        let doc = root.child(0).expect("doc");
        assert_eq!(names(doc), vec!["0", "1", "end"]);
        assert_eq!(doc.child(1).and_then(|r| r.child(0)), Some(&Node::pair("b", "c")));
    }

    #[test]
    fn table_edge_cases() {
        assert_eq!(parse("t |"), Node::new().with_child(Node::named("t")));
        assert_eq!(parse("a | b"), parse("a \"|\" b"));

        let err = parse_str("(a |\n b)").expect_err("must fail");
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));

        let config = ParserConfig {
            max_depth: 2,
            ..ParserConfig::default()
        };
        let err = parse_text_with(b"t |\n  x\n", &config, &NullSink).expect_err("depth");
        assert!(matches!(err, ParseError::TooDeep { limit: 2, .. }));
    }

    #[test]
    fn stray_close_is_rejected() {
        let err = parse_str("a )").expect_err("must fail");
        assert_eq!(
            err,
            ParseError::UnexpectedDelimiter {
                delimiter: ')',
                position: Position::new(1, 3, 2)
            }
        );
    }

    #[test]
    fn empty_entries_are_rejected() {
        for (input, column) in [("a,,b", 3), (", a", 1), ("a,", 2), ("(a,)", 3)] {
            let err = parse_str(input).expect_err(input);
            match err {
                ParseError::UnexpectedDelimiter {
                    delimiter: ',',
                    position,
                } => assert_eq!(position.column, column, "{input}"),
                other => panic!("{input}: unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn scalar_after_group_is_rejected() {
        let err = parse_str("a (b) c").expect_err("must fail");
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));

        let err = parse_str("a (b) (c)").expect_err("must fail");
        assert!(matches!(
            err,
            ParseError::UnexpectedDelimiter { delimiter: '(', .. }
        ));
    }

    #[test]
    fn unterminated_group_points_at_open() {
        let err = parse_str("a\nb (c,\n d").expect_err("must fail");
        assert_eq!(
            err,
            ParseError::UnterminatedGroup {
                position: Position::new(2, 3, 4)
            }
        );
    }

    #[test]
    fn lexer_errors_propagate() {
        let err = parse_str("a \"open").expect_err("must fail");
        assert!(matches!(
            err,
            ParseError::Lex(LexError::UnterminatedString { .. })
        ));
        let err = parse_text(b"a \xff").expect_err("must fail");
        assert!(matches!(err, ParseError::Lex(LexError::InvalidUtf8 { .. })));
    }

    #[test]
    fn depth_limit_counts_indentation_and_groups() {
        let config = ParserConfig {
            max_depth: 3,
            ..ParserConfig::default()
        };
        assert!(parse_text_with(b"a\n b\n  c", &config, &NullSink).is_ok());

        let err = parse_text_with(b"a\n b\n  c\n   d", &config, &NullSink).expect_err("indent");
        assert!(matches!(err, ParseError::TooDeep { limit: 3, .. }));

        let err = parse_text_with(b"a (b (c (d)))", &config, &NullSink).expect_err("groups");
        assert!(matches!(err, ParseError::TooDeep { limit: 3, .. }));
    }

    #[test]
    fn deep_indentation_within_limit_parses() {
        let mut input = String::new();
        for depth in 0..100 {
            input.push_str(&" ".repeat(depth));
            input.push_str("n\n");
        }
        let root = parse(&input);
        assert_eq!(root.depth(), 100);
    }

    #[test]
    fn errors_are_reported_to_sink() {
        let sink = MemorySink::new();
        let result = parse_text_with(b"a )", &ParserConfig::default(), &sink);
        assert!(result.is_err());
        let errors: Vec<_> = sink
            .entries()
            .into_iter()
            .filter(|d| d.level == Level::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].position, Some(Position::new(1, 3, 2)));
    }

    #[test]
    fn bom_produces_warning() {
        let sink = MemorySink::new();
        let root =
            parse_text_with(b"\xEF\xBB\xBFa 1", &ParserConfig::default(), &sink).expect("parse");
        assert_eq!(root.child(0), Some(&Node::pair("a", "1")));
        assert_eq!(sink.count(Level::Warning), 1);
    }

    #[test]
    fn trace_messages_only_when_enabled() {
        let sink = MemorySink::new();
        parse_text_with(b"a b c\nd", &ParserConfig::default(), &sink).expect("parse");
        assert!(sink.count(Level::Trace) >= 2);
    }
}
