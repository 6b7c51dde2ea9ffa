//! # Path Queries
//!
//! Dotted/indexed selectors addressing a subtree.
//!
//! ```text
//! path     := '' | element ('.' element)*
//! element  := name index* | index+
//! name     := bare+ | '"' char* '"' | "'" char* "'"
//! char     := '\\' | '\"' | "\'" | any
//! index    := '[' digit+ ']'
//! ```
//!
//! - `name` selects the first child with that name.
//! - `name[n]` selects the n-th (0-based) child with that name.
//! - `[n]` selects the n-th child by position, whatever its name.
//!
//! Inside quotes a backslash escapes a quote or another backslash; before
//! any other character it is kept as is.
//!
//! So `group.item[2].field` is "the `field` of the third `item` of
//! `group`", while `group.[2]` is "the third child of `group`".
//!
//! Paths are parsed on demand and never cached on a node. Plain lookups
//! treat absence (and malformed paths) as a normal outcome and return
//! `None`.

use crate::graph::Node;
use crate::types::PathError;
use std::fmt::{self, Write as _};
use std::str::FromStr;

// =============================================================================
// SELECTOR
// =============================================================================

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// First child with this name.
    Name(String),
    /// The `index`-th child with this name.
    NthNamed { name: String, index: usize },
    /// The `index`-th child by position.
    Index(usize),
}

impl Selector {
    fn resolve<'a>(&self, node: &'a Node) -> Option<&'a Node> {
        match self {
            Self::Name(name) => node.child_named(name),
            Self::NthNamed { name, index } => node.nth_named(name, *index),
            Self::Index(index) => node.child(*index),
        }
    }

    fn resolve_mut<'a>(&self, node: &'a mut Node) -> Option<&'a mut Node> {
        match self {
            Self::Name(name) => node.child_named_mut(name),
            Self::NthNamed { name, index } => node.nth_named_mut(name, *index),
            Self::Index(index) => node.child_mut(*index),
        }
    }
}

// =============================================================================
// PATH
// =============================================================================

/// A parsed path. The empty path addresses the node it is applied to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path {
    selectors: Vec<Selector>,
}

impl Path {
    /// The empty path.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from selectors.
    #[must_use]
    pub fn from_selectors(selectors: Vec<Selector>) -> Self {
        Self { selectors }
    }

    #[must_use]
    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.selectors.is_empty()
    }

    /// Parse a path string.
    pub fn parse(input: &str) -> Result<Self, PathError> {
        PathParser::new(input).parse()
    }

    /// Follow the path from `node`.
    #[must_use]
    pub fn resolve<'a>(&self, node: &'a Node) -> Option<&'a Node> {
        self.selectors
            .iter()
            .try_fold(node, |cursor, selector| selector.resolve(cursor))
    }

    /// Follow the path from `node`, mutably.
    pub fn resolve_mut<'a>(&self, node: &'a mut Node) -> Option<&'a mut Node> {
        let mut cursor = node;
        for selector in &self.selectors {
            cursor = selector.resolve_mut(cursor)?;
        }
        Some(cursor)
    }

    /// Follow the path, creating missing *named* elements.
    ///
    /// Index selectors must already resolve; unnamed or positional nodes
    /// are never created.
    pub fn materialize<'a>(&self, node: &'a mut Node) -> Result<&'a mut Node, PathError> {
        let mut cursor = node;
        for (depth, selector) in self.selectors.iter().enumerate() {
            cursor = match selector {
                Selector::Name(name) => {
                    match cursor.children().iter().position(|c| c.name() == name) {
                        Some(i) => &mut cursor.children_mut()[i],
                        None => cursor.push(Node::named(name.clone())),
                    }
                }
                Selector::NthNamed { .. } | Selector::Index(_) => {
                    match selector.resolve_mut(cursor) {
                        Some(next) => next,
                        None => {
                            let prefix = Self::from_selectors(self.selectors[..=depth].to_vec());
                            return Err(PathError::NotFound {
                                path: prefix.to_string(),
                            });
                        }
                    }
                }
            };
        }
        Ok(cursor)
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, selector) in self.selectors.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match selector {
                Selector::Name(name) => write_name(f, name)?,
                Selector::NthNamed { name, index } => {
                    write_name(f, name)?;
                    write!(f, "[{}]", index)?;
                }
                Selector::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

fn write_name(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    if !name.is_empty() && name.chars().all(is_bare) {
        return f.write_str(name);
    }
    f.write_char('"')?;
    for c in name.chars() {
        if matches!(c, '"' | '\\') {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    f.write_char('"')
}

/// Characters allowed in an unquoted path name.
fn is_bare(c: char) -> bool {
    !matches!(
        c,
        '.' | '[' | ']' | '(' | ')' | '{' | '}' | '"' | '\'' | ';' | ','
    ) && !c.is_whitespace()
}

// =============================================================================
// PATH PARSER
// =============================================================================

struct PathParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> PathParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn parse(mut self) -> Result<Path, PathError> {
        let mut selectors = Vec::new();
        if self.input.is_empty() {
            return Ok(Path { selectors });
        }

        loop {
            self.element(&mut selectors)?;
            match self.peek() {
                None => break,
                Some('.') => {
                    self.bump();
                    if self.peek().is_none() {
                        return Err(PathError::EmptyElement { offset: self.pos });
                    }
                }
                Some(found) => {
                    return Err(PathError::UnexpectedChar {
                        found,
                        offset: self.pos,
                    });
                }
            }
        }

        Ok(Path { selectors })
    }

    /// Parse one element (a name with optional indices, or bare indices).
    fn element(&mut self, selectors: &mut Vec<Selector>) -> Result<(), PathError> {
        let start = self.pos;
        match self.peek() {
            Some('[') => {
                let index = self.index()?;
                selectors.push(Selector::Index(index));
            }
            Some(q @ ('"' | '\'')) => {
                self.bump();
                let name = self.quoted(q, start)?;
                self.named(name, selectors)?;
            }
            Some(c) if is_bare(c) => {
                while self.peek().is_some_and(is_bare) {
                    self.bump();
                }
                let name = self.input[start..self.pos].to_string();
                self.named(name, selectors)?;
            }
            Some('.') | None => return Err(PathError::EmptyElement { offset: start }),
            Some(found) => {
                return Err(PathError::UnexpectedChar {
                    found,
                    offset: start,
                });
            }
        }

        // Chained positional indices: `a[1][0]` or `[0][2]`.
        while self.peek() == Some('[') {
            let index = self.index()?;
            selectors.push(Selector::Index(index));
        }
        Ok(())
    }

    /// A name, optionally followed by one `[n]` that counts same-named siblings.
    fn named(&mut self, name: String, selectors: &mut Vec<Selector>) -> Result<(), PathError> {
        if self.peek() == Some('[') {
            let index = self.index()?;
            selectors.push(Selector::NthNamed { name, index });
        } else {
            selectors.push(Selector::Name(name));
        }
        Ok(())
    }

    fn quoted(&mut self, quote: char, start: usize) -> Result<String, PathError> {
        let mut name = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(name),
                Some('\\') => match self.peek() {
                    Some(next @ ('\\' | '"' | '\'')) => {
                        self.bump();
                        name.push(next);
                    }
                    _ => name.push('\\'),
                },
                Some(c) => name.push(c),
                None => return Err(PathError::UnterminatedQuote { offset: start }),
            }
        }
    }

    fn index(&mut self) -> Result<usize, PathError> {
        let open = self.pos;
        self.bump();
        let body_start = self.pos;
        loop {
            match self.bump() {
                Some(']') => break,
                Some(_) => {}
                None => return Err(PathError::UnterminatedIndex { offset: open }),
            }
        }
        let text = self.input[body_start..self.pos - 1].trim();
        text.parse::<usize>()
            .map_err(|_| PathError::InvalidIndex {
                text: text.to_string(),
                offset: open,
            })
    }
}

// =============================================================================
// NODE LOOKUPS
// =============================================================================

impl Node {
    /// Resolve a path relative to this node.
    ///
    /// `get("")` returns `self`. Paths that do not resolve, or do not
    /// parse, return `None`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Node> {
        Path::parse(path).ok()?.resolve(self)
    }

    /// Mutable variant of [`get`](Self::get).
    pub fn get_mut(&mut self, path: &str) -> Option<&mut Node> {
        Path::parse(path).ok()?.resolve_mut(self)
    }

    /// Value of the node at `path`.
    #[must_use]
    pub fn get_value(&self, path: &str) -> Option<&str> {
        self.get(path).map(Node::value)
    }

    /// Resolve `path`, creating missing named nodes along the way.
    pub fn make_path(&mut self, path: &str) -> Result<&mut Node, PathError> {
        Path::parse(path)?.materialize(self)
    }

    /// Create `path` if needed and set the value of its last node.
    pub fn set_path(
        &mut self,
        path: &str,
        value: impl Into<String>,
    ) -> Result<&mut Node, PathError> {
        let node = self.make_path(path)?;
        node.set_value(value);
        Ok(node)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn config_tree() -> Node {
        Node::new().with_child(
            Node::named("group")
                .with_child(Node::named("subgroup").with_child(Node::pair("field", "a")))
                .with_child(Node::named("subgroup").with_child(Node::pair("field", "b")))
                .with_child(Node::named("subgroup").with_child(Node::pair("field", "c")))
                .with_child(Node::pair("title", "hello world")),
        )
    }

    #[test]
    fn empty_path_is_self() {
        let tree = config_tree();
        assert_eq!(tree.get(""), Some(&tree));
        assert!(Path::parse("").expect("parse").is_root());
    }

    #[test]
    fn nth_named_selects_among_same_names() {
        let tree = config_tree();
        assert_eq!(tree.get_value("group.subgroup[2].field"), Some("c"));
        assert_eq!(tree.get_value("group.subgroup.field"), Some("a"));
        assert_eq!(tree.get_value("group.subgroup[0].field"), Some("a"));
    }

    #[test]
    fn positional_index_ignores_names() {
        let tree = config_tree();
        assert_eq!(tree.get_value("group.[3]"), Some("hello world"));
        assert_eq!(tree.get_value("[0].[3]"), Some("hello world"));
        assert_eq!(tree.get_value("group[0][3]"), Some("hello world"));
    }

    #[test]
    fn missing_paths_are_none() {
        let tree = config_tree();
        assert_eq!(tree.get("nope"), None);
        assert_eq!(tree.get("group.subgroup[9]"), None);
        assert_eq!(tree.get("group.[99]"), None);
    }

    #[test]
    fn malformed_paths_are_none_for_lookup() {
        let tree = config_tree();
        assert_eq!(tree.get("group..title"), None);
        assert_eq!(tree.get("group[x]"), None);
        assert_eq!(tree.get("group[1"), None);
    }

    #[test]
    fn quoted_names() {
        let tree = Node::new().with_child(Node::pair("a.b c", "v"));
        assert_eq!(tree.get_value("\"a.b c\""), Some("v"));
        assert_eq!(tree.get_value("'a.b c'"), Some("v"));
    }

    #[test]
    fn quoted_names_take_escapes() {
        let tree = Node::new()
            .with_child(Node::pair(r#"it's "x""#, "both"))
            .with_child(Node::pair(r"c:\dir", "slash"));
        assert_eq!(tree.get_value(r#"'it\'s "x"'"#), Some("both"));
        assert_eq!(tree.get_value(r#""it's \"x\"""#), Some("both"));
        assert_eq!(tree.get_value(r#""c:\dir""#), Some("slash"));
        assert_eq!(tree.get_value(r#""c:\\dir""#), Some("slash"));

        for name in [r#"it's "x""#, r"c:\dir", r"tail\", "\"", "'"] {
            let path = Path::from_selectors(vec![
                Selector::Name(name.to_string()),
                Selector::NthNamed {
                    name: name.to_string(),
                    index: 1,
                },
            ]);
            assert_eq!(Path::parse(&path.to_string()), Ok(path), "{}", name);
        }
    }

    #[test]
    fn parse_errors_are_precise() {
        assert_eq!(
            Path::parse("a..b"),
            Err(PathError::EmptyElement { offset: 2 })
        );
        assert_eq!(Path::parse("a."), Err(PathError::EmptyElement { offset: 2 }));
        assert_eq!(
            Path::parse("a[1"),
            Err(PathError::UnterminatedIndex { offset: 1 })
        );
        assert_eq!(
            Path::parse("a[-1]"),
            Err(PathError::InvalidIndex {
                text: "-1".to_string(),
                offset: 1
            })
        );
        assert_eq!(
            Path::parse("'open"),
            Err(PathError::UnterminatedQuote { offset: 0 })
        );
        assert_eq!(
            Path::parse("a;b"),
            Err(PathError::UnexpectedChar {
                found: ';',
                offset: 1
            })
        );
    }

    #[test]
    fn display_round_trips() {
        for text in ["group.subgroup[2].field", "a.[0]", "[1][2]", "\"x y\".z", "a[0][1]"] {
            let path = Path::parse(text).expect("parse");
            let again = Path::parse(&path.to_string()).expect("reparse");
            assert_eq!(path, again, "{}", text);
        }
    }

    #[test]
    fn make_path_creates_named_nodes() {
        let mut root = Node::new();
        root.make_path("server.http.port").expect("make");
        root.set_path("server.http.port", "8080").expect("set");
        root.set_path("server.http.host", "localhost").expect("set");

        assert_eq!(root.get_value("server.http.port"), Some("8080"));
        assert_eq!(root.get_value("server.http.host"), Some("localhost"));
        assert_eq!(root.get("server").map(Node::len), Some(1));
    }

    #[test]
    fn make_path_never_creates_indices() {
        let mut root = Node::new();
        let err = root.make_path("list[2].x").expect_err("index must not be created");
        assert_eq!(
            err,
            PathError::NotFound {
                path: "list[2]".to_string()
            }
        );
    }

    #[test]
    fn get_mut_allows_edits() {
        let mut tree = config_tree();
        if let Some(title) = tree.get_mut("group.title") {
            title.set_value("bye");
        }
        assert_eq!(tree.get_value("group.title"), Some("bye"));
    }
}
