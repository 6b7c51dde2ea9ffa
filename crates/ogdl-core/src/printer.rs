//! # Printer
//!
//! Renders a [`Node`] tree as OGDL text.
//!
//! Output is canonical: one node per line, children indented one level
//! deeper, names and values quoted only when a bare word would not read
//! back the same. Parsing printed text yields the tree that was printed.
//!
//! A node with neither name nor value is treated as a document root: only
//! its children are printed. Any other node is printed as the first line,
//! followed by its subtree.
//!
//! Children named `0`, `1`, … whose entries fit on one line each are
//! printed as a table (`name |` followed by one row per line).

use crate::config::PrintOptions;
use crate::graph::Node;
use crate::primitives::{
    BLOCK_MARKER, BYTE_ORDER_MARK, COMMENT, GROUP_CLOSE, GROUP_OPEN, SEPARATOR, TABLE_MARKER,
};
use std::fmt;

/// Print with default options.
#[must_use]
pub fn to_text(root: &Node) -> String {
    print_text(root, &PrintOptions::default())
}

/// Print with explicit layout options.
#[must_use]
pub fn print_text(root: &Node, options: &PrintOptions) -> String {
    let indent = options.indent.max(1);
    let mut out = String::new();
    let mut stack: Vec<(usize, &Node)> = if is_anonymous(root) {
        root.children().iter().rev().map(|child| (0, child)).collect()
    } else {
        vec![(0, root)]
    };

    while let Some((level, node)) = stack.pop() {
        if options.max_depth.is_some_and(|max| level >= max) {
            continue;
        }
        out.extend(std::iter::repeat_n(' ', level * indent));

        if options.compact_scalars && is_compact(node) {
            push_compact(&mut out, node);
            out.push('\n');
            continue;
        }

        push_header(&mut out, node);
        let rows_visible = options.max_depth.is_none_or(|max| level + 2 < max);
        if options.compact_scalars && rows_visible && is_table(node) {
            out.push(' ');
            out.push(TABLE_MARKER);
            out.push('\n');
            for row in node {
                out.extend(std::iter::repeat_n(' ', (level + 1) * indent));
                for (i, entry) in row.iter().enumerate() {
                    if i > 0 {
                        out.push(SEPARATOR);
                        out.push(' ');
                    }
                    push_inline(&mut out, entry);
                }
                out.push('\n');
            }
            continue;
        }
        out.push('\n');
        stack.extend(node.children().iter().rev().map(|child| (level + 1, child)));
    }
    out
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_text(self))
    }
}

fn is_anonymous(node: &Node) -> bool {
    node.name().is_empty() && node.value().is_empty()
}

/// An implicit group of three or more bare scalars, printable as `a b c`.
fn is_compact(node: &Node) -> bool {
    is_anonymous(node)
        && node.len() >= 3
        && node
            .iter()
            .all(|c| c.name().is_empty() && c.is_leaf() && is_bare(c.value()))
}

/// Rows `0`, `1`, … each holding entries that print on one line.
fn is_table(node: &Node) -> bool {
    !node.is_empty()
        && node.iter().enumerate().all(|(i, row)| {
            row.name() == i.to_string()
                && row.value().is_empty()
                && !row.is_empty()
                && row.iter().all(|entry| entry.iter().all(Node::is_leaf))
        })
}

/// Whether `s` reads back as a single word.
pub fn is_bare(s: &str) -> bool {
    let Some(first) = s.chars().next() else {
        return false;
    };
    // A lone `|` ending a line is a table marker; a leading BOM is dropped.
    s != "|"
        && !matches!(first, '"' | '\'' | COMMENT | BLOCK_MARKER | BYTE_ORDER_MARK)
        && !s.chars().any(|c| {
            c.is_whitespace() || c.is_control() || matches!(c, GROUP_OPEN | GROUP_CLOSE | SEPARATOR)
        })
}

fn push_compact(out: &mut String, node: &Node) {
    let values: Vec<&str> = node.iter().map(Node::value).collect();
    out.push_str(&values.join(" "));
}

/// Name and value of `node`.
fn push_header(out: &mut String, node: &Node) {
    push_scalar(out, node.name());
    if !node.value().is_empty() {
        out.push(' ');
        push_scalar(out, node.value());
    }
}

/// `node` as one table entry: a header, an inline group of leaves, or both.
fn push_inline(out: &mut String, node: &Node) {
    if is_compact(node) {
        push_compact(out, node);
        return;
    }
    let header = !is_anonymous(node) || node.is_leaf();
    if header {
        push_header(out, node);
    }
    if node.is_leaf() {
        return;
    }
    if header {
        out.push(' ');
    }
    out.push(GROUP_OPEN);
    for (i, child) in node.iter().enumerate() {
        if i > 0 {
            out.push(SEPARATOR);
            out.push(' ');
        }
        push_header(out, child);
    }
    out.push(GROUP_CLOSE);
}

/// Append `s` as a bare word or a double-quoted string.
fn push_scalar(out: &mut String, s: &str) {
    if is_bare(s) {
        out.push_str(s);
        return;
    }
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c if c.is_control() => out.push_str(&format!("\\u{{{:x}}}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}
