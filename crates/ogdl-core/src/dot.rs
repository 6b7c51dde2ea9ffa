//! # Dot Export
//!
//! Graphviz rendering of a tree: one vertex per node, labelled with its
//! name and value, and one edge from every parent to each child.

use crate::graph::Node;

/// Render `root` as a Graphviz `digraph`.
///
/// Vertices are numbered in pre-order, so the output is deterministic.
#[must_use]
pub fn to_dot(root: &Node) -> String {
    let mut out = String::from("digraph ogdl {\n  node [shape=box];\n");
    let mut next_id = 0usize;
    let mut stack: Vec<(Option<usize>, &Node)> = vec![(None, root)];

    while let Some((parent, node)) = stack.pop() {
        let id = next_id;
        next_id += 1;
        out.push_str(&format!("  n{} [label=\"{}\"];\n", id, escape(&label(node))));
        if let Some(parent) = parent {
            out.push_str(&format!("  n{} -> n{};\n", parent, id));
        }
        stack.extend(node.children().iter().rev().map(|child| (Some(id), child)));
    }

    out.push_str("}\n");
    out
}

fn label(node: &Node) -> String {
    match (node.name(), node.value()) {
        ("", "") => String::new(),
        (name, "") => name.to_string(),
        ("", value) => value.to_string(),
        (name, value) => format!("{} {}", name, value),
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertices_and_edges_in_pre_order() {
        let root = Node::new()
            .with_child(Node::named("a").with_child(Node::pair("x", "1")))
            .with_child(Node::scalar("b"));
        assert_eq!(
            to_dot(&root),
            "digraph ogdl {\n  node [shape=box];\n  n0 [label=\"\"];\n  n1 [label=\"a\"];\n  n0 -> n1;\n  n2 [label=\"x 1\"];\n  n1 -> n2;\n  n3 [label=\"b\"];\n  n0 -> n3;\n}\n"
        );
    }

    #[test]
    fn labels_are_escaped() {
        let root = Node::pair("say", "\"hi\"\nthere");
        let dot = to_dot(&root);
        assert!(dot.contains(r#"label="say \"hi\"\nthere""#));
    }
}
