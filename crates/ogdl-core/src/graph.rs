//! # Graph Model
//!
//! The in-memory OGDL tree.
//!
//! A [`Node`] is a name/value pair plus an ordered list of children that it
//! owns exclusively. The root is owned by the caller. Ownership makes cycles
//! impossible; path lookups (see [`crate::path`]) only ever borrow.
//!
//! All traversals are iterative, so walking a deep tree cannot exhaust the
//! call stack.

use serde::{Deserialize, Serialize};

// =============================================================================
// NODE
// =============================================================================

/// A node of an OGDL tree.
///
/// Either the name or the value may be empty. A node with children and no
/// value acts as a *group*.
///
/// Equality is structural: same name, same value, same children in the
/// same order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    value: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<Node>,
}

impl Node {
    /// Create an empty node (no name, no value, no children).
    ///
    /// This is also the shape of a parsed document's root.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node with a name and no value.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create an unnamed node carrying only a value.
    #[must_use]
    pub fn scalar(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    /// Create a node with both a name and a value.
    #[must_use]
    pub fn pair(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            children: Vec::new(),
        }
    }

    /// Builder-style: append a child and return `self`.
    #[must_use]
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Builder-style: append several children and return `self`.
    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Direct children in order.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Child at `index`, if any.
    #[must_use]
    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    /// First child whose name equals `name`.
    #[must_use]
    pub fn child_named(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    /// The `nth` (0-based) child whose name equals `name`.
    #[must_use]
    pub fn nth_named(&self, name: &str, nth: usize) -> Option<&Node> {
        self.children.iter().filter(|c| c.name == name).nth(nth)
    }

    /// Number of direct children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// True when the node has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// True when the node has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// True when the node holds children and no value of its own.
    #[must_use]
    pub fn is_group(&self) -> bool {
        !self.children.is_empty() && self.value.is_empty()
    }

    // -------------------------------------------------------------------------
    // Mutation (requires the owning `&mut` reference)
    // -------------------------------------------------------------------------

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Append a child and return a mutable reference to it.
    pub fn push(&mut self, child: Node) -> &mut Node {
        let index = self.children.len();
        self.children.push(child);
        &mut self.children[index]
    }

    /// Insert a child at `index`, shifting later children right.
    ///
    /// An index past the end appends.
    pub fn insert(&mut self, index: usize, child: Node) {
        let index = index.min(self.children.len());
        self.children.insert(index, child);
    }

    /// Remove and return the child at `index`.
    pub fn remove(&mut self, index: usize) -> Option<Node> {
        (index < self.children.len()).then(|| self.children.remove(index))
    }

    /// Mutable access to a child by index.
    pub fn child_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.children.get_mut(index)
    }

    /// Mutable access to the first child with the given name.
    pub fn child_named_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Mutable access to the `nth` child with the given name.
    pub fn nth_named_mut(&mut self, name: &str, nth: usize) -> Option<&mut Node> {
        self.children
            .iter_mut()
            .filter(|c| c.name == name)
            .nth(nth)
    }

    /// Mutable access to the children list.
    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    /// Drop all children.
    pub fn clear(&mut self) {
        self.children.clear();
    }

    /// Take the children out, leaving the node a leaf.
    pub fn take_children(&mut self) -> Vec<Node> {
        std::mem::take(&mut self.children)
    }

    // -------------------------------------------------------------------------
    // Traversal
    // -------------------------------------------------------------------------

    /// Ordered iteration over direct children.
    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.children.iter()
    }

    /// Depth-first pre-order iteration over this node and all descendants.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Like [`descendants`](Self::descendants), also yielding each node's
    /// depth relative to `self` (which is depth 0).
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![(0, self)],
        }
    }

    /// Total number of nodes in this subtree, `self` included.
    #[must_use]
    pub fn count(&self) -> usize {
        self.descendants().count()
    }

    /// Height of the subtree: 0 for a leaf.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.walk().map(|(depth, _)| depth).max().unwrap_or(0)
    }
}

impl<'a> IntoIterator for &'a Node {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.children.iter()
    }
}

// =============================================================================
// ITERATORS
// =============================================================================

/// Pre-order iterator returned by [`Node::descendants`].
#[derive(Debug, Clone)]
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Pre-order iterator with depths, returned by [`Node::walk`].
#[derive(Debug, Clone)]
pub struct Walk<'a> {
    stack: Vec<(usize, &'a Node)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|child| (depth + 1, child)));
        Some((depth, node))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        Node::new()
            .with_child(
                Node::named("a")
                    .with_child(Node::pair("x", "1"))
                    .with_child(Node::pair("y", "2")),
            )
            .with_child(Node::named("b").with_child(Node::scalar("z")))
    }

    #[test]
    fn constructors_set_fields() {
        let pair = Node::pair("k", "v");
        assert_eq!(pair.name(), "k");
        assert_eq!(pair.value(), "v");
        assert!(pair.is_leaf());

        let scalar = Node::scalar("v");
        assert_eq!(scalar.name(), "");
        assert_eq!(scalar.value(), "v");
    }

    #[test]
    fn descendants_are_pre_order() {
        let tree = sample();
        let names: Vec<&str> = tree.descendants().map(|n| n.name()).collect();
        assert_eq!(names, vec!["", "a", "x", "y", "b", ""]);
    }

    #[test]
    fn walk_reports_depths() {
        let tree = sample();
        let depths: Vec<usize> = tree.walk().map(|(d, _)| d).collect();
        assert_eq!(depths, vec![0, 1, 2, 2, 1, 2]);
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.count(), 6);
    }

    #[test]
    fn iter_visits_direct_children_only() {
        let tree = sample();
        let names: Vec<&str> = tree.iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!((&tree).into_iter().count(), 2);
    }

    #[test]
    fn push_returns_new_child() {
        let mut root = Node::new();
        root.push(Node::named("a")).push(Node::pair("b", "1"));
        assert_eq!(root.child(0).and_then(|a| a.child(0)), Some(&Node::pair("b", "1")));
    }

    #[test]
    fn insert_and_remove() {
        let mut root = Node::new()
            .with_child(Node::named("a"))
            .with_child(Node::named("c"));
        root.insert(1, Node::named("b"));
        root.insert(99, Node::named("d"));

        let names: Vec<&str> = root.iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);

        assert_eq!(root.remove(0), Some(Node::named("a")));
        assert_eq!(root.remove(10), None);
        assert_eq!(root.len(), 3);
    }

    #[test]
    fn nth_named_counts_same_name_only() {
        let root = Node::new()
            .with_child(Node::pair("x", "1"))
            .with_child(Node::pair("y", "2"))
            .with_child(Node::pair("x", "3"));
        assert_eq!(root.nth_named("x", 1).map(Node::value), Some("3"));
        assert_eq!(root.nth_named("x", 2), None);
        assert_eq!(root.child_named("y").map(Node::value), Some("2"));
    }

    #[test]
    fn group_detection() {
        let group = Node::named("g").with_child(Node::named("c"));
        assert!(group.is_group());
        assert!(!Node::named("g").is_group());
        assert!(!Node::pair("g", "v").with_child(Node::new()).is_group());
    }

    #[test]
    fn structural_equality_respects_order() {
        let ab = Node::new()
            .with_child(Node::named("a"))
            .with_child(Node::named("b"));
        let ba = Node::new()
            .with_child(Node::named("b"))
            .with_child(Node::named("a"));
        assert_ne!(ab, ba);
        assert_eq!(ab, ab.clone());
    }

    #[test]
    fn deep_tree_walks_without_recursion() {
        let mut root = Node::new();
        {
            let mut cursor = &mut root;
            for _ in 0..10_000 {
                cursor = cursor.push(Node::named("n"));
            }
        }
        assert_eq!(root.count(), 10_001);
        assert_eq!(root.depth(), 10_000);
        // Dismantle iteratively so the recursive drop glue stays shallow.
        let mut pending = root.take_children();
        while let Some(mut node) = pending.pop() {
            pending.extend(node.take_children());
        }
    }
}
