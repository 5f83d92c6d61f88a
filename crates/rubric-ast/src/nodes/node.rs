// Copyright (c) rubric contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;

use super::node_type::NodeType;
use crate::range::SourceRange;

/// One child slot of a [`Node`].
///
/// Slots are positional. An optional grammar part that is missing is an
/// explicit [`Child::Nil`], so slot indices are stable for every node of a
/// given type.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Node(Node),
    /// A name: method name, variable name, symbol value.
    Symbol(String),
    /// A string value, also used for numeric literals that do not fit
    /// [`Child::Integer`] / [`Child::Float`] (bignums, rationals, complex).
    Str(String),
    Integer(i64),
    Float(f64),
    Nil,
}

impl Child {
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Child::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Child::Symbol(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Child::Nil)
    }
}

impl From<Node> for Child {
    fn from(node: Node) -> Self {
        Child::Node(node)
    }
}

impl From<Option<Node>> for Child {
    fn from(node: Option<Node>) -> Self {
        node.map_or(Child::Nil, Child::Node)
    }
}

/// An immutable syntax tree element.
///
/// A node exclusively owns its children; there are no parent links.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    node_type: NodeType,
    children: Vec<Child>,
    range: SourceRange,
}

impl Node {
    pub fn new(node_type: NodeType, children: Vec<Child>, range: SourceRange) -> Self {
        Node {
            node_type,
            children,
            range,
        }
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn is(&self, node_type: NodeType) -> bool {
        self.node_type == node_type
    }

    pub fn children(&self) -> &[Child] {
        &self.children
    }

    pub fn child(&self, index: usize) -> Option<&Child> {
        self.children.get(index)
    }

    /// The child at `index` if it is a node (not a literal or an absent slot).
    pub fn child_node(&self, index: usize) -> Option<&Node> {
        self.children.get(index).and_then(Child::as_node)
    }

    /// The child at `index` if it is a name.
    pub fn symbol(&self, index: usize) -> Option<&str> {
        self.children.get(index).and_then(Child::as_symbol)
    }

    /// Children that are nodes, in slot order.
    pub fn each_child_node(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter_map(Child::as_node)
    }

    pub fn range(&self) -> SourceRange {
        self.range
    }

    pub fn first_line(&self) -> usize {
        self.range.line
    }

    /// The source text this node was parsed from.
    pub fn source<'a>(&self, source: &'a str) -> &'a str {
        self.range.source(source)
    }

    /// Take the node apart; used by tree rewriting passes.
    pub fn into_parts(self) -> (NodeType, Vec<Child>, SourceRange) {
        (self.node_type, self.children, self.range)
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_size(&self) -> usize {
        1 + self.each_child_node().map(Node::subtree_size).sum::<usize>()
    }

    // ------------------------------------------------------------------
    // Loops
    // ------------------------------------------------------------------

    /// The keyword that introduces this loop, for every loop form.
    pub fn loop_keyword(&self) -> Option<&'static str> {
        match self.node_type {
            NodeType::While | NodeType::WhilePost => Some("while"),
            NodeType::Until | NodeType::UntilPost => Some("until"),
            NodeType::For => Some("for"),
            _ => None,
        }
    }

    /// `until` for a `while` loop and the reverse.
    pub fn inverse_keyword(&self) -> Option<&'static str> {
        match self.loop_keyword()? {
            "while" => Some("until"),
            "until" => Some("while"),
            _ => None,
        }
    }

    pub fn is_loop_keyword(&self) -> bool {
        self.loop_keyword().is_some()
    }

    /// `begin ... end while cond`: the body runs before the first check.
    pub fn is_post_condition_loop(&self) -> bool {
        matches!(self.node_type, NodeType::WhilePost | NodeType::UntilPost)
    }

    /// Whether a keyword loop separates its header from the body with `do`.
    ///
    /// Modifier and post-condition forms never have one.
    pub fn has_do(&self, source: &str) -> bool {
        let header = match self.node_type {
            NodeType::While | NodeType::Until => 0,
            NodeType::For => 1,
            _ => return false,
        };
        let Some(header) = self.child_node(header) else {
            return false;
        };
        let body = self.child_node(self.children.len() - 1);
        if body.is_some_and(|b| b.range.begin_pos < header.range.end_pos) {
            return false;
        }
        let end = body.map_or(self.range.end_pos, |b| b.range.begin_pos);
        let gap = source
            .get(header.range.end_pos..end)
            .unwrap_or_default()
            .trim_start();
        gap.strip_prefix("do")
            .is_some_and(|rest| !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_'))
    }
}

/// S-expression form: `(send nil :puts (int 1))`.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.node_type)?;
        for child in &self.children {
            f.write_str(" ")?;
            match child {
                Child::Node(node) => write!(f, "{}", node)?,
                Child::Symbol(name) => write!(f, ":{}", name)?,
                Child::Str(value) => write!(f, "{:?}", value)?,
                Child::Integer(value) => write!(f, "{}", value)?,
                Child::Float(value) => write!(f, "{:?}", value)?,
                Child::Nil => f.write_str("nil")?,
            }
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(b: usize, e: usize) -> SourceRange {
        SourceRange::new(b, e, 1, b)
    }

    fn call() -> Node {
        let receiver = Node::new(NodeType::Lvar, vec![Child::Symbol("a".into())], r(0, 1));
        let arg = Node::new(NodeType::Int, vec![Child::Integer(1)], r(4, 5));
        Node::new(
            NodeType::Send,
            vec![receiver.into(), Child::Symbol("b".into()), arg.into()],
            r(0, 6),
        )
    }

    #[test]
    fn accessors() {
        let node = call();
        assert!(node.is(NodeType::Send));
        assert_eq!(node.symbol(1), Some("b"));
        assert_eq!(node.child_node(0).map(Node::node_type), Some(NodeType::Lvar));
        assert!(node.child_node(1).is_none());
        assert!(node.child(7).is_none());
        assert_eq!(node.each_child_node().count(), 2);
        assert_eq!(node.subtree_size(), 3);
        assert_eq!(node.source("a.b(1)"), "a.b(1)");
    }

    #[test]
    fn absent_slot_is_explicit() {
        let node = Node::new(
            NodeType::If,
            vec![call().into(), Child::Nil, Child::Nil],
            r(0, 10),
        );
        assert_eq!(node.children().len(), 3);
        assert!(node.children()[2].is_nil());
        assert_eq!(Child::from(None::<Node>), Child::Nil);
    }

    fn loop_node(node_type: NodeType, body_begin: usize) -> Node {
        let cond = Node::new(NodeType::Lvar, vec![Child::Symbol("foo".into())], r(6, 9));
        let body = Node::new(NodeType::Lvar, vec![Child::Symbol("bar".into())], r(body_begin, body_begin + 3));
        Node::new(node_type, vec![cond.into(), body.into()], r(0, 22))
    }

    #[test]
    fn loop_keywords() {
        let until = loop_node(NodeType::Until, 14);
        assert_eq!(until.loop_keyword(), Some("until"));
        assert_eq!(until.inverse_keyword(), Some("while"));
        assert!(until.is_loop_keyword());
        assert!(!until.is_post_condition_loop());

        let post = loop_node(NodeType::WhilePost, 14);
        assert_eq!(post.loop_keyword(), Some("while"));
        assert_eq!(post.inverse_keyword(), Some("until"));
        assert!(post.is_post_condition_loop());

        assert!(!call().is_loop_keyword());
        assert_eq!(call().inverse_keyword(), None);
    }

    #[test]
    fn do_between_condition_and_body() {
        assert!(loop_node(NodeType::Until, 14).has_do("until foo do; bar; end"));
        assert!(!loop_node(NodeType::Until, 11).has_do("until foo; bar; end"));
        assert!(!loop_node(NodeType::Until, 14).has_do("until foo done bar; end"));
        assert!(!loop_node(NodeType::UntilPost, 14).has_do("until foo do; bar; end"));
        assert!(!call().has_do("a.b(1)"));
    }

    #[test]
    fn sexp_display() {
        assert_eq!(call().to_string(), "(send (lvar :a) :b (int 1))");
        let s = Node::new(NodeType::Str, vec![Child::Str("a\"b".into())], r(0, 6));
        assert_eq!(s.to_string(), "(str \"a\\\"b\")");
        let f = Node::new(NodeType::Float, vec![Child::Float(1.0)], r(0, 3));
        assert_eq!(f.to_string(), "(float 1.0)");
    }
}
