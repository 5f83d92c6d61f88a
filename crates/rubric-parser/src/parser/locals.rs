// Copyright (c) rubric contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Local variable resolution.
//!
//! The grammar emits every bare identifier as a provisional `lvar`. This
//! pass walks the tree in source order with a stack of scopes and turns
//! each provisional `lvar` that no assignment, parameter or pattern binding
//! has declared yet into a receiver-less `send`.

use std::collections::HashSet;

use rubric_ast::{Child, Node, NodeType};

use super::builder::named_captures;

pub(crate) fn resolve(root: Node) -> Node {
    let mut scopes = Scopes {
        stack: vec![Scope::fresh()],
    };
    scopes.rewrite(root)
}

struct Scope {
    names: HashSet<String>,
    /// Blocks see the names of the scope they appear in.
    inherit: bool,
}

impl Scope {
    fn fresh() -> Self {
        Scope {
            names: HashSet::new(),
            inherit: false,
        }
    }

    fn nested() -> Self {
        Scope {
            names: HashSet::new(),
            inherit: true,
        }
    }
}

struct Scopes {
    stack: Vec<Scope>,
}

impl Scopes {
    fn is_declared(&self, name: &str) -> bool {
        for scope in self.stack.iter().rev() {
            if scope.names.contains(name) {
                return true;
            }
            if !scope.inherit {
                return false;
            }
        }
        false
    }

    fn declare(&mut self, name: &str) {
        if let Some(scope) = self.stack.last_mut() {
            scope.names.insert(name.to_string());
        }
    }

    fn rewrite(&mut self, node: Node) -> Node {
        let (node_type, children, range) = node.into_parts();
        let children = match node_type {
            NodeType::Lvar => {
                let declared = children
                    .first()
                    .and_then(Child::as_symbol)
                    .is_some_and(|name| self.is_declared(name));
                if !declared {
                    let mut call = vec![Child::Nil];
                    call.extend(children);
                    return Node::new(NodeType::Send, call, range);
                }
                children
            }
            NodeType::Lvasgn
            | NodeType::Arg
            | NodeType::Optarg
            | NodeType::Restarg
            | NodeType::Kwarg
            | NodeType::Kwoptarg
            | NodeType::Kwrestarg
            | NodeType::Blockarg
            | NodeType::Shadowarg
            | NodeType::MatchVar => {
                if let Some(name) = children.first().and_then(Child::as_symbol) {
                    self.declare(name);
                }
                self.rewrite_all(children)
            }
            NodeType::Def => self.scoped(Scope::fresh(), children, 0),
            NodeType::Defs => self.scoped(Scope::fresh(), children, 1),
            NodeType::Class => self.scoped(Scope::fresh(), children, 2),
            NodeType::Module | NodeType::Sclass => self.scoped(Scope::fresh(), children, 1),
            NodeType::Block => self.scoped(Scope::nested(), children, 1),
            NodeType::Numblock => {
                let count = match children.get(1) {
                    Some(Child::Integer(n)) => *n,
                    _ => 0,
                };
                let mut scope = Scope::nested();
                scope.names.extend((1..=count).map(|i| format!("_{}", i)));
                self.scoped(scope, children, 1)
            }
            NodeType::MatchWithLvasgn => {
                let children = self.rewrite_all(children);
                if let Some(regexp) = children.first().and_then(Child::as_node) {
                    for name in named_captures(regexp) {
                        self.declare(&name);
                    }
                }
                children
            }
            _ => self.rewrite_all(children),
        };
        Node::new(node_type, children, range)
    }

    fn rewrite_all(&mut self, children: Vec<Child>) -> Vec<Child> {
        children.into_iter().map(|child| self.rewrite_child(child)).collect()
    }

    fn rewrite_child(&mut self, child: Child) -> Child {
        match child {
            Child::Node(node) => Child::Node(self.rewrite(node)),
            other => other,
        }
    }

    /// Rewrite the first `outer` children in the current scope and the rest
    /// inside `scope`.
    fn scoped(&mut self, scope: Scope, children: Vec<Child>, outer: usize) -> Vec<Child> {
        let mut out = Vec::with_capacity(children.len());
        let mut children = children.into_iter();
        for child in children.by_ref().take(outer) {
            out.push(self.rewrite_child(child));
        }
        self.stack.push(scope);
        for child in children {
            out.push(self.rewrite_child(child));
        }
        self.stack.pop();
        out
    }
}

#[cfg(test)]
mod tests {
    use rubric_ast::SourceRange;

    use super::*;

    fn r() -> SourceRange {
        SourceRange::default()
    }

    fn lvar(name: &str) -> Node {
        Node::new(NodeType::Lvar, vec![Child::Symbol(name.into())], r())
    }

    fn lvasgn(name: &str) -> Node {
        let one = Node::new(NodeType::Int, vec![Child::Integer(1)], r());
        Node::new(NodeType::Lvasgn, vec![Child::Symbol(name.into()), one.into()], r())
    }

    fn begin(items: Vec<Node>) -> Node {
        Node::new(NodeType::Begin, items.into_iter().map(Child::from).collect(), r())
    }

    #[test]
    fn reference_before_assignment_is_a_call() {
        let tree = resolve(begin(vec![lvar("a"), lvasgn("a"), lvar("a")]));
        assert_eq!(tree.to_string(), "(begin (send nil :a) (lvasgn :a (int 1)) (lvar :a))");
    }

    #[test]
    fn method_bodies_do_not_see_outer_locals() {
        let args = Node::new(NodeType::Args, vec![], r());
        let def = Node::new(
            NodeType::Def,
            vec![Child::Symbol("m".into()), args.into(), lvar("a").into()],
            r(),
        );
        let tree = resolve(begin(vec![lvasgn("a"), def]));
        assert_eq!(
            tree.to_string(),
            "(begin (lvasgn :a (int 1)) (def :m (args) (send nil :a)))"
        );
    }

    #[test]
    fn blocks_see_outer_locals_but_do_not_leak() {
        let call = Node::new(NodeType::Send, vec![Child::Nil, Child::Symbol("each".into())], r());
        let args = Node::new(NodeType::Args, vec![], r());
        let body = begin(vec![lvar("a"), lvasgn("b")]);
        let block = Node::new(NodeType::Block, vec![call.into(), args.into(), body.into()], r());
        let tree = resolve(begin(vec![lvasgn("a"), block, lvar("b")]));
        assert_eq!(
            tree.to_string(),
            "(begin (lvasgn :a (int 1)) \
             (block (send nil :each) (args) (begin (lvar :a) (lvasgn :b (int 1)))) \
             (send nil :b))"
        );
    }
}
