// Copyright (c) rubric contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Parse-time warnings that need the finished tree.

use std::collections::HashSet;

use rubric_ast::{walk, walk_children, Child, Diagnostic, Node, NodeType, Visitor};

pub(crate) fn check(ast: &Node) -> Vec<Diagnostic> {
    let mut warnings = Warnings::default();
    walk(&mut warnings, Some(ast));
    warnings.found
}

#[derive(Default)]
struct Warnings {
    found: Vec<Diagnostic>,
}

fn is_literal(node: &Node) -> bool {
    matches!(
        node.node_type(),
        NodeType::Int
            | NodeType::Float
            | NodeType::Rational
            | NodeType::Complex
            | NodeType::Str
            | NodeType::Sym
            | NodeType::Nil
            | NodeType::True
            | NodeType::False
    )
}

fn is_assignment(node: &Node) -> bool {
    matches!(
        node.node_type(),
        NodeType::Lvasgn | NodeType::Ivasgn | NodeType::Cvasgn | NodeType::Gvasgn | NodeType::Casgn
    )
}

impl Warnings {
    fn check_condition(&mut self, node: &Node) {
        let Some(mut cond) = node.child_node(0) else {
            return;
        };
        while cond.is(NodeType::Begin) && cond.children().len() == 1 {
            match cond.child_node(0) {
                Some(inner) => cond = inner,
                None => break,
            }
        }
        let assigns_literal = is_assignment(cond)
            && cond
                .children()
                .last()
                .and_then(Child::as_node)
                .is_some_and(is_literal);
        if assigns_literal {
            self.found.push(Diagnostic::warning(
                "found `= literal' in conditional, should be ==",
                cond.range(),
            ));
        }
    }

    fn check_keys(&mut self, node: &Node) {
        let mut seen = HashSet::new();
        for pair in node.each_child_node().filter(|n| n.is(NodeType::Pair)) {
            let Some(key) = pair.child_node(0).filter(|k| is_literal(k)) else {
                continue;
            };
            if !seen.insert(key.to_string()) {
                self.found
                    .push(Diagnostic::warning("duplicated key in hash literal", key.range()));
            }
        }
    }
}

impl Visitor for Warnings {
    fn on_if(&mut self, node: &Node) {
        self.check_condition(node);
        walk_children(self, node);
    }

    fn on_while(&mut self, node: &Node) {
        self.check_condition(node);
        walk_children(self, node);
    }

    fn on_until(&mut self, node: &Node) {
        self.check_condition(node);
        walk_children(self, node);
    }

    fn on_while_post(&mut self, node: &Node) {
        self.check_condition(node);
        walk_children(self, node);
    }

    fn on_until_post(&mut self, node: &Node) {
        self.check_condition(node);
        walk_children(self, node);
    }

    fn on_hash(&mut self, node: &Node) {
        self.check_keys(node);
        walk_children(self, node);
    }

    fn on_kwargs(&mut self, node: &Node) {
        self.check_keys(node);
        walk_children(self, node);
    }
}
