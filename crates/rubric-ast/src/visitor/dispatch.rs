// Copyright (c) rubric contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Walk functions for AST traversal.
//!
//! The traversal is depth-first and pre-order: a node's visitor method runs
//! before any of its children are dispatched. Children are visited in slot
//! order, and only the slots the node type's [`Shape`] names are visited.
//! Every descent goes back through [`dispatch`], so each descendant is an
//! override point as well.

use super::traits::{dispatch, Visitor};
use crate::nodes::{BespokeRule, Child, Node, Shape};

/// Walk an optional node. `None` is a no-op.
pub fn walk<V: Visitor>(visitor: &mut V, node: Option<&Node>) {
    if let Some(node) = node {
        dispatch(visitor, node);
    }
}

/// Walk each root in order.
pub fn walk_all<'a, V: Visitor>(visitor: &mut V, nodes: impl IntoIterator<Item = &'a Node>) {
    for node in nodes {
        dispatch(visitor, node);
    }
}

/// Apply the default traversal of `node`'s type to its children.
///
/// This is the body of every default `on_*` method.
pub fn walk_children<V: Visitor>(visitor: &mut V, node: &Node) {
    match node.node_type().shape() {
        Shape::Leaf => {}
        Shape::SingleOptional => walk_slot(visitor, node, 0),
        Shape::SecondSlotOnly => walk_slot(visitor, node, 1),
        Shape::AllChildren | Shape::NodeChildren => walk_node_children(visitor, node),
        Shape::Bespoke(rule) => walk_bespoke(visitor, node, rule),
    }
}

fn walk_slot<V: Visitor>(visitor: &mut V, node: &Node, index: usize) {
    if let Some(child) = node.child_node(index) {
        dispatch(visitor, child);
    }
}

fn walk_node_children<V: Visitor>(visitor: &mut V, node: &Node) {
    for child in node.each_child_node() {
        dispatch(visitor, child);
    }
}

/// Argument lists of definitions and blocks go straight to `on_args`, so a
/// visitor tracking parameter bindings sees them even when empty.
fn walk_args_slot<V: Visitor>(visitor: &mut V, node: &Node, index: usize) {
    if let Some(args) = node.child_node(index) {
        visitor.on_args(args);
    }
}

fn walk_bespoke<V: Visitor>(visitor: &mut V, node: &Node, rule: BespokeRule) {
    match rule {
        BespokeRule::ConstReference => walk_slot(visitor, node, 0),
        BespokeRule::ConstAssignment => {
            walk_slot(visitor, node, 0);
            walk_slot(visitor, node, 2);
        }
        BespokeRule::ClassDefinition | BespokeRule::Conditional => {
            walk_slot(visitor, node, 0);
            walk_slot(visitor, node, 1);
            walk_slot(visitor, node, 2);
        }
        BespokeRule::MethodDefinition => {
            walk_args_slot(visitor, node, 1);
            walk_slot(visitor, node, 2);
        }
        BespokeRule::SingletonMethodDefinition => {
            walk_slot(visitor, node, 0);
            walk_args_slot(visitor, node, 2);
            walk_slot(visitor, node, 3);
        }
        BespokeRule::Call => {
            for (index, child) in node.children().iter().enumerate() {
                if index == 1 {
                    continue;
                }
                if let Child::Node(child) = child {
                    dispatch(visitor, child);
                }
            }
        }
        BespokeRule::CompoundAssignment | BespokeRule::NumberedBlock => {
            walk_slot(visitor, node, 0);
            walk_slot(visitor, node, 2);
        }
        BespokeRule::Loop => {
            walk_slot(visitor, node, 0);
            walk_slot(visitor, node, 1);
        }
        BespokeRule::Block => {
            walk_slot(visitor, node, 0);
            walk_args_slot(visitor, node, 1);
            walk_slot(visitor, node, 2);
        }
        BespokeRule::BranchDispatch => walk_node_children(visitor, node),
    }
}
