// Copyright (c) rubric contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The [`Visitor`] trait: one override point per node type.

use super::dispatch::walk_children;
use crate::nodes::node_type::for_each_node_type;
use crate::nodes::{Node, NodeType};

/// Macro to generate the visitor trait and its dispatcher.
///
/// Every `on_*` method defaults to [`walk_children`], which applies the
/// node type's [`Shape`](crate::Shape). The dispatcher maps a node's tag to
/// the matching method with an exhaustive `match`.
macro_rules! visitor_methods {
    ($($variant:ident => $tag:literal, $method:ident;)*) => {
        paste::paste! {
            /// Per-tag callbacks for a depth-first walk of a [`Node`] tree.
            ///
            /// Override the methods for the tags you care about. The default
            /// body of every method recurses into the node's children, so an
            /// override that wants descendants visited must call
            /// [`walk_children`] itself; an override that does not stops the
            /// walk at that subtree.
            ///
            /// # Example
            ///
            /// ```
            /// use rubric_ast::{walk, walk_children, Node, Visitor};
            ///
            /// #[derive(Default)]
            /// struct SendCounter(usize);
            ///
            /// impl Visitor for SendCounter {
            ///     fn on_send(&mut self, node: &Node) {
            ///         self.0 += 1;
            ///         walk_children(self, node);
            ///     }
            /// }
            ///
            /// fn count_sends(ast: Option<&Node>) -> usize {
            ///     let mut counter = SendCounter::default();
            ///     walk(&mut counter, ast);
            ///     counter.0
            /// }
            /// # assert_eq!(count_sends(None), 0);
            /// ```
            pub trait Visitor: Sized {
                $(
                    #[doc = concat!("Handle a `", $tag, "` node.")]
                    fn [<on_ $method>](&mut self, node: &Node) {
                        walk_children(self, node)
                    }
                )*
            }

            /// Call the visitor method for `node`'s type.
            pub fn dispatch<V: Visitor>(visitor: &mut V, node: &Node) {
                match node.node_type() {
                    $(NodeType::$variant => visitor.[<on_ $method>](node),)*
                }
            }
        }
    };
}

for_each_node_type!(visitor_methods);
