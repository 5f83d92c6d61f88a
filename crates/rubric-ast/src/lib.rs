// Copyright (c) rubric contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Ruby syntax tree model and traversal engine.
//!
//! # Overview
//!
//! - **Tokens**: [`Token`] values normalized from a backend's [`RawToken`]s.
//! - **Nodes**: [`Node`] is a tagged tree element with positional [`Child`]
//!   slots; [`NodeType`] is the closed set of tags.
//! - **Shapes**: [`NodeType::shape`] classifies every tag into a traversal
//!   [`Shape`], the table the walker consults.
//! - **Traversal**: implement [`Visitor`] and call [`walk`]; every `on_*`
//!   method you do not override recurses with the default shape.
//! - **Grammar seam**: [`Grammar`] is what a parsing backend implements.
//!
//! # Quick Start
//!
//! ```
//! use rubric_ast::{walk, walk_children, Child, Node, NodeType, SourceRange, Visitor};
//!
//! struct Tags(Vec<NodeType>);
//!
//! impl Visitor for Tags {
//!     fn on_int(&mut self, node: &Node) {
//!         self.0.push(node.node_type());
//!     }
//!     fn on_array(&mut self, node: &Node) {
//!         self.0.push(node.node_type());
//!         walk_children(self, node);
//!     }
//! }
//!
//! let r = SourceRange::default();
//! let one = Node::new(NodeType::Int, vec![Child::Integer(1)], r);
//! let array = Node::new(NodeType::Array, vec![one.into()], r);
//!
//! let mut tags = Tags(Vec::new());
//! walk(&mut tags, Some(&array));
//! assert_eq!(tags.0, vec![NodeType::Array, NodeType::Int]);
//! ```

pub mod comment;
pub mod diagnostic;
pub mod grammar;
pub mod range;
pub mod token;
pub mod version;

mod nodes;
pub use nodes::*;

/// Visitor infrastructure for AST traversal.
pub mod visitor;
pub use visitor::{dispatch, walk, walk_all, walk_children, Visitor};

pub use comment::Comment;
pub use diagnostic::{Diagnostic, DiagnosticLevel};
pub use grammar::{DiagnosticSink, Grammar, ParseOutput, SourceBuffer, SyntaxAbort};
pub use range::SourceRange;
pub use token::{RawToken, Token, TokenKind};
pub use version::{ParseOptions, RubyVersion, VersionParseError};
