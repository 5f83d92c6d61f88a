// Copyright (c) rubric contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

mod builder;
pub mod errors;
mod grammar;
mod locals;
mod warnings;

pub use errors::ParserError;

use rubric_ast::{Diagnostic, Node, NodeType, RubyVersion, SourceRange};

use crate::tokenizer::LexTok;
use grammar::{ruby, Ctx};

/// Parse a token stream into a tree with locals resolved.
///
/// An empty program yields an empty `begin` at offset 0.
pub fn parse_tokens(tokens: &[LexTok], version: RubyVersion, source: &str) -> Result<Node, ParserError> {
    let input: Vec<&LexTok> = tokens.iter().collect();
    let ctx = Ctx { version };
    let program = ruby::program(&input, &ctx).map_err(|err| {
        tracing::debug!(expected = %err.expected, at = err.location, "grammar rejected token stream");
        ParserError::from_peg(&err, tokens, source)
    })?;
    let root = program.unwrap_or_else(|| Node::new(NodeType::Begin, Vec::new(), SourceRange::new(0, 0, 1, 0)));
    Ok(locals::resolve(root))
}

/// Warnings found by inspecting a finished tree, in tree order.
pub fn tree_warnings(ast: &Node) -> Vec<Diagnostic> {
    warnings::check(ast)
}
