// Copyright (c) rubric contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

mod core;

pub use self::core::{LexTok, Lexed, TokState, MAX_NESTING};

use rubric_ast::{Diagnostic, SyntaxAbort};

/// Tokenize `text`, appending diagnostics in source order.
pub fn tokenize(text: &str, diagnostics: &mut Vec<Diagnostic>) -> Result<Lexed, SyntaxAbort> {
    TokState::new(text).run(diagnostics)
}

#[cfg(test)]
mod tests;
