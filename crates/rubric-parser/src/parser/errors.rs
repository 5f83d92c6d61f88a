// Copyright (c) rubric contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use peg::error::ParseError;
use rubric_ast::SourceRange;
use thiserror::Error;

use crate::tokenizer::LexTok;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParserError {
    #[error("unexpected token {token}")]
    UnexpectedToken {
        token: &'static str,
        location: SourceRange,
    },
    #[error("unexpected token $end")]
    UnexpectedEnd { location: SourceRange },
}

impl ParserError {
    /// Where parsing stopped.
    pub fn location(&self) -> SourceRange {
        match self {
            ParserError::UnexpectedToken { location, .. } | ParserError::UnexpectedEnd { location } => {
                *location
            }
        }
    }

    /// Map a grammar failure at token index `err.location` back to source.
    pub(crate) fn from_peg(err: &ParseError<usize>, tokens: &[LexTok], source: &str) -> Self {
        match tokens.get(err.location) {
            Some(tok) => ParserError::UnexpectedToken {
                token: tok.kind.as_str(),
                location: tok.range,
            },
            None => ParserError::UnexpectedEnd {
                location: end_of(source),
            },
        }
    }
}

/// A zero-width range after the last byte of `source`.
fn end_of(source: &str) -> SourceRange {
    let bytes = source.as_bytes();
    let line = 1 + memchr::memchr_iter(b'\n', bytes).count();
    let column = match memchr::memrchr(b'\n', bytes) {
        Some(nl) => bytes.len() - nl - 1,
        None => bytes.len(),
    };
    SourceRange::new(bytes.len(), bytes.len(), line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_of_source_position() {
        assert_eq!(end_of(""), SourceRange::new(0, 0, 1, 0));
        assert_eq!(end_of("ab\ncd"), SourceRange::new(5, 5, 2, 2));
        assert_eq!(end_of("ab\n"), SourceRange::new(3, 3, 2, 0));
    }
}
