// Copyright (c) rubric contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The seam between source ingestion and a grammar backend.
//!
//! A backend implements [`Grammar`] for one language version. Ingestion
//! hands it a decoded [`SourceBuffer`] and a [`DiagnosticSink`]; the backend
//! reports every diagnostic through the sink, once each and in order of
//! occurrence, and either returns the tree, comments and tokens or a
//! [`SyntaxAbort`] when it cannot build a tree at all.

use thiserror::Error;

use crate::comment::Comment;
use crate::diagnostic::Diagnostic;
use crate::nodes::Node;
use crate::range::SourceRange;
use crate::token::RawToken;
use crate::version::RubyVersion;

/// Decoded source text plus the name used in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBuffer {
    pub name: String,
    pub source: String,
}

impl SourceBuffer {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        SourceBuffer {
            name: name.into(),
            source: source.into(),
        }
    }
}

/// Accumulator for diagnostics reported during tokenization and parsing.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Everything a successful parse produces.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutput {
    pub ast: Node,
    pub comments: Vec<Comment>,
    pub tokens: Vec<RawToken>,
}

/// Terminal syntax failure: no tree could be built.
///
/// The structured detail has already been reported through the
/// [`DiagnosticSink`]; this only carries a summary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SyntaxAbort {
    pub message: String,
    pub location: Option<SourceRange>,
}

impl SyntaxAbort {
    pub fn new(message: impl Into<String>, location: Option<SourceRange>) -> Self {
        SyntaxAbort {
            message: message.into(),
            location,
        }
    }
}

/// A grammar backend for one Ruby version.
///
/// Implementations must be reentrant: a single instance is shared by every
/// thread parsing that version.
pub trait Grammar: Send + Sync {
    fn version(&self) -> RubyVersion;

    /// Tokenize and parse `buffer`.
    ///
    /// Recoverable problems are reported through `diagnostics` and parsing
    /// continues; an unrecoverable one is reported and then returned as
    /// [`SyntaxAbort`].
    fn tokenize(
        &self,
        buffer: &SourceBuffer,
        diagnostics: &mut dyn DiagnosticSink,
    ) -> Result<ParseOutput, SyntaxAbort>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticLevel;

    #[test]
    fn vec_sink_keeps_order() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let r = SourceRange::default();
        sink.report(Diagnostic::warning("first", r));
        sink.report(Diagnostic::error("second", r));
        let levels: Vec<_> = sink.iter().map(|d| d.level).collect();
        assert_eq!(levels, vec![DiagnosticLevel::Warning, DiagnosticLevel::Error]);
    }

    #[test]
    fn syntax_abort_displays_message() {
        let abort = SyntaxAbort::new("unterminated string meets end of file", None);
        assert_eq!(abort.to_string(), "unterminated string meets end of file");
    }
}
