// Copyright (c) rubric contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The bundled Ruby grammar backend.
//!
//! # Overview
//!
//! - **Tokenizing**: [`tokenizer::tokenize`] turns text into tokens and
//!   comments, reporting lexical problems as diagnostics.
//! - **Parsing**: a peg grammar over the token stream builds the
//!   [`Node`](rubric_ast::Node) tree; a second pass resolves which bare
//!   identifiers are local variables.
//! - **Grammar seam**: [`RubyGrammar`] implements [`Grammar`] for one
//!   [`RubyVersion`]. Syntax introduced after that version is rejected.
//!
//! # Quick Start
//!
//! ```
//! use rubric_parser::parse;
//! use rubric_ast::RubyVersion;
//!
//! let (output, diagnostics) = parse("x = 1\nputs x", RubyVersion::V2_7).expect("parse error");
//! assert!(diagnostics.is_empty());
//! assert_eq!(
//!     output.ast.to_string(),
//!     "(begin (lvasgn :x (int 1)) (send nil :puts (lvar :x)))"
//! );
//! ```

pub mod parser;
pub mod tokenizer;

use rubric_ast::{
    Diagnostic, DiagnosticSink, Grammar, ParseOptions, ParseOutput, RawToken, RubyVersion, SourceBuffer,
    SyntaxAbort,
};

pub use parser::ParserError;

/// [`Grammar`] for one Ruby version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RubyGrammar {
    version: RubyVersion,
}

impl RubyGrammar {
    pub fn new(version: RubyVersion) -> Self {
        RubyGrammar { version }
    }
}

impl Grammar for RubyGrammar {
    fn version(&self) -> RubyVersion {
        self.version
    }

    fn tokenize(
        &self,
        buffer: &SourceBuffer,
        diagnostics: &mut dyn DiagnosticSink,
    ) -> Result<ParseOutput, SyntaxAbort> {
        let mut found = Vec::new();
        let result = parse_buffer(&buffer.source, self.version, &mut found);
        tracing::trace!(
            name = %buffer.name,
            version = %self.version,
            diagnostics = found.len(),
            ok = result.is_ok(),
            "parsed buffer"
        );
        if let Err(abort) = &result {
            tracing::debug!(name = %buffer.name, error = %abort, "syntax abort");
        }
        for diagnostic in found {
            diagnostics.report(diagnostic);
        }
        result
    }
}

/// Tokenize and parse `source`, appending every diagnostic in source order.
fn parse_buffer(
    source: &str,
    version: RubyVersion,
    found: &mut Vec<Diagnostic>,
) -> Result<ParseOutput, SyntaxAbort> {
    let lexed = tokenizer::tokenize(source, found)?;
    let ast = match parser::parse_tokens(&lexed.tokens, version, source) {
        Ok(ast) => ast,
        Err(err) => {
            let location = err.location();
            found.push(Diagnostic::error(err.to_string(), location));
            found.sort_by_key(|d| d.location.begin_pos);
            return Err(SyntaxAbort::new(err.to_string(), Some(location)));
        }
    };
    found.extend(parser::tree_warnings(&ast));
    found.sort_by_key(|d| d.location.begin_pos);

    let tokens: Vec<RawToken> = lexed
        .tokens
        .into_iter()
        .map(|tok| (tok.kind, (tok.value, tok.range)))
        .collect();
    Ok(ParseOutput {
        ast,
        comments: lexed.comments,
        tokens,
    })
}

/// Parse `source` for `version`, returning the output with its diagnostics.
///
/// # Errors
///
/// Returns [`SyntaxAbort`] when no tree can be built. The diagnostics that
/// led there are not returned; use [`RubyGrammar`] with a sink to keep them.
pub fn parse(source: &str, version: RubyVersion) -> Result<(ParseOutput, Vec<Diagnostic>), SyntaxAbort> {
    let mut found = Vec::new();
    let output = parse_buffer(source, version, &mut found)?;
    Ok((output, found))
}

/// Parse with [`ParseOptions`]; the path, when set, names the buffer.
pub fn parse_with_options(
    source: &str,
    options: &ParseOptions,
    diagnostics: &mut dyn DiagnosticSink,
) -> Result<ParseOutput, SyntaxAbort> {
    let buffer = SourceBuffer::new(options.path_str().unwrap_or("(string)"), source);
    RubyGrammar::new(options.version).tokenize(&buffer, diagnostics)
}

#[cfg(test)]
mod tests {
    use rubric_ast::{DiagnosticLevel, TokenKind};

    use super::*;

    fn diagnostics_of(source: &str, version: RubyVersion) -> (bool, Vec<Diagnostic>) {
        let mut sink = Vec::new();
        let buffer = SourceBuffer::new("(string)", source);
        let ok = RubyGrammar::new(version).tokenize(&buffer, &mut sink).is_ok();
        (ok, sink)
    }

    #[test]
    fn grammar_reports_its_version() {
        assert_eq!(RubyGrammar::new(RubyVersion::V3_1).version(), RubyVersion::V3_1);
    }

    #[test]
    fn tokens_carry_value_and_range() {
        let (output, _) = parse("foo(1)", RubyVersion::V2_7).expect("parse");
        let kinds: Vec<TokenKind> = output.tokens.iter().map(|t| t.0).collect();
        assert_eq!(
            kinds,
            vec![TokenKind::TIdentifier, TokenKind::TLParen2, TokenKind::TInteger, TokenKind::TRParen]
        );
        let (value, range) = &output.tokens[0].1;
        assert_eq!(value, "foo");
        assert_eq!((range.begin_pos, range.end_pos), (0, 3));
    }

    #[test]
    fn comments_are_collected() {
        let (output, _) = parse("# hi\nfoo # there\n", RubyVersion::V2_7).expect("parse");
        let texts: Vec<&str> = output.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["# hi", "# there"]);
    }

    #[test]
    fn syntax_error_is_reported_then_aborts() {
        let (ok, sink) = diagnostics_of("def foo(\n", RubyVersion::V2_7);
        assert!(!ok);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].level, DiagnosticLevel::Error);
        assert_eq!(sink[0].message, "unexpected token $end");
    }

    #[test]
    fn warnings_do_not_abort() {
        let (ok, sink) = diagnostics_of("if a = 1\nend\n", RubyVersion::V2_7);
        assert!(ok);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].level, DiagnosticLevel::Warning);
    }

    /// Records every report as it arrives.
    #[derive(Default)]
    struct Recording(Vec<(DiagnosticLevel, usize)>);

    impl DiagnosticSink for Recording {
        fn report(&mut self, diagnostic: Diagnostic) {
            self.0.push((diagnostic.level, diagnostic.location.begin_pos));
        }
    }

    #[test]
    fn diagnostics_reach_the_sink_once_each_in_source_order() {
        let buffer = SourceBuffer::new("(string)", "x = 1 \u{1}\nif b = 2\nend\n");
        let mut sink = Recording::default();
        let result = RubyGrammar::new(RubyVersion::V3_3).tokenize(&buffer, &mut sink);
        assert!(result.is_ok());
        assert_eq!(
            sink.0,
            vec![(DiagnosticLevel::Error, 6), (DiagnosticLevel::Warning, 11)]
        );
    }

    #[test]
    fn deep_nesting_aborts_instead_of_overflowing() {
        let source = format!("{}1{}", "[".repeat(1000), "]".repeat(1000));
        let (ok, sink) = diagnostics_of(&source, RubyVersion::V3_3);
        assert!(!ok);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].level, DiagnosticLevel::Fatal);
    }

    #[test]
    fn empty_source_is_an_empty_begin() {
        let (output, diagnostics) = parse("", RubyVersion::V2_7).expect("parse");
        assert!(diagnostics.is_empty());
        assert_eq!(output.ast.to_string(), "(begin)");
        assert!(output.tokens.is_empty());
    }

    #[test]
    fn options_path_names_the_buffer() {
        let options = ParseOptions::new(RubyVersion::V3_0).with_path("lib/a.rb");
        let mut sink = Vec::new();
        let output = parse_with_options("1", &options, &mut sink).expect("parse");
        assert_eq!(output.ast.to_string(), "(int 1)");
    }
}
