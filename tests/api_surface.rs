//! Compile-only test to verify public API surface.
//!
//! This file serves as a compile-time contract for the public API.
//! If this file fails to compile, the public API has regressed.
//!
//! Run with: cargo test -- api_surface

// Allow unused imports - this test is about compile-time verification, not runtime usage
#![allow(unused_imports)]

// ============================================================================
// Model and Traversal
// ============================================================================

use rubric::{
    dispatch, walk, walk_all, walk_children, BespokeRule, Child, Comment, Diagnostic,
    DiagnosticLevel, Node, NodeType, Shape, SourceRange, Token, TokenKind, Visitor,
};

// ============================================================================
// Grammar Seam and Configuration
// ============================================================================

use rubric::{
    DiagnosticSink, Grammar, GrammarRegistry, ParseOptions, ParseOutput, RawToken, RubyGrammar,
    RubyVersion, SourceBuffer, SyntaxAbort, VersionParseError,
};

// ============================================================================
// Ingestion
// ============================================================================

use rubric::{
    CommentConfig, CommentSource, ContentHash, Convergence, DisabledLineRanges,
    DisabledRangeResolver, Encoding, ParseError, ParsedInputs, ParserAdapter, PassVerdict,
    ProcessedSource, SourceError, SourceResult,
};

use rubric::crates::core as rubric_core_crate;
use rubric::crates::{ast, parser, source};
use rubric::{hash, text};

// ============================================================================
// Test
// ============================================================================

#[test]
fn api_surface_compiles() {
    // This test exists only to verify imports compile.
    // If you're here because this test broke, you may have
    // accidentally removed a public re-export.
    let _ = std::any::type_name::<ProcessedSource>();
    let _ = std::any::type_name::<ParserAdapter>();
    let _ = std::any::type_name::<GrammarRegistry>();
    let _ = std::any::type_name::<Node>();
    let _ = std::any::type_name::<Token>();
    let _ = std::any::type_name::<Diagnostic>();
    let _ = std::any::type_name::<Convergence>();
}

#[test]
fn consumer_contract_end_to_end() {
    struct Names(Vec<String>);

    impl Visitor for Names {
        fn on_def(&mut self, node: &Node) {
            if let Some(name) = node.symbol(0) {
                self.0.push(name.to_string());
            }
            walk_children(self, node);
        }
    }

    let source = ProcessedSource::new(
        "class A\n  def one; end\n  def two = 2\nend\n",
        RubyVersion::V3_1,
        Some("a.rb"),
    )
    .expect("supported version");
    assert!(source.valid_syntax());

    let mut names = Names(Vec::new());
    walk(&mut names, source.ast());
    assert_eq!(names.0, ["one", "two"]);

    let json = serde_json::to_value(source.checksum()).expect("serialize");
    assert_eq!(json.as_str(), Some(source.checksum().as_str()));
}

#[test]
fn every_known_version_has_a_grammar() {
    let registry = GrammarRegistry::builtin();
    for &version in RubyVersion::KNOWN {
        assert!(ParserAdapter::with_registry(&registry, version).is_ok(), "{version}");
    }
}
