//! Rubric: Ruby source ingestion and AST traversal for static analysis.
//!
//! Rule implementations build on two things: a [`ProcessedSource`] for each
//! file, and [`walk`] with a [`Visitor`] over its tree. Everything else here
//! supports those two.
//!
//! ```
//! use rubric::{walk, walk_children, Node, ProcessedSource, RubyVersion, Visitor};
//!
//! struct Conditionals(usize);
//!
//! impl Visitor for Conditionals {
//!     fn on_if(&mut self, node: &Node) {
//!         self.0 += 1;
//!         walk_children(self, node);
//!     }
//! }
//!
//! let source = ProcessedSource::new("if a\n  b if c\nend\n", RubyVersion::V3_3, Some("demo.rb"))?;
//! let mut count = Conditionals(0);
//! walk(&mut count, source.ast());
//! assert_eq!(count.0, 2);
//! # Ok::<(), rubric::SourceError>(())
//! ```

// Infrastructure - re-exported from rubric-core
pub use rubric_core::hash;
pub use rubric_core::text;
pub use rubric_core::ContentHash;

// Model and traversal - re-exported from rubric-ast
pub use rubric_ast::{
    dispatch, walk, walk_all, walk_children, BespokeRule, Child, Comment, Diagnostic,
    DiagnosticLevel, DiagnosticSink, Grammar, Node, NodeType, ParseOptions, ParseOutput, RawToken,
    RubyVersion, Shape, SourceBuffer, SourceRange, SyntaxAbort, Token, TokenKind,
    VersionParseError, Visitor,
};

// Bundled grammar backend
pub use rubric_parser::RubyGrammar;

// Ingestion - re-exported from rubric-source
pub use rubric_source::{
    CommentConfig, CommentSource, Convergence, DisabledLineRanges, DisabledRangeResolver,
    Encoding, GrammarRegistry, ParseError, ParsedInputs, ParserAdapter, PassVerdict,
    ProcessedSource, SourceError, SourceResult,
};

/// Crate modules, for paths the flat re-exports do not cover.
pub mod crates {
    pub use rubric_ast as ast;
    pub use rubric_core as core;
    pub use rubric_parser as parser;
    pub use rubric_source as source;
}
