//! Source ingestion for rubric.
//!
//! This crate turns raw bytes into a [`ProcessedSource`]: the decoded text,
//! syntax tree, comments, tokens and diagnostics of one file, plus derived
//! views (logical lines, checksum, disabled line ranges).
//!
//! - [`ParserAdapter`] normalizes the encoding and runs the grammar that a
//!   [`GrammarRegistry`] maps the requested Ruby version to.
//! - Per-source problems never surface as `Err`: they are recorded as
//!   diagnostics or a [`ParseError`] and reflected by
//!   [`ProcessedSource::valid_syntax`]. Only caller mistakes, such as an
//!   unsupported version, are a [`SourceError`].
//! - [`Convergence`] compares checksums across autocorrection passes.
//!
//! ```
//! use rubric_ast::{walk, Node, RubyVersion, Visitor};
//! use rubric_source::ProcessedSource;
//!
//! #[derive(Default)]
//! struct Sends(Vec<String>);
//!
//! impl Visitor for Sends {
//!     fn on_send(&mut self, node: &Node) {
//!         if let Some(name) = node.symbol(1) {
//!             self.0.push(name.to_string());
//!         }
//!         rubric_ast::walk_children(self, node);
//!     }
//! }
//!
//! let source = ProcessedSource::new("puts foo.bar\n", RubyVersion::V3_3, None)?;
//! assert!(source.valid_syntax());
//!
//! let mut sends = Sends::default();
//! walk(&mut sends, source.ast());
//! assert_eq!(sends.0, ["puts", "bar", "foo"]);
//! # Ok::<(), rubric_source::SourceError>(())
//! ```

pub mod adapter;
pub mod comment_config;
pub mod convergence;
pub mod encoding;
pub mod error;
pub mod processed_source;
pub mod registry;

pub use adapter::{ParsedInputs, ParserAdapter, ANONYMOUS_PATH};
pub use comment_config::{
    CommentConfig, CommentSource, DisabledLineRanges, DisabledRangeResolver, ALL_RULES,
};
pub use convergence::{Convergence, PassVerdict};
pub use encoding::Encoding;
pub use error::{ParseError, SourceError, SourceResult};
pub use processed_source::{ProcessedSource, DATA_MARKER};
pub use registry::GrammarRegistry;
