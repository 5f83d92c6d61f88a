//! Parser adapter: raw bytes in, ProcessedSource inputs out.
//!
//! The adapter decodes the bytes, hands the text to the grammar registered
//! for its Ruby version, and turns whatever comes back into
//! [`ParsedInputs`]. Nothing that depends on the source text is returned as
//! an error: encoding failures and syntax aborts land in
//! [`ParsedInputs::parse_error`], diagnostics in
//! [`ParsedInputs::diagnostics`].

use std::fmt;
use std::sync::Arc;

use rubric_ast::{Comment, Diagnostic, Grammar, Node, ParseOptions, RubyVersion, SourceBuffer, Token};

use crate::encoding::{self, Encoding};
use crate::error::{ParseError, SourceResult};
use crate::registry::GrammarRegistry;

/// Path reported for sources that did not come from a file.
pub const ANONYMOUS_PATH: &str = "(string)";

/// Everything a [`ProcessedSource`](crate::ProcessedSource) is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedInputs {
    /// Decoded text. After an encoding failure this is a lossy UTF-8 view
    /// of the bytes so lines can still be shown.
    pub source: String,
    /// `None` after an encoding failure.
    pub encoding: Option<Encoding>,
    /// `None` iff `parse_error` is set.
    pub ast: Option<Node>,
    pub comments: Vec<Comment>,
    pub tokens: Vec<Token>,
    pub diagnostics: Vec<Diagnostic>,
    pub parse_error: Option<ParseError>,
}

impl ParsedInputs {
    fn failed(source: String, encoding: Option<Encoding>, diagnostics: Vec<Diagnostic>, err: ParseError) -> Self {
        ParsedInputs {
            source,
            encoding,
            ast: None,
            comments: Vec::new(),
            tokens: Vec::new(),
            diagnostics,
            parse_error: Some(err),
        }
    }

    pub fn valid_syntax(&self) -> bool {
        is_valid(&self.diagnostics, self.parse_error.as_ref())
    }
}

/// No parse error and no diagnostic at `error` or `fatal` level.
pub(crate) fn is_valid(diagnostics: &[Diagnostic], parse_error: Option<&ParseError>) -> bool {
    parse_error.is_none() && !diagnostics.iter().any(Diagnostic::is_error)
}

/// Parses sources for one Ruby version.
///
/// Holds nothing but the grammar handle, so one adapter can be shared by
/// every worker thread.
#[derive(Clone)]
pub struct ParserAdapter {
    grammar: Arc<dyn Grammar>,
    version: RubyVersion,
}

impl ParserAdapter {
    /// An adapter using the bundled grammar.
    ///
    /// # Errors
    ///
    /// [`SourceError::UnsupportedVersion`](crate::SourceError::UnsupportedVersion)
    /// when the bundled grammar does not cover `version`.
    pub fn new(version: RubyVersion) -> SourceResult<Self> {
        Self::with_registry(&GrammarRegistry::builtin(), version)
    }

    /// An adapter using whatever `registry` maps `version` to.
    pub fn with_registry(registry: &GrammarRegistry, version: RubyVersion) -> SourceResult<Self> {
        let grammar = registry.resolve(version)?;
        Ok(ParserAdapter { grammar, version })
    }

    pub fn version(&self) -> RubyVersion {
        self.version
    }

    /// Parse `raw`, naming it `path` in diagnostics.
    pub fn parse(&self, raw: &[u8], path: Option<&str>) -> ParsedInputs {
        let mut options = ParseOptions::new(self.version);
        options.path = path.map(str::to_string);
        self.parse_with_options(raw, &options)
    }

    /// Parse with an explicit default encoding and path.
    ///
    /// `options.version` is ignored; the adapter always parses with the
    /// grammar it was built for.
    pub fn parse_with_options(&self, raw: &[u8], options: &ParseOptions) -> ParsedInputs {
        let name = options.path_str().unwrap_or(ANONYMOUS_PATH);
        tracing::debug!(path = name, version = %self.version, bytes = raw.len(), "parsing source");

        let decoded = match encoding::decode(raw, options.encoding_str()) {
            Ok(decoded) => decoded,
            Err(err) => {
                tracing::warn!(path = name, error = %err, "source encoding failure");
                let lossy = String::from_utf8_lossy(raw).into_owned();
                return ParsedInputs::failed(lossy, None, Vec::new(), err);
            }
        };

        let buffer = SourceBuffer::new(name, decoded.text);
        let mut diagnostics = Vec::new();
        let result = self.grammar.tokenize(&buffer, &mut diagnostics);
        let SourceBuffer { source, .. } = buffer;
        let inputs = match result {
            Ok(output) => ParsedInputs {
                source,
                encoding: Some(decoded.encoding),
                ast: Some(output.ast),
                comments: output.comments,
                tokens: output.tokens.into_iter().map(Token::from_raw).collect(),
                diagnostics,
                parse_error: None,
            },
            Err(abort) => ParsedInputs::failed(source, Some(decoded.encoding), diagnostics, abort.into()),
        };

        tracing::debug!(
            path = name,
            tokens = inputs.tokens.len(),
            comments = inputs.comments.len(),
            diagnostics = inputs.diagnostics.len(),
            valid = inputs.valid_syntax(),
            "parsed source"
        );
        inputs
    }
}

impl fmt::Debug for ParserAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserAdapter")
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use rubric_ast::{DiagnosticLevel, NodeType, TokenKind};

    use super::*;
    use crate::error::SourceError;

    fn adapter() -> ParserAdapter {
        ParserAdapter::new(RubyVersion::V3_3).unwrap()
    }

    #[test]
    fn unsupported_version_is_a_caller_error() {
        let err = ParserAdapter::new(RubyVersion::new(1, 8)).unwrap_err();
        assert!(matches!(err, SourceError::UnsupportedVersion { .. }));
    }

    #[test]
    fn well_formed_source() {
        let inputs = adapter().parse(b"x = 1 # one\n", None);
        assert!(inputs.valid_syntax());
        assert_eq!(inputs.ast.as_ref().map(Node::node_type), Some(NodeType::Lvasgn));
        assert_eq!(inputs.comments.len(), 1);
        assert_eq!(inputs.tokens[0].kind(), TokenKind::TIdentifier);
        assert_eq!(inputs.tokens[0].text(), "x");
        assert_eq!(inputs.encoding, Some(Encoding::Utf8));
    }

    #[test]
    fn syntax_abort_is_captured() {
        let inputs = adapter().parse(b"puts \"abc\n", Some("bad.rb"));
        assert!(inputs.ast.is_none());
        assert!(matches!(inputs.parse_error, Some(ParseError::Syntax(_))));
        assert!(inputs.diagnostics.iter().any(|d| d.level == DiagnosticLevel::Fatal));
        assert!(!inputs.valid_syntax());
    }

    #[test]
    fn encoding_failure_is_captured() {
        let inputs = adapter().parse(b"# encoding: us-ascii\nputs '\xC3\xA9'\n", None);
        assert!(inputs.ast.is_none());
        assert!(inputs.diagnostics.is_empty());
        assert!(inputs.parse_error.as_ref().is_some_and(ParseError::is_encoding));
        assert!(inputs.source.starts_with("# encoding: us-ascii\n"));
        assert!(!inputs.valid_syntax());
    }

    #[test]
    fn options_supply_default_encoding() {
        let options = ParseOptions::new(RubyVersion::V3_3).with_encoding("binary");
        let inputs = adapter().parse_with_options(b"s = '\xFF'\n", &options);
        assert!(inputs.valid_syntax());
        assert_eq!(inputs.encoding, Some(Encoding::Binary));
    }

    #[test]
    fn adapter_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ParserAdapter>();
    }
}
