//! The parsed form of one source file.
//!
//! A [`ProcessedSource`] owns everything produced from one buffer: the
//! tree, comments, tokens and diagnostics, plus views derived on demand.
//! Derived views (lines, checksum, disabled ranges) are computed at most
//! once per instance through [`OnceLock`], so a `ProcessedSource` can be
//! shared between threads without locking.

use std::fs;
use std::ops::Index;
use std::path::Path;
use std::slice::SliceIndex;
use std::sync::OnceLock;

use rubric_ast::{Comment, Diagnostic, Node, RubyVersion, Token};
use rubric_core::{text, ContentHash};

use crate::adapter::{is_valid, ParsedInputs, ParserAdapter};
use crate::comment_config::{CommentConfig, CommentSource, DisabledLineRanges, DisabledRangeResolver};
use crate::encoding::Encoding;
use crate::error::{ParseError, SourceError, SourceResult};

/// Line that starts the data section; nothing after it is analyzed.
pub const DATA_MARKER: &str = "__END__";

#[derive(Debug, Clone)]
pub struct ProcessedSource {
    path: String,
    raw: Vec<u8>,
    version: RubyVersion,
    source: String,
    encoding: Option<Encoding>,
    ast: Option<Node>,
    comments: Vec<Comment>,
    tokens: Vec<Token>,
    diagnostics: Vec<Diagnostic>,
    parse_error: Option<ParseError>,
    lines: OnceLock<Vec<String>>,
    raw_lines: OnceLock<Vec<String>>,
    checksum: OnceLock<ContentHash>,
    disabled: OnceLock<DisabledLineRanges>,
}

impl ProcessedSource {
    /// Parse `raw` with the bundled grammar for `version`.
    ///
    /// # Errors
    ///
    /// Only [`SourceError::UnsupportedVersion`]; problems with the source
    /// itself are recorded on the result.
    pub fn new(raw: impl Into<Vec<u8>>, version: RubyVersion, path: Option<&str>) -> SourceResult<Self> {
        let adapter = ParserAdapter::new(version)?;
        Ok(Self::from_adapter(&adapter, raw, path))
    }

    /// Parse `raw` with an existing adapter.
    pub fn from_adapter(adapter: &ParserAdapter, raw: impl Into<Vec<u8>>, path: Option<&str>) -> Self {
        let raw = raw.into();
        let inputs = adapter.parse(&raw, path);
        Self::from_inputs(raw, adapter.version(), path, inputs)
    }

    /// Read and parse a file; its path names it in diagnostics.
    pub fn from_file(path: impl AsRef<Path>, version: RubyVersion) -> SourceResult<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = fs::read(path).map_err(|source| SourceError::Io {
            path: display.clone(),
            source,
        })?;
        Self::new(raw, version, Some(&display))
    }

    /// Assemble from inputs produced elsewhere.
    pub fn from_inputs(raw: Vec<u8>, version: RubyVersion, path: Option<&str>, inputs: ParsedInputs) -> Self {
        let ParsedInputs {
            source,
            encoding,
            ast,
            comments,
            tokens,
            diagnostics,
            parse_error,
        } = inputs;
        ProcessedSource {
            path: path.unwrap_or(crate::ANONYMOUS_PATH).to_string(),
            raw,
            version,
            source,
            encoding,
            ast,
            comments,
            tokens,
            diagnostics,
            parse_error,
            lines: OnceLock::new(),
            raw_lines: OnceLock::new(),
            checksum: OnceLock::new(),
            disabled: OnceLock::new(),
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// The file path, or `"(string)"` for anonymous sources.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The bytes exactly as given.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// The decoded text the grammar parsed.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn version(&self) -> RubyVersion {
        self.version
    }

    pub fn encoding(&self) -> Option<Encoding> {
        self.encoding
    }

    pub fn ast(&self) -> Option<&Node> {
        self.ast.as_ref()
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn parse_error(&self) -> Option<&ParseError> {
        self.parse_error.as_ref()
    }

    /// No parse error and no diagnostic at `error` or `fatal` level.
    pub fn valid_syntax(&self) -> bool {
        is_valid(&self.diagnostics, self.parse_error.as_ref())
    }

    // ------------------------------------------------------------------
    // Lines
    // ------------------------------------------------------------------

    /// Source lines without terminators, stopping before a `__END__` line
    /// that comes after the last token.
    pub fn logical_lines(&self) -> &[String] {
        self.lines.get_or_init(|| {
            let lines = self.compute_lines();
            tracing::trace!(path = %self.path, lines = lines.len(), "computed logical lines");
            lines
        })
    }

    fn compute_lines(&self) -> Vec<String> {
        let all = text::logical_lines(&self.source);
        let last_token_line = self.tokens.last().map_or(all.len(), Token::line);
        all.iter()
            .enumerate()
            .take_while(|&(index, line)| index < last_token_line || *line != DATA_MARKER)
            .map(|(_, line)| line.to_string())
            .collect()
    }

    /// Every line of the decoded text with its terminator.
    pub fn raw_lines(&self) -> &[String] {
        self.raw_lines.get_or_init(|| {
            text::raw_lines(&self.source)
                .into_iter()
                .map(str::to_string)
                .collect()
        })
    }

    /// Slice access to [`logical_lines`](Self::logical_lines).
    pub fn get<I>(&self, index: I) -> Option<&I::Output>
    where
        I: SliceIndex<[String]>,
    {
        self.logical_lines().get(index)
    }

    /// The 1-based line `n`.
    pub fn line(&self, n: usize) -> Option<&str> {
        let index = n.checked_sub(1)?;
        self.logical_lines().get(index).map(String::as_str)
    }

    pub fn line_count(&self) -> usize {
        self.logical_lines().len()
    }

    // ------------------------------------------------------------------
    // Derived views
    // ------------------------------------------------------------------

    /// SHA-256 of the raw bytes, whether or not they parsed.
    pub fn checksum(&self) -> &ContentHash {
        self.checksum.get_or_init(|| {
            let hash = ContentHash::compute(&self.raw);
            tracing::trace!(path = %self.path, checksum = hash.short(12), "computed checksum");
            hash
        })
    }

    /// Lines on which each rule is disabled by comment directives.
    pub fn disabled_line_ranges(&self) -> &DisabledLineRanges {
        self.disabled.get_or_init(|| {
            let ranges = CommentConfig.disabled_line_ranges(self);
            tracing::trace!(path = %self.path, rules = ranges.len(), "computed disabled line ranges");
            ranges
        })
    }

    /// Disabled ranges according to another resolver. Not memoized.
    pub fn disabled_line_ranges_with(&self, resolver: &dyn DisabledRangeResolver) -> DisabledLineRanges {
        resolver.disabled_line_ranges(self)
    }
}

impl CommentSource for ProcessedSource {
    fn comments(&self) -> &[Comment] {
        &self.comments
    }

    fn lines(&self) -> &[String] {
        self.logical_lines()
    }
}

impl<I> Index<I> for ProcessedSource
where
    I: SliceIndex<[String]>,
{
    type Output = I::Output;

    fn index(&self, index: I) -> &Self::Output {
        &self.logical_lines()[index]
    }
}

#[cfg(test)]
mod tests {
    use rubric_ast::{DiagnosticLevel, NodeType};

    use super::*;

    fn processed(source: &str) -> ProcessedSource {
        ProcessedSource::new(source, RubyVersion::V3_3, None).unwrap()
    }

    #[test]
    fn anonymous_path() {
        assert_eq!(processed("1").path(), "(string)");
    }

    #[test]
    fn well_formed_source_round_trip() {
        let ps = processed("def foo\n  bar\nend\n");
        assert!(ps.valid_syntax());
        assert!(ps.diagnostics().is_empty());
        assert!(ps.parse_error().is_none());
        assert_eq!(ps.ast().map(Node::node_type), Some(NodeType::Def));
    }

    #[test]
    fn lines_strip_terminators() {
        let ps = processed("a = 1\r\nb = 2\n");
        assert_eq!(ps.logical_lines(), ["a = 1", "b = 2"]);
        assert_eq!(ps.raw_lines(), ["a = 1\r\n", "b = 2\n"]);
        assert_eq!(ps.line(2), Some("b = 2"));
        assert_eq!(ps.line(0), None);
        assert_eq!(ps.line_count(), 2);
    }

    #[test]
    fn indexed_access_mirrors_lines() {
        let ps = processed("a\nb\nc\n");
        assert_eq!(&ps[1], "b");
        assert_eq!(&ps[1..], ["b", "c"]);
        assert_eq!(ps.get(5), None);
        assert_eq!(ps.get(..2).map(<[String]>::len), Some(2));
    }

    #[test]
    fn data_marker_after_last_token_truncates() {
        let ps = processed("class A\nend\n__END__\ndata\n");
        assert_eq!(ps.logical_lines(), ["class A", "end"]);
    }

    #[test]
    fn marker_inside_code_is_kept() {
        let ps = processed("s = \"a\n__END__\nb\"\n");
        assert!(ps.valid_syntax());
        assert_eq!(ps.logical_lines(), ["s = \"a", "__END__", "b\""]);
    }

    #[test]
    fn without_tokens_marker_is_kept() {
        let ps = processed("# only a comment\n__END__\n");
        assert_eq!(ps.logical_lines(), ["# only a comment", "__END__"]);
    }

    #[test]
    fn invalid_syntax_has_no_tree() {
        let ps = processed("puts \"abc");
        assert!(!ps.valid_syntax());
        assert!(ps.ast().is_none());
        assert!(ps
            .diagnostics()
            .iter()
            .any(|d| matches!(d.level, DiagnosticLevel::Error | DiagnosticLevel::Fatal)));
    }

    #[test]
    fn warnings_keep_syntax_valid() {
        let ps = processed("if a = 1\nend\n");
        assert!(ps.valid_syntax());
        assert_eq!(ps.diagnostics().len(), 1);
    }

    #[test]
    fn checksum_is_of_raw_bytes() {
        let a = processed("puts 1\n");
        let b = processed("puts 1\n");
        let c = processed("puts 1 \n");
        assert_eq!(a.checksum(), b.checksum());
        assert_ne!(a.checksum(), c.checksum());
        assert_eq!(processed("puts \"").checksum(), &ContentHash::compute(b"puts \""));
    }

    #[test]
    fn disabled_ranges_from_comments() {
        let ps = processed("# rubocop:disable Style/Foo\nx = 1\n# rubocop:enable Style/Foo\ny = 2\n");
        let ranges = ps.disabled_line_ranges();
        assert_eq!(ranges["Style/Foo"], vec![1..=3]);
    }

    #[test]
    fn processed_source_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProcessedSource>();
    }
}
