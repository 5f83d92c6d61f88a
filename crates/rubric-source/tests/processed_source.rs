//! End-to-end behavior of ProcessedSource: parse, inspect, walk.

use std::sync::Arc;

use rubric_ast::{
    walk, walk_children, DiagnosticLevel, DiagnosticSink, Grammar, Node, NodeType, ParseOutput,
    RubyVersion, SourceBuffer, SyntaxAbort, Visitor,
};
use rubric_source::{
    Convergence, DisabledLineRanges, DisabledRangeResolver, CommentSource, GrammarRegistry,
    ParseError, ParserAdapter, PassVerdict, ProcessedSource, SourceError,
};

fn processed(source: &str) -> ProcessedSource {
    ProcessedSource::new(source, RubyVersion::V3_3, None).unwrap()
}

/// Records every dispatched node it has a hook for, then keeps walking.
#[derive(Default)]
struct Recorder {
    seen: Vec<(NodeType, Option<String>)>,
}

impl Recorder {
    fn record(&mut self, node: &Node) {
        let name = match node.node_type() {
            NodeType::Send | NodeType::Lvar => node.symbol(1).or(node.symbol(0)),
            NodeType::Sym => node.symbol(0),
            _ => None,
        };
        self.seen.push((node.node_type(), name.map(str::to_string)));
        walk_children(self, node);
    }
}

impl Visitor for Recorder {
    fn on_if(&mut self, node: &Node) {
        self.record(node);
    }

    fn on_send(&mut self, node: &Node) {
        self.record(node);
    }

    fn on_lvar(&mut self, node: &Node) {
        self.record(node);
    }

    fn on_sym(&mut self, node: &Node) {
        self.record(node);
    }
}

fn entry(node_type: NodeType, name: Option<&str>) -> (NodeType, Option<String>) {
    (node_type, name.map(str::to_string))
}

mod scenarios {
    use super::*;

    #[test]
    fn conditional_walks_condition_then_branch() {
        let source = processed("if foo then bar end");
        let ast = source.ast().unwrap();
        assert_eq!(ast.node_type(), NodeType::If);
        assert_eq!(ast.to_string(), "(if (send nil :foo) (send nil :bar) nil)");

        let mut recorder = Recorder::default();
        walk(&mut recorder, source.ast());
        assert_eq!(
            recorder.seen,
            vec![
                entry(NodeType::If, None),
                entry(NodeType::Send, Some("foo")),
                entry(NodeType::Send, Some("bar")),
            ]
        );
    }

    #[test]
    fn unterminated_string_is_invalid() {
        let source = processed("puts \"abc\nputs 1\n");
        assert!(!source.valid_syntax());
        assert!(source.ast().is_none());
        assert!(matches!(source.parse_error(), Some(ParseError::Syntax(_))));
        assert!(source
            .diagnostics()
            .iter()
            .any(|d| matches!(d.level, DiagnosticLevel::Error | DiagnosticLevel::Fatal)));
    }

    #[test]
    fn call_walk_skips_method_name() {
        let source = processed("a.b(c)");
        let mut recorder = Recorder::default();
        walk(&mut recorder, source.ast());
        assert_eq!(
            recorder.seen,
            vec![
                entry(NodeType::Send, Some("b")),
                entry(NodeType::Send, Some("a")),
                entry(NodeType::Send, Some("c")),
            ]
        );
        assert!(recorder.seen.iter().all(|(t, _)| *t != NodeType::Sym));
    }

    #[test]
    fn identical_passes_converge() {
        let mut convergence = Convergence::new();
        let first = processed("def foo\n  1\nend\n");
        let second = processed("def foo\n  1\nend\n");
        assert_eq!(first.checksum(), second.checksum());
        assert_eq!(convergence.observe(&first, false), PassVerdict::Progress);
        assert_eq!(convergence.observe(&second, false), PassVerdict::FixedPoint);
    }

    #[test]
    fn data_section_is_not_source() {
        let source = processed("class Foo\n  def bar; end\nend\n__END__\nraw data\nmore\n");
        assert!(source.valid_syntax());
        assert_eq!(source.logical_lines(), ["class Foo", "  def bar; end", "end"]);
        assert_eq!(source.line_count(), 3);
        assert_eq!(source.raw_lines().len(), 6);
    }
}

mod traversal {
    use super::*;

    /// Overrides `def` without recursing.
    #[derive(Default)]
    struct Shallow(Recorder);

    impl Visitor for Shallow {
        fn on_def(&mut self, _node: &Node) {}

        fn on_send(&mut self, node: &Node) {
            self.0.seen.push(entry(NodeType::Send, node.symbol(1)));
            walk_children(self, node);
        }
    }

    #[test]
    fn override_without_recursion_stops_descent() {
        let source = processed("def foo\n  bar\nend\nbaz\n");
        let mut shallow = Shallow::default();
        walk(&mut shallow, source.ast());
        assert_eq!(shallow.0.seen, vec![entry(NodeType::Send, Some("baz"))]);
    }

    #[test]
    fn walking_nothing_is_a_no_op() {
        let source = processed("puts \"");
        let mut recorder = Recorder::default();
        walk(&mut recorder, source.ast());
        assert!(recorder.seen.is_empty());
    }

    #[test]
    fn locals_become_lvar() {
        let source = processed("x = 1\nx.succ\n");
        let mut recorder = Recorder::default();
        walk(&mut recorder, source.ast());
        assert_eq!(
            recorder.seen,
            vec![entry(NodeType::Send, Some("succ")), entry(NodeType::Lvar, Some("x"))]
        );
    }
}

mod validity {
    use super::*;

    #[test]
    fn warnings_do_not_invalidate() {
        let source = processed("h = { a: 1, a: 2 }\n");
        assert!(source.valid_syntax());
        assert_eq!(source.diagnostics().len(), 1);
        assert_eq!(source.diagnostics()[0].level, DiagnosticLevel::Warning);
    }

    #[test]
    fn error_diagnostics_invalidate() {
        let source = processed("def foo(\n");
        assert!(!source.valid_syntax());
        assert!(source.parse_error().is_some());
    }

    #[test]
    fn several_diagnostics_keep_source_order() {
        let source = processed("x = 1 \u{1}\nif b = 2\nend\n");
        let found: Vec<(DiagnosticLevel, usize)> = source
            .diagnostics()
            .iter()
            .map(|d| (d.level, d.location.begin_pos))
            .collect();
        assert_eq!(found, vec![(DiagnosticLevel::Error, 6), (DiagnosticLevel::Warning, 11)]);
        assert!(!source.valid_syntax());
        assert!(source.ast().is_some());
        assert!(source.parse_error().is_none());
    }

    #[test]
    fn deep_nesting_is_captured_not_fatal_to_the_process() {
        let deep = format!("{}1{}", "[".repeat(1000), "]".repeat(1000));
        let source = processed(&deep);
        assert!(!source.valid_syntax());
        assert!(source.ast().is_none());
        assert!(matches!(source.parse_error(), Some(ParseError::Syntax(_))));
        assert_eq!(source.diagnostics()[0].level, DiagnosticLevel::Fatal);

        let shallow = format!("{}1{}", "[".repeat(30), "]".repeat(30));
        assert!(processed(&shallow).valid_syntax());
    }

    #[test]
    fn well_formed_round_trip() {
        let source = processed("module M\n  CONST = [1, 2.5, :sym, \"s\"]\nend\n");
        assert!(source.valid_syntax());
        assert!(source.ast().is_some());
        assert!(source.diagnostics().is_empty());
    }

    #[test]
    fn encoding_failure_is_distinct_from_syntax() {
        let source =
            ProcessedSource::new(b"# encoding: us-ascii\nputs '\xE2\x9C\x93'\n".to_vec(), RubyVersion::V3_3, None)
                .unwrap();
        assert!(!source.valid_syntax());
        assert!(source.ast().is_none());
        assert!(source.parse_error().is_some_and(ParseError::is_encoding));
        assert!(source.diagnostics().is_empty());
        assert_eq!(source.line(1), Some("# encoding: us-ascii"));
    }

    #[test]
    fn version_gated_syntax() {
        let new = ProcessedSource::new("def foo = 1\n", RubyVersion::V3_0, None).unwrap();
        let old = ProcessedSource::new("def foo = 1\n", RubyVersion::V2_7, None).unwrap();
        assert!(new.valid_syntax());
        assert!(!old.valid_syntax());
    }
}

mod configuration {
    use super::*;

    struct Empty(RubyVersion);

    impl Grammar for Empty {
        fn version(&self) -> RubyVersion {
            self.0
        }

        fn tokenize(&self, _: &SourceBuffer, _: &mut dyn DiagnosticSink) -> Result<ParseOutput, SyntaxAbort> {
            Ok(ParseOutput {
                ast: Node::new(NodeType::Nil, Vec::new(), Default::default()),
                comments: Vec::new(),
                tokens: Vec::new(),
            })
        }
    }

    #[test]
    fn unsupported_version_is_raised() {
        let err = ProcessedSource::new("1", RubyVersion::new(1, 9), None).unwrap_err();
        assert!(matches!(err, SourceError::UnsupportedVersion { .. }));
        assert!(err.to_string().starts_with("unsupported Ruby version 1.9"));
    }

    #[test]
    fn injected_grammar_serves_new_version() {
        let future = RubyVersion::new(4, 0);
        let mut registry = GrammarRegistry::builtin();
        registry.register(Arc::new(Empty(future)));
        let adapter = ParserAdapter::with_registry(&registry, future).unwrap();
        let source = ProcessedSource::from_adapter(&adapter, "anything at all", Some("x.rb"));
        assert_eq!(source.version(), future);
        assert_eq!(source.path(), "x.rb");
        assert_eq!(source.ast().map(Node::node_type), Some(NodeType::Nil));
    }

    struct EveryLine;

    impl DisabledRangeResolver for EveryLine {
        fn disabled_line_ranges(&self, source: &dyn CommentSource) -> DisabledLineRanges {
            let mut ranges = DisabledLineRanges::new();
            ranges.insert("all".to_string(), vec![1..=source.lines().len()]);
            ranges
        }
    }

    #[test]
    fn injected_resolver_sees_lines() {
        let source = processed("a\nb\n__END__\nc\n");
        let ranges = source.disabled_line_ranges_with(&EveryLine);
        assert_eq!(ranges["all"], vec![1..=2]);
        assert!(source.disabled_line_ranges().is_empty());
    }

    #[test]
    fn file_path_names_the_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thing.rb");
        std::fs::write(&path, "# rubocop:disable Lint/Foo\nfoo\n").unwrap();

        let source = ProcessedSource::from_file(&path, RubyVersion::V3_3).unwrap();
        assert!(source.path().ends_with("thing.rb"));
        assert!(source.valid_syntax());
        assert_eq!(source.disabled_line_ranges()["Lint/Foo"], vec![1..=2]);

        let missing = ProcessedSource::from_file(dir.path().join("missing.rb"), RubyVersion::V3_3);
        assert!(matches!(missing, Err(SourceError::Io { .. })));
    }
}

mod serialization {
    use super::*;

    #[test]
    fn tokens_and_checksum_serialize() {
        let source = processed("foo(1)\n");
        let json = serde_json::to_value(&source.tokens()[0]).unwrap();
        assert_eq!(json["type"], "tIDENTIFIER");
        assert_eq!(json["text"], "foo");
        let checksum = serde_json::to_value(source.checksum()).unwrap();
        assert_eq!(checksum.as_str().map(str::len), Some(64));
    }
}
