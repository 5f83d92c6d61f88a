// Copyright (c) rubric contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use rubric_ast::{Diagnostic, DiagnosticLevel, TokenKind};

use crate::tokenizer::{tokenize, Lexed, MAX_NESTING};

fn lex(text: &str) -> (Lexed, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let lexed = tokenize(text, &mut diagnostics).expect("tokenize");
    (lexed, diagnostics)
}

fn tokenize_all(text: &str) -> Vec<(TokenKind, String)> {
    lex(text)
        .0
        .tokens
        .into_iter()
        .map(|t| (t.kind, t.value))
        .collect()
}

fn toks(expected: &[(TokenKind, &str)]) -> Vec<(TokenKind, String)> {
    expected.iter().map(|(k, v)| (*k, v.to_string())).collect()
}

use TokenKind::*;

#[test]
fn test_identifier() {
    assert_eq!(
        tokenize_all("foo bar"),
        toks(&[(TIdentifier, "foo"), (TIdentifier, "bar")])
    );
    assert_eq!(
        tokenize_all("empty? save! Foo"),
        toks(&[(TFid, "empty?"), (TFid, "save!"), (TConstant, "Foo")])
    );
}

#[test]
fn test_method_suffix_before_equals() {
    assert_eq!(
        tokenize_all("a!=b"),
        toks(&[(TIdentifier, "a"), (TNeq, "!="), (TIdentifier, "b")])
    );
    assert_eq!(
        tokenize_all("a?==b"),
        toks(&[(TFid, "a?"), (TEq, "=="), (TIdentifier, "b")])
    );
}

#[test]
fn test_variables() {
    assert_eq!(
        tokenize_all("@a @@b $c $1 $&"),
        toks(&[
            (TIvar, "@a"),
            (TCvar, "@@b"),
            (TGvar, "$c"),
            (TNthRef, "1"),
            (TBackRef, "$&"),
        ])
    );
}

#[test]
fn test_numbers() {
    assert_eq!(
        tokenize_all("0x1F 1_000 1.5e3 2r 3i"),
        toks(&[
            (TInteger, "0x1F"),
            (TInteger, "1_000"),
            (TFloat, "1.5e3"),
            (TRational, "2r"),
            (TImaginary, "3i"),
        ])
    );
}

#[test]
fn test_minus_depends_on_locals() {
    assert_eq!(
        tokenize_all("x = 1\nx -1"),
        toks(&[
            (TIdentifier, "x"),
            (TEql, "="),
            (TInteger, "1"),
            (TNl, "\n"),
            (TIdentifier, "x"),
            (TMinus, "-"),
            (TInteger, "1"),
        ])
    );

    let (lexed, diagnostics) = lex("foo -1");
    let kinds: Vec<_> = lexed.tokens.iter().map(|t| (t.kind, t.value.as_str())).collect();
    assert_eq!(kinds, vec![(TIdentifier, "foo"), (TInteger, "-1")]);
    assert_eq!(lexed.tokens[1].range.begin_pos, 4);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].level, DiagnosticLevel::Warning);
    assert!(diagnostics[0].message.starts_with("ambiguous first argument"));
}

#[test]
fn test_unary_minus_before_pow() {
    assert_eq!(
        tokenize_all("-2 ** 2"),
        toks(&[
            (TUMinusNum, "-"),
            (TInteger, "2"),
            (TPow, "**"),
            (TInteger, "2"),
        ])
    );
}

#[test]
fn test_star_prefix_warning() {
    let (lexed, diagnostics) = lex("foo *args");
    assert_eq!(lexed.tokens[1].kind, TStar);
    assert_eq!(diagnostics[0].message, "`*' interpreted as argument prefix");
}

#[test]
fn test_safe_navigation() {
    assert_eq!(
        tokenize_all("a.b&.c"),
        toks(&[
            (TIdentifier, "a"),
            (TDot, "."),
            (TIdentifier, "b"),
            (TAndDot, "&."),
            (TIdentifier, "c"),
        ])
    );
}

#[test]
fn test_interpolated_string() {
    assert_eq!(
        tokenize_all("\"a#{b}c\""),
        toks(&[
            (TStringBeg, "\""),
            (TStringContent, "a"),
            (TStringDbeg, "#{"),
            (TIdentifier, "b"),
            (TStringDend, "}"),
            (TStringContent, "c"),
            (TStringEnd, "\""),
        ])
    );
}

#[test]
fn test_string_escapes() {
    assert_eq!(
        tokenize_all(r#""a\tbA""#),
        toks(&[
            (TStringBeg, "\""),
            (TStringContent, "a\tbA"),
            (TStringEnd, "\""),
        ])
    );
    assert_eq!(
        tokenize_all(r"'it\'s \n'"),
        toks(&[
            (TStringBeg, "'"),
            (TStringContent, "it's \\n"),
            (TStringEnd, "'"),
        ])
    );
}

#[test]
fn test_symbols() {
    assert_eq!(
        tokenize_all(":foo :\"bar\" :+"),
        toks(&[
            (TSymbol, "foo"),
            (TSymbeg, ":\""),
            (TStringContent, "bar"),
            (TStringEnd, "\""),
            (TSymbol, "+"),
        ])
    );
}

#[test]
fn test_regexp_after_match_operator() {
    assert_eq!(
        tokenize_all("x =~ /ab/i"),
        toks(&[
            (TIdentifier, "x"),
            (TMatch, "=~"),
            (TRegexpBeg, "/"),
            (TStringContent, "ab"),
            (TStringEnd, "/"),
            (TRegexpOpt, "i"),
        ])
    );
}

#[test]
fn test_character_literal() {
    assert_eq!(tokenize_all("?a"), toks(&[(TCharacter, "a")]));
}

#[test]
fn test_ternary_is_not_a_label() {
    assert_eq!(
        tokenize_all("x ? y : z"),
        toks(&[
            (TIdentifier, "x"),
            (TEh, "?"),
            (TIdentifier, "y"),
            (TColon, ":"),
            (TIdentifier, "z"),
        ])
    );
    assert_eq!(
        tokenize_all("foo(a: 1)"),
        toks(&[
            (TIdentifier, "foo"),
            (TLParen2, "("),
            (TLabel, "a"),
            (TInteger, "1"),
            (TRParen, ")"),
        ])
    );
}

#[test]
fn test_modifier_keywords() {
    assert_eq!(
        tokenize_all("foo if bar"),
        toks(&[(TIdentifier, "foo"), (KIfMod, "if"), (TIdentifier, "bar")])
    );
    assert_eq!(
        tokenize_all("while x do end"),
        toks(&[
            (KWhile, "while"),
            (TIdentifier, "x"),
            (KDoCond, "do"),
            (KEnd, "end"),
        ])
    );
}

#[test]
fn test_singleton_def() {
    assert_eq!(
        tokenize_all("def self.foo; end"),
        toks(&[
            (KDef, "def"),
            (KSelf, "self"),
            (TDot, "."),
            (TIdentifier, "foo"),
            (TSemi, ";"),
            (KEnd, "end"),
        ])
    );
}

#[test]
fn test_braces() {
    assert_eq!(tokenize_all("foo { 1 }")[1].0, TLCurly);
    assert_eq!(tokenize_all("x = { a: 1 }")[2].0, TLBrace);
    assert_eq!(
        tokenize_all("-> { 1 }"),
        toks(&[
            (TLambda, "->"),
            (TLambeg, "{"),
            (TInteger, "1"),
            (TRCurly, "}"),
        ])
    );
}

#[test]
fn test_block_params() {
    assert_eq!(
        tokenize_all("foo { |a| a }"),
        toks(&[
            (TIdentifier, "foo"),
            (TLCurly, "{"),
            (TPipe, "|"),
            (TIdentifier, "a"),
            (TPipe, "|"),
            (TIdentifier, "a"),
            (TRCurly, "}"),
        ])
    );
}

#[test]
fn test_newlines_inside_parens_are_ignored() {
    assert_eq!(
        tokenize_all("foo(\n1,\n2\n)"),
        toks(&[
            (TIdentifier, "foo"),
            (TLParen2, "("),
            (TInteger, "1"),
            (TComma, ","),
            (TInteger, "2"),
            (TRParen, ")"),
        ])
    );
}

#[test]
fn test_leading_dot_continues_line() {
    assert_eq!(
        tokenize_all("a\n  # note\n  .b"),
        toks(&[(TIdentifier, "a"), (TDot, "."), (TIdentifier, "b")])
    );
}

#[test]
fn test_comments_and_documents() {
    let (lexed, _) = lex("a # hi\n=begin\nx\n=end\nb");
    let texts: Vec<_> = lexed.comments.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["# hi", "=begin\nx\n=end\n"]);
    assert_eq!(lexed.comments[1].range.line, 2);
    let kinds: Vec<_> = lexed.tokens.iter().map(|t| t.kind).collect();
    assert_eq!(kinds, vec![TIdentifier, TNl, TIdentifier]);
}

#[test]
fn test_data_marker_stops_tokenizing() {
    assert_eq!(
        tokenize_all("a\n__END__\nb c d"),
        toks(&[(TIdentifier, "a"), (TNl, "\n")])
    );
}

#[test]
fn test_unterminated_string_aborts() {
    let mut diagnostics = Vec::new();
    let err = tokenize("\"abc", &mut diagnostics).unwrap_err();
    assert_eq!(err.message, "unterminated string meets end of file");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].level, DiagnosticLevel::Fatal);
    assert_eq!(diagnostics[0].location.begin_pos, 0);
}

#[test]
fn test_unterminated_document_aborts() {
    let mut diagnostics = Vec::new();
    let err = tokenize("=begin\nnever closed\n", &mut diagnostics).unwrap_err();
    assert_eq!(err.message, "embedded document meets end of file");
}

#[test]
fn test_deep_brackets_abort() {
    let text = format!("{}1{}", "[".repeat(1000), "]".repeat(1000));
    let mut diagnostics = Vec::new();
    let err = tokenize(&text, &mut diagnostics).unwrap_err();
    assert!(err.message.starts_with("nesting too deep"));
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].level, DiagnosticLevel::Fatal);
    assert_eq!(diagnostics[0].location.begin_pos, MAX_NESTING);
}

#[test]
fn test_deep_blocks_abort() {
    let text = "if a\n".repeat(MAX_NESTING + 1) + &"end\n".repeat(MAX_NESTING + 1);
    let mut diagnostics = Vec::new();
    let err = tokenize(&text, &mut diagnostics).unwrap_err();
    assert!(err.message.starts_with("nesting too deep"));
}

#[test]
fn test_nesting_limit_counts_open_levels_only() {
    let sequential = "[[1]]\nif a\nend\n".repeat(MAX_NESTING * 2);
    assert!(lex(&sequential).1.is_empty());
    let endless = "def x = 1\n".repeat(MAX_NESTING * 2);
    assert!(lex(&endless).1.is_empty());
    let at_limit = format!("{}1{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
    assert!(lex(&at_limit).1.is_empty());
}

#[test]
fn test_unknown_character_keeps_going() {
    let (lexed, diagnostics) = lex("a \u{7f} b");
    assert_eq!(lexed.tokens.len(), 2);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].level, DiagnosticLevel::Error);
    assert!(diagnostics[0].message.starts_with("unexpected character"));
}

#[test]
fn test_positions() {
    let (lexed, _) = lex("a\n  bb");
    let bb = &lexed.tokens[2];
    assert_eq!((bb.range.begin_pos, bb.range.end_pos), (4, 6));
    assert_eq!((bb.range.line, bb.range.column), (2, 2));
}
