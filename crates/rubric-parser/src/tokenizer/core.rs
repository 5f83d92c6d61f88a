// Copyright (c) rubric contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The Ruby tokenizer.
//!
//! Ruby cannot be tokenized without context: `foo -1` and `foo - 1`, `x [1]`
//! and `x[1]`, `a ? b : c` and `?a` all depend on what came before and on
//! surrounding whitespace. [`TokState`] tracks that context with a small
//! state machine ([`LexState`]), a stack of open brackets, and a stack of
//! literal modes for strings with `#{}` interpolation.

use std::collections::HashSet;

use rubric_ast::{Comment, Diagnostic, SourceRange, SyntaxAbort, TokenKind};
use rubric_core::LineIndex;

/// Deepest bracket and `end`-block nesting accepted. Deeper input is a fatal
/// diagnostic; the grammar and the tree passes recurse once per level.
pub const MAX_NESTING: usize = 128;

/// A token as the grammar sees it.
///
/// `value` is the token's semantic text: the unescaped content of a string
/// segment, a symbol's name without the colon, a label without its colon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexTok {
    pub kind: TokenKind,
    pub value: String,
    pub range: SourceRange,
}

/// Tokens and comments of a source buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lexed {
    pub tokens: Vec<LexTok>,
    pub comments: Vec<Comment>,
}

/// What the next token may be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    /// An expression begins here.
    Beg,
    /// After `return`/`break`/`next`/`rescue`: an expression may begin, but
    /// a newline still terminates and `if` is a modifier.
    Mid,
    /// After a name that may take command arguments.
    Arg,
    /// After a complete value.
    End,
    /// After `.`/`&.`/`::`: a method name follows.
    Dot,
    /// A method name is being defined, aliased or undefined.
    Fname,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LitKind {
    Str,
    XStr,
    Sym,
    Regexp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Literal {
    kind: LitKind,
    term: u8,
    interp: bool,
    start: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Literal(Literal),
    Interp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bracket {
    Paren,
    Square,
    Brace,
    Interp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameCtx {
    Def,
    Alias(u8),
    Undef,
}

/// Parameter lists whose names become known locals, keyed by bracket depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Params {
    None,
    Def(usize),
    Block(usize),
    Lambda(usize),
}

const OPERATOR_NAMES: &[(&str, TokenKind)] = &[
    ("[]=", TokenKind::TAset),
    ("[]", TokenKind::TAref),
    ("<=>", TokenKind::TCmp),
    ("===", TokenKind::TEqq),
    ("==", TokenKind::TEq),
    ("=~", TokenKind::TMatch),
    ("!=", TokenKind::TNeq),
    ("!~", TokenKind::TNMatch),
    ("**", TokenKind::TPow),
    ("+@", TokenKind::TUPlus),
    ("-@", TokenKind::TUMinus),
    ("<=", TokenKind::TLeq),
    (">=", TokenKind::TGeq),
    ("<<", TokenKind::TLShft),
    (">>", TokenKind::TRShft),
    ("!", TokenKind::TBang),
    ("~", TokenKind::TTilde),
    ("+", TokenKind::TPlus),
    ("-", TokenKind::TMinus),
    ("*", TokenKind::TStar2),
    ("/", TokenKind::TDivide),
    ("%", TokenKind::TPercent),
    ("<", TokenKind::TLt),
    (">", TokenKind::TGt),
    ("&", TokenKind::TAmper2),
    ("|", TokenKind::TPipe),
    ("^", TokenKind::TCaret),
    ("`", TokenKind::TIdentifier),
];

const OP_ASSIGNMENTS: &[&str] = &[
    "**=", "||=", "&&=", "<<=", ">>=", "+=", "-=", "*=", "/=", "%=", "|=", "&=", "^=",
];

fn keyword(word: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match word {
        "alias" => KAlias,
        "and" => KAnd,
        "begin" => KBegin,
        "BEGIN" => KlBegin,
        "break" => KBreak,
        "case" => KCase,
        "class" => KClass,
        "def" => KDef,
        "defined?" => KDefined,
        "do" => KDo,
        "else" => KElse,
        "elsif" => KElsif,
        "end" => KEnd,
        "END" => KlEnd,
        "ensure" => KEnsure,
        "false" => KFalse,
        "for" => KFor,
        "if" => KIf,
        "in" => KIn,
        "module" => KModule,
        "next" => KNext,
        "nil" => KNil,
        "not" => KNot,
        "or" => KOr,
        "redo" => KRedo,
        "rescue" => KRescue,
        "retry" => KRetry,
        "return" => KReturn,
        "self" => KSelf,
        "super" => KSuper,
        "then" => KThen,
        "true" => KTrue,
        "undef" => KUndef,
        "unless" => KUnless,
        "until" => KUntil,
        "when" => KWhen,
        "while" => KWhile,
        "yield" => KYield,
        "__FILE__" => KFile,
        "__LINE__" => KLine,
        "__ENCODING__" => KEncoding,
        _ => return None,
    })
}

fn is_ident_start(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphabetic() || b >= 0x80
}

fn is_ident_char(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphanumeric() || b >= 0x80
}

fn is_space(b: Option<u8>) -> bool {
    matches!(b, None | Some(b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c))
}

/// Tokenizer state over one source buffer.
pub struct TokState<'t> {
    text: &'t str,
    bytes: &'t [u8],
    pos: usize,
    lines: LineIndex,
    state: LexState,
    space_seen: bool,
    modes: Vec<Mode>,
    brackets: Vec<Bracket>,
    name_ctx: Option<NameCtx>,
    params: Params,
    cond_at: Option<usize>,
    lambda_at: Option<usize>,
    ternaries: Vec<usize>,
    // Open `end`-terminated constructs. Endless `def` has no `end`, so `def`
    // is not counted and its `end` may undercount.
    blocks: usize,
    // Names assigned or bound as parameters so far. Only steers the
    // `x -1` / `x [1]` / `x /2` decisions; scoping is resolved after parsing.
    locals: HashSet<String>,
    tokens: Vec<LexTok>,
    comments: Vec<Comment>,
    diagnostics: Vec<Diagnostic>,
    done: bool,
}

impl<'t> TokState<'t> {
    pub fn new(text: &'t str) -> Self {
        TokState {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            lines: LineIndex::new(text),
            state: LexState::Beg,
            space_seen: false,
            modes: Vec::new(),
            brackets: Vec::new(),
            name_ctx: None,
            params: Params::None,
            cond_at: None,
            lambda_at: None,
            ternaries: Vec::new(),
            blocks: 0,
            locals: HashSet::new(),
            tokens: Vec::new(),
            comments: Vec::new(),
            diagnostics: Vec::new(),
            done: false,
        }
    }

    /// Tokenize the whole buffer.
    ///
    /// Diagnostics are appended to `diagnostics` in source order whether or
    /// not tokenization succeeds.
    pub fn run(mut self, diagnostics: &mut Vec<Diagnostic>) -> Result<Lexed, SyntaxAbort> {
        let result = self.lex_all();
        diagnostics.append(&mut self.diagnostics);
        result.map(|()| Lexed {
            tokens: self.tokens,
            comments: self.comments,
        })
    }

    fn lex_all(&mut self) -> Result<(), SyntaxAbort> {
        while !self.done {
            match self.modes.last().copied() {
                Some(Mode::Literal(lit)) => self.lex_literal(lit)?,
                _ => {
                    if !self.lex_code()? {
                        break;
                    }
                }
            }
            if self.depth() + self.blocks > MAX_NESTING {
                let at = self.tokens.last().map_or(self.pos, |t| t.range.begin_pos);
                let d = Diagnostic::fatal(
                    format!("nesting too deep (more than {} levels)", MAX_NESTING),
                    self.range(at, self.pos),
                );
                return Err(self.abort(d));
            }
        }
        if self.modes.is_empty() {
            return Ok(());
        }
        let start = self
            .modes
            .iter()
            .rev()
            .find_map(|m| match m {
                Mode::Literal(lit) => Some(lit.start),
                Mode::Interp => None,
            })
            .unwrap_or(self.pos);
        let d = Diagnostic::fatal(
            "unterminated string meets end of file",
            self.range(start, self.pos),
        );
        Err(self.abort(d))
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn cur(&self) -> Option<u8> {
        self.peek(0)
    }

    fn rest(&self) -> &'t str {
        &self.text[self.pos..]
    }

    fn cur_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn range(&self, begin: usize, end: usize) -> SourceRange {
        let (line, column) = self.lines.line_col(begin);
        SourceRange::new(begin, end, line, column)
    }

    fn depth(&self) -> usize {
        self.brackets.len()
    }

    fn is_beg(&self) -> bool {
        matches!(self.state, LexState::Beg | LexState::Mid)
    }

    /// A spaced argument start: `foo -1`, `foo *args`, `foo /re/`.
    fn spcarg_after(&self, len: usize) -> bool {
        self.state == LexState::Arg && self.space_seen && !is_space(self.peek(len))
    }

    fn prev_kind(&self) -> Option<TokenKind> {
        self.tokens.last().map(|t| t.kind)
    }

    fn at_line_start(&self) -> bool {
        self.pos == 0 || self.bytes[self.pos - 1] == b'\n'
    }

    fn emit(&mut self, kind: TokenKind, value: impl Into<String>, begin: usize) {
        use TokenKind::*;
        match kind {
            KClass | KModule | KBegin | KCase | KWhile | KUntil | KIf | KUnless | KFor | KDo
            | KDoLambda => self.blocks += 1,
            KEnd => self.blocks = self.blocks.saturating_sub(1),
            _ => {}
        }
        let range = self.range(begin, self.pos);
        self.tokens.push(LexTok {
            kind,
            value: value.into(),
            range,
        });
        self.space_seen = false;
    }

    /// Emit an operator of `len` bytes; an expression begins after it.
    fn op(&mut self, kind: TokenKind, len: usize) {
        let begin = self.pos;
        self.pos += len;
        let text = &self.text[begin..self.pos];
        self.emit(kind, text, begin);
        self.state = LexState::Beg;
    }

    fn op_asgn(&mut self, operator: &str) {
        let begin = self.pos;
        self.pos += operator.len() + 1;
        self.emit(TokenKind::TOpAsgn, operator, begin);
        self.state = LexState::Beg;
    }

    fn warn(&mut self, message: &str, begin: usize, len: usize) {
        let range = self.range(begin, begin + len);
        self.diagnostics.push(Diagnostic::warning(message, range));
    }

    fn abort(&mut self, diagnostic: Diagnostic) -> SyntaxAbort {
        let abort = SyntaxAbort::new(diagnostic.message.clone(), Some(diagnostic.location));
        self.diagnostics.push(diagnostic);
        abort
    }

    fn after_terminator(&mut self) {
        self.state = LexState::Beg;
        let depth = self.depth();
        if self.cond_at == Some(depth) {
            self.cond_at = None;
        }
        if self.params == Params::Def(depth) {
            self.params = Params::None;
        }
        if self.name_ctx == Some(NameCtx::Undef) {
            self.name_ctx = None;
        }
    }

    /// A method name was lexed in [`LexState::Fname`].
    fn finish_name(&mut self) {
        match self.name_ctx {
            Some(NameCtx::Def) => {
                self.name_ctx = None;
                self.params = Params::Def(self.depth());
                self.state = LexState::Arg;
            }
            Some(NameCtx::Alias(0)) => {
                self.name_ctx = Some(NameCtx::Alias(1));
                self.state = LexState::Fname;
            }
            Some(NameCtx::Alias(_)) => {
                self.name_ctx = None;
                self.state = LexState::End;
            }
            Some(NameCtx::Undef) => self.state = LexState::End,
            None => self.state = LexState::Arg,
        }
    }

    fn assignment_ahead(&self) -> bool {
        let rest = self.rest().trim_start_matches([' ', '\t']);
        if let Some(after) = rest.strip_prefix('=') {
            return !matches!(after.as_bytes().first(), Some(b'=' | b'~' | b'>'));
        }
        OP_ASSIGNMENTS.iter().any(|op| rest.starts_with(op))
    }

    // ------------------------------------------------------------------
    // Code
    // ------------------------------------------------------------------

    fn lex_code(&mut self) -> Result<bool, SyntaxAbort> {
        if self.at_line_start() {
            if self.at_data_marker() {
                self.done = true;
                return Ok(false);
            }
            if self.at_doc_begin() {
                self.lex_embedded_doc()?;
                return Ok(true);
            }
        }
        let Some(c) = self.cur() else {
            return Ok(false);
        };
        match c {
            b' ' | b'\t' | b'\r' | 0x0b | 0x0c => {
                self.pos += 1;
                self.space_seen = true;
            }
            b'\\' if self.peek(1) == Some(b'\n') => {
                self.pos += 2;
                self.space_seen = true;
            }
            b'\\' if self.peek(1) == Some(b'\r') && self.peek(2) == Some(b'\n') => {
                self.pos += 3;
                self.space_seen = true;
            }
            b'#' => self.lex_comment(),
            b'\n' => self.lex_newline(),
            b'0'..=b'9' => {
                let begin = self.pos;
                self.lex_number(begin, false);
            }
            b'"' => self.begin_literal(LitKind::Str, b'"', true, TokenKind::TStringBeg, 1),
            b'\'' => self.begin_literal(LitKind::Str, b'\'', false, TokenKind::TStringBeg, 1),
            b'`' if self.state == LexState::Fname => {
                self.lex_operator_name();
            }
            b'`' => self.begin_literal(LitKind::XStr, b'`', true, TokenKind::TXStringBeg, 1),
            b'@' => self.lex_ivar(),
            b'$' => self.lex_gvar(),
            c if is_ident_start(c) => self.lex_identifier(),
            _ if self.state == LexState::Fname && self.lex_operator_name() => {}
            _ => self.lex_punct(),
        }
        Ok(true)
    }

    fn at_data_marker(&self) -> bool {
        match self.rest().strip_prefix("__END__") {
            Some(after) => after.is_empty() || after.starts_with('\n') || after.starts_with("\r\n"),
            None => false,
        }
    }

    fn at_doc_begin(&self) -> bool {
        self.rest().starts_with("=begin") && is_space(self.peek(6))
    }

    fn lex_embedded_doc(&mut self) -> Result<(), SyntaxAbort> {
        let begin = self.pos;
        let mut search = self.pos;
        loop {
            let Some(offset) = self.text[search..].find('\n') else {
                self.pos = self.text.len();
                let d = Diagnostic::fatal(
                    "embedded document meets end of file",
                    self.range(begin, self.pos),
                );
                return Err(self.abort(d));
            };
            let line_start = search + offset + 1;
            let line = &self.text[line_start..];
            if line.starts_with("=end") && is_space(line.as_bytes().get(4).copied()) {
                let end = line.find('\n').map_or(self.text.len(), |o| line_start + o + 1);
                self.pos = end;
                let range = self.range(begin, end);
                self.comments.push(Comment::new(&self.text[begin..end], range));
                return Ok(());
            }
            search = line_start;
        }
    }

    fn lex_comment(&mut self) {
        let begin = self.pos;
        let end = self.rest().find('\n').map_or(self.text.len(), |o| begin + o);
        self.pos = end;
        let range = self.range(begin, end);
        let text = self.text[begin..end].trim_end_matches('\r');
        self.comments.push(Comment::new(text, range));
    }

    fn newline_significant(&self) -> bool {
        !matches!(
            self.state,
            LexState::Beg | LexState::Dot | LexState::Fname
        ) && !matches!(
            self.brackets.last(),
            Some(Bracket::Paren | Bracket::Square)
        )
    }

    /// The next code line starts with `.meth` or `&.meth`.
    fn continues_with_dot(&self) -> bool {
        let mut i = self.pos;
        let bytes = self.bytes;
        loop {
            while matches!(bytes.get(i), Some(b' ' | b'\t' | b'\r')) {
                i += 1;
            }
            match bytes.get(i) {
                Some(b'\n') => i += 1,
                Some(b'#') => match memchr::memchr(b'\n', &bytes[i..]) {
                    Some(o) => i += o + 1,
                    None => return false,
                },
                _ => break,
            }
        }
        match (bytes.get(i), bytes.get(i + 1)) {
            (Some(b'.'), next) => next != Some(&b'.'),
            (Some(b'&'), Some(b'.')) => true,
            _ => false,
        }
    }

    fn lex_newline(&mut self) {
        let begin = self.pos;
        self.pos += 1;
        if self.newline_significant() && !self.continues_with_dot() {
            self.emit(TokenKind::TNl, "\n", begin);
            self.after_terminator();
        } else {
            self.space_seen = true;
        }
    }

    fn lex_number(&mut self, begin: usize, negative: bool) {
        let start = self.pos;
        let mut kind = TokenKind::TInteger;
        let digits = |s: &mut Self, pred: fn(u8) -> bool| {
            while matches!(s.cur(), Some(b) if pred(b) || b == b'_') {
                s.pos += 1;
            }
        };
        if self.cur() == Some(b'0')
            && matches!(
                self.peek(1),
                Some(b'x' | b'X' | b'b' | b'B' | b'o' | b'O' | b'd' | b'D')
            )
        {
            self.pos += 2;
            digits(self, |b| b.is_ascii_hexdigit());
        } else {
            digits(self, |b| b.is_ascii_digit());
            if self.cur() == Some(b'.') && matches!(self.peek(1), Some(b) if b.is_ascii_digit()) {
                self.pos += 1;
                digits(self, |b| b.is_ascii_digit());
                kind = TokenKind::TFloat;
            }
            if matches!(self.cur(), Some(b'e' | b'E')) {
                let exp_digit = match self.peek(1) {
                    Some(b'+' | b'-') => matches!(self.peek(2), Some(b) if b.is_ascii_digit()).then_some(2),
                    Some(b) if b.is_ascii_digit() => Some(1),
                    _ => None,
                };
                if let Some(skip) = exp_digit {
                    self.pos += skip;
                    digits(self, |b| b.is_ascii_digit());
                    kind = TokenKind::TFloat;
                }
            }
        }
        let suffix = |s: &Self, c: u8| s.cur() == Some(c) && !matches!(s.peek(1), Some(b) if is_ident_char(b) && b != b'i');
        if suffix(self, b'r') {
            self.pos += 1;
            kind = TokenKind::TRational;
        }
        if self.cur() == Some(b'i') && !matches!(self.peek(1), Some(b) if is_ident_char(b)) {
            self.pos += 1;
            kind = TokenKind::TImaginary;
        }
        let text = &self.text[start..self.pos];
        let value = if negative {
            format!("-{}", text)
        } else {
            text.to_string()
        };
        self.emit(kind, value, begin);
        self.state = LexState::End;
    }

    /// Whether the number starting at `start` is followed by `**`.
    fn number_followed_by_pow(&self, start: usize) -> bool {
        let mut i = start;
        while let Some(&b) = self.bytes.get(i) {
            let fraction = b == b'.' && matches!(self.bytes.get(i + 1), Some(d) if d.is_ascii_digit());
            if b.is_ascii_alphanumeric() || b == b'_' || fraction {
                i += 1;
            } else {
                break;
            }
        }
        while matches!(self.bytes.get(i), Some(b' ' | b'\t')) {
            i += 1;
        }
        self.text[i..].starts_with("**")
    }

    fn lex_ivar(&mut self) {
        let begin = self.pos;
        let (kind, sigil) = if self.peek(1) == Some(b'@') {
            (TokenKind::TCvar, 2)
        } else {
            (TokenKind::TIvar, 1)
        };
        if !matches!(self.peek(sigil), Some(b) if is_ident_start(b)) {
            self.pos += sigil;
            let range = self.range(begin, self.pos);
            let what = if sigil == 2 { "a class" } else { "an instance" };
            self.diagnostics.push(Diagnostic::error(
                format!(
                    "`{}' without identifiers is not allowed as {} variable name",
                    &self.text[begin..self.pos],
                    what
                ),
                range,
            ));
            return;
        }
        self.pos += sigil;
        self.skip_ident_chars();
        let text = &self.text[begin..self.pos];
        let was_fname = self.state == LexState::Fname;
        self.emit(kind, text, begin);
        if was_fname {
            self.finish_name();
        } else {
            self.state = LexState::End;
        }
    }

    fn lex_gvar(&mut self) {
        let begin = self.pos;
        let kind = match self.peek(1) {
            Some(b) if is_ident_start(b) => {
                self.pos += 1;
                self.skip_ident_chars();
                TokenKind::TGvar
            }
            Some(b'1'..=b'9') => {
                self.pos += 1;
                while matches!(self.cur(), Some(b) if b.is_ascii_digit()) {
                    self.pos += 1;
                }
                TokenKind::TNthRef
            }
            Some(b'&' | b'`' | b'\'' | b'+') => {
                self.pos += 2;
                TokenKind::TBackRef
            }
            Some(b'-') if matches!(self.peek(2), Some(b) if b.is_ascii_alphanumeric() || b == b'_') => {
                self.pos += 3;
                TokenKind::TGvar
            }
            Some(
                b'~' | b'*' | b'$' | b'?' | b'!' | b'@' | b'/' | b'\\' | b';' | b',' | b'.'
                | b'=' | b':' | b'<' | b'>' | b'"' | b'0',
            ) => {
                self.pos += 2;
                TokenKind::TGvar
            }
            _ => {
                self.pos += 1;
                let range = self.range(begin, self.pos);
                self.diagnostics.push(Diagnostic::error(
                    "`$' without identifiers is not allowed as a global variable name",
                    range,
                ));
                return;
            }
        };
        let text = &self.text[begin..self.pos];
        let value = if kind == TokenKind::TNthRef {
            &text[1..]
        } else {
            text
        };
        let was_fname = self.state == LexState::Fname;
        self.emit(kind, value, begin);
        if was_fname {
            self.finish_name();
        } else {
            self.state = LexState::End;
        }
    }

    fn skip_ident_chars(&mut self) {
        while let Some(b) = self.cur() {
            if b >= 0x80 {
                self.pos += self.cur_char().map_or(1, char::len_utf8);
            } else if is_ident_char(b) {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn classify_name(name: &str, fid: bool) -> TokenKind {
        let upper = name.as_bytes().first().is_some_and(u8::is_ascii_uppercase);
        match (upper, fid) {
            (_, true) => TokenKind::TFid,
            (true, false) => TokenKind::TConstant,
            (false, false) => TokenKind::TIdentifier,
        }
    }

    fn label_allowed(&self) -> bool {
        self.ternaries.last() != Some(&self.depth())
            && !matches!(self.state, LexState::Dot | LexState::Fname)
    }

    fn lex_identifier(&mut self) {
        let begin = self.pos;
        self.skip_ident_chars();
        let mut fid = false;
        if matches!(self.cur(), Some(b'?' | b'!'))
            && (self.peek(1) != Some(b'=') || self.peek(2) == Some(b'='))
        {
            self.pos += 1;
            fid = true;
        }
        let name = &self.text[begin..self.pos];

        if self.state == LexState::Fname {
            let is_receiver = self.name_ctx == Some(NameCtx::Def)
                && self.cur() == Some(b'.')
                && self.peek(1) != Some(b'.');
            if is_receiver {
                let kind = if name == "self" {
                    TokenKind::KSelf
                } else {
                    Self::classify_name(name, fid)
                };
                self.emit(kind, name, begin);
                self.state = LexState::End;
                return;
            }
            if !fid && self.cur() == Some(b'=') && self.peek(1) == Some(b'(') {
                self.pos += 1;
            }
            let name = &self.text[begin..self.pos];
            let kind = Self::classify_name(name, fid);
            self.emit(kind, name, begin);
            self.finish_name();
            return;
        }

        if self.state == LexState::Dot {
            let kind = Self::classify_name(name, fid);
            self.emit(kind, name, begin);
            self.state = LexState::Arg;
            return;
        }

        if !fid && self.cur() == Some(b':') && self.peek(1) != Some(b':') && self.label_allowed() {
            self.pos += 1;
            self.emit(TokenKind::TLabel, name, begin);
            // A label closing its line is a complete `key:` shorthand.
            let closes_line = self
                .rest()
                .trim_start_matches([' ', '\t', '\r'])
                .starts_with(['\n', '#']);
            self.state = if closes_line {
                LexState::End
            } else {
                LexState::Beg
            };
            return;
        }

        if let Some(kw) = keyword(name) {
            self.lex_keyword(kw, name, begin);
            return;
        }

        let kind = Self::classify_name(name, fid);
        if kind == TokenKind::TIdentifier {
            let declares = self.params != Params::None
                || self.prev_kind() == Some(TokenKind::KFor)
                || self.assignment_ahead();
            if declares {
                self.locals.insert(name.to_string());
            }
        }
        let known_local = kind == TokenKind::TIdentifier && self.locals.contains(name);
        self.emit(kind, name, begin);
        self.state = if known_local {
            LexState::End
        } else {
            LexState::Arg
        };
    }

    fn lex_keyword(&mut self, kw: TokenKind, name: &str, begin: usize) {
        use TokenKind::*;
        let beg = self.is_beg() && self.state != LexState::Mid;
        let depth = self.depth();
        let kind = match kw {
            KIf if !beg => KIfMod,
            KUnless if !beg => KUnlessMod,
            KWhile if !beg => KWhileMod,
            KUntil if !beg => KUntilMod,
            KRescue if !beg => KRescueMod,
            KDo if self.cond_at == Some(depth) => {
                self.cond_at = None;
                KDoCond
            }
            KDo if self.lambda_at == Some(depth) => {
                self.lambda_at = None;
                if matches!(self.params, Params::Lambda(_)) {
                    self.params = Params::None;
                }
                KDoLambda
            }
            k => k,
        };
        self.emit(kind, name, begin);
        self.state = match kind {
            KWhile | KUntil | KFor => {
                self.cond_at = Some(depth);
                LexState::Beg
            }
            KDef => {
                self.name_ctx = Some(NameCtx::Def);
                LexState::Fname
            }
            KAlias => {
                self.name_ctx = Some(NameCtx::Alias(0));
                LexState::Fname
            }
            KUndef => {
                self.name_ctx = Some(NameCtx::Undef);
                LexState::Fname
            }
            KReturn | KBreak | KNext | KRescue => LexState::Mid,
            KSelf | KNil | KTrue | KFalse | KFile | KLine | KEncoding | KRedo | KRetry | KEnd => {
                LexState::End
            }
            KSuper | KYield | KDefined => LexState::Arg,
            _ => LexState::Beg,
        };
    }

    /// Method names made of operator characters, after `def`/`alias`/`undef`.
    fn lex_operator_name(&mut self) -> bool {
        let rest = self.rest();
        let Some(&(text, kind)) = OPERATOR_NAMES.iter().find(|(op, _)| rest.starts_with(op)) else {
            return false;
        };
        let begin = self.pos;
        self.pos += text.len();
        self.emit(kind, text, begin);
        self.finish_name();
        true
    }

    fn lex_punct(&mut self) {
        use TokenKind::*;
        let begin = self.pos;
        let rest = self.rest();
        let Some(c) = self.cur() else { return };
        match c {
            b'=' => {
                if rest.starts_with("===") {
                    self.op(TEqq, 3);
                } else if rest.starts_with("==") {
                    self.op(TEq, 2);
                } else if rest.starts_with("=~") {
                    self.op(TMatch, 2);
                } else if rest.starts_with("=>") {
                    self.op(TAssoc, 2);
                } else {
                    if self.params == Params::Def(self.depth()) {
                        self.params = Params::None;
                    }
                    self.op(TEql, 1);
                }
            }
            b'!' => {
                if rest.starts_with("!=") {
                    self.op(TNeq, 2);
                } else if rest.starts_with("!~") {
                    self.op(TNMatch, 2);
                } else {
                    self.op(TBang, 1);
                }
            }
            b'<' => {
                if rest.starts_with("<=>") {
                    self.op(TCmp, 3);
                } else if rest.starts_with("<<=") {
                    self.op_asgn("<<");
                } else if rest.starts_with("<=") {
                    self.op(TLeq, 2);
                } else if rest.starts_with("<<") {
                    self.op(TLShft, 2);
                } else {
                    self.op(TLt, 1);
                }
            }
            b'>' => {
                if rest.starts_with(">>=") {
                    self.op_asgn(">>");
                } else if rest.starts_with(">=") {
                    self.op(TGeq, 2);
                } else if rest.starts_with(">>") {
                    self.op(TRShft, 2);
                } else {
                    self.op(TGt, 1);
                }
            }
            b'+' | b'-' => self.lex_plus_minus(c),
            b'*' => {
                if rest.starts_with("**=") {
                    self.op_asgn("**");
                } else if rest.starts_with("**") {
                    if self.is_beg() || self.spcarg_after(2) {
                        if self.state == LexState::Arg {
                            self.warn("`**' interpreted as argument prefix", begin, 2);
                        }
                        self.op(TDStar, 2);
                    } else {
                        self.op(TPow, 2);
                    }
                } else if rest.starts_with("*=") {
                    self.op_asgn("*");
                } else if self.is_beg() || self.spcarg_after(1) {
                    if self.state == LexState::Arg {
                        self.warn("`*' interpreted as argument prefix", begin, 1);
                    }
                    self.op(TStar, 1);
                } else {
                    self.op(TStar2, 1);
                }
            }
            b'/' => {
                if self.is_beg() || self.spcarg_after(1) {
                    if self.state == LexState::Arg {
                        self.warn(
                            "ambiguous first argument; put parentheses or a space even after `/' operator",
                            begin,
                            1,
                        );
                    }
                    self.begin_literal(LitKind::Regexp, b'/', true, TRegexpBeg, 1);
                } else if rest.starts_with("/=") {
                    self.op_asgn("/");
                } else {
                    self.op(TDivide, 1);
                }
            }
            b'%' => {
                if rest.starts_with("%=") {
                    self.op_asgn("%");
                } else {
                    self.op(TPercent, 1);
                }
            }
            b'&' => {
                if rest.starts_with("&&=") {
                    self.op_asgn("&&");
                } else if rest.starts_with("&&") {
                    self.op(TAndOp, 2);
                } else if rest.starts_with("&=") {
                    self.op_asgn("&");
                } else if rest.starts_with("&.") {
                    self.op(TAndDot, 2);
                    self.state = LexState::Dot;
                } else if self.is_beg() || self.spcarg_after(1) {
                    if self.state == LexState::Arg {
                        self.warn("`&' interpreted as argument prefix", begin, 1);
                    }
                    self.op(TAmper, 1);
                } else {
                    self.op(TAmper2, 1);
                }
            }
            b'|' => {
                if rest.starts_with("||=") {
                    self.op_asgn("||");
                } else if rest.starts_with("||") {
                    self.op(TOrOp, 2);
                } else if rest.starts_with("|=") {
                    self.op_asgn("|");
                } else {
                    let depth = self.depth();
                    let opens_params = self.state == LexState::Beg
                        && matches!(
                            self.prev_kind(),
                            Some(TLCurly | TLambeg | KDo | KDoLambda)
                        );
                    if opens_params {
                        self.params = Params::Block(depth);
                    } else if self.params == Params::Block(depth) {
                        self.params = Params::None;
                    }
                    self.op(TPipe, 1);
                }
            }
            b'^' => {
                if rest.starts_with("^=") {
                    self.op_asgn("^");
                } else {
                    self.op(TCaret, 1);
                }
            }
            b'~' => self.op(TTilde, 1),
            b'(' => {
                let kind = if self.is_beg() {
                    TLParen
                } else if !self.space_seen {
                    TLParen2
                } else if self.state == LexState::Arg {
                    TLParenArg
                } else {
                    TLParen
                };
                self.op(kind, 1);
                self.brackets.push(Bracket::Paren);
            }
            b')' => {
                self.brackets.pop();
                self.op(TRParen, 1);
                self.state = LexState::End;
                if self.params == Params::Def(self.depth()) {
                    self.params = Params::None;
                }
            }
            b'[' => {
                let kind = if self.is_beg() {
                    TLBrack
                } else if !self.space_seen {
                    TLBrack2
                } else if self.state == LexState::Arg {
                    TLBrack
                } else {
                    TLBrack2
                };
                self.op(kind, 1);
                self.brackets.push(Bracket::Square);
            }
            b']' => {
                self.brackets.pop();
                self.op(TRBrack, 1);
                self.state = LexState::End;
            }
            b'{' => {
                let depth = self.depth();
                let kind = if self.lambda_at == Some(depth) {
                    self.lambda_at = None;
                    if matches!(self.params, Params::Lambda(_)) {
                        self.params = Params::None;
                    }
                    TLambeg
                } else if self.is_beg() {
                    TLBrace
                } else {
                    TLCurly
                };
                self.op(kind, 1);
                self.brackets.push(Bracket::Brace);
            }
            b'}' => {
                if self.brackets.last() == Some(&Bracket::Interp) {
                    self.brackets.pop();
                    self.modes.pop();
                    self.pos += 1;
                    self.emit(TStringDend, "}", begin);
                } else {
                    self.brackets.pop();
                    self.op(TRCurly, 1);
                    self.state = LexState::End;
                }
            }
            b'.' => {
                if rest.starts_with("...") {
                    let kind = if self.is_beg() { TBDot3 } else { TDot3 };
                    self.op(kind, 3);
                } else if rest.starts_with("..") {
                    let kind = if self.is_beg() { TBDot2 } else { TDot2 };
                    self.op(kind, 2);
                } else {
                    self.op(TDot, 1);
                    self.state = if self.name_ctx == Some(NameCtx::Def) {
                        LexState::Fname
                    } else {
                        LexState::Dot
                    };
                }
            }
            b':' => self.lex_colon(),
            b'?' => self.lex_question(),
            b',' => {
                self.op(TComma, 1);
                if self.name_ctx == Some(NameCtx::Undef) {
                    self.state = LexState::Fname;
                }
            }
            b';' => {
                self.op(TSemi, 1);
                self.after_terminator();
            }
            _ => {
                let ch = self.cur_char().unwrap_or('\u{fffd}');
                self.pos += ch.len_utf8();
                let range = self.range(begin, self.pos);
                self.diagnostics.push(Diagnostic::error(
                    format!("unexpected character `{}'", ch.escape_default()),
                    range,
                ));
            }
        }
    }

    fn lex_plus_minus(&mut self, c: u8) {
        use TokenKind::*;
        let begin = self.pos;
        let rest = self.rest();
        let minus = c == b'-';
        if rest[1..].starts_with('=') {
            self.op_asgn(if minus { "-" } else { "+" });
            return;
        }
        if minus && rest[1..].starts_with('>') {
            self.op(TLambda, 2);
            let depth = self.depth();
            self.lambda_at = Some(depth);
            self.params = Params::Lambda(depth);
            self.state = LexState::Arg;
            return;
        }
        let spcarg = self.spcarg_after(1);
        let unary = self.is_beg() || spcarg;
        if unary && matches!(self.peek(1), Some(b) if b.is_ascii_digit()) {
            if spcarg {
                let message = format!(
                    "ambiguous first argument; put parentheses or a space even after `{}' operator",
                    c as char
                );
                self.warn(&message, begin, 1);
            }
            if minus && self.number_followed_by_pow(begin + 1) {
                self.op(TUMinusNum, 1);
                return;
            }
            self.pos += 1;
            self.lex_number(begin, minus);
            return;
        }
        let kind = match (unary, minus) {
            (true, true) => TUMinus,
            (true, false) => TUPlus,
            (false, true) => TMinus,
            (false, false) => TPlus,
        };
        self.op(kind, 1);
    }

    fn lex_colon(&mut self) {
        use TokenKind::*;
        let rest = self.rest();
        if rest.starts_with("::") {
            let top_level = self.is_beg() || (self.state == LexState::Arg && self.space_seen);
            if top_level {
                self.op(TColon3, 2);
            } else {
                self.op(TColon2, 2);
                self.state = LexState::Dot;
            }
            return;
        }
        let depth = self.depth();
        if self.ternaries.last() == Some(&depth) && !self.is_beg() {
            self.ternaries.pop();
            self.op(TColon, 1);
            return;
        }
        match self.peek(1) {
            Some(term @ (b'"' | b'\'')) => {
                self.begin_literal(LitKind::Sym, term, term == b'"', TSymbeg, 2)
            }
            Some(b) if is_ident_start(b) || b"@$[<=!*+-/%>&|^~`".contains(&b) => {
                self.lex_symbol()
            }
            _ => self.op(TColon, 1),
        }
    }

    fn lex_symbol(&mut self) {
        let begin = self.pos;
        self.pos += 1;
        let name_begin = self.pos;
        match self.cur() {
            Some(b'@') => {
                self.pos += if self.peek(1) == Some(b'@') { 2 } else { 1 };
                self.skip_ident_chars();
            }
            Some(b'$') => {
                self.pos += 1;
                if matches!(self.cur(), Some(b) if is_ident_start(b)) {
                    self.skip_ident_chars();
                } else if self.cur().is_some() {
                    self.pos += 1;
                }
            }
            Some(b) if is_ident_start(b) => {
                self.skip_ident_chars();
                match (self.cur(), self.peek(1)) {
                    (Some(b'?' | b'!'), next) if next != Some(b'=') => self.pos += 1,
                    (Some(b'='), next) if !matches!(next, Some(b'=' | b'~' | b'>')) => self.pos += 1,
                    _ => {}
                }
            }
            _ => {
                let rest = self.rest();
                if let Some(&(op, _)) = OPERATOR_NAMES.iter().find(|(op, _)| rest.starts_with(op)) {
                    self.pos += op.len();
                }
            }
        }
        let name = &self.text[name_begin..self.pos];
        let was_fname = self.state == LexState::Fname;
        self.emit(TokenKind::TSymbol, name, begin);
        if was_fname {
            self.finish_name();
        } else {
            self.state = LexState::End;
        }
    }

    fn lex_question(&mut self) {
        let begin = self.pos;
        let char_literal_allowed = self.is_beg() || (self.state == LexState::Arg && self.space_seen);
        if char_literal_allowed && !is_space(self.peek(1)) {
            let is_char = match self.peek(1) {
                Some(b'\\') => true,
                Some(_) => {
                    let ch = self.rest()[1..].chars().next().unwrap_or(' ');
                    let after = self.bytes.get(begin + 1 + ch.len_utf8()).copied();
                    !(ch == '_' || ch.is_alphanumeric()) || !matches!(after, Some(b) if is_ident_char(b))
                }
                None => false,
            };
            if is_char {
                self.pos += 1;
                let mut value = String::new();
                if self.cur() == Some(b'\\') {
                    let lit = Literal {
                        kind: LitKind::Str,
                        term: 0,
                        interp: true,
                        start: begin,
                    };
                    self.read_escape(&lit, &mut value);
                } else if let Some(ch) = self.cur_char() {
                    value.push(ch);
                    self.pos += ch.len_utf8();
                }
                self.emit(TokenKind::TCharacter, value, begin);
                self.state = LexState::End;
                return;
            }
        }
        self.op(TokenKind::TEh, 1);
        let depth = self.depth();
        self.ternaries.push(depth);
    }

    // ------------------------------------------------------------------
    // Literals
    // ------------------------------------------------------------------

    fn begin_literal(&mut self, kind: LitKind, term: u8, interp: bool, tok: TokenKind, len: usize) {
        let begin = self.pos;
        self.pos += len;
        let text = &self.text[begin..self.pos];
        self.emit(tok, text, begin);
        self.modes.push(Mode::Literal(Literal {
            kind,
            term,
            interp,
            start: begin,
        }));
    }

    fn flush_content(&mut self, begin: usize, value: &mut String) {
        if self.pos > begin {
            let value = std::mem::take(value);
            self.emit(TokenKind::TStringContent, value, begin);
        }
    }

    fn lex_literal(&mut self, lit: Literal) -> Result<(), SyntaxAbort> {
        let content_begin = self.pos;
        let mut value = String::new();
        loop {
            let Some(c) = self.cur() else {
                let what = match lit.kind {
                    LitKind::Regexp => "regexp",
                    LitKind::Str | LitKind::XStr | LitKind::Sym => "string",
                };
                let d = Diagnostic::fatal(
                    format!("unterminated {} meets end of file", what),
                    self.range(lit.start, self.pos),
                );
                return Err(self.abort(d));
            };
            if c == lit.term {
                self.flush_content(content_begin, &mut value);
                let end_begin = self.pos;
                self.pos += 1;
                self.emit(TokenKind::TStringEnd, (lit.term as char).to_string(), end_begin);
                self.modes.pop();
                if lit.kind == LitKind::Regexp {
                    let opt_begin = self.pos;
                    while matches!(self.cur(), Some(b) if b.is_ascii_lowercase()) {
                        self.pos += 1;
                    }
                    let opts = &self.text[opt_begin..self.pos];
                    self.emit(TokenKind::TRegexpOpt, opts, opt_begin);
                }
                self.state = LexState::End;
                return Ok(());
            }
            if lit.interp && c == b'#' && self.peek(1) == Some(b'{') {
                self.flush_content(content_begin, &mut value);
                let dbeg = self.pos;
                self.pos += 2;
                self.emit(TokenKind::TStringDbeg, "#{", dbeg);
                self.modes.push(Mode::Interp);
                self.brackets.push(Bracket::Interp);
                self.state = LexState::Beg;
                return Ok(());
            }
            if c == b'\\' {
                self.read_escape(&lit, &mut value);
                continue;
            }
            let ch = self.cur_char().unwrap_or('\u{fffd}');
            value.push(ch);
            self.pos += ch.len_utf8();
        }
    }

    /// Read the escape sequence at the current `\`, appending its value.
    fn read_escape(&mut self, lit: &Literal, value: &mut String) {
        let begin = self.pos;
        let next = self.peek(1);
        if lit.kind == LitKind::Regexp {
            if next == Some(lit.term) {
                value.push(lit.term as char);
                self.pos += 2;
            } else {
                value.push('\\');
                self.pos += 1;
                if let Some(ch) = self.cur_char() {
                    value.push(ch);
                    self.pos += ch.len_utf8();
                }
            }
            return;
        }
        if !lit.interp {
            if next == Some(b'\\') || next == Some(lit.term) {
                value.push(next.map_or('\\', char::from));
                self.pos += 2;
            } else {
                value.push('\\');
                self.pos += 1;
            }
            return;
        }
        self.pos += 1;
        let Some(ch) = self.cur_char() else { return };
        self.pos += ch.len_utf8();
        match ch {
            'n' => value.push('\n'),
            't' => value.push('\t'),
            's' => value.push(' '),
            'r' => value.push('\r'),
            'e' => value.push('\u{1b}'),
            'a' => value.push('\u{7}'),
            'b' => value.push('\u{8}'),
            'f' => value.push('\u{c}'),
            'v' => value.push('\u{b}'),
            '\n' => {}
            'u' => self.read_unicode_escape(begin, value),
            'x' => {
                let code = self.read_radix_digits(16, 2);
                match code {
                    Some(code) => value.push(char::from_u32(code).unwrap_or('\u{fffd}')),
                    None => {
                        let range = self.range(begin, self.pos);
                        self.diagnostics
                            .push(Diagnostic::error("invalid hex escape", range));
                    }
                }
            }
            '0'..='7' => {
                self.pos -= 1;
                let code = self.read_radix_digits(8, 3).unwrap_or(0);
                value.push(char::from_u32(code).unwrap_or('\u{fffd}'));
            }
            other => value.push(other),
        }
    }

    fn read_radix_digits(&mut self, radix: u32, max: usize) -> Option<u32> {
        let start = self.pos;
        while self.pos - start < max && matches!(self.cur(), Some(b) if (b as char).is_digit(radix)) {
            self.pos += 1;
        }
        u32::from_str_radix(&self.text[start..self.pos], radix).ok()
    }

    fn read_unicode_escape(&mut self, begin: usize, value: &mut String) {
        let mut ok = true;
        if self.cur() == Some(b'{') {
            self.pos += 1;
            loop {
                while self.cur() == Some(b' ') {
                    self.pos += 1;
                }
                match self.cur() {
                    Some(b'}') => {
                        self.pos += 1;
                        break;
                    }
                    Some(b) if b.is_ascii_hexdigit() => {
                        let code = self.read_radix_digits(16, 6);
                        match code.and_then(char::from_u32) {
                            Some(ch) => value.push(ch),
                            None => ok = false,
                        }
                    }
                    _ => {
                        ok = false;
                        break;
                    }
                }
            }
        } else {
            let start = self.pos;
            match self.read_radix_digits(16, 4).and_then(char::from_u32) {
                Some(ch) if self.pos - start == 4 => value.push(ch),
                _ => ok = false,
            }
        }
        if !ok {
            let range = self.range(begin, self.pos);
            self.diagnostics
                .push(Diagnostic::error("invalid Unicode escape", range));
        }
    }
}
