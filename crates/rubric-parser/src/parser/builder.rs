// Copyright (c) rubric contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Node construction for grammar actions.
//!
//! Every function here takes already-parsed pieces (tokens and child nodes)
//! and returns the node the grammar rule stands for, with a range covering
//! all of its pieces. Functions that can reject their input return
//! `Result<_, &'static str>` so rules can use them from `{? }` actions.

use rubric_ast::{Child, Node, NodeType, RubyVersion, SourceRange, TokenKind};

use crate::tokenizer::LexTok;

pub(crate) type Built = Result<Node, &'static str>;

/// A primary expression with postfix operations applied.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Chain {
    pub node: Node,
    /// The chain ends in a call that can still take command arguments:
    /// `foo`, `a.b`, `A::B`, `super`, `yield`.
    pub open: bool,
}

impl Chain {
    pub fn closed(node: Node) -> Self {
        Chain { node, open: false }
    }

    pub fn open(node: Node) -> Self {
        Chain { node, open: true }
    }
}

/// One element of an argument list, before trailing hashes are grouped.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ArgItem {
    Positional(Node),
    Assoc(Node),
    BlockPass(Node),
}

/// An operation applied after a primary expression.
#[derive(Debug, Clone)]
pub(crate) enum Postfix<'t> {
    /// `.name`, `&.name`, `::name`, `.()`, each with optional parenthesized
    /// arguments.
    Call {
        dot: &'t LexTok,
        name: Option<&'t LexTok>,
        args: Option<(Vec<ArgItem>, &'t LexTok)>,
    },
    Const(&'t LexTok),
    Index(Vec<ArgItem>, &'t LexTok),
    Block(BlockParts<'t>),
}

#[derive(Debug, Clone)]
pub(crate) struct BlockParts<'t> {
    pub open: &'t LexTok,
    pub params: Option<Node>,
    pub body: Option<Node>,
    pub close: &'t LexTok,
}

/// A piece of a string-like literal.
#[derive(Debug, Clone)]
pub(crate) enum StrPart<'t> {
    Text(&'t LexTok),
    Interp(&'t LexTok, Vec<Node>, &'t LexTok),
}

fn node(node_type: NodeType, children: Vec<Child>, range: SourceRange) -> Node {
    Node::new(node_type, children, range)
}

fn sym(name: impl Into<String>) -> Child {
    Child::Symbol(name.into())
}

fn nodes(items: Vec<Node>) -> Vec<Child> {
    items.into_iter().map(Child::from).collect()
}

fn span<'a>(first: SourceRange, rest: impl IntoIterator<Item = &'a Node>) -> SourceRange {
    rest.into_iter().fold(first, |range, n| range.join(n.range()))
}

fn span_opt(range: SourceRange, other: Option<&Node>) -> SourceRange {
    other.map_or(range, |n| range.join(n.range()))
}

fn zero_width(range: SourceRange) -> SourceRange {
    SourceRange::new(range.begin_pos, range.begin_pos, range.line, range.column)
}

pub(crate) fn gate<T>(allowed: bool, value: T) -> Result<T, &'static str> {
    if allowed {
        Ok(value)
    } else {
        Err("syntax unavailable for this Ruby version")
    }
}

/// Statements of a body: nothing, the single statement, or a `begin`.
pub(crate) fn compstmt(mut stmts: Vec<Node>) -> Option<Node> {
    match stmts.len() {
        0 => None,
        1 => stmts.pop(),
        _ => {
            let range = span(stmts[0].range(), &stmts);
            Some(node(NodeType::Begin, nodes(stmts), range))
        }
    }
}

// ----------------------------------------------------------------------
// Literals
// ----------------------------------------------------------------------

pub(crate) fn integer(tok: &LexTok) -> Node {
    let value = parse_integer(&tok.value).map_or_else(|| Child::Str(tok.value.clone()), Child::Integer);
    node(NodeType::Int, vec![value], tok.range)
}

fn parse_integer(text: &str) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let digits: String = digits.chars().filter(|&c| c != '_').collect::<String>().to_ascii_lowercase();
    let (radix, body) = if let Some(body) = digits.strip_prefix("0x") {
        (16, body)
    } else if let Some(body) = digits.strip_prefix("0b") {
        (2, body)
    } else if let Some(body) = digits.strip_prefix("0o") {
        (8, body)
    } else if let Some(body) = digits.strip_prefix("0d") {
        (10, body)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits.as_str())
    };
    let magnitude = i64::from_str_radix(body, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

pub(crate) fn float(tok: &LexTok) -> Node {
    let text: String = tok.value.chars().filter(|&c| c != '_').collect();
    let value = text
        .parse::<f64>()
        .map_or_else(|_| Child::Str(tok.value.clone()), Child::Float);
    node(NodeType::Float, vec![value], tok.range)
}

/// `2r`, `1.5r`: the value keeps its source text without the suffix.
pub(crate) fn rational(tok: &LexTok) -> Node {
    let text = tok.value.strip_suffix('r').unwrap_or(&tok.value);
    node(NodeType::Rational, vec![Child::Str(text.to_string())], tok.range)
}

pub(crate) fn complex(tok: &LexTok) -> Node {
    let text = tok.value.strip_suffix('i').unwrap_or(&tok.value);
    node(NodeType::Complex, vec![Child::Str(text.to_string())], tok.range)
}

pub(crate) fn keyword(tok: &LexTok, node_type: NodeType) -> Node {
    node(node_type, vec![], tok.range)
}

pub(crate) fn variable(tok: &LexTok) -> Node {
    let node_type = match tok.kind {
        TokenKind::TIvar => NodeType::Ivar,
        TokenKind::TCvar => NodeType::Cvar,
        TokenKind::TGvar => NodeType::Gvar,
        TokenKind::TBackRef => NodeType::BackRef,
        TokenKind::TNthRef => {
            let value = tok
                .value
                .parse::<i64>()
                .map_or_else(|_| Child::Str(tok.value.clone()), Child::Integer);
            return node(NodeType::NthRef, vec![value], tok.range);
        }
        _ => NodeType::Lvar,
    };
    node(node_type, vec![sym(&tok.value)], tok.range)
}

/// A bare identifier. It stays an `lvar` only if local resolution finds a
/// binding for it; otherwise it becomes a receiver-less call.
pub(crate) fn identifier(tok: &LexTok) -> Node {
    node(NodeType::Lvar, vec![sym(&tok.value)], tok.range)
}

pub(crate) fn const_ref(scope: Option<Node>, name: &LexTok) -> Node {
    let range = span_opt(name.range, scope.as_ref());
    node(NodeType::Const, vec![Child::from(scope), sym(&name.value)], range)
}

pub(crate) fn const_top(colon3: &LexTok, name: &LexTok) -> Node {
    let cbase = node(NodeType::Cbase, vec![], colon3.range);
    const_ref(Some(cbase), name)
}

// ----------------------------------------------------------------------
// Strings, symbols, regexps
// ----------------------------------------------------------------------

fn part_nodes(parts: Vec<StrPart<'_>>) -> Vec<Node> {
    parts
        .into_iter()
        .map(|part| match part {
            StrPart::Text(tok) => node(NodeType::Str, vec![Child::Str(tok.value.clone())], tok.range),
            StrPart::Interp(open, stmts, close) => {
                node(NodeType::Begin, nodes(stmts), open.range.join(close.range))
            }
        })
        .collect()
}

fn is_static(parts: &[Node]) -> bool {
    parts.iter().all(|p| p.is(NodeType::Str))
}

fn static_text(parts: &[Node]) -> String {
    parts
        .iter()
        .filter_map(|p| match p.child(0) {
            Some(Child::Str(text)) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

pub(crate) fn string(open: &LexTok, parts: Vec<StrPart<'_>>, close: &LexTok) -> Node {
    let range = open.range.join(close.range);
    let parts = part_nodes(parts);
    if is_static(&parts) {
        node(NodeType::Str, vec![Child::Str(static_text(&parts))], range)
    } else {
        node(NodeType::Dstr, nodes(parts), range)
    }
}

/// Adjacent literals: `"a" "b"`.
pub(crate) fn concat(mut strings: Vec<Node>) -> Node {
    if strings.len() == 1 {
        if let Some(single) = strings.pop() {
            return single;
        }
    }
    let range = span(strings[0].range(), &strings);
    node(NodeType::Dstr, nodes(strings), range)
}

pub(crate) fn character(tok: &LexTok) -> Node {
    node(NodeType::Str, vec![Child::Str(tok.value.clone())], tok.range)
}

pub(crate) fn xstring(open: &LexTok, parts: Vec<StrPart<'_>>, close: &LexTok) -> Node {
    node(NodeType::Xstr, nodes(part_nodes(parts)), open.range.join(close.range))
}

pub(crate) fn symbol(tok: &LexTok) -> Node {
    node(NodeType::Sym, vec![sym(&tok.value)], tok.range)
}

pub(crate) fn dsymbol(open: &LexTok, parts: Vec<StrPart<'_>>, close: &LexTok) -> Node {
    let range = open.range.join(close.range);
    let parts = part_nodes(parts);
    if is_static(&parts) {
        node(NodeType::Sym, vec![sym(static_text(&parts))], range)
    } else {
        node(NodeType::Dsym, nodes(parts), range)
    }
}

pub(crate) fn regexp(open: &LexTok, parts: Vec<StrPart<'_>>, close: &LexTok, opts: &LexTok) -> Node {
    let mut flags: Vec<char> = opts.value.chars().collect();
    flags.sort_unstable();
    let regopt = node(
        NodeType::Regopt,
        flags.into_iter().map(|c| sym(c.to_string())).collect(),
        opts.range,
    );
    let mut children = nodes(part_nodes(parts));
    children.push(regopt.into());
    node(NodeType::Regexp, children, open.range.join(opts.range).join(close.range))
}

/// Names of `(?<name>...)` groups in a regexp literal without interpolation.
pub(crate) fn named_captures(regexp: &Node) -> Vec<String> {
    let parts: Vec<&Node> = regexp.each_child_node().filter(|n| !n.is(NodeType::Regopt)).collect();
    if !parts.iter().all(|p| p.is(NodeType::Str)) {
        return Vec::new();
    }
    let source: String = parts
        .iter()
        .filter_map(|p| match p.child(0) {
            Some(Child::Str(text)) => Some(text.as_str()),
            _ => None,
        })
        .collect();
    let mut names = Vec::new();
    let mut rest = source.as_str();
    while let Some(at) = rest.find("(?<") {
        rest = &rest[at + 3..];
        let name: String = rest
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        if !name.is_empty() && rest[name.len()..].starts_with('>') && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

// ----------------------------------------------------------------------
// Collections and arguments
// ----------------------------------------------------------------------

/// Group trailing `key => value`/`key: value`/`**h` items into one hash
/// node of `hash_type`, placed where the first of them appeared.
fn group_assocs(items: Vec<ArgItem>, hash_type: NodeType) -> Vec<Node> {
    let mut out = Vec::new();
    let mut assocs: Vec<Node> = Vec::new();
    let mut assoc_at = None;
    let mut block = None;
    for item in items {
        match item {
            ArgItem::Positional(n) => out.push(n),
            ArgItem::Assoc(n) => {
                assoc_at.get_or_insert(out.len());
                assocs.push(n);
            }
            ArgItem::BlockPass(n) => block = Some(n),
        }
    }
    if let Some(at) = assoc_at {
        let range = span(assocs[0].range(), &assocs);
        out.insert(at, node(hash_type, nodes(assocs), range));
    }
    out.extend(block);
    out
}

pub(crate) fn call_args(items: Vec<ArgItem>) -> Vec<Node> {
    group_assocs(items, NodeType::Kwargs)
}

pub(crate) fn array(open: &LexTok, items: Vec<ArgItem>, close: &LexTok) -> Node {
    let elements = group_assocs(items, NodeType::Hash);
    node(NodeType::Array, nodes(elements), open.range.join(close.range))
}

/// `a = 1, 2` and the right side of a multiple assignment.
pub(crate) fn array_bare(items: Vec<Node>) -> Node {
    let range = span(items[0].range(), &items);
    node(NodeType::Array, nodes(items), range)
}

pub(crate) fn hash(open: &LexTok, pairs: Vec<Node>, close: &LexTok) -> Node {
    node(NodeType::Hash, nodes(pairs), open.range.join(close.range))
}

pub(crate) fn pair(key: Node, value: Node) -> Node {
    let range = key.range().join(value.range());
    node(NodeType::Pair, vec![key.into(), value.into()], range)
}

pub(crate) fn pair_label(label: &LexTok, value: Node) -> Node {
    pair(symbol(label), value)
}

/// `{x:}`: the value is the local or method of the same name.
pub(crate) fn pair_shorthand(label: &LexTok) -> Node {
    let key = symbol(label);
    let value = identifier(label);
    node(NodeType::Pair, vec![key.into(), value.into()], label.range)
}

pub(crate) fn kwsplat(op: &LexTok, value: Node) -> Node {
    let range = op.range.join(value.range());
    node(NodeType::Kwsplat, vec![value.into()], range)
}

pub(crate) fn splat(op: &LexTok, value: Option<Node>) -> Node {
    let range = span_opt(op.range, value.as_ref());
    node(NodeType::Splat, value.into_iter().map(Child::from).collect(), range)
}

pub(crate) fn block_pass(op: &LexTok, value: Option<Node>) -> Node {
    let range = span_opt(op.range, value.as_ref());
    node(NodeType::BlockPass, vec![Child::from(value)], range)
}

pub(crate) fn forwarded(tok: &LexTok, node_type: NodeType) -> Node {
    node(node_type, vec![], tok.range)
}

// ----------------------------------------------------------------------
// Calls
// ----------------------------------------------------------------------

pub(crate) fn send(
    receiver: Option<Node>,
    dot: Option<&LexTok>,
    name: &str,
    selector: SourceRange,
    args: Vec<Node>,
    end: Option<SourceRange>,
) -> Node {
    let node_type = match dot {
        Some(dot) if dot.kind == TokenKind::TAndDot => NodeType::Csend,
        _ => NodeType::Send,
    };
    let mut range = span(span_opt(selector, receiver.as_ref()), &args);
    if let Some(end) = end {
        range = range.join(end);
    }
    let mut children = vec![Child::from(receiver), sym(name)];
    children.extend(args.into_iter().map(Child::from));
    node(node_type, children, range)
}

/// `foo(args)` without a receiver.
pub(crate) fn fcall(name: &LexTok, args: Vec<ArgItem>, close: &LexTok) -> Node {
    send(None, None, &name.value, name.range, call_args(args), Some(close.range))
}

/// `foo?`/`Foo` used as a method name with no arguments yet.
pub(crate) fn bare_call(name: &LexTok) -> Node {
    send(None, None, &name.value, name.range, vec![], None)
}

pub(crate) fn index(receiver: Node, args: Vec<ArgItem>, close: &LexTok) -> Node {
    let range = receiver.range().join(close.range);
    let mut children = vec![Child::from(receiver)];
    children.extend(call_args(args).into_iter().map(Child::from));
    node(NodeType::Index, children, range)
}

pub(crate) fn chain(atom: Chain, ops: Vec<Postfix<'_>>, version: RubyVersion) -> Result<Chain, &'static str> {
    ops.into_iter().try_fold(atom, |acc, op| apply_postfix(acc.node, op, version))
}

fn apply_postfix(receiver: Node, op: Postfix<'_>, version: RubyVersion) -> Result<Chain, &'static str> {
    Ok(match op {
        Postfix::Call { dot, name, args } => {
            let (method, selector) = match name {
                Some(tok) => (tok.value.as_str(), tok.range),
                None => ("call", dot.range),
            };
            let open = args.is_none() && name.is_some();
            let (args, end) = match args {
                Some((items, close)) => (call_args(items), Some(close.range)),
                None => (Vec::new(), None),
            };
            let call = send(Some(receiver), Some(dot), method, selector, args, end);
            Chain { node: call, open }
        }
        Postfix::Const(name) => Chain::open(const_ref(Some(receiver), name)),
        Postfix::Index(args, close) => Chain::closed(index(receiver, args, close)),
        Postfix::Block(parts) => Chain::closed(attach_block(receiver, parts, version)?),
    })
}

/// Give command arguments to the call a chain ends in: `puts x`, `a.b c`.
pub(crate) fn command(chain: Chain, items: Vec<ArgItem>) -> Built {
    if !chain.open {
        return Err("command arguments");
    }
    let args = call_args(items);
    let (node_type, mut children, range) = chain.node.into_parts();
    let range = span(range, &args);
    match node_type {
        NodeType::Lvar => {
            let name = children.pop().unwrap_or(Child::Nil);
            let mut children = vec![Child::Nil, name];
            children.extend(args.into_iter().map(Child::from));
            Ok(node(NodeType::Send, children, range))
        }
        NodeType::Send | NodeType::Csend | NodeType::Const => {
            let node_type = if node_type == NodeType::Const {
                NodeType::Send
            } else {
                node_type
            };
            children.extend(args.into_iter().map(Child::from));
            Ok(node(node_type, children, range))
        }
        NodeType::Zsuper => Ok(node(NodeType::Super, nodes(args), range)),
        NodeType::Yield if children.is_empty() => Ok(node(NodeType::Yield, nodes(args), range)),
        _ => Err("command arguments"),
    }
}

pub(crate) fn super_call(kw: &LexTok, args: Option<(Vec<ArgItem>, &LexTok)>) -> Chain {
    match args {
        None => Chain::open(keyword(kw, NodeType::Zsuper)),
        Some((items, close)) => Chain::closed(node(
            NodeType::Super,
            nodes(call_args(items)),
            kw.range.join(close.range),
        )),
    }
}

pub(crate) fn yield_call(kw: &LexTok, args: Option<(Vec<ArgItem>, &LexTok)>) -> Chain {
    match args {
        None => Chain::open(keyword(kw, NodeType::Yield)),
        Some((items, close)) => Chain::closed(node(
            NodeType::Yield,
            nodes(call_args(items)),
            kw.range.join(close.range),
        )),
    }
}

/// `return`, `break`, `next` with their arguments.
pub(crate) fn jump(kw: &LexTok, items: Vec<ArgItem>) -> Node {
    let node_type = match kw.kind {
        TokenKind::KBreak => NodeType::Break,
        TokenKind::KNext => NodeType::Next,
        _ => NodeType::Return,
    };
    let args = call_args(items);
    let range = span(kw.range, &args);
    node(node_type, nodes(args), range)
}

pub(crate) fn defined(kw: &LexTok, value: Node, close: Option<&LexTok>) -> Node {
    let mut range = kw.range.join(value.range());
    if let Some(close) = close {
        range = range.join(close.range);
    }
    node(NodeType::Defined, vec![value.into()], range)
}

/// `!x`, `-x`, `~x`, `+x`, and `not x`.
pub(crate) fn unary(op: &LexTok, operand: Node, method: &str) -> Node {
    let range = op.range.join(operand.range());
    node(NodeType::Send, vec![operand.into(), sym(method)], range)
}

pub(crate) fn binary(lhs: Node, op: &LexTok, rhs: Node) -> Node {
    if op.kind == TokenKind::TMatch && lhs.is(NodeType::Regexp) && !named_captures(&lhs).is_empty() {
        let range = lhs.range().join(rhs.range());
        return node(NodeType::MatchWithLvasgn, vec![lhs.into(), rhs.into()], range);
    }
    send(Some(lhs), None, &op.value, op.range, vec![rhs], None)
}

pub(crate) fn logical(node_type: NodeType, lhs: Node, rhs: Node) -> Node {
    let range = lhs.range().join(rhs.range());
    node(node_type, vec![lhs.into(), rhs.into()], range)
}

pub(crate) fn range(lhs: Option<Node>, op: &LexTok, rhs: Option<Node>) -> Node {
    let node_type = match op.kind {
        TokenKind::TDot3 | TokenKind::TBDot3 => NodeType::Erange,
        _ => NodeType::Irange,
    };
    let range = span_opt(span_opt(op.range, lhs.as_ref()), rhs.as_ref());
    node(node_type, vec![Child::from(lhs), Child::from(rhs)], range)
}

// ----------------------------------------------------------------------
// Blocks
// ----------------------------------------------------------------------

pub(crate) fn attach_block(call: Node, parts: BlockParts<'_>, version: RubyVersion) -> Built {
    let call = match call.node_type() {
        NodeType::Lvar => {
            let (_, children, range) = call.into_parts();
            let mut with_receiver = vec![Child::Nil];
            with_receiver.extend(children);
            node(NodeType::Send, with_receiver, range)
        }
        NodeType::Send | NodeType::Csend | NodeType::Super | NodeType::Zsuper => call,
        _ => return Err("block"),
    };
    let passes_block = call
        .children()
        .last()
        .and_then(Child::as_node)
        .is_some_and(|n| n.is(NodeType::BlockPass));
    if passes_block {
        return Err("block");
    }
    Ok(make_block(call, parts, version))
}

pub(crate) fn lambda(arrow: &LexTok, params: Option<Node>, parts: BlockParts<'_>, version: RubyVersion) -> Node {
    let call = node(NodeType::Lambda, vec![], arrow.range);
    let parts = BlockParts {
        params: params.or(parts.params),
        ..parts
    };
    make_block(call, parts, version)
}

fn make_block(call: Node, parts: BlockParts<'_>, version: RubyVersion) -> Node {
    let range = call.range().join(parts.close.range);
    if parts.params.is_none() && version.has_numbered_parameters() {
        if let Some(count) = parts.body.as_ref().and_then(numbered_parameters) {
            return node(
                NodeType::Numblock,
                vec![call.into(), Child::Integer(count), Child::from(parts.body)],
                range,
            );
        }
    }
    let args = parts
        .params
        .unwrap_or_else(|| node(NodeType::Args, vec![], zero_width(parts.open.range.end())));
    node(NodeType::Block, vec![call.into(), args.into(), Child::from(parts.body)], range)
}

/// The highest `_1`..`_9` a block body uses, not counting nested blocks
/// and definitions.
fn numbered_parameters(body: &Node) -> Option<i64> {
    fn visit(n: &Node, max: &mut i64) {
        match n.node_type() {
            NodeType::Lvar => {
                if let Some(index) = n.symbol(0).and_then(numbered_index) {
                    *max = (*max).max(index);
                }
            }
            NodeType::Block | NodeType::Numblock => {
                if let Some(call) = n.child_node(0) {
                    visit(call, max);
                }
            }
            NodeType::Def
            | NodeType::Defs
            | NodeType::Class
            | NodeType::Module
            | NodeType::Sclass => {}
            _ => n.each_child_node().for_each(|c| visit(c, max)),
        }
    }
    let mut max = 0;
    visit(body, &mut max);
    (max > 0).then_some(max)
}

fn numbered_index(name: &str) -> Option<i64> {
    let digit = name.strip_prefix('_')?;
    match digit.as_bytes() {
        [d @ b'1'..=b'9'] => Some(i64::from(d - b'0')),
        _ => None,
    }
}

// ----------------------------------------------------------------------
// Assignment
// ----------------------------------------------------------------------

/// The assignment target a parsed expression stands for: `a` becomes
/// `lvasgn`, `a.b` becomes a `b=` call, `a[i]` becomes `indexasgn`.
pub(crate) fn assignable(target: Node) -> Built {
    let (node_type, mut children, range) = target.into_parts();
    let node_type = match node_type {
        NodeType::Lvar => NodeType::Lvasgn,
        NodeType::Ivar => NodeType::Ivasgn,
        NodeType::Cvar => NodeType::Cvasgn,
        NodeType::Gvar => NodeType::Gvasgn,
        NodeType::Const => NodeType::Casgn,
        NodeType::Index => NodeType::Indexasgn,
        NodeType::Send | NodeType::Csend => {
            let attribute = children.len() == 2 && !children[0].is_nil();
            let name = children.get(1).and_then(Child::as_symbol).map(|n| format!("{}=", n));
            match (attribute, name) {
                (true, Some(name)) => {
                    children[1] = sym(name);
                    node_type
                }
                _ => return Err("assignable expression"),
            }
        }
        _ => return Err("assignable expression"),
    };
    Ok(node(node_type, children, range))
}

pub(crate) fn assign(target: Node, value: Node) -> Built {
    let (node_type, mut children, range) = assignable(target)?.into_parts();
    let range = range.join(value.range());
    children.push(value.into());
    Ok(node(node_type, children, range))
}

pub(crate) fn op_assign(target: Node, op: &LexTok, value: Node) -> Built {
    let target = match target.node_type() {
        NodeType::Send | NodeType::Csend if target.children().len() == 2 && !target.children()[0].is_nil() => {
            target
        }
        _ => assignable(target)?,
    };
    let range = target.range().join(value.range());
    Ok(match op.value.as_str() {
        "||" => node(NodeType::OrAsgn, vec![target.into(), value.into()], range),
        "&&" => node(NodeType::AndAsgn, vec![target.into(), value.into()], range),
        operator => node(
            NodeType::OpAsgn,
            vec![target.into(), sym(operator), value.into()],
            range,
        ),
    })
}

pub(crate) fn rescue_modifier(body: Node, kw: &LexTok, value: Node) -> Node {
    let resbody_range = kw.range.join(value.range());
    let resbody = node(
        NodeType::Resbody,
        vec![Child::Nil, Child::Nil, value.into()],
        resbody_range,
    );
    let range = body.range().join(resbody_range);
    node(NodeType::Rescue, vec![body.into(), resbody.into(), Child::Nil], range)
}

/// The right side of a multiple assignment: one value, or an array.
pub(crate) fn mrhs(mut items: Vec<Node>) -> Node {
    if items.len() == 1 && !items[0].is(NodeType::Splat) {
        if let Some(single) = items.pop() {
            return single;
        }
    }
    array_bare(items)
}

pub(crate) fn mlhs(mut items: Vec<Node>) -> Node {
    if items.len() == 1 && items[0].is(NodeType::Mlhs) {
        if let Some(inner) = items.pop() {
            return inner;
        }
    }
    let range = span(items[0].range(), &items);
    node(NodeType::Mlhs, nodes(items), range)
}

pub(crate) fn mlhs_paren(open: &LexTok, items: Vec<Node>, close: &LexTok) -> Node {
    node(NodeType::Mlhs, nodes(items), open.range.join(close.range))
}

pub(crate) fn masgn(targets: Node, value: Node) -> Node {
    let range = targets.range().join(value.range());
    node(NodeType::Masgn, vec![targets.into(), value.into()], range)
}

// ----------------------------------------------------------------------
// Control flow
// ----------------------------------------------------------------------

/// Conditions get their implicit meaning: a regexp literal matches `$_`,
/// a range literal is a flip-flop.
pub(crate) fn condition(cond: Node) -> Node {
    let (node_type, children, range) = cond.into_parts();
    match node_type {
        NodeType::Regexp => {
            let regexp = node(NodeType::Regexp, children, range);
            node(NodeType::MatchCurrentLine, vec![regexp.into()], range)
        }
        NodeType::Irange | NodeType::Erange => {
            let flip = if node_type == NodeType::Irange {
                NodeType::Iflipflop
            } else {
                NodeType::Eflipflop
            };
            node(flip, map_conditions(children), range)
        }
        NodeType::And | NodeType::Or => node(node_type, map_conditions(children), range),
        NodeType::Begin if children.len() == 1 => node(node_type, map_conditions(children), range),
        _ => node(node_type, children, range),
    }
}

fn map_conditions(children: Vec<Child>) -> Vec<Child> {
    children
        .into_iter()
        .map(|c| match c {
            Child::Node(n) => Child::Node(condition(n)),
            other => other,
        })
        .collect()
}

pub(crate) fn if_node(
    kw: &LexTok,
    cond: Node,
    then_body: Option<Node>,
    else_body: Option<Node>,
    end: SourceRange,
) -> Node {
    node(
        NodeType::If,
        vec![condition(cond).into(), Child::from(then_body), Child::from(else_body)],
        kw.range.join(end),
    )
}

/// An `elsif` clause; it ends where its last part ends.
pub(crate) fn elsif(kw: &LexTok, cond: Node, then_body: Option<Node>, else_body: Option<Node>) -> Node {
    let end = span_opt(span_opt(cond.range(), then_body.as_ref()), else_body.as_ref());
    if_node(kw, cond, then_body, else_body, end)
}

pub(crate) fn ternary(cond: Node, if_true: Node, if_false: Node) -> Node {
    let range = cond.range().join(if_false.range());
    node(
        NodeType::If,
        vec![condition(cond).into(), if_true.into(), if_false.into()],
        range,
    )
}

/// A statement followed by `if`/`unless`/`while`/`until`/`rescue`.
pub(crate) fn modifier(body: Node, kw: &LexTok, value: Node) -> Node {
    let range = body.range().join(value.range());
    match kw.kind {
        TokenKind::KIfMod => node(
            NodeType::If,
            vec![condition(value).into(), body.into(), Child::Nil],
            range,
        ),
        TokenKind::KUnlessMod => node(
            NodeType::If,
            vec![condition(value).into(), Child::Nil, body.into()],
            range,
        ),
        TokenKind::KWhileMod | TokenKind::KUntilMod => {
            let post = body.is(NodeType::Kwbegin);
            let node_type = match (kw.kind == TokenKind::KWhileMod, post) {
                (true, true) => NodeType::WhilePost,
                (true, false) => NodeType::While,
                (false, true) => NodeType::UntilPost,
                (false, false) => NodeType::Until,
            };
            node(node_type, vec![condition(value).into(), body.into()], range)
        }
        _ => rescue_modifier(body, kw, value),
    }
}

pub(crate) fn loop_node(kw: &LexTok, cond: Node, body: Option<Node>, end: &LexTok) -> Node {
    let node_type = if kw.kind == TokenKind::KUntil {
        NodeType::Until
    } else {
        NodeType::While
    };
    node(
        node_type,
        vec![condition(cond).into(), Child::from(body)],
        kw.range.join(end.range),
    )
}

pub(crate) fn for_node(kw: &LexTok, var: Node, iter: Node, body: Option<Node>, end: &LexTok) -> Node {
    node(
        NodeType::For,
        vec![var.into(), iter.into(), Child::from(body)],
        kw.range.join(end.range),
    )
}

pub(crate) fn when_node(kw: &LexTok, values: Vec<Node>, body: Option<Node>) -> Node {
    let range = span_opt(span(kw.range, &values), body.as_ref());
    let mut children = nodes(values);
    children.push(Child::from(body));
    node(NodeType::When, children, range)
}

pub(crate) fn case_node(
    kw: &LexTok,
    subject: Option<Node>,
    whens: Vec<Node>,
    else_body: Option<(&LexTok, Option<Node>)>,
    end: &LexTok,
) -> Node {
    let mut children = vec![Child::from(subject)];
    children.extend(nodes(whens));
    children.push(Child::from(else_body.and_then(|(_, body)| body)));
    node(NodeType::Case, children, kw.range.join(end.range))
}

pub(crate) fn case_match(
    kw: &LexTok,
    subject: Node,
    clauses: Vec<Node>,
    else_body: Option<(&LexTok, Option<Node>)>,
    end: &LexTok,
) -> Node {
    let mut children = vec![Child::from(subject)];
    children.extend(nodes(clauses));
    let else_child = match else_body {
        None => Child::Nil,
        Some((else_kw, None)) => node(NodeType::EmptyElse, vec![], else_kw.range).into(),
        Some((_, Some(body))) => body.into(),
    };
    children.push(else_child);
    node(NodeType::CaseMatch, children, kw.range.join(end.range))
}

pub(crate) fn in_pattern(kw: &LexTok, pattern: Node, guard: Option<Node>, body: Option<Node>) -> Node {
    let range = span_opt(span_opt(kw.range.join(pattern.range()), guard.as_ref()), body.as_ref());
    node(
        NodeType::InPattern,
        vec![pattern.into(), Child::from(guard), Child::from(body)],
        range,
    )
}

pub(crate) fn guard(kw: &LexTok, cond: Node) -> Node {
    let node_type = if kw.kind == TokenKind::KUnlessMod {
        NodeType::UnlessGuard
    } else {
        NodeType::IfGuard
    };
    let range = kw.range.join(cond.range());
    node(node_type, vec![cond.into()], range)
}

pub(crate) fn resbody(kw: &LexTok, classes: Option<Vec<Node>>, var: Option<Node>, body: Option<Node>) -> Node {
    let classes = classes.map(array_bare);
    let range = span_opt(
        span_opt(span_opt(kw.range, classes.as_ref()), var.as_ref()),
        body.as_ref(),
    );
    node(
        NodeType::Resbody,
        vec![Child::from(classes), Child::from(var), Child::from(body)],
        range,
    )
}

/// A body with optional `rescue`/`else`/`ensure` clauses.
///
/// Returns the statements unchanged when there are no clauses, or a single
/// `rescue`/`ensure` node wrapping them.
pub(crate) fn bodystmt(
    stmts: Vec<Node>,
    rescues: Vec<Node>,
    else_body: Option<(&LexTok, Vec<Node>)>,
    ensure: Option<(&LexTok, Vec<Node>)>,
) -> Vec<Node> {
    if rescues.is_empty() && else_body.is_none() && ensure.is_none() {
        return stmts;
    }
    let first = stmts.first().map(Node::range);
    let mut body = compstmt(stmts);
    if !rescues.is_empty() {
        let else_node = else_body.and_then(|(_, s)| compstmt(s));
        let start = first.unwrap_or(rescues[0].range());
        let range = span_opt(span(start, &rescues), else_node.as_ref());
        let mut children = vec![Child::from(body)];
        children.extend(nodes(rescues));
        children.push(Child::from(else_node));
        body = Some(node(NodeType::Rescue, children, range));
    } else if let Some((_, else_stmts)) = else_body {
        let mut merged: Vec<Node> = body.into_iter().collect();
        merged.extend(else_stmts);
        body = compstmt(merged);
    }
    if let Some((kw, ensure_stmts)) = ensure {
        let ensure_body = compstmt(ensure_stmts);
        let start = body.as_ref().map_or(kw.range, Node::range);
        let range = span_opt(start.join(kw.range), ensure_body.as_ref());
        body = Some(node(
            NodeType::Ensure,
            vec![Child::from(body), Child::from(ensure_body)],
            range,
        ));
    }
    body.into_iter().collect()
}

pub(crate) fn kwbegin(kw: &LexTok, stmts: Vec<Node>, end: &LexTok) -> Node {
    node(NodeType::Kwbegin, nodes(stmts), kw.range.join(end.range))
}

pub(crate) fn paren(open: &LexTok, stmts: Vec<Node>, close: &LexTok) -> Node {
    node(NodeType::Begin, nodes(stmts), open.range.join(close.range))
}

pub(crate) fn prepost(kw: &LexTok, stmts: Vec<Node>, close: &LexTok) -> Node {
    let node_type = if kw.kind == TokenKind::KlBegin {
        NodeType::Preexe
    } else {
        NodeType::Postexe
    };
    node(node_type, vec![Child::from(compstmt(stmts))], kw.range.join(close.range))
}

// ----------------------------------------------------------------------
// Definitions
// ----------------------------------------------------------------------

pub(crate) fn def_method(kw: &LexTok, name: &LexTok, args: Node, body: Option<Node>, end: SourceRange) -> Node {
    node(
        NodeType::Def,
        vec![sym(&name.value), args.into(), Child::from(body)],
        kw.range.join(end),
    )
}

pub(crate) fn def_singleton(
    kw: &LexTok,
    receiver: Node,
    name: &LexTok,
    args: Node,
    body: Option<Node>,
    end: SourceRange,
) -> Node {
    node(
        NodeType::Defs,
        vec![receiver.into(), sym(&name.value), args.into(), Child::from(body)],
        kw.range.join(end),
    )
}

/// `def name` or `def receiver.name`.
pub(crate) fn definition(
    kw: &LexTok,
    receiver: Option<Node>,
    name: &LexTok,
    args: Node,
    body: Option<Node>,
    end: SourceRange,
) -> Node {
    match receiver {
        Some(receiver) => def_singleton(kw, receiver, name, args, body, end),
        None => def_method(kw, name, args, body, end),
    }
}

pub(crate) fn singleton_receiver(tok: &LexTok) -> Node {
    match tok.kind {
        TokenKind::KSelf => keyword(tok, NodeType::SelfRef),
        TokenKind::TConstant => const_ref(None, tok),
        _ => identifier(tok),
    }
}

pub(crate) fn class_node(
    kw: &LexTok,
    name: Node,
    superclass: Option<Node>,
    body: Option<Node>,
    end: &LexTok,
) -> Node {
    node(
        NodeType::Class,
        vec![name.into(), Child::from(superclass), Child::from(body)],
        kw.range.join(end.range),
    )
}

pub(crate) fn sclass(kw: &LexTok, object: Node, body: Option<Node>, end: &LexTok) -> Node {
    node(
        NodeType::Sclass,
        vec![object.into(), Child::from(body)],
        kw.range.join(end.range),
    )
}

pub(crate) fn module_node(kw: &LexTok, name: Node, body: Option<Node>, end: &LexTok) -> Node {
    node(
        NodeType::Module,
        vec![name.into(), Child::from(body)],
        kw.range.join(end.range),
    )
}

/// A method name after `alias`/`undef`, as a symbol.
pub(crate) fn fitem(tok: &LexTok) -> Option<Node> {
    use TokenKind::*;
    match tok.kind {
        TIdentifier | TFid | TConstant | TSymbol | TAset | TAref | TCmp | TEqq | TEq | TMatch
        | TNeq | TNMatch | TPow | TUPlus | TUMinus | TLeq | TGeq | TLShft | TRShft | TBang
        | TTilde | TPlus | TMinus | TStar2 | TDivide | TPercent | TLt | TGt | TAmper2 | TPipe
        | TCaret => Some(symbol(tok)),
        kind if kind.is_keyword() => Some(symbol(tok)),
        _ => None,
    }
}

pub(crate) fn alias(kw: &LexTok, to: Node, from: Node) -> Node {
    let range = kw.range.join(from.range());
    node(NodeType::Alias, vec![to.into(), from.into()], range)
}

pub(crate) fn undef(kw: &LexTok, names: Vec<Node>) -> Node {
    let range = span(kw.range, &names);
    node(NodeType::Undef, nodes(names), range)
}

// ----------------------------------------------------------------------
// Parameters
// ----------------------------------------------------------------------

pub(crate) fn param(node_type: NodeType, start: &LexTok, name: Option<&LexTok>, value: Option<Node>) -> Node {
    let mut range = start.range;
    let mut children = Vec::new();
    if let Some(name) = name {
        range = range.join(name.range);
        children.push(sym(&name.value));
    }
    if let Some(value) = value {
        range = range.join(value.range());
        children.push(value.into());
    }
    node(node_type, children, range)
}

pub(crate) fn kwnilarg(dstar: &LexTok, nil: &LexTok) -> Node {
    node(NodeType::Kwnilarg, vec![], dstar.range.join(nil.range))
}

pub(crate) fn args(open: Option<&LexTok>, params: Vec<Node>, close: Option<&LexTok>, at: SourceRange) -> Node {
    let range = match (open, close) {
        (Some(open), Some(close)) => open.range.join(close.range),
        _ if !params.is_empty() => span(params[0].range(), &params),
        _ => zero_width(at),
    };
    node(NodeType::Args, nodes(params), range)
}

/// Block parameters; a lone plain parameter is wrapped in `procarg0`.
pub(crate) fn block_args(
    open: &LexTok,
    mut params: Vec<Node>,
    trailing_comma: bool,
    shadows: Vec<Node>,
    close: &LexTok,
) -> Node {
    let single = params.len() == 1 && shadows.is_empty() && !trailing_comma;
    if single && (params[0].is(NodeType::Arg) || params[0].is(NodeType::Mlhs)) {
        if let Some(only) = params.pop() {
            let range = only.range();
            let children = if only.is(NodeType::Mlhs) {
                only.into_parts().1
            } else {
                vec![only.into()]
            };
            params.push(node(NodeType::Procarg0, children, range));
        }
    }
    params.extend(shadows);
    node(NodeType::Args, nodes(params), open.range.join(close.range))
}

// ----------------------------------------------------------------------
// Patterns
// ----------------------------------------------------------------------

pub(crate) fn match_var(tok: &LexTok) -> Node {
    node(NodeType::MatchVar, vec![sym(&tok.value)], tok.range)
}

pub(crate) fn pin(caret: &LexTok, value: Node) -> Node {
    let range = caret.range.join(value.range());
    node(NodeType::Pin, vec![value.into()], range)
}

pub(crate) fn match_alt(lhs: Node, rhs: Node) -> Node {
    logical(NodeType::MatchAlt, lhs, rhs)
}

pub(crate) fn match_as(pattern: Node, name: &LexTok) -> Node {
    let var = match_var(name);
    let range = pattern.range().join(var.range());
    node(NodeType::MatchAs, vec![pattern.into(), var.into()], range)
}

pub(crate) fn match_rest(star: &LexTok, name: Option<&LexTok>) -> Node {
    match name {
        Some(name) => {
            let var = match_var(name);
            node(NodeType::MatchRest, vec![var.into()], star.range.join(name.range))
        }
        None => node(NodeType::MatchRest, vec![], star.range),
    }
}

pub(crate) fn match_nil(dstar: &LexTok, nil: &LexTok) -> Node {
    node(NodeType::MatchNilPattern, vec![], dstar.range.join(nil.range))
}

/// An array pattern, a find pattern `[*, x, *]`, or one with a trailing
/// comma.
pub(crate) fn array_pattern(
    open: Option<&LexTok>,
    items: Vec<Node>,
    trailing_comma: bool,
    close: Option<&LexTok>,
) -> Node {
    let range = match (open, close) {
        (Some(open), Some(close)) => open.range.join(close.range),
        _ => span(items[0].range(), &items),
    };
    let rests = items.iter().filter(|n| n.is(NodeType::MatchRest)).count();
    let find = items.len() >= 3
        && rests == 2
        && items.first().is_some_and(|n| n.is(NodeType::MatchRest))
        && items.last().is_some_and(|n| n.is(NodeType::MatchRest));
    let node_type = if find {
        NodeType::FindPattern
    } else if trailing_comma && rests == 0 {
        NodeType::ArrayPatternWithTail
    } else {
        NodeType::ArrayPattern
    };
    node(node_type, nodes(items), range)
}

/// The pattern after `in`/`=>`, where brackets around an array pattern
/// are optional.
pub(crate) fn top_pattern(mut items: Vec<Node>, trailing_comma: bool) -> Node {
    if items.len() == 1 && !trailing_comma && !items[0].is(NodeType::MatchRest) {
        if let Some(single) = items.pop() {
            return single;
        }
    }
    array_pattern(None, items, trailing_comma, None)
}

pub(crate) fn hash_pattern(open: Option<&LexTok>, items: Vec<Node>, close: Option<&LexTok>) -> Node {
    let range = match (open, close) {
        (Some(open), Some(close)) => open.range.join(close.range),
        _ => span(items[0].range(), &items),
    };
    node(NodeType::HashPattern, nodes(items), range)
}

pub(crate) fn const_pattern(constant: Node, inner: Node, close: &LexTok) -> Node {
    let range = constant.range().join(close.range);
    node(NodeType::ConstPattern, vec![constant.into(), inner.into()], range)
}

/// `value => pattern`, or `value in pattern` (`in_match` before 3.0).
pub(crate) fn match_pattern(value: Node, op: &LexTok, pattern: Node, version: RubyVersion) -> Node {
    let node_type = match op.kind {
        TokenKind::TAssoc => NodeType::MatchPattern,
        _ if version.has_rightward_assignment() => NodeType::MatchPatternP,
        _ => NodeType::InMatch,
    };
    let range = value.range().join(pattern.range());
    node(node_type, vec![value.into(), pattern.into()], range)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(kind: TokenKind, value: &str, begin: usize) -> LexTok {
        LexTok {
            kind,
            value: value.to_string(),
            range: SourceRange::new(begin, begin + value.len(), 1, begin),
        }
    }

    #[test]
    fn integer_radixes() {
        assert_eq!(parse_integer("1_000"), Some(1000));
        assert_eq!(parse_integer("0x1F"), Some(31));
        assert_eq!(parse_integer("0b101"), Some(5));
        assert_eq!(parse_integer("017"), Some(15));
        assert_eq!(parse_integer("0o17"), Some(15));
        assert_eq!(parse_integer("-42"), Some(-42));
        assert_eq!(parse_integer("0"), Some(0));
        assert_eq!(parse_integer("99999999999999999999"), None);
    }

    #[test]
    fn bignum_keeps_text() {
        let n = integer(&tok(TokenKind::TInteger, "99999999999999999999", 0));
        assert_eq!(n.to_string(), "(int \"99999999999999999999\")");
    }

    #[test]
    fn named_capture_extraction() {
        let open = tok(TokenKind::TRegexpBeg, "/", 0);
        let content = tok(TokenKind::TStringContent, "(?<year>\\d+)-(?<month>\\d+)(?<=x)", 1);
        let close = tok(TokenKind::TStringEnd, "/", 30);
        let opts = tok(TokenKind::TRegexpOpt, "", 31);
        let re = regexp(&open, vec![StrPart::Text(&content)], &close, &opts);
        assert_eq!(named_captures(&re), vec!["year".to_string(), "month".to_string()]);
    }

    #[test]
    fn assignable_targets() {
        let a = tok(TokenKind::TIdentifier, "a", 0);
        assert!(assignable(identifier(&a)).is_ok_and(|n| n.is(NodeType::Lvasgn)));
        let call = bare_call(&tok(TokenKind::TFid, "a?", 0));
        assert!(assignable(call).is_err());
        let b = tok(TokenKind::TIdentifier, "b", 2);
        let dot = tok(TokenKind::TDot, ".", 1);
        let attr = send(Some(identifier(&a)), Some(&dot), "b", b.range, vec![], None);
        let target = assignable(attr).unwrap();
        assert_eq!(target.symbol(1), Some("b="));
    }

    #[test]
    fn numbered_parameter_detection() {
        let one = identifier(&tok(TokenKind::TIdentifier, "_1", 0));
        let two = identifier(&tok(TokenKind::TIdentifier, "_2", 5));
        let plus = tok(TokenKind::TPlus, "+", 3);
        let body = binary(one, &plus, two);
        assert_eq!(numbered_parameters(&body), Some(2));
        let plain = identifier(&tok(TokenKind::TIdentifier, "_10", 0));
        assert_eq!(numbered_parameters(&plain), None);
    }
}
