// Copyright (c) rubric contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Ruby grammar over the token stream.
//!
//! Rules follow the precedence of MRI's `parse.y` loosely: statements with
//! modifiers, `and`/`or`/`not` expressions, command calls without
//! parentheses, then operator expressions over primaries with postfix
//! calls. Node construction lives in [`super::builder`].

use rubric_ast::{Node, NodeType, RubyVersion, TokenKind as K};

use super::builder::{self as b, ArgItem, BlockParts, Chain, Postfix, StrPart};
use crate::tokenizer::LexTok;

/// Parse-wide settings visible to rule actions.
#[derive(Debug, Clone, Copy)]
pub struct Ctx {
    pub version: RubyVersion,
}

const PARENS: &[K] = &[K::TLParen, K::TLParen2, K::TLParenArg];
const SQUARES: &[K] = &[K::TLBrack, K::TLBrack2];
const BRACES: &[K] = &[K::TLBrace, K::TLCurly];
const STARS: &[K] = &[K::TStar, K::TStar2];
const AMPERS: &[K] = &[K::TAmper, K::TAmper2];
const DOTS: &[K] = &[K::TDot, K::TAndDot];
const RANGE_OPS: &[K] = &[K::TDot2, K::TDot3];
const BEGINLESS_OPS: &[K] = &[K::TBDot2, K::TBDot3];
const MODIFIERS: &[K] = &[K::KIfMod, K::KUnlessMod, K::KWhileMod, K::KUntilMod, K::KRescueMod];
const GUARDS: &[K] = &[K::KIfMod, K::KUnlessMod];
const JUMPS: &[K] = &[K::KReturn, K::KBreak, K::KNext];
const LOOPS: &[K] = &[K::KWhile, K::KUntil];
const PRE_POST: &[K] = &[K::KlBegin, K::KlEnd];
const LOGICAL: &[K] = &[K::KAnd, K::KOr];
const VARIABLES: &[K] = &[K::TIvar, K::TCvar, K::TGvar, K::TNthRef, K::TBackRef];
const GLOBALS: &[K] = &[K::TGvar, K::TBackRef, K::TNthRef];
const PINNABLE: &[K] = &[K::TIvar, K::TCvar, K::TGvar];
const CALL_NAMES: &[K] = &[K::TIdentifier, K::TFid, K::TConstant];
const SINGLETONS: &[K] = &[K::KSelf, K::TIdentifier, K::TConstant];
const CONST_OPEN: &[K] = &[K::TLParen2, K::TLBrack2];
const CONST_CLOSE: &[K] = &[K::TRParen, K::TRBrack];
const EQUALITY: &[K] = &[K::TCmp, K::TEq, K::TEqq, K::TNeq, K::TMatch, K::TNMatch];
const COMPARISON: &[K] = &[K::TGt, K::TGeq, K::TLt, K::TLeq];
const BIT_OR: &[K] = &[K::TPipe, K::TCaret];
const SHIFTS: &[K] = &[K::TLShft, K::TRShft];
const ADDITIVE: &[K] = &[K::TPlus, K::TMinus];
const MULTIPLICATIVE: &[K] = &[K::TStar2, K::TDivide, K::TPercent];
const NEGATION: &[K] = &[K::TUMinus, K::TUMinusNum];

peg::parser! {
    pub grammar ruby<'t>(ctx: &Ctx) for [&'t LexTok] {

        // ------------------------------------------------------------
        // Tokens
        // ------------------------------------------------------------

        rule t(k: K) -> &'t LexTok
            = [x] {? if x.kind == k { Ok(x) } else { Err(k.as_str()) } }

        rule any_of(ks: &'static [K]) -> &'t LexTok
            = [x] {? if ks.contains(&x.kind) { Ok(x) } else { Err(ks[0].as_str()) } }

        rule comma() = t(K::TComma) { }

        rule term() = t(K::TNl) { } / t(K::TSemi) { }

        rule terms() = term()+ { }

        rule opt_terms() = term()* { }

        rule opt_nl() = t(K::TNl)* { }

        rule then_sep() = t(K::KThen) { } / terms() t(K::KThen)? { }

        rule do_sep() = t(K::KDoCond) { } / terms() { }

        // ------------------------------------------------------------
        // Statements
        // ------------------------------------------------------------

        pub rule program() -> Option<Node>
            = s:stmts() ![_] { b::compstmt(s) }

        rule stmts() -> Vec<Node>
            = opt_terms() s:(stmt() ** terms()) opt_terms() { s }

        rule stmt() -> Node
            = s:stmt_base() mods:modifier()* {
                mods.into_iter().fold(s, |body, (kw, value)| b::modifier(body, kw, value))
            }

        rule modifier() -> (&'t LexTok, Node)
            = kw:any_of(MODIFIERS) value:expr() { (kw, value) }

        rule stmt_base() -> Node
            = kw:t(K::KAlias) to:gvar_ref() from:gvar_ref() { b::alias(kw, to, from) }
            / kw:t(K::KAlias) to:fitem() from:fitem() { b::alias(kw, to, from) }
            / kw:t(K::KUndef) names:(fitem() ++ comma()) { b::undef(kw, names) }
            / kw:any_of(PRE_POST) any_of(BRACES) s:stmts() close:t(K::TRCurly) { b::prepost(kw, s, close) }
            / masgn()
            / multi_assign()
            / expr()

        rule fitem() -> Node
            = [x] {? b::fitem(x).ok_or("method name") }

        rule gvar_ref() -> Node
            = x:any_of(GLOBALS) { b::variable(x) }

        // ------------------------------------------------------------
        // Multiple assignment
        // ------------------------------------------------------------

        rule masgn() -> Node
            = targets:mlhs() t(K::TEql) value:mrhs_value() { b::masgn(targets, value) }

        rule multi_assign() -> Node
            = target:primary() t(K::TEql) items:(mrhs_item() ++ comma()) {?
                if items.len() > 1 || items[0].is(NodeType::Splat) {
                    b::assign(target.node, b::array_bare(items))
                } else {
                    Err("multiple values")
                }
            }

        rule mlhs() -> Node
            = first:mlhs_item() comma() rest:(mlhs_item() ** comma()) comma()? {
                let mut items = vec![first];
                items.extend(rest);
                b::mlhs(items)
            }
            / s:mlhs_splat() { b::mlhs(vec![s]) }
            / p:mlhs_paren() { b::mlhs(vec![p]) }

        rule mlhs_item() -> Node
            = mlhs_paren()
            / mlhs_splat()
            / p:primary() {? b::assignable(p.node) }

        rule mlhs_splat() -> Node
            = op:any_of(STARS) target:(p:primary() {? b::assignable(p.node) })? { b::splat(op, target) }

        rule mlhs_paren() -> Node
            = open:any_of(PARENS) items:(mlhs_item() ++ comma()) comma()? close:t(K::TRParen) {
                b::mlhs_paren(open, items, close)
            }

        rule mrhs_value() -> Node
            = command_call()
            / items:(mrhs_item() ++ comma()) { b::mrhs(items) }

        rule mrhs_item() -> Node
            = op:any_of(STARS) value:arg() { b::splat(op, Some(value)) }
            / arg()

        // ------------------------------------------------------------
        // Expressions
        // ------------------------------------------------------------

        rule expr() -> Node = precedence!{
            x:(@) op:any_of(LOGICAL) y:@ {
                let node_type = if op.kind == K::KAnd { NodeType::And } else { NodeType::Or };
                b::logical(node_type, x, y)
            }
            --
            op:t(K::KNot) x:@ { b::unary(op, x, "!") }
            --
            e:expr_atom() { e }
        }

        rule expr_atom() -> Node
            = value:arg() op:t(K::TAssoc) p:top_pattern() {?
                b::gate(ctx.version.has_rightward_assignment(), b::match_pattern(value, op, p, ctx.version))
            }
            / value:arg() op:t(K::KIn) p:top_pattern() {?
                b::gate(ctx.version.has_pattern_matching(), b::match_pattern(value, op, p, ctx.version))
            }
            / command_call()
            / arg()

        rule command_call() -> Node
            = c:command() blk:do_block()? {?
                match blk {
                    Some(blk) => b::attach_block(c, blk, ctx.version),
                    None => Ok(c),
                }
            }
            / a:arg() blk:do_block() {? b::attach_block(a, blk, ctx.version) }

        #[cache]
        rule command() -> Node
            = kw:any_of(JUMPS) args:command_args() { b::jump(kw, args) }
            / c:open_primary() args:command_args() {? b::command(c, args) }

        rule open_primary() -> Chain
            = c:primary() {? if c.open { Ok(c) } else { Err("method call") } }

        rule command_args() -> Vec<ArgItem>
            = items:(call_arg() ++ comma()) { items }

        #[cache]
        rule arg() -> Node
            = kw:t(K::KDefined) !any_of(PARENS) value:arg() { b::defined(kw, value, None) }
            / ternary()

        rule ternary() -> Node
            = cond:range_expr() t(K::TEh) opt_nl() yes:ternary() opt_nl() t(K::TColon) opt_nl() no:ternary() {
                b::ternary(cond, yes, no)
            }
            / range_expr()

        rule range_expr() -> Node
            = lhs:oper() op:any_of(RANGE_OPS) rhs:oper() { b::range(Some(lhs), op, Some(rhs)) }
            / lhs:oper() op:any_of(RANGE_OPS) {?
                b::gate(ctx.version.has_endless_ranges(), b::range(Some(lhs), op, None))
            }
            / op:any_of(BEGINLESS_OPS) rhs:oper() {?
                b::gate(ctx.version.has_beginless_ranges(), b::range(None, op, Some(rhs)))
            }
            / oper()

        rule oper() -> Node = precedence!{
            x:(@) t(K::TOrOp) y:@ { b::logical(NodeType::Or, x, y) }
            --
            x:(@) t(K::TAndOp) y:@ { b::logical(NodeType::And, x, y) }
            --
            x:(@) op:any_of(EQUALITY) y:@ { b::binary(x, op, y) }
            --
            x:(@) op:any_of(COMPARISON) y:@ { b::binary(x, op, y) }
            --
            x:(@) op:any_of(BIT_OR) y:@ { b::binary(x, op, y) }
            --
            x:(@) op:t(K::TAmper2) y:@ { b::binary(x, op, y) }
            --
            x:(@) op:any_of(SHIFTS) y:@ { b::binary(x, op, y) }
            --
            x:(@) op:any_of(ADDITIVE) y:@ { b::binary(x, op, y) }
            --
            x:(@) op:any_of(MULTIPLICATIVE) y:@ { b::binary(x, op, y) }
            --
            op:any_of(NEGATION) x:@ { b::unary(op, x, "-@") }
            --
            x:@ op:t(K::TPow) y:(@) { b::binary(x, op, y) }
            --
            op:t(K::TBang) x:@ { b::unary(op, x, "!") }
            op:t(K::TTilde) x:@ { b::unary(op, x, "~") }
            op:t(K::TUPlus) x:@ { b::unary(op, x, "+@") }
            --
            a:oper_atom() { a }
        }

        rule oper_atom() -> Node
            = target:primary() t(K::TEql) value:arg_rhs() {? b::assign(target.node, value) }
            / target:primary() op:t(K::TOpAsgn) value:arg_rhs() {? b::op_assign(target.node, op, value) }
            / p:primary() { p.node }

        rule arg_rhs() -> Node
            = value:arg_value() rescue:(kw:t(K::KRescueMod) fallback:arg() { (kw, fallback) })? {
                match rescue {
                    Some((kw, fallback)) => b::rescue_modifier(value, kw, fallback),
                    None => value,
                }
            }

        rule arg_value() -> Node
            = command_call()
            / arg()

        // ------------------------------------------------------------
        // Call arguments
        // ------------------------------------------------------------

        rule paren_args() -> (Vec<ArgItem>, &'t LexTok)
            = t(K::TLParen2) items:call_arg_list() close:t(K::TRParen) { (items, close) }

        rule call_arg_list() -> Vec<ArgItem>
            = items:(call_arg() ** comma()) comma()? { items }

        rule call_arg() -> ArgItem
            = dots:t(K::TBDot3) &t(K::TRParen) {?
                b::gate(
                    ctx.version.has_argument_forwarding(),
                    ArgItem::Positional(b::forwarded(dots, NodeType::ForwardedArgs)),
                )
            }
            / op:t(K::TAmper) value:arg() { ArgItem::BlockPass(b::block_pass(op, Some(value))) }
            / op:t(K::TAmper) {?
                b::gate(
                    ctx.version.has_anonymous_block_forwarding(),
                    ArgItem::BlockPass(b::block_pass(op, None)),
                )
            }
            / op:t(K::TDStar) value:arg() { ArgItem::Assoc(b::kwsplat(op, value)) }
            / op:t(K::TDStar) {?
                b::gate(
                    ctx.version >= RubyVersion::V3_2,
                    ArgItem::Assoc(b::forwarded(op, NodeType::ForwardedKwrestarg)),
                )
            }
            / op:t(K::TStar) value:arg() { ArgItem::Positional(b::splat(op, Some(value))) }
            / op:t(K::TStar) {?
                b::gate(
                    ctx.version >= RubyVersion::V3_2,
                    ArgItem::Positional(b::forwarded(op, NodeType::ForwardedRestarg)),
                )
            }
            / label:t(K::TLabel) opt_nl() value:arg() { ArgItem::Assoc(b::pair_label(label, value)) }
            / label:t(K::TLabel) {?
                b::gate(ctx.version >= RubyVersion::V3_1, ArgItem::Assoc(b::pair_shorthand(label)))
            }
            / key:arg() t(K::TAssoc) value:arg() { ArgItem::Assoc(b::pair(key, value)) }
            / c:command() { ArgItem::Positional(c) }
            / value:arg() { ArgItem::Positional(value) }

        // ------------------------------------------------------------
        // Primaries
        // ------------------------------------------------------------

        #[cache]
        rule primary() -> Chain
            = a:atom() ops:postfix()* {? b::chain(a, ops, ctx.version) }

        rule postfix() -> Postfix<'t>
            = dot:any_of(DOTS) name:method_name() args:paren_args()? {
                Postfix::Call { dot, name: Some(name), args }
            }
            / dot:any_of(DOTS) args:paren_args() { Postfix::Call { dot, name: None, args: Some(args) } }
            / t(K::TColon2) name:t(K::TConstant) !t(K::TLParen2) { Postfix::Const(name) }
            / dot:t(K::TColon2) name:method_name() args:paren_args()? {
                Postfix::Call { dot, name: Some(name), args }
            }
            / t(K::TLBrack2) items:call_arg_list() close:t(K::TRBrack) { Postfix::Index(items, close) }
            / blk:brace_block() { Postfix::Block(blk) }

        rule method_name() -> &'t LexTok
            = [x] {? if b::fitem(x).is_some() { Ok(x) } else { Err("method name") } }

        rule atom() -> Chain
            = n:literal() { Chain::closed(n) }
            / n:compound() { Chain::closed(n) }
            / kw:t(K::KDefined) any_of(PARENS) opt_nl() value:expr() opt_nl() close:t(K::TRParen) {
                Chain::closed(b::defined(kw, value, Some(close)))
            }
            / kw:t(K::KSuper) args:paren_args()? { b::super_call(kw, args) }
            / kw:t(K::KYield) args:paren_args()? { b::yield_call(kw, args) }
            / kw:any_of(JUMPS) { Chain::closed(b::jump(kw, Vec::new())) }
            / colon3:t(K::TColon3) name:t(K::TConstant) { Chain::open(b::const_top(colon3, name)) }
            / name:any_of(CALL_NAMES) args:paren_args() {
                let (items, close) = args;
                Chain::closed(b::fcall(name, items, close))
            }
            / x:t(K::TIdentifier) { Chain::open(b::identifier(x)) }
            / x:t(K::TFid) { Chain::open(b::bare_call(x)) }
            / x:t(K::TConstant) { Chain::open(b::const_ref(None, x)) }
            / x:any_of(VARIABLES) { Chain::closed(b::variable(x)) }
            / n:lambda() { Chain::closed(n) }

        rule literal() -> Node
            = x:t(K::TInteger) { b::integer(x) }
            / x:t(K::TFloat) { b::float(x) }
            / x:t(K::TRational) { b::rational(x) }
            / x:t(K::TImaginary) { b::complex(x) }
            / s:string_lit()+ { b::concat(s) }
            / open:t(K::TXStringBeg) parts:str_part()* close:t(K::TStringEnd) { b::xstring(open, parts, close) }
            / x:t(K::TSymbol) { b::symbol(x) }
            / open:t(K::TSymbeg) parts:str_part()* close:t(K::TStringEnd) { b::dsymbol(open, parts, close) }
            / open:t(K::TRegexpBeg) parts:str_part()* close:t(K::TStringEnd) opts:t(K::TRegexpOpt) {
                b::regexp(open, parts, close, opts)
            }
            / open:t(K::TLBrack) items:call_arg_list() close:t(K::TRBrack) { b::array(open, items, close) }
            / hash_lit()
            / x:t(K::KNil) { b::keyword(x, NodeType::Nil) }
            / x:t(K::KTrue) { b::keyword(x, NodeType::True) }
            / x:t(K::KFalse) { b::keyword(x, NodeType::False) }
            / x:t(K::KSelf) { b::keyword(x, NodeType::SelfRef) }
            / x:t(K::KFile) { b::keyword(x, NodeType::File) }
            / x:t(K::KLine) { b::keyword(x, NodeType::Line) }
            / x:t(K::KEncoding) { b::keyword(x, NodeType::Encoding) }
            / x:t(K::KRedo) { b::keyword(x, NodeType::Redo) }
            / x:t(K::KRetry) { b::keyword(x, NodeType::Retry) }

        rule string_lit() -> Node
            = open:t(K::TStringBeg) parts:str_part()* close:t(K::TStringEnd) { b::string(open, parts, close) }
            / x:t(K::TCharacter) { b::character(x) }

        rule str_part() -> StrPart<'t>
            = x:t(K::TStringContent) { StrPart::Text(x) }
            / open:t(K::TStringDbeg) s:stmts() close:t(K::TStringDend) { StrPart::Interp(open, s, close) }

        rule hash_lit() -> Node
            = open:t(K::TLBrace) opt_nl() pairs:(hash_item() ** hash_sep()) hash_sep()? opt_nl() close:t(K::TRCurly) {
                b::hash(open, pairs, close)
            }

        rule hash_sep() = comma() opt_nl() { }

        rule hash_item() -> Node
            = label:t(K::TLabel) opt_nl() value:arg() { b::pair_label(label, value) }
            / label:t(K::TLabel) {? b::gate(ctx.version >= RubyVersion::V3_1, b::pair_shorthand(label)) }
            / op:t(K::TDStar) value:arg() { b::kwsplat(op, value) }
            / key:arg() t(K::TAssoc) opt_nl() value:arg() { b::pair(key, value) }

        rule compound() -> Node
            = if_expr()
            / unless_expr()
            / loop_expr()
            / for_expr()
            / case_expr()
            / begin_expr()
            / def_expr()
            / class_expr()
            / module_expr()
            / paren_expr()

        rule paren_expr() -> Node
            = open:any_of(PARENS) s:stmts() close:t(K::TRParen) { b::paren(open, s, close) }

        // ------------------------------------------------------------
        // Control flow
        // ------------------------------------------------------------

        rule if_expr() -> Node
            = kw:t(K::KIf) cond:expr() then_sep() s:stmts() tail:if_tail()? end:t(K::KEnd) {
                b::if_node(kw, cond, b::compstmt(s), tail.flatten(), end.range)
            }

        rule if_tail() -> Option<Node>
            = kw:t(K::KElsif) cond:expr() then_sep() s:stmts() tail:if_tail()? {
                Some(b::elsif(kw, cond, b::compstmt(s), tail.flatten()))
            }
            / t(K::KElse) s:stmts() { b::compstmt(s) }

        rule unless_expr() -> Node
            = kw:t(K::KUnless) cond:expr() then_sep() s:stmts() otherwise:(t(K::KElse) e:stmts() { e })? end:t(K::KEnd) {
                b::if_node(kw, cond, otherwise.and_then(b::compstmt), b::compstmt(s), end.range)
            }

        rule loop_expr() -> Node
            = kw:any_of(LOOPS) cond:expr() do_sep() s:stmts() end:t(K::KEnd) {
                b::loop_node(kw, cond, b::compstmt(s), end)
            }

        rule for_expr() -> Node
            = kw:t(K::KFor) var:for_var() t(K::KIn) iter:expr() do_sep() s:stmts() end:t(K::KEnd) {
                b::for_node(kw, var, iter, b::compstmt(s), end)
            }

        rule for_var() -> Node
            = mlhs()
            / p:primary() {? b::assignable(p.node) }

        rule case_expr() -> Node
            = kw:t(K::KCase) subject:expr()? opt_terms() whens:when_clause()+ otherwise:else_clause()? end:t(K::KEnd) {
                b::case_node(kw, subject, whens, otherwise, end)
            }
            / kw:t(K::KCase) subject:expr() opt_terms() clauses:in_clause()+ otherwise:else_clause()? end:t(K::KEnd) {?
                b::gate(
                    ctx.version.has_pattern_matching(),
                    b::case_match(kw, subject, clauses, otherwise, end),
                )
            }

        rule else_clause() -> (&'t LexTok, Option<Node>)
            = kw:t(K::KElse) s:stmts() { (kw, b::compstmt(s)) }

        rule when_clause() -> Node
            = kw:t(K::KWhen) values:(when_value() ++ comma()) then_sep() s:stmts() {
                b::when_node(kw, values, b::compstmt(s))
            }

        rule when_value() -> Node
            = op:any_of(STARS) value:arg() { b::splat(op, Some(value)) }
            / arg()

        rule in_clause() -> Node
            = kw:t(K::KIn) pattern:top_pattern() guard:guard()? then_sep() s:stmts() {
                b::in_pattern(kw, pattern, guard, b::compstmt(s))
            }

        rule guard() -> Node
            = kw:any_of(GUARDS) cond:expr() { b::guard(kw, cond) }

        rule begin_expr() -> Node
            = kw:t(K::KBegin) body:bodystmt() end:t(K::KEnd) { b::kwbegin(kw, body, end) }

        rule bodystmt() -> Vec<Node>
            = body:stmts()
              rescues:rescue_clause()*
              otherwise:(kw:t(K::KElse) e:stmts() { (kw, e) })?
              ensure:(kw:t(K::KEnsure) e:stmts() { (kw, e) })? {
                b::bodystmt(body, rescues, otherwise, ensure)
            }

        rule rescue_clause() -> Node
            = kw:t(K::KRescue) classes:(rescue_class() ++ comma())? var:(t(K::TAssoc) v:rescue_var() { v })? then_sep() s:stmts() {
                b::resbody(kw, classes, var, b::compstmt(s))
            }

        rule rescue_class() -> Node
            = op:any_of(STARS) value:arg() { b::splat(op, Some(value)) }
            / arg()

        rule rescue_var() -> Node
            = p:primary() {? b::assignable(p.node) }

        // ------------------------------------------------------------
        // Definitions
        // ------------------------------------------------------------

        rule def_expr() -> Node
            = kw:t(K::KDef) head:def_head() params:def_paren_params()? t(K::TEql) body:arg_rhs() {?
                let (receiver, name) = head;
                let params = params.unwrap_or_else(|| b::args(None, Vec::new(), None, name.range.end()));
                let end = body.range();
                b::gate(
                    ctx.version.has_endless_method_definitions(),
                    b::definition(kw, receiver, name, params, Some(body), end),
                )
            }
            / kw:t(K::KDef) head:def_head() params:def_params()? body:bodystmt() end:t(K::KEnd) {
                let (receiver, name) = head;
                let params = params.unwrap_or_else(|| b::args(None, Vec::new(), None, name.range.end()));
                b::definition(kw, receiver, name, params, b::compstmt(body), end.range)
            }

        rule def_head() -> (Option<Node>, &'t LexTok)
            = recv:any_of(SINGLETONS) t(K::TDot) name:method_name() {
                (Some(b::singleton_receiver(recv)), name)
            }
            / name:method_name() { (None, name) }

        rule def_paren_params() -> Node
            = open:any_of(PARENS) params:(param(false) ** comma()) close:t(K::TRParen) {
                b::args(Some(open), params, Some(close), open.range)
            }

        rule def_params() -> Node
            = def_paren_params()
            / params:(param(false) ++ comma()) {
                let at = params[0].range();
                b::args(None, params, None, at)
            }

        rule param(block: bool) -> Node
            = dots:t(K::TBDot3) {?
                b::gate(ctx.version.has_argument_forwarding(), b::keyword(dots, NodeType::ForwardArg))
            }
            / label:t(K::TLabel) value:default_value(block) {
                b::param(NodeType::Kwoptarg, label, Some(label), Some(value))
            }
            / label:t(K::TLabel) { b::param(NodeType::Kwarg, label, Some(label), None) }
            / op:t(K::TDStar) nil:t(K::KNil) { b::kwnilarg(op, nil) }
            / op:t(K::TDStar) name:t(K::TIdentifier)? { b::param(NodeType::Kwrestarg, op, name, None) }
            / op:any_of(STARS) name:t(K::TIdentifier)? { b::param(NodeType::Restarg, op, name, None) }
            / op:any_of(AMPERS) name:t(K::TIdentifier)? { b::param(NodeType::Blockarg, op, name, None) }
            / name:t(K::TIdentifier) t(K::TEql) value:default_value(block) {
                b::param(NodeType::Optarg, name, Some(name), Some(value))
            }
            / name:t(K::TIdentifier) { b::param(NodeType::Arg, name, Some(name), None) }
            / open:any_of(PARENS) items:(param(block) ++ comma()) close:t(K::TRParen) {
                b::mlhs_paren(open, items, close)
            }

        // A block parameter default cannot contain `|`.
        rule default_value(block: bool) -> Node
            = value:arg() {? if block { Err("primary") } else { Ok(value) } }
            / p:primary() { p.node }

        rule class_expr() -> Node
            = kw:t(K::KClass) t(K::TLShft) object:expr() body:bodystmt() end:t(K::KEnd) {
                b::sclass(kw, object, b::compstmt(body), end)
            }
            / kw:t(K::KClass) name:cpath() superclass:(t(K::TLt) s:expr() { s })? body:bodystmt() end:t(K::KEnd) {
                b::class_node(kw, name, superclass, b::compstmt(body), end)
            }

        rule module_expr() -> Node
            = kw:t(K::KModule) name:cpath() body:bodystmt() end:t(K::KEnd) {
                b::module_node(kw, name, b::compstmt(body), end)
            }

        rule cpath() -> Node
            = p:primary() {? if p.node.is(NodeType::Const) { Ok(p.node) } else { Err("class or module name") } }

        // ------------------------------------------------------------
        // Blocks and lambdas
        // ------------------------------------------------------------

        rule brace_block() -> BlockParts<'t>
            = open:t(K::TLCurly) params:block_params()? s:stmts() close:t(K::TRCurly) {
                BlockParts { open, params, body: b::compstmt(s), close }
            }

        rule do_block() -> BlockParts<'t>
            = open:t(K::KDo) params:block_params()? body:bodystmt() close:t(K::KEnd) {
                BlockParts { open, params, body: b::compstmt(body), close }
            }

        rule block_params() -> Node
            = bars:t(K::TOrOp) { b::block_args(bars, Vec::new(), false, Vec::new(), bars) }
            / open:t(K::TPipe) params:(param(true) ** comma()) trailing:(comma() { true })? shadows:shadow_params()? close:t(K::TPipe) {
                b::block_args(open, params, trailing.is_some(), shadows.unwrap_or_default(), close)
            }

        rule shadow_params() -> Vec<Node>
            = t(K::TSemi) names:((n:t(K::TIdentifier) { b::param(NodeType::Shadowarg, n, Some(n), None) }) ++ comma()) {
                names
            }

        rule lambda() -> Node
            = arrow:t(K::TLambda) params:def_params()? body:lambda_body() {
                b::lambda(arrow, params, body, ctx.version)
            }

        rule lambda_body() -> BlockParts<'t>
            = open:t(K::TLambeg) s:stmts() close:t(K::TRCurly) {
                BlockParts { open, params: None, body: b::compstmt(s), close }
            }
            / open:t(K::KDoLambda) body:bodystmt() close:t(K::KEnd) {
                BlockParts { open, params: None, body: b::compstmt(body), close }
            }

        // ------------------------------------------------------------
        // Patterns
        // ------------------------------------------------------------

        rule top_pattern() -> Node
            = items:(hash_pattern_item() ++ comma()) { b::hash_pattern(None, items, None) }
            / items:(pattern_item() ++ comma()) trailing:(comma() { true })? { b::top_pattern(items, trailing.is_some()) }

        rule pattern_item() -> Node
            = pattern_rest()
            / pattern()

        rule pattern_rest() -> Node
            = op:any_of(STARS) name:t(K::TIdentifier)? { b::match_rest(op, name) }

        rule pattern() -> Node
            = p:pattern_alt() t(K::TAssoc) name:t(K::TIdentifier) { b::match_as(p, name) }
            / pattern_alt()

        rule pattern_alt() -> Node
            = first:pattern_primary() rest:(t(K::TPipe) p:pattern_primary() { p })* {
                rest.into_iter().fold(first, b::match_alt)
            }

        rule pattern_primary() -> Node
            = open:any_of(SQUARES) items:(pattern_item() ** comma()) trailing:(comma() { true })? close:t(K::TRBrack) {
                b::array_pattern(Some(open), items, trailing.is_some(), Some(close))
            }
            / open:any_of(BRACES) opt_nl() items:(hash_pattern_item() ** comma()) comma()? opt_nl() close:t(K::TRCurly) {
                b::hash_pattern(Some(open), items, Some(close))
            }
            / c:pattern_const() open:any_of(CONST_OPEN) items:(hash_pattern_item() ++ comma()) close:any_of(CONST_CLOSE) {
                b::const_pattern(c, b::hash_pattern(Some(open), items, Some(close)), close)
            }
            / c:pattern_const() open:any_of(CONST_OPEN) items:(pattern_item() ** comma()) trailing:(comma() { true })? close:any_of(CONST_CLOSE) {
                b::const_pattern(c, b::array_pattern(Some(open), items, trailing.is_some(), Some(close)), close)
            }
            / caret:t(K::TCaret) value:pin_target() { b::pin(caret, value) }
            / pattern_value()
            / name:t(K::TIdentifier) { b::match_var(name) }

        rule hash_pattern_item() -> Node
            = label:t(K::TLabel) p:pattern() { b::pair_label(label, p) }
            / label:t(K::TLabel) { b::match_var(label) }
            / op:t(K::TDStar) nil:t(K::KNil) { b::match_nil(op, nil) }
            / op:t(K::TDStar) name:t(K::TIdentifier)? { b::match_rest(op, name) }

        rule pattern_const() -> Node
            = head:const_head() names:(t(K::TColon2) n:t(K::TConstant) { n })* {
                names.into_iter().fold(head, |scope, n| b::const_ref(Some(scope), n))
            }

        rule const_head() -> Node
            = colon3:t(K::TColon3) name:t(K::TConstant) { b::const_top(colon3, name) }
            / name:t(K::TConstant) { b::const_ref(None, name) }

        rule pattern_value() -> Node
            = lhs:pattern_scalar() op:any_of(RANGE_OPS) rhs:pattern_scalar() { b::range(Some(lhs), op, Some(rhs)) }
            / lhs:pattern_scalar() op:any_of(RANGE_OPS) { b::range(Some(lhs), op, None) }
            / op:any_of(BEGINLESS_OPS) rhs:pattern_scalar() { b::range(None, op, Some(rhs)) }
            / pattern_scalar()

        rule pattern_scalar() -> Node
            = !t(K::TIdentifier) p:primary() { p.node }

        rule pin_target() -> Node
            = open:any_of(PARENS) value:expr() close:t(K::TRParen) { b::paren(open, vec![value], close) }
            / name:t(K::TIdentifier) { b::identifier(name) }
            / x:any_of(PINNABLE) { b::variable(x) }
    }
}
