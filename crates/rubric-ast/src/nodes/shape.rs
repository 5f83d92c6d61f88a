// Copyright (c) rubric contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Traversal shapes: which child slots of a node type are walked.
//!
//! [`NodeType::shape`] is the classification table. It is an exhaustive
//! `match` with no wildcard arm, so adding a tag to the master list without
//! classifying it is a compile error.

use super::node_type::NodeType;

/// Default traversal behavior for a node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// No child is ever traversed.
    Leaf,
    /// Slot 0, when it holds a node.
    SingleOptional,
    /// Every slot that holds a node, in order.
    AllChildren,
    /// Slot 1 only, when it holds a node; slot 0 is the target name.
    SecondSlotOnly,
    /// Every node child in order, skipping literal slots. The row for tags
    /// not given a more specific shape.
    NodeChildren,
    /// A hand-written rule.
    Bespoke(BespokeRule),
}

/// Per-tag rules for node types whose slots do not fit a regular shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BespokeRule {
    /// `const`: the optional scope (slot 0).
    ConstReference,
    /// `casgn`: the optional scope (slot 0), then the optional value (slot 2).
    ConstAssignment,
    /// `class`: name, optional superclass, optional body.
    ClassDefinition,
    /// `def`: the argument list (always, through `on_args`), optional body.
    MethodDefinition,
    /// `defs`: receiver, argument list (through `on_args`), optional body.
    SingletonMethodDefinition,
    /// `send`/`csend`: every slot except the method name (slot 1).
    Call,
    /// `op_asgn`: target (slot 0) and value (slot 2); slot 1 is the operator.
    CompoundAssignment,
    /// `if`: condition, optional true branch, optional false branch.
    Conditional,
    /// `while`/`until`/`module`/`sclass`: slot 0, then optional slot 1.
    Loop,
    /// `block`: the call, the argument list (through `on_args`), optional body.
    Block,
    /// `numblock`: the call, then optional body; slot 1 is a parameter count.
    NumberedBlock,
    /// `case`, `rescue`, `when`, ranges, `for`, ...: every present slot.
    BranchDispatch,
}

impl Shape {
    pub fn is_leaf(self) -> bool {
        matches!(self, Shape::Leaf)
    }
}

impl NodeType {
    /// The traversal shape of this node type.
    pub fn shape(self) -> Shape {
        use NodeType::*;
        match self {
            True | False | Nil | Int | Float | Complex | Rational | Str | Sym | Regopt
            | SelfRef | Lvar | Ivar | Cvar | Gvar | NthRef | BackRef | Cbase | Arg
            | Restarg | Blockarg | Shadowarg | Kwrestarg | Zsuper | Redo | Retry
            | ForwardArgs | ForwardedArgs | MatchVar | MatchNilPattern | EmptyElse
            | ForwardArg | Lambda | Procarg0 | Encoding => Shape::Leaf,

            Splat | Kwsplat | BlockPass | Not | Break | Next | Preexe | Postexe
            | MatchCurrentLine | Defined | ArgExpr | Pin | MatchRest | IfGuard
            | UnlessGuard | MatchWithTrailingComma => Shape::SingleOptional,

            Dstr | Dsym | Xstr | Regexp | Array | Hash | Pair | Mlhs | Masgn | OrAsgn
            | AndAsgn | Rasgn | Mrasgn | Undef | Alias | Args | Super | Yield | Or | And
            | WhilePost | UntilPost | Iflipflop | Eflipflop | MatchWithLvasgn | Begin
            | Kwbegin | Return | InMatch | MatchAlt | MatchAs | ArrayPattern
            | ArrayPatternWithTail | HashPattern | ConstPattern | FindPattern | Index
            | Indexasgn => Shape::AllChildren,

            Lvasgn | Ivasgn | Cvasgn | Gvasgn | Optarg | Kwarg | Kwoptarg => {
                Shape::SecondSlotOnly
            }

            Const => Shape::Bespoke(BespokeRule::ConstReference),
            Casgn => Shape::Bespoke(BespokeRule::ConstAssignment),
            Class => Shape::Bespoke(BespokeRule::ClassDefinition),
            Def => Shape::Bespoke(BespokeRule::MethodDefinition),
            Defs => Shape::Bespoke(BespokeRule::SingletonMethodDefinition),
            Send | Csend => Shape::Bespoke(BespokeRule::Call),
            OpAsgn => Shape::Bespoke(BespokeRule::CompoundAssignment),
            If => Shape::Bespoke(BespokeRule::Conditional),
            While | Until | Module | Sclass => Shape::Bespoke(BespokeRule::Loop),
            Block => Shape::Bespoke(BespokeRule::Block),
            Numblock => Shape::Bespoke(BespokeRule::NumberedBlock),
            Case | Rescue | Resbody | Ensure | For | When | CaseMatch | InPattern | Irange
            | Erange => Shape::Bespoke(BespokeRule::BranchDispatch),

            Kwnilarg | ForwardedRestarg | ForwardedKwrestarg | Kwargs | MatchPattern
            | MatchPatternP | File | Line => Shape::NodeChildren,
        }
    }
}
