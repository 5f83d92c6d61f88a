// Copyright (c) rubric contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The closed set of node-type tags.
//!
//! [`for_each_node_type!`] is the single master list. Each entry names the
//! enum variant, the grammar tag and the identifier used to build the
//! visitor method name (`on_<ident>`). Everything that has to stay in sync
//! with the tag set (the enum, tag lookup, the [`Visitor`](crate::Visitor)
//! trait and its dispatcher) is generated from it.

/// Invoke `$callback! { Variant => "tag", ident; ... }` with every node type.
macro_rules! for_each_node_type {
    ($callback:ident) => {
        $callback! {
            // Literals
            True => "true", true;
            False => "false", false;
            Nil => "nil", nil;
            Int => "int", int;
            Float => "float", float;
            Complex => "complex", complex;
            Rational => "rational", rational;
            Str => "str", str;
            Dstr => "dstr", dstr;
            Xstr => "xstr", xstr;
            Sym => "sym", sym;
            Dsym => "dsym", dsym;
            Regexp => "regexp", regexp;
            Regopt => "regopt", regopt;
            Array => "array", array;
            Splat => "splat", splat;
            Hash => "hash", hash;
            Pair => "pair", pair;
            Kwsplat => "kwsplat", kwsplat;
            Irange => "irange", irange;
            Erange => "erange", erange;
            // Variables and references
            SelfRef => "self", self;
            Lvar => "lvar", lvar;
            Ivar => "ivar", ivar;
            Cvar => "cvar", cvar;
            Gvar => "gvar", gvar;
            Const => "const", const;
            Cbase => "cbase", cbase;
            NthRef => "nth_ref", nth_ref;
            BackRef => "back_ref", back_ref;
            Defined => "defined?", defined;
            // Assignment
            Lvasgn => "lvasgn", lvasgn;
            Ivasgn => "ivasgn", ivasgn;
            Cvasgn => "cvasgn", cvasgn;
            Gvasgn => "gvasgn", gvasgn;
            Casgn => "casgn", casgn;
            Mlhs => "mlhs", mlhs;
            Masgn => "masgn", masgn;
            Rasgn => "rasgn", rasgn;
            Mrasgn => "mrasgn", mrasgn;
            OpAsgn => "op_asgn", op_asgn;
            OrAsgn => "or_asgn", or_asgn;
            AndAsgn => "and_asgn", and_asgn;
            // Definitions
            Module => "module", module;
            Class => "class", class;
            Sclass => "sclass", sclass;
            Def => "def", def;
            Defs => "defs", defs;
            Undef => "undef", undef;
            Alias => "alias", alias;
            // Parameters
            Args => "args", args;
            Arg => "arg", arg;
            Optarg => "optarg", optarg;
            Restarg => "restarg", restarg;
            Blockarg => "blockarg", blockarg;
            Shadowarg => "shadowarg", shadowarg;
            Kwarg => "kwarg", kwarg;
            Kwoptarg => "kwoptarg", kwoptarg;
            Kwrestarg => "kwrestarg", kwrestarg;
            Kwnilarg => "kwnilarg", kwnilarg;
            Procarg0 => "procarg0", procarg0;
            ArgExpr => "arg_expr", arg_expr;
            ForwardArgs => "forward_args", forward_args;
            ForwardedArgs => "forwarded_args", forwarded_args;
            ForwardArg => "forward_arg", forward_arg;
            ForwardedRestarg => "forwarded_restarg", forwarded_restarg;
            ForwardedKwrestarg => "forwarded_kwrestarg", forwarded_kwrestarg;
            BlockPass => "block_pass", block_pass;
            // Calls
            Send => "send", send;
            Csend => "csend", csend;
            Super => "super", super;
            Zsuper => "zsuper", zsuper;
            Yield => "yield", yield;
            Block => "block", block;
            Numblock => "numblock", numblock;
            Lambda => "lambda", lambda;
            Index => "index", index;
            Indexasgn => "indexasgn", indexasgn;
            Kwargs => "kwargs", kwargs;
            // Logic and control flow
            And => "and", and;
            Or => "or", or;
            Not => "not", not;
            If => "if", if;
            When => "when", when;
            Case => "case", case;
            While => "while", while;
            Until => "until", until;
            WhilePost => "while_post", while_post;
            UntilPost => "until_post", until_post;
            For => "for", for;
            Break => "break", break;
            Next => "next", next;
            Redo => "redo", redo;
            Return => "return", return;
            Begin => "begin", begin;
            Kwbegin => "kwbegin", kwbegin;
            Rescue => "rescue", rescue;
            Resbody => "resbody", resbody;
            Ensure => "ensure", ensure;
            Retry => "retry", retry;
            Preexe => "preexe", preexe;
            Postexe => "postexe", postexe;
            Iflipflop => "iflipflop", iflipflop;
            Eflipflop => "eflipflop", eflipflop;
            MatchCurrentLine => "match_current_line", match_current_line;
            MatchWithLvasgn => "match_with_lvasgn", match_with_lvasgn;
            // Pattern matching
            CaseMatch => "case_match", case_match;
            InMatch => "in_match", in_match;
            InPattern => "in_pattern", in_pattern;
            MatchVar => "match_var", match_var;
            Pin => "pin", pin;
            MatchAlt => "match_alt", match_alt;
            MatchAs => "match_as", match_as;
            MatchRest => "match_rest", match_rest;
            ArrayPattern => "array_pattern", array_pattern;
            ArrayPatternWithTail => "array_pattern_with_tail", array_pattern_with_tail;
            HashPattern => "hash_pattern", hash_pattern;
            ConstPattern => "const_pattern", const_pattern;
            FindPattern => "find_pattern", find_pattern;
            IfGuard => "if_guard", if_guard;
            UnlessGuard => "unless_guard", unless_guard;
            MatchNilPattern => "match_nil_pattern", match_nil_pattern;
            MatchWithTrailingComma => "match_with_trailing_comma", match_with_trailing_comma;
            EmptyElse => "empty_else", empty_else;
            MatchPattern => "match_pattern", match_pattern;
            MatchPatternP => "match_pattern_p", match_pattern_p;
            // Keyword pseudo-variables
            File => "__FILE__", file_keyword;
            Line => "__LINE__", line_keyword;
            Encoding => "__ENCODING__", encoding_keyword;
        }
    };
}

pub(crate) use for_each_node_type;

macro_rules! define_node_types {
    ($($variant:ident => $tag:literal, $method:ident;)*) => {
        /// Discriminant of a [`Node`](crate::Node): which grammar production it
        /// represents.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum NodeType {
            $($variant,)*
        }

        impl NodeType {
            /// Every node type, in master-list order.
            pub const ALL: &'static [NodeType] = &[$(NodeType::$variant,)*];

            /// The grammar tag (`"send"`, `"defined?"`, `"__FILE__"`).
            pub fn as_str(self) -> &'static str {
                match self {
                    $(NodeType::$variant => $tag,)*
                }
            }

            /// Look a node type up by its grammar tag.
            pub fn from_tag(tag: &str) -> Option<NodeType> {
                match tag {
                    $($tag => Some(NodeType::$variant),)*
                    _ => None,
                }
            }

            /// Name of the visitor method handling this type.
            pub fn method_name(self) -> &'static str {
                match self {
                    $(NodeType::$variant => concat!("on_", stringify!($method)),)*
                }
            }
        }
    };
}

for_each_node_type!(define_node_types);

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for NodeType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_unique_and_round_trip() {
        let mut seen = std::collections::HashSet::new();
        for ty in NodeType::ALL {
            assert!(seen.insert(ty.as_str()), "duplicate tag {}", ty);
            assert_eq!(NodeType::from_tag(ty.as_str()), Some(*ty));
        }
    }

    #[test]
    fn transient_tags_are_not_node_types() {
        for tag in ["ident", "numargs", "blockarg_expr", "restarg_expr", "objc_kwarg"] {
            assert_eq!(NodeType::from_tag(tag), None);
        }
    }

    #[test]
    fn method_names() {
        assert_eq!(NodeType::Send.method_name(), "on_send");
        assert_eq!(NodeType::Defined.method_name(), "on_defined");
        assert_eq!(NodeType::SelfRef.method_name(), "on_self");
        assert_eq!(NodeType::File.method_name(), "on_file_keyword");
        assert_eq!(NodeType::Encoding.method_name(), "on_encoding_keyword");
        assert_eq!(NodeType::True.method_name(), "on_true");
    }

    #[test]
    fn display_uses_tag() {
        assert_eq!(NodeType::OpAsgn.to_string(), "op_asgn");
        assert_eq!(NodeType::Line.to_string(), "__LINE__");
    }
}
