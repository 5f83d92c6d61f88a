// Copyright (c) rubric contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The token model.
//!
//! A grammar backend hands tokens over as [`RawToken`] pairs of
//! `(kind, (text, range))`; [`Token::from_raw`] normalizes them into the
//! value consumers work with.

use serde::{Serialize, Serializer};

use crate::range::SourceRange;

macro_rules! token_kinds {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// Lexer tag of a token.
        ///
        /// Names follow the conventional Ruby lexer tags (`kDEF`, `tIDENTIFIER`,
        /// `tSTRING_BEG`, ...) and are exposed through [`TokenKind::as_str`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum TokenKind {
            $($variant,)*
        }

        impl TokenKind {
            /// Every token kind, in declaration order.
            pub const ALL: &'static [TokenKind] = &[$(TokenKind::$variant,)*];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(TokenKind::$variant => $name,)*
                }
            }

            /// Look a kind up by its lexer tag.
            pub fn from_tag(tag: &str) -> Option<TokenKind> {
                match tag {
                    $($name => Some(TokenKind::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

token_kinds! {
    // Keywords
    KAlias => "kALIAS",
    KAnd => "kAND",
    KBegin => "kBEGIN",
    KlBegin => "klBEGIN",
    KBreak => "kBREAK",
    KCase => "kCASE",
    KClass => "kCLASS",
    KDef => "kDEF",
    KDefined => "kDEFINED",
    KDo => "kDO",
    KDoCond => "kDO_COND",
    KDoLambda => "kDO_LAMBDA",
    KElse => "kELSE",
    KElsif => "kELSIF",
    KEnd => "kEND",
    KlEnd => "klEND",
    KEnsure => "kENSURE",
    KFalse => "kFALSE",
    KFor => "kFOR",
    KIf => "kIF",
    KIfMod => "kIF_MOD",
    KIn => "kIN",
    KModule => "kMODULE",
    KNext => "kNEXT",
    KNil => "kNIL",
    KNot => "kNOT",
    KOr => "kOR",
    KRedo => "kREDO",
    KRescue => "kRESCUE",
    KRescueMod => "kRESCUE_MOD",
    KRetry => "kRETRY",
    KReturn => "kRETURN",
    KSelf => "kSELF",
    KSuper => "kSUPER",
    KThen => "kTHEN",
    KTrue => "kTRUE",
    KUndef => "kUNDEF",
    KUnless => "kUNLESS",
    KUnlessMod => "kUNLESS_MOD",
    KUntil => "kUNTIL",
    KUntilMod => "kUNTIL_MOD",
    KWhen => "kWHEN",
    KWhile => "kWHILE",
    KWhileMod => "kWHILE_MOD",
    KYield => "kYIELD",
    KFile => "k__FILE__",
    KLine => "k__LINE__",
    KEncoding => "k__ENCODING__",
    // Names
    TIdentifier => "tIDENTIFIER",
    TFid => "tFID",
    TConstant => "tCONSTANT",
    TIvar => "tIVAR",
    TCvar => "tCVAR",
    TGvar => "tGVAR",
    TNthRef => "tNTH_REF",
    TBackRef => "tBACK_REF",
    TLabel => "tLABEL",
    // Literals
    TInteger => "tINTEGER",
    TFloat => "tFLOAT",
    TRational => "tRATIONAL",
    TImaginary => "tIMAGINARY",
    TCharacter => "tCHARACTER",
    TSymbol => "tSYMBOL",
    TStringBeg => "tSTRING_BEG",
    TXStringBeg => "tXSTRING_BEG",
    TSymbeg => "tSYMBEG",
    TRegexpBeg => "tREGEXP_BEG",
    TStringContent => "tSTRING_CONTENT",
    TStringDbeg => "tSTRING_DBEG",
    TStringDend => "tSTRING_DEND",
    TStringEnd => "tSTRING_END",
    TRegexpOpt => "tREGEXP_OPT",
    // Punctuation
    TNl => "tNL",
    TSemi => "tSEMI",
    TComma => "tCOMMA",
    TDot => "tDOT",
    TAndDot => "tANDDOT",
    TColon2 => "tCOLON2",
    TColon3 => "tCOLON3",
    TColon => "tCOLON",
    TEh => "tEH",
    TAssoc => "tASSOC",
    TLambda => "tLAMBDA",
    TLambeg => "tLAMBEG",
    TLParen => "tLPAREN",
    TLParen2 => "tLPAREN2",
    TLParenArg => "tLPAREN_ARG",
    TRParen => "tRPAREN",
    TLBrack => "tLBRACK",
    TLBrack2 => "tLBRACK2",
    TRBrack => "tRBRACK",
    TLBrace => "tLBRACE",
    TLCurly => "tLCURLY",
    TRCurly => "tRCURLY",
    TPipe => "tPIPE",
    // Operators
    TEql => "tEQL",
    TOpAsgn => "tOP_ASGN",
    TEq => "tEQ",
    TEqq => "tEQQ",
    TNeq => "tNEQ",
    TMatch => "tMATCH",
    TNMatch => "tNMATCH",
    TGt => "tGT",
    TLt => "tLT",
    TGeq => "tGEQ",
    TLeq => "tLEQ",
    TCmp => "tCMP",
    TAndOp => "tANDOP",
    TOrOp => "tOROP",
    TBang => "tBANG",
    TTilde => "tTILDE",
    TCaret => "tCARET",
    TAmper => "tAMPER",
    TAmper2 => "tAMPER2",
    TLShft => "tLSHFT",
    TRShft => "tRSHFT",
    TPlus => "tPLUS",
    TMinus => "tMINUS",
    TUPlus => "tUPLUS",
    TUMinus => "tUMINUS",
    TUMinusNum => "tUMINUS_NUM",
    TStar => "tSTAR",
    TStar2 => "tSTAR2",
    TDStar => "tDSTAR",
    TPow => "tPOW",
    TDivide => "tDIVIDE",
    TPercent => "tPERCENT",
    TDot2 => "tDOT2",
    TDot3 => "tDOT3",
    TBDot2 => "tBDOT2",
    TBDot3 => "tBDOT3",
    TAref => "tAREF",
    TAset => "tASET",
}

impl TokenKind {
    /// Keyword tokens (`kDEF`, `kIF_MOD`, ...).
    pub fn is_keyword(self) -> bool {
        self.as_str().starts_with('k')
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TokenKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A token as produced by a grammar backend: `(kind, (text, range))`.
pub type RawToken = (TokenKind, (String, SourceRange));

/// An immutable lexer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    #[serde(rename = "type")]
    kind: TokenKind,
    text: String,
    pos: SourceRange,
}

impl Token {
    /// Normalize a backend token.
    pub fn from_raw(raw: RawToken) -> Token {
        let (kind, (text, pos)) = raw;
        Token { kind, text, pos }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn pos(&self) -> SourceRange {
        self.pos
    }

    pub fn line(&self) -> usize {
        self.pos.line
    }

    pub fn column(&self) -> usize {
        self.pos.column
    }

    pub fn begin_pos(&self) -> usize {
        self.pos.begin_pos
    }

    pub fn end_pos(&self) -> usize {
        self.pos.end_pos
    }
}

impl From<RawToken> for Token {
    fn from(raw: RawToken) -> Self {
        Token::from_raw(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_def() -> RawToken {
        (
            TokenKind::KDef,
            ("def".to_string(), SourceRange::new(0, 3, 1, 0)),
        )
    }

    #[test]
    fn from_raw_copies_type() {
        assert_eq!(Token::from_raw(raw_def()).kind(), TokenKind::KDef);
    }

    #[test]
    fn from_raw_copies_text() {
        assert_eq!(Token::from_raw(raw_def()).text(), "def");
    }

    #[test]
    fn from_raw_copies_range_as_pos() {
        let token = Token::from_raw(raw_def());
        assert_eq!(token.pos(), SourceRange::new(0, 3, 1, 0));
        assert_eq!(token.line(), 1);
        assert_eq!(token.column(), 0);
        assert_eq!((token.begin_pos(), token.end_pos()), (0, 3));
    }

    #[test]
    fn tags_round_trip() {
        for kind in TokenKind::ALL {
            assert_eq!(TokenKind::from_tag(kind.as_str()), Some(*kind));
        }
        assert_eq!(TokenKind::from_tag("tNOPE"), None);
    }

    #[test]
    fn keyword_detection() {
        assert!(TokenKind::KIfMod.is_keyword());
        assert!(TokenKind::KlBegin.is_keyword());
        assert!(!TokenKind::TIdentifier.is_keyword());
    }

    #[test]
    fn serializes_with_lexer_tag() {
        let json = serde_json::to_value(Token::from_raw(raw_def())).unwrap();
        assert_eq!(json["type"], "kDEF");
        assert_eq!(json["text"], "def");
        assert_eq!(json["pos"]["begin_pos"], 0);
        assert_eq!(json["pos"]["end_pos"], 3);
    }
}
