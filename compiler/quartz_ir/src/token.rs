//! Tokens and token lists.
//!
//! The lexer produces a [`TokenList`]; the parser consumes it as a slice.

use std::fmt;
use std::ops::Index;

use crate::{Name, Span};

/// A single token with its source span.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Token { kind, span }
    }
}

/// Token variants.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TokenKind {
    // ===== Keywords =====
    Contract,
    Var,
    Event,
    Func,
    Init,
    Public,
    Mutating,
    Return,
    If,
    Else,
    SelfLower,
    True,
    False,
    Inout,

    // ===== Primitive type names =====
    AddressType,
    IntType,
    BoolType,
    StringType,

    // ===== Punctuation =====
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    DoubleColon,
    Colon,
    Comma,
    Arrow,
    Dot,

    // ===== Operators =====
    Eq,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // ===== Literals =====
    /// Decimal integer literal (widened to u64).
    Int(u64),
    /// Address literal: the interned hex digits without the `0x` prefix.
    Address(Name),
    /// String literal (interned, unescaped).
    String(Name),
    /// Identifier (interned).
    Ident(Name),

    // ===== Layout =====
    /// Statement terminator.
    Newline,

    // ===== Sentinels =====
    /// A character sequence the lexer could not tokenize.
    Error,
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Short human-readable description for diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Contract => "`contract`",
            TokenKind::Var => "`var`",
            TokenKind::Event => "`event`",
            TokenKind::Func => "`func`",
            TokenKind::Init => "`init`",
            TokenKind::Public => "`public`",
            TokenKind::Mutating => "`mutating`",
            TokenKind::Return => "`return`",
            TokenKind::If => "`if`",
            TokenKind::Else => "`else`",
            TokenKind::SelfLower => "`self`",
            TokenKind::True => "`true`",
            TokenKind::False => "`false`",
            TokenKind::Inout => "`inout`",
            TokenKind::AddressType => "`Address`",
            TokenKind::IntType => "`Int`",
            TokenKind::BoolType => "`Bool`",
            TokenKind::StringType => "`String`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::DoubleColon => "`::`",
            TokenKind::Colon => "`:`",
            TokenKind::Comma => "`,`",
            TokenKind::Arrow => "`->`",
            TokenKind::Dot => "`.`",
            TokenKind::Eq => "`=`",
            TokenKind::EqEq => "`==`",
            TokenKind::NotEq => "`!=`",
            TokenKind::Lt => "`<`",
            TokenKind::LtEq => "`<=`",
            TokenKind::Gt => "`>`",
            TokenKind::GtEq => "`>=`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Percent => "`%`",
            TokenKind::Int(_) => "integer literal",
            TokenKind::Address(_) => "address literal",
            TokenKind::String(_) => "string literal",
            TokenKind::Ident(_) => "identifier",
            TokenKind::Newline => "newline",
            TokenKind::Error => "invalid token",
            TokenKind::Eof => "end of input",
        }
    }

    /// Check whether this token opens a bracketed region.
    pub fn is_open_bracket(&self) -> bool {
        matches!(self, TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket)
    }

    /// Check whether this token closes a bracketed region.
    pub fn is_close_bracket(&self) -> bool {
        matches!(self, TokenKind::RParen | TokenKind::RBrace | TokenKind::RBracket)
    }
}

/// Lexer output: all tokens of one source file, terminated by `Eof`.
#[derive(Clone, Eq, PartialEq, Hash, Default)]
pub struct TokenList {
    tokens: Vec<Token>,
}

impl TokenList {
    pub fn new() -> Self {
        TokenList { tokens: Vec::new() }
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The tokens as a slice.
    pub fn as_slice(&self) -> &[Token] {
        &self.tokens
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }
}

impl Index<usize> for TokenList {
    type Output = Token;

    fn index(&self, index: usize) -> &Token {
        &self.tokens[index]
    }
}

impl<'a> IntoIterator for &'a TokenList {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

impl fmt::Debug for TokenList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenList({} tokens)", self.tokens.len())
    }
}
