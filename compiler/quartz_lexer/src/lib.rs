//! Lexer for Quartz using logos with string interning.
//!
//! Produces a [`TokenList`] terminated by an EOF token. Newlines survive
//! as tokens because they terminate statements; comments and horizontal
//! whitespace are dropped.

use logos::Logos;
use quartz_ir::{Span, StringInterner, Token, TokenKind, TokenList};

/// Raw token from logos (before interning).
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r]+")] // Skip horizontal whitespace
enum RawToken {
    #[regex(r"//[^\n]*")]
    LineComment,

    #[token("\n")]
    Newline,

    #[token("contract")]
    Contract,
    #[token("var")]
    Var,
    #[token("event")]
    Event,
    #[token("func")]
    Func,
    #[token("init")]
    Init,
    #[token("public")]
    Public,
    #[token("mutating")]
    Mutating,
    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("self")]
    SelfLower,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("inout")]
    Inout,

    #[token("Address")]
    AddressType,
    #[token("Int")]
    IntType,
    #[token("Bool")]
    BoolType,
    #[token("String")]
    StringType,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("::")]
    DoubleColon,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token("->")]
    Arrow,
    #[token(".")]
    Dot,

    #[token("==")]
    EqEq,
    #[token("=")]
    Eq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token("<")]
    Lt,
    #[token(">=")]
    GtEq,
    #[token(">")]
    Gt,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    // Address literal (before Int so `0x` does not lex as `0` `x`)
    #[regex(r"0x[0-9a-fA-F]+")]
    Address,

    // Integer
    #[regex(r"[0-9][0-9_]*", |lex| {
        lex.slice().replace('_', "").parse::<u64>().ok()
    })]
    Int(u64),

    // String literal (no unescaped newlines allowed)
    #[regex(r#""([^"\\\n\r]|\\.)*""#)]
    String,

    // Identifier
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

/// Lex source code into a `TokenList`.
pub fn lex(source: &str, interner: &StringInterner) -> TokenList {
    let mut result = TokenList::new();
    let mut logos = RawToken::lexer(source);

    while let Some(token_result) = logos.next() {
        let span = Span::from_range(logos.span());
        let slice = logos.slice();

        match token_result {
            Ok(raw) => match raw {
                RawToken::LineComment => {}
                RawToken::Newline => {
                    result.push(Token::new(TokenKind::Newline, span));
                }
                _ => {
                    let kind = convert_token(raw, slice, interner);
                    result.push(Token::new(kind, span));
                }
            },
            Err(()) => {
                result.push(Token::new(TokenKind::Error, span));
            }
        }
    }

    // Add EOF token
    let eof_pos = u32::try_from(source.len())
        .unwrap_or_else(|_| panic!("source file exceeds {} bytes", u32::MAX));
    result.push(Token::new(TokenKind::Eof, Span::point(eof_pos)));

    result
}

/// Convert a raw token to a `TokenKind`, interning strings.
fn convert_token(raw: RawToken, slice: &str, interner: &StringInterner) -> TokenKind {
    match raw {
        // Literals
        RawToken::Int(n) => TokenKind::Int(n),
        RawToken::Address => {
            // Strip the `0x` prefix; the digits are re-rendered at emission
            TokenKind::Address(interner.intern(&slice[2..]))
        }
        RawToken::String => {
            let content = &slice[1..slice.len() - 1];
            let unescaped = unescape_string(content);
            TokenKind::String(interner.intern(&unescaped))
        }
        RawToken::Ident => TokenKind::Ident(interner.intern(slice)),

        // Keywords
        RawToken::Contract => TokenKind::Contract,
        RawToken::Var => TokenKind::Var,
        RawToken::Event => TokenKind::Event,
        RawToken::Func => TokenKind::Func,
        RawToken::Init => TokenKind::Init,
        RawToken::Public => TokenKind::Public,
        RawToken::Mutating => TokenKind::Mutating,
        RawToken::Return => TokenKind::Return,
        RawToken::If => TokenKind::If,
        RawToken::Else => TokenKind::Else,
        RawToken::SelfLower => TokenKind::SelfLower,
        RawToken::True => TokenKind::True,
        RawToken::False => TokenKind::False,
        RawToken::Inout => TokenKind::Inout,

        // Type keywords
        RawToken::AddressType => TokenKind::AddressType,
        RawToken::IntType => TokenKind::IntType,
        RawToken::BoolType => TokenKind::BoolType,
        RawToken::StringType => TokenKind::StringType,

        // Punctuation
        RawToken::LParen => TokenKind::LParen,
        RawToken::RParen => TokenKind::RParen,
        RawToken::LBrace => TokenKind::LBrace,
        RawToken::RBrace => TokenKind::RBrace,
        RawToken::LBracket => TokenKind::LBracket,
        RawToken::RBracket => TokenKind::RBracket,
        RawToken::DoubleColon => TokenKind::DoubleColon,
        RawToken::Colon => TokenKind::Colon,
        RawToken::Comma => TokenKind::Comma,
        RawToken::Arrow => TokenKind::Arrow,
        RawToken::Dot => TokenKind::Dot,

        // Operators
        RawToken::Eq => TokenKind::Eq,
        RawToken::EqEq => TokenKind::EqEq,
        RawToken::NotEq => TokenKind::NotEq,
        RawToken::Lt => TokenKind::Lt,
        RawToken::LtEq => TokenKind::LtEq,
        RawToken::Gt => TokenKind::Gt,
        RawToken::GtEq => TokenKind::GtEq,
        RawToken::Plus => TokenKind::Plus,
        RawToken::Minus => TokenKind::Minus,
        RawToken::Star => TokenKind::Star,
        RawToken::Slash => TokenKind::Slash,
        RawToken::Percent => TokenKind::Percent,

        // Trivia (handled before conversion)
        RawToken::LineComment | RawToken::Newline => {
            unreachable!("trivia is handled separately")
        }
    }
}

/// Process string escape sequences.
fn unescape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('\\') | None => result.push('\\'),
                Some('"') => result.push('"'),
                Some('0') => result.push('\0'),
                Some(c) => {
                    result.push('\\');
                    result.push(c);
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}
