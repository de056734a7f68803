//! Declaration grammar.
//!
//! One contract declaration, then any number of behavior blocks:
//!
//! ```text
//! module         := contract_decl behavior_decl*
//! contract_decl  := "contract" IDENT "{" (var_decl | event_decl)* "}"
//! var_decl       := "var" IDENT ":" type
//! event_decl     := "event" IDENT "(" params? ")"
//! behavior_decl  := IDENT "::" caller_group "{" member* "}"
//! caller_group   := "[" IDENT ("," IDENT)* "]"
//! member         := ("public"|"mutating")* ("func" IDENT sig block | "init" sig block)
//! ```

use quartz_diagnostic::Diagnostic;
use quartz_ir::{
    BasicType, BehaviorMember, CallerCapability, ContractBehaviorDeclaration,
    ContractDeclaration, EventDeclaration, FunctionDeclaration, Modifiers, Parameter, RawType,
    SpecialDeclaration, TokenKind, TopLevelModule, VariableDeclaration,
};

use crate::Parser;

impl Parser<'_> {
    /// Parse a whole compilation unit.
    pub fn parse_module(&mut self) -> Result<TopLevelModule, Diagnostic> {
        self.skip_newlines();
        let contract = self.parse_contract()?;

        let mut behaviors = Vec::new();
        loop {
            self.skip_newlines();
            if self.is_at_end() {
                break;
            }
            behaviors.push(self.parse_behavior()?);
        }

        Ok(TopLevelModule { contract, behaviors })
    }

    /// Parse `contract IDENT { var_decl* event_decl* }`.
    fn parse_contract(&mut self) -> Result<ContractDeclaration, Diagnostic> {
        self.expect(TokenKind::Contract)?;
        let identifier = self.expect_ident()?;
        self.expect(TokenKind::LBrace)?;

        let mut fields = Vec::new();
        let mut events = Vec::new();
        loop {
            self.skip_newlines();
            if self.check(TokenKind::RBrace) {
                self.advance();
                break;
            }
            match self.current().kind {
                TokenKind::Var => {
                    self.advance();
                    let identifier = self.expect_ident()?;
                    self.expect(TokenKind::Colon)?;
                    let ty = self.parse_type()?;
                    fields.push(VariableDeclaration { identifier, ty });
                }
                TokenKind::Event => {
                    self.advance();
                    let identifier = self.expect_ident()?;
                    self.expect(TokenKind::LParen)?;
                    let params = self.parse_params()?;
                    self.expect(TokenKind::RParen)?;
                    events.push(EventDeclaration { identifier, params });
                }
                _ => {
                    let found = self.current();
                    let describe = self.describe_found(found.kind);
                    return Err(quartz_diagnostic::unexpected_token(
                        found.span,
                        "`var`, `event`, or `}`",
                        &describe,
                    ));
                }
            }
        }

        Ok(ContractDeclaration { identifier, fields, events })
    }

    /// Parse `IDENT :: [caps] { members }`.
    fn parse_behavior(&mut self) -> Result<ContractBehaviorDeclaration, Diagnostic> {
        let contract = self.expect_ident()?;
        self.expect(TokenKind::DoubleColon)?;

        self.expect(TokenKind::LBracket)?;
        let mut capabilities = vec![CallerCapability::new(self.expect_ident()?)];
        while self.check(TokenKind::Comma) {
            self.advance();
            capabilities.push(CallerCapability::new(self.expect_ident()?));
        }
        self.expect(TokenKind::RBracket)?;

        self.expect(TokenKind::LBrace)?;
        let mut members = Vec::new();
        loop {
            self.skip_newlines();
            if self.check(TokenKind::RBrace) {
                self.advance();
                break;
            }
            members.push(self.parse_member()?);
        }

        Ok(ContractBehaviorDeclaration { contract, capabilities, members })
    }

    /// Parse one function or initializer declaration.
    fn parse_member(&mut self) -> Result<BehaviorMember, Diagnostic> {
        let start = self.current().span;

        let mut modifiers = Modifiers::empty();
        loop {
            match self.current().kind {
                TokenKind::Public => {
                    self.advance();
                    modifiers |= Modifiers::PUBLIC;
                }
                TokenKind::Mutating => {
                    self.advance();
                    modifiers |= Modifiers::MUTATING;
                }
                _ => break,
            }
        }

        match self.current().kind {
            // `func init(...)` is the initializer, not an ordinary function.
            TokenKind::Func if self.token_at(self.pos + 1).kind == TokenKind::Init => {
                self.advance();
                self.advance();
                self.expect(TokenKind::LParen)?;
                let params = self.parse_params()?;
                self.expect(TokenKind::RParen)?;
                let body = self.parse_block()?;
                let span = start.extend_to(self.token_at(self.pos.saturating_sub(1)).span.end);
                Ok(BehaviorMember::Special(SpecialDeclaration { modifiers, params, body, span }))
            }
            TokenKind::Func => {
                self.advance();
                let identifier = self.expect_ident()?;
                self.expect(TokenKind::LParen)?;
                let params = self.parse_params()?;
                self.expect(TokenKind::RParen)?;
                let result = if self.check(TokenKind::Arrow) {
                    self.advance();
                    Some(self.parse_type()?)
                } else {
                    None
                };
                let body = self.parse_block()?;
                let span = start.extend_to(self.token_at(self.pos.saturating_sub(1)).span.end);
                Ok(BehaviorMember::Function(FunctionDeclaration {
                    modifiers,
                    identifier,
                    params,
                    result,
                    body,
                    span,
                }))
            }
            TokenKind::Init => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let params = self.parse_params()?;
                self.expect(TokenKind::RParen)?;
                let body = self.parse_block()?;
                let span = start.extend_to(self.token_at(self.pos.saturating_sub(1)).span.end);
                Ok(BehaviorMember::Special(SpecialDeclaration { modifiers, params, body, span }))
            }
            _ => {
                let found = self.current();
                let describe = self.describe_found(found.kind);
                Err(quartz_diagnostic::unexpected_token(
                    found.span,
                    "`func` or `init`",
                    &describe,
                ))
            }
        }
    }

    /// Parse `IDENT : type ("," IDENT : type)*`, stopping before `)`.
    fn parse_params(&mut self) -> Result<Vec<Parameter>, Diagnostic> {
        let mut params = Vec::new();
        if self.check(TokenKind::RParen) {
            return Ok(params);
        }
        loop {
            let identifier = self.expect_ident()?;
            self.expect(TokenKind::Colon)?;
            let ty = self.parse_type()?;
            params.push(Parameter { identifier, ty });
            if self.check(TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        Ok(params)
    }

    /// Parse a type expression.
    ///
    /// `inout T`, primitives, user-defined names, `[T]` arrays,
    /// `[K: V]` dictionaries, and `T[n]` fixed arrays.
    pub(crate) fn parse_type(&mut self) -> Result<RawType, Diagnostic> {
        let base = match self.current().kind {
            TokenKind::Inout => {
                self.advance();
                let inner = self.parse_type()?;
                return Ok(RawType::Inout(Box::new(inner)));
            }
            TokenKind::AddressType => {
                self.advance();
                RawType::Basic(BasicType::Address)
            }
            TokenKind::IntType => {
                self.advance();
                RawType::Basic(BasicType::Int)
            }
            TokenKind::BoolType => {
                self.advance();
                RawType::Basic(BasicType::Bool)
            }
            TokenKind::StringType => {
                self.advance();
                RawType::Basic(BasicType::String)
            }
            TokenKind::Ident(name) => {
                self.advance();
                RawType::UserDefined(name)
            }
            TokenKind::LBracket => {
                self.advance();
                let key = self.parse_type()?;
                let ty = if self.check(TokenKind::Colon) {
                    self.advance();
                    let value = self.parse_type()?;
                    RawType::Dictionary(Box::new(key), Box::new(value))
                } else {
                    RawType::Array(Box::new(key))
                };
                self.expect(TokenKind::RBracket)?;
                ty
            }
            _ => {
                let found = self.current();
                return Err(quartz_diagnostic::Diagnostic::error(
                    quartz_diagnostic::ErrorCode::E1004,
                )
                .with_message(format!("expected type, found {}", found.kind.describe()))
                .with_label(found.span, "expected type here"));
            }
        };

        // Fixed-size array suffix: T[n]
        if self.check(TokenKind::LBracket) {
            if let TokenKind::Int(size) = self.token_at(self.pos + 1).kind {
                self.advance(); // [
                self.advance(); // n
                self.expect(TokenKind::RBracket)?;
                return Ok(RawType::FixedArray(Box::new(base), size));
            }
        }

        Ok(base)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use quartz_ir::{ExprArena, StringInterner};

    fn parse_type_from(source: &str) -> RawType {
        let interner = StringInterner::new();
        let tokens = quartz_lexer::lex(source, &interner);
        let mut arena = ExprArena::new();
        let mut parser = Parser::new(tokens.as_slice(), &mut arena, &interner);
        parser.parse_type().unwrap_or_else(|d| panic!("type parse failed: {d}"))
    }

    #[test]
    fn test_parse_basic_types() {
        assert_eq!(parse_type_from("Address"), RawType::Basic(BasicType::Address));
        assert_eq!(parse_type_from("Int"), RawType::Basic(BasicType::Int));
        assert_eq!(parse_type_from("Bool"), RawType::Basic(BasicType::Bool));
        assert_eq!(parse_type_from("String"), RawType::Basic(BasicType::String));
    }

    #[test]
    fn test_parse_inout_type() {
        let ty = parse_type_from("inout Int");
        assert_eq!(ty, RawType::Inout(Box::new(RawType::Basic(BasicType::Int))));
    }

    #[test]
    fn test_parse_collection_types() {
        assert_eq!(
            parse_type_from("[Int]"),
            RawType::Array(Box::new(RawType::Basic(BasicType::Int)))
        );
        assert_eq!(
            parse_type_from("[Address: Int]"),
            RawType::Dictionary(
                Box::new(RawType::Basic(BasicType::Address)),
                Box::new(RawType::Basic(BasicType::Int))
            )
        );
        assert_eq!(
            parse_type_from("Int[4]"),
            RawType::FixedArray(Box::new(RawType::Basic(BasicType::Int)), 4)
        );
    }
}
