//! Parser for the Quartz compiler.
//!
//! Declarations parse by cursor-based recursive descent. Expressions use
//! lowest-precedence-first splitting over the token slice: for each
//! operator level from loosest to tightest, the slice is split at an
//! occurrence found at bracket depth zero (see `expr.rs`).
//!
//! Statements are newline-terminated; blank lines and comments are free.

mod expr;
mod decl;
mod stmt;

use quartz_diagnostic::Diagnostic;
use quartz_ir::{
    ExprArena, Identifier, StringInterner, Token, TokenKind, TokenList, TopLevelModule,
};

/// Parse a token list into a module, allocating expressions into `arena`.
///
/// The parser stops at the first syntax error; the returned list carries
/// the diagnostics keyed by source location.
pub fn parse(
    tokens: &TokenList,
    arena: &mut ExprArena,
    interner: &StringInterner,
) -> Result<TopLevelModule, Vec<Diagnostic>> {
    let mut parser = Parser::new(tokens.as_slice(), arena, interner);
    parser.parse_module().map_err(|diag| vec![diag])
}

/// Recursive-descent parser over a token slice.
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    arena: &'a mut ExprArena,
    interner: &'a StringInterner,
}

impl<'a> Parser<'a> {
    pub fn new(
        tokens: &'a [Token],
        arena: &'a mut ExprArena,
        interner: &'a StringInterner,
    ) -> Self {
        Parser { tokens, pos: 0, arena, interner }
    }

    // ===== Cursor primitives =====

    /// The current token; the trailing EOF token is sticky.
    pub(crate) fn current(&self) -> Token {
        self.token_at(self.pos)
    }

    /// The token at an absolute position, clamped to EOF.
    pub(crate) fn token_at(&self, pos: usize) -> Token {
        let idx = pos.min(self.tokens.len().saturating_sub(1));
        self.tokens[idx]
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eof)
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.current();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    /// Consume a token of the given kind or report what was expected.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Token, Diagnostic> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let found = self.current();
            Err(quartz_diagnostic::unexpected_token(
                found.span,
                kind.describe(),
                &self.describe_found(found.kind),
            ))
        }
    }

    /// Consume an identifier token or report what was expected.
    pub(crate) fn expect_ident(&mut self) -> Result<Identifier, Diagnostic> {
        let token = self.current();
        if let TokenKind::Ident(name) = token.kind {
            self.advance();
            Ok(Identifier::new(name, token.span))
        } else {
            Err(quartz_diagnostic::Diagnostic::error(quartz_diagnostic::ErrorCode::E1003)
                .with_message(format!(
                    "expected identifier, found {}",
                    self.describe_found(token.kind)
                ))
                .with_label(token.span, "expected identifier here"))
        }
    }

    /// Describe a token for diagnostics, quoting identifier text.
    pub(crate) fn describe_found(&self, kind: TokenKind) -> String {
        if let TokenKind::Ident(name) = kind {
            format!("identifier `{}`", self.interner.lookup(name))
        } else {
            kind.describe().to_owned()
        }
    }

    /// Skip any number of newline tokens.
    pub(crate) fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quartz_ir::{BehaviorMember, ExprKind, StmtKind};

    fn parse_source(source: &str) -> (TopLevelModule, ExprArena, StringInterner) {
        let interner = StringInterner::new();
        let tokens = quartz_lexer::lex(source, &interner);
        let mut arena = ExprArena::new();
        let module = parse(&tokens, &mut arena, &interner)
            .unwrap_or_else(|diags| panic!("parse failed: {:?}", diags));
        (module, arena, interner)
    }

    #[test]
    fn test_parse_empty_contract() {
        let (module, _, interner) = parse_source("contract Empty {}\nEmpty :: [any] {}\n");

        assert_eq!(interner.lookup(module.contract.identifier.name), "Empty");
        assert!(module.contract.fields.is_empty());
        assert_eq!(module.behaviors.len(), 1);
        assert!(module.behaviors[0].capabilities[0].is_any(&interner));
    }

    #[test]
    fn test_parse_fields_in_order() {
        let (module, _, interner) = parse_source(
            "contract Bank {\n  var owner: Address\n  var balance: Int\n}\nBank :: [any] {}\n",
        );

        let names: Vec<_> = module
            .contract
            .fields
            .iter()
            .map(|f| interner.lookup(f.identifier.name))
            .collect();
        assert_eq!(names, vec!["owner", "balance"]);
    }

    #[test]
    fn test_parse_initializer_and_function() {
        let (module, arena, _) = parse_source(
            "contract C { var x: Int }\n\
             C :: [any] {\n\
               public mutating func set(v: Int) {\n\
                 self.x = v\n\
               }\n\
               public init(v: Int) {\n\
                 self.x = v\n\
               }\n\
             }\n",
        );

        let members = &module.behaviors[0].members;
        assert_eq!(members.len(), 2);
        let BehaviorMember::Function(func) = &members[0] else {
            panic!("expected function first");
        };
        assert!(func.is_public());
        assert!(func.is_mutating());
        assert_eq!(func.params.len(), 1);

        let body = arena.get_stmt_range(func.body);
        assert_eq!(body.len(), 1);
        let StmtKind::Expression(assign) = body[0].kind else {
            panic!("expected expression statement");
        };
        assert!(matches!(
            arena.get_expr(assign).kind,
            ExprKind::Binary { op: quartz_ir::BinaryOp::Assign, .. }
        ));

        assert!(matches!(members[1], BehaviorMember::Special(_)));
    }

    #[test]
    fn test_parse_event_declaration() {
        let (module, _, interner) = parse_source(
            "contract C {\n  var x: Int\n  event Deposit(amount: Int)\n}\nC :: [any] {}\n",
        );

        assert_eq!(module.contract.events.len(), 1);
        let event = &module.contract.events[0];
        assert_eq!(interner.lookup(event.identifier.name), "Deposit");
        assert_eq!(event.params.len(), 1);
    }

    #[test]
    fn test_parse_error_reports_expected() {
        let interner = StringInterner::new();
        let tokens = quartz_lexer::lex("contract {", &interner);
        let mut arena = ExprArena::new();
        let err = parse(&tokens, &mut arena, &interner).unwrap_err();

        assert_eq!(err.len(), 1);
        assert!(err[0].message.contains("identifier"));
    }
}
