//! Expression grammar.
//!
//! Lowest-precedence-first splitting: scan the token slice at bracket
//! depth zero for binary operators, pick the loosest-binding one present,
//! and split the slice there. Assignment splits at its first occurrence
//! (right-associative); every other level splits at its last occurrence
//! (left-associative). Slices with no top-level operator parse as primary
//! expressions.

use quartz_diagnostic::{Diagnostic, ErrorCode};
use quartz_ir::{BinaryOp, Expr, ExprId, ExprKind, Literal, Span, TokenKind};

use crate::Parser;

/// Red zone / stack growth parameters for deep expression nesting.
const RED_ZONE: usize = 64 * 1024;
const STACK_GROW: usize = 1024 * 1024;

impl Parser<'_> {
    /// Parse the expression held in tokens `[lo, hi)`.
    pub(crate) fn parse_expression(&mut self, lo: usize, hi: usize) -> Result<ExprId, Diagnostic> {
        stacker::maybe_grow(RED_ZONE, STACK_GROW, || self.parse_expression_inner(lo, hi))
    }

    fn parse_expression_inner(&mut self, lo: usize, hi: usize) -> Result<ExprId, Diagnostic> {
        if lo >= hi {
            let at = self.token_at(lo);
            return Err(Diagnostic::error(ErrorCode::E1002)
                .with_message(format!("expected expression, found {}", at.kind.describe()))
                .with_label(at.span, "expected expression here"));
        }

        if let Some((split, op)) = self.find_split(lo, hi)? {
            let lhs = self.parse_expression(lo, split)?;
            let rhs = self.parse_expression(split + 1, hi)?;
            let span = self.slice_span(lo, hi);
            return Ok(self
                .arena
                .alloc_expr(Expr::new(ExprKind::Binary { op, lhs, rhs }, span)));
        }

        self.parse_primary(lo, hi)
    }

    /// Find the operator to split at: the loosest-binding operator at
    /// bracket depth zero. Among equals, the first occurrence for the
    /// right-associative assignment, the last otherwise.
    fn find_split(&self, lo: usize, hi: usize) -> Result<Option<(usize, BinaryOp)>, Diagnostic> {
        let mut best: Option<(usize, BinaryOp)> = None;
        let mut depth = 0u32;

        for i in lo..hi {
            let kind = self.token_at(i).kind;
            if kind.is_open_bracket() {
                depth += 1;
            } else if kind.is_close_bracket() {
                if depth == 0 {
                    let at = self.token_at(i);
                    return Err(Diagnostic::error(ErrorCode::E1005)
                        .with_message(format!("unbalanced {}", kind.describe()))
                        .with_label(at.span, "closes nothing"));
                }
                depth -= 1;
            } else if depth == 0 {
                if let Some(op) = BinaryOp::from_token(kind) {
                    best = match best {
                        None => Some((i, op)),
                        Some((_, prev)) if op.precedence() < prev.precedence() => Some((i, op)),
                        Some((_, prev))
                            if op.precedence() == prev.precedence()
                                && !op.is_right_associative() =>
                        {
                            Some((i, op))
                        }
                        other => other,
                    };
                }
            }
        }

        Ok(best)
    }

    /// Parse an operator-free slice: literal, identifier, `self`, call,
    /// local variable declaration, or bracketed sub-expression.
    fn parse_primary(&mut self, lo: usize, hi: usize) -> Result<ExprId, Diagnostic> {
        let first = self.token_at(lo);
        let span = self.slice_span(lo, hi);

        // Single-token primaries
        if hi - lo == 1 {
            let kind = match first.kind {
                TokenKind::Ident(name) => ExprKind::Identifier(name),
                TokenKind::SelfLower => ExprKind::SelfRef,
                TokenKind::Int(n) => ExprKind::Literal(Literal::Int(n)),
                TokenKind::Address(digits) => ExprKind::Literal(Literal::Address(digits)),
                TokenKind::String(s) => ExprKind::Literal(Literal::String(s)),
                TokenKind::True => ExprKind::Literal(Literal::Bool(true)),
                TokenKind::False => ExprKind::Literal(Literal::Bool(false)),
                _ => {
                    return Err(Diagnostic::error(ErrorCode::E1002)
                        .with_message(format!(
                            "expected expression, found {}",
                            first.kind.describe()
                        ))
                        .with_label(first.span, "expected expression here"));
                }
            };
            return Ok(self.arena.alloc_expr(Expr::new(kind, span)));
        }

        match first.kind {
            // Call: IDENT ( args )
            TokenKind::Ident(name)
                if self.token_at(lo + 1).kind == TokenKind::LParen
                    && self.matching_close(lo + 1, hi) == Some(hi - 1) =>
            {
                let args = self.parse_call_args(lo + 2, hi - 1)?;
                let range = self.arena.alloc_expr_list(args);
                Ok(self
                    .arena
                    .alloc_expr(Expr::new(ExprKind::Call { name, args: range }, span)))
            }

            // Bracketed: ( expr )
            TokenKind::LParen if self.matching_close(lo, hi) == Some(hi - 1) => {
                let inner = self.parse_expression(lo + 1, hi - 1)?;
                Ok(self
                    .arena
                    .alloc_expr(Expr::new(ExprKind::Bracketed(inner), span)))
            }

            // Local declaration: var IDENT : type
            TokenKind::Var => {
                let name = {
                    let token = self.token_at(lo + 1);
                    if let TokenKind::Ident(name) = token.kind {
                        name
                    } else {
                        return Err(Diagnostic::error(ErrorCode::E1003)
                            .with_message(format!(
                                "expected identifier after `var`, found {}",
                                token.kind.describe()
                            ))
                            .with_label(token.span, "expected identifier here"));
                    }
                };
                if self.token_at(lo + 2).kind != TokenKind::Colon {
                    let token = self.token_at(lo + 2);
                    return Err(quartz_diagnostic::unexpected_token(
                        token.span,
                        "`:`",
                        token.kind.describe(),
                    ));
                }
                // Re-use the cursor-based type parser over the tail.
                self.pos = lo + 3;
                let ty = self.parse_type()?;
                if self.pos != hi {
                    let token = self.current();
                    return Err(quartz_diagnostic::unexpected_token(
                        token.span,
                        "end of declaration",
                        token.kind.describe(),
                    ));
                }
                Ok(self
                    .arena
                    .alloc_expr(Expr::new(ExprKind::VariableDeclaration { name, ty }, span)))
            }

            _ => Err(Diagnostic::error(ErrorCode::E1002)
                .with_message(format!(
                    "expected expression, found {}",
                    first.kind.describe()
                ))
                .with_label(first.span, "expected expression here")),
        }
    }

    /// Parse comma-separated call arguments in `[lo, hi)`.
    fn parse_call_args(&mut self, lo: usize, hi: usize) -> Result<Vec<ExprId>, Diagnostic> {
        let mut args = Vec::new();
        if lo >= hi {
            return Ok(args);
        }

        let mut start = lo;
        let mut depth = 0u32;
        for i in lo..hi {
            let kind = self.token_at(i).kind;
            if kind.is_open_bracket() {
                depth += 1;
            } else if kind.is_close_bracket() {
                depth = depth.saturating_sub(1);
            } else if depth == 0 && kind == TokenKind::Comma {
                args.push(self.parse_expression(start, i)?);
                start = i + 1;
            }
        }
        args.push(self.parse_expression(start, hi)?);

        Ok(args)
    }

    /// Position of the bracket closing the opener at `open`, scanning no
    /// further than `hi`.
    fn matching_close(&self, open: usize, hi: usize) -> Option<usize> {
        let mut depth = 0u32;
        for i in open..hi {
            let kind = self.token_at(i).kind;
            if kind.is_open_bracket() {
                depth += 1;
            } else if kind.is_close_bracket() {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
        }
        None
    }

    /// Merged span of the tokens in `[lo, hi)`.
    fn slice_span(&self, lo: usize, hi: usize) -> Span {
        self.token_at(lo)
            .span
            .merge(self.token_at(hi.saturating_sub(1)).span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parser;
    use quartz_ir::{ExprArena, StringInterner};

    fn parse_expr(source: &str) -> (ExprId, ExprArena, StringInterner) {
        let interner = StringInterner::new();
        let tokens = quartz_lexer::lex(source, &interner);
        let mut arena = ExprArena::new();
        let id = {
            let mut parser = Parser::new(tokens.as_slice(), &mut arena, &interner);
            let hi = tokens.len() - 1; // stop before EOF
            parser
                .parse_expression(0, hi)
                .unwrap_or_else(|d| panic!("expression parse failed: {d}"))
        };
        (id, arena, interner)
    }

    fn op_of(arena: &ExprArena, id: ExprId) -> BinaryOp {
        match arena.get_expr(id).kind {
            ExprKind::Binary { op, .. } => op,
            ref other => panic!("expected binary expression, got {other:?}"),
        }
    }

    #[test]
    fn test_assignment_splits_first() {
        let (id, arena, _) = parse_expr("x = y + 1");
        assert_eq!(op_of(&arena, id), BinaryOp::Assign);

        let ExprKind::Binary { rhs, .. } = arena.get_expr(id).kind else {
            unreachable!()
        };
        assert_eq!(op_of(&arena, rhs), BinaryOp::Add);
    }

    #[test]
    fn test_additive_left_associative() {
        // a - b + c must parse as (a - b) + c
        let (id, arena, _) = parse_expr("a - b + c");
        assert_eq!(op_of(&arena, id), BinaryOp::Add);

        let ExprKind::Binary { lhs, .. } = arena.get_expr(id).kind else {
            unreachable!()
        };
        assert_eq!(op_of(&arena, lhs), BinaryOp::Sub);
    }

    #[test]
    fn test_multiplicative_binds_tighter() {
        let (id, arena, _) = parse_expr("a + b * c");
        assert_eq!(op_of(&arena, id), BinaryOp::Add);
    }

    #[test]
    fn test_comparison_below_additive() {
        let (id, arena, _) = parse_expr("a + 1 == b");
        assert_eq!(op_of(&arena, id), BinaryOp::Eq);
    }

    #[test]
    fn test_dot_is_tightest() {
        let (id, arena, _) = parse_expr("self.x + 1");
        assert_eq!(op_of(&arena, id), BinaryOp::Add);

        let ExprKind::Binary { lhs, .. } = arena.get_expr(id).kind else {
            unreachable!()
        };
        assert_eq!(op_of(&arena, lhs), BinaryOp::Dot);
    }

    #[test]
    fn test_dot_chain_left_associative() {
        let (id, arena, _) = parse_expr("a.b.c");
        let ExprKind::Binary { op, lhs, .. } = arena.get_expr(id).kind else {
            panic!("expected binary")
        };
        assert_eq!(op, BinaryOp::Dot);
        assert_eq!(op_of(&arena, lhs), BinaryOp::Dot);
    }

    #[test]
    fn test_brackets_shield_operators() {
        let (id, arena, _) = parse_expr("(a + b) * c");
        assert_eq!(op_of(&arena, id), BinaryOp::Mul);
    }

    #[test]
    fn test_call_with_arguments() {
        let (id, arena, interner) = parse_expr("send(a, b + c)");
        let ExprKind::Call { name, args } = arena.get_expr(id).kind else {
            panic!("expected call")
        };
        assert_eq!(interner.lookup(name), "send");
        assert_eq!(arena.get_expr_list(args).len(), 2);
    }

    #[test]
    fn test_method_call_via_dot() {
        let (id, arena, _) = parse_expr("wallet.credit(5)");
        let ExprKind::Binary { op, rhs, .. } = arena.get_expr(id).kind else {
            panic!("expected binary")
        };
        assert_eq!(op, BinaryOp::Dot);
        assert!(matches!(arena.get_expr(rhs).kind, ExprKind::Call { .. }));
    }

    #[test]
    fn test_var_declaration_expression() {
        let (id, arena, interner) = parse_expr("var total: Int");
        let ExprKind::VariableDeclaration { name, ref ty } = arena.get_expr(id).kind else {
            panic!("expected declaration")
        };
        assert_eq!(interner.lookup(name), "total");
        assert_eq!(*ty, quartz_ir::RawType::Basic(quartz_ir::BasicType::Int));
    }

    #[test]
    fn test_empty_slice_is_error() {
        let interner = StringInterner::new();
        let tokens = quartz_lexer::lex("", &interner);
        let mut arena = ExprArena::new();
        let mut parser = Parser::new(tokens.as_slice(), &mut arena, &interner);
        assert!(parser.parse_expression(0, 0).is_err());
    }
}
