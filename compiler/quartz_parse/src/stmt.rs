//! Statement grammar.
//!
//! Statements are newline-terminated inside `{ }` blocks:
//! expression statements, `return`, and `if`/`else`.

use quartz_diagnostic::Diagnostic;
use quartz_ir::{Stmt, StmtKind, StmtRange, TokenKind};

use crate::Parser;

impl Parser<'_> {
    /// Parse `{ statement* }` and allocate the block contiguously.
    pub(crate) fn parse_block(&mut self) -> Result<StmtRange, Diagnostic> {
        self.expect(TokenKind::LBrace)?;

        let mut stmts = Vec::new();
        loop {
            self.skip_newlines();
            if self.check(TokenKind::RBrace) {
                self.advance();
                break;
            }
            if self.is_at_end() {
                let found = self.current();
                return Err(quartz_diagnostic::Diagnostic::error(
                    quartz_diagnostic::ErrorCode::E1005,
                )
                .with_message("unclosed block: expected `}`")
                .with_label(found.span, "block is still open here"));
            }
            stmts.push(self.parse_statement()?);
        }

        Ok(self.arena.alloc_stmts(stmts))
    }

    /// Parse a single statement.
    fn parse_statement(&mut self) -> Result<Stmt, Diagnostic> {
        match self.current().kind {
            TokenKind::Return => self.parse_return(),
            TokenKind::If => self.parse_if(),
            _ => {
                let (lo, hi) = self.statement_bounds();
                let expr = self.parse_expression(lo, hi)?;
                let span = self.token_at(lo).span.merge(self.token_at(hi - 1).span);
                self.pos = hi;
                Ok(Stmt::new(StmtKind::Expression(expr), span))
            }
        }
    }

    /// Parse `return expr?`.
    fn parse_return(&mut self) -> Result<Stmt, Diagnostic> {
        let ret_span = self.current().span;
        self.advance();

        let (lo, hi) = self.statement_bounds();
        if lo == hi {
            return Ok(Stmt::new(StmtKind::Return(None), ret_span));
        }
        let value = self.parse_expression(lo, hi)?;
        let span = ret_span.merge(self.token_at(hi - 1).span);
        self.pos = hi;
        Ok(Stmt::new(StmtKind::Return(Some(value)), span))
    }

    /// Parse `if cond { then } ("else" { else })?`.
    fn parse_if(&mut self) -> Result<Stmt, Diagnostic> {
        let if_span = self.current().span;
        self.advance();

        // The condition runs up to the block opener.
        let lo = self.pos;
        let mut hi = lo;
        let mut depth = 0u32;
        loop {
            let kind = self.token_at(hi).kind;
            match kind {
                TokenKind::LBrace if depth == 0 => break,
                _ if kind.is_open_bracket() => depth += 1,
                _ if kind.is_close_bracket() => depth = depth.saturating_sub(1),
                TokenKind::Newline | TokenKind::Eof => {
                    let found = self.token_at(hi);
                    return Err(quartz_diagnostic::unexpected_token(
                        found.span,
                        "`{` after `if` condition",
                        found.kind.describe(),
                    ));
                }
                _ => {}
            }
            hi += 1;
        }

        let cond = self.parse_expression(lo, hi)?;
        self.pos = hi;
        let then_block = self.parse_block()?;

        // `else` may sit on the same line or after a newline.
        let before_else = self.pos;
        self.skip_newlines();
        let else_block = if self.check(TokenKind::Else) {
            self.advance();
            self.parse_block()?
        } else {
            self.pos = before_else;
            StmtRange::EMPTY
        };

        let span = if_span.extend_to(self.token_at(self.pos.saturating_sub(1)).span.end);
        Ok(Stmt::new(StmtKind::If { cond, then_block, else_block }, span))
    }

    /// Bounds `[lo, hi)` of the expression tokens of the current
    /// statement: everything up to the first newline, `}`, or EOF at
    /// bracket depth zero.
    fn statement_bounds(&self) -> (usize, usize) {
        let lo = self.pos;
        let mut hi = lo;
        let mut depth = 0u32;
        loop {
            let kind = self.token_at(hi).kind;
            match kind {
                TokenKind::Eof => break,
                TokenKind::Newline if depth == 0 => break,
                TokenKind::RBrace if depth == 0 => break,
                _ if kind.is_open_bracket() => depth += 1,
                _ if kind.is_close_bracket() => depth = depth.saturating_sub(1),
                _ => {}
            }
            hi += 1;
        }
        (lo, hi)
    }
}
