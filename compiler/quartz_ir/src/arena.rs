//! Arena allocation for the flat AST.
//!
//! Expressions and statements live in contiguous arrays; lists (call
//! arguments, block bodies) are ranges into side tables. Blocks collect
//! their statements into a scratch vector during parsing and allocate the
//! run contiguously when the block closes, so a `StmtRange` is always a
//! dense slice.

use std::fmt;

use crate::{ExprId, ExprRange, StmtId, StmtRange};
use crate::ast::{Expr, Stmt};

/// Contiguous storage for all expressions and statements in a module.
#[derive(Clone, Eq, PartialEq, Default)]
pub struct ExprArena {
    /// All expressions (indexed by ExprId).
    exprs: Vec<Expr>,

    /// Flattened expression lists (call arguments).
    expr_lists: Vec<ExprId>,

    /// All statements, block by block.
    stmts: Vec<Stmt>,
}

impl ExprArena {
    /// Create a new empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with estimated capacity based on source size.
    /// Heuristic: ~1 expression per 20 bytes of source.
    pub fn with_capacity(source_len: usize) -> Self {
        let estimated_exprs = source_len / 20;
        ExprArena {
            exprs: Vec::with_capacity(estimated_exprs),
            expr_lists: Vec::with_capacity(estimated_exprs / 2),
            stmts: Vec::with_capacity(estimated_exprs / 4),
        }
    }

    // ===== Expression allocation =====

    /// Allocate expression, return ID.
    #[inline]
    pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId::new(self.exprs.len() as u32);
        self.exprs.push(expr);
        id
    }

    /// Get expression by ID.
    ///
    /// # Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    #[track_caller]
    pub fn get_expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    /// Get number of expressions.
    #[inline]
    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    // ===== Expression list allocation =====

    /// Allocate expression list, return range.
    pub fn alloc_expr_list(&mut self, exprs: impl IntoIterator<Item = ExprId>) -> ExprRange {
        let start = self.expr_lists.len() as u32;
        self.expr_lists.extend(exprs);
        let len = (self.expr_lists.len() as u32 - start) as u16;
        ExprRange::new(start, len)
    }

    /// Get expression list by range.
    #[inline]
    pub fn get_expr_list(&self, range: ExprRange) -> &[ExprId] {
        let start = range.start as usize;
        let end = start + range.len as usize;
        &self.expr_lists[start..end]
    }

    // ===== Statement allocation =====

    /// Allocate a block of statements contiguously, return range.
    pub fn alloc_stmts(&mut self, stmts: impl IntoIterator<Item = Stmt>) -> StmtRange {
        let start = self.stmts.len() as u32;
        self.stmts.extend(stmts);
        let len = (self.stmts.len() as u32 - start) as u16;
        StmtRange::new(start, len)
    }

    /// Get statement by ID.
    ///
    /// # Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    #[track_caller]
    pub fn get_stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    /// Get statements by range.
    pub fn get_stmt_range(&self, range: StmtRange) -> &[Stmt] {
        let start = range.start as usize;
        let end = start + range.len as usize;
        &self.stmts[start..end]
    }

    /// Check if arena is empty.
    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }
}

impl fmt::Debug for ExprArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExprArena {{ {} exprs, {} lists, {} stmts }}",
            self.exprs.len(),
            self.expr_lists.len(),
            self.stmts.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::Span;
    use crate::ast::{ExprKind, Literal, StmtKind};

    #[test]
    fn test_alloc_expr() {
        let mut arena = ExprArena::new();

        let id1 = arena.alloc_expr(Expr::new(ExprKind::Literal(Literal::Int(1)), Span::new(0, 1)));
        let id2 = arena.alloc_expr(Expr::new(ExprKind::Literal(Literal::Int(2)), Span::new(2, 3)));

        assert_eq!(id1.index(), 0);
        assert_eq!(id2.index(), 1);
        assert_eq!(arena.expr_count(), 2);

        assert!(matches!(arena.get_expr(id1).kind, ExprKind::Literal(Literal::Int(1))));
        assert!(matches!(arena.get_expr(id2).kind, ExprKind::Literal(Literal::Int(2))));
    }

    #[test]
    fn test_alloc_expr_list() {
        let mut arena = ExprArena::new();

        let ids: Vec<_> = (0..3)
            .map(|i| {
                arena.alloc_expr(Expr::new(ExprKind::Literal(Literal::Int(i)), Span::DUMMY))
            })
            .collect();

        let range = arena.alloc_expr_list(ids.clone());

        assert_eq!(range.len(), 3);
        assert_eq!(arena.get_expr_list(range), ids.as_slice());
    }

    #[test]
    fn test_alloc_stmts_contiguous() {
        let mut arena = ExprArena::new();

        let e = arena.alloc_expr(Expr::new(ExprKind::Literal(Literal::Bool(true)), Span::DUMMY));
        let block = vec![
            Stmt::new(StmtKind::Expression(e), Span::DUMMY),
            Stmt::new(StmtKind::Return(None), Span::DUMMY),
        ];
        let range = arena.alloc_stmts(block);

        assert_eq!(range.len(), 2);
        let stmts = arena.get_stmt_range(range);
        assert!(matches!(stmts[0].kind, StmtKind::Expression(_)));
        assert!(matches!(stmts[1].kind, StmtKind::Return(None)));
    }
}
