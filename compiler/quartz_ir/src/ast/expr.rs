//! Expression and Statement Types
//!
//! All children are indices into the arena, not boxes. Nodes are immutable
//! after parsing; every node carries the span it was parsed from.

use std::fmt;

use crate::{ExprId, ExprRange, Name, Span, StmtRange};
use super::types::RawType;
use super::operators::BinaryOp;

/// Expression node.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {:?}", self.kind, self.span)
    }
}

/// Literal values.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Literal {
    /// Integer literal, already widened to u64.
    Int(u64),
    /// Address literal: interned hex digits without the `0x` prefix.
    Address(Name),
    Bool(bool),
    /// String literal (interned, unescaped).
    String(Name),
}

/// Expression variants.
#[derive(Clone, Eq, PartialEq, Hash)]
pub enum ExprKind {
    /// Variable, field, or capability reference.
    Identifier(Name),

    /// The enclosing-type receiver: `self`.
    SelfRef,

    /// Binary operation. `=` and `.` are operators here; the lowerer
    /// dispatches them to assignment and member access.
    Binary {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    },

    /// Function, event, or initializer call: `f(a, b)`.
    Call {
        name: Name,
        args: ExprRange,
    },

    /// Literal value.
    Literal(Literal),

    /// Local variable declaration in expression position:
    /// `var x: Int` (also the LHS of a declaring assignment).
    VariableDeclaration {
        name: Name,
        ty: RawType,
    },

    /// Parenthesized sub-expression; transparent to lowering.
    Bracketed(ExprId),
}

impl fmt::Debug for ExprKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprKind::Identifier(n) => write!(f, "Identifier({n:?})"),
            ExprKind::SelfRef => write!(f, "SelfRef"),
            ExprKind::Binary { op, lhs, rhs } => {
                write!(f, "Binary({op:?}, {lhs:?}, {rhs:?})")
            }
            ExprKind::Call { name, args } => write!(f, "Call({name:?}, {args:?})"),
            ExprKind::Literal(lit) => write!(f, "Literal({lit:?})"),
            ExprKind::VariableDeclaration { name, ty } => {
                write!(f, "VariableDeclaration({name:?}: {ty:?})")
            }
            ExprKind::Bracketed(inner) => write!(f, "Bracketed({inner:?})"),
        }
    }
}

/// Statement node.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }
}

impl fmt::Debug for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {:?}", self.kind, self.span)
    }
}

/// Statement variants.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum StmtKind {
    /// Expression statement (most commonly an assignment or a call).
    Expression(ExprId),

    /// `return` with an optional value.
    Return(Option<ExprId>),

    /// `if cond { then } else { else }`; the else block may be empty.
    If {
        cond: ExprId,
        then_block: StmtRange,
        else_block: StmtRange,
    },
}
