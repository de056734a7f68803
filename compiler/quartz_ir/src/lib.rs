//! Quartz IR - Source-Level Data Structures
//!
//! This crate contains the core data structures shared by every phase of
//! the Quartz compiler:
//! - Spans for source locations
//! - Names for interned identifiers
//! - Tokens and `TokenList` for lexer output
//! - AST nodes (declarations, expressions, statements, raw types)
//! - Arena allocation for expressions and statements
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: Strings → Name(u32)
//! - **Flatten Everything**: No Box<Expr>, use ExprId(u32) indices
//! - **Declarations stay simple**: contract/behavior/function declarations
//!   are plain owned structs; only the indirectly recursive expression and
//!   statement trees live in the arena.

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod span;
mod name;
mod token;
mod interner;
mod ids;
pub mod ast;
mod arena;

pub use span::Span;
pub use name::Name;
pub use token::{Token, TokenKind, TokenList};
pub use interner::{SharedInterner, StringInterner};
pub use ids::{ExprId, ExprRange, StmtId, StmtRange};
pub use ast::{
    BasicType, BehaviorMember, BinaryOp, CallerCapability, ContractBehaviorDeclaration,
    ContractDeclaration, EventDeclaration, Expr, ExprKind, FunctionDeclaration, Identifier,
    Literal, Modifiers, Parameter, RawType, SpecialDeclaration, Stmt, StmtKind, TopLevelModule,
    VariableDeclaration,
};
pub use arena::ExprArena;
