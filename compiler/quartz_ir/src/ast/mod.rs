//! AST node types.
//!
//! Declarations are plain owned structs; expressions and statements are
//! arena-allocated with id/range references (see [`crate::ExprArena`]).

mod operators;
mod types;
mod expr;
mod decl;

pub use operators::BinaryOp;
pub use types::{BasicType, RawType};
pub use expr::{Expr, ExprKind, Literal, Stmt, StmtKind};
pub use decl::{
    BehaviorMember, CallerCapability, ContractBehaviorDeclaration, ContractDeclaration,
    EventDeclaration, FunctionDeclaration, Identifier, Modifiers, Parameter, SpecialDeclaration,
    TopLevelModule, VariableDeclaration,
};
