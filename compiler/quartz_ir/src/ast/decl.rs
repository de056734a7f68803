//! Declaration Types
//!
//! Contract, behavior, event, and function declarations. One contract per
//! compilation unit; behavior blocks bind functions to a caller-capability
//! guard.

use std::fmt;

use bitflags::bitflags;

use crate::{Name, Span, StmtRange, StringInterner};
use super::types::RawType;

/// An identifier with its source location.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Identifier {
    pub name: Name,
    pub span: Span,
}

impl Identifier {
    pub fn new(name: Name, span: Span) -> Self {
        Identifier { name, span }
    }
}

bitflags! {
    /// Function modifiers.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct Modifiers: u8 {
        const PUBLIC = 1 << 0;
        const MUTATING = 1 << 1;
    }
}

/// A `var` declaration: contract field or local variable.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct VariableDeclaration {
    pub identifier: Identifier,
    pub ty: RawType,
}

/// A function or event parameter.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Parameter {
    pub identifier: Identifier,
    pub ty: RawType,
}

impl Parameter {
    /// Check whether the parameter is passed `inout`.
    pub fn is_inout(&self) -> bool {
        self.ty.is_inout()
    }
}

/// An `event` declaration inside a contract.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct EventDeclaration {
    pub identifier: Identifier,
    pub params: Vec<Parameter>,
}

/// The persistent-state declaration: `contract C { var x: Int ... }`.
///
/// Field order defines storage order.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ContractDeclaration {
    pub identifier: Identifier,
    pub fields: Vec<VariableDeclaration>,
    pub events: Vec<EventDeclaration>,
}

/// A caller capability naming a role; `any` is the universal
/// super-capability.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct CallerCapability {
    pub identifier: Identifier,
}

impl CallerCapability {
    pub fn new(identifier: Identifier) -> Self {
        CallerCapability { identifier }
    }

    /// Check whether this is the reserved universal capability.
    pub fn is_any(&self, interner: &StringInterner) -> bool {
        interner.lookup(self.identifier.name) == "any"
    }
}

/// An ordinary function declaration.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct FunctionDeclaration {
    pub modifiers: Modifiers,
    pub identifier: Identifier,
    pub params: Vec<Parameter>,
    pub result: Option<RawType>,
    pub body: StmtRange,
    pub span: Span,
}

impl FunctionDeclaration {
    pub fn is_public(&self) -> bool {
        self.modifiers.contains(Modifiers::PUBLIC)
    }

    pub fn is_mutating(&self) -> bool {
        self.modifiers.contains(Modifiers::MUTATING)
    }
}

impl fmt::Debug for FunctionDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FunctionDeclaration {{ name: {:?}, params: {}, result: {:?}, modifiers: {:?} }}",
            self.identifier.name,
            self.params.len(),
            self.result,
            self.modifiers
        )
    }
}

/// The special initializer declaration: `init(...) { ... }`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct SpecialDeclaration {
    pub modifiers: Modifiers,
    pub params: Vec<Parameter>,
    pub body: StmtRange,
    pub span: Span,
}

/// A member of a behavior block.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum BehaviorMember {
    Function(FunctionDeclaration),
    Special(SpecialDeclaration),
}

/// A behavior block: `C :: [cap, ...] { funcs }`.
///
/// Binds an ordered list of function declarations to a caller-capability
/// guard on a named contract.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ContractBehaviorDeclaration {
    pub contract: Identifier,
    pub capabilities: Vec<CallerCapability>,
    pub members: Vec<BehaviorMember>,
}

/// One compilation unit: a contract declaration plus its behavior blocks.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct TopLevelModule {
    pub contract: ContractDeclaration,
    pub behaviors: Vec<ContractBehaviorDeclaration>,
}

impl fmt::Debug for TopLevelModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TopLevelModule {{ contract: {:?}, {} fields, {} behaviors }}",
            self.contract.identifier.name,
            self.contract.fields.len(),
            self.behaviors.len()
        )
    }
}
