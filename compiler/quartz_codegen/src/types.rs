//! Canonical Type Mapping: Source Types → Target Types
//!
//! Every source type collapses into one of six canonical categories. A
//! user-defined name compiles to a resource iff it is currency-flagged or
//! names the declared contract; otherwise it is a value struct. Collection
//! types have no target representation and are rejected outright.

use quartz_ir::{BasicType, Name, RawType, StringInterner};
use quartz_sema::Environment;

use crate::mir::MirType;

/// The six-way classification driving every target typing decision.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum CanonicalType {
    U64,
    Address,
    Bool,
    Bytearray,
    Resource(Name),
    Struct(Name),
}

impl CanonicalType {
    /// Map a source type to its canonical form.
    ///
    /// `inout` is transparent here: the canonical type is the pointee and
    /// mutable-reference wrapping is reintroduced at call sites. Returns
    /// `None` for types with no target representation.
    pub fn from_raw(raw: &RawType, env: &Environment) -> Option<CanonicalType> {
        match raw {
            RawType::Basic(BasicType::Address) => Some(CanonicalType::Address),
            RawType::Basic(BasicType::Int) => Some(CanonicalType::U64),
            RawType::Basic(BasicType::Bool) => Some(CanonicalType::Bool),
            RawType::Basic(BasicType::String) => Some(CanonicalType::Bytearray),
            RawType::UserDefined(name) => {
                if env.is_currency(*name) || env.is_contract(*name) {
                    Some(CanonicalType::Resource(*name))
                } else {
                    Some(CanonicalType::Struct(*name))
                }
            }
            RawType::Inout(inner) => Self::from_raw(inner, env),
            // Collections have no principled target representation yet;
            // refusing beats silently collapsing to the element type.
            RawType::FixedArray(..) | RawType::Array(..) | RawType::Dictionary(..) => None,
        }
    }

    /// Render to a target type.
    ///
    /// Inside a contract's own module its resource is the local type `T`;
    /// any other resource is qualified by its defining module.
    pub fn render(&self, enclosing: Name, interner: &StringInterner) -> MirType {
        match self {
            CanonicalType::U64 => MirType::U64,
            CanonicalType::Address => MirType::Address,
            CanonicalType::Bool => MirType::Bool,
            CanonicalType::Bytearray => MirType::Bytearray,
            CanonicalType::Struct(name) => {
                MirType::Struct(format!("Self.{}", interner.lookup(*name)))
            }
            CanonicalType::Resource(name) => {
                if *name == enclosing {
                    MirType::Resource("Self.T".to_owned())
                } else {
                    MirType::Resource(format!("{}.T", interner.lookup(*name)))
                }
            }
        }
    }

    /// Resources are linear; everything else copies.
    pub fn is_resource(&self) -> bool {
        matches!(self, CanonicalType::Resource(_))
    }

    /// Stable spelling used by the name mangler.
    pub fn mangle_segment(&self, interner: &StringInterner) -> String {
        match self {
            CanonicalType::U64 => "u64".to_owned(),
            CanonicalType::Address => "address".to_owned(),
            CanonicalType::Bool => "bool".to_owned(),
            CanonicalType::Bytearray => "bytearray".to_owned(),
            CanonicalType::Resource(name) => format!("resource_{}", interner.lookup(*name)),
            CanonicalType::Struct(name) => format!("struct_{}", interner.lookup(*name)),
        }
    }
}

/// Source-level spelling of a raw type, for diagnostics.
pub fn describe_raw(raw: &RawType, interner: &StringInterner) -> String {
    match raw {
        RawType::Basic(BasicType::Address) => "Address".to_owned(),
        RawType::Basic(BasicType::Int) => "Int".to_owned(),
        RawType::Basic(BasicType::Bool) => "Bool".to_owned(),
        RawType::Basic(BasicType::String) => "String".to_owned(),
        RawType::UserDefined(name) => interner.lookup(*name).to_owned(),
        RawType::Inout(inner) => format!("inout {}", describe_raw(inner, interner)),
        RawType::FixedArray(inner, size) => {
            format!("{}[{size}]", describe_raw(inner, interner))
        }
        RawType::Array(inner) => format!("[{}]", describe_raw(inner, interner)),
        RawType::Dictionary(key, value) => format!(
            "[{}: {}]",
            describe_raw(key, interner),
            describe_raw(value, interner)
        ),
    }
}
