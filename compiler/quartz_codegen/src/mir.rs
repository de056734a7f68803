//! The target IR model.
//!
//! A small expression/statement tree rendered to text by `Display` and the
//! statement renderer. The type grammar is closed: primitives, value
//! structs, linear resources, and (mutable) references.

use std::fmt;

/// Target types.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum MirType {
    U64,
    Address,
    Bool,
    Bytearray,
    /// A value struct, fully qualified (e.g. `Self.Wallet`).
    Struct(String),
    /// A linear resource, fully qualified (e.g. `Self.T`, `Token.T`).
    Resource(String),
    Reference(Box<MirType>),
    MutReference(Box<MirType>),
}

impl fmt::Display for MirType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MirType::U64 => write!(f, "u64"),
            MirType::Address => write!(f, "address"),
            MirType::Bool => write!(f, "bool"),
            MirType::Bytearray => write!(f, "bytearray"),
            MirType::Struct(name) | MirType::Resource(name) => write!(f, "{name}"),
            MirType::Reference(inner) => write!(f, "&{inner}"),
            MirType::MutReference(inner) => write!(f, "&mut {inner}"),
        }
    }
}

/// Literal values.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum MirLiteral {
    U64(u64),
    /// Hex digits without the `0x` prefix; rendered zero-padded to the
    /// 16-byte address width.
    Address(String),
    Bool(bool),
    /// Hex-encoded byte string.
    Bytearray(String),
}

impl fmt::Display for MirLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MirLiteral::U64(value) => write!(f, "{value}"),
            MirLiteral::Address(digits) => write!(f, "0x{digits:0>32}"),
            MirLiteral::Bool(value) => write!(f, "{value}"),
            MirLiteral::Bytearray(hex) => write!(f, "h\"{hex}\""),
        }
    }
}

/// Ownership transfer wrappers.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Transfer {
    Move,
    Copy,
}

/// Target expressions.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum MirExpression {
    Identifier(String),
    Literal(MirLiteral),
    /// `let name: ty` with an optional initializer.
    VariableDeclaration {
        name: String,
        ty: MirType,
        init: Option<Box<MirExpression>>,
    },
    /// `target = value`; the target is the reified text of a lowered
    /// l-value.
    Assignment {
        target: String,
        value: Box<MirExpression>,
    },
    /// `struct T { field: value, ... }` with fields in declaration order.
    StructConstructor {
        name: String,
        fields: Vec<(String, MirExpression)>,
    },
    FunctionCall {
        name: String,
        args: Vec<MirExpression>,
    },
    /// `move(inner)` / `copy(inner)`.
    Transfer {
        kind: Transfer,
        inner: Box<MirExpression>,
    },
    /// `&mut inner`.
    MutableReference(Box<MirExpression>),
    /// `*inner`.
    Dereference(Box<MirExpression>),
    /// `base.field`.
    FieldAccess {
        base: Box<MirExpression>,
        field: String,
    },
    /// Parenthesized infix operation.
    Operation {
        op: &'static str,
        lhs: Box<MirExpression>,
        rhs: Box<MirExpression>,
    },
    /// Suppressed output (shadow assignments).
    Noop,
}

impl MirExpression {
    /// Check whether this expression renders nothing.
    pub fn is_noop(&self) -> bool {
        matches!(self, MirExpression::Noop)
    }

    /// Wrap in a `move` transfer.
    pub fn moved(self) -> MirExpression {
        MirExpression::Transfer { kind: Transfer::Move, inner: Box::new(self) }
    }

    /// Wrap in a `copy` transfer.
    pub fn copied(self) -> MirExpression {
        MirExpression::Transfer { kind: Transfer::Copy, inner: Box::new(self) }
    }
}

impl fmt::Display for MirExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MirExpression::Identifier(name) => write!(f, "{name}"),
            MirExpression::Literal(lit) => write!(f, "{lit}"),
            MirExpression::VariableDeclaration { name, ty, init } => {
                write!(f, "let {name}: {ty}")?;
                if let Some(init) = init {
                    write!(f, " = {init}")?;
                }
                Ok(())
            }
            MirExpression::Assignment { target, value } => write!(f, "{target} = {value}"),
            MirExpression::StructConstructor { name, fields } => {
                if fields.is_empty() {
                    return write!(f, "struct {name} {{}}");
                }
                write!(f, "struct {name} {{ ")?;
                for (i, (field, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{field}: {value}")?;
                }
                write!(f, " }}")
            }
            MirExpression::FunctionCall { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            MirExpression::Transfer { kind, inner } => match kind {
                Transfer::Move => write!(f, "move({inner})"),
                Transfer::Copy => write!(f, "copy({inner})"),
            },
            MirExpression::MutableReference(inner) => write!(f, "&mut {inner}"),
            MirExpression::Dereference(inner) => write!(f, "*{inner}"),
            MirExpression::FieldAccess { base, field } => write!(f, "{base}.{field}"),
            MirExpression::Operation { op, lhs, rhs } => write!(f, "({lhs} {op} {rhs})"),
            MirExpression::Noop => Ok(()),
        }
    }
}

/// Target statements.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum MirStatement {
    Expression(MirExpression),
    Return(Option<MirExpression>),
    If {
        cond: MirExpression,
        then_block: Vec<MirStatement>,
        else_block: Vec<MirStatement>,
    },
}

impl MirStatement {
    /// Render into `out` at the given indent depth (two spaces per level).
    pub fn render(&self, out: &mut String, indent: usize) {
        let pad = "  ".repeat(indent);
        match self {
            MirStatement::Expression(expr) => {
                if !expr.is_noop() {
                    out.push_str(&pad);
                    out.push_str(&expr.to_string());
                    out.push_str(";\n");
                }
            }
            MirStatement::Return(None) => {
                out.push_str(&pad);
                out.push_str("return;\n");
            }
            MirStatement::Return(Some(value)) => {
                out.push_str(&pad);
                out.push_str(&format!("return {value};\n"));
            }
            MirStatement::If { cond, then_block, else_block } => {
                out.push_str(&pad);
                out.push_str(&format!("if ({cond}) {{\n"));
                for stmt in then_block {
                    stmt.render(out, indent + 1);
                }
                if else_block.is_empty() {
                    out.push_str(&pad);
                    out.push_str("}\n");
                } else {
                    out.push_str(&pad);
                    out.push_str("} else {\n");
                    for stmt in else_block {
                        stmt.render(out, indent + 1);
                    }
                    out.push_str(&pad);
                    out.push_str("}\n");
                }
            }
        }
    }

    /// Check whether this statement is a `return`.
    pub fn is_return(&self) -> bool {
        matches!(self, MirStatement::Return(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_rendering() {
        assert_eq!(MirType::U64.to_string(), "u64");
        assert_eq!(MirType::Resource("Self.T".to_owned()).to_string(), "Self.T");
        assert_eq!(
            MirType::MutReference(Box::new(MirType::Resource("Self.T".to_owned()))).to_string(),
            "&mut Self.T"
        );
    }

    #[test]
    fn test_address_literal_padding() {
        let lit = MirLiteral::Address("2a".to_owned());
        assert_eq!(lit.to_string(), "0x0000000000000000000000000000002a");
    }

    #[test]
    fn test_struct_constructor_rendering() {
        let ctor = MirExpression::StructConstructor {
            name: "T".to_owned(),
            fields: vec![(
                "x".to_owned(),
                MirExpression::Identifier("q$self$x".to_owned()).moved(),
            )],
        };
        assert_eq!(ctor.to_string(), "struct T { x: move(q$self$x) }");

        let empty = MirExpression::StructConstructor { name: "T".to_owned(), fields: vec![] };
        assert_eq!(empty.to_string(), "struct T {}");
    }

    #[test]
    fn test_noop_statement_renders_nothing() {
        let mut out = String::new();
        MirStatement::Expression(MirExpression::Noop).render(&mut out, 2);
        assert!(out.is_empty());
    }

    #[test]
    fn test_if_rendering() {
        let stmt = MirStatement::If {
            cond: MirExpression::Identifier("ok".to_owned()),
            then_block: vec![MirStatement::Return(None)],
            else_block: vec![],
        };
        let mut out = String::new();
        stmt.render(&mut out, 1);
        assert_eq!(out, "  if (ok) {\n    return;\n  }\n");
    }
}
