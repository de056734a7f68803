//! The per-body mutable emitter.
//!
//! A `FunctionContext` is constructed for one function body, mutated
//! during lowering, then consumed by [`FunctionContext::finalise`]. It
//! carries the emission buffer, the lexical scope stack, the pending
//! borrow releases, the constructor state machine, and the
//! unassigned-field tracker used by initializer synthesis.

use rustc_hash::FxHashMap;

use quartz_ir::Name;

use crate::mir::{MirExpression, MirStatement, MirType};
use crate::types::CanonicalType;

/// Local name of the borrowed storage reference.
pub const SELF_BORROW: &str = "q$self";

/// Prefix of the initializer's staging slots.
pub const STAGING_PREFIX: &str = "q$self$";

/// Initializer state machine.
///
/// `Staging` covers field assignment through staging slots; the single
/// transition to `Bound` happens when the struct constructor is emitted
/// and `self` becomes a real binding. Ordinary functions stay `NotInit`.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SelfState {
    NotInit,
    Staging,
    Bound,
}

/// Mutable accumulator for one function body.
pub struct FunctionContext {
    /// The enclosing contract.
    enclosing: Name,
    /// Capabilities of the behavior block this body belongs to.
    caller_capabilities: Vec<Name>,
    /// Statement buffers; the first is the function body, the rest are
    /// open `if` blocks.
    buffers: Vec<Vec<MirStatement>>,
    /// Declaration registry, innermost scope last.
    scopes: Vec<FxHashMap<Name, CanonicalType>>,
    /// Identifiers of live borrowed references, in acquisition order.
    pending_releases: Vec<String>,
    self_state: SelfState,
    /// Contract fields not yet assigned by the initializer, in
    /// declaration order.
    unassigned_fields: Vec<Name>,
}

impl FunctionContext {
    pub fn new(enclosing: Name, caller_capabilities: Vec<Name>) -> Self {
        FunctionContext {
            enclosing,
            caller_capabilities,
            buffers: vec![Vec::new()],
            scopes: vec![FxHashMap::default()],
            pending_releases: Vec::new(),
            self_state: SelfState::NotInit,
            unassigned_fields: Vec::new(),
        }
    }

    /// Switch into constructor mode with the given field set to track.
    pub fn begin_initializer(&mut self, fields: Vec<Name>) {
        self.self_state = SelfState::Staging;
        self.unassigned_fields = fields;
    }

    /// The one-way `Staging` → `Bound` transition.
    pub fn bind_self(&mut self) {
        debug_assert_eq!(self.self_state, SelfState::Staging);
        self.self_state = SelfState::Bound;
    }

    pub fn self_state(&self) -> SelfState {
        self.self_state
    }

    pub fn enclosing(&self) -> Name {
        self.enclosing
    }

    pub fn caller_capabilities(&self) -> &[Name] {
        &self.caller_capabilities
    }

    // ===== Emission buffer =====

    /// Append a statement to the innermost open block.
    pub fn emit(&mut self, stmt: MirStatement) {
        if let Some(buffer) = self.buffers.last_mut() {
            buffer.push(stmt);
        }
    }

    /// Append an expression statement, dropping noops.
    pub fn emit_expr(&mut self, expr: MirExpression) {
        if !expr.is_noop() {
            self.emit(MirStatement::Expression(expr));
        }
    }

    /// Prepend a statement to the function body.
    ///
    /// The single use is the initializer's `let self: Self.T;`, which must
    /// precede every statement already emitted in the staging phase.
    pub fn emit_front(&mut self, stmt: MirStatement) {
        self.buffers[0].insert(0, stmt);
    }

    /// Append a statement to the function body even while a nested block
    /// is open (storage borrows must not be scoped to a branch).
    pub fn emit_function_level(&mut self, stmt: MirStatement) {
        self.buffers[0].push(stmt);
    }

    /// Open a nested statement block.
    pub fn enter_block(&mut self) {
        self.buffers.push(Vec::new());
        self.scopes.push(FxHashMap::default());
    }

    /// Close the innermost block and return its statements.
    pub fn exit_block(&mut self) -> Vec<MirStatement> {
        self.scopes.pop();
        self.buffers.pop().unwrap_or_default()
    }

    /// Whether emission is at function level (no open nested block).
    pub fn at_top_level(&self) -> bool {
        self.buffers.len() == 1
    }

    /// Whether the last emitted statement of the current block returns.
    pub fn last_is_return(&self) -> bool {
        self.buffers
            .last()
            .and_then(|b| b.last())
            .is_some_and(MirStatement::is_return)
    }

    // ===== Scope stack =====

    /// Record a binding in the innermost scope.
    pub fn declare(&mut self, name: Name, ty: CanonicalType) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, ty);
        }
    }

    /// Look a binding up through the scope stack, innermost first.
    pub fn lookup(&self, name: Name) -> Option<&CanonicalType> {
        self.scopes.iter().rev().find_map(|scope| scope.get(&name))
    }

    // ===== Pending releases =====

    /// Register a live borrowed reference for release at function exits.
    pub fn register_release(&mut self, identifier: impl Into<String>) {
        self.pending_releases.push(identifier.into());
    }

    /// Whether the storage borrow has been emitted already.
    pub fn has_self_borrow(&self) -> bool {
        self.pending_releases.iter().any(|r| r == SELF_BORROW)
    }

    /// Emit release operations for every live reference, LIFO.
    ///
    /// Called before every return; the list is not drained because the
    /// same references stay live on the other exit paths.
    pub fn emit_release_references(&mut self) {
        let releases: Vec<MirStatement> = self
            .pending_releases
            .iter()
            .rev()
            .map(|identifier| {
                MirStatement::Expression(MirExpression::Assignment {
                    target: "_".to_owned(),
                    value: Box::new(
                        MirExpression::Identifier(identifier.clone()).moved(),
                    ),
                })
            })
            .collect();
        for stmt in releases {
            self.emit(stmt);
        }
    }

    // ===== Unassigned-field tracker =====

    /// Mark a field assigned; idempotent for repeated assignment.
    pub fn mark_assigned(&mut self, field: Name) {
        self.unassigned_fields.retain(|f| *f != field);
    }

    pub fn all_fields_assigned(&self) -> bool {
        self.unassigned_fields.is_empty()
    }

    pub fn unassigned_fields(&self) -> &[Name] {
        &self.unassigned_fields
    }

    // ===== Finalisation =====

    /// Render the accumulated body at the given indent depth.
    pub fn finalise(self, indent: usize) -> String {
        let mut out = String::new();
        for stmt in &self.buffers[0] {
            stmt.render(&mut out, indent);
        }
        out
    }
}

/// Helper: the staging slot name for a contract field.
pub fn staging_slot(field: &str) -> String {
    format!("{STAGING_PREFIX}{field}")
}

/// Helper: the storage projection `*&mut copy(q$self).field`.
pub fn storage_projection(field: &str) -> MirExpression {
    MirExpression::Dereference(Box::new(MirExpression::MutableReference(Box::new(
        MirExpression::FieldAccess {
            base: Box::new(MirExpression::Identifier(SELF_BORROW.to_owned()).copied()),
            field: field.to_owned(),
        },
    ))))
}

/// Helper: the `let q$self: &mut Self.T;` declaration.
pub fn self_borrow_declaration() -> MirStatement {
    MirStatement::Expression(MirExpression::VariableDeclaration {
        name: SELF_BORROW.to_owned(),
        ty: MirType::MutReference(Box::new(MirType::Resource("Self.T".to_owned()))),
        init: None,
    })
}

/// Helper: the `q$self = borrow_global_mut<T>(get_txn_sender());` acquisition.
pub fn self_borrow_acquisition() -> MirStatement {
    MirStatement::Expression(MirExpression::Assignment {
        target: SELF_BORROW.to_owned(),
        value: Box::new(MirExpression::FunctionCall {
            name: "borrow_global_mut<T>".to_owned(),
            args: vec![MirExpression::FunctionCall {
                name: "get_txn_sender".to_owned(),
                args: vec![],
            }],
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quartz_ir::StringInterner;

    #[test]
    fn test_release_order_is_lifo() {
        let interner = StringInterner::new();
        let mut ctx = FunctionContext::new(interner.intern("C"), vec![]);

        ctx.register_release("first");
        ctx.register_release("second");
        ctx.emit_release_references();
        ctx.emit(MirStatement::Return(None));

        let body = ctx.finalise(0);
        let first = body.find("move(first)").unwrap_or(usize::MAX);
        let second = body.find("move(second)").unwrap_or(usize::MAX);
        assert!(second < first, "releases must run in reverse acquisition order:\n{body}");
    }

    #[test]
    fn test_releases_survive_early_exit() {
        let interner = StringInterner::new();
        let mut ctx = FunctionContext::new(interner.intern("C"), vec![]);

        ctx.register_release(SELF_BORROW);
        ctx.emit_release_references();
        ctx.emit(MirStatement::Return(None));
        // A later exit path still sees the borrow.
        ctx.emit_release_references();

        let body = ctx.finalise(0);
        assert_eq!(body.matches("_ = move(q$self)").count(), 2);
    }

    #[test]
    fn test_emit_front_prepends() {
        let interner = StringInterner::new();
        let mut ctx = FunctionContext::new(interner.intern("C"), vec![]);

        ctx.emit(MirStatement::Return(None));
        ctx.emit_front(self_borrow_declaration());

        let body = ctx.finalise(0);
        assert!(body.starts_with("let q$self"), "expected prepend first:\n{body}");
    }

    #[test]
    fn test_scope_shadowing() {
        let interner = StringInterner::new();
        let mut ctx = FunctionContext::new(interner.intern("C"), vec![]);
        let x = interner.intern("x");

        ctx.declare(x, CanonicalType::U64);
        ctx.enter_block();
        ctx.declare(x, CanonicalType::Bool);
        assert_eq!(ctx.lookup(x), Some(&CanonicalType::Bool));
        ctx.exit_block();
        assert_eq!(ctx.lookup(x), Some(&CanonicalType::U64));
    }

    #[test]
    fn test_unassigned_tracker() {
        let interner = StringInterner::new();
        let mut ctx = FunctionContext::new(interner.intern("C"), vec![]);
        let x = interner.intern("x");
        let y = interner.intern("y");

        ctx.begin_initializer(vec![x, y]);
        assert!(!ctx.all_fields_assigned());

        ctx.mark_assigned(x);
        ctx.mark_assigned(x);
        assert_eq!(ctx.unassigned_fields(), &[y]);

        ctx.mark_assigned(y);
        assert!(ctx.all_fields_assigned());
    }

    #[test]
    fn test_storage_projection_rendering() {
        assert_eq!(
            storage_projection("balance").to_string(),
            "*&mut copy(q$self).balance"
        );
    }
}
