//! Statement and Assignment Lowering
//!
//! Statements append to the function context's emission buffer. The
//! assignment lowerer distinguishes declaration, local rebinding, stores
//! through a struct-typed parameter, and contract-storage writes; a
//! declaration whose right-hand side lowers to its own mangled name
//! collapses to a noop.

use quartz_diagnostic::{Diagnostic, ErrorCode};
use quartz_ir::{BinaryOp, ExprId, ExprKind, Name, Span, Stmt, StmtKind};

use crate::context::{staging_slot, storage_projection, FunctionContext};
use crate::mir::{MirExpression, MirStatement};
use crate::{mangle, Codegen, Lower, SelfState};

impl Codegen<'_> {
    /// Lower one statement into the context's emission buffer.
    pub(crate) fn lower_stmt(&mut self, ctx: &mut FunctionContext, stmt: &Stmt) -> Lower<()> {
        match &stmt.kind {
            StmtKind::Expression(id) => {
                let lowered = self.lower_expr(ctx, *id, false)?;
                ctx.emit_expr(lowered);
                Ok(())
            }

            StmtKind::Return(value) => {
                let lowered = match value {
                    Some(id) => Some(self.lower_expr(ctx, *id, true)?),
                    None => None,
                };
                ctx.emit_release_references();
                ctx.emit(MirStatement::Return(lowered));
                Ok(())
            }

            StmtKind::If { cond, then_block, else_block } => {
                let arena = self.arena;
                let lowered_cond = self.lower_expr(ctx, *cond, false)?;

                ctx.enter_block();
                let mut result = Ok(());
                for stmt in arena.get_stmt_range(*then_block) {
                    result = self.lower_stmt(ctx, stmt);
                    if result.is_err() {
                        break;
                    }
                }
                let then_stmts = ctx.exit_block();
                result?;

                ctx.enter_block();
                let mut result = Ok(());
                for stmt in arena.get_stmt_range(*else_block) {
                    result = self.lower_stmt(ctx, stmt);
                    if result.is_err() {
                        break;
                    }
                }
                let else_stmts = ctx.exit_block();
                result?;

                ctx.emit(MirStatement::If {
                    cond: lowered_cond,
                    then_block: then_stmts,
                    else_block: else_stmts,
                });
                Ok(())
            }
        }
    }

    /// Lower `lhs = rhs` by the shape of the left-hand side.
    pub(crate) fn lower_assignment(
        &mut self,
        ctx: &mut FunctionContext,
        lhs: ExprId,
        rhs: ExprId,
        span: Span,
    ) -> Lower<MirExpression> {
        let arena = self.arena;
        let lhs_expr = arena.get_expr(lhs);

        match &lhs_expr.kind {
            // Case 1: declaring assignment.
            ExprKind::VariableDeclaration { name, ty } => {
                let canonical = self.canonical_or_report(ty, lhs_expr.span)?;
                let rendered = canonical.render(ctx.enclosing(), self.interner);
                let mangled = mangle::mangle_local(self.interner.lookup(*name));
                let value = self.lower_expr(ctx, rhs, false)?;
                ctx.declare(*name, canonical);

                // Shadow binding: `var a: T = a` has nothing to emit.
                if value.to_string() == mangled {
                    return Ok(MirExpression::Noop);
                }

                Ok(MirExpression::VariableDeclaration {
                    name: mangled,
                    ty: rendered,
                    init: Some(Box::new(value)),
                })
            }

            // Case 2: bare local rebinding, or a contract-field store
            // spelled without `self`.
            ExprKind::Identifier(name) => {
                if ctx.lookup(*name).is_some() {
                    let value = self.lower_expr(ctx, rhs, true)?;
                    return Ok(MirExpression::Assignment {
                        target: mangle::mangle_local(self.interner.lookup(*name)),
                        value: Box::new(value),
                    });
                }
                if self.env.contract_field(*name).is_some() {
                    return self.lower_field_store(ctx, *name, rhs);
                }
                let text = self.interner.lookup(*name).to_owned();
                Err(self.report(quartz_diagnostic::unresolved_reference(lhs_expr.span, &text)))
            }

            // Cases 3 and 4: stores through a member path.
            ExprKind::Binary { op: BinaryOp::Dot, lhs: base, rhs: member } => {
                let base_kind = &arena.get_expr(*base).kind;
                let member_expr = arena.get_expr(*member);

                match (base_kind, &member_expr.kind) {
                    // Case 4: `self.field = value`.
                    (ExprKind::SelfRef, ExprKind::Identifier(field)) => {
                        if self.env.contract_field(*field).is_none() {
                            let text = self.interner.lookup(*field).to_owned();
                            return Err(self.report(quartz_diagnostic::unresolved_reference(
                                member_expr.span,
                                &text,
                            )));
                        }
                        self.lower_field_store(ctx, *field, rhs)
                    }
                    // Case 3: `param.field = value` in a struct-function
                    // context.
                    (ExprKind::Identifier(param), ExprKind::Identifier(field))
                        if ctx.lookup(*param).is_some() =>
                    {
                        let target = format!(
                            "{}.{}",
                            mangle::mangle_local(self.interner.lookup(*param)),
                            self.interner.lookup(*field)
                        );
                        let value = self.lower_expr(ctx, rhs, true)?;
                        Ok(MirExpression::Assignment { target, value: Box::new(value) })
                    }
                    _ => Err(self.report(invalid_assignment_target(span))),
                }
            }

            ExprKind::Bracketed(inner) => self.lower_assignment(ctx, *inner, rhs, span),

            _ => Err(self.report(invalid_assignment_target(span))),
        }
    }

    /// Store into a contract field under the current receiver state.
    fn lower_field_store(
        &mut self,
        ctx: &mut FunctionContext,
        field: Name,
        rhs: ExprId,
    ) -> Lower<MirExpression> {
        let value = self.lower_expr(ctx, rhs, true)?;
        let field_name = self.interner.lookup(field).to_owned();

        let target = match ctx.self_state() {
            SelfState::Staging => {
                // Only top-level assignments count toward completing the
                // field set; a conditional store never satisfies it.
                if ctx.at_top_level() {
                    ctx.mark_assigned(field);
                }
                staging_slot(&field_name)
            }
            SelfState::Bound => format!("self.{field_name}"),
            SelfState::NotInit => {
                self.ensure_self_borrow(ctx);
                // The l-value path is reified to its textual form.
                storage_projection(&field_name).to_string()
            }
        };

        Ok(MirExpression::Assignment { target, value: Box::new(value) })
    }
}

fn invalid_assignment_target(span: Span) -> Diagnostic {
    Diagnostic::error(ErrorCode::E2007)
        .with_message("invalid assignment target")
        .with_label(span, "cannot assign to this expression")
}
