//! Expression Lowering
//!
//! Translates AST expressions into target IR expressions. The
//! `force_move` flag marks value-consuming positions (assignment
//! right-hand sides, return values, constructor fields); resource-typed
//! bindings move on every read regardless, preserving linearity.

use quartz_diagnostic::{Diagnostic, ErrorCode};
use quartz_ir::{BinaryOp, ExprId, ExprKind, Literal, Name, Span};
use quartz_sema::Resolution;

use crate::context::{
    self_borrow_acquisition, self_borrow_declaration, staging_slot, storage_projection,
    FunctionContext, SELF_BORROW,
};
use crate::mir::{MirExpression, MirLiteral};
use crate::{mangle, Codegen, Lower};

/// Red zone / stack growth parameters for deep expression trees.
const RED_ZONE: usize = 64 * 1024;
const STACK_GROW: usize = 1024 * 1024;

impl Codegen<'_> {
    /// Lower one expression.
    pub(crate) fn lower_expr(
        &mut self,
        ctx: &mut FunctionContext,
        id: ExprId,
        force_move: bool,
    ) -> Lower<MirExpression> {
        stacker::maybe_grow(RED_ZONE, STACK_GROW, || {
            self.lower_expr_inner(ctx, id, force_move)
        })
    }

    fn lower_expr_inner(
        &mut self,
        ctx: &mut FunctionContext,
        id: ExprId,
        force_move: bool,
    ) -> Lower<MirExpression> {
        let arena = self.arena;
        let expr = arena.get_expr(id);
        let span = expr.span;

        match &expr.kind {
            ExprKind::Identifier(name) => self.lower_identifier(ctx, *name, span, force_move),

            ExprKind::SelfRef => self.lower_self(ctx, span, force_move),

            ExprKind::Binary { op, lhs, rhs } => match op {
                BinaryOp::Assign => self.lower_assignment(ctx, *lhs, *rhs, span),
                BinaryOp::Dot => self.lower_member_access(ctx, *lhs, *rhs, span, force_move),
                _ => {
                    let lowered_lhs = self.lower_expr(ctx, *lhs, false)?;
                    let lowered_rhs = self.lower_expr(ctx, *rhs, false)?;
                    Ok(MirExpression::Operation {
                        op: target_operator(*op),
                        lhs: Box::new(lowered_lhs),
                        rhs: Box::new(lowered_rhs),
                    })
                }
            },

            ExprKind::Call { name, args } => {
                let arg_ids: Vec<ExprId> = arena.get_expr_list(*args).to_vec();
                self.lower_call(ctx, *name, &arg_ids, span, force_move)
            }

            ExprKind::Literal(literal) => Ok(self.lower_literal(*literal)),

            ExprKind::VariableDeclaration { name, ty } => {
                // A bare declaration; declaring assignments are handled by
                // the assignment lowerer.
                let canonical = self.canonical_or_report(ty, span)?;
                let rendered = canonical.render(ctx.enclosing(), self.interner);
                let mangled = mangle::mangle_local(self.interner.lookup(*name));
                ctx.declare(*name, canonical);
                Ok(MirExpression::VariableDeclaration {
                    name: mangled,
                    ty: rendered,
                    init: None,
                })
            }

            ExprKind::Bracketed(inner) => self.lower_expr(ctx, *inner, force_move),
        }
    }

    /// Lower an identifier read: local binding or contract field.
    fn lower_identifier(
        &mut self,
        ctx: &mut FunctionContext,
        name: Name,
        span: Span,
        force_move: bool,
    ) -> Lower<MirExpression> {
        // Locals shadow contract fields.
        if let Some(canonical) = ctx.lookup(name) {
            let is_resource = canonical.is_resource();
            let ident =
                MirExpression::Identifier(mangle::mangle_local(self.interner.lookup(name)));
            return Ok(if is_resource || force_move { ident.moved() } else { ident });
        }

        if self.env.contract_field(name).is_some() {
            return self.lower_self_field(ctx, name, span, force_move);
        }

        let text = self.interner.lookup(name).to_owned();
        Err(self.report(quartz_diagnostic::unresolved_reference(span, &text)))
    }

    /// Lower `self`.
    fn lower_self(
        &mut self,
        ctx: &mut FunctionContext,
        span: Span,
        force_move: bool,
    ) -> Lower<MirExpression> {
        match ctx.self_state() {
            crate::SelfState::Staging => Err(self.report(
                Diagnostic::error(ErrorCode::E2007)
                    .with_message(
                        "`self` cannot be used before every contract field is assigned",
                    )
                    .with_label(span, "not yet constructed here"),
            )),
            crate::SelfState::Bound => {
                let ident = MirExpression::Identifier("self".to_owned());
                Ok(if force_move { ident.moved() } else { ident })
            }
            crate::SelfState::NotInit => {
                self.ensure_self_borrow(ctx);
                Ok(MirExpression::Identifier(SELF_BORROW.to_owned()).copied())
            }
        }
    }

    /// Lower a read or projection of a contract field, in all three
    /// receiver states.
    pub(crate) fn lower_self_field(
        &mut self,
        ctx: &mut FunctionContext,
        field: Name,
        span: Span,
        force_move: bool,
    ) -> Lower<MirExpression> {
        let Some(decl) = self.env.contract_field(field) else {
            let text = self.interner.lookup(field).to_owned();
            return Err(self.report(quartz_diagnostic::unresolved_reference(span, &text)));
        };
        let field_ty = decl.ty.clone();
        let field_name = self.interner.lookup(field).to_owned();

        match ctx.self_state() {
            crate::SelfState::Staging => {
                let canonical = self.canonical_or_report(&field_ty, span)?;
                let slot = MirExpression::Identifier(staging_slot(&field_name));
                Ok(if canonical.is_resource() || force_move { slot.moved() } else { slot })
            }
            crate::SelfState::Bound => Ok(MirExpression::FieldAccess {
                base: Box::new(MirExpression::Identifier("self".to_owned())),
                field: field_name,
            }),
            crate::SelfState::NotInit => {
                self.ensure_self_borrow(ctx);
                Ok(storage_projection(&field_name))
            }
        }
    }

    /// Emit the storage borrow on first touch and register its release.
    ///
    /// The borrow always lands at function level so that accesses inside
    /// nested blocks stay in scope afterwards.
    pub(crate) fn ensure_self_borrow(&mut self, ctx: &mut FunctionContext) {
        if ctx.has_self_borrow() {
            return;
        }
        ctx.emit_function_level(self_borrow_declaration());
        ctx.emit_function_level(self_borrow_acquisition());
        ctx.register_release(SELF_BORROW);
    }

    /// Lower `base.member` in value position.
    fn lower_member_access(
        &mut self,
        ctx: &mut FunctionContext,
        lhs: ExprId,
        rhs: ExprId,
        span: Span,
        force_move: bool,
    ) -> Lower<MirExpression> {
        let arena = self.arena;
        let member = arena.get_expr(rhs);

        match (&arena.get_expr(lhs).kind, &member.kind) {
            (ExprKind::SelfRef, ExprKind::Identifier(field)) => {
                self.lower_self_field(ctx, *field, member.span, force_move)
            }
            // Calls through `self` dispatch like plain calls; storage is
            // already reachable inside contract functions.
            (ExprKind::SelfRef, ExprKind::Call { name, args }) => {
                let arg_ids: Vec<ExprId> = arena.get_expr_list(*args).to_vec();
                self.lower_call(ctx, *name, &arg_ids, span, force_move)
            }
            // Method call: the receiver becomes the leading argument.
            (_, ExprKind::Call { name, args }) => {
                let mut arg_ids = vec![lhs];
                arg_ids.extend(arena.get_expr_list(*args).iter().copied());
                self.lower_call(ctx, *name, &arg_ids, span, force_move)
            }
            (_, ExprKind::Identifier(field)) => {
                let base = self.lower_expr(ctx, lhs, false)?;
                Ok(MirExpression::FieldAccess {
                    base: Box::new(base),
                    field: self.interner.lookup(*field).to_owned(),
                })
            }
            _ => Err(self.report(
                Diagnostic::error(ErrorCode::E9001)
                    .with_message("malformed member access")
                    .with_label(span, "right-hand side must be a field or call"),
            )),
        }
    }

    /// Lower a function call: event emission, generated-initializer
    /// erasure, or an ordinary resolved call.
    pub(crate) fn lower_call(
        &mut self,
        ctx: &mut FunctionContext,
        name: Name,
        args: &[ExprId],
        span: Span,
        force_move: bool,
    ) -> Lower<MirExpression> {
        // 1. Declared event: re-dispatch as an emission.
        if self.env.is_event(name) {
            return self.lower_event_emission(ctx, name, args, span);
        }

        // 2. Compiler-generated initializer: the call erases to its
        //    argument, a nominal coercion.
        if self.env.is_generated_initializer(name) {
            if args.len() != 1 {
                let text = self.interner.lookup(name).to_owned();
                return Err(self.report(quartz_diagnostic::arity_mismatch(
                    span,
                    &text,
                    1,
                    args.len(),
                )));
            }
            return self.lower_expr(ctx, args[0], force_move);
        }

        // 3. Ordinary call, resolved under the caller's capabilities.
        let caller_caps = ctx.caller_capabilities().to_vec();
        let (params, mangled) = {
            let env = self.env;
            match env.resolve_function(name, args.len(), &caller_caps) {
                Resolution::Matched(info) => {
                    let params = info.params.clone();
                    (params, self.mangle_info(info))
                }
                Resolution::Unknown => {
                    let text = self.interner.lookup(name).to_owned();
                    return Err(
                        self.report(quartz_diagnostic::unresolved_reference(span, &text))
                    );
                }
                Resolution::ArityMismatch { expected } => {
                    let text = self.interner.lookup(name).to_owned();
                    return Err(self.report(quartz_diagnostic::arity_mismatch(
                        span,
                        &text,
                        expected,
                        args.len(),
                    )));
                }
                Resolution::CapabilityViolation => {
                    let text = self.interner.lookup(name).to_owned();
                    let caps = caller_caps
                        .iter()
                        .map(|c| self.interner.lookup(*c))
                        .collect::<Vec<_>>()
                        .join(", ");
                    return Err(self.report(quartz_diagnostic::capability_violation(
                        span, &text, &caps,
                    )));
                }
            }
        };
        let mangled = mangled?;

        let mut lowered_args = Vec::with_capacity(args.len());
        for (param, arg) in params.iter().zip(args) {
            let canonical = self.canonical_or_report(&param.ty, span)?;
            let lowered = if param.is_inout() {
                MirExpression::MutableReference(Box::new(self.lower_expr(ctx, *arg, false)?))
            } else if canonical.is_resource() {
                self.lower_expr(ctx, *arg, true)?
            } else {
                let plain = self.lower_expr(ctx, *arg, false)?;
                match plain {
                    MirExpression::Identifier(_) => plain.copied(),
                    other => other,
                }
            };
            lowered_args.push(lowered);
        }

        Ok(MirExpression::FunctionCall { name: mangled, args: lowered_args })
    }

    /// Marshal event arguments and emit the event call.
    fn lower_event_emission(
        &mut self,
        ctx: &mut FunctionContext,
        name: Name,
        args: &[ExprId],
        span: Span,
    ) -> Lower<MirExpression> {
        let params = self
            .env
            .event_params(name)
            .map(<[quartz_ir::Parameter]>::to_vec)
            .unwrap_or_default();
        if params.len() != args.len() {
            let text = self.interner.lookup(name).to_owned();
            return Err(self.report(quartz_diagnostic::arity_mismatch(
                span,
                &text,
                params.len(),
                args.len(),
            )));
        }

        let mut lowered_args = Vec::with_capacity(args.len());
        for (param, arg) in params.iter().zip(args) {
            let canonical = self.canonical_or_report(&param.ty, span)?;
            if canonical.is_resource() {
                return Err(self.report(
                    Diagnostic::error(ErrorCode::E2008)
                        .with_message("resource values cannot be carried by events")
                        .with_label(span, "this argument is a resource"),
                ));
            }
            let lowered = self.lower_expr(ctx, *arg, false)?;
            lowered_args.push(match lowered {
                MirExpression::Identifier(_) => lowered.copied(),
                other => other,
            });
        }

        Ok(MirExpression::FunctionCall {
            name: format!("emit<{}>", self.interner.lookup(name)),
            args: lowered_args,
        })
    }

    /// Mangle a resolved callee.
    fn mangle_info(&mut self, info: &quartz_sema::FunctionInfo) -> Lower<String> {
        let mut canonicals = Vec::with_capacity(info.params.len());
        for param in &info.params {
            canonicals.push(self.canonical_or_report(&param.ty, info.identifier.span)?);
        }
        let caps: Vec<&str> = info
            .capabilities
            .iter()
            .map(|c| self.interner.lookup(*c))
            .collect();
        Ok(mangle::mangle_function(
            self.interner.lookup(info.identifier.name),
            self.interner.lookup(info.contract),
            &caps,
            &canonicals,
            self.interner,
        ))
    }

    /// Lower a literal.
    fn lower_literal(&self, literal: Literal) -> MirExpression {
        let lowered = match literal {
            Literal::Int(value) => MirLiteral::U64(value),
            Literal::Address(digits) => {
                MirLiteral::Address(self.interner.lookup(digits).to_lowercase())
            }
            Literal::Bool(value) => MirLiteral::Bool(value),
            Literal::String(text) => {
                let hex: String = self
                    .interner
                    .lookup(text)
                    .bytes()
                    .map(|b| format!("{b:02x}"))
                    .collect();
                MirLiteral::Bytearray(hex)
            }
        };
        MirExpression::Literal(lowered)
    }
}

/// Target spelling of an ordinary binary operator.
fn target_operator(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Eq => "==",
        BinaryOp::NotEq => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::LtEq => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::GtEq => ">=",
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        // Dispatched before reaching here.
        BinaryOp::Assign | BinaryOp::Dot => unreachable!("handled by dedicated lowerers"),
    }
}
