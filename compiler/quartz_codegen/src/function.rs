//! Function Emission and Initializer Synthesis
//!
//! Ordinary behavior functions lower statement by statement under their
//! guard's capabilities. The contract initializer is different: it builds
//! the resource value itself, staging every field in a synthetic local
//! until the full field set is assigned, then packing the struct and
//! (when statements remain) continuing under a real `self` binding.

use quartz_ir::{FunctionDeclaration, Modifiers, Name, Parameter, SpecialDeclaration, StmtRange};

use crate::context::{staging_slot, FunctionContext};
use crate::mir::{MirExpression, MirStatement, MirType};
use crate::types::CanonicalType;
use crate::{mangle, Codegen, Lower};

impl Codegen<'_> {
    /// Emit one behavior function under its capability guard.
    pub(crate) fn emit_function(
        &mut self,
        capabilities: &[Name],
        func: &FunctionDeclaration,
        out: &mut String,
    ) -> Lower<()> {
        let contract = self.contract_name()?;
        let mut ctx = FunctionContext::new(contract, capabilities.to_vec());

        let (signature_params, canonicals) = self.declare_params(&mut ctx, &func.params)?;

        let caps: Vec<&str> = capabilities.iter().map(|c| self.interner.lookup(*c)).collect();
        let mangled = mangle::mangle_function(
            self.interner.lookup(func.identifier.name),
            self.interner.lookup(contract),
            &caps,
            &canonicals,
            self.interner,
        );
        tracing::debug!(function = %mangled, "lowering behavior function");

        let result_ty = match &func.result {
            Some(raw) => {
                let canonical = self.canonical_or_report(raw, func.identifier.span)?;
                Some(canonical.render(contract, self.interner))
            }
            None => None,
        };

        for stmt in self.arena.get_stmt_range(func.body) {
            self.lower_stmt(&mut ctx, stmt)?;
        }
        if !ctx.last_is_return() {
            ctx.emit_release_references();
            ctx.emit(MirStatement::Return(None));
        }

        render_procedure(
            out,
            func.is_public(),
            &mangled,
            &signature_params,
            result_ty.as_ref(),
            &ctx.finalise(2),
        );
        Ok(())
    }

    /// Synthesize the initializer trio: `new`, `publish`, `get`.
    pub(crate) fn emit_initializer(&mut self, out: &mut String) -> Lower<()> {
        let contract = self.contract_name()?;
        let fields: Vec<(Name, quartz_ir::RawType)> = self
            .env
            .contract()
            .map(|c| {
                c.fields
                    .iter()
                    .map(|f| (f.identifier.name, f.ty.clone()))
                    .collect()
            })
            .unwrap_or_default();

        // A contract without an explicit initializer gets the empty one.
        let init = self.env.initializer().cloned().unwrap_or(SpecialDeclaration {
            modifiers: Modifiers::PUBLIC,
            params: Vec::new(),
            body: StmtRange::EMPTY,
            span: quartz_ir::Span::DUMMY,
        });
        tracing::debug!(fields = fields.len(), "synthesizing initializer");

        let any = self.env.any_capability();
        let mut ctx = FunctionContext::new(contract, vec![any]);
        let (signature_params, _) = self.declare_params(&mut ctx, &init.params)?;

        ctx.begin_initializer(fields.iter().map(|(name, _)| *name).collect());

        // Staging slots precede every initializer statement.
        for (name, raw) in &fields {
            let canonical = self.canonical_or_report(raw, init.span)?;
            ctx.emit(MirStatement::Expression(MirExpression::VariableDeclaration {
                name: staging_slot(self.interner.lookup(*name)),
                ty: canonical.render(contract, self.interner),
                init: None,
            }));
        }

        // Phase A: emit statements until every field has been assigned.
        let stmts = self.arena.get_stmt_range(init.body);
        let mut consumed = 0;
        if !ctx.all_fields_assigned() {
            for stmt in stmts {
                self.lower_stmt(&mut ctx, stmt)?;
                consumed += 1;
                if ctx.all_fields_assigned() {
                    break;
                }
            }
        }

        if !ctx.all_fields_assigned() {
            let missing: Vec<String> = ctx
                .unassigned_fields()
                .iter()
                .map(|f| self.interner.lookup(*f).to_owned())
                .collect();
            return Err(
                self.report(quartz_diagnostic::initializer_incomplete(init.span, &missing))
            );
        }

        // Phase B: construct the resource.
        let constructor = MirExpression::StructConstructor {
            name: "T".to_owned(),
            fields: fields
                .iter()
                .map(|(name, _)| {
                    let field = self.interner.lookup(*name).to_owned();
                    let slot = MirExpression::Identifier(staging_slot(&field)).moved();
                    (field, slot)
                })
                .collect(),
        };

        if consumed == stmts.len() {
            // Nothing follows full assignment: return the constructor.
            ctx.emit_release_references();
            ctx.emit(MirStatement::Return(Some(constructor)));
        } else {
            // Statements remain: bind `self` and keep lowering under it.
            ctx.bind_self();
            ctx.emit_front(MirStatement::Expression(MirExpression::VariableDeclaration {
                name: "self".to_owned(),
                ty: MirType::Resource("Self.T".to_owned()),
                init: None,
            }));
            ctx.emit(MirStatement::Expression(MirExpression::Assignment {
                target: "self".to_owned(),
                value: Box::new(constructor),
            }));
            for stmt in &stmts[consumed..] {
                self.lower_stmt(&mut ctx, stmt)?;
            }
            if !ctx.last_is_return() {
                ctx.emit_release_references();
                ctx.emit(MirStatement::Return(Some(
                    MirExpression::Identifier("self".to_owned()).moved(),
                )));
            }
        }

        render_procedure(
            out,
            false,
            "new",
            &signature_params,
            Some(&MirType::Resource("Self.T".to_owned())),
            &ctx.finalise(2),
        );
        out.push('\n');

        self.emit_publish(&init.params, &signature_params, out)?;
        out.push('\n');
        emit_get(out);
        Ok(())
    }

    /// `publish` moves a freshly constructed resource to the sender.
    fn emit_publish(
        &mut self,
        params: &[Parameter],
        signature_params: &[String],
        out: &mut String,
    ) -> Lower<()> {
        let forwarded: Vec<MirExpression> = params
            .iter()
            .map(|p| {
                MirExpression::Identifier(mangle::mangle_local(
                    self.interner.lookup(p.identifier.name),
                ))
                .moved()
            })
            .collect();

        let body_call = MirExpression::FunctionCall {
            name: "move_to_sender<T>".to_owned(),
            args: vec![MirExpression::FunctionCall {
                name: "Self.new".to_owned(),
                args: forwarded,
            }],
        };

        let mut body = String::new();
        MirStatement::Expression(body_call).render(&mut body, 2);
        MirStatement::Return(None).render(&mut body, 2);

        render_procedure(out, true, "publish", signature_params, None, &body);
        Ok(())
    }

    fn contract_name(&mut self) -> Lower<Name> {
        match self.env.contract() {
            Some(info) => Ok(info.identifier.name),
            None => Err(self.report(
                quartz_diagnostic::Diagnostic::error(quartz_diagnostic::ErrorCode::E9001)
                    .with_message("no contract declared in this compilation unit"),
            )),
        }
    }

    /// Canonicalize and scope the parameters; returns the rendered
    /// signature entries and the canonical types for mangling.
    fn declare_params(
        &mut self,
        ctx: &mut FunctionContext,
        params: &[Parameter],
    ) -> Lower<(Vec<String>, Vec<CanonicalType>)> {
        let contract = ctx.enclosing();
        let mut rendered = Vec::with_capacity(params.len());
        let mut canonicals = Vec::with_capacity(params.len());

        for param in params {
            let canonical = self.canonical_or_report(&param.ty, param.identifier.span)?;
            let ty = canonical.render(contract, self.interner);
            let ty = if param.is_inout() {
                MirType::MutReference(Box::new(ty))
            } else {
                ty
            };
            rendered.push(format!(
                "{}: {ty}",
                mangle::mangle_local(self.interner.lookup(param.identifier.name))
            ));
            ctx.declare(param.identifier.name, canonical.clone());
            canonicals.push(canonical);
        }

        Ok((rendered, canonicals))
    }
}

/// `get` borrows the published resource at an address.
fn emit_get(out: &mut String) {
    let mut body = String::new();
    MirStatement::Return(Some(MirExpression::FunctionCall {
        name: "borrow_global<T>".to_owned(),
        args: vec![MirExpression::Identifier("addr".to_owned()).moved()],
    }))
    .render(&mut body, 2);

    render_procedure(
        out,
        true,
        "get",
        &["addr: address".to_owned()],
        Some(&MirType::MutReference(Box::new(MirType::Resource(
            "Self.T".to_owned(),
        )))),
        &body,
    );
}

/// Render a procedure shell: signature line, body, closing brace.
fn render_procedure(
    out: &mut String,
    is_public: bool,
    name: &str,
    params: &[String],
    result: Option<&MirType>,
    body: &str,
) {
    out.push_str("  ");
    if is_public {
        out.push_str("public ");
    }
    out.push_str(name);
    out.push('(');
    out.push_str(&params.join(", "));
    out.push(')');
    if let Some(ty) = result {
        out.push_str(&format!(": {ty}"));
    }
    out.push_str(" {\n");
    out.push_str(body);
    out.push_str("  }\n");
}
