//! Code generation backend for the Quartz compiler.
//!
//! Translates a typed module into the textual target IR: a resource type
//! per contract, a synthesized initializer trio (`new`, `publish`, `get`),
//! and one procedure per `(contract, capability set, signature)` triple.
//!
//! Lowering is a pure function of the AST and the environment; all
//! recoverable failures land in the diagnostic list and suppress output
//! entirely.

mod mir;
mod types;
mod mangle;
mod context;
mod expr;
mod stmt;
mod function;
mod module;

pub use context::{FunctionContext, SelfState, SELF_BORROW, STAGING_PREFIX};
pub use mangle::{mangle_function, mangle_local};
pub use mir::{MirExpression, MirLiteral, MirStatement, MirType, Transfer};
pub use types::{describe_raw, CanonicalType};

use quartz_diagnostic::Diagnostic;
use quartz_ir::{ExprArena, RawType, Span, StringInterner, TopLevelModule};
use quartz_sema::Environment;

/// Marker for a failure that has already been reported; carriers of this
/// type must not emit output.
pub(crate) struct LowerFailure;

pub(crate) type Lower<T> = Result<T, LowerFailure>;

/// Generate the target IR module text.
///
/// Returns the diagnostics instead of text if anything failed to lower;
/// there is no partial emission.
pub fn generate(
    module: &TopLevelModule,
    arena: &ExprArena,
    env: &Environment,
    interner: &StringInterner,
) -> Result<String, Vec<Diagnostic>> {
    let mut codegen = Codegen {
        arena,
        env,
        interner,
        diagnostics: Vec::new(),
    };

    let text = codegen.emit_module(module);
    if codegen.diagnostics.is_empty() {
        Ok(text)
    } else {
        Err(codegen.diagnostics)
    }
}

/// Shared lowering state: immutable handles plus the diagnostic sink.
pub(crate) struct Codegen<'a> {
    pub(crate) arena: &'a ExprArena,
    pub(crate) env: &'a Environment,
    pub(crate) interner: &'a StringInterner,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl Codegen<'_> {
    /// Record a diagnostic and fail the current lowering path.
    pub(crate) fn report(&mut self, diagnostic: Diagnostic) -> LowerFailure {
        self.diagnostics.push(diagnostic);
        LowerFailure
    }

    /// Canonicalize a raw type or report it as unrepresentable.
    pub(crate) fn canonical_or_report(
        &mut self,
        raw: &RawType,
        span: Span,
    ) -> Lower<CanonicalType> {
        match CanonicalType::from_raw(raw, self.env) {
            Some(canonical) => Ok(canonical),
            None => {
                let describe = describe_raw(raw, self.interner);
                Err(self.report(quartz_diagnostic::unknown_type(span, &describe)))
            }
        }
    }
}
