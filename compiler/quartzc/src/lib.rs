//! The Quartz compiler driver.
//!
//! One call runs the whole pipeline: lex → parse → analyze → generate.
//! A compilation is a pure function from source text to either the target
//! IR module text or a position-sorted diagnostic list; nothing is ever
//! partially emitted.

use quartz_diagnostic::queue::{DiagnosticConfig, DiagnosticQueue};
use quartz_diagnostic::Diagnostic;
use quartz_ir::{ExprArena, SharedInterner};

/// Compile one Quartz source file to target IR text.
pub fn compile(source: &str, interner: &SharedInterner) -> Result<String, Vec<Diagnostic>> {
    let _span = tracing::info_span!("compile", bytes = source.len()).entered();

    tracing::debug!("lexing");
    let tokens = quartz_lexer::lex(source, interner);

    tracing::debug!(tokens = tokens.len(), "parsing");
    let mut arena = ExprArena::with_capacity(source.len());
    let module = match quartz_parse::parse(&tokens, &mut arena, interner) {
        Ok(module) => module,
        Err(diagnostics) => return Err(sort_by_position(diagnostics, source)),
    };

    tracing::debug!("analyzing declarations");
    let (env, sema_diagnostics) = quartz_sema::analyze(&module, interner);

    tracing::debug!("generating module");
    match quartz_codegen::generate(&module, &arena, &env, interner) {
        Ok(text) if sema_diagnostics.is_empty() => Ok(text),
        Ok(_) => Err(sort_by_position(sema_diagnostics, source)),
        Err(codegen_diagnostics) => {
            let mut all = sema_diagnostics;
            all.extend(codegen_diagnostics);
            Err(sort_by_position(all, source))
        }
    }
}

/// Order diagnostics by their source position.
fn sort_by_position(diagnostics: Vec<Diagnostic>, source: &str) -> Vec<Diagnostic> {
    let mut queue = DiagnosticQueue::with_config(DiagnosticConfig::unlimited());
    for diagnostic in diagnostics {
        queue.add_with_source(diagnostic, source);
    }
    queue.flush()
}
