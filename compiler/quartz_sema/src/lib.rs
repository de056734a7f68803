//! Semantic analysis for the Quartz compiler.
//!
//! A dedicated declaration pass populates the [`Environment`]; lowering
//! later reads it immutably. The pass reports duplicate declarations and
//! behavior blocks naming an undeclared contract.

mod environment;

pub use environment::{ContractInfo, Environment, FunctionInfo, Resolution};

use quartz_diagnostic::Diagnostic;
use quartz_ir::{BehaviorMember, StringInterner, TopLevelModule};

/// Built-in currency types every compilation starts with.
const BUILTIN_CURRENCIES: &[&str] = &["Wei"];

/// Walk the declarations and build the symbol table.
///
/// Diagnostics are returned alongside the environment; the caller decides
/// whether lowering still makes sense.
pub fn analyze(
    module: &TopLevelModule,
    interner: &StringInterner,
) -> (Environment, Vec<Diagnostic>) {
    let mut env = Environment::new(interner);
    let mut diagnostics = Vec::new();

    for currency in BUILTIN_CURRENCIES {
        env.declare_currency(interner.intern(currency));
    }

    // Contract fields must be unique; field order defines storage order.
    let contract = &module.contract;
    for (i, field) in contract.fields.iter().enumerate() {
        let earlier = contract.fields[..i]
            .iter()
            .any(|f| f.identifier.name == field.identifier.name);
        if earlier {
            diagnostics.push(quartz_diagnostic::duplicate_definition(
                field.identifier.span,
                interner.lookup(field.identifier.name),
            ));
        }
    }
    for (i, event) in contract.events.iter().enumerate() {
        let earlier = contract.events[..i]
            .iter()
            .any(|e| e.identifier.name == event.identifier.name);
        if earlier {
            diagnostics.push(quartz_diagnostic::duplicate_definition(
                event.identifier.span,
                interner.lookup(event.identifier.name),
            ));
        }
    }

    // A name cannot be both a contract and a currency.
    if env.is_currency(contract.identifier.name) {
        diagnostics.push(quartz_diagnostic::duplicate_definition(
            contract.identifier.span,
            interner.lookup(contract.identifier.name),
        ));
    }
    env.declare_contract(contract);

    for behavior in &module.behaviors {
        if behavior.contract.name != contract.identifier.name {
            diagnostics.push(quartz_diagnostic::unresolved_reference(
                behavior.contract.span,
                interner.lookup(behavior.contract.name),
            ));
            continue;
        }

        let capabilities: Vec<_> = behavior
            .capabilities
            .iter()
            .map(|c| c.identifier.name)
            .collect();
        let declares_any = behavior.capabilities.iter().any(|c| c.is_any(interner));

        for member in &behavior.members {
            match member {
                BehaviorMember::Function(func) => {
                    let fresh = env.declare_function(
                        contract.identifier.name,
                        &capabilities,
                        declares_any,
                        func,
                    );
                    if !fresh {
                        diagnostics.push(quartz_diagnostic::duplicate_definition(
                            func.identifier.span,
                            interner.lookup(func.identifier.name),
                        ));
                    }
                }
                BehaviorMember::Special(special) => {
                    if !env.declare_initializer(special) {
                        diagnostics.push(quartz_diagnostic::duplicate_definition(
                            special.span,
                            "init",
                        ));
                    }
                }
            }
        }
    }

    (env, diagnostics)
}
