//! Module Emission
//!
//! Composes the output module in its fixed order: the resource type with
//! fields in declaration order, the initializer trio, then every behavior
//! function under its mangled identifier.

use quartz_ir::{BehaviorMember, Name, TopLevelModule};

use crate::Codegen;

impl Codegen<'_> {
    /// Render the whole module. Failures are recorded as diagnostics; the
    /// caller discards the text when any were reported.
    pub(crate) fn emit_module(&mut self, module: &TopLevelModule) -> String {
        let contract = &module.contract;
        let contract_name = self.interner.lookup(contract.identifier.name).to_owned();
        tracing::debug!(contract = %contract_name, "emitting module");

        let mut out = String::new();
        out.push_str(&format!("module {contract_name} {{\n"));

        // Resource type, fields in declaration order.
        if contract.fields.is_empty() {
            out.push_str("  resource T {}\n");
        } else {
            out.push_str("  resource T {\n");
            let fields: Vec<(String, quartz_ir::RawType, quartz_ir::Span)> = contract
                .fields
                .iter()
                .map(|f| (
                    self.interner.lookup(f.identifier.name).to_owned(),
                    f.ty.clone(),
                    f.identifier.span,
                ))
                .collect();
            let last = fields.len() - 1;
            for (i, (name, raw, span)) in fields.iter().enumerate() {
                if let Ok(canonical) = self.canonical_or_report(raw, *span) {
                    let ty = canonical.render(contract.identifier.name, self.interner);
                    let comma = if i == last { "" } else { "," };
                    out.push_str(&format!("    {name}: {ty}{comma}\n"));
                }
            }
            out.push_str("  }\n");
        }
        out.push('\n');

        let _ = self.emit_initializer(&mut out);

        // Behavior functions in source order.
        for behavior in &module.behaviors {
            let capabilities: Vec<Name> = behavior
                .capabilities
                .iter()
                .map(|c| c.identifier.name)
                .collect();
            for member in &behavior.members {
                if let BehaviorMember::Function(func) = member {
                    out.push('\n');
                    let _ = self.emit_function(&capabilities, func, &mut out);
                }
            }
        }

        out.push_str("}\n");
        out
    }
}
