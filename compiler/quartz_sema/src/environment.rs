//! The symbol table.
//!
//! Populated by a single mutable pass over the declarations, then handed
//! read-only to the lowerer. Records the declared contract, event
//! signatures, functions grouped by name with their caller-capability
//! sets, currency-flagged type names, and the compiler-generated
//! initializers of declared types.

use rustc_hash::{FxHashMap, FxHashSet};

use quartz_ir::{
    ContractDeclaration, EventDeclaration, FunctionDeclaration, Identifier, Name, Parameter,
    RawType, SpecialDeclaration, StringInterner, VariableDeclaration,
};

/// The declared contract: ordered fields and events.
#[derive(Clone, Debug)]
pub struct ContractInfo {
    pub identifier: Identifier,
    pub fields: Vec<VariableDeclaration>,
    pub events: Vec<EventDeclaration>,
}

impl ContractInfo {
    /// Look up a contract field by name.
    pub fn field(&self, name: Name) -> Option<&VariableDeclaration> {
        self.fields.iter().find(|f| f.identifier.name == name)
    }
}

/// A function registered under a behavior block's capability guard.
#[derive(Clone, Debug)]
pub struct FunctionInfo {
    pub identifier: Identifier,
    pub contract: Name,
    /// The guard's capabilities, in declaration order.
    pub capabilities: Vec<Name>,
    /// Whether the guard lists the universal capability.
    pub declares_any: bool,
    pub params: Vec<Parameter>,
    pub result: Option<RawType>,
    pub is_public: bool,
    pub is_mutating: bool,
}

/// Outcome of resolving a call against the environment.
#[derive(Debug)]
pub enum Resolution<'a> {
    /// A single best candidate.
    Matched(&'a FunctionInfo),
    /// No function with this name is declared.
    Unknown,
    /// The name exists, but no overload takes this many arguments.
    ArityMismatch { expected: usize },
    /// An overload exists, but the caller's capabilities do not reach it.
    CapabilityViolation,
}

/// Mutable during the declaration pass, read-only during lowering.
pub struct Environment {
    /// The universal capability name, pre-resolved for comparisons.
    any: Name,
    contract: Option<ContractInfo>,
    initializer: Option<SpecialDeclaration>,
    functions: FxHashMap<Name, Vec<FunctionInfo>>,
    events: FxHashMap<Name, Vec<Parameter>>,
    currencies: FxHashSet<Name>,
    /// Type names whose initializer the compiler synthesizes; calls to
    /// them erase to their single argument.
    generated_inits: FxHashSet<Name>,
}

impl Environment {
    pub fn new(interner: &StringInterner) -> Self {
        Environment {
            any: interner.intern("any"),
            contract: None,
            initializer: None,
            functions: FxHashMap::default(),
            events: FxHashMap::default(),
            currencies: FxHashSet::default(),
            generated_inits: FxHashSet::default(),
        }
    }

    // ===== Declaration phase =====

    /// Record the compilation unit's contract. Returns `false` if a
    /// contract was already declared.
    pub fn declare_contract(&mut self, decl: &ContractDeclaration) -> bool {
        if self.contract.is_some() {
            return false;
        }
        for event in &decl.events {
            self.events.insert(event.identifier.name, event.params.clone());
        }
        // The contract's nominal coercion: `C(x)` erases to `x`.
        self.generated_inits.insert(decl.identifier.name);
        self.contract = Some(ContractInfo {
            identifier: decl.identifier,
            fields: decl.fields.clone(),
            events: decl.events.clone(),
        });
        true
    }

    /// Flag a user-defined type name as a currency.
    pub fn declare_currency(&mut self, name: Name) {
        self.currencies.insert(name);
        self.generated_inits.insert(name);
    }

    /// Register a function under its behavior guard. Returns `false` when
    /// an identical (name, capability set, arity) registration exists.
    pub fn declare_function(
        &mut self,
        contract: Name,
        capabilities: &[Name],
        declares_any: bool,
        decl: &FunctionDeclaration,
    ) -> bool {
        let info = FunctionInfo {
            identifier: decl.identifier,
            contract,
            capabilities: capabilities.to_vec(),
            declares_any,
            params: decl.params.clone(),
            result: decl.result.clone(),
            is_public: decl.is_public(),
            is_mutating: decl.is_mutating(),
        };

        let group = self.functions.entry(decl.identifier.name).or_default();
        let duplicate = group.iter().any(|f| {
            f.params.len() == info.params.len() && same_capability_set(&f.capabilities, &info.capabilities)
        });
        if duplicate {
            return false;
        }
        group.push(info);
        true
    }

    /// Record the contract initializer. Returns `false` on a duplicate.
    pub fn declare_initializer(&mut self, decl: &SpecialDeclaration) -> bool {
        if self.initializer.is_some() {
            return false;
        }
        self.initializer = Some(decl.clone());
        true
    }

    // ===== Query phase =====

    pub fn contract(&self) -> Option<&ContractInfo> {
        self.contract.as_ref()
    }

    pub fn initializer(&self) -> Option<&SpecialDeclaration> {
        self.initializer.as_ref()
    }

    /// Check whether `name` is the declared contract.
    pub fn is_contract(&self, name: Name) -> bool {
        self.contract
            .as_ref()
            .is_some_and(|c| c.identifier.name == name)
    }

    pub fn is_currency(&self, name: Name) -> bool {
        self.currencies.contains(&name)
    }

    pub fn is_event(&self, name: Name) -> bool {
        self.events.contains_key(&name)
    }

    pub fn event_params(&self, name: Name) -> Option<&[Parameter]> {
        self.events.get(&name).map(Vec::as_slice)
    }

    pub fn is_generated_initializer(&self, name: Name) -> bool {
        self.generated_inits.contains(&name)
    }

    /// Look up a contract field by name.
    pub fn contract_field(&self, name: Name) -> Option<&VariableDeclaration> {
        self.contract.as_ref().and_then(|c| c.field(name))
    }

    /// Resolve a call under the caller's capability set.
    ///
    /// A callee accepts the caller iff the callee declares `any` or the
    /// two capability sets intersect; `any` is the top of the capability
    /// lattice. Among accepted overloads an exact capability-set match is
    /// preferred over an `any` match.
    pub fn resolve_function(
        &self,
        name: Name,
        argc: usize,
        caller_caps: &[Name],
    ) -> Resolution<'_> {
        let Some(group) = self.functions.get(&name) else {
            return Resolution::Unknown;
        };

        let arity_matches: Vec<&FunctionInfo> =
            group.iter().filter(|f| f.params.len() == argc).collect();
        if arity_matches.is_empty() {
            let expected = group.first().map_or(0, |f| f.params.len());
            return Resolution::ArityMismatch { expected };
        }

        let accepted: Vec<&FunctionInfo> = arity_matches
            .into_iter()
            .filter(|f| self.accepts(f, caller_caps))
            .collect();
        if accepted.is_empty() {
            return Resolution::CapabilityViolation;
        }

        // Prefer an exact capability-set match over the `any` fallback.
        let exact = accepted
            .iter()
            .copied()
            .find(|f| same_capability_set(&f.capabilities, caller_caps));
        Resolution::Matched(exact.unwrap_or(accepted[0]))
    }

    fn accepts(&self, callee: &FunctionInfo, caller_caps: &[Name]) -> bool {
        callee.declares_any || callee.capabilities.iter().any(|c| caller_caps.contains(c))
    }

    /// The interned universal capability name.
    pub fn any_capability(&self) -> Name {
        self.any
    }
}

/// Set equality on capability lists, ignoring order and repetition.
fn same_capability_set(a: &[Name], b: &[Name]) -> bool {
    a.iter().all(|c| b.contains(c)) && b.iter().all(|c| a.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quartz_ir::{BasicType, Identifier, Modifiers, Span, StmtRange};

    fn ident(interner: &StringInterner, s: &str) -> Identifier {
        Identifier::new(interner.intern(s), Span::DUMMY)
    }

    fn func_decl(interner: &StringInterner, name: &str, params: usize) -> FunctionDeclaration {
        FunctionDeclaration {
            modifiers: Modifiers::PUBLIC,
            identifier: ident(interner, name),
            params: (0..params)
                .map(|i| Parameter {
                    identifier: ident(interner, &format!("p{i}")),
                    ty: RawType::Basic(BasicType::Int),
                })
                .collect(),
            result: None,
            body: StmtRange::EMPTY,
            span: Span::DUMMY,
        }
    }

    #[test]
    fn test_resolution_prefers_exact_capability_match() {
        let interner = StringInterner::new();
        let mut env = Environment::new(&interner);

        let contract = interner.intern("C");
        let admin = interner.intern("admin");
        let any = env.any_capability();

        let f = func_decl(&interner, "f", 0);
        assert!(env.declare_function(contract, &[admin], false, &f));
        assert!(env.declare_function(contract, &[any], true, &f));

        match env.resolve_function(f.identifier.name, 0, &[admin]) {
            Resolution::Matched(info) => assert_eq!(info.capabilities, vec![admin]),
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn test_resolution_capability_violation() {
        let interner = StringInterner::new();
        let mut env = Environment::new(&interner);

        let contract = interner.intern("C");
        let admin = interner.intern("admin");
        let user = interner.intern("user");

        let f = func_decl(&interner, "f", 0);
        assert!(env.declare_function(contract, &[admin], false, &f));

        assert!(matches!(
            env.resolve_function(f.identifier.name, 0, &[user]),
            Resolution::CapabilityViolation
        ));
    }

    #[test]
    fn test_resolution_any_accepts_all_callers() {
        let interner = StringInterner::new();
        let mut env = Environment::new(&interner);

        let contract = interner.intern("C");
        let user = interner.intern("user");
        let any = env.any_capability();

        let f = func_decl(&interner, "f", 0);
        assert!(env.declare_function(contract, &[any], true, &f));

        assert!(matches!(
            env.resolve_function(f.identifier.name, 0, &[user]),
            Resolution::Matched(_)
        ));
    }

    #[test]
    fn test_resolution_arity_and_unknown() {
        let interner = StringInterner::new();
        let mut env = Environment::new(&interner);

        let contract = interner.intern("C");
        let any = env.any_capability();

        let f = func_decl(&interner, "f", 2);
        assert!(env.declare_function(contract, &[any], true, &f));

        assert!(matches!(
            env.resolve_function(f.identifier.name, 1, &[any]),
            Resolution::ArityMismatch { expected: 2 }
        ));
        assert!(matches!(
            env.resolve_function(interner.intern("missing"), 0, &[any]),
            Resolution::Unknown
        ));
    }

    #[test]
    fn test_duplicate_function_rejected() {
        let interner = StringInterner::new();
        let mut env = Environment::new(&interner);

        let contract = interner.intern("C");
        let admin = interner.intern("admin");

        let f = func_decl(&interner, "f", 1);
        assert!(env.declare_function(contract, &[admin], false, &f));
        assert!(!env.declare_function(contract, &[admin], false, &f));
    }

    #[test]
    fn test_currency_flag_and_generated_init() {
        let interner = StringInterner::new();
        let mut env = Environment::new(&interner);

        let token = interner.intern("Token");
        env.declare_currency(token);

        assert!(env.is_currency(token));
        assert!(env.is_generated_initializer(token));
    }
}
