//! Name Mangling
//!
//! Caller-capability overloading means one source name can compile to
//! several target procedures. The mangler derives a unique target
//! identifier from the `(contract, capability list, signature)` triple:
//!
//! ```text
//! {name}${contract}${cap1}$...${capN}$${ty1}$...${tyM}
//! ```
//!
//! Source identifiers cannot contain `$`, so the separator never occurs
//! inside a segment; capability lists are non-empty, so the `$$` marker
//! between capabilities and parameter types occurs exactly once. Both
//! facts together make the encoding injective, and it is a pure function
//! of its inputs, so it is stable across runs.
//!
//! A plain local is mangled by its name alone: function manglings always
//! contain `$`, locals never do, which keeps the two namespaces apart.

use quartz_ir::StringInterner;

use crate::types::CanonicalType;

/// Mangle a function under its contract, capability guard, and parameter
/// canonical types.
pub fn mangle_function(
    name: &str,
    contract: &str,
    capabilities: &[&str],
    params: &[CanonicalType],
    interner: &StringInterner,
) -> String {
    debug_assert!(!capabilities.is_empty(), "capability guards are never empty");

    let mut out = String::with_capacity(name.len() + contract.len() + 16);
    out.push_str(name);
    out.push('$');
    out.push_str(contract);
    for cap in capabilities {
        out.push('$');
        out.push_str(cap);
    }
    out.push_str("$$");
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            out.push('$');
        }
        out.push_str(&param.mangle_segment(interner));
    }
    out
}

/// Mangle a local variable or parameter: the name alone.
pub fn mangle_local(name: &str) -> String {
    name.to_owned()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;
    use quartz_ir::StringInterner;

    #[test]
    fn test_mangle_shape() {
        let interner = StringInterner::new();
        let mangled = mangle_function(
            "transfer",
            "Bank",
            &["manager"],
            &[CanonicalType::Address, CanonicalType::U64],
            &interner,
        );
        assert_eq!(mangled, "transfer$Bank$manager$$address$u64");
    }

    #[test]
    fn test_mangle_no_params() {
        let interner = StringInterner::new();
        let mangled = mangle_function("close", "Bank", &["any"], &[], &interner);
        assert_eq!(mangled, "close$Bank$any$$");
    }

    #[test]
    fn test_distinct_capability_sets_distinct_names() {
        let interner = StringInterner::new();
        let admin = mangle_function("f", "C", &["admin"], &[], &interner);
        let any = mangle_function("f", "C", &["any"], &[], &interner);
        assert_ne!(admin, any);
    }

    #[test]
    fn test_underscores_do_not_collide() {
        let interner = StringInterner::new();
        // ("a_b", ["c"]) vs ("a", ["b_c"]) style ambiguity must not arise.
        let left = mangle_function("f", "a_b", &["c"], &[], &interner);
        let right = mangle_function("f", "a", &["b_c"], &[], &interner);
        assert_ne!(left, right);
    }

    #[test]
    fn test_locals_never_collide_with_functions() {
        let interner = StringInterner::new();
        let function = mangle_function("f", "C", &["any"], &[], &interner);
        let local = mangle_local("f");
        assert_ne!(function, local);
        assert!(function.contains('$'));
        assert!(!local.contains('$'));
    }

    proptest! {
        /// Distinct triples produce distinct manglings.
        #[test]
        fn prop_mangle_injective(
            name_a in "[a-z][a-z0-9_]{0,8}",
            name_b in "[a-z][a-z0-9_]{0,8}",
            contract_a in "[A-Z][a-zA-Z0-9_]{0,8}",
            contract_b in "[A-Z][a-zA-Z0-9_]{0,8}",
            caps_a in proptest::collection::vec("[a-z][a-z_]{0,6}", 1..3),
            caps_b in proptest::collection::vec("[a-z][a-z_]{0,6}", 1..3),
        ) {
            let interner = StringInterner::new();
            let refs_a: Vec<&str> = caps_a.iter().map(String::as_str).collect();
            let refs_b: Vec<&str> = caps_b.iter().map(String::as_str).collect();

            let left = mangle_function(&name_a, &contract_a, &refs_a, &[], &interner);
            let right = mangle_function(&name_b, &contract_b, &refs_b, &[], &interner);

            if (name_a.as_str(), contract_a.as_str(), &caps_a)
                != (name_b.as_str(), contract_b.as_str(), &caps_b)
            {
                prop_assert_ne!(left, right);
            } else {
                prop_assert_eq!(left, right);
            }
        }

        /// Mangling is stable: equal inputs always agree.
        #[test]
        fn prop_mangle_stable(
            name in "[a-z][a-z0-9_]{0,8}",
            contract in "[A-Z][a-zA-Z0-9_]{0,8}",
        ) {
            let interner = StringInterner::new();
            let first = mangle_function(&name, &contract, &["any"], &[CanonicalType::U64], &interner);
            let second = mangle_function(&name, &contract, &["any"], &[CanonicalType::U64], &interner);
            prop_assert_eq!(first, second);
        }
    }
}
