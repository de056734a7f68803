//! Integration Tests for the Quartz Compiler
//!
//! These tests exercise the full pipeline (lex → parse → analyze →
//! generate) through the driver's `compile` entry point.

use quartz_ir::SharedInterner;
use quartzc::compile;

/// Helper to compile Quartz code and return the module text.
fn compile_ok(source: &str) -> String {
    let interner = SharedInterner::new();
    compile(source, &interner).unwrap_or_else(|diags| {
        panic!("expected successful compilation, got:\n{diags:#?}")
    })
}

/// Helper to compile code expected to fail; returns joined messages.
fn compile_err(source: &str) -> String {
    let interner = SharedInterner::new();
    match compile(source, &interner) {
        Ok(out) => panic!("expected failure, got module:\n{out}"),
        Err(diags) => diags
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

// =============================================================================
// End-to-end scenarios
// =============================================================================

mod scenarios {
    use super::*;

    #[test]
    fn test_empty_contract() {
        let out = compile_ok("contract Empty {}\nEmpty :: [any] {}\n");

        assert!(out.contains("module Empty {"), "{out}");
        assert!(out.contains("resource T {}"), "{out}");
        assert!(out.contains("new(): Self.T {"), "{out}");
        assert!(out.contains("return struct T {};"), "{out}");
        assert!(out.contains("public publish() {"), "{out}");
        assert!(out.contains("move_to_sender<T>(Self.new());"), "{out}");
        assert!(out.contains("public get(addr: address): &mut Self.T {"), "{out}");
    }

    #[test]
    fn test_one_field_simple_initializer() {
        let out = compile_ok(
            "contract C { var x: Address }\n\
             C :: [any] {\n\
               public mutating init(y: Address) {\n\
                 self.x = y\n\
               }\n\
             }\n",
        );

        assert!(out.contains("let q$self$x: address;"), "{out}");
        assert!(out.contains("q$self$x = move(y);"), "{out}");
        assert!(out.contains("return struct T { x: move(q$self$x) };"), "{out}");
    }

    #[test]
    fn test_post_construction_mutation() {
        let out = compile_ok(
            "contract Pair {\n  var x: Int\n  var y: Int\n}\n\
             Pair :: [any] {\n\
               public init(a: Int, b: Int) {\n\
                 self.x = a\n\
                 self.y = b\n\
                 self.x = self.y + 1\n\
               }\n\
             }\n",
        );

        let let_self = out.find("let self: Self.T;").unwrap_or(usize::MAX);
        let construct = out
            .find("self = struct T { x: move(q$self$x), y: move(q$self$y) };")
            .unwrap_or(usize::MAX);
        let tail_store = out.find("self.x = ").unwrap_or(usize::MAX);
        let ret = out.find("return move(self);").unwrap_or(usize::MAX);

        assert!(let_self < construct, "{out}");
        assert!(construct < tail_store, "{out}");
        assert!(tail_store < ret, "{out}");
    }

    #[test]
    fn test_overloaded_behaviors() {
        let out = compile_ok(
            "contract C { var x: Int }\n\
             C :: [admin] {\n\
               public func f() {\n\
                 self.x = 1\n\
               }\n\
               public func call_f() {\n\
                 f()\n\
               }\n\
             }\n\
             C :: [any] {\n\
               public func f() {\n\
                 self.x = 2\n\
               }\n\
               public init() {\n\
                 self.x = 0\n\
               }\n\
             }\n",
        );

        // Two distinct procedures for the two guards.
        assert!(out.contains("public f$C$admin$$()"), "{out}");
        assert!(out.contains("public f$C$any$$()"), "{out}");
        // The [admin] caller resolves to the [admin] variant.
        assert!(out.contains("f$C$admin$$();"), "{out}");
        assert!(!out.contains("f$C$any$$();"), "{out}");
    }

    #[test]
    fn test_resource_argument_pass_through() {
        let out = compile_ok(
            "contract Exchange { var swaps: Int }\n\
             Exchange :: [any] {\n\
               public func sink(t: Wei) {\n\
               }\n\
               public func transfer(t: Wei) {\n\
                 sink(t)\n\
               }\n\
               public init() {\n\
                 self.swaps = 0\n\
               }\n\
             }\n",
        );

        // The resource argument moves, and `t` is consumed exactly once.
        assert!(out.contains("(move(t));"), "{out}");
        assert_eq!(out.matches("move(t)").count(), 1, "{out}");
        assert!(!out.contains("copy(t)"), "{out}");
    }

    #[test]
    fn test_shadow_assignment_idempotence() {
        let with_shadow = compile_ok(
            "contract C { var x: Int }\n\
             C :: [any] {\n\
               public func id(a: Int) -> Int {\n\
                 var a: Int = a\n\
                 return a\n\
               }\n\
               public init() {\n\
                 self.x = 0\n\
               }\n\
             }\n",
        );
        let without_shadow = compile_ok(
            "contract C { var x: Int }\n\
             C :: [any] {\n\
               public func id(a: Int) -> Int {\n\
                 return a\n\
               }\n\
               public init() {\n\
                 self.x = 0\n\
               }\n\
             }\n",
        );

        assert_eq!(with_shadow, without_shadow);
    }
}

// =============================================================================
// Laws
// =============================================================================

mod laws {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_capability_widening_preserves_acceptance() {
        let narrow = "contract C { var x: Int }\n\
             C :: [admin] {\n\
               public func f() {\n\
                 self.x = 1\n\
               }\n\
               public func g() {\n\
                 f()\n\
               }\n\
             }\n\
             C :: [any] { public init() { self.x = 0 } }\n";
        let widened = narrow.replace("C :: [admin]", "C :: [any]");

        // Accepted under [admin] stays accepted after widening to [any].
        compile_ok(narrow);
        compile_ok(&widened);
    }

    #[test]
    fn test_widening_enlarges_accepted_calls() {
        let rejected = "contract C { var x: Int }\n\
             C :: [admin] {\n\
               public func f() {\n\
                 self.x = 1\n\
               }\n\
             }\n\
             C :: [user] {\n\
               public func g() {\n\
                 f()\n\
               }\n\
             }\n\
             C :: [any] { public init() { self.x = 0 } }\n";
        let accepted = rejected.replace("C :: [admin]", "C :: [any]");

        let err = compile_err(rejected);
        assert!(err.contains("E2003"), "{err}");
        compile_ok(&accepted);
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let source = "contract Bank {\n  var owner: Address\n  var balance: Int\n}\n\
             Bank :: [manager] {\n\
               public mutating func pay(amount: Int) {\n\
                 self.balance = self.balance - amount\n\
               }\n\
             }\n\
             Bank :: [any] {\n\
               public init(owner: Address) {\n\
                 self.owner = owner\n\
                 self.balance = 0\n\
               }\n\
             }\n";

        assert_eq!(compile_ok(source), compile_ok(source));
    }
}

// =============================================================================
// Failure paths
// =============================================================================

mod failures {
    use super::*;

    #[test]
    fn test_parse_failure() {
        let err = compile_err("contract {\n");
        assert!(err.contains("identifier"), "{err}");
    }

    #[test]
    fn test_unresolved_reference() {
        let err = compile_err(
            "contract C { var x: Int }\n\
             C :: [any] {\n\
               public func f() {\n\
                 self.x = missing\n\
               }\n\
               public init() { self.x = 0 }\n\
             }\n",
        );
        assert!(err.contains("unresolved reference `missing`"), "{err}");
    }

    #[test]
    fn test_unknown_collection_type() {
        let err = compile_err(
            "contract C { var xs: [Int] }\nC :: [any] { public init() {} }\n",
        );
        assert!(err.contains("E2001"), "{err}");
        assert!(err.contains("[Int]"), "{err}");
    }

    #[test]
    fn test_initializer_incompleteness_lists_fields() {
        let err = compile_err(
            "contract C {\n  var x: Int\n  var y: Int\n  var z: Int\n}\n\
             C :: [any] {\n\
               public init() {\n\
                 self.y = 2\n\
               }\n\
             }\n",
        );
        assert!(err.contains("E2004"), "{err}");
        assert!(err.contains('x'), "{err}");
        assert!(err.contains('z'), "{err}");
        assert!(!err.contains("field(s): y"), "{err}");
    }

    #[test]
    fn test_no_partial_emission() {
        let interner = SharedInterner::new();
        let result = compile(
            "contract C { var x: Int }\n\
             C :: [any] {\n\
               public func bad() {\n\
                 frobnicate()\n\
               }\n\
               public init() { self.x = 0 }\n\
             }\n",
            &interner,
        );
        assert!(result.is_err());
    }
}

// =============================================================================
// CLI
// =============================================================================

mod cli {
    use std::process::Command;

    const GOOD: &str = "contract Empty {}\nEmpty :: [any] {}\n";
    const BAD: &str = "contract {\n";

    #[test]
    fn test_cli_success_writes_output() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
        let input = dir.path().join("empty.qtz");
        let output = dir.path().join("empty.mvir");
        std::fs::write(&input, GOOD).unwrap_or_else(|e| panic!("write: {e}"));

        let status = Command::new(env!("CARGO_BIN_EXE_quartz"))
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .status()
            .unwrap_or_else(|e| panic!("spawn: {e}"));

        assert!(status.success());
        let text = std::fs::read_to_string(&output).unwrap_or_else(|e| panic!("read: {e}"));
        assert!(text.contains("module Empty {"));
    }

    #[test]
    fn test_cli_failure_exits_nonzero() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
        let input = dir.path().join("bad.qtz");
        std::fs::write(&input, BAD).unwrap_or_else(|e| panic!("write: {e}"));

        let result = Command::new(env!("CARGO_BIN_EXE_quartz"))
            .arg(&input)
            .output()
            .unwrap_or_else(|e| panic!("spawn: {e}"));

        assert!(!result.status.success());
        let stderr = String::from_utf8_lossy(&result.stderr);
        assert!(stderr.contains("error"), "{stderr}");
    }
}
