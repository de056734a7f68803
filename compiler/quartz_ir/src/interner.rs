//! String interner for identifier storage.
//!
//! One compilation is single-threaded and synchronous, so the interner is
//! a plain map-plus-table behind a `RefCell`; there is nothing to lock.
//! Independent compilations running in parallel each own their interner,
//! so no storage is ever shared across threads.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::Name;

/// Interner storage: lookup map plus the id-ordered string table.
///
/// Interned contents are leaked to `&'static str` so that [`Name`]
/// lookups hand out references without holding the cell borrow; the
/// storage lives for the process, which is the lifetime of a compilation.
struct InternTable {
    map: FxHashMap<&'static str, Name>,
    strings: Vec<&'static str>,
}

/// String interner with O(1) lookup and equality.
///
/// Interning goes through a shared reference because every phase holds
/// the same handle; a `RefCell` provides the interior mutability.
pub struct StringInterner {
    table: RefCell<InternTable>,
}

impl StringInterner {
    /// Create a new interner with the empty string at [`Name::EMPTY`] and
    /// the Quartz keywords pre-interned.
    pub fn new() -> Self {
        let interner = StringInterner {
            table: RefCell::new(InternTable {
                map: FxHashMap::default(),
                strings: Vec::with_capacity(256),
            }),
        };

        let empty = interner.intern("");
        debug_assert_eq!(empty, Name::EMPTY);
        interner.pre_intern_keywords();
        interner
    }

    /// Intern a string, returning its Name.
    ///
    /// # Panics
    /// Panics if the interner exceeds `u32::MAX` strings.
    pub fn intern(&self, s: &str) -> Name {
        let mut table = self.table.borrow_mut();
        if let Some(&name) = table.map.get(s) {
            return name;
        }

        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let index = u32::try_from(table.strings.len())
            .unwrap_or_else(|_| panic!("interner exceeded u32::MAX strings"));
        let name = Name::new(index);
        table.strings.push(leaked);
        table.map.insert(leaked, name);
        name
    }

    /// Look up the string for a Name.
    ///
    /// # Panics
    /// Panics if `name` was not produced by this interner.
    pub fn lookup(&self, name: Name) -> &'static str {
        self.table.borrow().strings[name.index()]
    }

    /// Pre-intern all Quartz keywords and common identifiers.
    fn pre_intern_keywords(&self) {
        const KEYWORDS: &[&str] = &[
            // Reserved keywords
            "contract", "var", "event", "func", "init", "public", "mutating",
            "return", "if", "else", "self", "true", "false", "inout",
            // Primitive type names
            "Address", "Int", "Bool", "String",
            // The universal caller capability
            "any",
            // Built-in currency type
            "Wei",
            // Generated procedure names
            "new", "publish", "get",
        ];

        for kw in KEYWORDS {
            self.intern(kw);
        }
    }

    /// Get the number of interned strings.
    pub fn len(&self) -> usize {
        self.table.borrow().strings.len()
    }

    /// Check if the interner is empty (only has the empty string).
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared interner handle passed to every compiler phase.
///
/// This newtype enforces that all interner sharing goes through this
/// type. The lexer, parser, semantic pass, and code generator must all
/// resolve the same `Name`s against the same storage; `Rc` is the right
/// handle because a compilation never leaves its thread.
#[derive(Clone)]
pub struct SharedInterner(Rc<StringInterner>);

impl SharedInterner {
    /// Create a new shared interner.
    pub fn new() -> Self {
        SharedInterner(Rc::new(StringInterner::new()))
    }
}

impl Default for SharedInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for SharedInterner {
    type Target = StringInterner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_reuses_ids() {
        let interner = StringInterner::new();

        let balance = interner.intern("balance");
        let owner = interner.intern("owner");

        assert_eq!(interner.intern("balance"), balance);
        assert_ne!(balance, owner);
    }

    #[test]
    fn test_lookup_roundtrip() {
        let interner = StringInterner::new();

        let name = interner.intern("deposit");
        assert_eq!(interner.lookup(name), "deposit");
        assert_eq!(interner.lookup(Name::EMPTY), "");
    }

    #[test]
    fn test_keywords_pre_interned() {
        let interner = StringInterner::new();
        let before = interner.len();

        interner.intern("contract");
        interner.intern("any");
        interner.intern("Wei");

        // Nothing new was allocated.
        assert_eq!(interner.len(), before);
    }

    #[test]
    fn test_shared_handle_sees_same_storage() {
        let interner = SharedInterner::new();
        let other = interner.clone();

        let name = interner.intern("shared");
        assert_eq!(other.intern("shared"), name);
        assert_eq!(other.lookup(name), "shared");
    }
}
