//! Global string table backing [`Symbol`].
//!
//! The table is shared process-wide and safe for concurrent use: lookups
//! go through a lock-free `DashMap` keyed by the string itself, and the
//! index-to-string direction is an append-only vector behind an `RwLock`
//! (written only on a miss). Strings are leaked to obtain `'static`
//! references; the table is never torn down.

use std::sync::{LazyLock, RwLock};

use dashmap::DashMap;

use super::Symbol;

/// Indices below this value are handed out during table initialization
/// and always name language keywords and builtin names.
pub(crate) const RESERVED_SYMBOLS_END: u32 = 64;

/// Global string table instance.
///
/// Initialized on first use; all keywords and builtin names are
/// pre-interned so they occupy stable, predictable indices.
pub static STRING_TABLE: LazyLock<StringTable> = LazyLock::new(|| {
    let table = StringTable::new();
    table.initialize_known_symbols();
    table
});

/// Thread-safe append-only string table.
pub struct StringTable {
    /// string -> index, lock-free for the hot lookup path
    map: DashMap<&'static str, u32, ahash::RandomState>,

    /// index -> string, append-only
    strings: RwLock<Vec<&'static str>>,
}

impl StringTable {
    fn new() -> Self {
        Self {
            map: DashMap::with_capacity_and_hasher(256, ahash::RandomState::new()),
            strings: RwLock::new(Vec::with_capacity(256)),
        }
    }

    /// Pre-intern every keyword and builtin name.
    ///
    /// Run exactly once, before any other interning, so these land in the
    /// reserved index range.
    fn initialize_known_symbols(&self) {
        let known = [
            // Control flow keywords
            "if", "elif", "else", "for", "while", "break", "continue", "return", "end",
            // Declarations and operators-as-words
            "fn", "in", "data",
            // Literal keywords
            "true", "false", "none",
            // Builtin function names
            "print", "len", "sum", "min", "max", "sort", "set", "dict", "range",
        ];
        for s in known {
            self.intern(s);
        }
        debug_assert!(
            (self.strings.read().unwrap().len() as u32) <= RESERVED_SYMBOLS_END,
            "known symbols overflow the reserved range"
        );
    }

    /// Intern a string, returning its symbol.
    pub fn intern(&self, s: &str) -> Symbol {
        if let Some(idx) = self.map.get(s) {
            return Symbol(*idx);
        }

        let mut strings = self.strings.write().unwrap();
        // Double-check under the write lock: another thread may have won
        // the race between our lookup and here.
        if let Some(idx) = self.map.get(s) {
            return Symbol(*idx);
        }

        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let idx = strings.len() as u32;
        strings.push(leaked);
        self.map.insert(leaked, idx);
        Symbol(idx)
    }

    /// Resolve an index back to its string.
    ///
    /// # Panics
    ///
    /// Panics if the index was not produced by this table. Symbols are
    /// only constructed through [`Symbol::intern`], so a bad index means
    /// memory corruption or a cross-process symbol.
    pub fn resolve(&self, idx: u32) -> &'static str {
        self.strings.read().unwrap()[idx as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_idempotent() {
        let a = STRING_TABLE.intern("idempotent");
        let b = STRING_TABLE.intern("idempotent");
        assert_eq!(a, b);
    }

    #[test]
    fn test_resolve_returns_interned_text() {
        let sym = STRING_TABLE.intern("resolve_me");
        assert_eq!(STRING_TABLE.resolve(sym.0), "resolve_me");
    }

    #[test]
    fn test_concurrent_interning_agrees() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| Symbol::intern("contended")))
            .collect();
        let symbols: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(symbols.windows(2).all(|w| w[0] == w[1]));
    }
}
