//! Symbol interning.
//!
//! Symbols are interned so that equality and hashing are integer operations,
//! which is what the hash table's bucket math relies on.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Interned symbol identifier.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SymbolId(pub(crate) u32);

impl SymbolId {
    /// Returns the raw index of this symbol.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    // =========================================================================
    // Reserved Symbols
    // =========================================================================
    // These are always interned at startup with fixed indices.

    /// The canonical true value: `T`
    pub const TRUE: SymbolId = SymbolId(0);

    /// The quote special form: `quote`
    pub const QUOTE: SymbolId = SymbolId(1);
}

impl fmt::Debug for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolId({})", self.0)
    }
}

/// Interner mapping symbol names to unique IDs and back.
///
/// Not thread-safe; the runtime is single-threaded.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Interner {
    /// Symbol names, indexed by `SymbolId`.
    names: Vec<Arc<str>>,
    /// Map from name to `SymbolId`.
    ids: HashMap<Arc<str>, SymbolId>,
}

impl Interner {
    /// Reserved symbols that are pre-interned at startup.
    const RESERVED_SYMBOLS: &'static [&'static str] = &[
        "T",     // SymbolId(0) = TRUE
        "quote", // SymbolId(1) = QUOTE
    ];

    /// Creates a new interner with reserved symbols pre-interned.
    #[must_use]
    pub fn new() -> Self {
        let mut interner = Self::default();

        for (i, &name) in Self::RESERVED_SYMBOLS.iter().enumerate() {
            let id = interner.intern(name);
            debug_assert_eq!(
                id.0 as usize, i,
                "Reserved symbol '{name}' should have index {i}, got {}",
                id.0
            );
        }

        interner
    }

    /// Interns a symbol, returning its [`SymbolId`].
    ///
    /// # Panics
    ///
    /// Panics if the number of interned symbols exceeds `u32::MAX`.
    pub fn intern(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }

        let id = SymbolId(u32::try_from(self.names.len()).expect("too many symbols"));
        let arc: Arc<str> = name.into();
        self.names.push(arc.clone());
        self.ids.insert(arc, id);
        id
    }

    /// Looks up a symbol without interning it.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.ids.get(name).copied()
    }

    /// Gets the name of a symbol.
    #[must_use]
    pub fn name(&self, id: SymbolId) -> Option<&str> {
        self.names.get(id.0 as usize).map(AsRef::as_ref)
    }

    /// Returns the number of interned symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if nothing has been interned (never true after `new`).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
