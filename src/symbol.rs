use lasso::{Spur, ThreadedRodeo};
use std::sync::atomic::{AtomicU32, Ordering};

/// Interned head symbol of an application, constructor or relation combinator.
pub type FuncId = Spur;

/// Thread-safe symbol store.
///
/// Besides ordinary interning it hands out fresh symbols for the rigid
/// eigen-constants introduced while solving. Fresh names contain a `#`, which
/// the term builders never produce, so they cannot collide with user symbols.
pub struct SymbolStore {
    rodeo: ThreadedRodeo,
    fresh: AtomicU32,
}

impl SymbolStore {
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
            fresh: AtomicU32::new(0),
        }
    }

    /// Intern a symbol string, returning its unique FuncId.
    pub fn intern(&self, name: &str) -> FuncId {
        self.rodeo.get_or_intern(name)
    }

    /// Resolve a FuncId back to its string representation.
    pub fn resolve(&self, id: FuncId) -> Option<&str> {
        self.rodeo.try_resolve(&id)
    }

    /// Get the FuncId for a symbol if it exists, without interning.
    pub fn get(&self, name: &str) -> Option<FuncId> {
        self.rodeo.get(name)
    }

    /// Intern a never-before-seen symbol derived from `hint`.
    pub fn fresh(&self, hint: &str) -> FuncId {
        let n = self.fresh.fetch_add(1, Ordering::Relaxed);
        self.rodeo.get_or_intern(format!("{}#{}", hint, n))
    }

    /// Whether `id` was produced by [`SymbolStore::fresh`].
    pub fn is_fresh(&self, id: FuncId) -> bool {
        self.resolve(id).map_or(false, |name| name.contains('#'))
    }
}

impl Default for SymbolStore {
    fn default() -> Self {
        Self::new()
    }
}
