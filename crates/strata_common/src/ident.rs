//! Interned names for modules and exports.
//!
//! Every name that appears in a dependency description is interned, so the
//! fact values threaded through the engine are `Copy` and compare in O(1).

use lasso::ThreadedRodeo;
use serde::{Deserialize, Serialize};

/// An interned name: a module, an export, or any other named entity the
/// analysis tracks.
///
/// Represented as a `u32` index into the session's [`Interner`]. Two idents
/// from the same interner are equal iff the underlying strings are equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct Ident(u32);

impl Ident {
    /// Builds an `Ident` from a raw index, for deserialization and tests.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw interner index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

// SAFETY: the wrapped `u32` always fits in `usize` on supported platforms,
// and `try_from_usize` rejects indices that do not fit in `u32`.
unsafe impl lasso::Key for Ident {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(Ident)
    }
}

/// Thread-safe string interner shared by every layer of a session.
///
/// Workers intern concurrently during parallel recomputation, so the
/// interner is backed by [`lasso::ThreadedRodeo`] and handed around as
/// `Arc<Interner>`.
pub struct Interner {
    rodeo: ThreadedRodeo<Ident>,
}

impl Interner {
    /// Creates an empty interner.
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    /// Interns `s`, returning its [`Ident`]. Re-interning an existing
    /// string returns the same ident without allocating.
    pub fn intern(&self, s: &str) -> Ident {
        self.rodeo.get_or_intern(s)
    }

    /// Looks up an already-interned string without interning it.
    pub fn get(&self, s: &str) -> Option<Ident> {
        self.rodeo.get(s)
    }

    /// Resolves an ident back to its string.
    ///
    /// # Panics
    ///
    /// Panics if `ident` was produced by a different interner.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.rodeo.resolve(&ident)
    }

    /// Resolves an ident if it belongs to this interner.
    pub fn try_resolve(&self, ident: Ident) -> Option<&str> {
        self.rodeo.try_resolve(&ident)
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_and_resolve() {
        let interner = Interner::new();
        let id = interner.intern("collections");
        assert_eq!(interner.resolve(id), "collections");
    }

    #[test]
    fn interning_is_idempotent() {
        let interner = Interner::new();
        assert_eq!(interner.intern("foo"), interner.intern("foo"));
    }

    #[test]
    fn distinct_names_get_distinct_idents() {
        let interner = Interner::new();
        assert_ne!(interner.intern("foo"), interner.intern("bar"));
    }

    #[test]
    fn get_does_not_intern() {
        let interner = Interner::new();
        assert!(interner.get("missing").is_none());
        let id = interner.intern("present");
        assert_eq!(interner.get("present"), Some(id));
    }

    #[test]
    fn try_resolve_unknown_ident() {
        let interner = Interner::new();
        assert!(interner.try_resolve(Ident::from_raw(999)).is_none());
    }

    #[test]
    fn concurrent_interning_converges() {
        use std::sync::Arc;
        use std::thread;

        let interner = Arc::new(Interner::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let interner = Arc::clone(&interner);
            handles.push(thread::spawn(move || interner.intern("shared")));
        }
        let ids: Vec<Ident> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn serde_roundtrip() {
        let id = Ident::from_raw(7);
        let json = serde_json::to_string(&id).unwrap();
        let back: Ident = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
