//! Shared primitives for the Strata analysis engine.
//!
//! Interned identifiers for module and export names, and content hashes
//! used by the base layer to detect which source files actually changed.

#![warn(missing_docs)]

pub mod hash;
pub mod ident;

pub use hash::ContentHash;
pub use ident::{Ident, Interner};
