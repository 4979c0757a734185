//! Source text management for the Strata analysis engine.
//!
//! Owns all loaded source content for a session, keyed by [`FileId`], and
//! defines the change-event stream the update protocol consumes. Content is
//! served to the base layer; everything downstream reads through the cache
//! chain instead of touching files.

#![warn(missing_docs)]

pub mod change;
pub mod file_id;
pub mod provider;
pub mod source_db;
pub mod source_file;

pub use change::{ChangeEvent, ChangeKind};
pub use file_id::FileId;
pub use provider::{FsProvider, MemoryProvider, SourceProvider};
pub use source_db::SourceDb;
pub use source_file::{module_stem, SourceFile};
