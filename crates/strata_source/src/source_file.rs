//! A single loaded source file.

use crate::file_id::FileId;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use strata_common::ContentHash;

/// One source file's identity, path, and current content.
///
/// Content is stored as `Arc<str>` so values derived from it can hold a
/// cheap reference across update generations.
#[derive(Clone, Debug)]
pub struct SourceFile {
    /// Stable handle for this file within the session.
    pub id: FileId,
    /// The path the file was loaded from (or a synthetic name for
    /// in-memory sources).
    pub path: PathBuf,
    /// Current content.
    pub content: Arc<str>,
    /// Hash of `content`, used to suppress no-op updates.
    pub hash: ContentHash,
}

impl SourceFile {
    /// Creates a source file, hashing its content.
    pub fn new(id: FileId, path: PathBuf, content: &str) -> Self {
        Self {
            id,
            path,
            hash: ContentHash::of_str(content),
            content: Arc::from(content),
        }
    }

    /// Replaces the content in place, returning `false` when the new
    /// content hashes identically to the old (a no-op write).
    pub fn replace(&mut self, content: &str) -> bool {
        let hash = ContentHash::of_str(content);
        if hash == self.hash {
            return false;
        }
        self.hash = hash;
        self.content = Arc::from(content);
        true
    }
}

/// Derives the module name from a file path: the stem of the file name.
///
/// Returns `None` for paths without a UTF-8 stem (e.g. a bare directory).
pub fn module_stem(path: &Path) -> Option<&str> {
    path.file_stem()?.to_str()
}
