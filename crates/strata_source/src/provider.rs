//! Source providers: where the base layer reads content from.
//!
//! The engine never touches the file system directly; the base layer pulls
//! content through a [`SourceProvider`] when a change event arrives. Tests
//! and overlay sessions use the in-memory provider.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Reads source content for the base layer.
pub trait SourceProvider: Send + Sync {
    /// Reads the current content of `path`.
    fn read(&self, path: &Path) -> io::Result<String>;
}

/// Provider backed by the real file system.
pub struct FsProvider {
    root: PathBuf,
}

impl FsProvider {
    /// Creates a provider resolving relative paths against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SourceProvider for FsProvider {
    fn read(&self, path: &Path) -> io::Result<String> {
        let full = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        std::fs::read_to_string(full)
    }
}

/// In-memory provider for tests and scripted sessions.
///
/// The backing map is shared: clone the provider, mutate it with
/// [`set`](Self::set)/[`remove`](Self::remove), then feed the matching
/// change events to the engine.
#[derive(Clone, Default)]
pub struct MemoryProvider {
    files: Arc<RwLock<HashMap<PathBuf, String>>>,
}

impl MemoryProvider {
    /// Creates an empty in-memory provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the content for `path`.
    pub fn set(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files
            .write()
            .unwrap()
            .insert(path.into(), content.into());
    }

    /// Removes `path`.
    pub fn remove(&self, path: &Path) {
        self.files.write().unwrap().remove(path);
    }
}

impl SourceProvider for MemoryProvider {
    fn read(&self, path: &Path) -> io::Result<String> {
        self.files
            .read()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{}", path.display())))
    }
}
