//! Central database of all source files in an analysis session.

use crate::file_id::FileId;
use crate::source_file::SourceFile;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The source database, owning all loaded source text.
///
/// Unlike a batch compiler's source map this database is updatable: the
/// update protocol replaces or removes entries as change events arrive.
/// Removed slots are tombstoned so `FileId`s never dangle.
pub struct SourceDb {
    files: Vec<Option<SourceFile>>,
    by_path: HashMap<PathBuf, FileId>,
}

impl SourceDb {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            by_path: HashMap::new(),
        }
    }

    /// Inserts or replaces the content for `path`.
    ///
    /// Returns the file's id and whether the content actually changed.
    /// Re-inserting identical content reports `false`, which the base layer
    /// uses to suppress spurious invalidation.
    pub fn upsert(&mut self, path: &Path, content: &str) -> (FileId, bool) {
        if let Some(&id) = self.by_path.get(path) {
            let slot = &mut self.files[id.as_raw() as usize];
            match slot {
                Some(file) => {
                    let changed = file.replace(content);
                    (id, changed)
                }
                None => {
                    *slot = Some(SourceFile::new(id, path.to_path_buf(), content));
                    (id, true)
                }
            }
        } else {
            let id = FileId::from_raw(self.files.len() as u32);
            self.files
                .push(Some(SourceFile::new(id, path.to_path_buf(), content)));
            self.by_path.insert(path.to_path_buf(), id);
            (id, true)
        }
    }

    /// Removes the entry for `path`, returning its id if it was present.
    ///
    /// The id's slot is tombstoned; the path may later be re-inserted and
    /// will reuse the same id.
    pub fn remove(&mut self, path: &Path) -> Option<FileId> {
        let id = *self.by_path.get(path)?;
        let slot = &mut self.files[id.as_raw() as usize];
        if slot.is_none() {
            return None;
        }
        *slot = None;
        Some(id)
    }

    /// Looks up a file by path.
    pub fn get_by_path(&self, path: &Path) -> Option<&SourceFile> {
        let id = *self.by_path.get(path)?;
        self.get(id)
    }

    /// Looks up a file by id. Returns `None` for tombstoned entries.
    pub fn get(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.as_raw() as usize)?.as_ref()
    }

    /// Returns the content of `path` if present.
    pub fn content(&self, path: &Path) -> Option<Arc<str>> {
        self.get_by_path(path).map(|f| Arc::clone(&f.content))
    }

    /// Iterates over all live files.
    pub fn iter(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter().filter_map(|f| f.as_ref())
    }

    /// Number of live files.
    pub fn len(&self) -> usize {
        self.files.iter().filter(|f| f.is_some()).count()
    }

    /// Returns `true` when no live files remain.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SourceDb {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_and_get() {
        let mut db = SourceDb::new();
        let (id, changed) = db.upsert(Path::new("a.st"), "x: int");
        assert!(changed);
        assert_eq!(&*db.get(id).unwrap().content, "x: int");
        assert_eq!(&*db.content(Path::new("a.st")).unwrap(), "x: int");
    }

    #[test]
    fn upsert_same_content_is_noop() {
        let mut db = SourceDb::new();
        let (id1, _) = db.upsert(Path::new("a.st"), "x: int");
        let (id2, changed) = db.upsert(Path::new("a.st"), "x: int");
        assert_eq!(id1, id2);
        assert!(!changed);
    }

    #[test]
    fn upsert_new_content_changes() {
        let mut db = SourceDb::new();
        db.upsert(Path::new("a.st"), "x: int");
        let (_, changed) = db.upsert(Path::new("a.st"), "x: str");
        assert!(changed);
    }

    #[test]
    fn remove_tombstones_slot() {
        let mut db = SourceDb::new();
        let (id, _) = db.upsert(Path::new("a.st"), "x: int");
        assert_eq!(db.remove(Path::new("a.st")), Some(id));
        assert!(db.get(id).is_none());
        assert!(db.content(Path::new("a.st")).is_none());
        // Double remove reports absence.
        assert_eq!(db.remove(Path::new("a.st")), None);
    }

    #[test]
    fn reinsert_after_remove_reuses_id() {
        let mut db = SourceDb::new();
        let (id, _) = db.upsert(Path::new("a.st"), "x: int");
        db.remove(Path::new("a.st"));
        let (id2, changed) = db.upsert(Path::new("a.st"), "x: str");
        assert_eq!(id, id2);
        assert!(changed);
    }

    #[test]
    fn iter_skips_tombstones() {
        let mut db = SourceDb::new();
        db.upsert(Path::new("a.st"), "a");
        db.upsert(Path::new("b.st"), "b");
        db.remove(Path::new("a.st"));
        assert_eq!(db.len(), 1);
        assert_eq!(db.iter().count(), 1);
    }
}
