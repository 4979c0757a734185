//! The change-event stream consumed by the update protocol.

use std::path::PathBuf;

/// What happened to a path since the last update.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ChangeKind {
    /// The file appeared.
    Created,
    /// The file's content may have changed.
    Modified,
    /// The file was removed.
    Deleted,
}

/// One raw file-system (or editor) change, as delivered by the source
/// provider.
///
/// Events carry no content; the base layer re-reads through its provider,
/// so a batch of events for the same path collapses naturally to the
/// final on-disk state.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ChangeEvent {
    /// The affected path.
    pub path: PathBuf,
    /// What happened to it.
    pub kind: ChangeKind,
}

impl ChangeEvent {
    /// A creation event.
    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: ChangeKind::Created,
        }
    }

    /// A modification event.
    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: ChangeKind::Modified,
        }
    }

    /// A deletion event.
    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: ChangeKind::Deleted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_kind() {
        assert_eq!(ChangeEvent::created("a.st").kind, ChangeKind::Created);
        assert_eq!(ChangeEvent::modified("a.st").kind, ChangeKind::Modified);
        assert_eq!(ChangeEvent::deleted("a.st").kind, ChangeKind::Deleted);
    }
}
