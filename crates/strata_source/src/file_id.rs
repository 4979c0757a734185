//! Compact handles for loaded source files.

/// A handle to one source file within a [`SourceDb`](crate::SourceDb).
///
/// Cheap to copy and compare; stable for the lifetime of the session even
/// when the file's content is replaced by an update.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct FileId(u32);

impl FileId {
    /// Builds a `FileId` from a raw index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let id = FileId::from_raw(3);
        assert_eq!(id.as_raw(), 3);
    }

    #[test]
    fn ordering_follows_index() {
        assert!(FileId::from_raw(1) < FileId::from_raw(2));
    }
}
