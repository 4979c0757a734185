//! Content hashing for change detection at the base layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 128-bit XXH3 content hash.
///
/// The base layer hashes incoming file content and compares against the
/// previously stored hash; a matching hash means the write was a no-op and
/// no invalidation is seeded for it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Hashes a byte slice.
    pub fn of(data: &[u8]) -> Self {
        Self(xxhash_rust::xxh3::xxh3_128(data).to_le_bytes())
    }

    /// Hashes a string's UTF-8 bytes.
    pub fn of_str(s: &str) -> Self {
        Self::of(s.as_bytes())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_content_same_hash() {
        assert_eq!(ContentHash::of(b"x: int"), ContentHash::of(b"x: int"));
    }

    #[test]
    fn different_content_different_hash() {
        assert_ne!(ContentHash::of(b"x: int"), ContentHash::of(b"x: str"));
    }

    #[test]
    fn str_and_bytes_agree() {
        assert_eq!(ContentHash::of_str("use a"), ContentHash::of(b"use a"));
    }

    #[test]
    fn display_is_hex() {
        let s = ContentHash::of(b"content").to_string();
        assert_eq!(s.len(), 32);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
