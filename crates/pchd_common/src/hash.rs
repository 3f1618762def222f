//! XXH3 content hashes for generated file names and PCH snapshots.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::Path;

/// A 128-bit XXH3 hash of some bytes.
///
/// Project part ids hash into generated file names, and snapshots record the
/// hash of every header they encode so a changed header makes them stale.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(u128);

impl ContentHash {
    /// Hashes `data`.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(xxhash_rust::xxh3::xxh3_128(data))
    }

    /// Hashes the current contents of the file at `path`.
    pub fn of_file(path: &Path) -> io::Result<Self> {
        std::fs::read(path).map(|contents| Self::from_bytes(&contents))
    }

    /// The high 64 bits as 16 lowercase hex digits.
    pub fn short_hex(&self) -> String {
        format!("{:016x}", (self.0 >> 64) as u64)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({}..)", &self.short_hex()[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_ids_hash_apart() {
        assert_eq!(ContentHash::from_bytes(b"project1"), ContentHash::from_bytes(b"project1"));
        assert_ne!(ContentHash::from_bytes(b"project1"), ContentHash::from_bytes(b"project2"));
    }

    #[test]
    fn short_hex_prefixes_display() {
        let hash = ContentHash::from_bytes(b"app/core");
        let full = hash.to_string();
        assert_eq!(full.len(), 32);
        assert_eq!(hash.short_hex().len(), 16);
        assert!(full.starts_with(&hash.short_hex()));
        assert!(full.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn file_hash_tracks_contents() {
        let dir = tempfile::tempdir().unwrap();
        let header = dir.path().join("a.h");
        std::fs::write(&header, "#pragma once\n").unwrap();
        let before = ContentHash::of_file(&header).unwrap();
        assert_eq!(before, ContentHash::from_bytes(b"#pragma once\n"));

        std::fs::write(&header, "#pragma once\nint x;\n").unwrap();
        assert_ne!(ContentHash::of_file(&header).unwrap(), before);
        assert!(ContentHash::of_file(&dir.path().join("missing.h")).is_err());
    }
}
