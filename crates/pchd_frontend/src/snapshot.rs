//! The precompiled header format written by the in-process frontend.
//!
//! A snapshot records every header that went into a PCH, together with a
//! content hash of each header at emission time. Consuming a snapshot with
//! `-include-pch` marks those headers as already visited.
//!
//! On disk a snapshot is a 4-byte little-endian header length, a bincode
//! header carrying magic bytes, format version and payload checksum, then the
//! bincode payload.

use std::path::{Path, PathBuf};

use pchd_common::ContentHash;
use serde::{Deserialize, Serialize};

use crate::error::FrontendError;

/// Magic bytes identifying a PCH snapshot.
const SNAPSHOT_MAGIC: [u8; 4] = *b"PCHS";

/// Current snapshot format version.
const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotHeader {
    magic: [u8; 4],
    format_version: u32,
    checksum: ContentHash,
}

/// One header recorded in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Absolute, normalised header path.
    pub path: PathBuf,
    /// Content hash of the header when the snapshot was written.
    pub hash: ContentHash,
}

/// The headers precompiled into one PCH, in inclusion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PchSnapshot {
    entries: Vec<SnapshotEntry>,
}

impl PchSnapshot {
    /// Creates a snapshot from recorded entries.
    pub fn new(entries: Vec<SnapshotEntry>) -> Self {
        Self { entries }
    }

    /// Returns the recorded entries.
    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    /// Returns the recorded header paths.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|entry| entry.path.as_path())
    }

    /// Returns entries whose file changed or disappeared since emission.
    pub fn stale_entries(&self) -> Vec<&SnapshotEntry> {
        self.entries
            .iter()
            .filter(|entry| ContentHash::of_file(&entry.path).map_or(true, |hash| hash != entry.hash))
            .collect()
    }

    /// Writes the snapshot to `path`, replacing any existing file.
    pub fn write(&self, path: &Path) -> Result<(), FrontendError> {
        let invalid = |reason: String| FrontendError::InvalidSnapshot {
            path: path.to_path_buf(),
            reason,
        };

        let payload = bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| invalid(e.to_string()))?;
        let header = SnapshotHeader {
            magic: SNAPSHOT_MAGIC,
            format_version: SNAPSHOT_FORMAT_VERSION,
            checksum: ContentHash::from_bytes(&payload),
        };
        let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
            .map_err(|e| invalid(e.to_string()))?;

        let header_len = header_bytes.len() as u32;
        let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
        output.extend_from_slice(&header_len.to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(&payload);

        std::fs::write(path, &output).map_err(|source| FrontendError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads and validates a snapshot from `path`.
    pub fn read(path: &Path) -> Result<Self, FrontendError> {
        let invalid = |reason: &str| FrontendError::InvalidSnapshot {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        let raw = std::fs::read(path).map_err(|e| invalid(&e.to_string()))?;
        if raw.len() < 4 {
            return Err(invalid("truncated header"));
        }
        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&raw[..4]);
        let header_len = u32::from_le_bytes(len_bytes) as usize;
        if raw.len() < 4 + header_len {
            return Err(invalid("truncated header"));
        }

        let (header, _): (SnapshotHeader, usize) =
            bincode::serde::decode_from_slice(&raw[4..4 + header_len], bincode::config::standard())
                .map_err(|e| invalid(&e.to_string()))?;
        if header.magic != SNAPSHOT_MAGIC {
            return Err(invalid("bad magic"));
        }
        if header.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(invalid(&format!(
                "format version {} (expected {SNAPSHOT_FORMAT_VERSION})",
                header.format_version
            )));
        }

        let payload = &raw[4 + header_len..];
        if ContentHash::from_bytes(payload) != header.checksum {
            return Err(invalid("checksum mismatch"));
        }

        let (snapshot, _): (Self, usize) =
            bincode::serde::decode_from_slice(payload, bincode::config::standard())
                .map_err(|e| invalid(&e.to_string()))?;
        Ok(snapshot)
    }
}
