//! File identity for visited-set bookkeeping.

use std::io;
use std::path::{Path, PathBuf};

use pchd_common::normalize_path;

/// The identity of a file on disk, independent of how a path spells it.
///
/// Two spellings that reach the same file through symlinks or `..` compare
/// equal. Identities are what the visited set and exclusion lists key on;
/// reported paths stay lexically normalised.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileIdentity(PathBuf);

impl FileIdentity {
    /// Resolves the identity of an existing file.
    pub fn resolve(path: &Path) -> io::Result<Self> {
        std::fs::canonicalize(path).map(Self)
    }

    /// Resolves the identity of `path`, falling back to its lexical
    /// normalisation when the file cannot be resolved.
    pub fn resolve_or_lexical(path: &Path) -> Self {
        Self::resolve(path).unwrap_or_else(|_| Self(normalize_path(path)))
    }

    /// Returns the canonical path backing this identity.
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}
