//! Interned file paths with small, dense, stable identifiers.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

use lasso::ThreadedRodeo;
use serde::{Deserialize, Serialize};

use crate::path::normalize_path;

/// A dense identifier for a normalised file path.
///
/// Ids are allocated in first-seen order starting at zero and are never
/// reused: the cache only grows for the lifetime of the process.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct PathId(u32);

impl PathId {
    /// Creates a `PathId` from a raw `u32` index.
    ///
    /// Intended for deserialization and tests. Real ids come from
    /// [`PathStringCache::id`].
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw `u32` index of this id.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// SAFETY: `PathId` wraps a `u32` which is always a valid `usize` on 32-bit and
// 64-bit platforms. `try_from_usize` rejects values that don't fit in `u32`.
unsafe impl lasso::Key for PathId {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(PathId)
    }
}

/// Returned when a [`PathId`] was never allocated by the cache it is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unresolved path id {0}: no path was interned under this id")]
pub struct UnresolvedPath(pub PathId);

/// Thread-safe path interner backed by [`lasso::ThreadedRodeo`].
///
/// Every include collection pass maps the headers it finds through one shared
/// cache, so identical paths get identical ids across project parts and
/// across jobs. Lookups of existing paths proceed concurrently; inserting a
/// new path is serialised inside the rodeo. No component other than the
/// cache assigns ids.
pub struct PathStringCache {
    rodeo: ThreadedRodeo<PathId>,
}

impl PathStringCache {
    /// Creates a new empty cache.
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    /// Returns the id for `path`, allocating the next id on first sight.
    ///
    /// The path is lexically normalised first, so `a/./b` and `a/c/../b`
    /// share an id with `a/b`. Paths that are not valid UTF-8 are kept
    /// byte for byte and never collide with each other.
    pub fn id(&self, path: &Path) -> PathId {
        let normalized = normalize_path(path);
        self.rodeo.get_or_intern(key_for(normalized.as_os_str()))
    }

    /// Convenience wrapper around [`id`](Self::id) for string paths.
    pub fn id_of_str(&self, path: &str) -> PathId {
        self.id(Path::new(path))
    }

    /// Interns every path in order, returning their ids in the same order.
    pub fn ids(&self, paths: &[PathBuf]) -> Vec<PathId> {
        paths.iter().map(|path| self.id(path)).collect()
    }

    /// Returns the id of an already interned path without allocating.
    pub fn get(&self, path: &Path) -> Option<PathId> {
        let normalized = normalize_path(path);
        self.rodeo.get(key_for(normalized.as_os_str()))
    }

    /// Resolves an id back to its normalised path.
    pub fn path(&self, id: PathId) -> Result<PathBuf, UnresolvedPath> {
        self.rodeo
            .try_resolve(&id)
            .and_then(path_for)
            .ok_or(UnresolvedPath(id))
    }

    /// Resolves a batch of ids, failing on the first unknown one.
    pub fn paths(&self, ids: &[PathId]) -> Result<Vec<PathBuf>, UnresolvedPath> {
        ids.iter().map(|&id| self.path(id)).collect()
    }

    /// Returns the number of distinct paths interned so far.
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    /// Returns `true` if no path has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

// Rodeo keys are strings. A UTF-8 path is its own key; anything else is a
// NUL followed by the hex of its native code units. No real path starts with
// NUL, so the two forms never meet.
const ENCODED: char = '\0';

fn key_for(path: &OsStr) -> String {
    match path.to_str() {
        Some(plain) if !plain.starts_with(ENCODED) => plain.to_owned(),
        _ => {
            let mut key = String::from(ENCODED);
            for unit in native_units(path) {
                key.push_str(&format!("{unit:0width$x}", width = UNIT_HEX_WIDTH));
            }
            key
        }
    }
}

fn path_for(key: &str) -> Option<PathBuf> {
    let Some(hex) = key.strip_prefix(ENCODED) else {
        return Some(PathBuf::from(key));
    };
    let units = hex
        .as_bytes()
        .chunks(UNIT_HEX_WIDTH)
        .map(|chunk| {
            let digits = std::str::from_utf8(chunk).ok()?;
            NativeUnit::from_str_radix(digits, 16).ok()
        })
        .collect::<Option<Vec<_>>>()?;
    Some(PathBuf::from(from_native_units(units)))
}

#[cfg(unix)]
type NativeUnit = u8;
#[cfg(windows)]
type NativeUnit = u16;
#[cfg(not(any(unix, windows)))]
type NativeUnit = u8;

const UNIT_HEX_WIDTH: usize = std::mem::size_of::<NativeUnit>() * 2;

#[cfg(unix)]
fn native_units(path: &OsStr) -> Vec<NativeUnit> {
    use std::os::unix::ffi::OsStrExt;
    path.as_bytes().to_vec()
}

#[cfg(unix)]
fn from_native_units(units: Vec<NativeUnit>) -> OsString {
    use std::os::unix::ffi::OsStringExt;
    OsString::from_vec(units)
}

#[cfg(windows)]
fn native_units(path: &OsStr) -> Vec<NativeUnit> {
    use std::os::windows::ffi::OsStrExt;
    path.encode_wide().collect()
}

#[cfg(windows)]
fn from_native_units(units: Vec<NativeUnit>) -> OsString {
    use std::os::windows::ffi::OsStringExt;
    OsString::from_wide(&units)
}

// Elsewhere paths are UTF-8 in practice; keep the bytes of the lossy form.
#[cfg(not(any(unix, windows)))]
fn native_units(path: &OsStr) -> Vec<NativeUnit> {
    path.to_string_lossy().into_owned().into_bytes()
}

#[cfg(not(any(unix, windows)))]
fn from_native_units(units: Vec<NativeUnit>) -> OsString {
    OsString::from(String::from_utf8_lossy(&units).into_owned())
}

impl Default for PathStringCache {
    fn default() -> Self {
        Self::new()
    }
}
