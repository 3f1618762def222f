//! Shared foundational types used across the pchd precompiled-header backend.
//!
//! This crate provides the interned path identifiers every other component
//! keys its data on, lexical path normalisation, content hashing for
//! generated artifacts and the project part input record.

#![warn(missing_docs)]

pub mod hash;
pub mod path;
pub mod path_cache;
pub mod project_part;

pub use hash::ContentHash;
pub use path::{normalize_path, normalize_with_base};
pub use path_cache::{PathId, PathStringCache, UnresolvedPath};
pub use project_part::ProjectPart;
