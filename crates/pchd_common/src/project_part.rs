//! The project part input record.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One compilable configuration within a project: its own compiler flags,
/// headers and sources.
///
/// Supplied by the build-system integration and treated as immutable for
/// the duration of one PCH generation pass. Parts may share headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectPart {
    /// Stable identity of the part, unique within one generation pass.
    pub id: String,
    /// Compiler arguments, without the compiler executable.
    #[serde(default)]
    pub arguments: Vec<String>,
    /// Header files belonging to the part.
    #[serde(default)]
    pub headers: Vec<PathBuf>,
    /// Source files belonging to the part.
    #[serde(default)]
    pub sources: Vec<PathBuf>,
}

impl ProjectPart {
    /// Creates a project part from its components.
    pub fn new(
        id: impl Into<String>,
        arguments: Vec<String>,
        headers: Vec<PathBuf>,
        sources: Vec<PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            arguments,
            headers,
            sources,
        }
    }

    /// Returns the part's headers followed by its sources, duplicates removed.
    pub fn header_and_source_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = Vec::with_capacity(self.headers.len() + self.sources.len());
        for path in self.headers.iter().chain(&self.sources) {
            if !paths.contains(path) {
                paths.push(path.clone());
            }
        }
        paths
    }
}
