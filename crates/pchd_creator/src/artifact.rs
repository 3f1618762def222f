//! Records handed back to the caller once generation completes.

use std::path::PathBuf;

use pchd_common::PathId;
use serde::{Deserialize, Serialize};

/// Which PCH an artifact is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "snake_case")]
pub enum PchScope {
    /// The PCH shared by every project part.
    Global,
    /// The PCH private to one project part.
    ProjectPart(String),
}

/// A generated precompiled header on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PchArtifact {
    /// Global or per-part.
    pub scope: PchScope,
    /// The PCH file.
    pub path: PathBuf,
    /// The generated header the PCH was compiled from.
    pub header_path: PathBuf,
    /// The full command line that produced it, executable first.
    pub arguments: Vec<String>,
    /// The headers the PCH encodes, in header file order.
    pub include_ids: Vec<PathId>,
}

impl PchArtifact {
    /// Returns the project part id, or `None` for the global PCH.
    pub fn project_part_id(&self) -> Option<&str> {
        match &self.scope {
            PchScope::Global => None,
            PchScope::ProjectPart(id) => Some(id),
        }
    }
}

/// The include set of one project part, keyed by part id.
///
/// Tells the code model which files invalidate the part's cached analysis
/// when they change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdPaths {
    /// Project part id.
    pub id: String,
    /// Ids of the headers the part's PCH encodes.
    pub paths: Vec<PathId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_part_id() {
        let artifact = PchArtifact {
            scope: PchScope::ProjectPart("app".to_string()),
            path: PathBuf::from("/out/app.pch"),
            header_path: PathBuf::from("/out/app.h"),
            arguments: vec![],
            include_ids: vec![],
        };
        assert_eq!(artifact.project_part_id(), Some("app"));

        let global = PchArtifact {
            scope: PchScope::Global,
            ..artifact
        };
        assert_eq!(global.project_part_id(), None);
    }

    #[test]
    fn scope_json_shape() {
        let json = serde_json::to_string(&PchScope::ProjectPart("app".to_string())).unwrap();
        assert_eq!(json, r#"{"scope":"project_part","id":"app"}"#);
        let json = serde_json::to_string(&PchScope::Global).unwrap();
        assert_eq!(json, r#"{"scope":"global"}"#);
    }
}
