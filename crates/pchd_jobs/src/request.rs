//! Job requests and the record of which request is newest.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// What a job request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobRequestKind {
    /// Reparse a translation unit and refresh the document's results.
    Reparse,
    /// Reparse the document's supportive translation unit in the background.
    ReparseSupportive,
}

/// Which of a document's two translation units a request targets.
///
/// The supportive unit lets a reparse run while the primary unit keeps
/// serving completion and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferredTranslationUnit {
    /// The unit whose results the code model shows.
    Primary,
    /// The background unit.
    Supportive,
}

/// A request to run a job against one translation unit of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    /// The operation.
    pub kind: JobRequestKind,
    /// The document, by file path.
    pub file_path: PathBuf,
    /// The translation unit the job targets.
    pub preferred_translation_unit: PreferredTranslationUnit,
    /// Issue sequence number. Larger means newer; zero means not yet issued.
    pub issued_at: u64,
}

impl JobRequest {
    /// Creates an unissued request.
    pub fn new(
        kind: JobRequestKind,
        file_path: impl Into<PathBuf>,
        preferred_translation_unit: PreferredTranslationUnit,
    ) -> Self {
        Self {
            kind,
            file_path: file_path.into(),
            preferred_translation_unit,
            issued_at: 0,
        }
    }

    /// A primary reparse of `file_path`.
    pub fn reparse(file_path: impl Into<PathBuf>) -> Self {
        Self::new(JobRequestKind::Reparse, file_path, PreferredTranslationUnit::Primary)
    }

    /// A supportive reparse of `file_path`.
    pub fn reparse_supportive(file_path: impl Into<PathBuf>) -> Self {
        Self::new(
            JobRequestKind::ReparseSupportive,
            file_path,
            PreferredTranslationUnit::Supportive,
        )
    }
}

/// The newest issue number per document and translation unit.
#[derive(Debug, Default)]
pub struct IssuedRequests {
    latest: HashMap<(PathBuf, PreferredTranslationUnit), u64>,
}

impl IssuedRequests {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `request` as issued. Older issue numbers never replace newer ones.
    pub fn record(&mut self, request: &JobRequest) {
        let key = (request.file_path.clone(), request.preferred_translation_unit);
        let latest = self.latest.entry(key).or_insert(request.issued_at);
        *latest = (*latest).max(request.issued_at);
    }

    /// The newest issue number for a document's translation unit.
    pub fn latest(&self, file_path: &Path, unit: PreferredTranslationUnit) -> Option<u64> {
        self.latest.get(&(file_path.to_path_buf(), unit)).copied()
    }

    /// Returns `true` if a newer request than `request` targets the same
    /// translation unit.
    pub fn is_superseded(&self, request: &JobRequest) -> bool {
        self.latest(&request.file_path, request.preferred_translation_unit)
            .is_some_and(|latest| latest > request.issued_at)
    }

    /// Supersedes every request for `file_path` issued before `issued_at`,
    /// on both translation units. The record is kept so results from before
    /// a close stay outdated if the path is opened again.
    pub fn retire(&mut self, file_path: &Path, issued_at: u64) {
        for unit in [PreferredTranslationUnit::Primary, PreferredTranslationUnit::Supportive] {
            let latest = self.latest.entry((file_path.to_path_buf(), unit)).or_insert(issued_at);
            *latest = (*latest).max(issued_at);
        }
    }
}
