//! Open documents and their translation units.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pchd_common::PathStringCache;
use pchd_frontend::Frontend;

use crate::error::JobError;
use crate::request::PreferredTranslationUnit;
use crate::translation_unit::{TranslationUnit, UpdateInput, UpdateResult};

/// A source file open in the editor.
///
/// Each document carries a primary and a supportive translation unit, and
/// the last result applied to each.
#[derive(Debug)]
pub struct Document {
    file_path: PathBuf,
    project_part_id: String,
    compiler: String,
    arguments: Vec<String>,
    working_directory: PathBuf,
    revision: u64,
    needs_reparse: bool,
    primary: TranslationUnit,
    supportive: TranslationUnit,
    primary_result: Option<UpdateResult>,
    supportive_result: Option<UpdateResult>,
}

impl Document {
    /// Opens a document at revision 1, in need of a reparse.
    pub fn new(
        file_path: impl Into<PathBuf>,
        project_part_id: impl Into<String>,
        compiler: impl Into<String>,
        arguments: Vec<String>,
        working_directory: impl Into<PathBuf>,
        frontend: Arc<dyn Frontend>,
        cache: Arc<PathStringCache>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            project_part_id: project_part_id.into(),
            compiler: compiler.into(),
            arguments,
            working_directory: working_directory.into(),
            revision: 1,
            needs_reparse: true,
            primary: TranslationUnit::new(
                PreferredTranslationUnit::Primary,
                Arc::clone(&frontend),
                Arc::clone(&cache),
            ),
            supportive: TranslationUnit::new(PreferredTranslationUnit::Supportive, frontend, cache),
            primary_result: None,
            supportive_result: None,
        }
    }

    /// The source file.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// The project part the document is compiled in.
    pub fn project_part_id(&self) -> &str {
        &self.project_part_id
    }

    /// Current compiler arguments.
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Bumped on every change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// `true` until a primary result for the current revision is applied.
    pub fn needs_reparse(&self) -> bool {
        self.needs_reparse
    }

    /// Records an edit, optionally replacing the arguments. Returns the new revision.
    pub fn update(&mut self, arguments: Option<Vec<String>>) -> u64 {
        if let Some(arguments) = arguments {
            self.arguments = arguments;
        }
        self.revision += 1;
        self.needs_reparse = true;
        self.revision
    }

    /// The requested translation unit.
    pub fn translation_unit(&self, preferred: PreferredTranslationUnit) -> &TranslationUnit {
        match preferred {
            PreferredTranslationUnit::Primary => &self.primary,
            PreferredTranslationUnit::Supportive => &self.supportive,
        }
    }

    /// Copies the current state into an [`UpdateInput`].
    pub fn create_update_input(&self) -> UpdateInput {
        UpdateInput {
            file_path: self.file_path.clone(),
            compiler: self.compiler.clone(),
            arguments: self.arguments.clone(),
            working_directory: self.working_directory.clone(),
            revision: self.revision,
        }
    }

    /// Stores a result for one of the translation units.
    pub fn incorporate_update_result(&mut self, preferred: PreferredTranslationUnit, result: UpdateResult) {
        match preferred {
            PreferredTranslationUnit::Primary => {
                if result.revision == self.revision {
                    self.needs_reparse = false;
                }
                self.primary_result = Some(result);
            }
            PreferredTranslationUnit::Supportive => self.supportive_result = Some(result),
        }
    }

    /// The last result applied to a translation unit.
    pub fn update_result(&self, preferred: PreferredTranslationUnit) -> Option<&UpdateResult> {
        match preferred {
            PreferredTranslationUnit::Primary => self.primary_result.as_ref(),
            PreferredTranslationUnit::Supportive => self.supportive_result.as_ref(),
        }
    }
}

/// The open documents, keyed by file path.
#[derive(Debug, Default)]
pub struct Documents {
    documents: HashMap<PathBuf, Document>,
}

impl Documents {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `document`. Fails if a document with the same path is open.
    pub fn open(&mut self, document: Document) -> Result<(), JobError> {
        if self.documents.contains_key(document.file_path()) {
            return Err(JobError::DocumentAlreadyOpen(document.file_path.clone()));
        }
        self.documents.insert(document.file_path.clone(), document);
        Ok(())
    }

    /// Removes and returns the document at `file_path`.
    pub fn close(&mut self, file_path: &Path) -> Result<Document, JobError> {
        self.documents
            .remove(file_path)
            .ok_or_else(|| JobError::DocumentNotOpen(file_path.to_path_buf()))
    }

    /// The document at `file_path`.
    pub fn get(&self, file_path: &Path) -> Result<&Document, JobError> {
        self.documents
            .get(file_path)
            .ok_or_else(|| JobError::DocumentNotOpen(file_path.to_path_buf()))
    }

    /// The document at `file_path`, mutably.
    pub fn get_mut(&mut self, file_path: &Path) -> Result<&mut Document, JobError> {
        self.documents
            .get_mut(file_path)
            .ok_or_else(|| JobError::DocumentNotOpen(file_path.to_path_buf()))
    }

    /// Returns `true` if a document is open at `file_path`.
    pub fn contains(&self, file_path: &Path) -> bool {
        self.documents.contains_key(file_path)
    }

    /// Number of open documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns `true` if no document is open.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pchd_frontend::ScanFrontend;

    fn document(path: &str) -> Document {
        Document::new(
            path,
            "app",
            "clang++",
            vec!["-DX".to_string()],
            "/work",
            Arc::new(ScanFrontend::new()),
            Arc::new(PathStringCache::new()),
        )
    }

    fn result(revision: u64) -> UpdateResult {
        UpdateResult {
            revision,
            include_ids: vec![],
            diagnostics: vec![],
        }
    }

    #[test]
    fn update_bumps_revision() {
        let mut doc = document("/work/a.cpp");
        assert_eq!(doc.revision(), 1);
        assert_eq!(doc.update(Some(vec!["-DY".to_string()])), 2);
        assert_eq!(doc.arguments(), &["-DY".to_string()]);
        assert_eq!(doc.create_update_input().revision, 2);
    }

    #[test]
    fn stale_primary_result_keeps_reparse_pending() {
        let mut doc = document("/work/a.cpp");
        doc.update(None);
        doc.incorporate_update_result(PreferredTranslationUnit::Primary, result(1));
        assert!(doc.needs_reparse());
        doc.incorporate_update_result(PreferredTranslationUnit::Primary, result(2));
        assert!(!doc.needs_reparse());
    }

    #[test]
    fn supportive_result_is_separate() {
        let mut doc = document("/work/a.cpp");
        doc.incorporate_update_result(PreferredTranslationUnit::Supportive, result(1));
        assert!(doc.update_result(PreferredTranslationUnit::Primary).is_none());
        assert!(doc.update_result(PreferredTranslationUnit::Supportive).is_some());
        assert!(doc.needs_reparse());
    }

    #[test]
    fn documents_open_close() {
        let mut docs = Documents::new();
        docs.open(document("/work/a.cpp")).unwrap();
        assert!(matches!(
            docs.open(document("/work/a.cpp")),
            Err(JobError::DocumentAlreadyOpen(_))
        ));
        assert_eq!(docs.get(Path::new("/work/a.cpp")).unwrap().project_part_id(), "app");
        docs.close(Path::new("/work/a.cpp")).unwrap();
        assert!(docs.is_empty());
        assert!(matches!(
            docs.close(Path::new("/work/a.cpp")),
            Err(JobError::DocumentNotOpen(_))
        ));
    }
}
