//! Translation units and the update cycle that refreshes them.

use std::path::PathBuf;
use std::sync::Arc;

use pchd_common::{PathId, PathStringCache};
use pchd_diagnostics::{Diagnostic, DiagnosticCode};
use pchd_frontend::{Frontend, FrontendError, Invocation, PchArgumentBuilder, PchMode};

use crate::request::PreferredTranslationUnit;

/// Everything a reparse needs, copied out of a document so the work can run
/// while the document keeps changing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateInput {
    /// The source file.
    pub file_path: PathBuf,
    /// Compiler executable.
    pub compiler: String,
    /// Compiler arguments, without the executable or the input.
    pub arguments: Vec<String>,
    /// Directory the compiler runs in.
    pub working_directory: PathBuf,
    /// The document revision this input was taken from.
    pub revision: u64,
}

/// What a reparse produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResult {
    /// The document revision the result was computed for.
    pub revision: u64,
    /// Headers the unit includes, in first-entered order.
    pub include_ids: Vec<PathId>,
    /// Problems found while reparsing.
    pub diagnostics: Vec<Diagnostic>,
}

/// One analysable view of a document's source file.
///
/// Cloning is cheap and shares the frontend and path cache, which is how a
/// prepared job pins the unit it will run on.
#[derive(Clone)]
pub struct TranslationUnit {
    kind: PreferredTranslationUnit,
    frontend: Arc<dyn Frontend>,
    cache: Arc<PathStringCache>,
}

impl TranslationUnit {
    /// Creates a translation unit parsed with `frontend`.
    pub fn new(
        kind: PreferredTranslationUnit,
        frontend: Arc<dyn Frontend>,
        cache: Arc<PathStringCache>,
    ) -> Self {
        Self {
            kind,
            frontend,
            cache,
        }
    }

    /// Whether this is the primary or the supportive unit.
    pub fn kind(&self) -> PreferredTranslationUnit {
        self.kind
    }

    /// Reparses the unit from `input`.
    ///
    /// Frontend failures do not escape: they become diagnostics on a result
    /// with no includes.
    pub fn reparse(&self, input: &UpdateInput) -> UpdateResult {
        let arguments = PchArgumentBuilder::new(&input.arguments).build(PchMode::Preprocess {
            input: &input.file_path,
        });
        let invocation = Invocation::new(&input.compiler, &arguments, &input.working_directory);

        match self.frontend.preprocess(&invocation, &[]) {
            Ok(output) => UpdateResult {
                revision: input.revision,
                include_ids: self.cache.ids(&output.headers),
                diagnostics: output
                    .unresolved
                    .iter()
                    .map(|unresolved| {
                        Diagnostic::warning(
                            DiagnosticCode::UNRESOLVED_INCLUDE,
                            format!("'{}' file not found", unresolved.spelling),
                        )
                        .with_file(&unresolved.includer)
                    })
                    .collect(),
            },
            Err(error) => {
                let code = match error {
                    FrontendError::UnreadableInput { .. } => DiagnosticCode::UNREADABLE_UNIT,
                    _ => DiagnosticCode::FRONTEND_FAILURE,
                };
                UpdateResult {
                    revision: input.revision,
                    include_ids: Vec::new(),
                    diagnostics: vec![Diagnostic::error(code, error.to_string()).with_file(&input.file_path)],
                }
            }
        }
    }
}

impl std::fmt::Debug for TranslationUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationUnit")
            .field("kind", &self.kind)
            .field("frontend", &self.frontend.name())
            .finish()
    }
}
