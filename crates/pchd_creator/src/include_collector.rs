//! Include collection: which external headers a batch of translation units
//! pulls in.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use pchd_common::{normalize_path, normalize_with_base, PathId, PathStringCache};
use pchd_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use pchd_frontend::{FileIdentity, Frontend, FrontendError, Invocation, PchArgumentBuilder, PchMode};
use rayon::prelude::*;

/// A duplicate-free set of header ids that remembers insertion order.
///
/// Callers that only care about membership should compare with
/// [`to_set`](Self::to_set); the order is the order headers were first seen
/// and is what generated header files are rendered in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludeSet {
    order: Vec<PathId>,
    members: HashSet<PathId>,
}

impl IncludeSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `id`, returning `false` if it was already present.
    pub fn insert(&mut self, id: PathId) -> bool {
        let added = self.members.insert(id);
        if added {
            self.order.push(id);
        }
        added
    }

    /// Returns `true` if `id` is in the set.
    pub fn contains(&self, id: PathId) -> bool {
        self.members.contains(&id)
    }

    /// Iterates ids in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = PathId> + '_ {
        self.order.iter().copied()
    }

    /// Returns the ids in insertion order.
    pub fn as_slice(&self) -> &[PathId] {
        &self.order
    }

    /// Number of ids.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns the ids as an unordered set.
    pub fn to_set(&self) -> HashSet<PathId> {
        self.members.clone()
    }

    /// Keeps only the ids for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(PathId) -> bool) {
        let members = &mut self.members;
        self.order.retain(|&id| {
            let kept = keep(id);
            if !kept {
                members.remove(&id);
            }
            kept
        });
    }

    /// Returns the ids present in both sets, in `self`'s order.
    pub fn intersect(&self, other: &IncludeSet) -> IncludeSet {
        self.iter().filter(|&id| other.contains(id)).collect()
    }

    /// Consumes the set, returning the ids in insertion order.
    pub fn into_vec(self) -> Vec<PathId> {
        self.order
    }
}

impl FromIterator<PathId> for IncludeSet {
    fn from_iter<I: IntoIterator<Item = PathId>>(iter: I) -> Self {
        let mut set = IncludeSet::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

/// Runs the preprocessing pass over translation units and records the
/// external headers they enter.
///
/// Headers that are themselves project files are not retained: they are
/// reparsed with their translation units rather than precompiled. Excluded
/// headers, typically the ones already in a prefix PCH, are skipped along
/// with everything reached only through them.
pub struct IncludeCollector<'a> {
    frontend: &'a dyn Frontend,
    cache: &'a PathStringCache,
    compiler: String,
    arguments: Vec<String>,
    working_directory: PathBuf,
    files: Vec<PathBuf>,
    project_files: HashSet<PathBuf>,
    excluded: Vec<PathBuf>,
    include_ids: IncludeSet,
}

impl<'a> IncludeCollector<'a> {
    /// Creates a collector that invokes `frontend` with `arguments` in
    /// `working_directory`.
    pub fn new(
        frontend: &'a dyn Frontend,
        cache: &'a PathStringCache,
        compiler: &str,
        arguments: &[String],
        working_directory: &Path,
    ) -> Self {
        Self {
            frontend,
            cache,
            compiler: compiler.to_string(),
            arguments: arguments.to_vec(),
            working_directory: working_directory.to_path_buf(),
            files: Vec::new(),
            project_files: HashSet::new(),
            excluded: Vec::new(),
            include_ids: IncludeSet::new(),
        }
    }

    /// Adds translation units to preprocess. Relative paths resolve against
    /// the working directory.
    pub fn add_files<I, P>(&mut self, files: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for file in files {
            let file = self.absolute(file.as_ref());
            if !self.files.contains(&file) {
                self.files.push(file);
            }
        }
    }

    /// Sets the project's own files; headers among them are not retained.
    pub fn set_project_files<I, P>(&mut self, files: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.project_files = files
            .into_iter()
            .map(|file| self.absolute(file.as_ref()))
            .collect();
    }

    /// Sets headers to treat as already included.
    pub fn set_excluded_includes<I, P>(&mut self, files: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.excluded = files
            .into_iter()
            .map(|file| self.absolute(file.as_ref()))
            .collect();
    }

    /// Preprocesses every added unit and records the retained headers.
    ///
    /// Units run in parallel; results are merged in the order the units were
    /// added. A unit that fails is reported to `diagnostics` and skipped.
    pub fn collect_includes(&mut self, diagnostics: &DiagnosticSink) {
        for excluded in &self.excluded {
            if FileIdentity::resolve(excluded).is_err() {
                diagnostics.emit(
                    Diagnostic::warning(
                        DiagnosticCode::UNRESOLVED_EXCLUSION,
                        "excluded include does not exist; matching by path only",
                    )
                    .with_file(excluded),
                );
            }
        }

        let frontend = self.frontend;
        let compiler = self.compiler.as_str();
        let builder = PchArgumentBuilder::new(&self.arguments);
        let working_directory = self.working_directory.as_path();
        let excluded = self.excluded.as_slice();

        let results: Vec<_> = self
            .files
            .par_iter()
            .map(|unit| {
                let arguments = builder.build(PchMode::Preprocess { input: unit });
                let invocation = Invocation::new(compiler, &arguments, working_directory);
                frontend.preprocess(&invocation, excluded)
            })
            .collect();

        for (unit, result) in self.files.iter().zip(results) {
            match result {
                Ok(output) => {
                    for unresolved in &output.unresolved {
                        diagnostics.emit(
                            Diagnostic::warning(
                                DiagnosticCode::UNRESOLVED_INCLUDE,
                                format!("'{}' file not found", unresolved.spelling),
                            )
                            .with_file(&unresolved.includer),
                        );
                    }
                    for header in output.headers {
                        if !self.project_files.contains(&normalize_path(&header)) {
                            self.include_ids.insert(self.cache.id(&header));
                        }
                    }
                }
                Err(error) => {
                    tracing::warn!(unit = %unit.display(), error = %error, "skipping translation unit");
                    diagnostics.emit(unit_failure(unit, &error));
                }
            }
        }

        tracing::debug!(
            units = self.files.len(),
            includes = self.include_ids.len(),
            frontend = self.frontend.name(),
            "collected includes"
        );
    }

    /// Takes the collected ids, leaving the collector empty.
    pub fn take_include_ids(&mut self) -> IncludeSet {
        std::mem::take(&mut self.include_ids)
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        normalize_with_base(&self.working_directory, path)
    }
}

fn unit_failure(unit: &Path, error: &FrontendError) -> Diagnostic {
    let code = match error {
        FrontendError::UnreadableInput { .. } | FrontendError::MissingInput => {
            DiagnosticCode::UNREADABLE_UNIT
        }
        _ => DiagnosticCode::FRONTEND_FAILURE,
    };
    let diagnostic = Diagnostic::error(code, format!("translation unit skipped: {error}")).with_file(unit);
    match error {
        FrontendError::Failed { stderr, .. } if !stderr.trim().is_empty() => {
            diagnostic.with_note(stderr.trim().to_string())
        }
        _ => diagnostic,
    }
}
