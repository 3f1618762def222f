//! The PCH generation pipeline.
//!
//! Generation runs in a fixed order: the global include set is collected and
//! compiled into the global PCH, then each project part's remaining includes
//! are compiled into a PCH that consumes the global one as a prefix. A part
//! PCH can never be built without the global PCH on disk.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use pchd_common::{ContentHash, PathId, PathStringCache, ProjectPart};
use pchd_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use pchd_frontend::{command_line, Frontend, Invocation, PchArgumentBuilder, PchMode};

use crate::artifact::{IdPaths, PchArtifact, PchScope};
use crate::environment::Environment;
use crate::error::PchError;
use crate::include_collector::{IncludeCollector, IncludeSet};

const GLOBAL_PCH_STEM: &str = "global-pch";

/// Where a [`PchCreator`] is in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatorState {
    /// Nothing generated yet.
    Idle,
    /// The global header and source union is known.
    GlobalHeadersComputed,
    /// The global include set is collected.
    GlobalIncludesCollected,
    /// The global PCH is on disk.
    GlobalPchEmitted,
    /// A part's own include set is collected.
    PartIncludesCollected(String),
    /// A part's PCH is on disk.
    PartPchEmitted(String),
    /// Every PCH of the pass is on disk.
    Done,
    /// The pass failed; nothing from it is kept.
    Aborted,
}

/// Generates the global PCH and one PCH per project part.
///
/// The creator owns the artifacts it produces until they are taken with
/// [`take_project_part_pchs`](Self::take_project_part_pchs),
/// [`take_projects_includes`](Self::take_projects_includes) and
/// [`take_global_pch`](Self::take_global_pch).
pub struct PchCreator<'a> {
    project_parts: Vec<ProjectPart>,
    environment: &'a dyn Environment,
    cache: &'a PathStringCache,
    frontend: &'a dyn Frontend,
    diagnostics: DiagnosticSink,
    state: CreatorState,
    global_includes: Option<IncludeSet>,
    global_pch: Option<PchArtifact>,
    global_pch_emitted: bool,
    project_part_pchs: Vec<PchArtifact>,
    projects_includes: Vec<IdPaths>,
}

impl<'a> PchCreator<'a> {
    /// Creates a creator for `project_parts`, in the order given.
    pub fn new(
        project_parts: Vec<ProjectPart>,
        environment: &'a dyn Environment,
        cache: &'a PathStringCache,
        frontend: &'a dyn Frontend,
    ) -> Self {
        Self {
            project_parts,
            environment,
            cache,
            frontend,
            diagnostics: DiagnosticSink::new(),
            state: CreatorState::Idle,
            global_includes: None,
            global_pch: None,
            global_pch_emitted: false,
            project_part_pchs: Vec::new(),
            projects_includes: Vec::new(),
        }
    }

    /// The project parts, in input order.
    pub fn project_parts(&self) -> &[ProjectPart] {
        &self.project_parts
    }

    /// Looks up a project part by id.
    pub fn project_part(&self, id: &str) -> Result<&ProjectPart, PchError> {
        self.project_parts
            .iter()
            .find(|part| part.id == id)
            .ok_or_else(|| PchError::UnknownProjectPart(id.to_string()))
    }

    /// The current pipeline state.
    pub fn state(&self) -> &CreatorState {
        &self.state
    }

    /// Diagnostics emitted by include collection and PCH emission.
    pub fn diagnostics(&self) -> &DiagnosticSink {
        &self.diagnostics
    }

    // ---- global inputs ----

    /// Every part's headers, first occurrence wins.
    pub fn generate_global_header_paths(&self) -> Vec<PathBuf> {
        unique_paths(self.project_parts.iter().flat_map(|part| &part.headers))
    }

    /// Every part's sources, first occurrence wins.
    pub fn generate_global_source_paths(&self) -> Vec<PathBuf> {
        unique_paths(self.project_parts.iter().flat_map(|part| &part.sources))
    }

    /// The global headers followed by the global sources.
    pub fn generate_global_header_and_source_paths(&self) -> Vec<PathBuf> {
        let headers = self.generate_global_header_paths();
        let sources = self.generate_global_source_paths();
        unique_paths(headers.iter().chain(&sources))
    }

    /// Every part's arguments concatenated in part order. Repeated flags are kept.
    pub fn generate_global_arguments(&self) -> Vec<String> {
        self.project_parts
            .iter()
            .flat_map(|part| part.arguments.iter().cloned())
            .collect()
    }

    /// The compiler executable followed by the global arguments.
    pub fn generate_global_command_line(&self) -> Vec<String> {
        command_line(self.environment.compiler_path(), self.generate_global_arguments())
    }

    // ---- global PCH ----

    /// Collects the external headers every project part shares.
    ///
    /// Each part's headers and sources are preprocessed with the global
    /// arguments, treating every project file of every part as internal. The
    /// result is the intersection of the per-part sets, in the order the
    /// first part's collection found them. Parts without any files do not
    /// take part in the intersection.
    pub fn generate_global_pch_include_ids(&mut self) -> IncludeSet {
        self.state = CreatorState::GlobalHeadersComputed;
        let arguments = self.generate_global_arguments();
        let project_files = self.generate_global_header_and_source_paths();

        let mut shared: Option<IncludeSet> = None;
        for part in &self.project_parts {
            let units = part.header_and_source_paths();
            if units.is_empty() {
                continue;
            }
            let mut collector = self.collector(&arguments);
            collector.add_files(&units);
            collector.set_project_files(&project_files);
            collector.collect_includes(&self.diagnostics);
            let found = collector.take_include_ids();
            shared = Some(match shared {
                Some(previous) => previous.intersect(&found),
                None => found,
            });
        }

        let includes = shared.unwrap_or_default();
        tracing::debug!(includes = includes.len(), "collected global includes");
        self.global_includes = Some(includes.clone());
        self.state = CreatorState::GlobalIncludesCollected;
        includes
    }

    /// Renders the global PCH header, collecting the global includes first
    /// if needed.
    pub fn generate_global_pch_header_file_content(&mut self) -> Result<String, PchError> {
        let includes = self.global_includes();
        self.generate_pch_include_file_content(includes.as_slice())
    }

    /// The generated global header.
    pub fn generate_global_pch_header_file_path(&self) -> PathBuf {
        self.environment
            .output_directory()
            .join(format!("{GLOBAL_PCH_STEM}.h"))
    }

    /// The global PCH.
    pub fn generate_global_pch_file_path(&self) -> PathBuf {
        self.environment
            .output_directory()
            .join(format!("{GLOBAL_PCH_STEM}.pch"))
    }

    /// Writes the global header and returns its path.
    pub fn generate_global_pch_header_file(&mut self) -> Result<PathBuf, PchError> {
        let content = self.generate_global_pch_header_file_content()?;
        let path = self.generate_global_pch_header_file_path();
        self.generate_pch_header_file(&path, &content)?;
        Ok(path)
    }

    /// Arguments emitting the global PCH, without the executable.
    pub fn generate_global_clang_compiler_arguments(&self) -> Vec<String> {
        let arguments = self.generate_global_arguments();
        let header = self.generate_global_pch_header_file_path();
        let target = self.generate_global_pch_file_path();
        PchArgumentBuilder::new(&arguments).build(PchMode::EmitPch {
            header: &header,
            target: &target,
            prefix: None,
        })
    }

    /// Command line emitting the global PCH, executable first.
    pub fn generate_global_pch_compiler_arguments(&self) -> Vec<String> {
        command_line(
            self.environment.compiler_path(),
            self.generate_global_clang_compiler_arguments(),
        )
    }

    /// Collects the global includes, writes the global header and compiles
    /// it into the global PCH.
    ///
    /// On failure the creator is left in [`CreatorState::Aborted`] and no
    /// part PCH can be generated.
    pub fn generate_global_pch(&mut self) -> Result<PchArtifact, PchError> {
        self.global_pch = None;
        self.global_pch_emitted = false;
        let includes = self.generate_global_pch_include_ids();
        let header_path = self.generate_global_pch_header_file()?;
        let arguments = self.generate_global_clang_compiler_arguments();

        if let Err(error) = self.emit(&arguments) {
            self.state = CreatorState::Aborted;
            self.diagnostics.emit(
                Diagnostic::error(DiagnosticCode::PCH_EMISSION_FAILED, format!("global PCH: {error}"))
                    .with_file(&header_path),
            );
            return Err(error);
        }

        let artifact = PchArtifact {
            scope: PchScope::Global,
            path: self.generate_global_pch_file_path(),
            header_path,
            arguments: self.generate_global_pch_compiler_arguments(),
            include_ids: includes.into_vec(),
        };
        tracing::info!(
            pch = %artifact.path.display(),
            includes = artifact.include_ids.len(),
            "emitted global PCH"
        );
        self.global_pch = Some(artifact.clone());
        self.global_pch_emitted = true;
        self.state = CreatorState::GlobalPchEmitted;
        Ok(artifact)
    }

    // ---- project part PCHs ----

    /// The compiler executable followed by the part's own arguments.
    pub fn generate_project_part_command_line(&self, part: &ProjectPart) -> Vec<String> {
        command_line(self.environment.compiler_path(), part.arguments.clone())
    }

    /// The part's headers followed by its sources.
    pub fn generate_project_part_header_and_source_paths(&self, part: &ProjectPart) -> Vec<PathBuf> {
        part.header_and_source_paths()
    }

    /// Collects the external headers the part adds on top of the global PCH.
    ///
    /// The part's own files are internal, and the global includes are
    /// excluded along with everything reached only through them.
    pub fn generate_project_part_pch_includes(&mut self, part: &ProjectPart) -> Result<IncludeSet, PchError> {
        let global = self.global_includes();
        let excluded = self.cache.paths(global.as_slice())?;
        let units = self.generate_project_part_header_and_source_paths(part);

        let mut collector = self.collector(&part.arguments);
        collector.add_files(&units);
        collector.set_project_files(&units);
        collector.set_excluded_includes(&excluded);
        collector.collect_includes(&self.diagnostics);
        let includes = collector.take_include_ids();

        tracing::debug!(part = %part.id, includes = includes.len(), "collected part includes");
        self.state = CreatorState::PartIncludesCollected(part.id.clone());
        Ok(includes)
    }

    /// Renders one `#include <path>` line per id, in the given order.
    pub fn generate_pch_include_file_content(&self, includes: &[PathId]) -> Result<String, PchError> {
        let mut content = String::new();
        for &id in includes {
            let path = self.cache.path(id)?;
            content.push_str(&format!("#include <{}>\n", path.display()));
        }
        Ok(content)
    }

    /// Writes `content` to `path`, creating parent directories.
    pub fn generate_pch_header_file(&self, path: &Path, content: &str) -> Result<(), PchError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| PchError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, content).map_err(|source| PchError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The generated header of `part`.
    pub fn generate_project_part_pch_header_file_path(&self, part: &ProjectPart) -> PathBuf {
        self.environment
            .output_directory()
            .join(format!("{}.h", project_part_file_stem(&part.id)))
    }

    /// The PCH of `part`.
    pub fn generate_project_part_pch_file_path(&self, part: &ProjectPart) -> PathBuf {
        self.environment
            .output_directory()
            .join(format!("{}.pch", project_part_file_stem(&part.id)))
    }

    /// Arguments emitting the part PCH on top of the global PCH, without the
    /// executable.
    pub fn generate_project_part_clang_compiler_arguments(&self, part: &ProjectPart) -> Vec<String> {
        let header = self.generate_project_part_pch_header_file_path(part);
        let target = self.generate_project_part_pch_file_path(part);
        let prefix = self.generate_global_pch_file_path();
        PchArgumentBuilder::new(&part.arguments).build(PchMode::EmitPch {
            header: &header,
            target: &target,
            prefix: Some(&prefix),
        })
    }

    /// Command line emitting the part PCH, executable first.
    pub fn generate_project_part_pch_compiler_arguments(&self, part: &ProjectPart) -> Vec<String> {
        command_line(
            self.environment.compiler_path(),
            self.generate_project_part_clang_compiler_arguments(part),
        )
    }

    /// Collects, renders, writes and compiles the PCH of one part.
    ///
    /// Fails with [`PchError::PipelineAborted`] unless the global PCH was
    /// generated successfully first.
    pub fn generate_project_part_pch(&mut self, part: &ProjectPart) -> Result<(PchArtifact, IdPaths), PchError> {
        if !self.global_pch_emitted {
            return Err(PchError::aborted(format!(
                "project part '{}' needs the global PCH, which has not been generated",
                part.id
            )));
        }

        let includes = self.generate_project_part_pch_includes(part)?;
        let content = self.generate_pch_include_file_content(includes.as_slice())?;
        let header_path = self.generate_project_part_pch_header_file_path(part);
        self.generate_pch_header_file(&header_path, &content)?;

        let arguments = self.generate_project_part_clang_compiler_arguments(part);
        if let Err(error) = self.emit(&arguments) {
            self.diagnostics.emit(
                Diagnostic::error(
                    DiagnosticCode::PCH_EMISSION_FAILED,
                    format!("project part '{}': {error}", part.id),
                )
                .with_file(&header_path),
            );
            return Err(error);
        }

        let include_ids = includes.into_vec();
        let artifact = PchArtifact {
            scope: PchScope::ProjectPart(part.id.clone()),
            path: self.generate_project_part_pch_file_path(part),
            header_path,
            arguments: self.generate_project_part_pch_compiler_arguments(part),
            include_ids: include_ids.clone(),
        };
        tracing::info!(part = %part.id, pch = %artifact.path.display(), "emitted project part PCH");
        self.state = CreatorState::PartPchEmitted(part.id.clone());

        let id_paths = IdPaths {
            id: part.id.clone(),
            paths: include_ids,
        };
        Ok((artifact, id_paths))
    }

    /// Generates the global PCH, then every part PCH in input order.
    ///
    /// Any failure aborts the pass and discards what it produced; the error
    /// is always [`PchError::PipelineAborted`].
    pub fn generate_pchs(&mut self) -> Result<(), PchError> {
        self.project_part_pchs.clear();
        self.projects_includes.clear();

        if let Err(error) = self.generate_global_pch() {
            return Err(self.abort(format!("global PCH failed: {error}")));
        }

        let parts = self.project_parts.clone();
        let mut pchs = Vec::with_capacity(parts.len());
        let mut includes = Vec::with_capacity(parts.len());
        for part in &parts {
            match self.generate_project_part_pch(part) {
                Ok((pch, id_paths)) => {
                    pchs.push(pch);
                    includes.push(id_paths);
                }
                Err(error) => {
                    return Err(self.abort(format!("project part '{}' failed: {error}", part.id)));
                }
            }
        }

        self.project_part_pchs = pchs;
        self.projects_includes = includes;
        self.state = CreatorState::Done;
        Ok(())
    }

    /// Takes the part PCHs of the last successful pass, in input order.
    pub fn take_project_part_pchs(&mut self) -> Vec<PchArtifact> {
        std::mem::take(&mut self.project_part_pchs)
    }

    /// Takes the part include sets of the last successful pass, in input order.
    pub fn take_projects_includes(&mut self) -> Vec<IdPaths> {
        std::mem::take(&mut self.projects_includes)
    }

    /// Takes the global PCH, if one was generated. The PCH stays on disk, so
    /// part PCHs can still be generated against it afterwards.
    pub fn take_global_pch(&mut self) -> Option<PchArtifact> {
        self.global_pch.take()
    }

    fn global_includes(&mut self) -> IncludeSet {
        match &self.global_includes {
            Some(includes) => includes.clone(),
            None => self.generate_global_pch_include_ids(),
        }
    }

    fn collector(&self, arguments: &[String]) -> IncludeCollector<'a> {
        IncludeCollector::new(
            self.frontend,
            self.cache,
            self.environment.compiler_path(),
            arguments,
            self.environment.working_directory(),
        )
    }

    fn emit(&self, arguments: &[String]) -> Result<(), PchError> {
        let invocation = Invocation::new(
            self.environment.compiler_path(),
            arguments,
            self.environment.working_directory(),
        );
        self.frontend.compile(&invocation)?;
        Ok(())
    }

    fn abort(&mut self, reason: String) -> PchError {
        tracing::warn!(%reason, "PCH generation aborted");
        self.state = CreatorState::Aborted;
        self.global_pch = None;
        self.global_pch_emitted = false;
        self.project_part_pchs.clear();
        self.projects_includes.clear();
        PchError::aborted(reason)
    }
}

/// `<id with unsafe characters replaced>-<16 hex digits of the id's hash>`.
///
/// The hash keeps ids that sanitise to the same text apart.
fn project_part_file_stem(id: &str) -> String {
    let sanitised: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{sanitised}-{}", ContentHash::from_bytes(id.as_bytes()).short_hex())
}

fn unique_paths<'p>(paths: impl IntoIterator<Item = &'p PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter(|path| seen.insert(*path))
        .cloned()
        .collect()
}
