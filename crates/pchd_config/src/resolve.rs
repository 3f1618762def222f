//! Resolution of relative configuration paths against the config directory.

use std::path::{Path, PathBuf};

use pchd_common::{normalize_with_base, ProjectPart};

use crate::types::ProjectConfig;

/// A configuration with every path made absolute.
///
/// Relative header and source paths are resolved against the directory that
/// holds `pchd.toml`, not the process working directory, so the same config
/// behaves the same from anywhere in the tree.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Compiler executable, kept verbatim (it may be a bare name looked up on `PATH`).
    pub compiler_path: String,
    /// Registry name of the frontend to use.
    pub frontend: String,
    /// Absolute working directory for compiler invocations.
    pub working_directory: PathBuf,
    /// Absolute output directory for generated files.
    pub output_directory: PathBuf,
    /// Worker threads for background jobs (`0` = one per CPU).
    pub threads: usize,
    /// Project parts with absolute header and source paths.
    pub project_parts: Vec<ProjectPart>,
}

/// Resolves `config` against `config_dir`.
pub fn resolve_config(config: &ProjectConfig, config_dir: &Path) -> ResolvedConfig {
    let project_parts = config
        .project_parts
        .iter()
        .map(|part| ProjectPart {
            id: part.id.clone(),
            arguments: part.arguments.clone(),
            headers: resolve_all(config_dir, &part.headers),
            sources: resolve_all(config_dir, &part.sources),
        })
        .collect();

    ResolvedConfig {
        compiler_path: config.compiler.path.clone(),
        frontend: config.compiler.frontend.clone(),
        working_directory: normalize_with_base(
            config_dir,
            Path::new(&config.compiler.working_directory),
        ),
        output_directory: normalize_with_base(config_dir, Path::new(&config.output.directory)),
        threads: config.jobs.threads,
        project_parts,
    }
}

fn resolve_all(base: &Path, paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .iter()
        .map(|path| normalize_with_base(base, path))
        .collect()
}
