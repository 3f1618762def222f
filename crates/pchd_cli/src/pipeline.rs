//! Shared setup for every command: locating and resolving the configuration
//! and building the object graph.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pchd_common::PathStringCache;
use pchd_config::{find_config_dir, load_config, load_config_from_str, resolve_config, ResolvedConfig};
use pchd_creator::StaticEnvironment;
use pchd_diagnostics::{Diagnostic, DiagnosticRenderer, TerminalRenderer};
use pchd_frontend::{Frontend, FrontendRegistry};

use crate::GlobalArgs;

/// Everything a command needs, assembled once.
pub struct Session {
    /// The resolved configuration.
    pub config: ResolvedConfig,
    /// The frontend named by the configuration.
    pub frontend: Arc<dyn Frontend>,
    /// Interned paths shared by everything the session runs.
    pub cache: Arc<PathStringCache>,
}

impl Session {
    /// The creator environment described by the configuration.
    pub fn environment(&self) -> StaticEnvironment {
        StaticEnvironment::new(
            self.config.compiler_path.clone(),
            self.config.output_directory.clone(),
            self.config.working_directory.clone(),
        )
    }
}

/// Loads the configuration and builds the session.
pub fn open_session(global: &GlobalArgs) -> Result<Session, Box<dyn Error>> {
    let (config_dir, content) = locate_config(global)?;
    let config = match content {
        Some(content) => load_config_from_str(&content)?,
        None => load_config(&config_dir)?,
    };
    let config = resolve_config(&config, &config_dir);
    tracing::debug!(
        dir = %config_dir.display(),
        parts = config.project_parts.len(),
        frontend = %config.frontend,
        "loaded configuration"
    );

    let frontend = FrontendRegistry::with_defaults().create(&config.frontend)?;
    Ok(Session {
        config,
        frontend,
        cache: Arc::new(PathStringCache::new()),
    })
}

/// Finds the config directory. A `--config` file is read directly, so it
/// need not be named `pchd.toml`.
fn locate_config(global: &GlobalArgs) -> Result<(PathBuf, Option<String>), Box<dyn Error>> {
    match &global.config {
        Some(path) if path.is_file() => {
            let dir = absolute_parent(path)?;
            Ok((dir, Some(std::fs::read_to_string(path)?)))
        }
        Some(dir) => Ok((std::fs::canonicalize(dir)?, None)),
        None => Ok((find_config_dir(&std::env::current_dir()?)?, None)),
    }
}

fn absolute_parent(path: &Path) -> Result<PathBuf, Box<dyn Error>> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok(std::fs::canonicalize(parent)?)
}

/// Prints diagnostics to stderr.
pub fn render_diagnostics(diagnostics: &[Diagnostic], global: &GlobalArgs) {
    let renderer = TerminalRenderer::new(global.color);
    for diag in diagnostics {
        eprint!("{}", renderer.render(diag));
    }
}

/// Resolves interned ids back to display strings.
pub fn display_paths(cache: &PathStringCache, ids: &[pchd_common::PathId]) -> Result<Vec<String>, Box<dyn Error>> {
    Ok(cache
        .paths(ids)?
        .into_iter()
        .map(|path| path.display().to_string())
        .collect())
}
