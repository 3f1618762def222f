//! Configuration types deserialized from `pchd.toml`.

use pchd_common::ProjectPart;
use serde::Deserialize;

/// The top-level configuration parsed from `pchd.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Compiler executable and frontend selection.
    pub compiler: CompilerConfig,
    /// Where generated headers and PCH files are written.
    #[serde(default)]
    pub output: OutputConfig,
    /// Background job settings.
    #[serde(default)]
    pub jobs: JobsConfig,
    /// Project parts in the order their PCHs are generated.
    #[serde(default)]
    pub project_parts: Vec<ProjectPart>,
}

/// Compiler invocation settings.
#[derive(Debug, Deserialize)]
pub struct CompilerConfig {
    /// Path or name of the compiler executable.
    pub path: String,
    /// Name of the frontend to drive it with, looked up in the frontend registry.
    #[serde(default = "default_frontend")]
    pub frontend: String,
    /// Directory compiler invocations run in, relative to the config file.
    #[serde(default = "default_working_directory")]
    pub working_directory: String,
}

/// Output location for generated artifacts.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Output directory, relative to the config file.
    #[serde(default = "default_output_directory")]
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
        }
    }
}

/// Background job settings.
#[derive(Debug, Default, Deserialize)]
pub struct JobsConfig {
    /// Worker thread count; `0` uses one thread per CPU.
    #[serde(default)]
    pub threads: usize,
}

fn default_frontend() -> String {
    "scan".to_string()
}

fn default_working_directory() -> String {
    ".".to_string()
}

fn default_output_directory() -> String {
    ".pchd".to_string()
}
