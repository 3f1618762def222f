//! Where the compiler lives and where generated files go.

use std::path::{Path, PathBuf};

/// Process-level settings a [`PchCreator`](crate::PchCreator) reads.
pub trait Environment: Send + Sync {
    /// The compiler executable prepended to command lines.
    fn compiler_path(&self) -> &str;

    /// Directory receiving generated headers and PCHs.
    fn output_directory(&self) -> &Path;

    /// Directory compiler invocations run in.
    fn working_directory(&self) -> &Path;
}

/// An [`Environment`] with fixed values.
#[derive(Debug, Clone)]
pub struct StaticEnvironment {
    compiler_path: String,
    output_directory: PathBuf,
    working_directory: PathBuf,
}

impl StaticEnvironment {
    /// Creates an environment from its parts.
    pub fn new(
        compiler_path: impl Into<String>,
        output_directory: impl Into<PathBuf>,
        working_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            compiler_path: compiler_path.into(),
            output_directory: output_directory.into(),
            working_directory: working_directory.into(),
        }
    }
}

impl Environment for StaticEnvironment {
    fn compiler_path(&self) -> &str {
        &self.compiler_path
    }

    fn output_directory(&self) -> &Path {
        &self.output_directory
    }

    fn working_directory(&self) -> &Path {
        &self.working_directory
    }
}
