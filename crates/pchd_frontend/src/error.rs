//! Error types for compiler invocations.

use std::path::PathBuf;

/// Errors raised at the compiler invocation boundary.
#[derive(Debug, thiserror::Error)]
pub enum FrontendError {
    /// The compiler process could not be started.
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// The executable that failed to start.
        program: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The compiler ran but failed: nonzero exit, or terminated by a signal.
    #[error("{program} {reason}")]
    Failed {
        /// The executable (or in-process frontend) that failed.
        program: String,
        /// The exit code, or `None` if the compiler crashed.
        status: Option<i32>,
        /// Human-readable summary of the status.
        reason: String,
        /// Captured error output.
        stderr: String,
    },

    /// A translation unit named in the arguments could not be read.
    #[error("cannot read translation unit {path}: {source}")]
    UnreadableInput {
        /// The unreadable file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The arguments name no input file.
    #[error("no input file in compiler arguments")]
    MissingInput,

    /// A PCH emission was requested without an `-o` output path.
    #[error("PCH emission requested without an output path")]
    MissingOutput,

    /// A PCH snapshot file is missing, corrupt, or of another format version.
    #[error("invalid PCH snapshot {path}: {reason}")]
    InvalidSnapshot {
        /// The snapshot file.
        path: PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// Writing an output file failed.
    #[error("cannot write {path}: {source}")]
    Io {
        /// The file being written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// No frontend is registered under the requested name.
    #[error("unknown frontend '{0}'")]
    UnknownFrontend(String),
}

impl FrontendError {
    /// Builds a [`Failed`](Self::Failed) error from an exit status code.
    pub fn failed(program: impl Into<String>, status: Option<i32>, stderr: impl Into<String>) -> Self {
        let reason = match status {
            Some(code) => format!("exited with code {code}"),
            None => "crashed (terminated by signal)".to_string(),
        };
        FrontendError::Failed {
            program: program.into(),
            status,
            reason,
            stderr: stderr.into(),
        }
    }

    /// Returns `true` if the compiler was terminated rather than exiting.
    pub fn is_crash(&self) -> bool {
        matches!(self, FrontendError::Failed { status: None, .. })
    }
}
