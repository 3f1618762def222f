//! Error types for PCH generation.

use std::path::PathBuf;

use pchd_common::UnresolvedPath;
use pchd_frontend::FrontendError;

/// Errors raised while generating precompiled headers.
#[derive(Debug, thiserror::Error)]
pub enum PchError {
    /// A compiler invocation failed.
    #[error(transparent)]
    Frontend(#[from] FrontendError),

    /// A generated header file or the output directory could not be written.
    #[error("cannot write {path}: {source}")]
    Io {
        /// The path being written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A step was attempted without the global PCH it depends on, or the
    /// global PCH failed and the remaining steps were skipped.
    #[error("PCH generation aborted: {reason}")]
    PipelineAborted {
        /// Why the pipeline stopped.
        reason: String,
    },

    /// A path id could not be resolved back to a path.
    #[error(transparent)]
    UnresolvedPath(#[from] UnresolvedPath),

    /// The named project part is not part of this creator.
    #[error("unknown project part '{0}'")]
    UnknownProjectPart(String),
}

impl PchError {
    pub(crate) fn aborted(reason: impl Into<String>) -> Self {
        PchError::PipelineAborted {
            reason: reason.into(),
        }
    }
}
