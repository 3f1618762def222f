//! Error types for document and job management.

use std::path::PathBuf;

/// Errors raised by document bookkeeping and job scheduling.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// A job request cannot be run: wrong kind for the job, or its document
    /// is not open.
    #[error("malformed job request: {reason}")]
    MalformedJobRequest {
        /// What is wrong with the request.
        reason: String,
    },

    /// The document is not open.
    #[error("document {0} is not open")]
    DocumentNotOpen(PathBuf),

    /// The document is already open.
    #[error("document {0} is already open")]
    DocumentAlreadyOpen(PathBuf),

    /// The worker pool could not be created.
    #[error("cannot start job workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl JobError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        JobError::MalformedJobRequest {
            reason: reason.into(),
        }
    }
}
