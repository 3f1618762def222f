//! Reparse jobs for open documents.
//!
//! A job runs in three steps. [`AsyncJob::prepare_async_run`] pins the
//! document's translation unit and update parameters into a [`PreparedRun`];
//! [`PreparedRun::run`] does the expensive work on a worker thread; and
//! [`AsyncJob::finalize_async_run`] applies the result unless a newer request
//! for the same translation unit was issued meanwhile. [`JobQueue`] drives
//! jobs through these steps.

#![warn(missing_docs)]

pub mod document;
pub mod error;
pub mod job;
pub mod queue;
pub mod request;
pub mod translation_unit;

pub use document::{Document, Documents};
pub use error::JobError;
pub use job::{AsyncJob, AsyncResult, JobContext, JobOutcome, JobState, PreparedRun, ReparseJob, ReparseSupportiveJob};
pub use queue::{JobFactory, JobQueue, ProcessReport};
pub use request::{IssuedRequests, JobRequest, JobRequestKind, PreferredTranslationUnit};
pub use translation_unit::{TranslationUnit, UpdateInput, UpdateResult};
