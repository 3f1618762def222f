//! The three-step job lifecycle and the reparse jobs built on it.

use std::path::PathBuf;

use crate::document::{Document, Documents};
use crate::error::JobError;
use crate::request::{IssuedRequests, JobRequest, JobRequestKind, PreferredTranslationUnit};
use crate::translation_unit::{TranslationUnit, UpdateInput, UpdateResult};

/// Lifecycle position of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Created, not yet prepared.
    Pending,
    /// Snapshot pinned; the run has not started.
    Prepared,
    /// The run was handed to a worker.
    Running,
    /// The result was applied or discarded.
    Finalized,
}

/// Whether a finalized job's result reached its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// The document now holds the result.
    Applied,
    /// A newer request superseded the job, or the document closed; the
    /// result was dropped.
    Outdated,
}

/// What a job sees of the world when preparing and finalizing.
#[derive(Debug, Clone, Copy)]
pub struct JobContext<'a> {
    /// The request the job was created for.
    pub request: &'a JobRequest,
    issued: &'a IssuedRequests,
}

impl<'a> JobContext<'a> {
    /// Creates a context for `request`, judged against `issued`.
    pub fn new(request: &'a JobRequest, issued: &'a IssuedRequests) -> Self {
        Self { request, issued }
    }

    /// Returns `true` if the request's document is closed, or a request with
    /// a larger issue number targets the same translation unit.
    pub fn is_outdated(&self, documents: &Documents) -> bool {
        !documents.contains(&self.request.file_path) || self.issued.is_superseded(self.request)
    }

    /// The document the request targets.
    pub fn document_for_request<'d>(&self, documents: &'d Documents) -> Result<&'d Document, JobError> {
        documents
            .get(&self.request.file_path)
            .map_err(|_| JobError::malformed(format!("{} is not open", self.request.file_path.display())))
    }
}

/// A pinned computation ready to run on a worker thread.
///
/// Holds its own copies of the translation unit and update input, so it
/// needs no access to the documents while running.
#[derive(Debug)]
pub struct PreparedRun {
    file_path: PathBuf,
    translation_unit: TranslationUnit,
    input: UpdateInput,
}

impl PreparedRun {
    /// The pinned document's path.
    pub fn file_path(&self) -> &std::path::Path {
        &self.file_path
    }

    /// Which translation unit was pinned.
    pub fn translation_unit(&self) -> PreferredTranslationUnit {
        self.translation_unit.kind()
    }

    /// The document revision the run was pinned at.
    pub fn revision(&self) -> u64 {
        self.input.revision
    }

    /// Runs the computation.
    pub fn run(self) -> AsyncResult {
        AsyncResult {
            update_result: self.translation_unit.reparse(&self.input),
        }
    }
}

/// What a [`PreparedRun`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncResult {
    /// The reparse result.
    pub update_result: UpdateResult,
}

/// A job with a prepare / run / finalize lifecycle.
pub trait AsyncJob: Send {
    /// The request the job serves.
    fn request(&self) -> &JobRequest;

    /// Current lifecycle position.
    fn state(&self) -> JobState;

    /// Validates the request and pins what the run needs.
    ///
    /// Returns `None` when there is nothing to run: a request of the wrong
    /// kind, or a document that cannot be found. Errors never escape.
    fn prepare_async_run(&mut self, context: &JobContext<'_>, documents: &Documents) -> Option<PreparedRun>;

    /// Marks the prepared run as handed to a worker.
    fn mark_running(&mut self);

    /// Applies `result` unless the job is outdated by now.
    fn finalize_async_run(
        &mut self,
        context: &JobContext<'_>,
        documents: &mut Documents,
        result: AsyncResult,
    ) -> JobOutcome;
}

/// Shared state of the reparse jobs.
#[derive(Debug)]
struct ReparseState {
    request: JobRequest,
    state: JobState,
    expected: JobRequestKind,
}

impl ReparseState {
    fn new(request: JobRequest, expected: JobRequestKind) -> Self {
        Self {
            request,
            state: JobState::Pending,
            expected,
        }
    }

    fn prepare(
        &mut self,
        context: &JobContext<'_>,
        documents: &Documents,
        unit: PreferredTranslationUnit,
    ) -> Result<PreparedRun, JobError> {
        if context.request.kind != self.expected {
            return Err(JobError::malformed(format!(
                "expected a {:?} request, got {:?}",
                self.expected, context.request.kind
            )));
        }
        let document = context.document_for_request(documents)?;
        let run = PreparedRun {
            file_path: document.file_path().to_path_buf(),
            translation_unit: document.translation_unit(unit).clone(),
            input: document.create_update_input(),
        };
        self.state = JobState::Prepared;
        Ok(run)
    }

    fn finalize(
        &mut self,
        context: &JobContext<'_>,
        documents: &mut Documents,
        result: AsyncResult,
        unit: PreferredTranslationUnit,
    ) -> JobOutcome {
        self.state = JobState::Finalized;
        if context.is_outdated(documents) {
            tracing::debug!(
                file = %self.request.file_path.display(),
                issued_at = self.request.issued_at,
                "discarding outdated result"
            );
            return JobOutcome::Outdated;
        }
        match documents.get_mut(&self.request.file_path) {
            Ok(document) => {
                document.incorporate_update_result(unit, result.update_result);
                JobOutcome::Applied
            }
            Err(_) => JobOutcome::Outdated,
        }
    }
}

/// Reparses the translation unit the request prefers and applies the
/// result to it.
#[derive(Debug)]
pub struct ReparseJob {
    inner: ReparseState,
}

impl ReparseJob {
    /// Creates a job for a [`JobRequestKind::Reparse`] request.
    pub fn new(request: JobRequest) -> Self {
        Self {
            inner: ReparseState::new(request, JobRequestKind::Reparse),
        }
    }
}

impl AsyncJob for ReparseJob {
    fn request(&self) -> &JobRequest {
        &self.inner.request
    }

    fn state(&self) -> JobState {
        self.inner.state
    }

    fn prepare_async_run(&mut self, context: &JobContext<'_>, documents: &Documents) -> Option<PreparedRun> {
        let unit = context.request.preferred_translation_unit;
        match self.inner.prepare(context, documents, unit) {
            Ok(run) => Some(run),
            Err(error) => {
                tracing::warn!(%error, "cannot prepare reparse job");
                None
            }
        }
    }

    fn mark_running(&mut self) {
        self.inner.state = JobState::Running;
    }

    fn finalize_async_run(
        &mut self,
        context: &JobContext<'_>,
        documents: &mut Documents,
        result: AsyncResult,
    ) -> JobOutcome {
        let unit = self.inner.request.preferred_translation_unit;
        self.inner.finalize(context, documents, result, unit)
    }
}

/// Reparses the supportive translation unit, whatever the request prefers.
#[derive(Debug)]
pub struct ReparseSupportiveJob {
    inner: ReparseState,
}

impl ReparseSupportiveJob {
    /// Creates a job for a [`JobRequestKind::ReparseSupportive`] request.
    pub fn new(request: JobRequest) -> Self {
        Self {
            inner: ReparseState::new(request, JobRequestKind::ReparseSupportive),
        }
    }
}

impl AsyncJob for ReparseSupportiveJob {
    fn request(&self) -> &JobRequest {
        &self.inner.request
    }

    fn state(&self) -> JobState {
        self.inner.state
    }

    fn prepare_async_run(&mut self, context: &JobContext<'_>, documents: &Documents) -> Option<PreparedRun> {
        match self
            .inner
            .prepare(context, documents, PreferredTranslationUnit::Supportive)
        {
            Ok(run) => Some(run),
            Err(error) => {
                tracing::warn!(%error, "cannot prepare supportive reparse job");
                None
            }
        }
    }

    fn mark_running(&mut self) {
        self.inner.state = JobState::Running;
    }

    fn finalize_async_run(
        &mut self,
        context: &JobContext<'_>,
        documents: &mut Documents,
        result: AsyncResult,
    ) -> JobOutcome {
        self.inner
            .finalize(context, documents, result, PreferredTranslationUnit::Supportive)
    }
}

/// Creates the job that serves `request`.
pub(crate) fn job_for_request(request: JobRequest) -> Box<dyn AsyncJob> {
    match request.kind {
        JobRequestKind::Reparse => Box::new(ReparseJob::new(request)),
        JobRequestKind::ReparseSupportive => Box::new(ReparseSupportiveJob::new(request)),
    }
}
