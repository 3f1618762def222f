//! Runs jobs on a worker pool and finalizes their results on the owner's
//! thread.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;

use pchd_common::PathStringCache;
use pchd_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use pchd_frontend::Frontend;

use crate::document::{Document, Documents};
use crate::error::JobError;
use crate::job::{job_for_request, AsyncJob, AsyncResult, JobContext, JobOutcome};
use crate::request::{IssuedRequests, JobRequest};

/// Builds the job serving a request.
pub type JobFactory = Box<dyn Fn(JobRequest) -> Box<dyn AsyncJob> + Send>;

/// Counts of what one or more [`JobQueue::process`] calls did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessReport {
    /// Jobs handed to a worker.
    pub started: usize,
    /// Results applied to their document.
    pub applied: usize,
    /// Results discarded because a newer request was issued meanwhile.
    pub outdated: usize,
    /// Jobs dropped before they ran.
    pub cancelled: usize,
    /// Jobs that could not be prepared.
    pub failed: usize,
}

impl ProcessReport {
    fn merge(&mut self, other: ProcessReport) {
        self.started += other.started;
        self.applied += other.applied;
        self.outdated += other.outdated;
        self.cancelled += other.cancelled;
        self.failed += other.failed;
    }
}

/// Owns the open documents and drives jobs against them.
///
/// Documents are only touched on the thread calling into the queue. Workers
/// get a [`PreparedRun`](crate::PreparedRun) and send back its result over a
/// channel; [`process`](Self::process) finalizes whatever has arrived.
pub struct JobQueue {
    pool: rayon::ThreadPool,
    frontend: Arc<dyn Frontend>,
    cache: Arc<PathStringCache>,
    compiler: String,
    documents: Documents,
    issued: IssuedRequests,
    next_issue: u64,
    factory: JobFactory,
    pending: VecDeque<Box<dyn AsyncJob>>,
    running: HashMap<u64, Box<dyn AsyncJob>>,
    results_tx: mpsc::Sender<(u64, AsyncResult)>,
    results_rx: mpsc::Receiver<(u64, AsyncResult)>,
    diagnostics: DiagnosticSink,
}

impl JobQueue {
    /// Creates a queue whose workers run on `threads` threads (0 = one per
    /// core).
    pub fn new(
        frontend: Arc<dyn Frontend>,
        cache: Arc<PathStringCache>,
        compiler: impl Into<String>,
        threads: usize,
    ) -> Result<Self, JobError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("pchd-job-{i}"))
            .build()?;
        let (results_tx, results_rx) = mpsc::channel();
        Ok(Self {
            pool,
            frontend,
            cache,
            compiler: compiler.into(),
            documents: Documents::new(),
            issued: IssuedRequests::new(),
            next_issue: 1,
            factory: Box::new(job_for_request),
            pending: VecDeque::new(),
            running: HashMap::new(),
            results_tx,
            results_rx,
            diagnostics: DiagnosticSink::new(),
        })
    }

    /// Replaces the function that turns requests into jobs.
    pub fn set_job_factory<F>(&mut self, factory: F)
    where
        F: Fn(JobRequest) -> Box<dyn AsyncJob> + Send + 'static,
    {
        self.factory = Box::new(factory);
    }

    /// Opens `file_path` as a document of `project_part_id`.
    pub fn open_document(
        &mut self,
        file_path: impl Into<PathBuf>,
        project_part_id: impl Into<String>,
        arguments: Vec<String>,
        working_directory: impl Into<PathBuf>,
    ) -> Result<(), JobError> {
        let document = Document::new(
            file_path,
            project_part_id,
            self.compiler.clone(),
            arguments,
            working_directory,
            Arc::clone(&self.frontend),
            Arc::clone(&self.cache),
        );
        tracing::debug!(file = %document.file_path().display(), "opening document");
        self.documents.open(document)
    }

    /// Closes a document. Jobs still queued or running for it end up
    /// cancelled or outdated.
    pub fn close_document(&mut self, file_path: &Path) -> Result<(), JobError> {
        self.documents.close(file_path)?;
        self.issued.retire(file_path, self.next_issue);
        self.next_issue += 1;
        Ok(())
    }

    /// Records an edit, optionally with new arguments, and returns the new
    /// revision.
    pub fn update_document(&mut self, file_path: &Path, arguments: Option<Vec<String>>) -> Result<u64, JobError> {
        Ok(self.documents.get_mut(file_path)?.update(arguments))
    }

    /// Issues `request` and queues a job for it. Returns the request with its
    /// issue number set.
    pub fn add(&mut self, mut request: JobRequest) -> Result<JobRequest, JobError> {
        if !self.documents.contains(&request.file_path) {
            return Err(JobError::DocumentNotOpen(request.file_path));
        }
        request.issued_at = self.next_issue;
        self.next_issue += 1;
        self.issued.record(&request);
        tracing::trace!(
            file = %request.file_path.display(),
            kind = ?request.kind,
            issued_at = request.issued_at,
            "job issued"
        );
        self.pending.push_back((self.factory)(request.clone()));
        Ok(request)
    }

    /// Finalizes every result that has arrived, then starts every queued job
    /// that is still current. Never blocks.
    pub fn process(&mut self) -> ProcessReport {
        let mut report = ProcessReport::default();
        while let Ok((id, result)) = self.results_rx.try_recv() {
            self.finalize(id, result, &mut report);
        }
        self.start_pending(&mut report);
        report
    }

    /// Processes until no job is queued or running, blocking on results.
    pub fn wait_until_idle(&mut self) -> ProcessReport {
        let mut report = self.process();
        while !self.running.is_empty() {
            let Ok((id, result)) = self.results_rx.recv() else {
                break;
            };
            self.finalize(id, result, &mut report);
            report.merge(self.process());
        }
        report
    }

    /// Number of jobs queued but not started.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of jobs whose result has not been finalized.
    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    /// The open documents.
    pub fn documents(&self) -> &Documents {
        &self.documents
    }

    /// Diagnostics about jobs that could not run.
    pub fn diagnostics(&self) -> &DiagnosticSink {
        &self.diagnostics
    }

    fn start_pending(&mut self, report: &mut ProcessReport) {
        while let Some(mut job) = self.pending.pop_front() {
            let request = job.request().clone();
            let context = JobContext::new(&request, &self.issued);
            if context.is_outdated(&self.documents) {
                tracing::debug!(
                    file = %request.file_path.display(),
                    issued_at = request.issued_at,
                    "cancelling superseded job"
                );
                report.cancelled += 1;
                continue;
            }

            let Some(run) = job.prepare_async_run(&context, &self.documents) else {
                self.diagnostics.emit(
                    Diagnostic::error(
                        DiagnosticCode::MALFORMED_JOB,
                        format!("cannot run {:?} job", request.kind),
                    )
                    .with_file(&request.file_path),
                );
                report.failed += 1;
                continue;
            };

            job.mark_running();
            let id = request.issued_at;
            self.running.insert(id, job);
            let tx = self.results_tx.clone();
            self.pool.spawn(move || {
                // The receiver lives as long as the queue.
                let _ = tx.send((id, run.run()));
            });
            report.started += 1;
        }
    }

    fn finalize(&mut self, id: u64, result: AsyncResult, report: &mut ProcessReport) {
        let Some(mut job) = self.running.remove(&id) else {
            return;
        };
        let request = job.request().clone();
        let context = JobContext::new(&request, &self.issued);
        match job.finalize_async_run(&context, &mut self.documents, result) {
            JobOutcome::Applied => report.applied += 1,
            JobOutcome::Outdated => report.outdated += 1,
        }
    }
}
