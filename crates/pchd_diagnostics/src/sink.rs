//! Diagnostic accumulation shared by parallel collection passes.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

#[derive(Default)]
struct Collected {
    diagnostics: Vec<Diagnostic>,
    errors: usize,
    warnings: usize,
}

/// Collects diagnostics from any number of threads.
///
/// Counts survive [`take_all`](Self::take_all): a pass that drained its
/// diagnostics for rendering still reports whether it saw errors.
#[derive(Default)]
pub struct DiagnosticSink {
    inner: Mutex<Collected>,
}

impl DiagnosticSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one diagnostic.
    pub fn emit(&self, diag: Diagnostic) {
        let mut inner = self.lock();
        match diag.severity {
            Severity::Error => inner.errors += 1,
            Severity::Warning => inner.warnings += 1,
            Severity::Note => {}
        }
        inner.diagnostics.push(diag);
    }

    /// Records every diagnostic in `diags`, keeping their order.
    pub fn extend(&self, diags: impl IntoIterator<Item = Diagnostic>) {
        for diag in diags {
            self.emit(diag);
        }
    }

    /// Returns `true` once any error has been emitted.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Errors emitted so far.
    pub fn error_count(&self) -> usize {
        self.lock().errors
    }

    /// Warnings emitted so far.
    pub fn warning_count(&self) -> usize {
        self.lock().warnings
    }

    /// Drains the collected diagnostics.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.lock().diagnostics)
    }

    /// A copy of the collected diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.lock().diagnostics.clone()
    }

    // Emitting never panics while holding the lock, so a poisoned guard
    // still holds consistent data.
    fn lock(&self) -> MutexGuard<'_, Collected> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for DiagnosticSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("DiagnosticSink")
            .field("pending", &inner.diagnostics.len())
            .field("errors", &inner.errors)
            .field("warnings", &inner.warnings)
            .finish()
    }
}
