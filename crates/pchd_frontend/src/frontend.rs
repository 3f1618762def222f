//! The [`Frontend`] trait and the values that cross it.

use std::path::{Path, PathBuf};

use crate::error::FrontendError;

/// One compiler invocation: executable, argument vector and working directory.
///
/// The executable is kept apart from the arguments so argument vectors can be
/// compared without depending on where the compiler is installed.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// Compiler executable (a path or a name looked up on `PATH`).
    pub compiler: &'a str,
    /// Arguments, without the executable.
    pub arguments: &'a [String],
    /// Directory the compiler runs in; relative paths resolve against it.
    pub working_directory: &'a Path,
}

impl<'a> Invocation<'a> {
    /// Creates an invocation.
    pub fn new(compiler: &'a str, arguments: &'a [String], working_directory: &'a Path) -> Self {
        Self {
            compiler,
            arguments,
            working_directory,
        }
    }
}

/// An `#include` directive that did not resolve to any file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedInclude {
    /// The file containing the directive.
    pub includer: PathBuf,
    /// The header name as spelled between the delimiters.
    pub spelling: String,
}

/// Result of a preprocessing pass over one translation unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreprocessOutput {
    /// Headers entered, in first-entered order, absolute and normalised.
    /// The translation unit itself is not listed.
    pub headers: Vec<PathBuf>,
    /// Directives that did not resolve. Frontends that treat a missing header
    /// as fatal report it as a failure instead.
    pub unresolved: Vec<UnresolvedInclude>,
}

/// A compiler frontend, driven either in-process or as a child process.
///
/// Implementations are stateless between calls and safe to share across
/// threads: include collection fans units out in parallel.
pub trait Frontend: Send + Sync {
    /// Short name used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Preprocesses the input named in `invocation` and reports the headers
    /// it enters.
    ///
    /// Each path in `excluded` is resolved to a file identity and treated as
    /// already visited, so neither it nor anything reached only through it
    /// is reported.
    fn preprocess(
        &self,
        invocation: &Invocation<'_>,
        excluded: &[PathBuf],
    ) -> Result<PreprocessOutput, FrontendError>;

    /// Runs `invocation` to completion, e.g. to emit a PCH.
    fn compile(&self, invocation: &Invocation<'_>) -> Result<(), FrontendError>;
}
