//! A frontend that runs a real compiler as a child process.
//!
//! Preprocessing relies on the `-H` header trace the compiler prints to
//! stderr: one line per header entered, prefixed by one dot per nesting level.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use pchd_common::normalize_with_base;

use crate::error::FrontendError;
use crate::frontend::{Frontend, Invocation, PreprocessOutput};
use crate::identity::FileIdentity;

/// Marks the end of the header trace; what follows is a summary.
const TRACE_TRAILER: &str = "Multiple include guards may be useful for:";

/// Spawns the compiler named in each [`Invocation`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessFrontend;

impl ProcessFrontend {
    /// Creates a process frontend.
    pub fn new() -> Self {
        Self
    }

    fn run(&self, invocation: &Invocation<'_>) -> Result<Output, FrontendError> {
        tracing::debug!(
            compiler = invocation.compiler,
            args = invocation.arguments.len(),
            cwd = %invocation.working_directory.display(),
            "spawning compiler"
        );
        let output = Command::new(invocation.compiler)
            .args(invocation.arguments)
            .current_dir(invocation.working_directory)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| FrontendError::Spawn {
                program: invocation.compiler.to_string(),
                source,
            })?;

        if output.status.success() {
            Ok(output)
        } else {
            Err(FrontendError::failed(
                invocation.compiler,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr),
            ))
        }
    }
}

impl Frontend for ProcessFrontend {
    fn name(&self) -> &str {
        "process"
    }

    fn preprocess(
        &self,
        invocation: &Invocation<'_>,
        excluded: &[PathBuf],
    ) -> Result<PreprocessOutput, FrontendError> {
        let output = self.run(invocation)?;
        let trace = String::from_utf8_lossy(&output.stderr);
        let excluded: HashSet<FileIdentity> = excluded
            .iter()
            .map(|path| FileIdentity::resolve_or_lexical(&normalize_with_base(invocation.working_directory, path)))
            .collect();

        Ok(PreprocessOutput {
            headers: parse_header_trace(&trace, invocation.working_directory, &excluded),
            unresolved: Vec::new(),
        })
    }

    fn compile(&self, invocation: &Invocation<'_>) -> Result<(), FrontendError> {
        self.run(invocation).map(|_| ())
    }
}

/// Extracts entered headers from a `-H` trace.
///
/// An excluded header hides every deeper line that follows it, up to the
/// next line at its own depth or shallower. Repeated headers are reported once.
fn parse_header_trace(
    trace: &str,
    working_directory: &Path,
    excluded: &HashSet<FileIdentity>,
) -> Vec<PathBuf> {
    let mut headers = Vec::new();
    let mut seen = HashSet::new();
    let mut skip_below: Option<usize> = None;

    for line in trace.lines() {
        if line.starts_with(TRACE_TRAILER) {
            break;
        }
        let depth = line.chars().take_while(|&c| c == '.').count();
        if depth == 0 {
            continue;
        }
        let Some(spelled) = line[depth..].strip_prefix(' ') else {
            continue;
        };

        match skip_below {
            Some(limit) if depth > limit => continue,
            _ => skip_below = None,
        }

        let path = normalize_with_base(working_directory, Path::new(spelled.trim_end()));
        let identity = FileIdentity::resolve_or_lexical(&path);
        if excluded.contains(&identity) {
            skip_below = Some(depth);
            continue;
        }
        if seen.insert(identity) {
            headers.push(path);
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn excluded(paths: &[&str]) -> HashSet<FileIdentity> {
        paths
            .iter()
            .map(|p| FileIdentity::resolve_or_lexical(Path::new(p)))
            .collect()
    }

    #[test]
    fn trace_depth_and_order() {
        let trace = ". /inc/a.h\n.. /inc/b.h\n. /inc/c.h\n";
        let headers = parse_header_trace(trace, Path::new("/work"), &HashSet::new());
        assert_eq!(
            headers,
            vec![PathBuf::from("/inc/a.h"), PathBuf::from("/inc/b.h"), PathBuf::from("/inc/c.h")]
        );
    }

    #[test]
    fn trace_relative_paths_resolve_against_working_directory() {
        let trace = ". ./inc/../a.h\n";
        let headers = parse_header_trace(trace, Path::new("/work"), &HashSet::new());
        assert_eq!(headers, vec![PathBuf::from("/work/a.h")]);
    }

    #[test]
    fn trace_stops_at_trailer_and_ignores_noise() {
        let trace = "warning: something\n. /a.h\nMultiple include guards may be useful for:\n/b.h\n";
        let headers = parse_header_trace(trace, Path::new("/"), &HashSet::new());
        assert_eq!(headers, vec![PathBuf::from("/a.h")]);
    }

    #[test]
    fn excluded_subtree_is_dropped() {
        let trace = ". /g.h\n.. /g_inner.h\n... /g_deep.h\n. /own.h\n.. /own_inner.h\n";
        let headers = parse_header_trace(trace, Path::new("/"), &excluded(&["/g.h"]));
        assert_eq!(headers, vec![PathBuf::from("/own.h"), PathBuf::from("/own_inner.h")]);
    }

    #[test]
    fn duplicates_are_dropped() {
        let trace = ". /a.h\n. /b.h\n.. /a.h\n";
        let headers = parse_header_trace(trace, Path::new("/"), &HashSet::new());
        assert_eq!(headers, vec![PathBuf::from("/a.h"), PathBuf::from("/b.h")]);
    }

    #[cfg(unix)]
    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[cfg(unix)]
    #[test]
    fn preprocess_reads_stderr_trace() {
        let arguments = sh("printf '. /x/a.h\\n.. /x/b.h\\n' >&2");
        let output = ProcessFrontend
            .preprocess(&Invocation::new("sh", &arguments, Path::new("/")), &[])
            .unwrap();
        assert_eq!(output.headers, vec![PathBuf::from("/x/a.h"), PathBuf::from("/x/b.h")]);
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_failure() {
        let arguments = sh("echo 'fatal error' >&2; exit 3");
        let err = ProcessFrontend
            .compile(&Invocation::new("sh", &arguments, Path::new("/")))
            .unwrap_err();
        match err {
            FrontendError::Failed { status, stderr, .. } => {
                assert_eq!(status, Some(3));
                assert!(stderr.contains("fatal error"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn signal_is_crash() {
        let arguments = sh("kill -9 $$");
        let err = ProcessFrontend
            .compile(&Invocation::new("sh", &arguments, Path::new("/")))
            .unwrap_err();
        assert!(err.is_crash());
    }

    #[test]
    fn missing_compiler_fails_to_spawn() {
        let err = ProcessFrontend
            .compile(&Invocation::new("/nonexistent/pchd-compiler", &[], Path::new("/")))
            .unwrap_err();
        assert!(matches!(err, FrontendError::Spawn { .. }));
    }
}
