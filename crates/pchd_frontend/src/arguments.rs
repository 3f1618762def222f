//! Construction of compiler argument vectors for PCH work.
//!
//! All functions here are pure: no I/O, and identical inputs always yield
//! identical, identically ordered vectors.

use std::path::Path;

/// What an argument vector should make the compiler do.
#[derive(Debug, Clone, Copy)]
pub enum PchMode<'a> {
    /// Preprocess `input` only, tracing every header entered (`-E -H`).
    Preprocess {
        /// The translation unit to preprocess.
        input: &'a Path,
    },
    /// Compile `header` as a C++ header and emit a binary PCH to `target`,
    /// optionally layered on a previously emitted `prefix` PCH.
    EmitPch {
        /// The generated header holding the `#include` list.
        header: &'a Path,
        /// Where the PCH is written.
        target: &'a Path,
        /// A PCH to consume as an implicit prefix, if any.
        prefix: Option<&'a Path>,
    },
    /// Compile `input` with `prefix` as an implicit prefix PCH, without
    /// re-emitting it.
    ConsumePch {
        /// The PCH to consume.
        prefix: &'a Path,
        /// The translation unit to compile.
        input: &'a Path,
    },
}

/// Builds compiler argument vectors from a project part's base arguments.
///
/// The compiler executable is never part of the result; use
/// [`command_line`] to prepend it.
#[derive(Debug, Clone, Copy)]
pub struct PchArgumentBuilder<'a> {
    base: &'a [String],
}

impl<'a> PchArgumentBuilder<'a> {
    /// Creates a builder over `base`, which is copied verbatim to the front
    /// of every vector.
    pub fn new(base: &'a [String]) -> Self {
        Self { base }
    }

    /// Builds the argument vector for `mode`.
    pub fn build(&self, mode: PchMode<'_>) -> Vec<String> {
        let mut arguments = self.base.to_vec();
        match mode {
            PchMode::Preprocess { input } => {
                arguments.extend(["-E".to_string(), "-H".to_string()]);
                arguments.push(path_argument(input));
            }
            PchMode::EmitPch {
                header,
                target,
                prefix,
            } => {
                arguments.extend(["-x".to_string(), "c++-header".to_string()]);
                if let Some(prefix) = prefix {
                    push_include_pch(&mut arguments, prefix);
                }
                arguments.extend([
                    "-Xclang".to_string(),
                    "-emit-pch".to_string(),
                    "-o".to_string(),
                    path_argument(target),
                    path_argument(header),
                ]);
            }
            PchMode::ConsumePch { prefix, input } => {
                push_include_pch(&mut arguments, prefix);
                arguments.push(path_argument(input));
            }
        }
        arguments
    }
}

/// Prepends the compiler executable to an argument vector.
pub fn command_line(compiler: &str, arguments: Vec<String>) -> Vec<String> {
    let mut command = Vec::with_capacity(arguments.len() + 1);
    command.push(compiler.to_string());
    command.extend(arguments);
    command
}

fn push_include_pch(arguments: &mut Vec<String>, prefix: &Path) {
    arguments.extend([
        "-Xclang".to_string(),
        "-include-pch".to_string(),
        "-Xclang".to_string(),
        path_argument(prefix),
    ]);
}

fn path_argument(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
