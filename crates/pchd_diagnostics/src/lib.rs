//! Per-file problem reports.
//!
//! Include collection and PCH generation do not stop at the first bad
//! translation unit: an unreadable file, an include that does not resolve or
//! a compiler crash on one unit becomes a [`Diagnostic`] in a
//! [`DiagnosticSink`], and the pass carries on with the rest.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
