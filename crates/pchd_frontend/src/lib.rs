//! The compiler invocation boundary.
//!
//! Everything that touches a compiler lives behind the [`Frontend`] trait: a
//! preprocessing pass that reports which headers a translation unit enters,
//! and a compile pass used for PCH emission. Two implementations accept the
//! same argument contract built by [`PchArgumentBuilder`]:
//!
//! - [`ScanFrontend`] runs in-process, resolving `#include` directives itself
//!   and writing [`PchSnapshot`] files as its precompiled headers.
//! - [`ProcessFrontend`] spawns a real compiler and reads its `-H` header trace.
//!
//! Which one a process uses is decided by its composition root through a
//! [`FrontendRegistry`].

#![warn(missing_docs)]

pub mod arguments;
pub mod compiler_args;
pub mod error;
pub mod frontend;
pub mod identity;
pub mod process;
pub mod registry;
pub mod scan;
pub mod snapshot;

pub use arguments::{command_line, PchArgumentBuilder, PchMode};
pub use compiler_args::CompilerArguments;
pub use error::FrontendError;
pub use frontend::{Frontend, Invocation, PreprocessOutput, UnresolvedInclude};
pub use identity::FileIdentity;
pub use process::ProcessFrontend;
pub use registry::{FrontendFactory, FrontendRegistry};
pub use scan::ScanFrontend;
pub use snapshot::{PchSnapshot, SnapshotEntry};
