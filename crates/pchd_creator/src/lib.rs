//! Precompiled header generation for a set of project parts.
//!
//! [`PchCreator`] produces one global PCH holding the external headers every
//! project part shares, then one PCH per part layered on top of it. Each step
//! is also exposed on its own so callers and tests can inspect intermediate
//! results. [`IncludeCollector`] supplies the header sets.

#![warn(missing_docs)]

pub mod artifact;
pub mod creator;
pub mod environment;
pub mod error;
pub mod include_collector;

pub use artifact::{IdPaths, PchArtifact, PchScope};
pub use creator::{CreatorState, PchCreator};
pub use environment::{Environment, StaticEnvironment};
pub use error::PchError;
pub use include_collector::{IncludeCollector, IncludeSet};
