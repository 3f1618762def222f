//! The `pchd.toml` project description.
//!
//! [`load_config`] parses and validates the file into a [`ProjectConfig`];
//! [`resolve_config`] turns its relative paths into absolute ones, anchored
//! at the directory the file lives in.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{find_config_dir, load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use resolve::{resolve_config, ResolvedConfig};
pub use types::{CompilerConfig, JobsConfig, OutputConfig, ProjectConfig};
