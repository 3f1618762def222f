//! Error types for configuration loading and validation.

use std::path::PathBuf;

/// Why a `pchd.toml` could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// The file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The content is not valid TOML for a configuration.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// No `pchd.toml` in the start directory or any parent.
    #[error("could not find pchd.toml in {} or any parent directory", .0.display())]
    NotFound(PathBuf),

    /// A required value is missing or empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Two project parts share an id.
    #[error("duplicate project part id '{0}'")]
    DuplicateProjectPart(String),

    /// The configuration lists no project parts.
    #[error("at least one [[project_parts]] entry is required")]
    NoProjectParts,
}
