//! # Error Types
//!
//! World operations themselves are total: out-of-range edits are no-ops and
//! absent chunks read as air. Errors only come from the ambient surfaces
//! around them: loading configuration and spawning threads.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while configuring or starting the streaming pipeline.
#[derive(Error, Debug)]
pub enum StrataError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for `WorldConfig`.
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A config value is outside its valid range.
    #[error("invalid config value `{field}`: {reason}")]
    InvalidConfig {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// The OS refused to start a worker or scheduler thread.
    #[error("failed to spawn thread `{name}`: {source}")]
    ThreadSpawn {
        /// Thread name.
        name: String,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
}

/// Result type for fallible STRATA operations.
pub type StrataResult<T> = Result<T, StrataError>;
