//! Error taxonomy for the search core.
//!
//! Only [`EngineError`] is fatal to a search. [`ReadError`]s are per-file and
//! end up as diagnostics on the result model.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to turn a file into text
#[derive(Debug, Error)]
pub enum ReadError {
    /// The file could not be opened or read (permissions, deleted mid-search)
    #[error("cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// None of the candidate encodings decoded the file cleanly
    #[error("{} is not valid in any configured encoding", path.display())]
    Undecodable { path: PathBuf },
}

impl ReadError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            ReadError::Unreadable { path, .. } | ReadError::Undecodable { path } => path,
        }
    }
}

/// Unrecoverable conditions that abort a whole search
#[derive(Debug, Error)]
pub enum EngineError {
    /// The traversal source itself cannot be enumerated
    #[error("search root {} is unavailable: {reason}", path.display())]
    SourceUnavailable { path: PathBuf, reason: String },
}

/// Invalid or unloadable configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("unknown encoding label `{0}`")]
    UnknownEncoding(String),

    #[error("failed to access config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
