//! Error type for the command cache.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from hashing command inputs or copying cached outputs.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A file could not be read or written.
    #[error("cache I/O error on {path}: {source}")]
    Io {
        /// The offending path.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
