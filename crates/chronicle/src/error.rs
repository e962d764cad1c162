//! Error types for the writer and the query engine

use chronicle_storage::StorageError;
use thiserror::Error;

/// Errors surfaced by [`Logger`](crate::Logger)
#[derive(Debug, Error)]
pub enum LogError {
    /// A backend rejected the entry during fan-out
    ///
    /// Backends before `index` already hold the entry; they are not rolled
    /// back.
    #[error("Write to backend #{index} ({backend}) failed, {committed} earlier backend(s) committed: {source}")]
    WriteFailure {
        /// Position of the failing backend in configuration order
        index: usize,
        /// Description of the failing backend
        backend: String,
        /// Number of backends that committed the entry before the failure
        committed: usize,
        #[source]
        source: StorageError,
    },

    /// A backend could not be opened or configured
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl LogError {
    /// Create a new WriteFailure error
    pub fn write_failure(index: usize, backend: impl Into<String>, source: StorageError) -> Self {
        Self::WriteFailure {
            index,
            backend: backend.into(),
            committed: index,
            source,
        }
    }

    /// Whether this is a fan-out write failure
    pub fn is_write_failure(&self) -> bool {
        matches!(self, Self::WriteFailure { .. })
    }
}

/// Errors surfaced by [`Reader`](crate::Reader) queries
#[derive(Debug, Error)]
pub enum QueryError {
    /// The supplied pattern is not a valid regular expression
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The backend could not be read
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl QueryError {
    /// Whether this is a pattern error
    pub fn is_pattern(&self) -> bool {
        matches!(self, Self::Pattern(_))
    }

    /// Whether a stored record failed to decode
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_decode())
    }
}
