//! In-memory backend
//!
//! Holds entries in a vector for the lifetime of the value. Useful for
//! tests and for running reader queries over an entry sequence obtained
//! elsewhere.

use chronicle_core::LogEntry;
use parking_lot::RwLock;
use tracing::trace;

use crate::backend::{Backend, BackendKind};
use crate::error::StorageError;

/// In-memory implementation of [`Backend`]
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<Vec<LogEntry>>,
}

impl MemoryBackend {
    /// Create an empty in-memory backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend pre-populated with `entries`, in the given order
    pub fn from_entries(entries: impl IntoIterator<Item = LogEntry>) -> Self {
        Self {
            entries: RwLock::new(entries.into_iter().collect()),
        }
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if there are any stored entries
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Backend for MemoryBackend {
    fn append(&self, entry: &LogEntry) -> Result<(), StorageError> {
        let mut entries = self.entries.write();
        entries.push(entry.clone());
        trace!(count = entries.len(), "Appended entry in memory");
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<LogEntry>, StorageError> {
        Ok(self.entries.read().clone())
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    fn location(&self) -> &str {
        "memory"
    }
}
