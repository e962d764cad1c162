//! The storage backend contract
//!
//! Every medium implements [`Backend`]: append one entry, read all entries
//! back in append order. Nothing else about a medium is visible to writers
//! or readers.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use chronicle_core::LogEntry;

use crate::error::StorageError;

/// Which storage medium a backend writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Delimited text (CSV)
    Csv,
    /// Structured markup (JSON document)
    Json,
    /// Relational (SQLite table)
    Sqlite,
    /// Plain text, one canonical line per entry
    PlainText,
    /// Process memory only
    Memory,
}

impl BackendKind {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Csv => "csv",
            BackendKind::Json => "json",
            BackendKind::Sqlite => "sqlite",
            BackendKind::PlainText => "plain",
            BackendKind::Memory => "memory",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Contract every storage medium satisfies to be interchangeable
///
/// Implementations own their medium exclusively and serialize concurrent
/// appends internally, so a single backend value may be shared between
/// threads behind an [`Arc`]. Both operations block on the medium; there is
/// no timeout and no cancellation.
pub trait Backend: Send + Sync {
    /// Durably add `entry` to the end of the medium
    ///
    /// An append either commits the whole record or fails; a failure never
    /// damages entries committed earlier.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] if the medium rejects the record.
    fn append(&self, entry: &LogEntry) -> Result<(), StorageError>;

    /// Read every appended entry, in append order
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Decode`] if any stored record is not a valid
    /// entry. The whole read fails; corrupt records are never skipped.
    fn read_all(&self) -> Result<Vec<LogEntry>, StorageError>;

    /// The medium this backend writes to
    fn kind(&self) -> BackendKind;

    /// Identifying location of the medium (file path, database path)
    fn location(&self) -> &str;

    /// Human-readable identity used in error reports
    fn describe(&self) -> String {
        format!("{} backend at {}", self.kind(), self.location())
    }
}

impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn append(&self, entry: &LogEntry) -> Result<(), StorageError> {
        (**self).append(entry)
    }

    fn read_all(&self) -> Result<Vec<LogEntry>, StorageError> {
        (**self).read_all()
    }

    fn kind(&self) -> BackendKind {
        (**self).kind()
    }

    fn location(&self) -> &str {
        (**self).location()
    }
}

/// Check that `path` can hold a file-backed medium
///
/// The parent directory must already exist and `path` must not be a
/// directory. Files themselves are created by the caller.
pub(crate) fn validate_file_location(path: &Path) -> Result<(), StorageError> {
    let location = path.display().to_string();

    if path.as_os_str().is_empty() {
        return Err(StorageError::configuration(location, "empty path"));
    }

    if path.is_dir() {
        return Err(StorageError::configuration(location, "path is a directory"));
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.is_dir()
    {
        return Err(StorageError::configuration(
            location,
            format!("parent directory {} does not exist", parent.display()),
        ));
    }

    Ok(())
}

/// Append one fully encoded record to a file with a single write, then
/// flush it to the device
pub(crate) fn append_record(path: &Path, record: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new().append(true).open(path)?;
    file.write_all(record)?;
    file.sync_data()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryBackend;

    /// Test that the Backend trait is object-safe
    fn _assert_object_safe(_: &dyn Backend) {}

    #[test]
    fn test_kind_names() {
        assert_eq!(BackendKind::Csv.to_string(), "csv");
        assert_eq!(BackendKind::PlainText.as_str(), "plain");
    }

    #[test]
    fn test_describe_includes_kind_and_location() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.describe(), "memory backend at memory");
    }

    #[test]
    fn test_arc_forwards_to_inner() {
        let backend: Arc<dyn Backend> = Arc::new(MemoryBackend::new());
        let entry = LogEntry::new(chronicle_core::Level::Info, "via arc");
        backend.append(&entry).unwrap();
        assert_eq!(backend.read_all().unwrap(), vec![entry]);
        assert_eq!(backend.kind(), BackendKind::Memory);
    }

    #[test]
    fn test_validate_rejects_missing_parent() {
        let err = validate_file_location(Path::new("/definitely/not/here/log.txt")).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_validate_rejects_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = validate_file_location(dir.path()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_validate_accepts_bare_file_name() {
        assert!(validate_file_location(Path::new("relative.log")).is_ok());
    }
}
