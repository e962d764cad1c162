//! Structured-markup backend
//!
//! Stores all entries as one JSON document: an array of
//! `{"timestamp", "level", "message"}` objects. Every append rewrites the
//! whole document into a temporary file beside the target and atomically
//! renames it into place, so a crash mid-append leaves the previous
//! document intact.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chronicle_core::LogEntry;
use parking_lot::Mutex;
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};

use crate::backend::{Backend, BackendKind, validate_file_location};
use crate::error::StorageError;

/// JSON document implementation of [`Backend`]
#[derive(Debug)]
pub struct JsonBackend {
    path: PathBuf,
    location: String,
    write_lock: Mutex<()>,
}

impl JsonBackend {
    /// Open or create a JSON log at `path`
    ///
    /// A missing file is created holding an empty array. An existing file is
    /// left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Configuration`] if the parent directory does
    /// not exist, `path` is a directory, or the file cannot be created.
    #[instrument(skip_all)]
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let location = path.display().to_string();
        validate_file_location(&path)?;

        let backend = Self {
            path,
            location,
            write_lock: Mutex::new(()),
        };

        if !backend.path.exists() {
            backend
                .write_document(&[])
                .map_err(|e| StorageError::configuration(&backend.location, e))?;
            debug!(path = %backend.location, "Created empty JSON document");
        }

        info!(path = %backend.location, "Opened JSON log");
        Ok(backend)
    }

    /// Path of the JSON document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document as raw records without decoding entries
    fn load_records(&self) -> Result<Vec<Value>, LoadError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(LoadError::Io(e)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&bytes).map_err(LoadError::Syntax)
    }

    /// Replace the document atomically
    fn write_document(&self, records: &[Value]) -> std::io::Result<()> {
        let serialized = serde_json::to_vec_pretty(records)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(&serialized)?;
        temp.write_all(b"\n")?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl Backend for JsonBackend {
    fn append(&self, entry: &LogEntry) -> Result<(), StorageError> {
        let record = serde_json::to_value(entry).map_err(|e| StorageError::write(&self.location, e))?;

        let _guard = self.write_lock.lock();
        let mut records = self.load_records().map_err(|e| {
            StorageError::write(&self.location, format!("existing document unreadable: {}", e))
        })?;
        records.push(record);

        self.write_document(&records)
            .map_err(|e| StorageError::write(&self.location, e))?;

        debug!(path = %self.location, count = records.len(), "Appended JSON record");
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<LogEntry>, StorageError> {
        if !self.path.exists() {
            return Err(StorageError::read(&self.location, "document does not exist"));
        }

        let records = self.load_records().map_err(|e| match e {
            LoadError::Io(e) => StorageError::read(&self.location, e),
            LoadError::Syntax(e) => {
                warn!(path = %self.location, error = %e, "Corrupt JSON document");
                StorageError::decode(&self.location, 0, format!("document is not an array of records: {}", e))
            }
        })?;

        let entries = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                serde_json::from_value::<LogEntry>(record).map_err(|e| {
                    warn!(path = %self.location, record = index, error = %e, "Corrupt JSON record");
                    StorageError::decode(&self.location, index, e)
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(path = %self.location, count = entries.len(), "Read JSON log");
        Ok(entries)
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Json
    }

    fn location(&self) -> &str {
        &self.location
    }
}

#[derive(Debug)]
enum LoadError {
    Io(std::io::Error),
    Syntax(serde_json::Error),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "{}", e),
            LoadError::Syntax(e) => write!(f, "{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronicle_core::Level;
    use tempfile::TempDir;

    fn create_test_backend() -> (JsonBackend, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let backend = JsonBackend::open(temp_dir.path().join("log.json")).unwrap();
        (backend, temp_dir)
    }

    #[test]
    fn test_new_file_is_empty_array() {
        let (backend, _temp) = create_test_backend();
        let value: Value = serde_json::from_slice(&std::fs::read(backend.path()).unwrap()).unwrap();
        assert_eq!(value, Value::Array(Vec::new()));
        assert!(backend.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_persist_and_retrieve() {
        let (backend, _temp) = create_test_backend();
        let entry = LogEntry::new(Level::Error, "JsonHandler test message");
        backend.append(&entry).unwrap();

        assert_eq!(backend.read_all().unwrap(), vec![entry]);
    }

    #[test]
    fn test_document_shape() {
        let (backend, _temp) = create_test_backend();
        backend
            .append(&LogEntry::new(Level::Info, "with \"quotes\" and ]brackets["))
            .unwrap();
        backend.append(&LogEntry::new(Level::Debug, "second")).unwrap();

        let value: Value = serde_json::from_slice(&std::fs::read(backend.path()).unwrap()).unwrap();
        let records = value.as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["level"], "INFO");
        assert_eq!(records[0]["message"], "with \"quotes\" and ]brackets[");
        assert_eq!(records[1]["message"], "second");
    }

    #[test]
    fn test_empty_file_reads_as_no_entries() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.json");
        std::fs::write(&path, "").unwrap();

        let backend = JsonBackend::open(&path).unwrap();
        assert!(backend.read_all().unwrap().is_empty());

        let entry = LogEntry::new(Level::Info, "after empty");
        backend.append(&entry).unwrap();
        assert_eq!(backend.read_all().unwrap(), vec![entry]);
    }

    #[test]
    fn test_corrupt_document_fails_closed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        std::fs::write(&path, "[{\"timestamp\": ").unwrap();

        let backend = JsonBackend::open(&path).unwrap();
        assert!(backend.read_all().unwrap_err().is_decode());

        let err = backend.append(&LogEntry::new(Level::Info, "x")).unwrap_err();
        assert!(err.is_write());
        // The broken document is left as it was
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[{\"timestamp\": ");
    }

    #[test]
    fn test_invalid_record_names_its_index() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("foreign.json");
        std::fs::write(
            &path,
            r#"[
                {"timestamp": "2024-01-01T00:00:00.000000Z", "level": "INFO", "message": "ok"},
                {"timestamp": "2024-01-01T00:00:01.000000Z", "level": "LOUD", "message": "bad"}
            ]"#,
        )
        .unwrap();

        let backend = JsonBackend::open(&path).unwrap();
        let err = backend.read_all().unwrap_err();
        assert!(matches!(err, StorageError::Decode { record: 1, .. }));
    }

    #[test]
    fn test_missing_key_fails_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("partial.json");
        std::fs::write(&path, r#"[{"level": "INFO", "message": "no timestamp"}]"#).unwrap();

        let backend = JsonBackend::open(&path).unwrap();
        assert!(backend.read_all().unwrap_err().is_decode());
    }
}
