//! Delimited-text backend
//!
//! Stores one CSV record per entry with the columns `timestamp,level,message`.
//! Fields containing the delimiter, quotes or line breaks are quoted per
//! RFC 4180, so any message round-trips unchanged.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chronicle_core::{Level, LogEntry, encode_timestamp, parse_timestamp};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::backend::{Backend, BackendKind, append_record, validate_file_location};
use crate::error::StorageError;

/// Column names written as the first row of every new file
pub const CSV_HEADER: [&str; 3] = ["timestamp", "level", "message"];

/// CSV file implementation of [`Backend`]
#[derive(Debug)]
pub struct CsvBackend {
    path: PathBuf,
    location: String,
    write_lock: Mutex<()>,
}

impl CsvBackend {
    /// Open or create a CSV log at `path`
    ///
    /// A new or empty file receives the header row immediately.
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

        let needs_header = match std::fs::metadata(&path) {
            Ok(metadata) => metadata.len() == 0,
            Err(e) if e.kind() == ErrorKind::NotFound => true,
            Err(e) => return Err(StorageError::configuration(location, e)),
        };

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StorageError::configuration(&location, e))?;

        if needs_header {
            let header = encode_record(CSV_HEADER)
                .map_err(|e| StorageError::configuration(&location, e))?;
            append_record(&path, &header).map_err(|e| StorageError::configuration(&location, e))?;
            debug!(path = %location, "Wrote CSV header row");
        }

        info!(path = %location, "Opened CSV log");

        Ok(Self {
            path,
            location,
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the CSV file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Backend for CsvBackend {
    fn append(&self, entry: &LogEntry) -> Result<(), StorageError> {
        let timestamp =
            encode_timestamp(&entry.timestamp()).map_err(|e| StorageError::write(&self.location, e))?;
        let record = encode_record([timestamp.as_str(), entry.level().as_str(), entry.message()])
            .map_err(|e| StorageError::write(&self.location, e))?;

        let _guard = self.write_lock.lock();
        append_record(&self.path, &record).map_err(|e| StorageError::write(&self.location, e))?;

        debug!(path = %self.location, bytes = record.len(), "Appended CSV record");
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<LogEntry>, StorageError> {
        let bytes = std::fs::read(&self.path).map_err(|e| StorageError::read(&self.location, e))?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes.as_slice());

        let mut rows = reader.records();

        let header = match rows.next() {
            None if bytes.is_empty() => return Ok(Vec::new()),
            None => return Err(StorageError::decode(&self.location, 0, "missing header row")),
            Some(header) => header.map_err(|e| StorageError::decode(&self.location, 0, e))?,
        };
        if record_start(&header) != 0 {
            return Err(StorageError::decode(&self.location, 0, "blank line before header row"));
        }
        if header.iter().ne(CSV_HEADER) {
            return Err(StorageError::decode(
                &self.location,
                0,
                format!("unexpected header row {:?}", header.iter().collect::<Vec<_>>()),
            ));
        }

        let mut previous_start = 0;
        let mut entries = Vec::new();
        for (index, row) in rows.enumerate() {
            let entry = row
                .map_err(|e| e.to_string())
                .and_then(|record| {
                    let start = record_start(&record);
                    // The csv reader skips empty lines; treat them as corrupt records
                    if ends_with_blank_line(&bytes[previous_start..start]) {
                        return Err("blank line".to_string());
                    }
                    previous_start = start;
                    decode_record(&record)
                })
                .map_err(|reason| {
                    warn!(path = %self.location, record = index, %reason, "Corrupt CSV record");
                    StorageError::decode(&self.location, index, reason)
                })?;
            entries.push(entry);
        }

        if ends_with_blank_line(&bytes[previous_start..]) {
            warn!(path = %self.location, record = entries.len(), "Trailing blank line in CSV log");
            return Err(StorageError::decode(&self.location, entries.len(), "blank line"));
        }

        debug!(path = %self.location, count = entries.len(), "Read CSV log");
        Ok(entries)
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Csv
    }

    fn location(&self) -> &str {
        &self.location
    }
}

/// Serialize one row, including its terminator, into memory
fn encode_record<'a>(fields: impl IntoIterator<Item = &'a str>) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(fields)?;
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Byte offset where `record` starts in the file
fn record_start(record: &csv::StringRecord) -> usize {
    record.position().map_or(0, |position| position.byte() as usize)
}

/// Whether the raw bytes between two record starts hold an empty line
///
/// A record span ends in exactly one terminator. Anything left ending in
/// CR or LF after removing it is a line with no fields.
fn ends_with_blank_line(span: &[u8]) -> bool {
    let body = span
        .strip_suffix(b"\r\n")
        .or_else(|| span.strip_suffix(b"\n"))
        .or_else(|| span.strip_suffix(b"\r"))
        .unwrap_or(span);
    matches!(body.last(), Some(b'\n' | b'\r'))
}

fn decode_record(record: &csv::StringRecord) -> Result<LogEntry, String> {
    if record.len() != CSV_HEADER.len() {
        return Err(format!(
            "expected {} fields, found {}",
            CSV_HEADER.len(),
            record.len()
        ));
    }

    let timestamp = parse_timestamp(&record[0]).map_err(|e| e.to_string())?;
    let level = record[1].parse::<Level>().map_err(|e| e.to_string())?;

    Ok(LogEntry::with_timestamp(timestamp, level, &record[2]))
}
