//! Plain-file backend
//!
//! One canonical line per entry: `<timestamp> <LEVEL> <message>`.
//!
//! Line breaks would split a record, so messages are escaped before
//! writing: `\` becomes `\\`, LF becomes `\n` and CR becomes `\r`.
//! Messages without those characters are stored verbatim.

use std::borrow::Cow;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chronicle_core::{LogEntry, encode_timestamp};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::backend::{Backend, BackendKind, append_record, validate_file_location};
use crate::error::StorageError;

/// Plain text file implementation of [`Backend`]
#[derive(Debug)]
pub struct PlainTextBackend {
    path: PathBuf,
    location: String,
    write_lock: Mutex<()>,
}

impl PlainTextBackend {
    /// Open or create a plain text log at `path`
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

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StorageError::configuration(&location, e))?;

        info!(path = %location, "Opened plain text log");

        Ok(Self {
            path,
            location,
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Backend for PlainTextBackend {
    fn append(&self, entry: &LogEntry) -> Result<(), StorageError> {
        let timestamp =
            encode_timestamp(&entry.timestamp()).map_err(|e| StorageError::write(&self.location, e))?;
        let line = format!(
            "{} {} {}\n",
            timestamp,
            entry.level(),
            escape_message(entry.message())
        );

        let _guard = self.write_lock.lock();
        append_record(&self.path, line.as_bytes()).map_err(|e| StorageError::write(&self.location, e))?;

        debug!(path = %self.location, bytes = line.len(), "Appended log line");
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<LogEntry>, StorageError> {
        let bytes = std::fs::read(&self.path).map_err(|e| StorageError::read(&self.location, e))?;
        if bytes.is_empty() {
            return Ok(Vec::new());
        }

        let body = bytes.strip_suffix(b"\n").unwrap_or(&bytes);
        let mut entries = Vec::new();
        for (index, raw) in body.split(|byte| *byte == b'\n').enumerate() {
            let entry = std::str::from_utf8(raw)
                .map_err(|e| e.to_string())
                .and_then(decode_line)
                .map_err(|reason| {
                    warn!(path = %self.location, record = index, %reason, "Corrupt log line");
                    StorageError::decode(&self.location, index, reason)
                })?;
            entries.push(entry);
        }

        debug!(path = %self.location, count = entries.len(), "Read plain text log");
        Ok(entries)
    }

    fn kind(&self) -> BackendKind {
        BackendKind::PlainText
    }

    fn location(&self) -> &str {
        &self.location
    }
}

fn decode_line(line: &str) -> Result<LogEntry, String> {
    let stored = LogEntry::parse_line(line).map_err(|e| e.to_string())?;
    let message = unescape_message(stored.message())?;
    Ok(LogEntry::with_timestamp(stored.timestamp(), stored.level(), message))
}

fn escape_message(message: &str) -> Cow<'_, str> {
    if !message.contains(['\\', '\n', '\r']) {
        return Cow::Borrowed(message);
    }

    let mut escaped = String::with_capacity(message.len() + 8);
    for c in message.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

fn unescape_message(stored: &str) -> Result<String, String> {
    let mut message = String::with_capacity(stored.len());
    let mut chars = stored.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            message.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => message.push('\\'),
            Some('n') => message.push('\n'),
            Some('r') => message.push('\r'),
            Some(other) => return Err(format!("invalid escape sequence \\{}", other)),
            None => return Err("dangling escape at end of line".to_string()),
        }
    }

    Ok(message)
}
