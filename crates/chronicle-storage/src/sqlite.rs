//! Relational backend
//!
//! Stores one row per entry in a single SQLite table:
//!
//! ```sql
//! CREATE TABLE logs (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     timestamp TEXT NOT NULL,
//!     level TEXT NOT NULL,
//!     message TEXT NOT NULL
//! )
//! ```
//!
//! Rows are read back ordered by `id`, so entries sharing a timestamp keep
//! their append order.

use std::path::PathBuf;
use std::time::Duration;

use chronicle_core::{Level, LogEntry, encode_timestamp, parse_timestamp};
use parking_lot::Mutex;
use rusqlite::{Connection, params};
use tracing::{debug, info, instrument, warn};

use crate::backend::{Backend, BackendKind, validate_file_location};
use crate::error::StorageError;

/// Table used when none is given
pub const DEFAULT_TABLE: &str = "logs";

/// How long a writer waits on a lock held by another connection
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite implementation of [`Backend`]
#[derive(Debug)]
pub struct SqliteBackend {
    conn: Mutex<Connection>,
    location: String,
    table: String,
}

impl SqliteBackend {
    /// Open or create a database at `path` using the `logs` table
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Configuration`] if the database cannot be
    /// opened or the table cannot be created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        Self::with_table(path, DEFAULT_TABLE)
    }

    /// Open or create a database at `path` using a custom table name
    ///
    /// The name must match `[A-Za-z_][A-Za-z0-9_]*`.
    #[instrument(skip_all)]
    pub fn with_table(path: impl Into<PathBuf>, table: impl Into<String>) -> Result<Self, StorageError> {
        let path = path.into();
        let table = table.into();
        let location = path.display().to_string();

        validate_table_name(&location, &table)?;
        validate_file_location(&path)?;

        let conn = Connection::open(&path).map_err(|e| StorageError::configuration(&location, e))?;
        let backend = Self::initialize(conn, location, table)?;

        info!(path = %backend.location, table = %backend.table, "Opened SQLite log");
        Ok(backend)
    }

    /// Create a private in-memory database, discarded on drop
    pub fn in_memory() -> Result<Self, StorageError> {
        let location = ":memory:".to_string();
        let conn = Connection::open_in_memory().map_err(|e| StorageError::configuration(&location, e))?;
        Self::initialize(conn, location, DEFAULT_TABLE.to_string())
    }

    /// Name of the table holding the entries
    pub fn table(&self) -> &str {
        &self.table
    }

    fn initialize(conn: Connection, location: String, table: String) -> Result<Self, StorageError> {
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| StorageError::configuration(&location, e))?;

        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                level TEXT NOT NULL,
                message TEXT NOT NULL
            )"
        ))
        .map_err(|e| StorageError::configuration(&location, e))?;

        debug!(table = %table, "Initialized SQLite table");

        Ok(Self {
            conn: Mutex::new(conn),
            location,
            table,
        })
    }
}

impl Backend for SqliteBackend {
    fn append(&self, entry: &LogEntry) -> Result<(), StorageError> {
        let sql = format!(
            "INSERT INTO {} (timestamp, level, message) VALUES (?1, ?2, ?3)",
            self.table
        );

        let timestamp =
            encode_timestamp(&entry.timestamp()).map_err(|e| StorageError::write(&self.location, e))?;

        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| StorageError::write(&self.location, e))?;
        tx.execute(
            &sql,
            params![
                timestamp,
                entry.level().as_str(),
                entry.message()
            ],
        )
        .map_err(|e| StorageError::write(&self.location, e))?;
        tx.commit().map_err(|e| StorageError::write(&self.location, e))?;

        debug!(path = %self.location, table = %self.table, "Inserted log row");
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<LogEntry>, StorageError> {
        let sql = format!(
            "SELECT timestamp, level, message FROM {} ORDER BY id ASC",
            self.table
        );

        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StorageError::read(&self.location, e))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(|e| StorageError::read(&self.location, e))?;

        let mut entries = Vec::new();
        for (index, row) in rows.enumerate() {
            let entry = row
                .map_err(|e| e.to_string())
                .and_then(|(timestamp, level, message)| decode_row(&timestamp, &level, message))
                .map_err(|reason| {
                    warn!(path = %self.location, record = index, %reason, "Corrupt log row");
                    StorageError::decode(&self.location, index, reason)
                })?;
            entries.push(entry);
        }

        debug!(path = %self.location, count = entries.len(), "Read SQLite log");
        Ok(entries)
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    fn location(&self) -> &str {
        &self.location
    }
}

fn decode_row(timestamp: &str, level: &str, message: String) -> Result<LogEntry, String> {
    let timestamp = parse_timestamp(timestamp).map_err(|e| e.to_string())?;
    let level = level.parse::<Level>().map_err(|e| e.to_string())?;
    Ok(LogEntry::with_timestamp(timestamp, level, message))
}

/// Table names are interpolated into SQL, so only plain identifiers pass
fn validate_table_name(location: &str, table: &str) -> Result<(), StorageError> {
    let mut chars = table.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(StorageError::configuration(
            location,
            format!("invalid table name {:?}", table),
        ))
    }
}
