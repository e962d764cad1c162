//! # Chronicle Storage
//!
//! Interchangeable storage backends for Chronicle log entries.
//!
//! Every medium implements the [`Backend`] trait: `append` one entry,
//! `read_all` entries back in append order. A writer or reader holding an
//! `Arc<dyn Backend>` cannot tell the media apart.
//!
//! ## Backends
//!
//! - [`CsvBackend`]: delimited text, RFC 4180 quoting
//! - [`JsonBackend`]: one JSON document, atomically replaced on append
//! - [`SqliteBackend`]: one row per entry in a SQLite table
//! - [`PlainTextBackend`]: one canonical line per entry
//! - [`MemoryBackend`]: process memory, for tests and ad-hoc entry sets
//!
//! ## Guarantees
//!
//! - Appends to one backend value are serialized internally; each append
//!   commits a whole record or fails without touching earlier records.
//! - `read_all` is fail-closed: one undecodable record fails the read with
//!   [`StorageError::Decode`].
//! - Construction validates the location and fails with
//!   [`StorageError::Configuration`] instead of deferring to first use.
//!
//! ## Example
//!
//! ```rust,ignore
//! use chronicle_core::{Level, LogEntry};
//! use chronicle_storage::{Backend, SqliteBackend};
//!
//! let backend = SqliteBackend::open("./data/app.db")?;
//! backend.append(&LogEntry::new(Level::Info, "Application started"))?;
//!
//! let entries = backend.read_all()?;
//! assert_eq!(entries.len(), 1);
//! ```

pub mod backend;
pub mod config;
pub mod csv_file;
pub mod error;
pub mod json_file;
pub mod memory;
pub mod plain;
pub mod sqlite;

// Re-exports
pub use backend::{Backend, BackendKind};
pub use config::BackendConfig;
pub use csv_file::{CSV_HEADER, CsvBackend};
pub use error::StorageError;
pub use json_file::JsonBackend;
pub use memory::MemoryBackend;
pub use plain::PlainTextBackend;
pub use sqlite::{DEFAULT_TABLE, SqliteBackend};
