//! Backend configuration
//!
//! A [`BackendConfig`] names a medium and its location. It is plain data,
//! so it can be embedded in larger configuration files:
//!
//! ```json
//! { "kind": "sqlite", "path": "./data/app.db", "table": "logs" }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::csv_file::CsvBackend;
use crate::error::StorageError;
use crate::json_file::JsonBackend;
use crate::memory::MemoryBackend;
use crate::plain::PlainTextBackend;
use crate::sqlite::{DEFAULT_TABLE, SqliteBackend};

/// Configuration for one storage backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Delimited text file
    Csv { path: PathBuf },
    /// JSON document
    Json { path: PathBuf },
    /// SQLite database
    Sqlite {
        path: PathBuf,
        #[serde(default = "default_table")]
        table: String,
    },
    /// Plain text file
    Plain { path: PathBuf },
    /// Process memory
    Memory,
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

impl BackendConfig {
    /// CSV backend at `path`
    pub fn csv(path: impl Into<PathBuf>) -> Self {
        Self::Csv { path: path.into() }
    }

    /// JSON backend at `path`
    pub fn json(path: impl Into<PathBuf>) -> Self {
        Self::Json { path: path.into() }
    }

    /// SQLite backend at `path` with the default table
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self::Sqlite {
            path: path.into(),
            table: default_table(),
        }
    }

    /// Plain text backend at `path`
    pub fn plain(path: impl Into<PathBuf>) -> Self {
        Self::Plain { path: path.into() }
    }

    /// Open the configured backend
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Configuration`] if the location is unusable.
    pub fn open(&self) -> Result<Arc<dyn Backend>, StorageError> {
        let backend: Arc<dyn Backend> = match self {
            BackendConfig::Csv { path } => Arc::new(CsvBackend::open(path.clone())?),
            BackendConfig::Json { path } => Arc::new(JsonBackend::open(path.clone())?),
            BackendConfig::Sqlite { path, table } => {
                Arc::new(SqliteBackend::with_table(path.clone(), table.clone())?)
            }
            BackendConfig::Plain { path } => Arc::new(PlainTextBackend::open(path.clone())?),
            BackendConfig::Memory => Arc::new(MemoryBackend::new()),
        };
        Ok(backend)
    }
}
