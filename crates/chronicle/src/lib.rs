//! Structured-event logging with interchangeable storage backends
//!
//! Application code emits leveled entries through a [`Logger`], which fans
//! each entry out to one or more storage backends. A [`Reader`] runs
//! searches and groupings over whatever one backend holds, with the same
//! results whichever medium that is.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use chronicle::{Logger, Reader};
//! use chronicle_storage::{Backend, PlainTextBackend, SqliteBackend};
//!
//! let db: Arc<dyn Backend> = Arc::new(SqliteBackend::open("app.db")?);
//! let text: Arc<dyn Backend> = Arc::new(PlainTextBackend::open("app.log")?);
//!
//! let logger = Logger::new(vec![db.clone(), text]);
//! logger.info("Application started")?;
//! logger.error("Something went wrong")?;
//!
//! let reader = Reader::new(db);
//! let failures = reader.find_by_regex("error|wrong")?;
//! let by_month = reader.group_by_month()?;
//! ```
//!
//! # Configuration
//!
//! A [`LoggerConfig`] lists backends as data, so they can be chosen at
//! startup:
//!
//! ```ignore
//! let config = LoggerConfig::from_path("chronicle.json")?;
//! let logger = Logger::from_config(&config)?;
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod logger;
pub mod query;
pub mod reader;

pub use config::LoggerConfig;
pub use diagnostics::{DiagnosticsBuilder, DiagnosticsConfig};
pub use error::{LogError, QueryError};
pub use logger::{Logger, LoggerBuilder};
pub use query::{TimeWindow, YearMonth};
pub use reader::Reader;

pub use chronicle_core::{Clock, Level, LogEntry, ManualClock, SystemClock};
pub use chronicle_storage::{Backend, BackendConfig, BackendKind, StorageError};
