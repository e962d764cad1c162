//! The writer: stamps entries and fans them out to backends
//!
//! A [`Logger`] holds an ordered list of backends. [`Logger::emit`] builds
//! one [`LogEntry`] and appends it to each backend in turn. There is no
//! transaction across backends: when one append fails, the loop stops and
//! backends earlier in the list keep the entry.
//!
//! ```rust,ignore
//! use chronicle::{Logger, Level};
//! use chronicle_storage::{CsvBackend, SqliteBackend};
//!
//! let logger = Logger::builder()
//!     .backend(Arc::new(CsvBackend::open("app.csv")?))
//!     .backend(Arc::new(SqliteBackend::open("app.db")?))
//!     .min_level(Level::Info)
//!     .build();
//!
//! logger.info("Application started")?;
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chronicle_core::{Clock, Level, LogEntry, SystemClock};
use chronicle_storage::Backend;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::LoggerConfig;
use crate::error::LogError;

/// Builder for [`Logger`]
pub struct LoggerBuilder {
    backends: Vec<Arc<dyn Backend>>,
    min_level: Level,
    clock: Arc<dyn Clock>,
}

impl LoggerBuilder {
    /// Create a builder with no backends, threshold `Debug` and the system clock
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
            min_level: Level::Debug,
            clock: Arc::new(SystemClock),
        }
    }

    /// Append one backend to the fan-out list
    pub fn backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backends.push(backend);
        self
    }

    /// Append several backends, keeping their order
    pub fn backends(mut self, backends: impl IntoIterator<Item = Arc<dyn Backend>>) -> Self {
        self.backends.extend(backends);
        self
    }

    /// Set the minimum level that is written
    pub fn min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Use a specific time source
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> Logger {
        Logger {
            backends: self.backends,
            min_level: self.min_level,
            clock: self.clock,
            last_timestamp: Mutex::new(None),
        }
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes leveled entries to an ordered list of backends
pub struct Logger {
    backends: Vec<Arc<dyn Backend>>,
    min_level: Level,
    clock: Arc<dyn Clock>,
    /// Timestamp of the last emitted entry; held for the whole fan-out
    last_timestamp: Mutex<Option<DateTime<Utc>>>,
}

impl Logger {
    /// Create a logger writing to `backends` in the given order
    pub fn new(backends: Vec<Arc<dyn Backend>>) -> Self {
        LoggerBuilder::new().backends(backends).build()
    }

    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Open every configured backend and build a logger over them
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Storage`] with the configuration error of the
    /// first backend that cannot be opened.
    pub fn from_config(config: &LoggerConfig) -> Result<Self, LogError> {
        let backends = config
            .backends
            .iter()
            .map(|backend| backend.open())
            .collect::<Result<Vec<_>, _>>()?;

        info!(backends = backends.len(), min_level = %config.min_level, "Logger configured");

        Ok(Self::builder().backends(backends).min_level(config.min_level).build())
    }

    /// Backends in fan-out order
    pub fn backends(&self) -> &[Arc<dyn Backend>] {
        &self.backends
    }

    pub fn min_level(&self) -> Level {
        self.min_level
    }

    /// Change the minimum level that is written
    pub fn set_min_level(&mut self, level: Level) {
        self.min_level = level;
    }

    /// Build an entry and append it to every backend
    ///
    /// Returns `Ok(None)` without touching any backend when `level` is below
    /// the threshold, otherwise the entry that was written.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::WriteFailure`] naming the first backend that
    /// rejected the entry. Earlier backends are not rolled back and later
    /// backends are not attempted.
    pub fn emit(&self, level: Level, message: impl Into<String>) -> Result<Option<LogEntry>, LogError> {
        if level < self.min_level {
            return Ok(None);
        }

        let mut last = self.last_timestamp.lock();
        let now = self.clock.now_utc();
        // Never step back, even when the wall clock does
        let timestamp = match *last {
            Some(previous) if previous > now => previous,
            _ => now,
        };
        let entry = LogEntry::with_timestamp(timestamp, level, message);
        // Recorded before fan-out: a partial failure may still have committed it
        *last = Some(entry.timestamp());

        for (index, backend) in self.backends.iter().enumerate() {
            if let Err(source) = backend.append(&entry) {
                warn!(
                    backend = %backend.describe(),
                    index,
                    committed = index,
                    error = %source,
                    "Log fan-out stopped"
                );
                return Err(LogError::write_failure(index, backend.describe(), source));
            }
        }

        debug!(level = %level, backends = self.backends.len(), "Emitted log entry");
        Ok(Some(entry))
    }

    pub fn debug(&self, message: impl Into<String>) -> Result<Option<LogEntry>, LogError> {
        self.emit(Level::Debug, message)
    }

    pub fn info(&self, message: impl Into<String>) -> Result<Option<LogEntry>, LogError> {
        self.emit(Level::Info, message)
    }

    pub fn warning(&self, message: impl Into<String>) -> Result<Option<LogEntry>, LogError> {
        self.emit(Level::Warning, message)
    }

    pub fn error(&self, message: impl Into<String>) -> Result<Option<LogEntry>, LogError> {
        self.emit(Level::Error, message)
    }

    pub fn critical(&self, message: impl Into<String>) -> Result<Option<LogEntry>, LogError> {
        self.emit(Level::Critical, message)
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let backends: Vec<String> = self.backends.iter().map(|b| b.describe()).collect();
        f.debug_struct("Logger")
            .field("backends", &backends)
            .field("min_level", &self.min_level)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use chronicle_core::ManualClock;
    use chronicle_storage::{BackendKind, MemoryBackend, StorageError};

    /// Backend that rejects every append
    struct RejectingBackend;

    impl Backend for RejectingBackend {
        fn append(&self, _entry: &LogEntry) -> Result<(), StorageError> {
            Err(StorageError::write("readonly.log", "permission denied"))
        }

        fn read_all(&self) -> Result<Vec<LogEntry>, StorageError> {
            Ok(Vec::new())
        }

        fn kind(&self) -> BackendKind {
            BackendKind::PlainText
        }

        fn location(&self) -> &str {
            "readonly.log"
        }
    }

    /// Backend that rejects only its first append
    #[derive(Default)]
    struct FlakyBackend {
        failed: Mutex<bool>,
    }

    impl Backend for FlakyBackend {
        fn append(&self, _entry: &LogEntry) -> Result<(), StorageError> {
            let mut failed = self.failed.lock();
            if *failed {
                return Ok(());
            }
            *failed = true;
            Err(StorageError::write("flaky", "connection lost"))
        }

        fn read_all(&self) -> Result<Vec<LogEntry>, StorageError> {
            Ok(Vec::new())
        }

        fn kind(&self) -> BackendKind {
            BackendKind::Sqlite
        }

        fn location(&self) -> &str {
            "flaky"
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_emit_fans_out_in_order() {
        let first = Arc::new(MemoryBackend::new());
        let second = Arc::new(MemoryBackend::new());
        let logger = Logger::new(vec![first.clone(), second.clone()]);

        let entry = logger.info("Application started").unwrap().unwrap();
        assert_eq!(entry.level(), Level::Info);
        assert_eq!(first.read_all().unwrap(), vec![entry.clone()]);
        assert_eq!(second.read_all().unwrap(), vec![entry]);
    }

    #[test]
    fn test_wrappers_fix_level() {
        let backend = Arc::new(MemoryBackend::new());
        let logger = Logger::new(vec![backend.clone()]);

        logger.debug("d").unwrap();
        logger.info("i").unwrap();
        logger.warning("w").unwrap();
        logger.error("e").unwrap();
        logger.critical("c").unwrap();

        let levels: Vec<Level> = backend.read_all().unwrap().iter().map(LogEntry::level).collect();
        assert_eq!(levels, Level::ALL.to_vec());
    }

    #[test]
    fn test_below_threshold_is_dropped() {
        let backend = Arc::new(MemoryBackend::new());
        let mut logger = Logger::builder()
            .backend(backend.clone())
            .min_level(Level::Warning)
            .build();

        assert!(logger.info("ignored").unwrap().is_none());
        assert!(logger.error("kept").unwrap().is_some());
        assert_eq!(backend.len(), 1);

        logger.set_min_level(Level::Debug);
        assert_eq!(logger.min_level(), Level::Debug);
        assert!(logger.debug("now kept").unwrap().is_some());
        assert_eq!(backend.len(), 2);
    }

    #[test]
    fn test_failure_reports_backend_and_keeps_earlier_commits() {
        let first = Arc::new(MemoryBackend::new());
        let last = Arc::new(MemoryBackend::new());
        let logger = Logger::new(vec![first.clone(), Arc::new(RejectingBackend), last.clone()]);

        let err = logger.error("Something went wrong").unwrap_err();
        match err {
            LogError::WriteFailure {
                index,
                backend,
                committed,
                source,
            } => {
                assert_eq!(index, 1);
                assert_eq!(committed, 1);
                assert_eq!(backend, "plain backend at readonly.log");
                assert!(source.is_write());
            }
            other => panic!("unexpected error: {other}"),
        }

        assert_eq!(first.len(), 1);
        assert!(last.is_empty());
    }

    #[test]
    fn test_timestamps_come_from_clock() {
        let clock = Arc::new(ManualClock::new(start()));
        let logger = Logger::builder()
            .backend(Arc::new(MemoryBackend::new()))
            .clock(clock.clone())
            .build();

        let first = logger.info("one").unwrap().unwrap();
        clock.advance(Duration::seconds(5));
        let second = logger.info("two").unwrap().unwrap();

        assert_eq!(first.timestamp(), start());
        assert_eq!(second.timestamp(), start() + Duration::seconds(5));
    }

    #[test]
    fn test_timestamps_never_decrease() {
        let clock = Arc::new(ManualClock::new(start()));
        let backend = Arc::new(MemoryBackend::new());
        let logger = Logger::builder().backend(backend.clone()).clock(clock.clone()).build();

        logger.info("before step").unwrap();
        clock.set(start() - Duration::hours(1));
        let stepped = logger.info("after step back").unwrap().unwrap();

        assert_eq!(stepped.timestamp(), start());
        let stored = backend.read_all().unwrap();
        assert!(stored.windows(2).all(|pair| pair[0].timestamp() <= pair[1].timestamp()));
    }

    #[test]
    fn test_partial_failure_still_advances_clamp() {
        let clock = Arc::new(ManualClock::new(start()));
        let committed = Arc::new(MemoryBackend::new());
        let logger = Logger::builder()
            .backend(committed.clone())
            .backend(Arc::new(FlakyBackend::default()))
            .clock(clock.clone())
            .build();

        logger.info("a").unwrap();
        clock.advance(Duration::seconds(10));
        assert!(logger.info("b").unwrap_err().is_write_failure());

        clock.set(start() + Duration::seconds(5));
        let after = logger.info("c").unwrap().unwrap();
        assert_eq!(after.timestamp(), start() + Duration::seconds(10));

        let stored = committed.read_all().unwrap();
        assert_eq!(stored.len(), 3);
        assert!(stored.windows(2).all(|pair| pair[0].timestamp() <= pair[1].timestamp()));
    }

    #[test]
    fn test_no_backends_is_allowed() {
        let logger = Logger::new(Vec::new());
        assert!(logger.info("nowhere").unwrap().is_some());
        assert!(logger.backends().is_empty());
    }

    #[test]
    fn test_from_config() {
        let config = LoggerConfig {
            min_level: Level::Error,
            backends: vec![
                chronicle_storage::BackendConfig::Memory,
                chronicle_storage::BackendConfig::Memory,
            ],
        };

        let logger = Logger::from_config(&config).unwrap();
        assert_eq!(logger.backends().len(), 2);
        assert_eq!(logger.min_level(), Level::Error);
        assert!(logger.warning("filtered").unwrap().is_none());
    }
}
