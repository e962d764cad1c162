//! Query engine over one storage backend
//!
//! Every query materializes the full entry set with
//! [`Backend::read_all`] and then applies a pure function from
//! [`crate::query`]. Filters are never pushed down into a medium, so the
//! same entries give the same answer whatever backend stores them.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use chronicle_core::{Level, LogEntry};
use chronicle_storage::{Backend, StorageError};
use regex::Regex;
use tracing::{debug, instrument};

use crate::error::QueryError;
use crate::query::{self, TimeWindow, YearMonth};

/// Read-only query interface over a [`Backend`]
#[derive(Clone)]
pub struct Reader {
    backend: Arc<dyn Backend>,
}

impl Reader {
    /// Create a reader over `backend`
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// The backend this reader queries
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Every stored entry, in append order
    pub fn entries(&self) -> Result<Vec<LogEntry>, StorageError> {
        let entries = self.backend.read_all()?;
        debug!(backend = %self.backend.describe(), count = entries.len(), "Materialized entries");
        Ok(entries)
    }

    fn entries_within(&self, window: &TimeWindow) -> Result<Vec<LogEntry>, QueryError> {
        Ok(query::filter_window(self.entries()?, window))
    }

    /// Entries whose message contains `text`
    pub fn find_by_text(&self, text: &str) -> Result<Vec<LogEntry>, QueryError> {
        self.find_by_text_within(text, &TimeWindow::unbounded())
    }

    /// [`find_by_text`](Self::find_by_text) restricted to `window`
    #[instrument(skip_all)]
    pub fn find_by_text_within(&self, text: &str, window: &TimeWindow) -> Result<Vec<LogEntry>, QueryError> {
        let found = query::filter_text(self.entries_within(window)?, text);
        debug!(matches = found.len(), "Text search complete");
        Ok(found)
    }

    /// Entries whose message matches `pattern` anywhere
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Pattern`] before reading the backend if
    /// `pattern` does not compile.
    pub fn find_by_regex(&self, pattern: &str) -> Result<Vec<LogEntry>, QueryError> {
        self.find_by_regex_within(pattern, &TimeWindow::unbounded())
    }

    /// [`find_by_regex`](Self::find_by_regex) restricted to `window`
    #[instrument(skip_all, fields(pattern = %pattern))]
    pub fn find_by_regex_within(&self, pattern: &str, window: &TimeWindow) -> Result<Vec<LogEntry>, QueryError> {
        let regex = Regex::new(pattern)?;
        let found = query::filter_regex(self.entries_within(window)?, &regex);
        debug!(matches = found.len(), "Regex search complete");
        Ok(found)
    }

    /// Entries with `start <= timestamp <= end`; empty when `start > end`
    pub fn find_by_date_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<LogEntry>, QueryError> {
        if start > end {
            return Ok(Vec::new());
        }
        Ok(query::filter_range(self.entries()?, start, end))
    }

    /// Entries grouped by level
    pub fn group_by_level(&self) -> Result<BTreeMap<Level, Vec<LogEntry>>, QueryError> {
        self.group_by_level_within(&TimeWindow::unbounded())
    }

    pub fn group_by_level_within(&self, window: &TimeWindow) -> Result<BTreeMap<Level, Vec<LogEntry>>, QueryError> {
        Ok(query::group_by_level(self.entries_within(window)?))
    }

    /// Entries grouped by UTC calendar month
    pub fn group_by_month(&self) -> Result<BTreeMap<YearMonth, Vec<LogEntry>>, QueryError> {
        self.group_by_month_within(&TimeWindow::unbounded())
    }

    pub fn group_by_month_within(
        &self,
        window: &TimeWindow,
    ) -> Result<BTreeMap<YearMonth, Vec<LogEntry>>, QueryError> {
        Ok(query::group_by_month(self.entries_within(window)?))
    }
}

impl std::fmt::Debug for Reader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reader")
            .field("backend", &self.backend.describe())
            .finish()
    }
}
