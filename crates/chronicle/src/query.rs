//! Backend-agnostic filters and groupings
//!
//! Every function here works on decoded [`LogEntry`] values only, never on
//! a medium's native representation. That is what makes query results
//! identical across backends. Filters keep the input order; groupings keep
//! the input order inside each group.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use chronicle_core::{Level, LogEntry};
use regex::Regex;

/// Optional inclusive time bounds applied before a query
///
/// A missing bound is open. A window whose start lies after its end matches
/// nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    /// Window with no bounds
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Window covering `start..=end`
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Window from `start` onwards
    pub fn since(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    /// Window up to and including `end`
    pub fn until(end: DateTime<Utc>) -> Self {
        Self {
            start: None,
            end: Some(end),
        }
    }

    /// Whether `timestamp` falls inside the window
    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| start <= *timestamp) && self.end.is_none_or(|end| *timestamp <= end)
    }
}

/// Calendar month in UTC, used as the [`group_by_month`] key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    /// 1 to 12
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Month containing `timestamp`
    pub fn of(timestamp: &DateTime<Utc>) -> Self {
        Self {
            year: timestamp.year(),
            month: timestamp.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Entries whose message contains `needle` (case-sensitive, literal)
pub fn filter_text(entries: impl IntoIterator<Item = LogEntry>, needle: &str) -> Vec<LogEntry> {
    entries
        .into_iter()
        .filter(|entry| entry.message().contains(needle))
        .collect()
}

/// Entries whose message has a match for `pattern` anywhere
pub fn filter_regex(entries: impl IntoIterator<Item = LogEntry>, pattern: &Regex) -> Vec<LogEntry> {
    entries
        .into_iter()
        .filter(|entry| pattern.is_match(entry.message()))
        .collect()
}

/// Entries with `start <= timestamp <= end`
///
/// An inverted range yields no entries.
pub fn filter_range(
    entries: impl IntoIterator<Item = LogEntry>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<LogEntry> {
    filter_window(entries, &TimeWindow::between(start, end))
}

/// Entries inside `window`
pub fn filter_window(entries: impl IntoIterator<Item = LogEntry>, window: &TimeWindow) -> Vec<LogEntry> {
    if let (Some(start), Some(end)) = (window.start, window.end)
        && start > end
    {
        return Vec::new();
    }

    entries
        .into_iter()
        .filter(|entry| window.contains(&entry.timestamp()))
        .collect()
}

/// Partition entries by level; levels without entries are absent
pub fn group_by_level(entries: impl IntoIterator<Item = LogEntry>) -> BTreeMap<Level, Vec<LogEntry>> {
    let mut groups: BTreeMap<Level, Vec<LogEntry>> = BTreeMap::new();
    for entry in entries {
        groups.entry(entry.level()).or_default().push(entry);
    }
    groups
}

/// Partition entries by the UTC calendar month of their timestamp
pub fn group_by_month(entries: impl IntoIterator<Item = LogEntry>) -> BTreeMap<YearMonth, Vec<LogEntry>> {
    let mut groups: BTreeMap<YearMonth, Vec<LogEntry>> = BTreeMap::new();
    for entry in entries {
        groups.entry(YearMonth::of(&entry.timestamp())).or_default().push(entry);
    }
    groups
}
