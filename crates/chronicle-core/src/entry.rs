//! The log entry value type and its canonical text form

use chrono::{Datelike, DateTime, SecondsFormat, SubsecRound, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EntryError;
use crate::level::Level;

/// Number of fractional-second digits kept in every timestamp
const TIMESTAMP_PRECISION: u16 = 6;

/// One logged event
///
/// A `LogEntry` is immutable once constructed. Its timestamp is UTC,
/// truncated to microseconds at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// When the event was logged
    #[serde(with = "canonical_timestamp")]
    timestamp: DateTime<Utc>,
    /// Severity
    level: Level,
    /// Free-form message text
    message: String,
}

impl LogEntry {
    /// Create an entry stamped with the current system time
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self::with_timestamp(Utc::now(), level, message)
    }

    /// Create an entry for a known instant
    pub fn with_timestamp(timestamp: DateTime<Utc>, level: Level, message: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.trunc_subsecs(TIMESTAMP_PRECISION),
            level,
            message: message.into(),
        }
    }

    /// Timestamp of the event
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Severity of the event
    pub fn level(&self) -> Level {
        self.level
    }

    /// Message text
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Canonical display line: `<timestamp> <LEVEL> <message>`
    pub fn format(&self) -> String {
        self.to_string()
    }

    /// Parse a canonical display line
    ///
    /// The message is everything after the second space, verbatim, so it
    /// may itself contain spaces or be empty.
    pub fn parse_line(line: &str) -> Result<Self, EntryError> {
        let mut parts = line.splitn(3, ' ');
        let (Some(timestamp), Some(level), Some(message)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(EntryError::malformed_line(line));
        };

        Ok(Self {
            timestamp: parse_timestamp(timestamp)?,
            level: level.parse()?,
            message: message.to_string(),
        })
    }
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}",
            format_timestamp(&self.timestamp),
            self.level,
            self.message
        )
    }
}

impl std::str::FromStr for LogEntry {
    type Err = EntryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_line(s)
    }
}

/// Render a timestamp in canonical form, e.g. `2024-03-01T12:00:00.000000Z`
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Render a timestamp for storage, rejecting values that cannot be read back
///
/// RFC 3339 only has four-digit years, so instants outside years 0001 to
/// 9999 fail here instead of producing text [`parse_timestamp`] rejects.
pub fn encode_timestamp(timestamp: &DateTime<Utc>) -> Result<String, EntryError> {
    if !(1..=9999).contains(&timestamp.year()) {
        return Err(EntryError::invalid_timestamp(
            format_timestamp(timestamp),
            "year outside 0001-9999",
        ));
    }
    Ok(format_timestamp(timestamp))
}

/// Parse an RFC 3339 timestamp into UTC
///
/// Any offset is accepted and normalized to UTC. Values carrying
/// sub-microsecond digits are rejected because they cannot be stored
/// without losing precision.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, EntryError> {
    let parsed = DateTime::parse_from_rfc3339(text)
        .map_err(|e| EntryError::invalid_timestamp(text, e.to_string()))?
        .with_timezone(&Utc);

    if parsed.nanosecond() % 1_000 != 0 {
        return Err(EntryError::invalid_timestamp(
            text,
            "precision finer than microseconds",
        ));
    }

    Ok(parsed)
}

/// serde adapter storing timestamps in canonical text form
mod canonical_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        let text = super::encode_timestamp(value).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_timestamp(&text).map_err(serde::de::Error::custom)
    }
}
