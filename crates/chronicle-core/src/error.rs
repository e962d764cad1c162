//! Error types for chronicle-core

use thiserror::Error;

/// Errors raised while decoding a [`crate::LogEntry`] or one of its fields
/// from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    /// The level token is not one of the five known levels
    #[error("Unknown log level: {0:?}")]
    UnknownLevel(String),

    /// The timestamp text is not a valid canonical timestamp
    #[error("Invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },

    /// A text line does not have the `<timestamp> <LEVEL> <message>` shape
    #[error("Malformed log line: {0:?}")]
    MalformedLine(String),
}

impl EntryError {
    /// Create a new UnknownLevel error
    pub fn unknown_level(token: impl Into<String>) -> Self {
        Self::UnknownLevel(token.into())
    }

    /// Create a new InvalidTimestamp error
    pub fn invalid_timestamp(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTimestamp {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a new MalformedLine error
    pub fn malformed_line(line: impl Into<String>) -> Self {
        Self::MalformedLine(line.into())
    }
}
