//! Error types for chronicle-storage
//!
//! Every variant names the medium it came from so a caller fanning out to
//! several backends can tell which one failed.

use thiserror::Error;

/// Errors that can occur in storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend was constructed with an unusable location
    #[error("Configuration error for {location}: {reason}")]
    Configuration { location: String, reason: String },

    /// The medium rejected or could not complete an append
    #[error("Write failed on {location}: {reason}")]
    Write { location: String, reason: String },

    /// A stored record could not be decoded into a valid entry
    #[error("Decode error in {location} at record {record}: {reason}")]
    Decode {
        location: String,
        /// Zero-based position of the offending record in append order
        record: usize,
        reason: String,
    },

    /// The medium could not be read at all
    #[error("Read failed on {location}: {reason}")]
    Read { location: String, reason: String },
}

impl StorageError {
    /// Create a new Configuration error
    pub fn configuration(location: impl Into<String>, reason: impl ToString) -> Self {
        Self::Configuration {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a new Write error
    pub fn write(location: impl Into<String>, reason: impl ToString) -> Self {
        Self::Write {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a new Decode error
    pub fn decode(location: impl Into<String>, record: usize, reason: impl ToString) -> Self {
        Self::Decode {
            location: location.into(),
            record,
            reason: reason.to_string(),
        }
    }

    /// Create a new Read error
    pub fn read(location: impl Into<String>, reason: impl ToString) -> Self {
        Self::Read {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Whether this is a write failure
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Write { .. })
    }

    /// Whether this is a decode error
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// The medium location the error refers to
    pub fn location(&self) -> &str {
        match self {
            Self::Configuration { location, .. }
            | Self::Write { location, .. }
            | Self::Decode { location, .. }
            | Self::Read { location, .. } => location,
        }
    }
}
