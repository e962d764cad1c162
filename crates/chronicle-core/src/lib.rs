//! # Chronicle Core
//!
//! Core types shared by every Chronicle crate.
//!
//! ## Key Types
//!
//! - [`Level`]: Ordered severity enumeration (`DEBUG` through `CRITICAL`)
//! - [`LogEntry`]: Immutable record of one logged event
//! - [`Clock`]: Time abstraction so writers can be driven deterministically in tests
//! - [`EntryError`]: Failures when decoding entries from their stored text form
//!
//! ## Canonical Line Format
//!
//! ```text
//! <ISO-8601 timestamp> <LEVEL> <message>
//! 2024-03-01T12:00:00.000000Z INFO Application started
//! ```
//!
//! Timestamps are kept in UTC at microsecond precision. Precision is fixed once,
//! when the entry is constructed, so every storage medium can reproduce the
//! exact value on read.

pub mod clock;
pub mod entry;
pub mod error;
pub mod level;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{LogEntry, encode_timestamp, format_timestamp, parse_timestamp};
pub use error::EntryError;
pub use level::Level;
