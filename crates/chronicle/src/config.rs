//! Configuration types for the writer

use std::path::Path;

use chronicle_core::Level;
use chronicle_storage::{BackendConfig, StorageError};
use serde::{Deserialize, Serialize};

/// Main writer configuration
///
/// ```json
/// {
///   "min_level": "INFO",
///   "backends": [
///     { "kind": "csv", "path": "./logs/app.csv" },
///     { "kind": "sqlite", "path": "./logs/app.db" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Entries below this level are not written
    #[serde(default = "default_min_level")]
    pub min_level: Level,

    /// Backends in fan-out order
    #[serde(default)]
    pub backends: Vec<BackendConfig>,
}

fn default_min_level() -> Level {
    Level::Debug
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: default_min_level(),
            backends: Vec::new(),
        }
    }
}

impl LoggerConfig {
    /// Create a config for development (everything, kept in memory)
    pub fn development() -> Self {
        Self {
            min_level: Level::Debug,
            backends: vec![BackendConfig::Memory],
        }
    }

    /// Parse a config from JSON text
    pub fn from_json_str(json: &str) -> Result<Self, StorageError> {
        serde_json::from_str(json).map_err(|e| StorageError::configuration("<inline config>", e))
    }

    /// Read and parse a JSON config file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let location = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|e| StorageError::configuration(&location, e))?;
        serde_json::from_str(&text).map_err(|e| StorageError::configuration(&location, e))
    }

    /// Add a backend to the end of the fan-out list
    pub fn with_backend(mut self, backend: BackendConfig) -> Self {
        self.backends.push(backend);
        self
    }
}
