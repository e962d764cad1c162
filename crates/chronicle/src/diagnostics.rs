//! Process diagnostics for applications embedding Chronicle
//!
//! Chronicle's own operational events (backends opened, appends, decode
//! failures) go through `tracing`. The library never installs a
//! subscriber; an application that wants to see those events can use
//! [`DiagnosticsBuilder`]:
//!
//! ```ignore
//! use chronicle::diagnostics::{DiagnosticsBuilder, DiagnosticsConfig};
//!
//! // JSONL to stderr at "info" (RUST_LOG overrides)
//! DiagnosticsBuilder::new().try_init()?;
//!
//! // Human-readable output while developing
//! DiagnosticsBuilder::new()
//!     .with_config(DiagnosticsConfig::development())
//!     .try_init()?;
//! ```

use serde::{Deserialize, Serialize};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Diagnostics output configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    /// Default filter directive (overridden by `RUST_LOG`)
    pub default_level: String,
    /// Use pretty (human-readable) format instead of JSONL
    pub pretty: bool,
    /// Include ANSI colors in pretty output
    pub ansi: bool,
    /// Include source file and line number
    pub include_location: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            pretty: false,
            ansi: false,
            include_location: false,
        }
    }
}

impl DiagnosticsConfig {
    /// Verbose, human-readable output
    pub fn development() -> Self {
        Self {
            default_level: "debug".to_string(),
            pretty: true,
            ansi: true,
            include_location: true,
        }
    }

    /// Minimal output for test runs
    pub fn testing() -> Self {
        Self {
            default_level: "warn".to_string(),
            ..Self::default()
        }
    }
}

/// Builder for the global diagnostics subscriber
#[derive(Debug, Default)]
pub struct DiagnosticsBuilder {
    config: DiagnosticsConfig,
}

impl DiagnosticsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific configuration
    pub fn with_config(mut self, config: DiagnosticsConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the default filter directive
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.default_level = level.into();
        self
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.config.default_level))
    }

    /// Install the subscriber globally
    ///
    /// # Errors
    ///
    /// Fails if a global subscriber has already been set.
    pub fn try_init(self) -> Result<(), TryInitError> {
        let registry = Registry::default().with(self.env_filter());
        let location = self.config.include_location;

        if self.config.pretty {
            let layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_ansi(self.config.ansi)
                .with_file(location)
                .with_line_number(location)
                .with_writer(std::io::stderr);
            registry.with(layer).try_init()
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_file(location)
                .with_line_number(location)
                .with_writer(std::io::stderr);
            registry.with(layer).try_init()
        }
    }
}

/// Install the testing configuration, ignoring an already-set subscriber
pub fn init_testing() {
    let _ = DiagnosticsBuilder::new()
        .with_config(DiagnosticsConfig::testing())
        .try_init();
}
