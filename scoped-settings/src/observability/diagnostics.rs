//! Diagnostic sinks that receive snapshot listings.

use crate::errors::InvalidConfigError;
use parking_lot::RwLock;
use std::str::FromStr;
use tracing::{debug, error, info, trace, warn, Level};

/// Receives snapshot listings for diagnostic output.
///
/// Listings cost time proportional to the snapshot, so callers ask
/// [`DiagnosticSink::enabled`] before building one.
pub trait DiagnosticSink: Send + Sync {
    /// Returns true if listings would be recorded.
    fn enabled(&self) -> bool;

    /// Records a listing.
    fn write(&self, listing: &str);
}

/// A sink that discards all listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpDiagnosticSink;

impl DiagnosticSink for NoOpDiagnosticSink {
    fn enabled(&self) -> bool {
        false
    }

    fn write(&self, _listing: &str) {
        // Intentionally empty - discards all listings
    }
}

/// A sink that logs listings through the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingDiagnosticSink {
    /// The log level to use.
    level: Level,
}

impl Default for LoggingDiagnosticSink {
    fn default() -> Self {
        Self::debug()
    }
}

impl LoggingDiagnosticSink {
    /// Creates a new logging sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    /// Parses a level name such as `"debug"` or `"INFO"`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfigError` if the name is not a tracing level.
    pub fn from_level_name(name: &str) -> Result<Self, InvalidConfigError> {
        Level::from_str(name)
            .map(Self::new)
            .map_err(|e| InvalidConfigError::new("dump_level", name, e.to_string()))
    }

    /// Returns the log level.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }
}

impl DiagnosticSink for LoggingDiagnosticSink {
    fn enabled(&self) -> bool {
        match self.level {
            Level::TRACE => tracing::enabled!(Level::TRACE),
            Level::DEBUG => tracing::enabled!(Level::DEBUG),
            Level::INFO => tracing::enabled!(Level::INFO),
            Level::WARN => tracing::enabled!(Level::WARN),
            _ => tracing::enabled!(Level::ERROR),
        }
    }

    fn write(&self, listing: &str) {
        match self.level {
            Level::TRACE => trace!("Scoped settings: {}", listing),
            Level::DEBUG => debug!("Scoped settings: {}", listing),
            Level::INFO => info!("Scoped settings: {}", listing),
            Level::WARN => warn!("Scoped settings: {}", listing),
            _ => error!("Scoped settings: {}", listing),
        }
    }
}

/// A collecting sink for testing purposes.
#[derive(Debug)]
pub struct CollectingDiagnosticSink {
    enabled: bool,
    listings: RwLock<Vec<String>>,
}

impl Default for CollectingDiagnosticSink {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectingDiagnosticSink {
    /// Creates a new, enabled collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled: true,
            listings: RwLock::new(Vec::new()),
        }
    }

    /// Creates a collecting sink that reports itself disabled.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            listings: RwLock::new(Vec::new()),
        }
    }

    /// Returns all collected listings.
    #[must_use]
    pub fn listings(&self) -> Vec<String> {
        self.listings.read().clone()
    }

    /// Returns the number of collected listings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listings.read().len()
    }

    /// Returns true if nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listings.read().is_empty()
    }

    /// Clears all collected listings.
    pub fn clear(&self) {
        self.listings.write().clear();
    }
}

impl DiagnosticSink for CollectingDiagnosticSink {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn write(&self, listing: &str) {
        self.listings.write().push(listing.to_string());
    }
}
