//! Configuration for building stores.

use crate::ambient::{AmbientSource, EnvironmentSource, PropertyRegistry, StaticSource};
use crate::errors::{InvalidConfigError, SettingsError};
use crate::observability::{DiagnosticSink, LoggingDiagnosticSink};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// Environment variable selecting the ambient source.
pub const AMBIENT_ENV: &str = "SCOPED_SETTINGS_AMBIENT";

/// Environment variable selecting the level of snapshot dumps.
pub const DUMP_LEVEL_ENV: &str = "SCOPED_SETTINGS_DUMP_LEVEL";

/// Which ambient source a store seeds snapshots from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbientKind {
    /// The process environment.
    #[default]
    Environment,
    /// The process-wide [`PropertyRegistry`].
    Registry,
    /// No ambient configuration; snapshots start empty.
    Empty,
}

impl AmbientKind {
    /// Builds the source this kind names.
    #[must_use]
    pub fn source(self) -> Arc<dyn AmbientSource> {
        match self {
            Self::Environment => Arc::new(EnvironmentSource::new()),
            Self::Registry => PropertyRegistry::global(),
            Self::Empty => Arc::new(StaticSource::new()),
        }
    }
}

impl FromStr for AmbientKind {
    type Err = InvalidConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "environment" | "env" => Ok(Self::Environment),
            "registry" => Ok(Self::Registry),
            "empty" | "none" => Ok(Self::Empty),
            _ => Err(InvalidConfigError::new(
                "ambient",
                s,
                "expected one of: environment, registry, empty",
            )),
        }
    }
}

/// Configuration for a [`crate::store::ScopedPropertyStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Source that fresh snapshots are seeded from.
    #[serde(default)]
    pub ambient: AmbientKind,
    /// Tracing level used when dumping snapshots.
    #[serde(default = "default_dump_level")]
    pub dump_level: String,
}

fn default_dump_level() -> String {
    "debug".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ambient: AmbientKind::default(),
            dump_level: default_dump_level(),
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the ambient source.
    #[must_use]
    pub fn with_ambient(mut self, ambient: AmbientKind) -> Self {
        self.ambient = ambient;
        self
    }

    /// Sets the dump level.
    #[must_use]
    pub fn with_dump_level(mut self, level: impl Into<String>) -> Self {
        self.dump_level = level.into();
        self
    }

    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` for malformed JSON and `InvalidConfig` for
    /// unsupported values.
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads overrides from the process environment on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a variable holds an unsupported value.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads overrides through `lookup` on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a variable holds an unsupported value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let mut config = Self::default();

        if let Some(ambient) = lookup(AMBIENT_ENV) {
            config.ambient = ambient.parse()?;
        }
        if let Some(level) = lookup(DUMP_LEVEL_ENV) {
            config.dump_level = level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the dump level is not a tracing level.
    pub fn validate(&self) -> Result<(), SettingsError> {
        LoggingDiagnosticSink::from_level_name(&self.dump_level)?;
        Ok(())
    }

    /// Builds the diagnostic sink for the configured dump level.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the dump level is not a tracing level.
    pub fn diagnostic_sink(&self) -> Result<Arc<dyn DiagnosticSink>, SettingsError> {
        Ok(Arc::new(LoggingDiagnosticSink::from_level_name(&self.dump_level)?))
    }
}
