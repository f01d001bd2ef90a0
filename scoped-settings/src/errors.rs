//! Error types for the scoped settings crate.
//!
//! Store operations themselves never fail: a missing key is an `Option`.
//! These errors cover the fallible edges around the store, such as loading
//! configuration, reading source files and spawning threads.

use thiserror::Error;

/// The main error type for scoped settings operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A configuration value could not be interpreted.
    #[error("{0}")]
    InvalidConfig(#[from] InvalidConfigError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A thread carrying an inherited snapshot could not be spawned.
    #[error("Failed to spawn thread: {0}")]
    Spawn(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for SettingsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Error raised when a configuration field holds an unsupported value.
#[derive(Debug, Clone, Error)]
#[error("Invalid value '{value}' for '{field}': {reason}")]
pub struct InvalidConfigError {
    /// The offending field or environment variable.
    pub field: String,
    /// The rejected value.
    pub value: String,
    /// Why the value was rejected.
    pub reason: String,
}

impl InvalidConfigError {
    /// Creates a new invalid config error.
    #[must_use]
    pub fn new(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_error_display() {
        let err = InvalidConfigError::new("ambient", "ldap", "unknown ambient source");
        assert_eq!(
            err.to_string(),
            "Invalid value 'ldap' for 'ambient': unknown ambient source"
        );
    }

    #[test]
    fn test_settings_error_from_invalid_config() {
        let err: SettingsError = InvalidConfigError::new("dump_level", "loud", "bad level").into();
        assert!(matches!(err, SettingsError::InvalidConfig(_)));
        assert!(err.to_string().contains("dump_level"));
    }

    #[test]
    fn test_settings_error_from_json() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: SettingsError = parse.into();
        assert!(matches!(err, SettingsError::Serialization(_)));
    }

    #[test]
    fn test_settings_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: SettingsError = io.into();
        assert!(err.to_string().starts_with("IO error"));
    }
}
