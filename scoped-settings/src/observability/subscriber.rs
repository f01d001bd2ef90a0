//! Tracing subscriber setup for hosts and tests.

use crate::errors::{InvalidConfigError, SettingsError};
use tracing_subscriber::EnvFilter;

/// Installs a human-readable global subscriber filtered by `filter`
/// (e.g. `"scoped_settings=debug"`).
///
/// # Errors
///
/// Returns `InvalidConfig` if the filter does not parse or a global
/// subscriber is already installed.
pub fn init_tracing(filter: &str) -> Result<(), SettingsError> {
    tracing_subscriber::fmt()
        .with_env_filter(parse_filter(filter)?)
        .try_init()
        .map_err(|e| InvalidConfigError::new("tracing", filter, e.to_string()).into())
}

/// Installs a JSON-formatted global subscriber filtered by `filter`.
///
/// # Errors
///
/// As [`init_tracing`].
pub fn init_json_tracing(filter: &str) -> Result<(), SettingsError> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(parse_filter(filter)?)
        .try_init()
        .map_err(|e| InvalidConfigError::new("tracing", filter, e.to_string()).into())
}

fn parse_filter(filter: &str) -> Result<EnvFilter, InvalidConfigError> {
    EnvFilter::try_new(filter).map_err(|e| InvalidConfigError::new("tracing", filter, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter() {
        assert!(parse_filter("scoped_settings=debug").is_ok());
        assert!(parse_filter("scoped_settings=verbose").is_err());
    }

    #[test]
    fn test_init_tracing_twice_fails() {
        // Whichever call installs first wins; the second must report an error.
        let first = init_tracing("warn");
        let second = init_json_tracing("warn");
        assert!(first.is_err() || second.is_err());
    }
}
