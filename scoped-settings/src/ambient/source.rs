//! The ambient source trait and its basic implementations.

use crate::errors::{InvalidConfigError, SettingsError};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// A read-only, process-wide source of configuration.
///
/// `load` returns an independent copy of every key/value pair currently
/// present. Stores call it exactly once per snapshot creation, possibly from
/// many threads at once.
#[cfg_attr(test, mockall::automock)]
pub trait AmbientSource: Send + Sync {
    /// Returns a copy of the full current key/value set.
    fn load(&self) -> HashMap<String, String>;
}

impl<T: AmbientSource + ?Sized> AmbientSource for Arc<T> {
    fn load(&self) -> HashMap<String, String> {
        (**self).load()
    }
}

/// Reads the process environment.
///
/// Names or values that are not valid UTF-8 are converted lossily.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentSource;

impl EnvironmentSource {
    /// Creates a new environment source.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl AmbientSource for EnvironmentSource {
    fn load(&self) -> HashMap<String, String> {
        std::env::vars_os()
            .map(|(k, v)| {
                (
                    k.to_string_lossy().into_owned(),
                    v.to_string_lossy().into_owned(),
                )
            })
            .collect()
    }
}

/// A fixed set of properties.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    entries: HashMap<String, String>,
}

impl StaticSource {
    /// Creates an empty static source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a static source from key/value pairs.
    #[must_use]
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Adds a property.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Parses a JSON object into a static source.
    ///
    /// String values are taken as-is; other scalars use their JSON text
    /// (`8`, `true`, `null`).
    ///
    /// # Errors
    ///
    /// Returns `Serialization` for malformed JSON and `InvalidConfig` when the
    /// document is not an object or holds nested arrays/objects.
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let map = match value {
            serde_json::Value::Object(map) => map,
            other => {
                return Err(InvalidConfigError::new(
                    "source",
                    json_kind(&other),
                    "expected a JSON object",
                )
                .into());
            }
        };

        let mut entries = HashMap::with_capacity(map.len());
        for (key, value) in map {
            let text = match value {
                serde_json::Value::String(s) => s,
                nested @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
                    return Err(InvalidConfigError::new(
                        key,
                        json_kind(&nested),
                        "property values must be scalars",
                    )
                    .into());
                }
                other => other.to_string(),
            };
            entries.insert(key, text);
        }

        Ok(Self { entries })
    }

    /// Reads a JSON object file into a static source.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, otherwise as
    /// [`StaticSource::from_json_str`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let source = Self::from_json_str(&text)?;
        tracing::debug!(
            path = %path.display(),
            entries = source.len(),
            "Loaded static ambient source"
        );
        Ok(source)
    }

    /// Returns the number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl AmbientSource for StaticSource {
    fn load(&self) -> HashMap<String, String> {
        self.entries.clone()
    }
}

/// Stacks several sources; later layers override earlier ones.
#[derive(Clone, Default)]
pub struct LayeredSource {
    layers: Vec<Arc<dyn AmbientSource>>,
}

impl LayeredSource {
    /// Creates a source with no layers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a layer on top of the existing ones.
    #[must_use]
    pub fn with_layer(mut self, layer: Arc<dyn AmbientSource>) -> Self {
        self.layers.push(layer);
        self
    }

    /// Returns the number of layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns true if there are no layers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl std::fmt::Debug for LayeredSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayeredSource")
            .field("layers", &self.layers.len())
            .finish()
    }
}

impl AmbientSource for LayeredSource {
    fn load(&self) -> HashMap<String, String> {
        let mut merged = HashMap::new();
        for layer in &self.layers {
            merged.extend(layer.load());
        }
        merged
    }
}
