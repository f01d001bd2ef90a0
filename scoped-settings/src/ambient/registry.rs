//! A process-wide, host-managed property registry.

use super::AmbientSource;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

static GLOBAL_REGISTRY: LazyLock<Arc<PropertyRegistry>> =
    LazyLock::new(|| Arc::new(PropertyRegistry::new()));

/// A thread-safe key/value table owned by the host process.
///
/// The host mutates it freely; stores only ever read it, taking a full copy
/// when a snapshot is created. Snapshots that already exist never observe
/// later registry changes.
#[derive(Debug, Default)]
pub struct PropertyRegistry {
    entries: RwLock<HashMap<String, String>>,
}

impl PropertyRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry from key/value pairs.
    #[must_use]
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            entries: RwLock::new(
                pairs
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Returns the shared process-wide registry.
    #[must_use]
    pub fn global() -> Arc<Self> {
        GLOBAL_REGISTRY.clone()
    }

    /// Gets a value from the registry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    /// Sets a value, returning the previous one.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.write().insert(key.into(), value.into())
    }

    /// Removes a value, returning it if present.
    pub fn remove(&self, key: &str) -> Option<String> {
        self.entries.write().remove(key)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl AmbientSource for PropertyRegistry {
    fn load(&self) -> HashMap<String, String> {
        self.entries.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_set_and_get() {
        let registry = PropertyRegistry::new();
        assert_eq!(registry.set("lang", "en"), None);
        assert_eq!(registry.set("lang", "de"), Some("en".to_string()));

        assert_eq!(registry.get("lang"), Some("de".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_remove() {
        let registry = PropertyRegistry::from_pairs([("lang", "en")]);
        assert_eq!(registry.remove("lang"), Some("en".to_string()));
        assert_eq!(registry.remove("lang"), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registry_load_is_point_in_time() {
        let registry = PropertyRegistry::from_pairs([("lang", "en")]);
        let copy = registry.load();

        registry.set("lang", "fr");
        registry.set("extra", "1");

        assert_eq!(copy.get("lang"), Some(&"en".to_string()));
        assert!(!copy.contains_key("extra"));
    }

    #[test]
    fn test_global_registry_is_shared() {
        let a = PropertyRegistry::global();
        let b = PropertyRegistry::global();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
