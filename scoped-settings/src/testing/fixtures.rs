//! Test fixtures for settings stores.

use std::sync::Arc;

use crate::ambient::PropertyRegistry;
use crate::observability::CollectingDiagnosticSink;
use crate::store::{ContextTable, ScopedPropertyStore};

/// A store wired to a private registry and a collecting diagnostic sink.
pub struct StoreFixture {
    /// The ambient configuration seen by fresh snapshots.
    pub registry: Arc<PropertyRegistry>,
    /// Receives snapshot dumps.
    pub sink: Arc<CollectingDiagnosticSink>,
    /// The store under test.
    pub store: Arc<ScopedPropertyStore>,
}

impl StoreFixture {
    /// Creates a fixture with an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ambient(std::iter::empty::<(String, String)>())
    }

    /// Creates a fixture whose registry starts with `pairs`.
    #[must_use]
    pub fn with_ambient<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let registry = Arc::new(PropertyRegistry::from_pairs(pairs));
        let sink = Arc::new(CollectingDiagnosticSink::new());
        let store = Arc::new(
            ScopedPropertyStore::new(registry.clone()).with_diagnostic_sink(sink.clone()),
        );

        Self {
            registry,
            sink,
            store,
        }
    }

    /// Returns a handle to the store for moving into spawned threads.
    #[must_use]
    pub fn store(&self) -> Arc<ScopedPropertyStore> {
        Arc::clone(&self.store)
    }

    /// Creates a context table over the same registry.
    #[must_use]
    pub fn context_table(&self) -> Arc<ContextTable> {
        ContextTable::new(self.registry.clone())
    }
}

impl Default for StoreFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::PropertyScope;

    #[test]
    fn test_fixture_seeds_from_registry() {
        let fixture = StoreFixture::with_ambient([("lang", "en")]);
        assert_eq!(fixture.store.get("lang"), Some("en".to_string()));
    }

    #[test]
    fn test_fixture_log_snapshot_collects() {
        let fixture = StoreFixture::with_ambient([("lang", "en")]);
        fixture.store.log_snapshot();

        assert_eq!(
            fixture.sink.listings(),
            vec!["-- listing properties --\nlang=en\n".to_string()]
        );
    }

    #[test]
    fn test_fixture_context_table_shares_registry() {
        let fixture = StoreFixture::new();
        fixture.registry.set("lang", "en");

        let ctx = fixture.context_table().enter();
        assert_eq!(ctx.get("lang"), Some("en".to_string()));
    }
}
