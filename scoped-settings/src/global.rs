//! The process-wide default store.
//!
//! Built on first use from [`StoreConfig::from_env`]. The functions here act
//! on the calling thread's snapshot, exactly like the methods of
//! [`ScopedPropertyStore`].

use crate::ambient::EnvironmentSource;
use crate::config::StoreConfig;
use crate::store::{PropertyScope, ScopedPropertyStore};
use std::sync::LazyLock;
use std::thread::JoinHandle;

static GLOBAL_STORE: LazyLock<ScopedPropertyStore> = LazyLock::new(build_global_store);

fn build_global_store() -> ScopedPropertyStore {
    match StoreConfig::from_env().and_then(|config| ScopedPropertyStore::from_config(&config)) {
        Ok(store) => store,
        Err(err) => {
            tracing::warn!(
                error = %err,
                "Invalid scoped settings configuration, falling back to the environment"
            );
            ScopedPropertyStore::from_source(EnvironmentSource::new())
        }
    }
}

/// Returns the process-wide store.
pub fn store() -> &'static ScopedPropertyStore {
    &GLOBAL_STORE
}

/// Gets a value for the calling thread.
pub fn get(key: &str) -> Option<String> {
    store().get(key)
}

/// Gets a value for the calling thread, or `default`.
pub fn get_or(key: &str, default: &str) -> String {
    store().get_or(key, default)
}

/// Sets a value for the calling thread.
pub fn set(key: impl Into<String>, value: impl Into<String>) {
    store().set(key, value);
}

/// Removes a key for the calling thread.
pub fn clear(key: &str) {
    store().clear(key);
}

/// Discards the calling thread's snapshot.
pub fn reset() {
    store().reset();
}

/// Renders the calling thread's snapshot.
pub fn describe() -> String {
    store().describe()
}

/// Dumps the calling thread's snapshot at the configured level.
pub fn log_snapshot() {
    store().log_snapshot();
}

/// Spawns a thread that inherits the calling thread's snapshot.
pub fn spawn<F, T>(f: F) -> JoinHandle<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    store().spawn(f)
}
