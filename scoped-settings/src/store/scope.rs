//! The operations every settings scope supports.

use super::PropertySnapshot;
use crate::observability::DiagnosticSink;
use std::collections::HashMap;

/// Trait unifying thread-bound stores and explicit context handles.
///
/// Every operation acts on the calling context's private snapshot and creates
/// it first if the context has none yet. None of them touch the ambient
/// source beyond that one seeding read.
pub trait PropertyScope {
    /// Runs `f` against the calling context's snapshot, creating it if absent.
    ///
    /// # Panics
    ///
    /// `f` must not call back into the same scope. For a
    /// [`super::ContextGuard`] this covers every context of the same
    /// [`super::ContextTable`], including `fork()` on the parent: `f` runs
    /// under the table's shard lock and such a call deadlocks. Copy what you
    /// need out of `f` first.
    fn with_snapshot<R>(&self, f: impl FnOnce(&mut PropertySnapshot) -> R) -> R;

    /// Discards the calling context's snapshot.
    ///
    /// The next access seeds a fresh snapshot from the ambient source; any
    /// inherited contents are gone.
    fn reset(&self);

    /// Returns true if the calling context has a snapshot. Never creates one.
    fn is_initialized(&self) -> bool;

    /// Gets a value.
    fn get(&self, key: &str) -> Option<String> {
        self.with_snapshot(|s| s.get(key).map(str::to_owned))
    }

    /// Gets a value, falling back to `default` when the key is absent.
    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_owned())
    }

    /// Sets a value for this context only.
    fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.with_snapshot(|s| {
            s.insert(key, value);
        });
    }

    /// Removes a key. Removing an absent key is a no-op.
    fn clear(&self, key: &str) {
        self.with_snapshot(|s| {
            s.remove(key);
        });
    }

    /// Checks if a key exists.
    fn contains(&self, key: &str) -> bool {
        self.with_snapshot(|s| s.contains_key(key))
    }

    /// Returns all keys in order.
    fn keys(&self) -> Vec<String> {
        self.with_snapshot(|s| s.keys())
    }

    /// Returns a copy of all entries.
    fn to_map(&self) -> HashMap<String, String> {
        self.with_snapshot(|s| s.to_map())
    }

    /// Renders a human-readable listing of the snapshot.
    ///
    /// The cost grows with the snapshot; gate calls behind a verbosity check.
    fn describe(&self) -> String {
        self.with_snapshot(|s| s.describe())
    }

    /// Writes the listing to `sink` if the sink is enabled.
    fn log_to(&self, sink: &dyn DiagnosticSink) {
        if sink.enabled() {
            sink.write(&self.describe());
        }
    }
}
