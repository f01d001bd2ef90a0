//! Settings bound to explicit context handles.
//!
//! Async tasks hop between worker threads, so thread-local snapshots do not
//! follow them. A [`ContextTable`] keys snapshots by [`ContextId`] instead,
//! and each [`ContextGuard`] owns one entry for as long as it lives.

use super::{PropertyScope, PropertySnapshot};
use crate::ambient::AmbientSource;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Identifies one execution context in a [`ContextTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(Uuid);

impl ContextId {
    /// Creates a new random context id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A table of per-context snapshots keyed by explicit handles.
///
/// The map is sharded, so operations on unrelated contexts do not contend on
/// a single lock.
pub struct ContextTable {
    source: Arc<dyn AmbientSource>,
    snapshots: DashMap<ContextId, PropertySnapshot>,
}

impl ContextTable {
    /// Creates a table reading from `source`.
    #[must_use]
    pub fn new(source: Arc<dyn AmbientSource>) -> Arc<Self> {
        Arc::new(Self {
            source,
            snapshots: DashMap::new(),
        })
    }

    /// Opens a new, uninitialized context.
    #[must_use]
    pub fn enter(self: &Arc<Self>) -> ContextGuard {
        ContextGuard {
            table: Arc::clone(self),
            id: ContextId::new(),
        }
    }

    /// Returns the number of contexts that currently hold a snapshot.
    #[must_use]
    pub fn live_snapshots(&self) -> usize {
        self.snapshots.len()
    }

    fn seed(&self, id: ContextId) -> PropertySnapshot {
        let snapshot = PropertySnapshot::seeded(self.source.load());
        tracing::trace!(
            context_id = %id,
            origin = %snapshot.origin(),
            entries = snapshot.len(),
            "Created settings snapshot"
        );
        snapshot
    }
}

impl std::fmt::Debug for ContextTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextTable")
            .field("live_snapshots", &self.snapshots.len())
            .finish_non_exhaustive()
    }
}

/// Owns one context's entry in a [`ContextTable`].
///
/// Dropping the guard releases the snapshot. Guards are `Send`, so a task
/// can carry its settings across `.await` points and worker threads.
pub struct ContextGuard {
    table: Arc<ContextTable>,
    id: ContextId,
}

impl ContextGuard {
    /// Returns the context id.
    #[must_use]
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Opens a child context seeded from a point-in-time copy of this
    /// context's snapshot.
    ///
    /// If this context has no snapshot yet, the child starts uninitialized
    /// and will seed from the ambient source.
    #[must_use]
    pub fn fork(&self) -> Self {
        let child = self.table.enter();
        let copy = self.table.snapshots.get(&self.id).map(|s| s.inherit());

        tracing::trace!(
            parent_id = %self.id,
            child_id = %child.id,
            inherited = copy.is_some(),
            "Forked settings context"
        );

        if let Some(snapshot) = copy {
            self.table.snapshots.insert(child.id, snapshot);
        }
        child
    }
}

impl PropertyScope for ContextGuard {
    /// Runs `f` while holding this context's shard lock.
    ///
    /// Seeding also happens under that lock, which is what makes it exactly
    /// once. `f` and the ambient source must not touch any context of this
    /// table; contexts of other tables and thread-bound stores are fine.
    fn with_snapshot<R>(&self, f: impl FnOnce(&mut PropertySnapshot) -> R) -> R {
        // The entry holds its shard's lock, so creation happens exactly once.
        let mut entry = self
            .table
            .snapshots
            .entry(self.id)
            .or_insert_with(|| self.table.seed(self.id));
        f(entry.value_mut())
    }

    fn reset(&self) {
        if let Some((_, snapshot)) = self.table.snapshots.remove(&self.id) {
            tracing::debug!(
                context_id = %self.id,
                origin = %snapshot.origin(),
                entries = snapshot.len(),
                "Discarded settings snapshot"
            );
        }
    }

    fn is_initialized(&self) -> bool {
        self.table.snapshots.contains_key(&self.id)
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        self.table.snapshots.remove(&self.id);
    }
}

impl std::fmt::Debug for ContextGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextGuard")
            .field("id", &self.id)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ambient::{MockAmbientSource, PropertyRegistry, StaticSource};
    use crate::store::SnapshotOrigin;
    use std::collections::HashMap;

    fn table_with(pairs: &[(&str, &str)]) -> Arc<ContextTable> {
        ContextTable::new(Arc::new(StaticSource::from_pairs(pairs.iter().copied())))
    }

    #[test]
    fn test_enter_is_lazy() {
        let table = table_with(&[("lang", "en")]);
        let ctx = table.enter();

        assert!(!ctx.is_initialized());
        assert_eq!(table.live_snapshots(), 0);

        assert_eq!(ctx.get("lang"), Some("en".to_string()));
        assert_eq!(table.live_snapshots(), 1);
    }

    #[test]
    fn test_contexts_are_isolated() {
        let table = table_with(&[("lang", "en")]);
        let a = table.enter();
        let b = table.enter();

        a.set("lang", "de");
        assert_eq!(b.get("lang"), Some("en".to_string()));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_fork_copies_parent() {
        let table = table_with(&[("lang", "en")]);
        let parent = table.enter();
        parent.set("lang", "de");

        let child = parent.fork();
        assert_eq!(child.get("lang"), Some("de".to_string()));
        assert_eq!(child.with_snapshot(|s| s.origin()), SnapshotOrigin::Inherited);

        child.set("lang", "fr");
        parent.set("mode", "strict");
        assert_eq!(parent.get("lang"), Some("de".to_string()));
        assert!(!child.contains("mode"));
    }

    #[test]
    fn test_fork_of_uninitialized_parent_seeds_from_source() {
        let registry = Arc::new(PropertyRegistry::from_pairs([("lang", "en")]));
        let table = ContextTable::new(registry.clone());
        let parent = table.enter();

        let child = parent.fork();
        assert!(!child.is_initialized());

        registry.set("lang", "pt");
        assert_eq!(child.get("lang"), Some("pt".to_string()));
        assert!(!parent.is_initialized());
    }

    #[test]
    fn test_reset_reseeds_from_source() {
        let table = table_with(&[("lang", "en")]);
        let parent = table.enter();
        parent.set("lang", "de");
        let child = parent.fork();

        child.reset();
        assert!(!child.is_initialized());
        assert_eq!(child.get("lang"), Some("en".to_string()));
        assert_eq!(child.with_snapshot(|s| s.origin()), SnapshotOrigin::Ambient);
    }

    #[test]
    fn test_drop_releases_entry() {
        let table = table_with(&[]);
        let ctx = table.enter();
        ctx.set("lang", "de");
        let forked = ctx.fork();
        assert_eq!(table.live_snapshots(), 2);

        drop(ctx);
        assert_eq!(table.live_snapshots(), 1);
        drop(forked);
        assert_eq!(table.live_snapshots(), 0);
    }

    #[test]
    fn test_other_table_usable_inside_with_snapshot() {
        let outer = table_with(&[("lang", "en")]);
        let inner = table_with(&[("lang", "pt")]);
        let outer_ctx = outer.enter();
        let inner_ctx = inner.enter();

        let seen = outer_ctx.with_snapshot(|snapshot| {
            let forked = inner_ctx.fork();
            snapshot.insert("peer", forked.get_or("lang", "??"));
            snapshot.get("lang").map(str::to_owned)
        });

        assert_eq!(seen, Some("en".to_string()));
        assert_eq!(outer_ctx.get("peer"), Some("pt".to_string()));
        assert_eq!(inner.live_snapshots(), 0);
    }

    #[test]
    fn test_fork_after_with_snapshot_returns() {
        let table = table_with(&[("lang", "en")]);
        let parent = table.enter();

        // Copy out of the closure, then fork once the shard lock is released.
        let lang = parent.with_snapshot(|s| s.get("lang").map(str::to_owned));
        let child = parent.fork();

        assert_eq!(child.get("lang"), lang);
        assert_eq!(child.with_snapshot(|s| s.origin()), SnapshotOrigin::Inherited);
    }

    #[test]
    fn test_concurrent_first_access_seeds_once() {
        let mut source = MockAmbientSource::new();
        source
            .expect_load()
            .times(1)
            .returning(|| HashMap::from([("lang".to_string(), "en".to_string())]));

        let table = ContextTable::new(Arc::new(source));
        let ctx = Arc::new(table.enter());

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let ctx = Arc::clone(&ctx);
                scope.spawn(move || {
                    assert_eq!(ctx.get("lang"), Some("en".to_string()));
                });
            }
        });
    }
}
