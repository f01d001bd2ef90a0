//! Settings bound to the calling thread.

use super::{PropertyScope, PropertySnapshot, SnapshotOrigin};
use crate::ambient::AmbientSource;
use crate::config::StoreConfig;
use crate::errors::SettingsError;
use crate::observability::{DiagnosticSink, LoggingDiagnosticSink};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle, Scope, ScopedJoinHandle};

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    // One slot per store; released with the thread.
    static SNAPSHOTS: RefCell<HashMap<StoreId, Slot>> = RefCell::new(HashMap::new());
}

/// A thread's snapshot plus a handle that dies with its store.
#[derive(Debug)]
struct Slot {
    snapshot: PropertySnapshot,
    alive: Weak<()>,
}

impl Slot {
    fn is_live(&self) -> bool {
        self.alive.strong_count() > 0
    }
}

/// Drops slots whose store is gone. Runs whenever a slot is added, so a
/// long-lived thread holds at most one slot per live store.
fn prune_dead_slots(table: &mut HashMap<StoreId, Slot>) {
    let before = table.len();
    table.retain(|_, slot| slot.is_live());
    let pruned = before - table.len();
    if pruned > 0 {
        tracing::trace!(pruned, remaining = table.len(), "Pruned dead settings snapshots");
    }
}

/// Identifies a store within the process. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreId(u64);

impl StoreId {
    fn next() -> Self {
        Self(NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for StoreId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "store-{}", self.0)
    }
}

/// A settings store whose snapshots are private to each thread.
///
/// The first access from a thread seeds that thread's snapshot from the
/// ambient source. Threads started through [`ScopedPropertyStore::spawn`]
/// (or handed an [`InheritedSnapshot`]) start from a copy of their parent's
/// snapshot instead.
///
/// Per-thread operations take no locks. The store itself is `Send + Sync`
/// and is usually shared behind an `Arc`.
pub struct ScopedPropertyStore {
    id: StoreId,
    alive: Arc<()>,
    source: Arc<dyn AmbientSource>,
    sink: Arc<dyn DiagnosticSink>,
}

impl ScopedPropertyStore {
    /// Creates a store reading from `source`.
    #[must_use]
    pub fn new(source: Arc<dyn AmbientSource>) -> Self {
        Self {
            id: StoreId::next(),
            alive: Arc::new(()),
            source,
            sink: Arc::new(LoggingDiagnosticSink::debug()),
        }
    }

    /// Creates a store that owns `source`.
    #[must_use]
    pub fn from_source(source: impl AmbientSource + 'static) -> Self {
        Self::new(Arc::new(source))
    }

    /// Creates a store from configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the dump level is not a tracing level.
    pub fn from_config(config: &StoreConfig) -> Result<Self, SettingsError> {
        Ok(Self::new(config.ambient.source()).with_diagnostic_sink(config.diagnostic_sink()?))
    }

    /// Sets the sink used by [`ScopedPropertyStore::log_snapshot`].
    #[must_use]
    pub fn with_diagnostic_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Returns the store id.
    #[must_use]
    pub fn id(&self) -> StoreId {
        self.id
    }

    /// Returns the ambient source.
    #[must_use]
    pub fn source(&self) -> &Arc<dyn AmbientSource> {
        &self.source
    }

    /// Returns the diagnostic sink.
    #[must_use]
    pub fn diagnostic_sink(&self) -> &Arc<dyn DiagnosticSink> {
        &self.sink
    }

    /// Dumps this thread's snapshot to the diagnostic sink, if it is enabled.
    pub fn log_snapshot(&self) {
        self.log_to(self.sink.as_ref());
    }

    /// Takes a point-in-time copy of this thread's snapshot for a child.
    ///
    /// Does not create a snapshot: if this thread has none, the child will
    /// seed its own from the ambient source.
    pub fn inherit(&self) -> InheritedSnapshot {
        let snapshot = SNAPSHOTS.with(|cell| {
            cell.borrow()
                .get(&self.id)
                .map(|slot| slot.snapshot.inherit())
        });
        InheritedSnapshot {
            store: self.id,
            alive: Arc::downgrade(&self.alive),
            snapshot,
        }
    }

    /// Spawns a thread that starts with a copy of this thread's snapshot.
    pub fn spawn<F, T>(&self, f: F) -> JoinHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let inherited = self.inherit();
        thread::spawn(move || {
            inherited.install();
            f()
        })
    }

    /// Spawns a configured thread that starts with a copy of this thread's
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns `Spawn` if the OS refuses to create the thread.
    pub fn spawn_with<F, T>(&self, builder: thread::Builder, f: F) -> Result<JoinHandle<T>, SettingsError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let inherited = self.inherit();
        builder
            .spawn(move || {
                inherited.install();
                f()
            })
            .map_err(|e| SettingsError::Spawn(e.to_string()))
    }

    /// Spawns a scoped thread that starts with a copy of this thread's
    /// snapshot.
    pub fn spawn_scoped<'scope, 'env, F, T>(
        &self,
        scope: &'scope Scope<'scope, 'env>,
        f: F,
    ) -> ScopedJoinHandle<'scope, T>
    where
        F: FnOnce() -> T + Send + 'scope,
        T: Send + 'scope,
    {
        let inherited = self.inherit();
        scope.spawn(move || {
            inherited.install();
            f()
        })
    }

    fn seed(&self) -> PropertySnapshot {
        let snapshot = PropertySnapshot::seeded(self.source.load());
        tracing::trace!(
            store_id = %self.id,
            origin = %snapshot.origin(),
            entries = snapshot.len(),
            "Created settings snapshot"
        );
        snapshot
    }
}

impl PropertyScope for ScopedPropertyStore {
    fn with_snapshot<R>(&self, f: impl FnOnce(&mut PropertySnapshot) -> R) -> R {
        // Load outside the borrow so a source may itself read settings.
        let seeded = (!self.is_initialized()).then(|| self.seed());

        SNAPSHOTS.with(|cell| {
            let mut table = cell.borrow_mut();
            if !table.contains_key(&self.id) {
                prune_dead_slots(&mut table);
            }
            let slot = table.entry(self.id).or_insert_with(|| Slot {
                snapshot: seeded.unwrap_or_else(|| self.seed()),
                alive: Arc::downgrade(&self.alive),
            });
            f(&mut slot.snapshot)
        })
    }

    fn reset(&self) {
        let removed = SNAPSHOTS.with(|cell| cell.borrow_mut().remove(&self.id));
        if let Some(Slot { snapshot, .. }) = removed {
            tracing::debug!(
                store_id = %self.id,
                origin = %snapshot.origin(),
                entries = snapshot.len(),
                "Discarded settings snapshot"
            );
        }
    }

    fn is_initialized(&self) -> bool {
        SNAPSHOTS.with(|cell| cell.borrow().contains_key(&self.id))
    }
}

impl Drop for ScopedPropertyStore {
    fn drop(&mut self) {
        // Other threads release their slots when they exit.
        let _ = SNAPSHOTS.try_with(|cell| {
            if let Ok(mut table) = cell.try_borrow_mut() {
                table.remove(&self.id);
            }
        });
    }
}

impl std::fmt::Debug for ScopedPropertyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedPropertyStore")
            .field("id", &self.id)
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

/// A point-in-time copy of a parent thread's snapshot, ready to hand to a
/// child thread.
#[derive(Debug, Clone)]
#[must_use = "an inherited snapshot does nothing until installed"]
pub struct InheritedSnapshot {
    store: StoreId,
    alive: Weak<()>,
    snapshot: Option<PropertySnapshot>,
}

impl InheritedSnapshot {
    /// Returns the store the copy belongs to.
    pub fn store(&self) -> StoreId {
        self.store
    }

    /// Returns the copied snapshot, or `None` if the parent had none.
    pub fn snapshot(&self) -> Option<&PropertySnapshot> {
        self.snapshot.as_ref()
    }

    /// Makes the copy the calling thread's snapshot.
    ///
    /// If the parent had no snapshot, any existing snapshot on this thread
    /// is discarded so the next access seeds from the ambient source.
    pub fn install(self) {
        let Self {
            store,
            alive,
            snapshot,
        } = self;
        tracing::trace!(
            store_id = %store,
            inherited = snapshot.is_some(),
            "Installing inherited settings snapshot"
        );
        SNAPSHOTS.with(|cell| {
            let mut table = cell.borrow_mut();
            match snapshot {
                Some(snapshot) => {
                    debug_assert_eq!(snapshot.origin(), SnapshotOrigin::Inherited);
                    prune_dead_slots(&mut table);
                    table.insert(store, Slot { snapshot, alive });
                }
                None => {
                    table.remove(&store);
                }
            }
        });
    }

    /// Runs `f` with the copy installed, then restores whatever snapshot the
    /// calling thread had before. Suited to pooled threads.
    pub fn scope<R>(self, f: impl FnOnce() -> R) -> R {
        let store = self.store;
        let previous = SNAPSHOTS.with(|cell| cell.borrow_mut().remove(&store));
        let _restore = RestoreOnDrop { store, previous };
        self.install();
        f()
    }
}

struct RestoreOnDrop {
    store: StoreId,
    previous: Option<Slot>,
}

impl Drop for RestoreOnDrop {
    fn drop(&mut self) {
        let previous = self.previous.take();
        let _ = SNAPSHOTS.try_with(|cell| {
            if let Ok(mut table) = cell.try_borrow_mut() {
                match previous {
                    Some(slot) => {
                        table.insert(self.store, slot);
                    }
                    None => {
                        table.remove(&self.store);
                    }
                }
            }
        });
    }
}
