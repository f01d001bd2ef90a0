//! Per-context settings snapshots.
//!
//! This module provides:
//! - Snapshots seeded from the ambient source on first access
//! - A thread-bound store with copy-on-spawn inheritance
//! - Explicit context handles for hosts whose contexts are not threads

mod context_table;
mod scope;
mod snapshot;
mod thread_store;

pub use context_table::{ContextGuard, ContextId, ContextTable};
pub use scope::PropertyScope;
pub use snapshot::{PropertySnapshot, SnapshotOrigin, LISTING_HEADER, MAX_LISTED_VALUE_CHARS};
pub use thread_store::{InheritedSnapshot, ScopedPropertyStore, StoreId};
