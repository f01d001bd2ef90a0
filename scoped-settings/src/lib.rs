//! # Scoped Settings
//!
//! Per-execution-context configuration that shadows process-wide settings
//! without ever mutating them.
//!
//! A code generator that runs many jobs on many threads can read and write
//! "global" settings from inside one job without the writes leaking into, or
//! being clobbered by, the jobs running next to it:
//!
//! - **Lazy snapshots**: a thread's first access copies the ambient
//!   configuration; later ambient changes are never observed
//! - **Copy-on-spawn**: threads spawned through the store start from a copy
//!   of their parent's snapshot
//! - **Explicit contexts**: [`store::ContextTable`] handles for async tasks
//!   that move between threads
//!
//! ## Quick Start
//!
//! ```rust
//! use scoped_settings::prelude::*;
//!
//! let store = std::sync::Arc::new(ScopedPropertyStore::from_source(
//!     StaticSource::from_pairs([("lang", "en")]),
//! ));
//!
//! store.set("lang", "de");
//!
//! let child = std::sync::Arc::clone(&store);
//! let seen = store.spawn(move || child.get("lang")).join().unwrap();
//! assert_eq!(seen.as_deref(), Some("de"));
//!
//! store.reset();
//! assert_eq!(store.get_or("lang", "??"), "en");
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod ambient;
pub mod config;
pub mod errors;
pub mod global;
pub mod observability;
pub mod store;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ambient::{
        AmbientSource, EnvironmentSource, LayeredSource, PropertyRegistry, StaticSource,
    };
    pub use crate::config::{AmbientKind, StoreConfig};
    pub use crate::errors::{InvalidConfigError, SettingsError};
    pub use crate::observability::{
        CollectingDiagnosticSink, DiagnosticSink, LoggingDiagnosticSink, NoOpDiagnosticSink,
    };
    pub use crate::store::{
        ContextGuard, ContextId, ContextTable, InheritedSnapshot, PropertyScope,
        PropertySnapshot, ScopedPropertyStore, SnapshotOrigin, StoreId,
    };
}
