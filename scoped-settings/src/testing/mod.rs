//! Testing utilities for code that reads scoped settings.
//!
//! This module provides a store backed by a private registry, so tests can
//! change "process-wide" configuration without touching the environment.

mod fixtures;

pub use fixtures::StoreFixture;
