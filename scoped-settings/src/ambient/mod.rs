//! Ambient configuration sources.
//!
//! An ambient source is the process-wide key/value configuration that a
//! fresh snapshot is seeded from. The store reads it once per snapshot
//! creation and never writes to it.

mod registry;
mod source;

pub use registry::PropertyRegistry;
pub use source::{AmbientSource, EnvironmentSource, LayeredSource, StaticSource};

#[cfg(test)]
pub use source::MockAmbientSource;
