//! Observability utilities.

mod diagnostics;
mod subscriber;

pub use diagnostics::{
    CollectingDiagnosticSink, DiagnosticSink, LoggingDiagnosticSink, NoOpDiagnosticSink,
};
pub use subscriber::{init_json_tracing, init_tracing};
