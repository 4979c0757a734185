//! Diagnostics synthesized by the analysis pipeline.
//!
//! The errors layer produces these values; the CLI renders them. Within
//! the engine they are ordinary cached values compared for change
//! suppression, so everything here is plain data.

#![warn(missing_docs)]

pub mod diagnostic;
pub mod severity;
pub mod sink;

pub use diagnostic::{Diagnostic, DiagnosticCode};
pub use severity::Severity;
pub use sink::DiagnosticSink;
