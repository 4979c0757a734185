//! The concrete semantic-analysis pipeline built on the Strata engine.
//!
//! Four stages over a small module language: raw sources, per-module
//! export summaries, resolved export types, and synthesized diagnostics.
//! Each stage is a [`strata_cache`] layer; the [`pipeline::SemanticModel`]
//! assembles the chain, drives updates, and manages overlay sessions.

#![warn(missing_docs)]

pub mod errors;
pub mod exports;
pub mod fact;
pub mod pipeline;
pub mod sources;
pub mod summary;
pub mod syntax;
pub mod types;

pub use fact::{AnalysisDomain, Fact};
pub use pipeline::{ModelError, ModelOptions, OverlaySession, SemanticModel};
pub use summary::{ExportDecl, ExportSummary, ModuleSummary};
pub use syntax::ParseFault;
pub use types::{BuiltinType, ModuleIndex, TypeAnswer, TypeInfo, TypeKey};
