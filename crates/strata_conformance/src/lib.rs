//! Conformance test helpers for the Strata engine.
//!
//! Wraps a [`SemanticModel`] over an in-memory provider so integration
//! tests can edit files, push change events, and snapshot the per-layer
//! recomputation counters.

#![warn(missing_docs)]

use std::path::Path;
use std::sync::Arc;

use strata_analysis::{ModelOptions, SemanticModel, TypeInfo};
use strata_cache::{StatsSnapshot, UpdateResult};
use strata_source::{ChangeEvent, MemoryProvider};

/// A model over editable in-memory sources.
pub struct Workspace {
    /// The shared in-memory file store.
    pub provider: MemoryProvider,
    /// The model under test.
    pub model: SemanticModel,
}

/// Produce counters of all three cached layers at one instant.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ProduceCounts {
    /// Producer runs of the exports layer.
    pub exports: u64,
    /// Producer runs of the types layer.
    pub types: u64,
    /// Producer runs of the errors layer.
    pub errors: u64,
}

/// Builds a workspace containing `files` and ingests them.
pub fn workspace(files: &[(&str, &str)]) -> Workspace {
    let provider = MemoryProvider::new();
    let model = SemanticModel::new(
        Arc::new(provider.clone()),
        ModelOptions {
            workers: 2,
            ..ModelOptions::default()
        },
    )
    .expect("worker pool");
    let events: Vec<ChangeEvent> = files
        .iter()
        .map(|(path, content)| {
            provider.set(*path, *content);
            ChangeEvent::created(*path)
        })
        .collect();
    model.update(&events);
    Workspace { provider, model }
}

impl Workspace {
    /// Rewrites `path` and pushes a `Modified` event.
    pub fn write(&self, path: &str, content: &str) -> UpdateResult {
        self.provider.set(path, content);
        self.model.update(&[ChangeEvent::modified(path)])
    }

    /// Creates `path` and pushes a `Created` event.
    pub fn create(&self, path: &str, content: &str) -> UpdateResult {
        self.provider.set(path, content);
        self.model.update(&[ChangeEvent::created(path)])
    }

    /// Deletes `path` and pushes a `Deleted` event.
    pub fn delete(&self, path: &str) -> UpdateResult {
        self.provider.remove(Path::new(path));
        self.model.update(&[ChangeEvent::deleted(path)])
    }

    /// Pushes a `Modified` event without touching the content.
    pub fn touch(&self, path: &str) -> UpdateResult {
        self.model.update(&[ChangeEvent::modified(path)])
    }

    /// Snapshot of all three layers' produce counters.
    pub fn produces(&self) -> ProduceCounts {
        ProduceCounts {
            exports: self.model.exports_stats().produces,
            types: self.model.types_stats().produces,
            errors: self.model.errors_stats().produces,
        }
    }

    /// Full stats of the types layer.
    pub fn types_stats(&self) -> StatsSnapshot {
        self.model.types_stats()
    }

    /// Renders the resolved type of `module.name` for compact asserts.
    pub fn type_name(&self, module: &str, name: &str) -> String {
        render_type(&self.model, self.model.query_type(module, name))
    }
}

/// Renders a [`TypeInfo`] as a short stable string.
pub fn render_type(model: &SemanticModel, info: TypeInfo) -> String {
    match info {
        TypeInfo::Builtin(builtin) => builtin.to_string(),
        TypeInfo::Absent => "<unresolved>".to_string(),
        TypeInfo::Cycle => "<cycle>".to_string(),
        TypeInfo::Untracked(token) => format!("<untracked {}>", model.interner().resolve(token)),
    }
}
