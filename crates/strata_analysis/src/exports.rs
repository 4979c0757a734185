//! The exports layer: module name → export summary.

use std::collections::HashSet;
use std::sync::Arc;

use strata_cache::{LayerSpec, RefreshMode, View};
use strata_common::{Ident, Interner};
use strata_deps::DepTracker;

use crate::fact::{AnalysisDomain, Fact};
use crate::sources::SourceText;
use crate::summary::ExportSummary;
use crate::syntax::parse_module;

/// Produces a module's [`ExportSummary`] from its raw source.
///
/// Eager by default: recomputing a summary during the update is what makes
/// fine-grained diffing possible. The layer compares old and new exports
/// and triggers only the per-export facts that actually differ, so a
/// downstream consumer of `a.foo` survives an edit that only touches
/// `a.bar`.
#[derive(Clone)]
pub struct ExportsSpec {
    interner: Arc<Interner>,
    mode: RefreshMode,
}

impl ExportsSpec {
    /// Creates the spec with the given refresh mode.
    pub fn new(interner: Arc<Interner>, mode: RefreshMode) -> Self {
        Self { interner, mode }
    }
}

impl LayerSpec<AnalysisDomain> for ExportsSpec {
    type Key = Ident;
    type Value = ExportSummary;
    type UpKey = Ident;
    type UpValue = SourceText;

    fn name(&self) -> &'static str {
        "exports"
    }

    fn refresh_mode(&self) -> RefreshMode {
        self.mode
    }

    fn produce_value(
        &self,
        upstream: &dyn View<Ident, SourceText>,
        key: &Ident,
        deps: &DepTracker<'_, Fact>,
    ) -> ExportSummary {
        deps.depends_on(Fact::Content(*key));
        match upstream.read(key) {
            SourceText::Present(source) => {
                ExportSummary::Module(Arc::new(parse_module(&source, &self.interner)))
            }
            SourceText::Absent => ExportSummary::Absent,
        }
    }

    fn filter_upstream_dependency(&self, dep: &Fact) -> Option<Ident> {
        match dep {
            Fact::Exports(module) => Some(*module),
            _ => None,
        }
    }

    fn trigger_to_dependency(&self, key: &Ident) -> Fact {
        Fact::Exports(*key)
    }

    fn equal_value(&self, a: &ExportSummary, b: &ExportSummary) -> bool {
        a == b
    }

    fn owner_of(&self, key: &Ident) -> Ident {
        *key
    }

    fn changed_dependencies(
        &self,
        key: &Ident,
        old: Option<&ExportSummary>,
        new: &ExportSummary,
    ) -> Vec<Fact> {
        let module = *key;
        let (old_summary, new_summary) = match (old, new) {
            (Some(ExportSummary::Module(old)), ExportSummary::Module(new)) => (old, new),
            _ => {
                // Presence flipped (or first computation): trigger the
                // wildcard and every export name on either side.
                let mut deps: HashSet<Fact> = [Fact::Exports(module)].into_iter().collect();
                if let Some(ExportSummary::Module(old)) = old {
                    deps.extend(old.exports.keys().map(|name| Fact::Export(module, *name)));
                }
                if let ExportSummary::Module(new) = new {
                    deps.extend(new.exports.keys().map(|name| Fact::Export(module, *name)));
                }
                return deps.into_iter().collect();
            }
        };

        let mut deps = Vec::new();
        for (name, decl) in &new_summary.exports {
            match old_summary.exports.get(name) {
                Some(old_decl) if old_decl == decl => {}
                _ => deps.push(Fact::Export(module, *name)),
            }
        }
        for name in old_summary.exports.keys() {
            if !new_summary.exports.contains_key(name) {
                deps.push(Fact::Export(module, *name));
            }
        }

        let names_changed = !old_summary.exports.keys().eq(new_summary.exports.keys());
        if names_changed
            || old_summary.imports != new_summary.imports
            || old_summary.faults != new_summary.faults
        {
            deps.push(Fact::Exports(module));
        }
        deps
    }
}
