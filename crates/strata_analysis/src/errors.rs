//! The errors layer: module name → synthesized diagnostics.

use std::sync::Arc;

use strata_cache::{LayerSpec, RefreshMode, View};
use strata_common::{Ident, Interner};
use strata_deps::DepTracker;
use strata_diagnostics::{Diagnostic, DiagnosticCode};

use crate::fact::{AnalysisDomain, Fact};
use crate::types::{TypeAnswer, TypeInfo, TypeKey};

/// Syntax fault in the module source.
pub const SYNTAX_ERROR: DiagnosticCode = DiagnosticCode("E0001");
/// A `use` of a module that does not exist.
pub const UNRESOLVED_IMPORT: DiagnosticCode = DiagnosticCode("E0101");
/// An alias chain ending at a missing module or export.
pub const UNRESOLVED_REFERENCE: DiagnosticCode = DiagnosticCode("E0102");
/// An alias chain that loops.
pub const ALIAS_CYCLE: DiagnosticCode = DiagnosticCode("E0103");
/// A declared type outside the tracked builtin set.
pub const UNTRACKED_TYPE: DiagnosticCode = DiagnosticCode("W0201");

/// Synthesizes a module's diagnostics from the types layer.
///
/// Always eager: consumers of diagnostics need to know exactly which
/// modules' error sets changed after an update, so this layer recomputes
/// during the update and lets value equality stop the propagation.
#[derive(Clone)]
pub struct ErrorsSpec {
    interner: Arc<Interner>,
}

impl ErrorsSpec {
    /// Creates the spec.
    pub fn new(interner: Arc<Interner>) -> Self {
        Self { interner }
    }

    fn name_of(&self, ident: Ident) -> &str {
        self.interner.resolve(ident)
    }
}

impl LayerSpec<AnalysisDomain> for ErrorsSpec {
    type Key = Ident;
    type Value = Vec<Diagnostic>;
    type UpKey = TypeKey;
    type UpValue = TypeAnswer;

    fn name(&self) -> &'static str {
        "errors"
    }

    fn refresh_mode(&self) -> RefreshMode {
        RefreshMode::Eager
    }

    fn produce_value(
        &self,
        upstream: &dyn View<TypeKey, TypeAnswer>,
        key: &Ident,
        deps: &DepTracker<'_, Fact>,
    ) -> Vec<Diagnostic> {
        let module = *key;
        let module_name = self.name_of(module).to_string();

        deps.depends_on(Fact::ExportNames(module));
        let Some(index) = upstream.read(&TypeKey::Index(module)).as_index().cloned() else {
            return Vec::new();
        };
        if !index.present {
            return Vec::new();
        }

        let mut diagnostics = Vec::new();
        for fault in &index.faults {
            diagnostics.push(Diagnostic::error(
                SYNTAX_ERROR,
                module_name.as_str(),
                format!("line {}: {}", fault.line, fault.message),
            ));
        }
        for import in &index.missing_imports {
            diagnostics.push(Diagnostic::error(
                UNRESOLVED_IMPORT,
                module_name.as_str(),
                format!("unresolved import `{}`", self.name_of(*import)),
            ));
        }
        for name in &index.names {
            deps.depends_on(Fact::TypeOf(module, *name));
            let answer = upstream.read(&TypeKey::Export(module, *name));
            match answer.as_type() {
                Some(TypeInfo::Builtin(_)) | None => {}
                Some(TypeInfo::Absent) => diagnostics.push(Diagnostic::error(
                    UNRESOLVED_REFERENCE,
                    module_name.as_str(),
                    format!("`{}` does not resolve to anything", self.name_of(*name)),
                )),
                Some(TypeInfo::Cycle) => diagnostics.push(Diagnostic::error(
                    ALIAS_CYCLE,
                    module_name.as_str(),
                    format!("alias cycle through `{}`", self.name_of(*name)),
                )),
                Some(TypeInfo::Untracked(token)) => diagnostics.push(Diagnostic::warning(
                    UNTRACKED_TYPE,
                    module_name.as_str(),
                    format!(
                        "`{}` has untracked type `{}`",
                        self.name_of(*name),
                        self.name_of(token)
                    ),
                )),
            }
        }
        diagnostics
    }

    fn filter_upstream_dependency(&self, dep: &Fact) -> Option<Ident> {
        match dep {
            Fact::ErrorsOf(module) => Some(*module),
            _ => None,
        }
    }

    fn trigger_to_dependency(&self, key: &Ident) -> Fact {
        Fact::ErrorsOf(*key)
    }

    fn equal_value(&self, a: &Vec<Diagnostic>, b: &Vec<Diagnostic>) -> bool {
        a == b
    }

    fn owner_of(&self, key: &Ident) -> Ident {
        *key
    }
}
