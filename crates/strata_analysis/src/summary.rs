//! Per-module export summaries: the value type of the exports layer.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use strata_common::Ident;

use crate::syntax::ParseFault;

/// How one export is declared.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ExportDecl {
    /// `name: type_name`, a directly declared type. The ident is the raw
    /// type token; resolution to a builtin happens in the types layer.
    Declared(Ident),
    /// `name = module.name`, aliasing another module's export.
    Alias {
        /// The target module.
        module: Ident,
        /// The target export within that module.
        name: Ident,
    },
}

/// Everything the exports layer knows about one module.
///
/// Maps are ordered so equality and iteration are deterministic across
/// recomputations, which change suppression depends on.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ModuleSummary {
    /// Exports by name, first declaration winning on duplicates.
    pub exports: BTreeMap<Ident, ExportDecl>,
    /// Modules named in `use` lines.
    pub imports: BTreeSet<Ident>,
    /// Recoverable parse problems, as data.
    pub faults: Vec<ParseFault>,
}

/// The exports layer's value: a summary, or nothing for unknown modules.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ExportSummary {
    /// The module exists and parsed to this summary.
    Module(Arc<ModuleSummary>),
    /// No such module.
    Absent,
}

impl ExportSummary {
    /// The summary, if the module exists.
    pub fn as_module(&self) -> Option<&Arc<ModuleSummary>> {
        match self {
            ExportSummary::Module(summary) => Some(summary),
            ExportSummary::Absent => None,
        }
    }

    /// Whether the module exists.
    pub fn is_present(&self) -> bool {
        matches!(self, ExportSummary::Module(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_is_not_a_module() {
        assert!(!ExportSummary::Absent.is_present());
        assert!(ExportSummary::Absent.as_module().is_none());
    }

    #[test]
    fn summary_equality_is_structural() {
        let mut a = ModuleSummary::default();
        let mut b = ModuleSummary::default();
        let name = Ident::from_raw(1);
        let ty = Ident::from_raw(2);
        a.exports.insert(name, ExportDecl::Declared(ty));
        b.exports.insert(name, ExportDecl::Declared(ty));
        assert_eq!(
            ExportSummary::Module(Arc::new(a)),
            ExportSummary::Module(Arc::new(b))
        );
    }
}
