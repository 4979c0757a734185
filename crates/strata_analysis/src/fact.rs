//! The pipeline-wide dependency vocabulary.

use strata_cache::Domain;
use strata_common::Ident;

/// One dependency description, shared by every layer of the chain.
///
/// A single union serves both roles the registry needs: the *triggers*
/// an update seeds ("the content of `a` changed", "the declaration of
/// `a.foo` changed") and the *consumer identities* under which cached keys
/// record their reads ("the exports of `b`", "the type of `b.bar`"). The
/// per-export variants exist so a consumer that read only `a.foo` is left
/// untouched when `a.bar` changes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Fact {
    /// The raw content of a module.
    Content(Ident),
    /// A module's export summary as a whole: its name set, imports, and
    /// parse faults. Also the consumer identity of the exports layer.
    Exports(Ident),
    /// The declaration of one named export, `(module, name)`.
    Export(Ident, Ident),
    /// A module's export-name index. Consumer identity of the types
    /// layer's index keys.
    ExportNames(Ident),
    /// The resolved type of one export, `(module, name)`. Consumer
    /// identity of the types layer's export keys.
    TypeOf(Ident, Ident),
    /// A module's synthesized diagnostics. Consumer identity of the
    /// errors layer.
    ErrorsOf(Ident),
}

/// The [`Domain`] binding for this pipeline: [`Fact`] dependencies, with
/// module names as the overlay ownership unit.
pub struct AnalysisDomain;

impl Domain for AnalysisDomain {
    type Dep = Fact;
    type Owner = Ident;
}
