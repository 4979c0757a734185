//! The types layer: resolved export types and per-module indexes.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use strata_cache::{LayerSpec, RefreshMode, View};
use strata_common::{Ident, Interner};
use strata_deps::DepTracker;

use crate::fact::{AnalysisDomain, Fact};
use crate::summary::{ExportDecl, ExportSummary};
use crate::syntax::ParseFault;

/// The builtin types the analysis tracks.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BuiltinType {
    /// `int`
    Int,
    /// `str`
    Str,
    /// `bool`
    Bool,
    /// `float`
    Float,
    /// `bytes`
    Bytes,
}

impl BuiltinType {
    /// Resolves a type token, `None` for anything outside the builtin set.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(BuiltinType::Int),
            "str" => Some(BuiltinType::Str),
            "bool" => Some(BuiltinType::Bool),
            "float" => Some(BuiltinType::Float),
            "bytes" => Some(BuiltinType::Bytes),
            _ => None,
        }
    }
}

impl fmt::Display for BuiltinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuiltinType::Int => "int",
            BuiltinType::Str => "str",
            BuiltinType::Bool => "bool",
            BuiltinType::Float => "float",
            BuiltinType::Bytes => "bytes",
        };
        write!(f, "{name}")
    }
}

/// What the types layer knows about one export.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TypeInfo {
    /// Resolves to a builtin type.
    Builtin(BuiltinType),
    /// The module or export does not exist.
    Absent,
    /// Declared with a type token outside the tracked builtin set; the
    /// layer declines to resolve it further.
    Untracked(Ident),
    /// The alias chain loops back on itself.
    Cycle,
}

/// The per-module index: what the errors layer needs to enumerate a
/// module's facts while reading only this layer.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ModuleIndex {
    /// Whether the module exists at all.
    pub present: bool,
    /// Export names in declaration order.
    pub names: Vec<Ident>,
    /// Parse faults carried through from the summary.
    pub faults: Vec<ParseFault>,
    /// Imports naming modules that do not exist.
    pub missing_imports: Vec<Ident>,
}

impl ModuleIndex {
    fn absent() -> Self {
        Self {
            present: false,
            names: Vec::new(),
            faults: Vec::new(),
            missing_imports: Vec::new(),
        }
    }
}

/// Keys of the types layer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TypeKey {
    /// The resolved type of `(module, name)`.
    Export(Ident, Ident),
    /// The index of a module.
    Index(Ident),
}

/// Values of the types layer.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TypeAnswer {
    /// Answer for a [`TypeKey::Export`] key.
    Type(TypeInfo),
    /// Answer for a [`TypeKey::Index`] key.
    Index(Arc<ModuleIndex>),
}

impl TypeAnswer {
    /// The type info, if this answers an export key.
    pub fn as_type(&self) -> Option<TypeInfo> {
        match self {
            TypeAnswer::Type(info) => Some(*info),
            TypeAnswer::Index(_) => None,
        }
    }

    /// The index, if this answers an index key.
    pub fn as_index(&self) -> Option<&Arc<ModuleIndex>> {
        match self {
            TypeAnswer::Index(index) => Some(index),
            TypeAnswer::Type(_) => None,
        }
    }
}

/// Resolves export types by chasing alias chains through upstream export
/// summaries.
///
/// Lazy by default: evicted keys recompute on the next query. The index
/// keys are pass-throughs of upstream facts so the errors layer can stay
/// within the one-layer-up reading discipline.
#[derive(Clone)]
pub struct TypesSpec {
    interner: Arc<Interner>,
    mode: RefreshMode,
}

impl TypesSpec {
    /// Creates the spec with the given refresh mode.
    pub fn new(interner: Arc<Interner>, mode: RefreshMode) -> Self {
        Self { interner, mode }
    }

    fn resolve(
        &self,
        upstream: &dyn View<Ident, ExportSummary>,
        deps: &DepTracker<'_, Fact>,
        module: Ident,
        name: Ident,
    ) -> TypeInfo {
        let mut visited: HashSet<(Ident, Ident)> = HashSet::new();
        let (mut module, mut name) = (module, name);
        loop {
            if !visited.insert((module, name)) {
                return TypeInfo::Cycle;
            }
            // Depend on this link of the chain: additions, removals, and
            // re-declarations of the name all trigger this fact.
            deps.depends_on(Fact::Export(module, name));
            let summary = upstream.read(&module);
            let Some(summary) = summary.as_module() else {
                // Also notice the module coming into existence.
                deps.depends_on(Fact::Exports(module));
                return TypeInfo::Absent;
            };
            match summary.exports.get(&name) {
                None => return TypeInfo::Absent,
                Some(ExportDecl::Declared(token)) => {
                    return match BuiltinType::from_name(self.interner.resolve(*token)) {
                        Some(builtin) => TypeInfo::Builtin(builtin),
                        None => TypeInfo::Untracked(*token),
                    };
                }
                Some(ExportDecl::Alias {
                    module: target_module,
                    name: target_name,
                }) => {
                    module = *target_module;
                    name = *target_name;
                }
            }
        }
    }

    fn index(
        &self,
        upstream: &dyn View<Ident, ExportSummary>,
        deps: &DepTracker<'_, Fact>,
        module: Ident,
    ) -> ModuleIndex {
        deps.depends_on(Fact::Exports(module));
        let Some(summary) = upstream.read(&module).as_module().cloned() else {
            return ModuleIndex::absent();
        };
        let mut missing_imports = Vec::new();
        for import in &summary.imports {
            deps.depends_on(Fact::Exports(*import));
            if !upstream.read(import).is_present() {
                missing_imports.push(*import);
            }
        }
        ModuleIndex {
            present: true,
            names: summary.exports.keys().copied().collect(),
            faults: summary.faults.clone(),
            missing_imports,
        }
    }
}

impl LayerSpec<AnalysisDomain> for TypesSpec {
    type Key = TypeKey;
    type Value = TypeAnswer;
    type UpKey = Ident;
    type UpValue = ExportSummary;

    fn name(&self) -> &'static str {
        "types"
    }

    fn refresh_mode(&self) -> RefreshMode {
        self.mode
    }

    fn produce_value(
        &self,
        upstream: &dyn View<Ident, ExportSummary>,
        key: &TypeKey,
        deps: &DepTracker<'_, Fact>,
    ) -> TypeAnswer {
        match key {
            TypeKey::Export(module, name) => {
                TypeAnswer::Type(self.resolve(upstream, deps, *module, *name))
            }
            TypeKey::Index(module) => {
                TypeAnswer::Index(Arc::new(self.index(upstream, deps, *module)))
            }
        }
    }

    fn filter_upstream_dependency(&self, dep: &Fact) -> Option<TypeKey> {
        match dep {
            Fact::TypeOf(module, name) => Some(TypeKey::Export(*module, *name)),
            Fact::ExportNames(module) => Some(TypeKey::Index(*module)),
            _ => None,
        }
    }

    fn trigger_to_dependency(&self, key: &TypeKey) -> Fact {
        match key {
            TypeKey::Export(module, name) => Fact::TypeOf(*module, *name),
            TypeKey::Index(module) => Fact::ExportNames(*module),
        }
    }

    fn equal_value(&self, a: &TypeAnswer, b: &TypeAnswer) -> bool {
        a == b
    }

    fn owner_of(&self, key: &TypeKey) -> Ident {
        match key {
            TypeKey::Export(module, _) => *module,
            TypeKey::Index(module) => *module,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_module;
    use std::collections::HashMap;
    use std::sync::RwLock;
    use strata_deps::DependencyRegistry;

    struct SummaryView {
        summaries: RwLock<HashMap<Ident, Arc<crate::summary::ModuleSummary>>>,
    }

    impl View<Ident, ExportSummary> for SummaryView {
        fn read(&self, key: &Ident) -> ExportSummary {
            match self.summaries.read().unwrap().get(key) {
                Some(summary) => ExportSummary::Module(Arc::clone(summary)),
                None => ExportSummary::Absent,
            }
        }
    }

    struct Fixture {
        interner: Arc<Interner>,
        spec: TypesSpec,
        view: SummaryView,
        registry: DependencyRegistry<Fact>,
    }

    fn make_fixture() -> Fixture {
        let interner = Arc::new(Interner::new());
        Fixture {
            spec: TypesSpec::new(Arc::clone(&interner), RefreshMode::Lazy),
            interner,
            view: SummaryView {
                summaries: RwLock::new(HashMap::new()),
            },
            registry: DependencyRegistry::new(),
        }
    }

    impl Fixture {
        fn set(&self, module: &str, source: &str) -> Ident {
            let id = self.interner.intern(module);
            let summary = parse_module(source, &self.interner);
            self.view
                .summaries
                .write()
                .unwrap()
                .insert(id, Arc::new(summary));
            id
        }

        fn type_of(&self, module: Ident, name: &str) -> TypeInfo {
            let name = self.interner.intern(name);
            let key = TypeKey::Export(module, name);
            let consumer = self.registry.register(&Fact::TypeOf(module, name));
            let tracker = DepTracker::new(&self.registry, consumer);
            self.spec
                .produce_value(&self.view, &key, &tracker)
                .as_type()
                .unwrap()
        }

        fn index_of(&self, module: Ident) -> Arc<ModuleIndex> {
            let key = TypeKey::Index(module);
            let consumer = self.registry.register(&Fact::ExportNames(module));
            let tracker = DepTracker::new(&self.registry, consumer);
            self.spec
                .produce_value(&self.view, &key, &tracker)
                .as_index()
                .unwrap()
                .clone()
        }
    }

    #[test]
    fn declared_builtin_resolves() {
        let fx = make_fixture();
        let a = fx.set("a", "foo: int");
        assert_eq!(fx.type_of(a, "foo"), TypeInfo::Builtin(BuiltinType::Int));
    }

    #[test]
    fn unknown_type_token_is_untracked() {
        let fx = make_fixture();
        let a = fx.set("a", "grid: Grid");
        let token = fx.interner.get("Grid").unwrap();
        assert_eq!(fx.type_of(a, "grid"), TypeInfo::Untracked(token));
    }

    #[test]
    fn alias_chases_across_modules() {
        let fx = make_fixture();
        fx.set("b", "baz: str");
        let a = fx.set("a", "bar = b.baz");
        assert_eq!(fx.type_of(a, "bar"), TypeInfo::Builtin(BuiltinType::Str));
    }

    #[test]
    fn alias_chain_of_three() {
        let fx = make_fixture();
        fx.set("c", "v: float");
        fx.set("b", "w = c.v");
        let a = fx.set("a", "x = b.w");
        assert_eq!(fx.type_of(a, "x"), TypeInfo::Builtin(BuiltinType::Float));
    }

    #[test]
    fn missing_name_is_absent() {
        let fx = make_fixture();
        let a = fx.set("a", "foo: int");
        assert_eq!(fx.type_of(a, "nope"), TypeInfo::Absent);
    }

    #[test]
    fn missing_module_is_absent() {
        let fx = make_fixture();
        let a = fx.set("a", "bar = ghost.x");
        assert_eq!(fx.type_of(a, "bar"), TypeInfo::Absent);
    }

    #[test]
    fn alias_cycle_detected() {
        let fx = make_fixture();
        fx.set("b", "y = a.x");
        let a = fx.set("a", "x = b.y");
        assert_eq!(fx.type_of(a, "x"), TypeInfo::Cycle);
    }

    #[test]
    fn self_alias_is_a_cycle() {
        let fx = make_fixture();
        let a = fx.set("a", "x = a.x");
        assert_eq!(fx.type_of(a, "x"), TypeInfo::Cycle);
    }

    #[test]
    fn resolution_records_each_chain_link() {
        let fx = make_fixture();
        fx.set("b", "baz: str");
        let a = fx.set("a", "bar = b.baz");
        fx.type_of(a, "bar");

        let b = fx.interner.get("b").unwrap();
        let bar = fx.interner.get("bar").unwrap();
        let baz = fx.interner.get("baz").unwrap();
        assert!(fx.registry.lookup(&Fact::Export(a, bar)).is_some());
        assert!(fx.registry.lookup(&Fact::Export(b, baz)).is_some());
    }

    #[test]
    fn index_lists_names_and_faults() {
        let fx = make_fixture();
        let a = fx.set("a", "foo: int\n???\nbar: str");
        let index = fx.index_of(a);
        assert!(index.present);
        assert_eq!(index.names.len(), 2);
        assert_eq!(index.faults.len(), 1);
    }

    #[test]
    fn index_flags_missing_imports() {
        let fx = make_fixture();
        fx.set("b", "x: int");
        let a = fx.set("a", "use b\nuse ghost\nfoo: int");
        let index = fx.index_of(a);
        let ghost = fx.interner.get("ghost").unwrap();
        assert_eq!(index.missing_imports, vec![ghost]);
    }

    #[test]
    fn index_of_absent_module() {
        let fx = make_fixture();
        let ghost = fx.interner.intern("ghost");
        let index = fx.index_of(ghost);
        assert!(!index.present);
        assert!(index.names.is_empty());
    }
}
