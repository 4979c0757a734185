//! Pipeline assembly, the top-level update driver, and overlay sessions.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use strata_cache::{
    BaseLayer, BaseSpec, CodeUpdate, Epoch, GenerationGate, Layer, LayerReport, OverlayBase,
    OverlayLayer, OwnedSet, RefreshMode, Scheduler, StatsSnapshot, TriggeredDeps, UpdateResult,
};
use strata_common::{Ident, Interner};
use strata_deps::DependencyRegistry;
use strata_diagnostics::{Diagnostic, DiagnosticSink};
use strata_source::{ChangeEvent, ChangeKind, SourceProvider};

use crate::errors::ErrorsSpec;
use crate::exports::ExportsSpec;
use crate::fact::{AnalysisDomain, Fact};
use crate::sources::SourceBase;
use crate::summary::ExportSummary;
use crate::types::{TypeInfo, TypeKey, TypesSpec};

/// Layer 0 of the root chain: raw module sources.
pub type RootBase = BaseLayer<AnalysisDomain, SourceBase>;
/// The root exports layer.
pub type ExportsLayer = Layer<AnalysisDomain, ExportsSpec, RootBase>;
/// The root types layer.
pub type TypesLayer = Layer<AnalysisDomain, TypesSpec, ExportsLayer>;
/// The root errors layer.
pub type ErrorsLayer = Layer<AnalysisDomain, ErrorsSpec, TypesLayer>;

type SessionBase = OverlayBase<AnalysisDomain, SourceBase>;
type SessionExports = OverlayLayer<AnalysisDomain, ExportsSpec, RootBase, SessionBase>;
type SessionTypes = OverlayLayer<AnalysisDomain, TypesSpec, ExportsLayer, SessionExports>;
type SessionErrors = OverlayLayer<AnalysisDomain, ErrorsSpec, TypesLayer, SessionTypes>;

/// Errors from model construction.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The worker pool could not be built.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),
}

/// Construction options for a [`SemanticModel`].
#[derive(Clone, Copy, Debug)]
pub struct ModelOptions {
    /// Worker threads for bulk recomputation; zero means one per core.
    pub workers: usize,
    /// Refresh mode of the exports layer. Eager by default, which enables
    /// fine-grained per-export invalidation and early change suppression.
    pub exports_refresh: RefreshMode,
    /// Refresh mode of the types layer. Lazy by default.
    pub types_refresh: RefreshMode,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            workers: 0,
            exports_refresh: RefreshMode::Eager,
            types_refresh: RefreshMode::Lazy,
        }
    }
}

/// The assembled pipeline and its session state.
///
/// Owns the root chain (sources → exports → types → errors), the shared
/// dependency registry, the scheduler, the generation gate, and any live
/// overlay sessions. All methods take `&self`; the model is shared as
/// `Arc<SemanticModel>` between the update driver and query clients.
pub struct SemanticModel {
    interner: Arc<Interner>,
    registry: Arc<DependencyRegistry<Fact>>,
    base: Arc<RootBase>,
    exports: Arc<ExportsLayer>,
    types: Arc<TypesLayer>,
    errors: Arc<ErrorsLayer>,
    scheduler: Arc<Scheduler>,
    gate: Arc<GenerationGate>,
    overlays: RwLock<HashMap<String, Arc<OverlaySession>>>,
    options: ModelOptions,
}

impl SemanticModel {
    /// Assembles an empty pipeline reading sources through `provider`.
    ///
    /// Feed the initial file set as `Created` change events to populate
    /// the model.
    pub fn new(
        provider: Arc<dyn SourceProvider>,
        options: ModelOptions,
    ) -> Result<Self, ModelError> {
        let interner = Arc::new(Interner::new());
        let registry = Arc::new(DependencyRegistry::new());
        let scheduler = Arc::new(
            Scheduler::new(options.workers)
                .map_err(|error| ModelError::WorkerPool(error.to_string()))?,
        );

        let base = Arc::new(BaseLayer::new(
            SourceBase::new(provider, Arc::clone(&interner)),
            Arc::clone(&registry),
        ));
        let exports = Arc::new(Layer::new(
            ExportsSpec::new(Arc::clone(&interner), options.exports_refresh),
            Arc::clone(&base),
            Arc::clone(&registry),
        ));
        let types = Arc::new(Layer::new(
            TypesSpec::new(Arc::clone(&interner), options.types_refresh),
            Arc::clone(&exports),
            Arc::clone(&registry),
        ));
        let errors = Arc::new(Layer::new(
            ErrorsSpec::new(Arc::clone(&interner)),
            Arc::clone(&types),
            Arc::clone(&registry),
        ));

        info!(workers = scheduler.worker_count(), "semantic model assembled");
        Ok(Self {
            interner,
            registry,
            base,
            exports,
            types,
            errors,
            scheduler,
            gate: Arc::new(GenerationGate::new()),
            overlays: RwLock::new(HashMap::new()),
            options,
        })
    }

    /// Propagates a batch of raw change events through the chain.
    ///
    /// Queries block for the duration; the result is published atomically
    /// when the returned epoch settles. Live overlay sessions absorb the
    /// batch afterwards so they are never staler than root for facts they
    /// do not override.
    pub fn update(&self, events: &[ChangeEvent]) -> UpdateResult {
        let guard = self.gate.begin_update();
        let mut triggered = self.base.apply_events(events);
        let seeds = triggered.len();

        let exports_up = self.exports.update(&mut triggered, &self.scheduler);
        let types_up = self.types.update(&mut triggered, &self.scheduler);
        let errors_up = self.errors.update(&mut triggered, &self.scheduler);

        // A module that just appeared has no recorded dependents yet, so
        // the protocol alone will not analyze it. Pull its diagnostics now.
        for event in events {
            if event.kind != ChangeKind::Deleted {
                if let Some(module) = self.base.with_state(|b| b.key_for_path(&event.path)) {
                    self.errors.get(&module);
                }
            }
        }

        let facts: Vec<Fact> = triggered
            .as_set()
            .iter()
            .filter_map(|id| self.registry.resolve(*id))
            .collect();
        let sessions: Vec<Arc<OverlaySession>> =
            self.overlays.read().unwrap().values().cloned().collect();
        for session in sessions {
            session.absorb_root_facts(&facts);
        }

        let epoch = guard.settle();
        let result = UpdateResult {
            epoch,
            layers: vec![
                LayerReport {
                    layer: "base",
                    invalidated: 0,
                    recomputed: 0,
                    changed: seeds,
                },
                exports_up.report("exports"),
                types_up.report("types"),
                errors_up.report("errors"),
            ],
            triggered: triggered.len(),
        };
        info!(%epoch, triggered = result.triggered, "update settled");
        result
    }

    /// The export summary of `module`.
    pub fn query_exports(&self, module: &str) -> ExportSummary {
        let _query = self.gate.enter_query();
        self.exports.get(&self.interner.intern(module))
    }

    /// The resolved type of `module.name`.
    pub fn query_type(&self, module: &str, name: &str) -> TypeInfo {
        let _query = self.gate.enter_query();
        let key = TypeKey::Export(self.interner.intern(module), self.interner.intern(name));
        self.types.get(&key).as_type().unwrap_or(TypeInfo::Absent)
    }

    /// The diagnostics of `module`.
    pub fn query_errors(&self, module: &str) -> Vec<Diagnostic> {
        let _query = self.gate.enter_query();
        self.errors.get(&self.interner.intern(module))
    }

    /// Diagnostics for every known module, gathered in parallel and
    /// sorted by module and code.
    pub fn check_all(&self) -> Vec<Diagnostic> {
        let _query = self.gate.enter_query();
        let modules: Vec<Ident> = self.base.with_state(|b| b.modules());
        let sink = DiagnosticSink::new();
        self.scheduler.map(&modules, |module| {
            sink.emit_all(self.errors.get(module));
        });
        let mut all = sink.take_all();
        all.sort_by(|a, b| (&a.module, a.code.0).cmp(&(&b.module, b.code.0)));
        all
    }

    /// All known module names, sorted.
    pub fn modules(&self) -> Vec<String> {
        let _query = self.gate.enter_query();
        let mut names: Vec<String> = self
            .base
            .with_state(|b| b.modules())
            .into_iter()
            .map(|m| self.interner.resolve(m).to_string())
            .collect();
        names.sort();
        names
    }

    /// Creates (or returns) the overlay session named `id`.
    pub fn create_overlay(&self, id: &str) -> Arc<OverlaySession> {
        if let Some(existing) = self.overlays.read().unwrap().get(id) {
            return Arc::clone(existing);
        }

        let registry = Arc::new(DependencyRegistry::new());
        let owned = Arc::new(OwnedSet::new());
        let base = Arc::new(OverlayBase::new(Arc::clone(&self.base), Arc::clone(&owned)));
        let exports = Arc::new(OverlayLayer::new(
            ExportsSpec::new(Arc::clone(&self.interner), self.options.exports_refresh),
            Arc::clone(&self.exports),
            Arc::clone(&base),
            Arc::clone(&registry),
            Arc::clone(&owned),
        ));
        let types = Arc::new(OverlayLayer::new(
            TypesSpec::new(Arc::clone(&self.interner), self.options.types_refresh),
            Arc::clone(&self.types),
            Arc::clone(&exports),
            Arc::clone(&registry),
            Arc::clone(&owned),
        ));
        let errors = Arc::new(OverlayLayer::new(
            ErrorsSpec::new(Arc::clone(&self.interner)),
            Arc::clone(&self.errors),
            Arc::clone(&types),
            Arc::clone(&registry),
            Arc::clone(&owned),
        ));

        let session = Arc::new(OverlaySession {
            id: id.to_string(),
            interner: Arc::clone(&self.interner),
            registry,
            owned,
            base,
            exports,
            types,
            errors,
            scheduler: Arc::clone(&self.scheduler),
            root_gate: Arc::clone(&self.gate),
            gate: GenerationGate::new(),
        });
        debug!(session = id, "overlay session created");
        self.overlays
            .write()
            .unwrap()
            .insert(id.to_string(), Arc::clone(&session));
        session
    }

    /// The live overlay session named `id`, if any.
    pub fn overlay(&self, id: &str) -> Option<Arc<OverlaySession>> {
        self.overlays.read().unwrap().get(id).cloned()
    }

    /// Tears down the overlay session named `id`. Root state is
    /// unaffected; outstanding handles to the session keep working until
    /// dropped but no longer receive root updates.
    pub fn remove_overlay(&self, id: &str) {
        if self.overlays.write().unwrap().remove(id).is_some() {
            debug!(session = id, "overlay session removed");
        }
    }

    /// The last settled epoch.
    pub fn epoch(&self) -> Epoch {
        self.gate.settled()
    }

    /// The interner shared by the whole pipeline.
    pub fn interner(&self) -> &Arc<Interner> {
        &self.interner
    }

    /// Counters of the exports layer's table.
    pub fn exports_stats(&self) -> StatsSnapshot {
        self.exports.stats()
    }

    /// Counters of the types layer's table.
    pub fn types_stats(&self) -> StatsSnapshot {
        self.types.stats()
    }

    /// Counters of the errors layer's table.
    pub fn errors_stats(&self) -> StatsSnapshot {
        self.errors.stats()
    }
}

/// An isolated overlay of the pipeline for one editing session.
///
/// Owned modules are analyzed against the session's speculative content;
/// everything else reads straight through to root. The session has its
/// own dependency registry and generation gate, so its updates never
/// disturb root state.
pub struct OverlaySession {
    id: String,
    interner: Arc<Interner>,
    registry: Arc<DependencyRegistry<Fact>>,
    owned: Arc<OwnedSet<Ident>>,
    base: Arc<SessionBase>,
    exports: Arc<SessionExports>,
    types: Arc<SessionTypes>,
    errors: Arc<SessionErrors>,
    scheduler: Arc<Scheduler>,
    root_gate: Arc<GenerationGate>,
    gate: GenerationGate,
}

impl OverlaySession {
    /// The session's identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Applies speculative code edits and re-analyzes the affected owned
    /// modules.
    ///
    /// Each path's content is replaced wholesale; repeating an update for
    /// the same path leaves only the latest content's results, with no
    /// residue of earlier speculative state.
    pub fn update_with_code(&self, updates: &[(PathBuf, CodeUpdate)]) -> UpdateResult {
        // Hold the root gate shared: session recomputation reads root
        // state through the fall-through views and must not observe a
        // root update mid-flight.
        let _root = self.root_gate.enter_query();
        let guard = self.gate.begin_update();
        let mut triggered = TriggeredDeps::new();
        let mut touched: Vec<Ident> = Vec::new();
        for (path, update) in updates {
            if let Some((module, seeds)) = self.base.apply_code(path, update) {
                touched.push(module);
                for dep in seeds {
                    triggered.insert(self.registry.register(&dep));
                }
            }
        }
        let seeds = triggered.len();

        for module in &touched {
            self.exports.evict_owner(module);
            self.types.evict_owner(module);
            self.errors.evict_owner(module);
        }

        let exports_up = self.exports.update(&mut triggered, &self.scheduler);
        let types_up = self.types.update(&mut triggered, &self.scheduler);
        let errors_up = self.errors.update(&mut triggered, &self.scheduler);
        for module in &touched {
            self.errors.get(module);
        }

        let epoch = guard.settle();
        debug!(session = %self.id, %epoch, "overlay update settled");
        UpdateResult {
            epoch,
            layers: vec![
                LayerReport {
                    layer: "base",
                    invalidated: 0,
                    recomputed: 0,
                    changed: seeds,
                },
                exports_up.report("exports"),
                types_up.report("types"),
                errors_up.report("errors"),
            ],
            triggered: triggered.len(),
        }
    }

    /// Replays a settled root update into this session, refreshing owned
    /// keys that read the changed root facts.
    pub(crate) fn absorb_root_facts(&self, facts: &[Fact]) {
        if facts.is_empty() || self.owned.is_empty() {
            return;
        }
        let guard = self.gate.begin_update();
        let mut triggered = TriggeredDeps::new();
        for fact in facts {
            triggered.insert(self.registry.register(fact));
        }
        self.exports.update(&mut triggered, &self.scheduler);
        self.types.update(&mut triggered, &self.scheduler);
        self.errors.update(&mut triggered, &self.scheduler);
        let epoch = guard.settle();
        debug!(session = %self.id, %epoch, "root update absorbed");
    }

    /// The export summary of `module`, overlay-aware.
    pub fn query_exports(&self, module: &str) -> ExportSummary {
        let _root = self.root_gate.enter_query();
        let _session = self.gate.enter_query();
        self.exports.get(&self.interner.intern(module))
    }

    /// The resolved type of `module.name`, overlay-aware.
    pub fn query_type(&self, module: &str, name: &str) -> TypeInfo {
        let _root = self.root_gate.enter_query();
        let _session = self.gate.enter_query();
        let key = TypeKey::Export(self.interner.intern(module), self.interner.intern(name));
        self.types.get(&key).as_type().unwrap_or(TypeInfo::Absent)
    }

    /// The diagnostics of `module`, overlay-aware.
    pub fn query_errors(&self, module: &str) -> Vec<Diagnostic> {
        let _root = self.root_gate.enter_query();
        let _session = self.gate.enter_query();
        self.errors.get(&self.interner.intern(module))
    }

    /// Counters of the session-local errors table.
    pub fn errors_stats(&self) -> StatsSnapshot {
        self.errors.stats()
    }
}
