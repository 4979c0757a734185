//! Overlay sessions: isolated shadows of the pipeline for speculative
//! re-analysis of a few files.
//!
//! An overlay owns a set of ownership units (modules). For owned keys it
//! keeps its own cache chain, computed against an upstream that is itself
//! the overlay of the stage above; for everything else it delegates
//! straight to the root, so it can never be staler than root for
//! information it does not override. Overlays record edges into their own
//! registry, leaving the root's dependency index untouched.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::path::Path;
use std::sync::{Arc, RwLock};

use strata_deps::DependencyRegistry;

use crate::base::{BaseLayer, BaseSpec};
use crate::layer::Layer;
use crate::scheduler::Scheduler;
use crate::spec::{Domain, LayerSpec, View};
use crate::table::{Cache, StatsSnapshot};
use crate::update::{run_layer_update, LayerUpdate, TriggeredDeps};

/// One overlay code edit, per path.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum CodeUpdate {
    /// Replace the file's content wholesale.
    Set(String),
    /// Treat the file as deleted within the overlay.
    Delete,
}

/// The ownership units a session has claimed, shared by every stage of an
/// overlay chain.
pub struct OwnedSet<O> {
    set: RwLock<HashSet<O>>,
}

impl<O: Clone + Eq + Hash> OwnedSet<O> {
    /// Creates an empty ownership set.
    pub fn new() -> Self {
        Self {
            set: RwLock::new(HashSet::new()),
        }
    }

    /// Whether `owner` is claimed by this session.
    pub fn owns(&self, owner: &O) -> bool {
        self.set.read().unwrap().contains(owner)
    }

    /// Claims `owner`, reporting whether it was newly claimed.
    pub fn insert(&self, owner: O) -> bool {
        self.set.write().unwrap().insert(owner)
    }

    /// Number of claimed units.
    pub fn len(&self) -> usize {
        self.set.read().unwrap().len()
    }

    /// Whether nothing is claimed.
    pub fn is_empty(&self) -> bool {
        self.set.read().unwrap().is_empty()
    }
}

impl<O: Clone + Eq + Hash> Default for OwnedSet<O> {
    fn default() -> Self {
        Self::new()
    }
}

/// The overlay's base: in-memory content for owned keys, root fallback for
/// the rest.
pub struct OverlayBase<G: Domain, B: BaseSpec<G>> {
    root: Arc<BaseLayer<G, B>>,
    local: RwLock<HashMap<B::Key, B::Value>>,
    owned: Arc<OwnedSet<G::Owner>>,
}

impl<G: Domain, B: BaseSpec<G>> OverlayBase<G, B> {
    /// Creates an empty overlay base over `root`.
    pub fn new(root: Arc<BaseLayer<G, B>>, owned: Arc<OwnedSet<G::Owner>>) -> Self {
        Self {
            root,
            local: RwLock::new(HashMap::new()),
            owned,
        }
    }

    /// Applies one overlay code edit.
    ///
    /// Claims the path's ownership unit, replaces the local content
    /// wholesale (a deletion stores the absent value), and returns the
    /// affected key with the dependency seeds to trigger. Paths outside
    /// the tracked domain return `None`.
    pub fn apply_code(&self, path: &Path, update: &CodeUpdate) -> Option<(B::Key, Vec<G::Dep>)> {
        let (key, owner, dep, value) = self.root.with_state(|base| {
            let key = base.key_for_path(path)?;
            let owner = base.owner_of(&key);
            let dep = base.key_to_dependency(&key);
            let value = match update {
                CodeUpdate::Set(code) => base.value_from_code(code),
                CodeUpdate::Delete => base.absent_value(),
            };
            Some((key, owner, dep, value))
        })?;
        self.owned.insert(owner);
        self.local.write().unwrap().insert(key.clone(), value);
        Some((key, vec![dep]))
    }

    /// The root base this overlay shadows.
    pub fn root(&self) -> &Arc<BaseLayer<G, B>> {
        &self.root
    }
}

impl<G: Domain, B: BaseSpec<G>> View<B::Key, B::Value> for OverlayBase<G, B> {
    fn read(&self, key: &B::Key) -> B::Value {
        let owner = self.root.with_state(|base| base.owner_of(key));
        if self.owned.owns(&owner) {
            if let Some(value) = self.local.read().unwrap().get(key) {
                return value.clone();
            }
            return self.root.with_state(|base| base.absent_value());
        }
        self.root.as_ref().read(key)
    }
}

/// An overlay of one pipeline layer.
///
/// Holds a local cache for owned keys computed against the overlay
/// upstream `U`, and the root layer (over its own upstream `RU`) for
/// everything else.
pub struct OverlayLayer<G, S, RU, U>
where
    G: Domain,
    S: LayerSpec<G>,
    RU: View<S::UpKey, S::UpValue>,
    U: View<S::UpKey, S::UpValue>,
{
    local: Cache<G, S>,
    root: Arc<Layer<G, S, RU>>,
    upstream: Arc<U>,
    owned: Arc<OwnedSet<G::Owner>>,
}

impl<G, S, RU, U> OverlayLayer<G, S, RU, U>
where
    G: Domain,
    S: LayerSpec<G>,
    RU: View<S::UpKey, S::UpValue>,
    U: View<S::UpKey, S::UpValue>,
{
    /// Creates an overlay of `root` reading through `upstream`.
    ///
    /// `registry` must be the overlay session's registry, never the
    /// root's: overlay recomputation must not disturb root edges.
    pub fn new(
        spec: S,
        root: Arc<Layer<G, S, RU>>,
        upstream: Arc<U>,
        registry: Arc<DependencyRegistry<G::Dep>>,
        owned: Arc<OwnedSet<G::Owner>>,
    ) -> Self {
        Self {
            local: Cache::new(spec, registry),
            root,
            upstream,
            owned,
        }
    }

    /// Returns the value for `key`: overlay-local for owned keys, root
    /// otherwise.
    pub fn get(&self, key: &S::Key) -> S::Value {
        if self.owned.owns(&self.local.spec().owner_of(key)) {
            self.local.get(&*self.upstream, key)
        } else {
            self.root.get(key)
        }
    }

    /// Runs the update protocol over the overlay's owned keys only.
    pub fn update(&self, triggered: &mut TriggeredDeps, scheduler: &Scheduler) -> LayerUpdate<S::Key> {
        run_layer_update(
            &self.local,
            &*self.upstream,
            triggered,
            scheduler,
            Some(&self.owned),
        )
    }

    /// Drops every local entry belonging to `owner`, returning the count.
    ///
    /// Used when a session replaces a file wholesale, so no residue of the
    /// previous content survives.
    pub fn evict_owner(&self, owner: &G::Owner) -> usize {
        let spec = self.local.spec();
        self.local.evict_where(|key| spec.owner_of(key) == *owner)
    }

    /// The overlay's local table.
    pub fn cache(&self) -> &Cache<G, S> {
        &self.local
    }

    /// The root layer this overlay shadows.
    pub fn root(&self) -> &Arc<Layer<G, S, RU>> {
        &self.root
    }

    /// Snapshot of the local table's counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.local.stats()
    }
}

impl<G, S, RU, U> View<S::Key, S::Value> for OverlayLayer<G, S, RU, U>
where
    G: Domain,
    S: LayerSpec<G>,
    RU: View<S::UpKey, S::UpValue>,
    U: View<S::UpKey, S::UpValue>,
{
    fn read(&self, key: &S::Key) -> S::Value {
        self.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::RefreshMode;
    use strata_deps::DepTracker;
    use strata_source::{ChangeEvent, ChangeKind};

    struct TestDomain;
    impl Domain for TestDomain {
        type Dep = String;
        type Owner = String;
    }

    /// Base: module name → its content length.
    struct LenBase {
        lens: HashMap<String, i64>,
    }

    impl BaseSpec<TestDomain> for LenBase {
        type Key = String;
        type Value = i64;

        fn apply_event(&mut self, event: &ChangeEvent) -> Vec<String> {
            let key = self.key_for_path(&event.path).unwrap();
            match event.kind {
                ChangeKind::Deleted => {
                    self.lens.remove(&key);
                }
                _ => {
                    *self.lens.entry(key.clone()).or_insert(0) += 1;
                }
            }
            vec![format!("content:{key}")]
        }

        fn read(&self, key: &String) -> i64 {
            *self.lens.get(key).unwrap_or(&0)
        }

        fn key_for_path(&self, path: &Path) -> Option<String> {
            path.file_stem()?.to_str().map(str::to_string)
        }

        fn key_to_dependency(&self, key: &String) -> String {
            format!("content:{key}")
        }

        fn owner_of(&self, key: &String) -> String {
            key.clone()
        }

        fn value_from_code(&self, code: &str) -> i64 {
            code.len() as i64
        }

        fn absent_value(&self) -> i64 {
            0
        }
    }

    /// Cached layer: negates the base value.
    #[derive(Clone)]
    struct NegateSpec;

    impl LayerSpec<TestDomain> for NegateSpec {
        type Key = String;
        type Value = i64;
        type UpKey = String;
        type UpValue = i64;

        fn name(&self) -> &'static str {
            "negate"
        }

        fn refresh_mode(&self) -> RefreshMode {
            RefreshMode::Lazy
        }

        fn produce_value(
            &self,
            upstream: &dyn View<String, i64>,
            key: &String,
            deps: &DepTracker<'_, String>,
        ) -> i64 {
            deps.depends_on(format!("content:{key}"));
            -upstream.read(key)
        }

        fn filter_upstream_dependency(&self, dep: &String) -> Option<String> {
            dep.strip_prefix("negate:").map(str::to_string)
        }

        fn trigger_to_dependency(&self, key: &String) -> String {
            format!("negate:{key}")
        }

        fn equal_value(&self, a: &i64, b: &i64) -> bool {
            a == b
        }

        fn owner_of(&self, key: &String) -> String {
            key.clone()
        }
    }

    type TestBase = BaseLayer<TestDomain, LenBase>;
    type TestLayer = Layer<TestDomain, NegateSpec, TestBase>;
    type TestOverlayBase = OverlayBase<TestDomain, LenBase>;
    type TestOverlay = OverlayLayer<TestDomain, NegateSpec, TestBase, TestOverlayBase>;

    struct Fixture {
        root: Arc<TestLayer>,
        overlay_base: Arc<TestOverlayBase>,
        overlay: TestOverlay,
    }

    fn make_fixture() -> Fixture {
        let registry = Arc::new(DependencyRegistry::new());
        let base = Arc::new(BaseLayer::new(
            LenBase {
                lens: HashMap::new(),
            },
            Arc::clone(&registry),
        ));
        base.apply_events(&[ChangeEvent::created("a.st"), ChangeEvent::created("b.st")]);
        let root = Arc::new(Layer::new(NegateSpec, Arc::clone(&base), registry));

        let owned = Arc::new(OwnedSet::new());
        let overlay_registry = Arc::new(DependencyRegistry::new());
        let overlay_base = Arc::new(OverlayBase::new(Arc::clone(&base), Arc::clone(&owned)));
        let overlay = OverlayLayer::new(
            NegateSpec,
            Arc::clone(&root),
            Arc::clone(&overlay_base),
            overlay_registry,
            owned,
        );
        Fixture {
            root,
            overlay_base,
            overlay,
        }
    }

    #[test]
    fn unowned_keys_delegate_to_root() {
        let fx = make_fixture();
        assert_eq!(fx.overlay.get(&"a".to_string()), -1);
        // Served by the root table, not the overlay's.
        assert_eq!(fx.overlay.stats().produces, 0);
        assert_eq!(fx.root.stats().produces, 1);
    }

    #[test]
    fn owned_keys_shadow_root() {
        let fx = make_fixture();
        let key = "a".to_string();
        assert_eq!(fx.root.get(&key), -1);

        fx.overlay_base
            .apply_code(Path::new("a.st"), &CodeUpdate::Set("12345".into()));
        assert_eq!(fx.overlay.get(&key), -5);
        // Root answer is untouched.
        assert_eq!(fx.root.get(&key), -1);
    }

    #[test]
    fn overlay_delete_serves_absent() {
        let fx = make_fixture();
        fx.overlay_base
            .apply_code(Path::new("a.st"), &CodeUpdate::Delete);
        assert_eq!(fx.overlay.get(&"a".to_string()), 0);
        assert_eq!(fx.root.get(&"a".to_string()), -1);
    }

    #[test]
    fn evict_owner_drops_only_that_owner() {
        let fx = make_fixture();
        fx.overlay_base
            .apply_code(Path::new("a.st"), &CodeUpdate::Set("xx".into()));
        fx.overlay_base
            .apply_code(Path::new("b.st"), &CodeUpdate::Set("yyy".into()));
        fx.overlay.get(&"a".to_string());
        fx.overlay.get(&"b".to_string());

        assert_eq!(fx.overlay.evict_owner(&"a".to_string()), 1);
        assert!(fx.overlay.cache().peek(&"a".to_string()).is_none());
        assert!(fx.overlay.cache().peek(&"b".to_string()).is_some());
    }

    #[test]
    fn overlay_edges_stay_out_of_root_registry() {
        let fx = make_fixture();
        let root_edges = fx.root.cache().registry().edge_count();
        fx.overlay_base
            .apply_code(Path::new("a.st"), &CodeUpdate::Set("12345".into()));
        fx.overlay.get(&"a".to_string());
        assert_eq!(fx.root.cache().registry().edge_count(), root_edges);
        assert_eq!(fx.overlay.cache().registry().edge_count(), 1);
    }

    #[test]
    fn overlay_update_confined_to_owned_keys() {
        let fx = make_fixture();
        let scheduler = Scheduler::new(2).unwrap();
        fx.overlay_base
            .apply_code(Path::new("a.st"), &CodeUpdate::Set("xx".into()));
        fx.overlay.get(&"a".to_string());

        // Replace the owned file again and run the overlay protocol.
        let (_, deps) = fx
            .overlay_base
            .apply_code(Path::new("a.st"), &CodeUpdate::Set("xxxx".into()))
            .unwrap();
        let registry = Arc::clone(fx.overlay.cache().registry());
        let mut triggered: TriggeredDeps =
            deps.iter().map(|d| registry.register(d)).collect();
        let outcome = fx.overlay.update(&mut triggered, &scheduler);

        assert_eq!(outcome.invalidated, vec!["a".to_string()]);
        assert_eq!(fx.overlay.get(&"a".to_string()), -4);
    }
}
