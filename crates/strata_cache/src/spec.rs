//! The seams between the generic engine and per-layer domain logic.
//!
//! Layer behavior is supplied as a strategy object implementing
//! [`LayerSpec`], never by subclassing the cache machinery: the engine
//! calls the spec's callbacks, and composed behavior is built by wrapping
//! layers around an upstream [`View`].

use std::fmt;
use std::hash::Hash;

use strata_deps::DepTracker;

/// The pipeline-wide type vocabulary shared by every layer of one chain.
pub trait Domain: Send + Sync + 'static {
    /// The dependency description union: both "what changed" triggers and
    /// "who consumed it" consumer identities for every layer.
    type Dep: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    /// The unit of overlay ownership, typically a module name.
    type Owner: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;
}

/// How a layer handles invalidated keys during an update.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RefreshMode {
    /// Evict invalidated entries and recompute on the next `get`.
    /// Propagation downstream is conservative: every invalidated key is
    /// forwarded as triggered.
    Lazy,
    /// Recompute invalidated entries during the update and forward only
    /// keys whose value actually changed (change suppression). Required
    /// when downstream consumers need exact change sets.
    Eager,
}

/// Capability-limited read access to a layer.
///
/// This is the only surface a layer exposes to the layer downstream of it:
/// a `get` that may compute on miss but can never mutate the cache
/// directly. Invalidation flows exclusively through recorded dependency
/// edges.
pub trait View<K, V>: Send + Sync {
    /// Reads the value for `key`, computing it on a miss.
    fn read(&self, key: &K) -> V;
}

/// The business logic of one pipeline layer.
///
/// Implementations must be pure functions of upstream state: `produce_value`
/// may read only through the given upstream view, must be total over its
/// key domain (unknown keys yield an absent/sentinel value, never a fault),
/// and must have no side effects beyond its return value. Under those
/// rules concurrent duplicate computations of one key are harmless and the
/// engine needs no per-key locking.
pub trait LayerSpec<G: Domain>: Send + Sync + 'static {
    /// Identity of a memoized fact within this layer.
    type Key: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;
    /// The memoized result for a key.
    type Value: Clone + fmt::Debug + Send + Sync + 'static;
    /// Key type of the layer directly upstream.
    type UpKey: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;
    /// Value type of the layer directly upstream.
    type UpValue: Clone + fmt::Debug + Send + Sync + 'static;

    /// Short stable layer name for reports and logging.
    fn name(&self) -> &'static str;

    /// How this layer refreshes invalidated keys. Defaults to lazy.
    fn refresh_mode(&self) -> RefreshMode {
        RefreshMode::Lazy
    }

    /// Computes the value for `key` from upstream state.
    ///
    /// Every trigger the result logically depends on must be declared
    /// through `deps`; the engine has already discarded the edges of the
    /// previous run, so the declarations here fully replace them.
    fn produce_value(
        &self,
        upstream: &dyn View<Self::UpKey, Self::UpValue>,
        key: &Self::Key,
        deps: &DepTracker<'_, G::Dep>,
    ) -> Self::Value;

    /// Maps a triggered consumer identity back to this layer's key, or
    /// `None` when the identity belongs to another layer.
    fn filter_upstream_dependency(&self, dep: &G::Dep) -> Option<Self::Key>;

    /// The consumer identity under which this layer's `key` registers its
    /// own reads, and which downstream layers trigger on.
    fn trigger_to_dependency(&self, key: &Self::Key) -> G::Dep;

    /// Value equality used for change suppression.
    fn equal_value(&self, a: &Self::Value, b: &Self::Value) -> bool;

    /// The overlay ownership unit `key` belongs to.
    fn owner_of(&self, key: &Self::Key) -> G::Owner;

    /// The dependencies to trigger downstream when `key`'s value changed
    /// from `old` to `new` during an eager update.
    ///
    /// The default triggers the key's own dependency. Layers that can diff
    /// their values emit finer-grained triggers instead, so consumers that
    /// read an unaffected part of the value are left untouched.
    fn changed_dependencies(
        &self,
        key: &Self::Key,
        old: Option<&Self::Value>,
        new: &Self::Value,
    ) -> Vec<G::Dep> {
        let _ = (old, new);
        vec![self.trigger_to_dependency(key)]
    }
}
