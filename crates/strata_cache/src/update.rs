//! The update protocol: propagating a change batch through the chain.
//!
//! The base layer seeds a set of triggered dependency handles from the raw
//! change events. Each layer then intersects the accumulated set with its
//! recorded edges to find its invalidated keys, refreshes them according
//! to its mode, and grows the set with whatever its refresh actually
//! changed. Propagation reaches a fixed point as soon as every eager
//! layer's recomputed values come out equal to the old ones.

use std::collections::HashSet;

use tracing::debug;

use strata_deps::DepId;

use crate::epoch::Epoch;
use crate::overlay::OwnedSet;
use crate::scheduler::Scheduler;
use crate::spec::{Domain, LayerSpec, RefreshMode, View};
use crate::table::Cache;

/// The set of dependency handles triggered so far in one update cycle.
///
/// Threaded top-down through the chain; each layer consumes the handles
/// accumulated by everything upstream of it and appends its own.
#[derive(Debug, Default)]
pub struct TriggeredDeps {
    ids: HashSet<DepId>,
}

impl TriggeredDeps {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a handle, reporting whether it was new.
    pub fn insert(&mut self, id: DepId) -> bool {
        self.ids.insert(id)
    }

    /// Whether `id` has been triggered.
    pub fn contains(&self, id: DepId) -> bool {
        self.ids.contains(&id)
    }

    /// Number of triggered handles.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing has been triggered.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The underlying handle set.
    pub fn as_set(&self) -> &HashSet<DepId> {
        &self.ids
    }
}

impl FromIterator<DepId> for TriggeredDeps {
    fn from_iter<T: IntoIterator<Item = DepId>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// What one layer did during an update cycle.
#[derive(Debug)]
pub struct LayerUpdate<K> {
    /// Keys whose recorded dependencies were triggered.
    pub invalidated: Vec<K>,
    /// Keys recomputed during the update (eager layers only).
    pub recomputed: usize,
    /// Keys forwarded downstream: for eager layers, those whose value
    /// actually changed; for lazy layers, every invalidated key.
    pub changed: Vec<K>,
}

impl<K> LayerUpdate<K> {
    /// Condenses this outcome into a report row.
    pub fn report(&self, layer: &'static str) -> LayerReport {
        LayerReport {
            layer,
            invalidated: self.invalidated.len(),
            recomputed: self.recomputed,
            changed: self.changed.len(),
        }
    }
}

/// Per-layer summary row of an [`UpdateResult`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LayerReport {
    /// Layer name.
    pub layer: &'static str,
    /// Keys invalidated.
    pub invalidated: usize,
    /// Keys recomputed during the update.
    pub recomputed: usize,
    /// Keys forwarded downstream as changed.
    pub changed: usize,
}

/// The outcome of one settled update batch.
#[derive(Debug)]
pub struct UpdateResult {
    /// The generation this update published.
    pub epoch: Epoch,
    /// Per-layer activity, base-first.
    pub layers: Vec<LayerReport>,
    /// Total distinct dependency handles triggered across the cycle.
    pub triggered: usize,
}

impl UpdateResult {
    /// Whether the batch changed nothing observable.
    pub fn is_quiescent(&self) -> bool {
        self.layers.iter().all(|l| l.changed == 0)
    }
}

/// Runs one layer's share of the update protocol.
///
/// With `owned` set, only keys belonging to an owned unit are touched;
/// overlay layers use this to confine refresh to their session's keys.
pub(crate) fn run_layer_update<G: Domain, S: LayerSpec<G>>(
    cache: &Cache<G, S>,
    upstream: &dyn View<S::UpKey, S::UpValue>,
    triggered: &mut TriggeredDeps,
    scheduler: &Scheduler,
    owned: Option<&OwnedSet<G::Owner>>,
) -> LayerUpdate<S::Key> {
    let spec = cache.spec();
    let registry = cache.registry();

    let mut invalidated: Vec<S::Key> = registry
        .dependents_of(triggered.as_set())
        .into_iter()
        .filter_map(|id| registry.resolve(id))
        .filter_map(|dep| spec.filter_upstream_dependency(&dep))
        .collect();
    if let Some(owned) = owned {
        invalidated.retain(|key| owned.owns(&spec.owner_of(key)));
    }

    let outcome = match spec.refresh_mode() {
        RefreshMode::Lazy => {
            cache.invalidate(&invalidated);
            for key in &invalidated {
                triggered.insert(registry.register(&spec.trigger_to_dependency(key)));
            }
            LayerUpdate {
                changed: invalidated.clone(),
                recomputed: 0,
                invalidated,
            }
        }
        RefreshMode::Eager => {
            let refreshed: Vec<(Option<S::Value>, S::Value)> = scheduler
                .map(&invalidated, |key| {
                    let old = cache.peek(key);
                    let new = cache.produce(upstream, key);
                    (old, new)
                });
            let mut changed = Vec::new();
            for (key, (old, new)) in invalidated.iter().zip(&refreshed) {
                let is_changed = match old {
                    Some(old) => !spec.equal_value(old, new),
                    None => true,
                };
                if is_changed {
                    for dep in spec.changed_dependencies(key, old.as_ref(), new) {
                        triggered.insert(registry.register(&dep));
                    }
                    changed.push(key.clone());
                }
            }
            LayerUpdate {
                recomputed: invalidated.len(),
                invalidated,
                changed,
            }
        }
    };

    debug!(
        layer = spec.name(),
        invalidated = outcome.invalidated.len(),
        recomputed = outcome.recomputed,
        changed = outcome.changed.len(),
        "layer update"
    );
    outcome
}
