//! The keyed memoization table backing one layer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use strata_deps::{DepTracker, DependencyRegistry};

use crate::spec::{Domain, LayerSpec, View};

/// Atomic counters describing one table's activity.
///
/// Exposed so callers (and the engine's own tests) can assert that
/// unaffected keys were served from memory without recomputation.
#[derive(Default)]
pub(crate) struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    produces: AtomicU64,
    invalidated: AtomicU64,
}

/// A point-in-time copy of a table's counters.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct StatsSnapshot {
    /// `get` calls served from the table.
    pub hits: u64,
    /// `get` calls that found no entry.
    pub misses: u64,
    /// Producer executions (both on-miss and eager refresh).
    pub produces: u64,
    /// Entries dropped by invalidation.
    pub invalidated: u64,
}

/// A generic Key → Value memoization store with compute-on-miss.
///
/// The backing map is shared across scheduler workers. Writers to disjoint
/// keys never contend beyond the map shard; concurrent writers to the same
/// key are benign because producers are pure functions of upstream state,
/// so last-write-wins converges on one observable result per key.
pub struct Cache<G: Domain, S: LayerSpec<G>> {
    spec: S,
    table: DashMap<S::Key, S::Value>,
    registry: Arc<DependencyRegistry<G::Dep>>,
    stats: CacheStats,
}

impl<G: Domain, S: LayerSpec<G>> Cache<G, S> {
    /// Creates an empty table for `spec`, recording edges into `registry`.
    pub fn new(spec: S, registry: Arc<DependencyRegistry<G::Dep>>) -> Self {
        Self {
            spec,
            table: DashMap::new(),
            registry,
            stats: CacheStats::default(),
        }
    }

    /// Returns the memoized value for `key`, computing it on a miss.
    ///
    /// A hit returns a clone of the stored value with no side effects.
    pub fn get(&self, upstream: &dyn View<S::UpKey, S::UpValue>, key: &S::Key) -> S::Value {
        if let Some(value) = self.table.get(key) {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            return value.clone();
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        self.produce(upstream, key)
    }

    /// Returns the memoized value for `key` without computing.
    pub fn peek(&self, key: &S::Key) -> Option<S::Value> {
        self.table.get(key).map(|value| value.clone())
    }

    /// Runs the producer for `key` and stores the result.
    ///
    /// The key's stale edges are discarded first, so the edges recorded by
    /// this run fully replace those of the previous one. The computation
    /// happens outside any map lock; the insert is last-write-wins.
    pub fn produce(&self, upstream: &dyn View<S::UpKey, S::UpValue>, key: &S::Key) -> S::Value {
        let consumer = self.registry.register(&self.spec.trigger_to_dependency(key));
        self.registry.clear_edges(consumer);
        let tracker = DepTracker::new(&self.registry, consumer);
        let value = self.spec.produce_value(upstream, key, &tracker);
        self.stats.produces.fetch_add(1, Ordering::Relaxed);
        self.table.insert(key.clone(), value.clone());
        value
    }

    /// Drops the entries for `keys`. Missing keys are ignored, so passing
    /// a superset of the affected keys is acceptable.
    pub fn invalidate(&self, keys: &[S::Key]) {
        for key in keys {
            if self.table.remove(key).is_some() {
                self.stats.invalidated.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Drops every entry whose key matches `pred`, returning the count.
    pub fn evict_where(&self, pred: impl Fn(&S::Key) -> bool) -> usize {
        let victims: Vec<S::Key> = self
            .table
            .iter()
            .filter(|entry| pred(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();
        let mut dropped = 0;
        for key in &victims {
            if self.table.remove(key).is_some() {
                dropped += 1;
            }
        }
        self.stats
            .invalidated
            .fetch_add(dropped as u64, Ordering::Relaxed);
        dropped
    }

    /// Number of memoized entries.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` when nothing is memoized.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The layer spec driving this table.
    pub fn spec(&self) -> &S {
        &self.spec
    }

    /// The registry this table records edges into.
    pub fn registry(&self) -> &Arc<DependencyRegistry<G::Dep>> {
        &self.registry
    }

    /// Snapshot of the activity counters.
    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            produces: self.stats.produces.load(Ordering::Relaxed),
            invalidated: self.stats.invalidated.load(Ordering::Relaxed),
        }
    }
}
