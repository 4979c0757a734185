//! The dependency registry: interning plus the reverse dependency index.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use dashmap::DashMap;

use crate::dep_id::DepId;

/// Interns dependency descriptions and tracks who depends on what.
///
/// `D` is the pipeline-wide dependency description: a single union covering
/// both "what changed" triggers and "who consumed it" consumer identities.
/// Every operation is a total function and safe under concurrent calls from
/// scheduler workers; the two indices are additive multimaps with
/// commutative merges, so edge recording from parallel recomputation needs
/// no external coordination.
pub struct DependencyRegistry<D> {
    /// Description → handle, deduplicated by content.
    intern: DashMap<D, DepId>,
    /// Handle → description, for resolving triggered handles during update.
    descriptions: DashMap<DepId, D>,
    /// Next handle index.
    next: AtomicU32,
    /// Dependency → consumers that recorded a read of it.
    dependents: DashMap<DepId, HashSet<DepId>>,
    /// Consumer → dependencies it recorded, so a recomputation can discard
    /// its stale edges before registering fresh ones.
    forward: DashMap<DepId, HashSet<DepId>>,
    /// Total number of live edges, for logging.
    edge_count: AtomicU64,
}

impl<D> DependencyRegistry<D>
where
    D: Clone + Eq + Hash,
{
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            intern: DashMap::new(),
            descriptions: DashMap::new(),
            next: AtomicU32::new(0),
            dependents: DashMap::new(),
            forward: DashMap::new(),
            edge_count: AtomicU64::new(0),
        }
    }

    /// Interns a dependency description, returning its stable handle.
    ///
    /// Idempotent: the same description always maps to the same handle,
    /// including under concurrent registration from multiple workers.
    pub fn register(&self, dep: &D) -> DepId {
        if let Some(id) = self.intern.get(dep) {
            return *id;
        }
        let entry = self.intern.entry(dep.clone()).or_insert_with(|| {
            let id = DepId::from_raw(self.next.fetch_add(1, Ordering::Relaxed));
            self.descriptions.insert(id, dep.clone());
            id
        });
        *entry
    }

    /// Looks up a description's handle without registering it.
    pub fn lookup(&self, dep: &D) -> Option<DepId> {
        self.intern.get(dep).map(|id| *id)
    }

    /// Resolves a handle back to its description.
    pub fn resolve(&self, id: DepId) -> Option<D> {
        self.descriptions.get(&id).map(|d| d.clone())
    }

    /// Records that `consumer` read `dependency`.
    ///
    /// Additive and commutative; duplicate recordings collapse.
    pub fn record_edge(&self, consumer: DepId, dependency: DepId) {
        if self.dependents.entry(dependency).or_default().insert(consumer) {
            self.edge_count.fetch_add(1, Ordering::Relaxed);
        }
        self.forward.entry(consumer).or_default().insert(dependency);
    }

    /// Returns every consumer that recorded a read of any triggered handle.
    pub fn dependents_of(&self, triggered: &HashSet<DepId>) -> HashSet<DepId> {
        let mut out = HashSet::new();
        for id in triggered {
            if let Some(consumers) = self.dependents.get(id) {
                out.extend(consumers.iter().copied());
            }
        }
        out
    }

    /// Discards all edges recorded by `consumer`.
    ///
    /// Called before a consumer recomputes, so edges from the previous run
    /// never outlive the value they justified.
    pub fn clear_edges(&self, consumer: DepId) {
        let Some((_, deps)) = self.forward.remove(&consumer) else {
            return;
        };
        for dep in deps {
            if let Some(mut consumers) = self.dependents.get_mut(&dep) {
                if consumers.remove(&consumer) {
                    self.edge_count.fetch_sub(1, Ordering::Relaxed);
                }
            }
        }
    }

    /// Number of distinct descriptions interned so far.
    pub fn interned_count(&self) -> usize {
        self.intern.len()
    }

    /// Number of live edges in the reverse index.
    pub fn edge_count(&self) -> u64 {
        self.edge_count.load(Ordering::Relaxed)
    }
}

impl<D> Default for DependencyRegistry<D>
where
    D: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<D> fmt::Debug for DependencyRegistry<D>
where
    D: Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyRegistry")
            .field("interned", &self.intern.len())
            .field("edges", &self.edge_count.load(Ordering::Relaxed))
            .finish()
    }
}
