//! Edge recording for an in-progress consumer computation.

use std::hash::Hash;

use crate::dep_id::DepId;
use crate::registry::DependencyRegistry;

/// Records the upstream reads of one in-progress computation.
///
/// A tracker is created by the cache when a key's producer runs, bound to
/// that key's consumer identity. The producer declares each trigger its
/// result logically depends on; every declaration becomes an edge in the
/// registry, replacing whatever edges the previous run of this consumer
/// had recorded.
pub struct DepTracker<'a, D> {
    registry: &'a DependencyRegistry<D>,
    consumer: DepId,
}

impl<'a, D> DepTracker<'a, D>
where
    D: Clone + Eq + Hash,
{
    /// Binds a tracker to `consumer` in `registry`.
    pub fn new(registry: &'a DependencyRegistry<D>, consumer: DepId) -> Self {
        Self { registry, consumer }
    }

    /// Declares that the current computation depends on `dep`.
    pub fn depends_on(&self, dep: D) {
        let id = self.registry.register(&dep);
        self.registry.record_edge(self.consumer, id);
    }

    /// The consumer identity this tracker records for.
    pub fn consumer(&self) -> DepId {
        self.consumer
    }
}
