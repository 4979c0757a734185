//! One stage of the pipeline chain.

use std::sync::Arc;

use strata_deps::DependencyRegistry;

use crate::scheduler::Scheduler;
use crate::spec::{Domain, LayerSpec, View};
use crate::table::{Cache, StatsSnapshot};
use crate::update::{run_layer_update, LayerUpdate, TriggeredDeps};

/// A pipeline layer: a memoization table plus exactly one upstream.
///
/// The upstream is held as `Arc` and reached only through [`View`], so a
/// layer can read but never mutate the stage above it. Chains are built
/// bottom-up at session start by handing each new layer the previous one.
pub struct Layer<G: Domain, S: LayerSpec<G>, U: View<S::UpKey, S::UpValue>> {
    cache: Cache<G, S>,
    upstream: Arc<U>,
}

impl<G, S, U> Layer<G, S, U>
where
    G: Domain,
    S: LayerSpec<G>,
    U: View<S::UpKey, S::UpValue>,
{
    /// Builds a layer with an empty table over `upstream`.
    pub fn new(spec: S, upstream: Arc<U>, registry: Arc<DependencyRegistry<G::Dep>>) -> Self {
        Self {
            cache: Cache::new(spec, registry),
            upstream,
        }
    }

    /// Returns the value for `key`, computing it on a miss.
    pub fn get(&self, key: &S::Key) -> S::Value {
        self.cache.get(&*self.upstream, key)
    }

    /// Runs this layer's share of the update protocol, consuming the
    /// triggered set accumulated upstream and appending its own.
    pub fn update(&self, triggered: &mut TriggeredDeps, scheduler: &Scheduler) -> LayerUpdate<S::Key> {
        run_layer_update(&self.cache, &*self.upstream, triggered, scheduler, None)
    }

    /// The layer directly upstream.
    pub fn upstream(&self) -> &Arc<U> {
        &self.upstream
    }

    /// The spec driving this layer.
    pub fn spec(&self) -> &S {
        self.cache.spec()
    }

    /// This layer's memoization table.
    pub fn cache(&self) -> &Cache<G, S> {
        &self.cache
    }

    /// Snapshot of the table's activity counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.cache.stats()
    }
}

impl<G, S, U> View<S::Key, S::Value> for Layer<G, S, U>
where
    G: Domain,
    S: LayerSpec<G>,
    U: View<S::UpKey, S::UpValue>,
{
    fn read(&self, key: &S::Key) -> S::Value {
        self.get(key)
    }
}
