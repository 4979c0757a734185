//! Parallel map-reduce executor for bulk recomputation.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

/// A fixed worker pool that fans bulk producer work out and aggregates the
/// results.
///
/// The engine's control flow stays single-threaded; only the per-key
/// producer calls of an eager refresh run on the pool. Results are
/// aggregated positionally with no ordering guarantee during execution.
pub struct Scheduler {
    pool: ThreadPool,
}

impl Scheduler {
    /// Builds a scheduler with `workers` threads. Zero means one thread
    /// per available core.
    pub fn new(workers: usize) -> Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("strata-worker-{i}"))
            .build()?;
        Ok(Self { pool })
    }

    /// Applies `f` to every item on the pool, returning results in input
    /// order.
    pub fn map<I, R, F>(&self, items: &[I], f: F) -> Vec<R>
    where
        I: Sync,
        R: Send,
        F: Fn(&I) -> R + Send + Sync,
    {
        self.pool.install(|| items.par_iter().map(|item| f(item)).collect())
    }

    /// Number of worker threads in the pool.
    pub fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }
}
