//! The incremental computation engine: chained memoization layers with
//! dependency-tracked invalidation.
//!
//! A pipeline is a linear chain of [`Layer`]s over a [`BaseLayer`] that
//! wraps raw source content. Each layer memoizes one kind of fact in a
//! [`Cache`] and reads only from the layer directly upstream. Source
//! changes enter at the base and propagate through the chain as a set of
//! triggered dependencies; each layer evicts or recomputes exactly the
//! keys whose recorded dependencies were triggered, and eager layers stop
//! propagation early when recomputed values come out equal.
//!
//! [`OverlayLayer`] provides isolated, session-scoped shadows of the
//! pipeline for speculative single-file re-analysis.

#![warn(missing_docs)]

pub mod base;
pub mod epoch;
pub mod layer;
pub mod overlay;
pub mod scheduler;
pub mod spec;
pub mod table;
pub mod update;

pub use base::{BaseLayer, BaseSpec};
pub use epoch::{Epoch, GenerationGate, QueryGuard, UpdateGuard};
pub use layer::Layer;
pub use overlay::{CodeUpdate, OverlayBase, OverlayLayer, OwnedSet};
pub use scheduler::Scheduler;
pub use spec::{Domain, LayerSpec, RefreshMode, View};
pub use table::{Cache, StatsSnapshot};
pub use update::{LayerReport, LayerUpdate, TriggeredDeps, UpdateResult};
