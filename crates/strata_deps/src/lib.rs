//! Dependency registration for incremental invalidation.
//!
//! The registry interns abstract "something upstream changed" descriptions
//! into stable [`DepId`] handles and maintains a concurrent reverse index
//! from each handle to the consumers that read it. The update protocol
//! intersects a batch's triggered handles with this index to find exactly
//! the facts that must be recomputed.

#![warn(missing_docs)]

pub mod dep_id;
pub mod registry;
pub mod tracker;

pub use dep_id::DepId;
pub use registry::DependencyRegistry;
pub use tracker::DepTracker;
