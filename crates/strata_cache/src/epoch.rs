//! Update generations and the settlement gate.
//!
//! A query arriving while an update is in flight must observe either the
//! whole prior generation or the whole settled one, never a mix of
//! generations across keys. The gate realizes the simplest sound policy:
//! updates hold the write side for their full duration, queries hold the
//! read side, so queries block until the in-flight update settles.

use std::fmt;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A monotonically increasing update generation.
///
/// Bumped once per settled update batch; epoch `0` is the pristine state
/// before any update.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Epoch(u64);

impl Epoch {
    /// The generation number.
    pub fn as_u64(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Serializes updates against queries.
pub struct GenerationGate {
    epoch: RwLock<Epoch>,
}

impl GenerationGate {
    /// Creates a gate at epoch zero.
    pub fn new() -> Self {
        Self {
            epoch: RwLock::new(Epoch::default()),
        }
    }

    /// The last settled epoch.
    pub fn settled(&self) -> Epoch {
        *self.epoch.read().unwrap()
    }

    /// Begins an update, excluding queries until the returned guard is
    /// settled or dropped. Dropping without settling leaves the epoch
    /// unchanged (the update published nothing).
    pub fn begin_update(&self) -> UpdateGuard<'_> {
        UpdateGuard {
            slot: self.epoch.write().unwrap(),
        }
    }

    /// Enters a query, blocking while an update is in flight.
    pub fn enter_query(&self) -> QueryGuard<'_> {
        QueryGuard {
            slot: self.epoch.read().unwrap(),
        }
    }
}

impl Default for GenerationGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive hold on the gate for the duration of one update batch.
pub struct UpdateGuard<'a> {
    slot: RwLockWriteGuard<'a, Epoch>,
}

impl UpdateGuard<'_> {
    /// Publishes the update: bumps and returns the new settled epoch.
    pub fn settle(mut self) -> Epoch {
        *self.slot = self.slot.next();
        *self.slot
    }
}

/// Shared hold on the gate for the duration of one query.
pub struct QueryGuard<'a> {
    slot: RwLockReadGuard<'a, Epoch>,
}

impl QueryGuard<'_> {
    /// The settled epoch this query observes.
    pub fn epoch(&self) -> Epoch {
        *self.slot
    }
}
