//! Thread-safe handle to a lot.
//!
//! Mutations hold the write lock across the whole pool + index + ledger
//! update, so no caller can observe a slot that left its pool without its
//! ledger entry. Reports take the read lock for the duration of the scan.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::analytics::AnalyticsSnapshot;
use crate::error::Rejected;
use crate::manager::AllocationManager;
use crate::occupancy::OccupancyView;
use crate::slot::SlotId;

#[derive(Clone)]
pub struct SharedLot {
    inner: Arc<RwLock<AllocationManager>>,
}

impl SharedLot {
    pub fn new(manager: AllocationManager) -> Self {
        Self {
            inner: Arc::new(RwLock::new(manager)),
        }
    }

    pub fn check_in(&self, plate: &str, vip: bool) -> Result<SlotId, Rejected> {
        self.inner.write().check_in(plate, vip)
    }

    pub fn check_out(&self, plate: &str) -> Result<SlotId, Rejected> {
        self.inner.write().check_out(plate)
    }

    pub fn analytics_snapshot(&self) -> AnalyticsSnapshot {
        self.inner.read().analytics_snapshot()
    }

    pub fn occupancy_snapshot(&self) -> Vec<OccupancyView> {
        self.inner.read().occupancy_snapshot()
    }

    /// Run `f` against a consistent view of the lot
    pub fn with_read<R>(&self, f: impl FnOnce(&AllocationManager) -> R) -> R {
        f(&self.inner.read())
    }
}

impl std::fmt::Debug for SharedLot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SharedLot").field(&*self.inner.read()).finish()
    }
}
