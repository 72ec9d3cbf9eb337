//! Occupancy Index - which check-in currently holds which slot.
//!
//! The same plate may be checked in more than once before it leaves, so
//! occupancies are keyed per check-in event rather than per plate. Plates map
//! to an ordered set of their keys, which makes "the earliest check-in for
//! this plate" a constant-time lookup and keeps check-out deterministic.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::error::OccupancyError;
use crate::slot::{Slot, SlotId, Tier};

/// Identifies one check-in event.
///
/// Ordering is plate, then entry time, then sequence number, so within one
/// plate the earliest check-in sorts first.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OccupancyKey {
    pub plate: String,
    pub entered_at: NaiveDateTime,
    /// Per-lot check-in counter; disambiguates same-tick check-ins
    pub seq: u64,
}

impl OccupancyKey {
    pub fn new(plate: impl Into<String>, entered_at: NaiveDateTime, seq: u64) -> Self {
        Self {
            plate: plate.into(),
            entered_at,
            seq,
        }
    }
}

/// Read-only row of the occupancy snapshot
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OccupancyView {
    pub slot_id: SlotId,
    pub plate: String,
    pub tier: Tier,
    pub entered_at: NaiveDateTime,
}

/// Mapping from active check-ins to their occupied slots.
#[derive(Debug, Default)]
pub struct OccupancyIndex {
    /// Key -> occupied slot
    slots: FxHashMap<OccupancyKey, Slot>,
    /// Plate -> its active keys, earliest first
    by_plate: FxHashMap<String, BTreeSet<OccupancyKey>>,
}

impl OccupancyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            by_plate: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Index an occupied slot under a fresh key.
    ///
    /// # Errors
    /// The key must be new and the slot must already carry its vehicle.
    pub fn insert(&mut self, key: OccupancyKey, slot: Slot) -> Result<(), OccupancyError> {
        if !slot.is_occupied() {
            return Err(OccupancyError::SlotNotOccupied(slot.id()));
        }
        if self.slots.contains_key(&key) {
            return Err(OccupancyError::DuplicateKey { plate: key.plate });
        }

        self.by_plate
            .entry(key.plate.clone())
            .or_default()
            .insert(key.clone());
        self.slots.insert(key, slot);
        Ok(())
    }

    /// Remove the earliest active check-in for `plate`.
    ///
    /// # Complexity
    /// O(log k) where k is the number of active check-ins for the plate
    pub fn remove_by_plate(&mut self, plate: &str) -> Option<(OccupancyKey, Slot)> {
        let keys = self.by_plate.get_mut(plate)?;
        let key = keys.pop_first()?;
        if keys.is_empty() {
            self.by_plate.remove(plate);
        }

        let slot = self.slots.remove(&key);
        debug_assert!(slot.is_some(), "plate index out of sync for {:?}", key.plate);
        slot.map(|slot| (key, slot))
    }

    /// Slot held by the earliest active check-in for `plate`
    pub fn slot_of(&self, plate: &str) -> Option<&Slot> {
        let key = self.by_plate.get(plate)?.first()?;
        self.slots.get(key)
    }

    #[inline]
    pub fn contains_plate(&self, plate: &str) -> bool {
        self.by_plate.contains_key(plate)
    }

    /// Number of active check-ins for `plate`
    pub fn count_for(&self, plate: &str) -> usize {
        self.by_plate.get(plate).map_or(0, BTreeSet::len)
    }

    /// Iterate over occupied slots in no particular order
    pub fn slots(&self) -> impl Iterator<Item = (&OccupancyKey, &Slot)> + '_ {
        self.slots.iter()
    }

    /// Current occupancies ordered by slot id
    pub fn snapshot(&self) -> Vec<OccupancyView> {
        let mut rows: Vec<OccupancyView> = self
            .slots
            .iter()
            .map(|(key, slot)| OccupancyView {
                slot_id: slot.id(),
                plate: key.plate.clone(),
                tier: slot.tier(),
                entered_at: key.entered_at,
            })
            .collect();
        rows.sort_unstable_by_key(|row| row.slot_id);
        rows
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
