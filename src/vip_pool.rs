//! VIP Slot Pool - a bounded priority queue of free VIP slots.
//!
//! The slot with the smallest priority key is handed out first. With the
//! default [`LowestId`] key that is always the lowest free VIP slot id, which
//! keeps assignment reproducible across runs.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::error::PoolError;
use crate::slot::{Slot, SlotId, Tier};

/// Ordering key for VIP slot assignment.
///
/// Smaller keys are assigned first. Ties fall back to the slot id.
pub trait SlotPriority {
    type Key: Ord + Copy;

    fn key(&self, slot: &Slot) -> Self::Key;
}

/// Lowest free slot id first
#[derive(Clone, Copy, Debug, Default)]
pub struct LowestId;

impl SlotPriority for LowestId {
    type Key = SlotId;

    #[inline]
    fn key(&self, slot: &Slot) -> SlotId {
        slot.id()
    }
}

/// Highest free slot id first
#[derive(Clone, Copy, Debug, Default)]
pub struct HighestId;

impl SlotPriority for HighestId {
    type Key = Reverse<SlotId>;

    #[inline]
    fn key(&self, slot: &Slot) -> Reverse<SlotId> {
        Reverse(slot.id())
    }
}

/// Heap cell: the key is cached so the policy is consulted once per insert
struct Entry<K> {
    key: K,
    slot: Slot,
}

impl<K: Ord> PartialEq for Entry<K> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K: Ord> Eq for Entry<K> {}

impl<K: Ord> PartialOrd for Entry<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord> Ord for Entry<K> {
    // BinaryHeap is a max-heap; reverse so the smallest key surfaces
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .key
            .cmp(&self.key)
            .then_with(|| other.slot.id().cmp(&self.slot.id()))
    }
}

/// Fixed-capacity priority pool of free VIP slots.
pub struct PrioritySlotPool<P: SlotPriority = LowestId> {
    heap: BinaryHeap<Entry<P::Key>>,
    capacity: usize,
    policy: P,
}

impl PrioritySlotPool<LowestId> {
    /// Create an empty pool using lowest-id-first ordering
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_policy(capacity, LowestId)
    }

    /// Create a pool filled with the given slots.
    ///
    /// # Errors
    /// Fails if any slot is not a VIP slot.
    pub fn from_slots(slots: Vec<Slot>) -> Result<Self, PoolError> {
        Self::from_slots_with_policy(slots, LowestId)
    }
}

impl<P: SlotPriority> PrioritySlotPool<P> {
    pub fn with_policy(capacity: usize, policy: P) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
            capacity,
            policy,
        }
    }

    pub fn from_slots_with_policy(slots: Vec<Slot>, policy: P) -> Result<Self, PoolError> {
        let mut pool = Self::with_policy(slots.len(), policy);
        for slot in slots {
            pool.put(slot)?;
        }
        Ok(pool)
    }

    /// Remove and return the highest-priority free slot.
    ///
    /// # Complexity
    /// O(log n)
    #[inline]
    pub fn take(&mut self) -> Option<Slot> {
        self.heap.pop().map(|entry| entry.slot)
    }

    /// Return a slot to the pool.
    ///
    /// # Complexity
    /// O(log n)
    pub fn put(&mut self, slot: Slot) -> Result<(), PoolError> {
        if slot.tier() != Tier::Vip {
            return Err(PoolError::WrongTier {
                slot: slot.id(),
                expected: Tier::Vip,
                actual: slot.tier(),
            });
        }
        if self.heap.len() >= self.capacity {
            return Err(PoolError::CapacityExceeded {
                slot: slot.id(),
                capacity: self.capacity,
            });
        }

        let key = self.policy.key(&slot);
        self.heap.push(Entry { key, slot });
        Ok(())
    }

    /// Remove a specific slot regardless of its priority.
    ///
    /// Used only when restoring occupancy at startup.
    ///
    /// # Complexity
    /// O(n)
    pub fn remove(&mut self, id: SlotId) -> Option<Slot> {
        let mut found = None;
        self.heap.retain(|entry| {
            if found.is_none() && entry.slot.id() == id {
                found = Some(entry.slot.clone());
                false
            } else {
                true
            }
        });
        found
    }

    /// Id of the slot that the next `take` would return
    #[inline]
    pub fn peek_id(&self) -> Option<SlotId> {
        self.heap.peek().map(|entry| entry.slot.id())
    }

    /// Free slot ids in no particular order
    pub fn ids(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.heap.iter().map(|entry| entry.slot.id())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl<P: SlotPriority> std::fmt::Debug for PrioritySlotPool<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrioritySlotPool")
            .field("capacity", &self.capacity)
            .field("free", &self.heap.len())
            .field("next", &self.peek_id())
            .finish()
    }
}
