//! Regular Slot Pool - a bounded FIFO ring of free regular slots.
//!
//! Slots are handed out from the front and returned at the back, so in
//! steady state the slot that has been free the longest is reused first.

use crate::error::PoolError;
use crate::slot::{Slot, SlotId, Tier};

/// Fixed-capacity circular queue of free regular slots.
///
/// The backing buffer never grows: capacity equals the number of regular
/// slots in the lot, so a `put` can only overflow if a slot is returned
/// twice.
pub struct RegularSlotPool {
    /// Ring storage; `None` marks an empty cell
    buf: Box<[Option<Slot>]>,
    /// Index of the oldest free slot (next to be taken)
    head: usize,
    /// Number of free slots currently held
    len: usize,
}

impl RegularSlotPool {
    /// Create an empty pool with room for `capacity` slots
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
        }
    }

    /// Create a pool filled with the given slots, front to back.
    ///
    /// # Errors
    /// Fails if any slot is not a regular slot.
    pub fn from_slots(slots: Vec<Slot>) -> Result<Self, PoolError> {
        let mut pool = Self::with_capacity(slots.len());
        for slot in slots {
            pool.put(slot)?;
        }
        Ok(pool)
    }

    /// Remove and return the slot at the front.
    ///
    /// Returns `None` when every regular slot is occupied.
    ///
    /// # Complexity
    /// O(1)
    #[inline]
    pub fn take(&mut self) -> Option<Slot> {
        if self.len == 0 {
            return None;
        }

        let slot = self.buf[self.head].take();
        debug_assert!(slot.is_some(), "ring cell at head must be populated");
        self.head = (self.head + 1) % self.buf.len();
        self.len -= 1;
        slot
    }

    /// Return a slot to the back of the queue.
    ///
    /// # Complexity
    /// O(1)
    #[inline]
    pub fn put(&mut self, slot: Slot) -> Result<(), PoolError> {
        if slot.tier() != Tier::Regular {
            return Err(PoolError::WrongTier {
                slot: slot.id(),
                expected: Tier::Regular,
                actual: slot.tier(),
            });
        }
        if self.is_full() {
            return Err(PoolError::CapacityExceeded {
                slot: slot.id(),
                capacity: self.capacity(),
            });
        }

        let tail = (self.head + self.len) % self.buf.len();
        self.buf[tail] = Some(slot);
        self.len += 1;
        Ok(())
    }

    /// Remove a specific slot wherever it sits in the queue.
    ///
    /// Used only when restoring occupancy at startup; the relative order of
    /// the remaining slots is preserved.
    ///
    /// # Complexity
    /// O(n)
    pub fn remove(&mut self, id: SlotId) -> Option<Slot> {
        let pos = self.iter().position(|s| s.id() == id)?;
        let cap = self.buf.len();

        let removed = self.buf[(self.head + pos) % cap].take();
        // Close the gap by shifting the tail side one cell towards the head
        for i in pos..self.len - 1 {
            let from = (self.head + i + 1) % cap;
            let to = (self.head + i) % cap;
            self.buf[to] = self.buf[from].take();
        }
        self.len -= 1;
        removed
    }

    /// Iterate over free slots from front to back
    pub fn iter(&self) -> impl Iterator<Item = &Slot> + '_ {
        let cap = self.buf.len();
        (0..self.len).filter_map(move |i| self.buf[(self.head + i) % cap].as_ref())
    }

    /// Id of the slot that the next `take` would return
    #[inline]
    pub fn peek_id(&self) -> Option<SlotId> {
        if self.len == 0 {
            None
        } else {
            self.buf[self.head].as_ref().map(Slot::id)
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.buf.len()
    }
}

impl std::fmt::Debug for RegularSlotPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegularSlotPool")
            .field("capacity", &self.capacity())
            .field("free", &self.len)
            .field("next", &self.peek_id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::build_inventory;

    fn full_pool(n: u32) -> RegularSlotPool {
        let (regular, _) = build_inventory(n, 0);
        RegularSlotPool::from_slots(regular).unwrap()
    }

    fn ids(pool: &RegularSlotPool) -> Vec<SlotId> {
        pool.iter().map(Slot::id).collect()
    }

    #[test]
    fn test_initial_order_ascending() {
        let pool = full_pool(4);
        assert_eq!(pool.len(), 4);
        assert!(pool.is_full());
        assert_eq!(ids(&pool), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_take_until_empty() {
        let mut pool = full_pool(3);

        assert_eq!(pool.take().map(|s| s.id()), Some(1));
        assert_eq!(pool.take().map(|s| s.id()), Some(2));
        assert_eq!(pool.take().map(|s| s.id()), Some(3));
        assert!(pool.is_empty());
        assert!(pool.take().is_none());
    }

    #[test]
    fn test_fifo_recycling() {
        let mut pool = full_pool(3);

        let first = pool.take().unwrap();
        let second = pool.take().unwrap();

        // Returned slots queue up behind the never-used slot 3
        pool.put(second).unwrap();
        pool.put(first).unwrap();
        assert_eq!(ids(&pool), vec![3, 2, 1]);

        assert_eq!(pool.take().map(|s| s.id()), Some(3));
        assert_eq!(pool.take().map(|s| s.id()), Some(2));
    }

    #[test]
    fn test_wraparound() {
        let mut pool = full_pool(3);

        for _ in 0..10 {
            let slot = pool.take().unwrap();
            pool.put(slot).unwrap();
        }
        assert_eq!(pool.len(), 3);
        // 10 rotations of a 3-ring leave slot 2 at the front
        assert_eq!(ids(&pool), vec![2, 3, 1]);
    }

    #[test]
    fn test_put_over_capacity() {
        let mut pool = full_pool(2);
        let err = pool.put(Slot::new(99, Tier::Regular)).unwrap_err();
        assert_eq!(err, PoolError::CapacityExceeded { slot: 99, capacity: 2 });
    }

    #[test]
    fn test_put_wrong_tier() {
        let mut pool = RegularSlotPool::with_capacity(2);
        let err = pool.put(Slot::new(5, Tier::Vip)).unwrap_err();
        assert!(matches!(err, PoolError::WrongTier { slot: 5, .. }));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_zero_capacity() {
        let mut pool = RegularSlotPool::with_capacity(0);
        assert!(pool.is_empty());
        assert!(pool.is_full());
        assert!(pool.take().is_none());
        assert!(pool.put(Slot::new(1, Tier::Regular)).is_err());
    }

    #[test]
    fn test_remove_middle_keeps_order() {
        let mut pool = full_pool(5);
        pool.take();
        let one = Slot::new(1, Tier::Regular);
        pool.put(one).unwrap();
        assert_eq!(ids(&pool), vec![2, 3, 4, 5, 1]);

        let removed = pool.remove(4).expect("slot 4 is free");
        assert_eq!(removed.id(), 4);
        assert_eq!(ids(&pool), vec![2, 3, 5, 1]);
        assert!(pool.remove(4).is_none());

        // The ring still accepts the slot back at the tail
        pool.put(removed).unwrap();
        assert_eq!(ids(&pool), vec![2, 3, 5, 1, 4]);
    }
}
