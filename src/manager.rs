//! Allocation Manager - owns the pools, the occupancy index and the ledger.
//!
//! Every successful check-in moves one slot out of a pool into the index and
//! opens one ledger entry; every successful check-out does the exact reverse.
//! Nothing here is global: a lot is a value, and callers hold it by `&mut`
//! or through [`crate::shared::SharedLot`].

use tracing::{debug, error, info, warn};

use crate::analytics::{AnalyticsEngine, AnalyticsSnapshot};
use crate::clock::{Clock, SystemClock};
use crate::config::LotConfig;
use crate::error::{ConfigError, Rejected};
use crate::ledger::{FileStore, Ledger};
use crate::occupancy::{OccupancyIndex, OccupancyKey, OccupancyView};
use crate::regular_pool::RegularSlotPool;
use crate::slot::{build_inventory, Slot, SlotId, Tier, Vehicle};
use crate::vip_pool::PrioritySlotPool;

pub struct AllocationManager {
    config: LotConfig,
    regular: RegularSlotPool,
    vip: PrioritySlotPool,
    index: OccupancyIndex,
    ledger: Ledger,
    clock: Box<dyn Clock>,
    /// Next check-in sequence number
    seq: u64,
}

impl AllocationManager {
    /// Build a lot on top of an already opened ledger, using local time.
    pub fn new(config: LotConfig, ledger: Ledger) -> Result<Self, ConfigError> {
        Self::with_clock(config, ledger, SystemClock)
    }

    /// Build a lot whose ledger lives in `config.ledger_path`.
    pub fn open(config: LotConfig) -> Result<Self, ConfigError> {
        let ledger = Ledger::open(FileStore::new(config.ledger_path.clone()));
        Self::new(config, ledger)
    }

    /// Build a lot that keeps its ledger in memory only
    pub fn in_memory(total_slots: u32, vip_slots: u32) -> Result<Self, ConfigError> {
        Self::new(LotConfig::new(total_slots, vip_slots), Ledger::in_memory())
    }

    pub fn with_clock(
        config: LotConfig,
        ledger: Ledger,
        clock: impl Clock + 'static,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let (regular_slots, vip_slots) = build_inventory(config.regular_slots(), config.vip_slots);
        // Inventory tiers are correct by construction
        let regular = RegularSlotPool::from_slots(regular_slots)
            .unwrap_or_else(|_| RegularSlotPool::with_capacity(0));
        let vip = PrioritySlotPool::from_slots(vip_slots)
            .unwrap_or_else(|_| PrioritySlotPool::with_capacity(0));

        let mut manager = Self {
            index: OccupancyIndex::with_capacity(config.total_slots as usize),
            config,
            regular,
            vip,
            ledger,
            clock: Box::new(clock),
            seq: 0,
        };
        manager.restore_open_entries();

        info!(
            total = manager.config.total_slots,
            vip = manager.config.vip_slots,
            occupied = manager.index.len(),
            "parking lot ready"
        );
        Ok(manager)
    }

    /// Re-occupy slots for vehicles that were still parked at shutdown.
    fn restore_open_entries(&mut self) {
        let open: Vec<_> = self.ledger.open_entries().cloned().collect();

        for entry in open {
            let tier = Tier::from_vip(entry.vip);
            let slot = match tier {
                Tier::Regular => self.regular.remove(entry.slot_id),
                Tier::Vip => self.vip.remove(entry.slot_id),
            };
            let Some(mut slot) = slot else {
                warn!(
                    plate = %entry.plate,
                    slot = entry.slot_id,
                    %tier,
                    "open ledger entry does not match a free slot, not restored"
                );
                continue;
            };

            slot.occupy(Vehicle::new(entry.plate.clone(), entry.vip, entry.entered_at));
            let key = OccupancyKey::new(entry.plate, entry.entered_at, self.next_seq());
            if let Err(e) = self.index.insert(key, slot) {
                error!(error = %e, "failed to restore occupancy");
            }
        }

        if !self.index.is_empty() {
            info!(restored = self.index.len(), "restored occupancy from ledger");
        }
    }

    #[inline]
    fn next_seq(&mut self) -> u64 {
        let seq = self.seq;
        self.seq += 1;
        seq
    }

    /// Park a vehicle.
    ///
    /// VIP vehicles get the lowest free VIP slot, regular vehicles the
    /// longest-free regular slot. VIP vehicles never spill into regular
    /// slots or the other way round.
    pub fn check_in(&mut self, plate: &str, vip: bool) -> Result<SlotId, Rejected> {
        let plate = plate.trim();
        if plate.is_empty() {
            return Err(Rejected::InvalidInput);
        }

        let tier = Tier::from_vip(vip);
        let mut slot = match tier {
            Tier::Regular => self.regular.take(),
            Tier::Vip => self.vip.take(),
        }
        .ok_or_else(|| {
            debug!(plate, %tier, "no free slot");
            Rejected::NoAvailableSlot
        })?;

        let now = self.clock.now();
        let slot_id = slot.id();
        slot.occupy(Vehicle::new(plate, vip, now));

        let key = OccupancyKey::new(plate, now, self.next_seq());
        if let Err(e) = self.index.insert(key, slot) {
            // Fresh sequence numbers make this unreachable
            error!(error = %e, slot = slot_id, "occupancy index rejected check-in");
            debug_assert!(false, "occupancy index rejected check-in: {e}");
        }
        self.ledger.record_entry(plate, vip, slot_id, now);

        debug!(plate, slot = slot_id, %tier, "checked in");
        Ok(slot_id)
    }

    /// Release the earliest active check-in for `plate`.
    pub fn check_out(&mut self, plate: &str) -> Result<SlotId, Rejected> {
        let plate = plate.trim();
        if plate.is_empty() {
            return Err(Rejected::InvalidInput);
        }

        let (key, mut slot) = self
            .index
            .remove_by_plate(plate)
            .ok_or(Rejected::NotParked)?;
        slot.free();
        let slot_id = slot.id();
        self.release(slot);

        let now = self.clock.now();
        if now < key.entered_at {
            warn!(
                plate,
                slot = slot_id,
                entered_at = %key.entered_at,
                exited_at = %now,
                "clock is behind the check-in time"
            );
        }
        if self.ledger.record_exit_for(plate, key.entered_at, now).is_none() {
            warn!(plate, slot = slot_id, "checked out without an open ledger entry");
        }

        debug!(plate, slot = slot_id, "checked out");
        Ok(slot_id)
    }

    /// Return a freed slot to its tier's pool.
    fn release(&mut self, slot: Slot) {
        let result = match slot.tier() {
            Tier::Regular => self.regular.put(slot),
            Tier::Vip => self.vip.put(slot),
        };
        if let Err(e) = result {
            error!(error = %e, "freed slot could not be returned to its pool");
            debug_assert!(false, "pool rejected freed slot: {e}");
        }
    }

    pub fn analytics(&self) -> AnalyticsEngine<'_> {
        AnalyticsEngine::new(self.ledger.entries())
    }

    pub fn analytics_snapshot(&self) -> AnalyticsSnapshot {
        self.analytics().snapshot()
    }

    /// Active occupancies ordered by slot id
    pub fn occupancy_snapshot(&self) -> Vec<OccupancyView> {
        self.index.snapshot()
    }

    /// Slot of the earliest active check-in for `plate`
    pub fn slot_of(&self, plate: &str) -> Option<SlotId> {
        self.index.slot_of(plate.trim()).map(Slot::id)
    }

    #[inline]
    pub fn is_parked(&self, plate: &str) -> bool {
        self.index.contains_plate(plate.trim())
    }

    #[inline]
    pub fn free_regular(&self) -> usize {
        self.regular.len()
    }

    #[inline]
    pub fn free_vip(&self) -> usize {
        self.vip.len()
    }

    #[inline]
    pub fn occupied(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn config(&self) -> &LotConfig {
        &self.config
    }

    #[inline]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Regular slot ids in the order they will be handed out
    pub fn regular_queue(&self) -> Vec<SlotId> {
        self.regular.iter().map(Slot::id).collect()
    }

    /// Free VIP slot ids, ascending
    pub fn free_vip_ids(&self) -> Vec<SlotId> {
        let mut ids: Vec<_> = self.vip.ids().collect();
        ids.sort_unstable();
        ids
    }

    /// Hash of pool order, occupancy and ledger content, for determinism checks
    pub fn state_hash(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        self.regular_queue().hash(&mut hasher);
        self.free_vip_ids().hash(&mut hasher);
        for row in self.occupancy_snapshot() {
            row.slot_id.hash(&mut hasher);
            row.plate.hash(&mut hasher);
            row.entered_at.hash(&mut hasher);
        }
        self.ledger.entries().hash(&mut hasher);
        hasher.finish()
    }
}

impl std::fmt::Debug for AllocationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AllocationManager")
            .field("config", &self.config)
            .field("regular", &self.regular)
            .field("vip", &self.vip)
            .field("occupied", &self.index.len())
            .field("ledger", &self.ledger)
            .finish()
    }
}
