//! Slot and Vehicle - the resources being allocated and their occupants.
//!
//! Every slot is created once when the lot is built and lives for the whole
//! process. A `Slot` value is moved between containers, so at any instant it
//! is owned either by a free pool or by the occupancy index, never both.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

/// Numeric slot identifier (1-based, stable for the process lifetime)
pub type SlotId = u32;

/// Priority class of a slot or a vehicle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Tier {
    /// Served by the FIFO pool
    Regular = 0,
    /// Served by the priority pool
    Vip = 1,
}

impl Tier {
    /// Tier requested by a vehicle with the given VIP flag
    #[inline]
    pub const fn from_vip(vip: bool) -> Self {
        if vip {
            Tier::Vip
        } else {
            Tier::Regular
        }
    }

    #[inline]
    pub const fn is_vip(self) -> bool {
        matches!(self, Tier::Vip)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Regular => f.write_str("Regular"),
            Tier::Vip => f.write_str("VIP"),
        }
    }
}

/// A vehicle currently parked in a slot.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Vehicle {
    /// License plate (not unique among active occupancies)
    pub plate: String,
    /// Whether the vehicle asked for a VIP slot
    pub vip: bool,
    /// Local wall-clock time of check-in
    pub entered_at: NaiveDateTime,
}

impl Vehicle {
    pub fn new(plate: impl Into<String>, vip: bool, entered_at: NaiveDateTime) -> Self {
        Self {
            plate: plate.into(),
            vip,
            entered_at,
        }
    }
}

/// A single parking slot.
///
/// `occupant` is the occupied flag: `Some` while a vehicle is parked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slot {
    id: SlotId,
    tier: Tier,
    occupant: Option<Vehicle>,
}

impl Slot {
    /// Create a free slot
    #[inline]
    pub fn new(id: SlotId, tier: Tier) -> Self {
        Self {
            id,
            tier,
            occupant: None,
        }
    }

    #[inline]
    pub fn id(&self) -> SlotId {
        self.id
    }

    #[inline]
    pub fn tier(&self) -> Tier {
        self.tier
    }

    #[inline]
    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    #[inline]
    pub fn occupant(&self) -> Option<&Vehicle> {
        self.occupant.as_ref()
    }

    /// Park a vehicle in this slot.
    ///
    /// The slot must be free; occupying an occupied slot is a bookkeeping bug.
    #[inline]
    pub fn occupy(&mut self, vehicle: Vehicle) {
        debug_assert!(self.occupant.is_none(), "slot {} already occupied", self.id);
        self.occupant = Some(vehicle);
    }

    /// Release the slot, returning the vehicle that was parked in it.
    #[inline]
    pub fn free(&mut self) -> Option<Vehicle> {
        self.occupant.take()
    }
}

/// Build the full slot inventory for a lot.
///
/// Regular slots get ids `1..=regular`, VIP slots get the ids after them.
pub fn build_inventory(regular: u32, vip: u32) -> (Vec<Slot>, Vec<Slot>) {
    let regular_slots = (1..=regular).map(|id| Slot::new(id, Tier::Regular)).collect();
    let vip_slots = (regular + 1..=regular + vip)
        .map(|id| Slot::new(id, Tier::Vip))
        .collect();
    (regular_slots, vip_slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_slot_lifecycle() {
        let mut slot = Slot::new(7, Tier::Regular);
        assert!(!slot.is_occupied());

        slot.occupy(Vehicle::new("ABC-123", false, noon()));
        assert!(slot.is_occupied());
        assert_eq!(slot.occupant().map(|v| v.plate.as_str()), Some("ABC-123"));

        let vehicle = slot.free().expect("vehicle should be returned");
        assert_eq!(vehicle.plate, "ABC-123");
        assert!(!slot.is_occupied());
        assert!(slot.free().is_none());
    }

    #[test]
    fn test_build_inventory_ids() {
        let (regular, vip) = build_inventory(3, 2);
        let regular_ids: Vec<_> = regular.iter().map(Slot::id).collect();
        let vip_ids: Vec<_> = vip.iter().map(Slot::id).collect();

        assert_eq!(regular_ids, vec![1, 2, 3]);
        assert_eq!(vip_ids, vec![4, 5]);
        assert!(regular.iter().all(|s| s.tier() == Tier::Regular));
        assert!(vip.iter().all(|s| s.tier() == Tier::Vip));
    }

    #[test]
    fn test_build_inventory_all_vip() {
        let (regular, vip) = build_inventory(0, 4);
        assert!(regular.is_empty());
        assert_eq!(vip.first().map(Slot::id), Some(1));
        assert_eq!(vip.last().map(Slot::id), Some(4));
    }

    #[test]
    fn test_tier_display() {
        assert_eq!(Tier::Vip.to_string(), "VIP");
        assert_eq!(Tier::Regular.to_string(), "Regular");
        assert_eq!(Tier::from_vip(true), Tier::Vip);
        assert!(!Tier::from_vip(false).is_vip());
    }
}
