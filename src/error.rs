//! Error types.
//!
//! `Rejected` is the only error a caller of the allocation API sees. The
//! rest describe broken internal invariants or storage trouble, which the
//! manager logs and absorbs.

use crate::slot::{SlotId, Tier};
use thiserror::Error;

/// Reasons a check-in or check-out request was refused
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rejected {
    /// Plate was empty or whitespace only
    #[error("Invalid license plate")]
    InvalidInput,
    /// The requested tier has no free slot
    #[error("No available slots")]
    NoAvailableSlot,
    /// No active occupancy for the plate
    #[error("Vehicle not found")]
    NotParked,
}

/// A pool was handed a slot it can never legitimately hold
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolError {
    #[error("pool capacity {capacity} exceeded while returning slot {slot}")]
    CapacityExceeded { slot: SlotId, capacity: usize },
    #[error("slot {slot} is {actual} but the pool holds {expected} slots")]
    WrongTier {
        slot: SlotId,
        expected: Tier,
        actual: Tier,
    },
}

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum OccupancyError {
    #[error("occupancy key for plate {plate:?} is already indexed")]
    DuplicateKey { plate: String },
    #[error("slot {0} is not occupied")]
    SlotNotOccupied(SlotId),
}

/// The ledger backing store could not be read or written
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("ledger I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ledger encoding error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("VIP slot count {vip} exceeds total slot count {total}")]
    VipExceedsTotal { vip: u32, total: u32 },
    #[error("a lot needs at least one slot")]
    NoSlots,
}
