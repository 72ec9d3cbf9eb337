//! # Smart-Park
//!
//! A deterministic two-tier parking slot allocation engine.
//!
//! ## Design Principles
//!
//! - **Single Owner**: one [`AllocationManager`] owns every slot, pool and index (no globals)
//! - **Move Semantics**: a slot lives in exactly one place, a free pool or the occupancy index
//! - **Deterministic**: VIP gets the lowest free VIP id, regular slots recycle FIFO,
//!   duplicate plates check out earliest-first
//! - **Durable History**: every entry/exit lands in a ledger file that survives restarts
//!
//! ## Architecture
//!
//! ```text
//! [Front end] --> [Engine / SharedLot] --> [AllocationManager]
//!                                             |-- RegularSlotPool  (FIFO ring)
//!                                             |-- PrioritySlotPool (min-heap)
//!                                             |-- OccupancyIndex
//!                                             `-- Ledger --> [parking_logs.txt]
//!                                                    |
//!                                             [AnalyticsEngine]
//! ```

pub mod analytics;
pub mod clock;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod manager;
pub mod occupancy;
pub mod regular_pool;
pub mod script;
pub mod shared;
pub mod slot;
pub mod vip_pool;

// Re-exports for convenience
pub use analytics::{AnalyticsEngine, AnalyticsSnapshot, PeakHour};
pub use clock::{Clock, ManualClock, SystemClock};
pub use command::{Action, CheckIn, CheckOut, Command, OutputEvent};
pub use config::LotConfig;
pub use engine::{Engine, EngineStats};
pub use error::{ConfigError, Rejected, StorageError};
pub use ledger::{FileStore, Ledger, LedgerEntry, LedgerStore, MemoryStore, NullStore};
pub use manager::AllocationManager;
pub use occupancy::{OccupancyIndex, OccupancyKey, OccupancyView};
pub use regular_pool::RegularSlotPool;
pub use shared::SharedLot;
pub use slot::{Slot, SlotId, Tier, Vehicle};
pub use vip_pool::{HighestId, LowestId, PrioritySlotPool, SlotPriority};
