//! Command and Event types for the lot.
//!
//! Commands are requests from a front end (CLI, replay script, service).
//! Events describe what the lot did with them.

use crate::error::Rejected;
use crate::slot::{SlotId, Tier};

/// Which way a vehicle is moving
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    CheckIn,
    CheckOut,
}

// ============================================================================
// Input Commands
// ============================================================================

/// Park a vehicle
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckIn {
    pub plate: String,
    pub vip: bool,
}

/// Release a parked vehicle
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckOut {
    pub plate: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    CheckIn(CheckIn),
    CheckOut(CheckOut),
}

impl Command {
    pub fn check_in(plate: impl Into<String>, vip: bool) -> Self {
        Command::CheckIn(CheckIn {
            plate: plate.into(),
            vip,
        })
    }

    pub fn check_out(plate: impl Into<String>) -> Self {
        Command::CheckOut(CheckOut {
            plate: plate.into(),
        })
    }

    #[inline]
    pub fn action(&self) -> Action {
        match self {
            Command::CheckIn(_) => Action::CheckIn,
            Command::CheckOut(_) => Action::CheckOut,
        }
    }

    #[inline]
    pub fn plate(&self) -> &str {
        match self {
            Command::CheckIn(c) => &c.plate,
            Command::CheckOut(c) => &c.plate,
        }
    }
}

// ============================================================================
// Output Events
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputEvent {
    /// Vehicle was parked
    Parked {
        plate: String,
        slot_id: SlotId,
        tier: Tier,
    },
    /// Vehicle left and its slot is free again
    Released { plate: String, slot_id: SlotId },
    /// Command was refused; the lot is unchanged
    Rejected {
        plate: String,
        action: Action,
        reason: Rejected,
    },
}

impl OutputEvent {
    #[inline]
    pub fn is_rejected(&self) -> bool {
        matches!(self, OutputEvent::Rejected { .. })
    }

    /// Slot touched by the command, if it succeeded
    #[inline]
    pub fn slot_id(&self) -> Option<SlotId> {
        match self {
            OutputEvent::Parked { slot_id, .. } | OutputEvent::Released { slot_id, .. } => {
                Some(*slot_id)
            }
            OutputEvent::Rejected { .. } => None,
        }
    }
}

impl std::fmt::Display for OutputEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputEvent::Parked { slot_id, .. } => write!(f, "Vehicle parked in slot {slot_id}"),
            OutputEvent::Released { slot_id, .. } => {
                write!(f, "Vehicle exited from slot {slot_id}")
            }
            OutputEvent::Rejected { reason, .. } => write!(f, "{reason}"),
        }
    }
}
