use serde::{Deserialize, Serialize};

use crate::Slot;

/// Point-in-time view of one registry slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotInfo {
    pub name: Slot,
    pub running: bool,
    pub cancel_requested: bool,
}

/// Outcome of a slot-guarded command.
///
/// `accepted == false` means the slot was already occupied; nothing new was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub accepted: bool,
}

impl Submission {
    pub fn accepted() -> Self {
        Self { accepted: true }
    }

    pub fn already_running() -> Self {
        Self { accepted: false }
    }
}

impl From<bool> for Submission {
    fn from(accepted: bool) -> Self {
        Self { accepted }
    }
}
