use std::sync::{
    Arc,
    atomic::{AtomicU8, Ordering},
};

use radahn_model::{Slot, SlotInfo};
use tracing::trace;

const EMPTY: u8 = 0;
const RUNNING: u8 = 0b01;
/// Set only while `RUNNING` is set; cleared together with it on release.
const CANCEL: u8 = 0b10;

/// One named execution slot.
///
/// Occupancy and the cancellation request share one atomic word, so a request can only
/// land on the occupant that was running when it was made. `state` moves
/// `EMPTY -> RUNNING` only through a compare-and-swap in [`TaskSlot::try_acquire`] and back
/// to `EMPTY` only when the owning [`SlotGuard`] is dropped.
pub(crate) struct TaskSlot {
    name: Slot,
    state: AtomicU8,
}

impl TaskSlot {
    pub(crate) fn new(name: impl Into<Slot>) -> Self {
        Self {
            name: name.into(),
            state: AtomicU8::new(EMPTY),
        }
    }

    pub(crate) fn try_acquire(self: &Arc<Self>) -> Option<SlotGuard> {
        self.state
            .compare_exchange(EMPTY, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        trace!(slot = %self.name, "slot acquired");
        Some(SlotGuard {
            slot: Arc::clone(self),
        })
    }

    pub(crate) fn is_running(&self) -> bool {
        self.state.load(Ordering::Acquire) & RUNNING != 0
    }

    /// Returns `false` when nothing occupies the slot.
    pub(crate) fn request_cancel(&self) -> bool {
        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |s| {
                (s & RUNNING != 0).then_some(s | CANCEL)
            })
            .is_ok()
    }

    fn is_cancel_requested(&self) -> bool {
        self.state.load(Ordering::Acquire) & CANCEL != 0
    }

    pub(crate) fn info(&self) -> SlotInfo {
        let state = self.state.load(Ordering::Acquire);
        SlotInfo {
            name: self.name.clone(),
            running: state & RUNNING != 0,
            cancel_requested: state & CANCEL != 0,
        }
    }
}

/// Exclusive ownership of a slot for the lifetime of one activity.
///
/// Dropping the guard releases the slot on every exit path: normal return,
/// early return on error, cancellation, or a panic unwinding the task.
pub struct SlotGuard {
    slot: Arc<TaskSlot>,
}

impl SlotGuard {
    pub fn name(&self) -> &str {
        &self.slot.name
    }

    /// Advisory cancellation flag set through [`crate::TaskRegistry::request_cancel`].
    pub fn is_cancel_requested(&self) -> bool {
        self.slot.is_cancel_requested()
    }
}

impl std::fmt::Debug for SlotGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotGuard")
            .field("slot", &self.slot.name)
            .field("cancel_requested", &self.is_cancel_requested())
            .finish()
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.slot.state.store(EMPTY, Ordering::Release);
        trace!(slot = %self.slot.name, "slot released");
    }
}
