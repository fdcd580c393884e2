//! Single-flight task registry.
//!
//! The registry is built once at startup with a fixed set of slot names and shared
//! behind an `Arc` with every request handler. Submitting into an occupied slot is a
//! no-op reported as `Ok(false)`: callers treat it as "already running".

mod slot;
pub use slot::SlotGuard;
use slot::TaskSlot;

use std::{collections::HashMap, future::Future, sync::Arc};

use radahn_model::{Slot, SlotInfo, TaskName};
use tracing::{debug, info, instrument};

use crate::error::CoreError;

pub struct TaskRegistry {
    slots: HashMap<Slot, Arc<TaskSlot>>,
}

impl TaskRegistry {
    /// Create a registry holding one empty slot per name.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Slot>,
    {
        let slots = names
            .into_iter()
            .map(|name| {
                let name = name.into();
                (name.clone(), Arc::new(TaskSlot::new(name)))
            })
            .collect();
        Self { slots }
    }

    /// Registry with one slot per [`TaskName`].
    pub fn with_task_names() -> Self {
        Self::new(TaskName::ALL.iter().map(|n| n.as_str()))
    }

    fn slot(&self, name: &str) -> Result<&Arc<TaskSlot>, CoreError> {
        self.slots
            .get(name)
            .ok_or_else(|| CoreError::UnknownSlot(name.to_string()))
    }

    /// Claim the slot without spawning anything.
    ///
    /// Returns `Ok(None)` when the slot is already occupied.
    pub fn try_acquire(&self, name: &str) -> Result<Option<SlotGuard>, CoreError> {
        Ok(self.slot(name)?.try_acquire())
    }

    /// Start `activity` in the background if the slot is free.
    ///
    /// The activity receives the [`SlotGuard`] and must keep it alive for as long as it
    /// runs; the slot becomes free again once the guard is dropped.
    #[instrument(level = "debug", skip(self, activity))]
    pub fn try_submit<F, Fut>(&self, name: &str, activity: F) -> Result<bool, CoreError>
    where
        F: FnOnce(SlotGuard) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        match self.try_acquire(name)? {
            Some(guard) => {
                tokio::spawn(activity(guard));
                debug!("activity started");
                Ok(true)
            }
            None => {
                info!(slot = name, "background task already running");
                Ok(false)
            }
        }
    }

    /// Ask the running activity to stop at its next cancellation check.
    ///
    /// Returns `Ok(false)` when the slot is empty.
    pub fn request_cancel(&self, name: &str) -> Result<bool, CoreError> {
        let requested = self.slot(name)?.request_cancel();
        debug!(slot = name, requested, "cancellation requested");
        Ok(requested)
    }

    pub fn is_running(&self, name: &str) -> Result<bool, CoreError> {
        Ok(self.slot(name)?.is_running())
    }

    /// All slots sorted by name.
    pub fn snapshot(&self) -> Vec<SlotInfo> {
        let mut infos: Vec<SlotInfo> = self.slots.values().map(|s| s.info()).collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::with_task_names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Barrier,
        atomic::{AtomicUsize, Ordering},
    };
    use std::time::Duration;
    use tokio::sync::oneshot;

    const SLOT: &str = "generateInputs";

    async fn write_artifact() -> std::io::Result<()> {
        Err(std::io::Error::other("disk full"))
    }

    fn explode() {
        panic!("activity blew up");
    }

    async fn wait_released(registry: &TaskRegistry, name: &str) {
        for _ in 0..100 {
            if !registry.is_running(name).unwrap() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("slot {name} was never released");
    }

    #[tokio::test]
    async fn second_submission_is_a_noop_while_first_runs() {
        let registry = TaskRegistry::with_task_names();
        let starts = Arc::new(AtomicUsize::new(0));
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let counter = Arc::clone(&starts);
        let first = registry
            .try_submit(SLOT, move |guard| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = release_rx.await;
                drop(guard);
            })
            .unwrap();
        assert!(first);

        let counter = Arc::clone(&starts);
        let second = registry
            .try_submit(SLOT, move |_guard| async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        assert!(!second);
        assert!(registry.is_running(SLOT).unwrap());

        release_tx.send(()).unwrap();
        wait_released(&registry, SLOT).await;
        assert_eq!(starts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slot_released_after_failure_allows_resubmission() {
        let registry = TaskRegistry::with_task_names();

        let accepted = registry
            .try_submit(SLOT, |_guard| async move {
                if let Err(e) = write_artifact().await {
                    tracing::error!(error = %e, "activity failed");
                }
            })
            .unwrap();
        assert!(accepted);
        wait_released(&registry, SLOT).await;

        assert!(registry.try_submit(SLOT, |_guard| async {}).unwrap());
    }

    #[tokio::test]
    async fn slot_released_when_activity_panics() {
        let registry = TaskRegistry::with_task_names();

        registry
            .try_submit(SLOT, |_guard| async move { explode() })
            .unwrap();
        wait_released(&registry, SLOT).await;

        assert!(registry.try_submit(SLOT, |_guard| async {}).unwrap());
    }

    #[tokio::test]
    async fn cancel_flag_is_visible_to_activity_and_cleared_on_release() {
        let registry = TaskRegistry::with_task_names();
        let name = "listenTelemetryA";

        registry
            .try_submit(name, |guard| async move {
                while !guard.is_cancel_requested() {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            })
            .unwrap();

        assert!(registry.request_cancel(name).unwrap());
        wait_released(&registry, name).await;

        let info = registry
            .snapshot()
            .into_iter()
            .find(|s| s.name == name)
            .unwrap();
        assert!(!info.running);
        assert!(!info.cancel_requested);
    }

    #[test]
    fn cancel_on_empty_slot_is_reported() {
        let registry = TaskRegistry::with_task_names();
        assert!(!registry.request_cancel("openFolder").unwrap());
    }

    #[test]
    fn unknown_slot_is_an_error() {
        let registry = TaskRegistry::with_task_names();
        assert!(matches!(
            registry.try_acquire("renderMovie"),
            Err(CoreError::UnknownSlot(name)) if name == "renderMovie"
        ));
    }

    #[test]
    fn concurrent_acquire_grants_exactly_one_guard() {
        let registry = Arc::new(TaskRegistry::with_task_names());
        let barrier = Arc::new(Barrier::new(16));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    registry.try_acquire(SLOT).unwrap()
                })
            })
            .collect();

        let guards: Vec<SlotGuard> = handles
            .into_iter()
            .filter_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(guards.len(), 1);

        drop(guards);
        assert!(!registry.is_running(SLOT).unwrap());
    }

    #[test]
    fn snapshot_lists_every_slot_sorted() {
        let registry = TaskRegistry::with_task_names();
        let _guard = registry.try_acquire("runSimulation").unwrap().unwrap();

        let names: Vec<_> = registry.snapshot().into_iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            [
                "generateInputs",
                "listenTelemetryA",
                "listenTelemetryB",
                "openFolder",
                "runSimulation"
            ]
        );
        assert!(registry.is_running("runSimulation").unwrap());
    }
}
