//! Debounced write-behind sync.
//!
//! Every mutation hands the scheduler a full snapshot. The pending timer is
//! aborted and restarted, so a burst of mutations inside the debounce window
//! produces a single send carrying the last snapshot. Sends run on the
//! blocking pool and are fire-and-forget.
//!
//! At most one send is in flight. A send holds the send lock until its last
//! request returns and only takes the pending snapshot once it owns the
//! lock, so a later snapshot can never be overtaken by an earlier one.

use crate::backend::{SyncBackend, SyncOutcome, push_batch};
use crate::error::SyncError;
use crate::record::SyncBatch;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{Mutex as SendLock, OwnedMutexGuard};
use tokio::task::JoinHandle;

/// Cancellable, coalescing sync timer tied to the lifetime of its owner.
pub struct SyncScheduler {
    backend: Arc<dyn SyncBackend>,
    runtime: Handle,
    debounce: Duration,
    /// Latest snapshot not yet handed to a send
    slot: Arc<Mutex<Option<SyncBatch>>>,
    /// Held for the whole duration of a send
    send_lock: Arc<SendLock<()>>,
    timer: Option<JoinHandle<()>>,
}

impl SyncScheduler {
    /// Create a scheduler that spawns its timers on `runtime`.
    pub fn new(backend: Arc<dyn SyncBackend>, runtime: Handle, debounce: Duration) -> Self {
        Self {
            backend,
            runtime,
            debounce,
            slot: Arc::new(Mutex::new(None)),
            send_lock: Arc::new(SendLock::new(())),
            timer: None,
        }
    }

    /// Replace the pending snapshot with `batch` and restart the timer.
    ///
    /// Tombstones of a superseded, unsent batch are carried over.
    pub fn schedule(&mut self, mut batch: SyncBatch) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }

        {
            let mut slot = self.slot.lock();
            if let Some(previous) = slot.take() {
                batch.absorb_deletions(previous.deletions);
            }
            *slot = Some(batch);
        }

        let slot = Arc::clone(&self.slot);
        let backend = Arc::clone(&self.backend);
        let send_lock = Arc::clone(&self.send_lock);
        let debounce = self.debounce;

        self.timer = Some(self.runtime.spawn(async move {
            tokio::time::sleep(debounce).await;
            let guard = send_lock.lock_owned().await;

            // Taking the batch and starting the send happen in one poll, so
            // an abort can never land between them.
            let taken = slot.lock().take();
            let Some(batch) = taken else {
                return;
            };
            let result = send(backend, batch, guard).await;
            if let Err(e) = result {
                log::error!("SyncFailure: sync worker did not complete: {}", e);
            }
        }));

        log::trace!("Sync scheduled in {:?}", self.debounce);
    }

    /// Send the pending snapshot now instead of waiting for the timer.
    ///
    /// Waits for a send already in flight to finish first. Returns
    /// `Ok(None)` when nothing was pending.
    pub async fn flush(&mut self) -> Result<Option<SyncOutcome>, SyncError> {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }

        let guard = Arc::clone(&self.send_lock).lock_owned().await;
        let taken = self.slot.lock().take();
        let Some(batch) = taken else {
            return Ok(None);
        };

        let outcome = send(Arc::clone(&self.backend), batch, guard).await?;
        Ok(Some(outcome))
    }

    /// Whether a snapshot is waiting for its timer
    pub fn pending(&self) -> bool {
        self.slot.lock().is_some()
    }
}

/// Push `batch` on the blocking pool.
///
/// The guard moves into the blocking closure, so the send lock stays held
/// even if the awaiting task is aborted mid-send.
async fn send(
    backend: Arc<dyn SyncBackend>,
    batch: SyncBatch,
    guard: OwnedMutexGuard<()>,
) -> Result<SyncOutcome, SyncError> {
    tokio::task::spawn_blocking(move || {
        let outcome = push_batch(backend.as_ref(), &batch);
        drop(guard);
        outcome
    })
    .await
    .map_err(|e| SyncError::Task(e.to_string()))
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        if self.slot.lock().is_some() {
            log::warn!("Sync scheduler dropped with an unsent snapshot");
        }
    }
}
