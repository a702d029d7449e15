//! The persistence-service seam.
//!
//! `SyncBackend` is a key-value store keyed by item id. The HTTP backend
//! talks to the real service; `MemoryBackend` keeps rows in a map and
//! records every call, which the scheduler and core tests rely on.

use crate::error::SyncError;
use crate::record::{SyncBatch, TabRecord};
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Blocking access to the persistence service.
pub trait SyncBackend: Send + Sync {
    /// Load every stored row (`GET /tabs`). Order is unspecified.
    fn fetch_all(&self) -> Result<Vec<TabRecord>, SyncError>;

    /// Idempotent insert-or-update of one row (`POST /tabs`).
    fn upsert(&self, record: &TabRecord) -> Result<(), SyncError>;

    /// Remove one row by id.
    fn delete(&self, id: &str) -> Result<(), SyncError>;
}

/// Result of pushing one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub upserted: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// Send every upsert and deletion in `batch`, one request per row.
///
/// Failures are logged and counted; the rest of the batch is still
/// attempted and nothing is retried. Readers may observe a partially
/// applied batch.
pub fn push_batch(backend: &dyn SyncBackend, batch: &SyncBatch) -> SyncOutcome {
    let mut outcome = SyncOutcome::default();

    for record in &batch.upserts {
        match backend.upsert(record) {
            Ok(()) => outcome.upserted += 1,
            Err(e) => {
                outcome.failed += 1;
                log::error!("SyncFailure: upsert of {} failed: {}", record.id, e);
            }
        }
    }

    for id in &batch.deletions {
        match backend.delete(id) {
            Ok(()) => outcome.deleted += 1,
            Err(e) => {
                outcome.failed += 1;
                log::error!("SyncFailure: delete of {} failed: {}", id, e);
            }
        }
    }

    log::info!(
        "Sync batch sent: {} upserted, {} deleted, {} failed",
        outcome.upserted,
        outcome.deleted,
        outcome.failed
    );
    outcome
}

/// In-process backend holding rows in memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    rows: Mutex<BTreeMap<String, TabRecord>>,
    upsert_calls: Mutex<Vec<TabRecord>>,
    delete_calls: Mutex<Vec<String>>,
    fail_upserts: Mutex<bool>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing rows
    pub fn with_rows(rows: Vec<TabRecord>) -> Self {
        let backend = Self::new();
        {
            let mut map = backend.rows.lock();
            for row in rows {
                map.insert(row.id.clone(), row);
            }
        }
        backend
    }

    /// Make every subsequent upsert fail with a status error
    pub fn set_fail_upserts(&self, fail: bool) {
        *self.fail_upserts.lock() = fail;
    }

    /// Every upsert received, in call order
    pub fn upsert_calls(&self) -> Vec<TabRecord> {
        self.upsert_calls.lock().clone()
    }

    /// Every delete received, in call order
    pub fn delete_calls(&self) -> Vec<String> {
        self.delete_calls.lock().clone()
    }

    /// Current stored rows, ordered by id
    pub fn rows(&self) -> Vec<TabRecord> {
        self.rows.lock().values().cloned().collect()
    }
}

impl SyncBackend for MemoryBackend {
    fn fetch_all(&self) -> Result<Vec<TabRecord>, SyncError> {
        Ok(self.rows())
    }

    fn upsert(&self, record: &TabRecord) -> Result<(), SyncError> {
        self.upsert_calls.lock().push(record.clone());
        if *self.fail_upserts.lock() {
            return Err(SyncError::Status {
                url: "memory://tabs".to_string(),
                status: 503,
            });
        }
        let mut rows = self.rows.lock();
        // Mirrors the service's ON CONFLICT clause: created_at is write-once.
        match rows.get_mut(&record.id) {
            Some(existing) => {
                existing.title = record.title.clone();
                existing.content = record.content.clone();
                existing.parent_id = record.parent_id.clone();
            }
            None => {
                rows.insert(record.id.clone(), record.clone());
            }
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), SyncError> {
        self.delete_calls.lock().push(id.to_string());
        self.rows.lock().remove(id);
        Ok(())
    }
}
