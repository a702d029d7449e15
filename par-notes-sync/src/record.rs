//! Wire types exchanged with the persistence service.

use serde::{Deserialize, Serialize};

/// One row of the `tabs` table, as sent by `POST /tabs` and returned by `GET /tabs`.
///
/// `parent_id` is the id of the window that owns the item (`None` for the
/// root window), not the id of a parent item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabRecord {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub created_at: i64,
}

/// Full snapshot of the tree plus ids removed since the last successful send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncBatch {
    /// Every item, in pre-order
    pub upserts: Vec<TabRecord>,
    /// Ids to delete remotely (only populated when delete propagation is on)
    pub deletions: Vec<String>,
}

impl SyncBatch {
    /// Create a batch with no deletions
    pub fn new(upserts: Vec<TabRecord>) -> Self {
        Self {
            upserts,
            deletions: Vec::new(),
        }
    }

    /// Fold in tombstones from a batch this one supersedes.
    ///
    /// Ids that reappear in `upserts` are dropped, and duplicates are removed.
    pub fn absorb_deletions(&mut self, earlier: Vec<String>) {
        let mut merged = earlier;
        merged.append(&mut self.deletions);
        let mut deletions: Vec<String> = Vec::with_capacity(merged.len());
        for id in merged {
            if deletions.contains(&id) || self.upserts.iter().any(|r| r.id == id) {
                continue;
            }
            deletions.push(id);
        }
        self.deletions = deletions;
    }

    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletions.is_empty()
    }
}
