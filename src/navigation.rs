//! Active column chain and active item.
//!
//! The active path lists the window ids shown left to right, always starting
//! at the root. Opening an item truncates the path to the column it lives in
//! and appends the item's child window, which also closes any deeper columns
//! opened earlier under a sibling.

use crate::error::{NotesError, Result};
use crate::tree::{DeletionReport, ItemId, TreeStore, WindowId};

/// Navigation state for one view of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    active_path: Vec<WindowId>,
    active_item_id: Option<ItemId>,
}

impl Default for Navigation {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigation {
    /// Path showing only the root column, nothing active
    pub fn new() -> Self {
        Self {
            active_path: vec![WindowId::root()],
            active_item_id: None,
        }
    }

    pub fn active_path(&self) -> &[WindowId] {
        &self.active_path
    }

    pub fn active_item_id(&self) -> Option<&ItemId> {
        self.active_item_id.as_ref()
    }

    /// Open `item_id` (found in `window_id`, shown at `depth` in the path).
    ///
    /// Materialises the child window if needed, makes the item active, and
    /// returns the child window id now at the end of the path. When
    /// `window_id` is not at `depth`, the path is rebuilt from the root down
    /// to `window_id` so every column stays the child of the one before.
    pub fn open(
        &mut self,
        store: &mut TreeStore,
        window_id: &WindowId,
        item_id: &ItemId,
        depth: usize,
    ) -> Result<WindowId> {
        let child = store.open_item(window_id, item_id)?;
        if self.active_path.get(depth) == Some(window_id) {
            self.active_path.truncate(depth + 1);
        } else {
            log::debug!(
                "Window {} is not at depth {} of the active path; revealing it",
                window_id,
                depth
            );
            self.active_path = store
                .window_path(window_id)
                .ok_or_else(|| NotesError::window_not_found(window_id))?;
        }
        self.active_item_id = Some(item_id.clone());
        self.active_path.push(child.clone());
        crate::debug_trace!(
            "NAV",
            "Opened {} at depth {}; path is now {:?}",
            item_id,
            depth,
            self.active_path
        );
        Ok(child)
    }

    /// Show the column chain ending at `window_id`
    pub fn reveal(&mut self, store: &TreeStore, window_id: &WindowId) -> Result<()> {
        self.active_path = store
            .window_path(window_id)
            .ok_or_else(|| NotesError::window_not_found(window_id))?;
        Ok(())
    }

    /// Make `item_id` active without changing the column chain
    pub fn select(&mut self, item_id: Option<ItemId>) {
        self.active_item_id = item_id;
    }

    /// Drop deleted windows from the path and clear a deleted active item.
    ///
    /// Deletions remove whole subtrees, so the path is cut at the first
    /// deleted window; the root is never removed.
    pub fn repair_after_deletion(&mut self, deleted: &DeletionReport) {
        if let Some(cut) = self
            .active_path
            .iter()
            .position(|id| !id.is_root() && deleted.windows.contains(id))
        {
            self.active_path.truncate(cut);
        }
        if self.active_path.is_empty() {
            self.active_path.push(WindowId::root());
        }

        if let Some(active) = &self.active_item_id
            && deleted.items.contains(active)
        {
            log::debug!("Active item {} was deleted", active);
            self.active_item_id = None;
        }
    }

    /// Items owning each non-root window of the active path, left to right.
    ///
    /// Used to highlight the active branch.
    pub fn ancestor_item_ids(&self, store: &TreeStore) -> Vec<ItemId> {
        self.active_path
            .iter()
            .filter(|id| !id.is_root())
            .filter_map(|id| store.owner_of_window(id).cloned())
            .collect()
    }

    /// Whether `item_id` lies on the active branch
    pub fn is_on_active_branch(&self, store: &TreeStore, item_id: &ItemId) -> bool {
        store
            .item(item_id)
            .and_then(|item| item.child_window_id.as_ref())
            .is_some_and(|child| self.active_path.contains(child))
    }

    /// Drop path entries that no longer resolve, e.g. after a reload
    pub fn revalidate(&mut self, store: &TreeStore) {
        if let Some(cut) = self
            .active_path
            .iter()
            .position(|id| !store.contains_window(id))
        {
            self.active_path.truncate(cut);
        }
        if self.active_path.is_empty() {
            self.active_path.push(WindowId::root());
        }
        if let Some(active) = &self.active_item_id
            && store.item(active).is_none()
        {
            self.active_item_id = None;
        }
    }
}
