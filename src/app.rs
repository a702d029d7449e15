//! Application root.
//!
//! `App` owns the tree and every piece of state derived from it. Each
//! mutating method runs the store primitive, repairs navigation and the
//! per-window state, then hands a fresh snapshot to the sync scheduler.

use crate::error::{NotesError, Result};
use crate::navigation::Navigation;
use crate::persistence;
use crate::selection::Selection;
use crate::transfer::{self, ExportFormat, ExportRecord, ImportReport};
use crate::tree::{DeletionReport, Item, ItemId, TreeStore, WindowId};
use crate::view::{SortMode, ViewStates};
use par_notes_config::Config;
use par_notes_sync::{SyncBackend, SyncBatch, SyncOutcome, SyncScheduler};
use std::sync::Arc;
use tokio::runtime::Handle;

pub struct App {
    config: Config,
    store: TreeStore,
    navigation: Navigation,
    views: ViewStates,
    selection: Selection,
    sync: Option<SyncScheduler>,
    /// Ids removed since the last scheduled batch
    tombstones: Vec<String>,
}

impl App {
    /// Empty tree, no sync
    pub fn new(config: Config) -> Self {
        let store = TreeStore::with_title_prefix(config.title_prefix.clone());
        let views = ViewStates::new(config.default_sort);
        Self {
            config,
            store,
            navigation: Navigation::new(),
            views,
            selection: Selection::new(),
            sync: None,
            tombstones: Vec::new(),
        }
    }

    /// Empty tree whose mutations are synced to `backend` after the
    /// configured quiet period
    pub fn with_sync(config: Config, backend: Arc<dyn SyncBackend>, runtime: Handle) -> Self {
        let debounce = config.sync_debounce();
        let mut app = Self::new(config);
        app.sync = Some(SyncScheduler::new(backend, runtime, debounce));
        app
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &TreeStore {
        &self.store
    }

    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Toggle `item` and its subtree in the export selection
    pub fn toggle_selection(&mut self, item: &ItemId) -> bool {
        self.selection.toggle(&self.store, item)
    }

    /// Add `item` and its subtree to the export selection
    pub fn select_subtree(&mut self, item: &ItemId) -> Result<()> {
        if self.store.item(item).is_none() {
            return Err(NotesError::item_not_found(item));
        }
        self.selection.select_subtree(&self.store, item);
        Ok(())
    }

    pub fn select_all(&mut self) {
        self.selection.select_all(&self.store);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn sync_pending(&self) -> bool {
        self.sync.as_ref().is_some_and(SyncScheduler::pending)
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Replace the tree with the rows stored in `backend`.
    ///
    /// Loading does not schedule a sync.
    pub fn load_from(&mut self, backend: &dyn SyncBackend) -> Result<usize> {
        let rows = backend.fetch_all()?;
        let count = rows.len();
        self.store = persistence::restore(rows, &self.config.title_prefix);
        self.navigation.revalidate(&self.store);
        self.selection.retain_existing(&self.store);
        self.views.retain_existing(&self.store);
        log::info!("Loaded {} rows from persistence", count);
        Ok(count)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub fn create_item(&mut self, window: &WindowId, title: Option<&str>) -> Result<Item> {
        let item = self.store.create_item(window, title)?;
        self.schedule_sync();
        Ok(item)
    }

    pub fn rename_item(&mut self, window: &WindowId, item: &ItemId, title: &str) -> Result<()> {
        self.store.rename_item(window, item, title)?;
        self.schedule_sync();
        Ok(())
    }

    /// Replace content; a missing item is ignored and schedules nothing
    pub fn set_content(&mut self, item: &ItemId, html: &str) -> bool {
        let changed = self.store.set_content(item, html);
        if changed {
            self.schedule_sync();
        }
        changed
    }

    /// Open `item` from the column at `depth` of the active path.
    ///
    /// Only the first open changes the tree; re-opening is navigation and
    /// schedules nothing.
    pub fn open(&mut self, window: &WindowId, item: &ItemId, depth: usize) -> Result<WindowId> {
        let materialised = self
            .store
            .item(item)
            .is_some_and(|existing| existing.child_window_id.is_none());
        let child = self.navigation.open(&mut self.store, window, item, depth)?;
        if materialised {
            self.schedule_sync();
        }
        Ok(child)
    }

    /// Open `item` wherever it lives, revealing the columns above it first
    pub fn open_item(&mut self, item: &ItemId) -> Result<WindowId> {
        let window = self
            .store
            .owner_of_item(item)
            .cloned()
            .ok_or_else(|| NotesError::item_not_found(item))?;
        self.navigation.reveal(&self.store, &window)?;
        let depth = self.navigation.active_path().len().saturating_sub(1);
        self.open(&window, item, depth)
    }

    /// Window currently holding `item`
    pub fn window_of(&self, item: &ItemId) -> Result<WindowId> {
        self.store
            .owner_of_item(item)
            .cloned()
            .ok_or_else(|| NotesError::item_not_found(item))
    }

    pub fn select(&mut self, item: Option<ItemId>) {
        self.navigation.select(item);
    }

    /// Cascade-delete `item`. Confirmation is the caller's job.
    pub fn delete_item(&mut self, window: &WindowId, item: &ItemId) -> Result<DeletionReport> {
        let report = self.store.delete_item(window, item)?;
        self.navigation.repair_after_deletion(&report);
        self.selection.retain_existing(&self.store);
        self.views.retain_existing(&self.store);
        if self.config.propagate_deletes {
            self.tombstones
                .extend(report.items.iter().map(ItemId::to_string));
        }
        self.schedule_sync();
        Ok(report)
    }

    pub fn toggle_collapse(&mut self, window: &WindowId) -> Result<bool> {
        let collapsed = self.store.toggle_collapse(window)?;
        self.schedule_sync();
        Ok(collapsed)
    }

    /// Import a structured export; nothing changes on failure
    pub fn import_json(&mut self, json: &str) -> Result<ImportReport> {
        let report = transfer::import_json(&mut self.store, json, &self.config.root_label)?;
        self.schedule_sync();
        Ok(report)
    }

    // ========================================================================
    // Views and export
    // ========================================================================

    pub fn set_query(&mut self, window: &WindowId, query: &str) {
        self.views.set_query(window, query);
    }

    pub fn set_sort(&mut self, window: &WindowId, sort: SortMode) {
        self.views.set_sort(window, sort);
    }

    /// Filtered, sorted display list for `window`
    pub fn project(&self, window: &WindowId) -> Vec<&Item> {
        self.views.project(&self.store, window)
    }

    /// Items on the active branch, for highlighting
    pub fn active_branch(&self) -> Vec<ItemId> {
        self.navigation.ancestor_item_ids(&self.store)
    }

    /// Records for the current selection
    pub fn export_records(&self) -> Vec<ExportRecord> {
        transfer::collect_records(&self.store, &self.selection, &self.config.root_label)
    }

    pub fn export(&self, format: ExportFormat) -> Result<String> {
        transfer::export(&self.export_records(), format)
            .map_err(|e| std::io::Error::other(e).into())
    }

    // ========================================================================
    // Sync
    // ========================================================================

    /// Hand the current snapshot to the scheduler
    fn schedule_sync(&mut self) {
        let Some(sync) = self.sync.as_mut() else {
            return;
        };
        let mut batch = SyncBatch::new(persistence::snapshot(&self.store));
        batch.deletions = std::mem::take(&mut self.tombstones);
        sync.schedule(batch);
    }

    /// Send any pending snapshot now
    pub async fn flush_sync(&mut self) -> Result<Option<SyncOutcome>> {
        match self.sync.as_mut() {
            Some(sync) => Ok(sync.flush().await?),
            None => Ok(None),
        }
    }
}
