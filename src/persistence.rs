//! Translation between the tree and the persistence service's flat rows.
//!
//! A row's `parent_id` is the id of the window holding the item (absent
//! for the root window). Child window ids encode their owning item, so a
//! row set maps back onto the same forest. An item that was opened but
//! never given children has no rows under its window, and its empty window
//! is re-materialised the next time it is opened.

use crate::tree::store::break_cycles;
use crate::tree::{Item, ItemId, TreeStore, WindowId};
use par_notes_sync::TabRecord;
use std::collections::{HashMap, HashSet};

/// Every item as a service row, in pre-order
pub fn snapshot(store: &TreeStore) -> Vec<TabRecord> {
    store
        .walk()
        .map(|(_, window, item)| TabRecord {
            id: item.id.to_string(),
            title: item.title.clone(),
            content: item.content.clone(),
            parent_id: (!window.id.is_root()).then(|| window.id.to_string()),
            created_at: item.created_at,
        })
        .collect()
}

/// Rebuild a store from service rows.
///
/// Rows are placed in creation order within each window. Duplicate ids
/// keep their first row; rows whose owner is missing, or that sit on an
/// ownership cycle, are moved to the root window.
pub fn restore(records: Vec<TabRecord>, title_prefix: &str) -> TreeStore {
    let mut seen = HashSet::new();
    let mut rows: Vec<TabRecord> = Vec::with_capacity(records.len());
    for record in records {
        if seen.insert(record.id.clone()) {
            rows.push(record);
        } else {
            log::warn!("Ignoring duplicate row for item {}", record.id);
        }
    }
    rows.sort_by_key(|row| row.created_at);

    let index_of: HashMap<&str, usize> = rows
        .iter()
        .enumerate()
        .map(|(index, row)| (row.id.as_str(), index))
        .collect();

    let mut parents: Vec<Option<usize>> = rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let window = match row.parent_id.as_deref() {
                None | Some("") => return None,
                Some(id) => WindowId::from(id),
            };
            if window.is_root() {
                return None;
            }
            let owner = window
                .owner_hint()
                .and_then(|owner| index_of.get(owner.as_str()).copied())
                .filter(|&owner| owner != index);
            if owner.is_none() {
                log::warn!(
                    "Item {} references unknown window {}; moving to root",
                    row.id,
                    window
                );
            }
            owner
        })
        .collect();

    for index in break_cycles(&mut parents) {
        log::warn!("Item {} is on an ownership cycle; moving to root", rows[index].id);
    }

    let items: Vec<Item> = rows
        .into_iter()
        .map(|row| Item {
            id: ItemId::from(row.id),
            title: row.title,
            content: row.content,
            created_at: row.created_at,
            child_window_id: None,
        })
        .collect();

    let mut store = TreeStore::with_title_prefix(title_prefix);
    if let Err(e) = store.graft(items, &parents) {
        // Unreachable after deduplication and cycle breaking; keep what landed.
        log::error!("Restore stopped early: {}", e);
    }

    let problems = store.invariant_violations();
    if !problems.is_empty() {
        log::error!("Restored tree is inconsistent: {}", problems.join("; "));
    }
    log::info!(
        "Restored {} items in {} windows",
        store.item_count(),
        store.window_count()
    );
    store
}
