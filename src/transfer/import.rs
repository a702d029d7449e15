//! Rebuild a hierarchy from exported records.
//!
//! Parents are resolved by lineage label: a record lands in the child
//! window of the first record whose title equals its `fromParent`. Titles
//! that repeat within one export make this ambiguous; the first match wins.

use crate::error::{NotesError, Result};
use crate::tree::store::break_cycles;
use crate::tree::{Item, ItemId, TreeStore};
use serde::Deserialize;
use std::collections::HashMap;

/// Import-side view of an export record. Only `title` and `fromParent`
/// are required; `depth` is informational and ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub depth: Option<usize>,
    pub from_parent: String,
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// Outcome of a successful import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Ids of the created items, in input order
    pub created: Vec<ItemId>,
    /// Records placed at root because their lineage could not be resolved
    pub rehomed: usize,
    /// Exported id to newly allocated id, for records that carried one
    pub id_map: HashMap<String, ItemId>,
}

/// Parse a structured export. Anything but a record array is rejected.
pub fn parse_records(json: &str) -> Result<Vec<ImportRecord>> {
    serde_json::from_str(json).map_err(|e| NotesError::InvalidFormat(e.to_string()))
}

/// Parse `json` and graft the records onto `store`.
///
/// The store is only modified when the whole payload imports cleanly.
pub fn import_json(store: &mut TreeStore, json: &str, root_label: &str) -> Result<ImportReport> {
    let records = parse_records(json)?;
    import_records(store, &records, root_label)
}

/// Graft already-parsed records onto `store`, all or nothing.
pub fn import_records(
    store: &mut TreeStore,
    records: &[ImportRecord],
    root_label: &str,
) -> Result<ImportReport> {
    let (parents, rehomed) = resolve_parents(records, root_label);
    let now = chrono::Utc::now().timestamp_millis();
    let items: Vec<Item> = records
        .iter()
        .map(|record| {
            let mut item = Item::new(ItemId::generate(), record.title.clone());
            item.content = record.content.clone();
            item.created_at = record.created_at.unwrap_or(now);
            item
        })
        .collect();
    let new_ids: Vec<ItemId> = items.iter().map(|item| item.id.clone()).collect();

    let mut staged = store.clone();
    staged.graft(items, &parents)?;

    let problems = staged.invariant_violations();
    if !problems.is_empty() {
        return Err(NotesError::InvalidFormat(problems.join("; ")));
    }
    *store = staged;

    let id_map = records
        .iter()
        .zip(&new_ids)
        .filter(|(record, _)| !record.id.is_empty())
        .map(|(record, id)| (record.id.clone(), id.clone()))
        .collect();

    log::info!(
        "Imported {} records ({} re-homed to root)",
        records.len(),
        rehomed
    );
    Ok(ImportReport {
        created: new_ids,
        rehomed,
        id_map,
    })
}

/// Index of each record's parent record, `None` for root.
///
/// Self-references, unknown labels and lineage cycles resolve to root.
fn resolve_parents(records: &[ImportRecord], root_label: &str) -> (Vec<Option<usize>>, usize) {
    let mut first_by_title: HashMap<&str, usize> = HashMap::new();
    for (index, record) in records.iter().enumerate() {
        first_by_title.entry(record.title.as_str()).or_insert(index);
    }

    let mut rehomed = 0;
    let mut parents: Vec<Option<usize>> = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            if record.from_parent == root_label {
                return None;
            }
            match first_by_title.get(record.from_parent.as_str()) {
                Some(&parent) if parent != index => Some(parent),
                Some(_) => {
                    log::warn!("Record '{}' names itself as parent; placing at root", record.title);
                    rehomed += 1;
                    None
                }
                None => {
                    log::warn!(
                        "No record titled '{}' for '{}'; placing at root",
                        record.from_parent,
                        record.title
                    );
                    rehomed += 1;
                    None
                }
            }
        })
        .collect();

    for index in break_cycles(&mut parents) {
        log::warn!(
            "Lineage cycle through '{}'; placing at root",
            records[index].title
        );
        rehomed += 1;
    }

    crate::debug_trace!("IMPORT", "Resolved parents: {:?}", parents);
    (parents, rehomed)
}
