//! Flatten the selected part of the tree into export records.

use super::markup::strip_markup;
use crate::selection::Selection;
use crate::tree::TreeStore;
use serde::{Deserialize, Serialize};

/// One exported note with its depth and lineage label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    pub id: String,
    pub title: String,
    pub content: String,
    pub depth: usize,
    /// Title of the owning item, or the root label for top-level notes
    pub from_parent: String,
    pub created_at: i64,
}

/// Output encodings supported by [`export`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Text,
}

impl ExportFormat {
    /// Conventional file extension for the format
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Text => "txt",
        }
    }
}

/// Collect selected items in pre-order.
///
/// Unselected items are skipped but their subtrees are still visited, so a
/// selected grandchild keeps its true depth and lineage.
pub fn collect_records(
    store: &TreeStore,
    selection: &Selection,
    root_label: &str,
) -> Vec<ExportRecord> {
    store
        .walk()
        .filter(|(_, _, item)| selection.contains(&item.id))
        .map(|(depth, window, item)| {
            let from_parent = store
                .owner_of_window(&window.id)
                .and_then(|owner| store.item(owner))
                .map(|owner| owner.title.clone())
                .unwrap_or_else(|| root_label.to_string());
            ExportRecord {
                id: item.id.to_string(),
                title: item.title.clone(),
                content: item.content.clone(),
                depth,
                from_parent,
                created_at: item.created_at,
            }
        })
        .collect()
}

/// Structured form: pretty-printed JSON array
pub fn to_json(records: &[ExportRecord]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(records)
}

/// Flattened text form: `=` heading per record, then its plain body.
pub fn to_text(records: &[ExportRecord]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&"=".repeat(record.depth + 1));
        out.push(' ');
        out.push_str(&record.title.to_uppercase());
        out.push_str(&format!(" (Source: {})\n", record.from_parent));

        let body = strip_markup(&record.content);
        if !body.is_empty() {
            out.push_str(&body);
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

/// Render `records` in `format`
pub fn export(records: &[ExportRecord], format: ExportFormat) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => to_json(records),
        ExportFormat::Text => Ok(to_text(records)),
    }
}
