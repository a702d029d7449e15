//! Export and import of note subtrees.
//!
//! Exports are flat record lists carrying `depth` and a lineage label
//! (`fromParent`); imports rebuild the hierarchy from those labels.

pub mod export;
pub mod import;
pub mod markup;

pub use export::{ExportFormat, ExportRecord, collect_records, export, to_json, to_text};
pub use import::{ImportRecord, ImportReport, import_json, import_records, parse_records};
pub use markup::strip_markup;

use crate::error::Result;
use std::path::Path;

/// Write an export to `path`, creating parent directories
pub fn write_export(path: &Path, records: &[ExportRecord], format: ExportFormat) -> Result<()> {
    let body = export(records, format).map_err(std::io::Error::other)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, body)?;
    log::info!("Exported {} records to {:?}", records.len(), path);
    Ok(())
}

/// Read a structured export from `path`
pub fn read_import(path: &Path) -> Result<Vec<ImportRecord>> {
    let json = std::fs::read_to_string(path)?;
    parse_records(&json)
}
