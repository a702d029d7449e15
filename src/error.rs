//! Typed error types for the par-notes core.
//!
//! Business-rule oddities (duplicate titles, empty windows) are valid states
//! and never produce errors; only missing ids, malformed import payloads and
//! I/O around them do.

use par_notes_sync::SyncError;
use std::fmt;
use thiserror::Error;

/// What kind of entity a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Window,
    Item,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Window => f.write_str("Window"),
            EntityKind::Item => f.write_str("Item"),
        }
    }
}

/// Top-level error type for store, navigation and transfer operations.
#[derive(Debug, Error)]
pub enum NotesError {
    /// The operation referenced a window or item id that does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Whether a window or an item was missing.
        kind: EntityKind,
        /// The id that failed to resolve.
        id: String,
    },

    /// An import payload was not a well-formed record array.
    /// The store is left untouched when this is returned.
    #[error("Invalid import format: {0}")]
    InvalidFormat(String),

    /// Reading or writing an export/import file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Talking to the persistence service failed.
    #[error("Sync failure: {0}")]
    Sync(#[from] SyncError),
}

impl NotesError {
    pub fn window_not_found(id: impl fmt::Display) -> Self {
        NotesError::NotFound {
            kind: EntityKind::Window,
            id: id.to_string(),
        }
    }

    pub fn item_not_found(id: impl fmt::Display) -> Self {
        NotesError::NotFound {
            kind: EntityKind::Item,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, NotesError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, NotesError>;
