//! Windows (columns) and items (notes) of the note hierarchy.
//!
//! The tree is a forest of windows rooted at [`WindowId::root`]. An item may
//! own exactly one child window through `child_window_id`; every non-root
//! window is owned by exactly one item.

pub mod numbering;
pub mod store;

pub use store::{DeletionReport, TreeStore, Walk};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, globally unique item identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Allocate a fresh random id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Prefix of window ids derived from their owning item
const CHILD_WINDOW_PREFIX: &str = "win-";

/// Reserved id of the root window
const ROOT_WINDOW_ID: &str = "root";

/// Opaque window identifier.
///
/// Child windows are named after the item that owns them (`win-<item id>`),
/// which lets the persistence layer recover the owner from the `parent_id`
/// column alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(String);

impl WindowId {
    /// The root window id
    pub fn root() -> Self {
        Self(ROOT_WINDOW_ID.to_string())
    }

    /// Id of the child window owned by `item`
    pub fn child_of(item: &ItemId) -> Self {
        Self(format!("{CHILD_WINDOW_PREFIX}{item}"))
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_WINDOW_ID
    }

    /// The owning item id encoded in a child window id, if any
    pub fn owner_hint(&self) -> Option<ItemId> {
        self.0
            .strip_prefix(CHILD_WINDOW_PREFIX)
            .filter(|rest| !rest.is_empty())
            .map(ItemId::from)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WindowId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for WindowId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A note: title, HTML content, and an optional child window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    /// Rich-text body as produced by the editor component
    pub content: String,
    /// Creation time in milliseconds since the Unix epoch
    pub created_at: i64,
    /// Set once the item has been opened; the item is a leaf otherwise
    pub child_window_id: Option<WindowId>,
}

impl Item {
    /// Create an empty leaf item stamped with the current time
    pub fn new(id: ItemId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            content: String::new(),
            created_at: chrono::Utc::now().timestamp_millis(),
            child_window_id: None,
        }
    }
}

/// A column: an ordered list of sibling items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub id: WindowId,
    pub items: Vec<Item>,
    pub collapsed: bool,
}

impl Window {
    pub fn new(id: WindowId) -> Self {
        Self {
            id,
            items: Vec::new(),
            collapsed: false,
        }
    }

    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|item| &item.id == id)
    }

    fn item_mut(&mut self, id: &ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|item| &item.id == id)
    }
}
