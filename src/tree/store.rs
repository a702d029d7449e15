//! In-memory tree store and its mutation primitives.
//!
//! All mutations are synchronous and complete before returning, so any
//! snapshot taken between calls reflects a consistent forest. Reverse
//! indices (item → owning window, window → owning item) are kept current
//! by every primitive so owner lookups never scan the whole tree.

use super::numbering;
use super::{Item, ItemId, Window, WindowId};
use crate::error::{NotesError, Result};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Everything removed by one cascade delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionReport {
    /// The deleted item and every item beneath it
    pub items: BTreeSet<ItemId>,
    /// Every window reachable from the deleted item
    pub windows: BTreeSet<WindowId>,
}

/// Owner of all windows and items.
#[derive(Debug, Clone)]
pub struct TreeStore {
    windows: HashMap<WindowId, Window>,
    item_owner: HashMap<ItemId, WindowId>,
    window_owner: HashMap<WindowId, ItemId>,
    title_prefix: String,
}

impl Default for TreeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeStore {
    /// Create a store holding only the empty root window
    pub fn new() -> Self {
        Self::with_title_prefix(par_notes_config::defaults::title_prefix())
    }

    /// Create an empty store whose default titles use `prefix`
    pub fn with_title_prefix(prefix: impl Into<String>) -> Self {
        let mut windows = HashMap::new();
        windows.insert(WindowId::root(), Window::new(WindowId::root()));
        Self {
            windows,
            item_owner: HashMap::new(),
            window_owner: HashMap::new(),
            title_prefix: prefix.into(),
        }
    }

    pub fn title_prefix(&self) -> &str {
        &self.title_prefix
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    pub fn root(&self) -> &Window {
        // The root window is inserted on construction and never removed.
        &self.windows[&WindowId::root()]
    }

    pub fn window(&self, id: &WindowId) -> Option<&Window> {
        self.windows.get(id)
    }

    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        let owner = self.item_owner.get(id)?;
        self.windows.get(owner)?.item(id)
    }

    fn item_mut(&mut self, id: &ItemId) -> Option<&mut Item> {
        let owner = self.item_owner.get(id)?;
        self.windows.get_mut(owner)?.item_mut(id)
    }

    /// Window that contains `item`
    pub fn owner_of_item(&self, item: &ItemId) -> Option<&WindowId> {
        self.item_owner.get(item)
    }

    /// Item whose child window is `window`; `None` for root or unknown ids
    pub fn owner_of_window(&self, window: &WindowId) -> Option<&ItemId> {
        self.window_owner.get(window)
    }

    pub fn contains_window(&self, id: &WindowId) -> bool {
        self.windows.contains_key(id)
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    pub fn item_count(&self) -> usize {
        self.item_owner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_owner.is_empty()
    }

    /// Windows from the root down to `window`, inclusive
    pub fn window_path(&self, window: &WindowId) -> Option<Vec<WindowId>> {
        if !self.windows.contains_key(window) {
            return None;
        }
        let mut path = vec![window.clone()];
        let mut cursor = window;
        while let Some(owner) = self.window_owner.get(cursor) {
            let parent = self.item_owner.get(owner)?;
            if path.len() > self.windows.len() {
                return None;
            }
            path.push(parent.clone());
            cursor = parent;
        }
        path.reverse();
        Some(path)
    }

    /// Pre-order walk from the root: `(depth, window, item)` in document order
    pub fn walk(&self) -> Walk<'_> {
        Walk::new(self)
    }

    /// `item` followed by every item beneath it, one window at a time
    pub fn subtree_item_ids(&self, item: &ItemId) -> Vec<ItemId> {
        let Some(start) = self.item(item) else {
            return Vec::new();
        };

        let mut out = vec![start.id.clone()];
        let mut seen: HashSet<&WindowId> = HashSet::new();
        let mut stack: Vec<&WindowId> = start.child_window_id.iter().collect();
        while let Some(window_id) = stack.pop() {
            if !seen.insert(window_id) {
                continue;
            }
            let Some(window) = self.windows.get(window_id) else {
                continue;
            };
            // Reverse so the stack pops siblings in document order.
            for child in window.items.iter().rev() {
                if let Some(grandchild) = &child.child_window_id {
                    stack.push(grandchild);
                }
            }
            out.extend(window.items.iter().map(|child| child.id.clone()));
        }
        out
    }

    // ========================================================================
    // Mutation primitives
    // ========================================================================

    /// Append a new leaf item to `window_id`.
    ///
    /// Without a title, one is derived from the numbering rule.
    pub fn create_item(&mut self, window_id: &WindowId, title: Option<&str>) -> Result<Item> {
        let window = self
            .windows
            .get(window_id)
            .ok_or_else(|| NotesError::window_not_found(window_id))?;

        let title = match title {
            Some(title) => title.to_string(),
            None => {
                let owner_title = self
                    .window_owner
                    .get(window_id)
                    .and_then(|owner| self.item(owner))
                    .map(|owner| owner.title.as_str());
                numbering::default_title(
                    owner_title,
                    window.items.iter().map(|item| item.title.as_str()),
                    &self.title_prefix,
                )
            }
        };

        let item = Item::new(ItemId::generate(), title);
        self.attach(window_id, item.clone())?;
        crate::debug_log!(
            "TREE",
            "Created item {} '{}' in window {}",
            item.id,
            item.title,
            window_id
        );
        Ok(item)
    }

    /// Append an existing leaf item to `window_id`.
    ///
    /// Any `child_window_id` on `item` is cleared; use
    /// [`ensure_child_window`](Self::ensure_child_window) to materialise it.
    pub(crate) fn attach(&mut self, window_id: &WindowId, mut item: Item) -> Result<()> {
        if self.item_owner.contains_key(&item.id) {
            return Err(NotesError::InvalidFormat(format!(
                "duplicate item id {}",
                item.id
            )));
        }
        let window = self
            .windows
            .get_mut(window_id)
            .ok_or_else(|| NotesError::window_not_found(window_id))?;

        item.child_window_id = None;
        self.item_owner.insert(item.id.clone(), window_id.clone());
        window.items.push(item);
        Ok(())
    }

    /// Attach a batch of new items, each under the entry named by `parents`.
    ///
    /// `parents[i]` is the index of the item whose child window receives
    /// `items[i]`, or `None` for the root window. Parents are inserted
    /// before their children and siblings keep their relative order. The
    /// parent relation must be acyclic (see [`break_cycles`]).
    pub(crate) fn graft(&mut self, items: Vec<Item>, parents: &[Option<usize>]) -> Result<()> {
        let ids: Vec<ItemId> = items.iter().map(|item| item.id.clone()).collect();
        let mut slots: Vec<Option<Item>> = items.into_iter().map(Some).collect();
        let mut remaining = slots.len();

        while remaining > 0 {
            let mut progressed = false;
            for index in 0..slots.len() {
                if slots[index].is_none() {
                    continue;
                }
                let window = match parents.get(index).copied().flatten() {
                    None => WindowId::root(),
                    Some(parent) if slots.get(parent).is_some_and(Option::is_none) => {
                        self.ensure_child_window(&ids[parent])?
                    }
                    Some(_) => continue,
                };
                if let Some(item) = slots[index].take() {
                    self.attach(&window, item)?;
                }
                remaining -= 1;
                progressed = true;
            }
            if !progressed {
                return Err(NotesError::InvalidFormat(
                    "unresolvable parent relation".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Replace an item's title. Titles need not be unique among siblings.
    pub fn rename_item(
        &mut self,
        window_id: &WindowId,
        item_id: &ItemId,
        new_title: &str,
    ) -> Result<()> {
        let window = self
            .windows
            .get_mut(window_id)
            .ok_or_else(|| NotesError::window_not_found(window_id))?;
        let item = window
            .item_mut(item_id)
            .ok_or_else(|| NotesError::item_not_found(item_id))?;

        crate::debug_log!("TREE", "Renamed {} '{}' -> '{}'", item_id, item.title, new_title);
        item.title = new_title.to_string();
        Ok(())
    }

    /// Replace an item's HTML content.
    ///
    /// Unknown ids are a silent no-op: an in-flight editor save can race
    /// with the deletion of its item. Returns whether anything changed.
    pub fn set_content(&mut self, item_id: &ItemId, html: &str) -> bool {
        match self.item_mut(item_id) {
            Some(item) => {
                item.content = html.to_string();
                true
            }
            None => {
                log::debug!("Dropping content update for missing item {}", item_id);
                false
            }
        }
    }

    /// Return the item's child window, creating it on first open.
    pub fn open_item(&mut self, window_id: &WindowId, item_id: &ItemId) -> Result<WindowId> {
        let window = self
            .windows
            .get(window_id)
            .ok_or_else(|| NotesError::window_not_found(window_id))?;
        if window.item(item_id).is_none() {
            return Err(NotesError::item_not_found(item_id));
        }
        self.ensure_child_window(item_id)
    }

    /// Child window of `item_id`, allocated exactly once.
    pub(crate) fn ensure_child_window(&mut self, item_id: &ItemId) -> Result<WindowId> {
        let item = self
            .item_mut(item_id)
            .ok_or_else(|| NotesError::item_not_found(item_id))?;
        if let Some(existing) = &item.child_window_id {
            return Ok(existing.clone());
        }

        let child = WindowId::child_of(item_id);
        item.child_window_id = Some(child.clone());
        self.windows.insert(child.clone(), Window::new(child.clone()));
        self.window_owner.insert(child.clone(), item_id.clone());
        crate::debug_log!("TREE", "Materialised window {} for {}", child, item_id);
        Ok(child)
    }

    /// Delete an item and everything transitively beneath it.
    ///
    /// The full closure is collected before anything is removed, so no
    /// reference dangles at any point visible to callers.
    pub fn delete_item(&mut self, window_id: &WindowId, item_id: &ItemId) -> Result<DeletionReport> {
        let window = self
            .windows
            .get(window_id)
            .ok_or_else(|| NotesError::window_not_found(window_id))?;
        let item = window
            .item(item_id)
            .ok_or_else(|| NotesError::item_not_found(item_id))?;

        let mut report = DeletionReport::default();
        report.items.insert(item.id.clone());

        let mut worklist: Vec<WindowId> = item.child_window_id.iter().cloned().collect();
        while let Some(next) = worklist.pop() {
            if !report.windows.insert(next.clone()) {
                continue;
            }
            if let Some(child) = self.windows.get(&next) {
                for descendant in &child.items {
                    report.items.insert(descendant.id.clone());
                    if let Some(grandchild) = &descendant.child_window_id {
                        worklist.push(grandchild.clone());
                    }
                }
            }
        }

        if let Some(window) = self.windows.get_mut(window_id) {
            window.items.retain(|item| &item.id != item_id);
        }
        for removed in &report.windows {
            self.windows.remove(removed);
            self.window_owner.remove(removed);
        }
        for removed in &report.items {
            self.item_owner.remove(removed);
        }

        log::info!(
            "Deleted item {} ({} items, {} windows removed)",
            item_id,
            report.items.len(),
            report.windows.len()
        );
        Ok(report)
    }

    /// Flip a window's collapsed flag; the root never collapses.
    ///
    /// Returns the new state.
    pub fn toggle_collapse(&mut self, window_id: &WindowId) -> Result<bool> {
        if window_id.is_root() {
            return Ok(false);
        }
        let window = self
            .windows
            .get_mut(window_id)
            .ok_or_else(|| NotesError::window_not_found(window_id))?;
        window.collapsed = !window.collapsed;
        Ok(window.collapsed)
    }

    // ========================================================================
    // Invariants
    // ========================================================================

    /// Describe every violation of the forest invariant; empty when sound.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut references: HashMap<&WindowId, usize> = HashMap::new();
        let mut seen_items: HashSet<&ItemId> = HashSet::new();

        for window in self.windows.values() {
            for item in &window.items {
                if !seen_items.insert(&item.id) {
                    problems.push(format!("item {} appears more than once", item.id));
                }
                if self.item_owner.get(&item.id) != Some(&window.id) {
                    problems.push(format!("item index out of date for {}", item.id));
                }
                if let Some(child) = &item.child_window_id {
                    *references.entry(child).or_default() += 1;
                    if !self.windows.contains_key(child) {
                        problems.push(format!("item {} references missing window {}", item.id, child));
                    }
                    if self.window_owner.get(child) != Some(&item.id) {
                        problems.push(format!("window index out of date for {}", child));
                    }
                }
            }
        }

        for id in self.windows.keys() {
            let count = references.get(id).copied().unwrap_or(0);
            if id.is_root() {
                if count != 0 {
                    problems.push("root window is owned by an item".to_string());
                }
            } else if count != 1 {
                problems.push(format!("window {} has {} owners", id, count));
            }
        }

        if seen_items.len() != self.item_owner.len() {
            problems.push("item index has stale entries".to_string());
        }

        let reachable = self.walk().count();
        if reachable != seen_items.len() {
            problems.push(format!(
                "{} items unreachable from root",
                seen_items.len().saturating_sub(reachable)
            ));
        }

        problems
    }

    pub fn is_consistent(&self) -> bool {
        self.invariant_violations().is_empty()
    }
}

/// Cut every cycle in a parent relation by re-rooting one member of it.
///
/// Returns the indices that were moved to the root.
pub(crate) fn break_cycles(parents: &mut [Option<usize>]) -> Vec<usize> {
    let mut cut = Vec::new();
    for start in 0..parents.len() {
        let mut seen = HashSet::new();
        let mut cursor = start;
        while let Some(parent) = parents[cursor] {
            if !seen.insert(cursor) || parent >= parents.len() {
                parents[cursor] = None;
                cut.push(cursor);
                break;
            }
            cursor = parent;
        }
    }
    cut
}

/// Iterator returned by [`TreeStore::walk`].
pub struct Walk<'a> {
    store: &'a TreeStore,
    stack: Vec<(usize, &'a Window, usize)>,
    visited: HashSet<&'a WindowId>,
}

impl<'a> Walk<'a> {
    fn new(store: &'a TreeStore) -> Self {
        let root = store.root();
        let mut visited = HashSet::new();
        visited.insert(&root.id);
        Self {
            store,
            stack: vec![(0, root, 0)],
            visited,
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a Window, &'a Item);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            let (depth, window) = (top.0, top.1);
            if top.2 >= window.items.len() {
                self.stack.pop();
                continue;
            }
            let item = &window.items[top.2];
            top.2 += 1;

            if let Some(child) = item
                .child_window_id
                .as_ref()
                .and_then(|id| self.store.windows.get(id))
                && self.visited.insert(&child.id)
            {
                self.stack.push((depth + 1, child, 0));
            }
            return Some((depth, window, item));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> WindowId {
        WindowId::root()
    }

    #[test]
    fn test_new_store_has_only_root() {
        let store = TreeStore::new();
        assert_eq!(store.window_count(), 1);
        assert!(store.root().items.is_empty());
        assert!(store.is_consistent());
    }

    #[test]
    fn test_create_item_unknown_window() {
        let mut store = TreeStore::new();
        let err = store
            .create_item(&WindowId::from("nope"), None)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_create_item_default_titles() {
        let mut store = TreeStore::new();
        let first = store.create_item(&root(), None).unwrap();
        let second = store.create_item(&root(), None).unwrap();
        assert_eq!(first.title, "Note 1");
        assert_eq!(second.title, "Note 2");

        let child_window = store.open_item(&root(), &first.id).unwrap();
        let nested = store.create_item(&child_window, None).unwrap();
        assert_eq!(nested.title, "1.1");
        let nested2 = store.create_item(&child_window, None).unwrap();
        assert_eq!(nested2.title, "1.2");

        let grand_window = store.open_item(&child_window, &nested.id).unwrap();
        let grand = store.create_item(&grand_window, None).unwrap();
        assert_eq!(grand.title, "1.1.1");
    }

    #[test]
    fn test_numbering_continues_after_highest() {
        let mut store = TreeStore::new();
        for title in ["Note 1", "Note 2", "Note 5"] {
            store.create_item(&root(), Some(title)).unwrap();
        }
        let next = store.create_item(&root(), None).unwrap();
        assert_eq!(next.title, "Note 6");
    }

    #[test]
    fn test_open_item_is_idempotent() {
        let mut store = TreeStore::new();
        let item = store.create_item(&root(), None).unwrap();
        let first = store.open_item(&root(), &item.id).unwrap();
        let second = store.open_item(&root(), &item.id).unwrap();
        assert_eq!(first, second);
        assert_eq!(store.window_count(), 2);
        assert_eq!(store.owner_of_window(&first), Some(&item.id));
        assert!(store.window(&first).unwrap().items.is_empty());
    }

    #[test]
    fn test_open_item_wrong_window() {
        let mut store = TreeStore::new();
        let item = store.create_item(&root(), None).unwrap();
        let child = store.open_item(&root(), &item.id).unwrap();
        assert!(store.open_item(&child, &item.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_rename_allows_duplicates() {
        let mut store = TreeStore::new();
        let a = store.create_item(&root(), None).unwrap();
        let b = store.create_item(&root(), None).unwrap();
        store.rename_item(&root(), &a.id, "Same").unwrap();
        store.rename_item(&root(), &b.id, "Same").unwrap();
        assert_eq!(store.item(&a.id).unwrap().title, "Same");
        assert_eq!(store.item(&b.id).unwrap().title, "Same");
    }

    #[test]
    fn test_rename_missing_item() {
        let mut store = TreeStore::new();
        let err = store
            .rename_item(&root(), &ItemId::from("ghost"), "x")
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_set_content_missing_is_noop() {
        let mut store = TreeStore::new();
        let item = store.create_item(&root(), None).unwrap();
        assert!(store.set_content(&item.id, "<p>hi</p>"));
        assert_eq!(store.item(&item.id).unwrap().content, "<p>hi</p>");
        assert!(!store.set_content(&ItemId::from("ghost"), "<p>lost</p>"));
    }

    #[test]
    fn test_delete_cascades_exactly_the_subtree() {
        let mut store = TreeStore::new();
        let a = store.create_item(&root(), Some("A")).unwrap();
        let sibling = store.create_item(&root(), Some("S")).unwrap();
        let sibling_window = store.open_item(&root(), &sibling.id).unwrap();
        let kept = store.create_item(&sibling_window, Some("K")).unwrap();

        let w1 = store.open_item(&root(), &a.id).unwrap();
        let b = store.create_item(&w1, Some("B")).unwrap();
        let w2 = store.open_item(&w1, &b.id).unwrap();
        let c = store.create_item(&w2, Some("C")).unwrap();

        let report = store.delete_item(&root(), &a.id).unwrap();

        assert_eq!(
            report.items,
            [a.id.clone(), b.id.clone(), c.id.clone()]
                .into_iter()
                .collect::<BTreeSet<_>>()
        );
        assert_eq!(
            report.windows,
            [w1.clone(), w2.clone()].into_iter().collect::<BTreeSet<_>>()
        );
        assert!(store.window(&w1).is_none());
        assert!(store.window(&w2).is_none());
        assert!(store.item(&c.id).is_none());
        assert!(store.item(&kept.id).is_some());
        assert!(store.window(&sibling_window).is_some());
        assert_eq!(store.root().items.len(), 1);
        assert!(store.is_consistent(), "{:?}", store.invariant_violations());
    }

    #[test]
    fn test_delete_leaf_removes_no_windows() {
        let mut store = TreeStore::new();
        let a = store.create_item(&root(), None).unwrap();
        let report = store.delete_item(&root(), &a.id).unwrap();
        assert!(report.windows.is_empty());
        assert_eq!(report.items.len(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_toggle_collapse() {
        let mut store = TreeStore::new();
        let a = store.create_item(&root(), None).unwrap();
        let child = store.open_item(&root(), &a.id).unwrap();

        assert!(store.toggle_collapse(&child).unwrap());
        assert!(store.window(&child).unwrap().collapsed);
        assert!(!store.toggle_collapse(&child).unwrap());

        assert!(!store.toggle_collapse(&root()).unwrap());
        assert!(!store.root().collapsed);
    }

    #[test]
    fn test_graft_inserts_parents_first() {
        let mut store = TreeStore::new();
        let items = vec![
            Item::new(ItemId::from("kid"), "kid"),
            Item::new(ItemId::from("mom"), "mom"),
            Item::new(ItemId::from("aunt"), "aunt"),
        ];
        store.graft(items, &[Some(1), None, None]).unwrap();

        let titles: Vec<&str> = store.root().items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["mom", "aunt"]);
        let child = WindowId::child_of(&ItemId::from("mom"));
        assert_eq!(store.owner_of_item(&ItemId::from("kid")), Some(&child));
        assert!(store.is_consistent());
    }

    #[test]
    fn test_window_path() {
        let mut store = TreeStore::new();
        let a = store.create_item(&root(), None).unwrap();
        let wa = store.open_item(&root(), &a.id).unwrap();
        let b = store.create_item(&wa, None).unwrap();
        let wb = store.open_item(&wa, &b.id).unwrap();

        assert_eq!(store.window_path(&wb), Some(vec![root(), wa, wb]));
        assert_eq!(store.window_path(&root()), Some(vec![root()]));
        assert_eq!(store.window_path(&WindowId::from("missing")), None);
    }

    #[test]
    fn test_break_cycles() {
        let mut parents = vec![Some(1), Some(0), None, Some(2), Some(4)];
        let cut = break_cycles(&mut parents);
        assert_eq!(cut, vec![0, 4]);
        assert_eq!(parents, vec![None, Some(0), None, Some(2), None]);
    }

    #[test]
    fn test_walk_is_preorder_with_depth() {
        let mut store = TreeStore::new();
        let a = store.create_item(&root(), Some("a")).unwrap();
        store.create_item(&root(), Some("b")).unwrap();
        let wa = store.open_item(&root(), &a.id).unwrap();
        let a1 = store.create_item(&wa, Some("a1")).unwrap();
        store.create_item(&wa, Some("a2")).unwrap();
        let wa1 = store.open_item(&wa, &a1.id).unwrap();
        store.create_item(&wa1, Some("a1x")).unwrap();

        let order: Vec<(usize, String)> = store
            .walk()
            .map(|(depth, _, item)| (depth, item.title.clone()))
            .collect();
        assert_eq!(
            order,
            vec![
                (0, "a".to_string()),
                (1, "a1".to_string()),
                (2, "a1x".to_string()),
                (1, "a2".to_string()),
                (0, "b".to_string()),
            ]
        );

        let subtree: Vec<String> = store
            .subtree_item_ids(&a.id)
            .iter()
            .map(|id| store.item(id).unwrap().title.clone())
            .collect();
        assert_eq!(subtree, vec!["a", "a1", "a2", "a1x"]);
    }
}
