//! Export selection.
//!
//! Selecting an item selects its whole subtree; deselecting it clears the
//! subtree again.

use crate::tree::{ItemId, TreeStore};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: HashSet<ItemId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip `id` and apply the new state to every descendant.
    ///
    /// Returns whether `id` is selected afterwards; unknown ids are ignored.
    pub fn toggle(&mut self, store: &TreeStore, id: &ItemId) -> bool {
        let subtree = store.subtree_item_ids(id);
        if subtree.is_empty() {
            return false;
        }
        let select = !self.ids.contains(id);
        for member in subtree {
            if select {
                self.ids.insert(member);
            } else {
                self.ids.remove(&member);
            }
        }
        select
    }

    /// Select `id` and its subtree regardless of current state
    pub fn select_subtree(&mut self, store: &TreeStore, id: &ItemId) {
        self.ids.extend(store.subtree_item_ids(id));
    }

    pub fn select_all(&mut self, store: &TreeStore) {
        self.ids
            .extend(store.walk().map(|(_, _, item)| item.id.clone()));
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Drop ids that are no longer in the store
    pub fn retain_existing(&mut self, store: &TreeStore) {
        self.ids.retain(|id| store.item(id).is_some());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::WindowId;

    fn sample() -> (TreeStore, ItemId, ItemId, ItemId, ItemId) {
        let mut store = TreeStore::new();
        let root = WindowId::root();
        let a = store.create_item(&root, None).unwrap();
        let other = store.create_item(&root, None).unwrap();
        let wa = store.open_item(&root, &a.id).unwrap();
        let b = store.create_item(&wa, None).unwrap();
        let wb = store.open_item(&wa, &b.id).unwrap();
        let c = store.create_item(&wb, None).unwrap();
        (store, a.id, b.id, c.id, other.id)
    }

    #[test]
    fn test_toggle_selects_descendants() {
        let (store, a, b, c, other) = sample();
        let mut selection = Selection::new();

        assert!(selection.toggle(&store, &a));
        assert!(selection.contains(&a));
        assert!(selection.contains(&b));
        assert!(selection.contains(&c));
        assert!(!selection.contains(&other));
    }

    #[test]
    fn test_toggle_twice_deselects_subtree_only() {
        let (store, a, b, c, other) = sample();
        let mut selection = Selection::new();
        selection.toggle(&store, &other);
        selection.toggle(&store, &a);

        assert!(!selection.toggle(&store, &b));
        assert!(selection.contains(&a));
        assert!(!selection.contains(&b));
        assert!(!selection.contains(&c));
        assert!(selection.contains(&other));
    }

    #[test]
    fn test_select_all_and_clear() {
        let (store, ..) = sample();
        let mut selection = Selection::new();
        selection.select_all(&store);
        assert_eq!(selection.len(), 4);
        selection.clear();
        assert!(selection.is_empty());
    }

    #[test]
    fn test_toggle_unknown_id_is_ignored() {
        let (store, ..) = sample();
        let mut selection = Selection::new();
        assert!(!selection.toggle(&store, &ItemId::from("ghost")));
        assert!(selection.is_empty());
    }
}
