//! Shared integration test helpers for par-notes.
//!
//! Include this module at the top of each test file that needs it:
//!
//! ```ignore
//! mod common;
//! use common::{sample_tree, titles_in};
//! ```
//!
//! The `#[allow(dead_code)]` attribute suppresses warnings when only a
//! subset of helpers is used per file.

#![allow(dead_code)]

use par_notes::tree::{Item, ItemId, TreeStore, WindowId};
use par_notes_config::Config;
use std::collections::BTreeMap;

/// Config with a short debounce so sync tests finish quickly
pub fn fast_sync_config() -> Config {
    Config {
        sync_debounce_ms: 40,
        ..Config::default()
    }
}

/// Handles into the tree built by [`sample_tree`]
pub struct Sample {
    pub store: TreeStore,
    pub a: ItemId,
    pub b: ItemId,
    pub c: ItemId,
    pub sibling: ItemId,
    pub w1: WindowId,
    pub w2: WindowId,
}

/// Root item A -> window W1 { B -> window W2 { C } }, plus a sibling S
/// with an opened child window holding K.
pub fn sample_tree() -> Sample {
    let mut store = TreeStore::new();
    let root = WindowId::root();

    let a = store.create_item(&root, Some("A")).expect("create A");
    let sibling = store.create_item(&root, Some("S")).expect("create S");
    let ws = store.open_item(&root, &sibling.id).expect("open S");
    store.create_item(&ws, Some("K")).expect("create K");

    let w1 = store.open_item(&root, &a.id).expect("open A");
    let b = store.create_item(&w1, Some("B")).expect("create B");
    let w2 = store.open_item(&w1, &b.id).expect("open B");
    let c = store.create_item(&w2, Some("C")).expect("create C");

    Sample {
        store,
        a: a.id,
        b: b.id,
        c: c.id,
        sibling: sibling.id,
        w1,
        w2,
    }
}

/// Titles of the items in `window`, in stored order
pub fn titles_in(store: &TreeStore, window: &WindowId) -> Vec<String> {
    store
        .window(window)
        .map(|w| w.items.iter().map(|item| item.title.clone()).collect())
        .unwrap_or_default()
}

/// Find the first item titled `title` in document order
pub fn find_by_title<'a>(store: &'a TreeStore, title: &str) -> Option<&'a Item> {
    store
        .walk()
        .map(|(_, _, item)| item)
        .find(|item| item.title == title)
}

/// Id-independent shape of a tree: `(depth, title, content, parent title)`
/// in document order. Two trees with equal shapes are isomorphic under a
/// relabelling of ids.
pub fn shape(store: &TreeStore) -> Vec<(usize, String, String, Option<String>)> {
    store
        .walk()
        .map(|(depth, window, item)| {
            let parent = store
                .owner_of_window(&window.id)
                .and_then(|owner| store.item(owner))
                .map(|owner| owner.title.clone());
            (depth, item.title.clone(), item.content.clone(), parent)
        })
        .collect()
}

/// How many items reference each child window; every value must be 1
pub fn window_reference_counts(store: &TreeStore) -> BTreeMap<WindowId, usize> {
    let mut counts = BTreeMap::new();
    for (_, _, item) in store.walk() {
        if let Some(child) = &item.child_window_id {
            *counts.entry(child.clone()).or_insert(0) += 1;
        }
    }
    counts
}
