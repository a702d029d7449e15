//! Per-window search and sort projection.
//!
//! `project` is a pure function of a window and its view state: it never
//! reorders or mutates the stored items, it only returns the display list.

use crate::tree::{Item, ItemId, TreeStore, Window, WindowId};
use feruca::Collator;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

pub use par_notes_config::SortMode;

/// Search query and sort order for one window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub query: String,
    pub sort: SortMode,
}

/// Filter `window` by `query` and order it by `sort`.
///
/// Matching is a case-insensitive substring test on the title; only an
/// empty query keeps everything. All orderings are stable.
pub fn project<'a>(window: &'a Window, query: &str, sort: SortMode) -> Vec<&'a Item> {
    let needle = query.to_lowercase();
    let mut items: Vec<&Item> = window
        .items
        .iter()
        .filter(|item| title_matches(&item.title, &needle))
        .collect();

    match sort {
        SortMode::Oldest => items.sort_by_key(|item| item.created_at),
        SortMode::Newest => items.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortMode::Alpha => {
            let mut collator = TitleCollator::new();
            items.sort_by(|a, b| collator.compare(&a.title, &b.title));
        }
        SortMode::AlphaDesc => {
            let mut collator = TitleCollator::new();
            items.sort_by(|a, b| collator.compare(&b.title, &a.title));
        }
    }
    items
}

/// `needle` must already be lowercased
fn title_matches(title: &str, needle: &str) -> bool {
    needle.is_empty() || title.to_lowercase().contains(needle)
}

/// Items whose title matches `query`, plus every item above them.
///
/// Lets a hierarchical listing keep the path down to a nested match even
/// when the ancestors' own titles do not match.
pub fn matching_branches(store: &TreeStore, query: &str) -> HashSet<ItemId> {
    let needle = query.to_lowercase();
    let mut keep = HashSet::new();
    for (_, window, item) in store.walk() {
        if !title_matches(&item.title, &needle) || keep.contains(&item.id) {
            continue;
        }
        keep.insert(item.id.clone());
        let mut owner = store.owner_of_window(&window.id);
        while let Some(parent) = owner {
            if !keep.insert(parent.clone()) {
                break;
            }
            owner = store
                .owner_of_item(parent)
                .and_then(|w| store.owner_of_window(w));
        }
    }
    keep
}

/// Compare titles with [`TitleCollator`]; builds a collator per call.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    TitleCollator::new().compare(a, b)
}

/// Locale-aware title ordering with embedded numbers ordered by value.
///
/// Text runs go through the Unicode Collation Algorithm (CLDR root order)
/// case-insensitively, so "éclair" sorts between "apple" and "fig". Digit
/// runs compare numerically ("2" < "10"). Exact code points only break ties.
pub struct TitleCollator {
    collator: Collator,
}

impl Default for TitleCollator {
    fn default() -> Self {
        Self::new()
    }
}

impl TitleCollator {
    pub fn new() -> Self {
        Self {
            collator: Collator::default(),
        }
    }

    pub fn compare(&mut self, a: &str, b: &str) -> Ordering {
        let mut left = Chunks::new(a);
        let mut right = Chunks::new(b);

        loop {
            match (left.next(), right.next()) {
                (None, None) => break,
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some(x), Some(y)) => {
                    let ord = match (x, y) {
                        (Chunk::Number(x), Chunk::Number(y)) => compare_digits(x, y),
                        (Chunk::Number(_), Chunk::Text(_)) => Ordering::Less,
                        (Chunk::Text(_), Chunk::Number(_)) => Ordering::Greater,
                        (Chunk::Text(x), Chunk::Text(y)) => self
                            .collator
                            .collate(x.to_lowercase().as_str(), y.to_lowercase().as_str()),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
            }
        }

        a.cmp(b)
    }
}

/// Compare two ASCII digit runs by numeric value without overflow
fn compare_digits(a: &str, b: &str) -> Ordering {
    let a_trim = a.trim_start_matches('0');
    let b_trim = b.trim_start_matches('0');
    a_trim
        .len()
        .cmp(&b_trim.len())
        .then_with(|| a_trim.cmp(b_trim))
        .then_with(|| a.len().cmp(&b.len()))
}

enum Chunk<'a> {
    Number(&'a str),
    Text(&'a str),
}

/// Splits a string into alternating digit and non-digit runs
struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Chunks<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rest.chars().next()?;
        let numeric = first.is_ascii_digit();
        let end = self
            .rest
            .find(|c: char| c.is_ascii_digit() != numeric)
            .unwrap_or(self.rest.len());
        let (head, tail) = self.rest.split_at(end);
        self.rest = tail;
        Some(if numeric {
            Chunk::Number(head)
        } else {
            Chunk::Text(head)
        })
    }
}

/// View state for every window, falling back to a default sort.
#[derive(Debug, Clone, Default)]
pub struct ViewStates {
    states: HashMap<WindowId, ViewState>,
    default_sort: SortMode,
}

impl ViewStates {
    pub fn new(default_sort: SortMode) -> Self {
        Self {
            states: HashMap::new(),
            default_sort,
        }
    }

    /// Current state for `window`, defaulted if never set
    pub fn get(&self, window: &WindowId) -> ViewState {
        self.states.get(window).cloned().unwrap_or(ViewState {
            query: String::new(),
            sort: self.default_sort,
        })
    }

    pub fn set_query(&mut self, window: &WindowId, query: impl Into<String>) {
        let default_sort = self.default_sort;
        self.states
            .entry(window.clone())
            .or_insert_with(|| ViewState {
                query: String::new(),
                sort: default_sort,
            })
            .query = query.into();
    }

    pub fn set_sort(&mut self, window: &WindowId, sort: SortMode) {
        self.states
            .entry(window.clone())
            .or_insert_with(ViewState::default)
            .sort = sort;
    }

    /// Forget state for windows that no longer exist
    pub fn retain_existing(&mut self, store: &TreeStore) {
        self.states.retain(|id, _| store.contains_window(id));
    }

    /// Display list for `window` under its current view state
    pub fn project<'a>(&self, store: &'a TreeStore, window: &WindowId) -> Vec<&'a Item> {
        let Some(target) = store.window(window) else {
            return Vec::new();
        };
        let state = self.get(window);
        project(target, &state.query, state.sort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ItemId;

    fn item(title: &str, created_at: i64) -> Item {
        Item {
            id: ItemId::from(format!("id-{title}-{created_at}")),
            title: title.to_string(),
            content: String::new(),
            created_at,
            child_window_id: None,
        }
    }

    fn window(items: Vec<Item>) -> Window {
        Window {
            id: WindowId::root(),
            items,
            collapsed: false,
        }
    }

    fn titles(items: &[&Item]) -> Vec<String> {
        items.iter().map(|i| i.title.clone()).collect()
    }

    #[test]
    fn test_sort_modes() {
        let w = window(vec![item("b", 3), item("a", 1), item("c", 2)]);
        assert_eq!(titles(&project(&w, "", SortMode::Oldest)), ["a", "c", "b"]);
        assert_eq!(titles(&project(&w, "", SortMode::Newest)), ["b", "c", "a"]);
        assert_eq!(titles(&project(&w, "", SortMode::Alpha)), ["a", "b", "c"]);
        assert_eq!(titles(&project(&w, "", SortMode::AlphaDesc)), ["c", "b", "a"]);
    }

    #[test]
    fn test_sort_is_stable_on_equal_keys() {
        let w = window(vec![item("x", 5), item("y", 5), item("z", 5)]);
        let newest: Vec<String> = project(&w, "", SortMode::Newest)
            .iter()
            .map(|i| i.id.to_string())
            .collect();
        assert_eq!(newest, ["id-x-5", "id-y-5", "id-z-5"]);

        let same = window(vec![item("dup", 2), item("dup", 1)]);
        let alpha: Vec<i64> = project(&same, "", SortMode::Alpha)
            .iter()
            .map(|i| i.created_at)
            .collect();
        assert_eq!(alpha, [2, 1]);
    }

    #[test]
    fn test_alpha_is_numeric_aware() {
        let w = window(vec![item("Note 10", 1), item("Note 2", 2), item("note 1", 3)]);
        assert_eq!(
            titles(&project(&w, "", SortMode::Alpha)),
            ["note 1", "Note 2", "Note 10"]
        );

        let dotted = window(vec![item("1.10", 1), item("1.9", 2), item("1.1", 3)]);
        assert_eq!(
            titles(&project(&dotted, "", SortMode::Alpha)),
            ["1.1", "1.9", "1.10"]
        );
    }

    #[test]
    fn test_filter_case_insensitive_and_keeps_order() {
        let w = window(vec![item("Groceries", 1), item("grocery list", 2), item("Work", 3)]);
        assert_eq!(
            titles(&project(&w, "GROCER", SortMode::Newest)),
            ["grocery list", "Groceries"]
        );
        assert_eq!(project(&w, "", SortMode::Oldest).len(), 3);
        // Projection never touches stored order.
        assert_eq!(w.items[0].title, "Groceries");
    }

    #[test]
    fn test_whitespace_query_is_matched_literally() {
        let w = window(vec![item("Note 1", 1), item("Ideas", 2)]);
        assert_eq!(titles(&project(&w, " ", SortMode::Oldest)), ["Note 1"]);
        assert!(project(&w, " ideas", SortMode::Oldest).is_empty());
        assert_eq!(project(&w, "", SortMode::Oldest).len(), 2);
    }

    #[test]
    fn test_alpha_orders_accented_titles_by_base_letter() {
        let w = window(vec![item("fig", 1), item("éclair", 2), item("apple", 3)]);
        assert_eq!(
            titles(&project(&w, "", SortMode::Alpha)),
            ["apple", "éclair", "fig"]
        );
        assert_eq!(
            titles(&project(&w, "", SortMode::AlphaDesc)),
            ["fig", "éclair", "apple"]
        );

        let mixed = window(vec![item("Zebra", 1), item("Ärger 2", 2), item("ärger 10", 3)]);
        assert_eq!(
            titles(&project(&mixed, "", SortMode::Alpha)),
            ["Ärger 2", "ärger 10", "Zebra"]
        );
    }

    #[test]
    fn test_matching_branches_keeps_ancestors() {
        let mut store = TreeStore::new();
        let root = WindowId::root();
        let top = store.create_item(&root, Some("Projects")).unwrap();
        let other = store.create_item(&root, Some("Misc")).unwrap();
        let wt = store.open_item(&root, &top.id).unwrap();
        let mid = store.create_item(&wt, Some("Backend")).unwrap();
        let wm = store.open_item(&wt, &mid.id).unwrap();
        let leaf = store.create_item(&wm, Some("Grocery API")).unwrap();
        let sibling = store.create_item(&wm, Some("Billing")).unwrap();

        let keep = matching_branches(&store, "grocery");
        assert!(keep.contains(&leaf.id));
        assert!(keep.contains(&mid.id));
        assert!(keep.contains(&top.id));
        assert!(!keep.contains(&sibling.id));
        assert!(!keep.contains(&other.id));
        assert_eq!(keep.len(), 3);

        assert_eq!(matching_branches(&store, "").len(), store.item_count());
    }

    #[test]
    fn test_natural_cmp_edge_cases() {
        assert_eq!(natural_cmp("a2", "a10"), Ordering::Less);
        assert_eq!(natural_cmp("a02", "a2"), Ordering::Greater);
        assert_eq!(natural_cmp("", "a"), Ordering::Less);
        assert_eq!(natural_cmp("abc", "ABC"), "abc".cmp("ABC"));
        assert_eq!(
            natural_cmp("99999999999999999999999", "100000000000000000000000"),
            Ordering::Less
        );
    }

    #[test]
    fn test_view_states_default_and_override() {
        let mut store = TreeStore::new();
        let root = WindowId::root();
        store.create_item(&root, Some("beta")).unwrap();
        store.create_item(&root, Some("alpha")).unwrap();

        let mut views = ViewStates::new(SortMode::Oldest);
        assert_eq!(titles(&views.project(&store, &root)), ["beta", "alpha"]);

        views.set_sort(&root, SortMode::Alpha);
        assert_eq!(titles(&views.project(&store, &root)), ["alpha", "beta"]);

        views.set_query(&root, "bet");
        assert_eq!(titles(&views.project(&store, &root)), ["beta"]);
        assert_eq!(views.get(&root).sort, SortMode::Alpha);
    }
}
