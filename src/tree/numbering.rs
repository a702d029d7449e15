//! Default titles for new items.
//!
//! Titles carry a dotted, hierarchical number (`Note 1`, `1.1`, `1.2`,
//! `1.1.1`). The number is display sugar only; identity is always the id.

/// Trailing number of a title: last dot-separated segment, with `prefix`
/// stripped, parsed as an integer.
pub fn trailing_number(title: &str, prefix: &str) -> Option<u64> {
    let last = title.rsplit('.').next().unwrap_or(title);
    let segment = last.strip_prefix(prefix).unwrap_or(last).trim();
    segment.parse::<u64>().ok()
}

/// One past the largest trailing number among `titles`, or 1 when none parse.
pub fn next_number<'a>(titles: impl IntoIterator<Item = &'a str>, prefix: &str) -> u64 {
    titles
        .into_iter()
        .filter_map(|title| trailing_number(title, prefix))
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

/// Title for the next item in a window.
///
/// `owner_title` is the title of the item owning the window, `None` for the
/// root window. Root titles keep the prefix (`Note 3`); nested titles extend
/// the owner's label with the prefix stripped (`3.1`).
pub fn default_title<'a>(
    owner_title: Option<&str>,
    sibling_titles: impl IntoIterator<Item = &'a str>,
    prefix: &str,
) -> String {
    let next = next_number(sibling_titles, prefix);
    match owner_title {
        None => format!("{prefix}{next}"),
        Some(owner) => {
            let label = owner.strip_prefix(prefix).unwrap_or(owner);
            format!("{label}.{next}")
        }
    }
}
