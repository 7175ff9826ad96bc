//! Tag selection rules.
//!
//! Tags keep insertion order for display but compare as a set when checking
//! whether a draft changed.

use std::collections::HashSet;

/// Default maximum number of tags on one content item.
pub const DEFAULT_MAX_TAGS: usize = 10;

/// Maximum number of suggestions offered for a partial tag.
pub const MAX_SUGGESTIONS: usize = 10;

/// Outcome of adding a tag to a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagInsert {
    Added,
    /// The input was empty after trimming.
    Empty,
    Duplicate,
    LimitReached,
}

/// Add `tag` to `selected`, trimming it first.
///
/// Empty input, duplicates, and additions beyond `max_tags` leave the
/// selection unchanged.
pub fn add_tag(selected: &mut Vec<String>, tag: &str, max_tags: usize) -> TagInsert {
    let tag = tag.trim();
    if tag.is_empty() {
        return TagInsert::Empty;
    }
    if selected.len() >= max_tags {
        return TagInsert::LimitReached;
    }
    if selected.iter().any(|t| t == tag) {
        return TagInsert::Duplicate;
    }
    selected.push(tag.to_string());
    TagInsert::Added
}

/// Remove `tag` from `selected`. Returns whether anything was removed.
pub fn remove_tag(selected: &mut Vec<String>, tag: &str) -> bool {
    let before = selected.len();
    selected.retain(|t| t != tag);
    selected.len() != before
}

/// Remove and return the most recently added tag.
pub fn pop_last_tag(selected: &mut Vec<String>) -> Option<String> {
    selected.pop()
}

/// Suggest available tags containing `input` (case-insensitive) that are not
/// already selected.
pub fn suggest_tags(available: &[String], selected: &[String], input: &str) -> Vec<String> {
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    available
        .iter()
        .filter(|tag| tag.to_lowercase().contains(&needle) && !selected.contains(tag))
        .take(MAX_SUGGESTIONS)
        .cloned()
        .collect()
}

/// Order-insensitive comparison of two tag lists.
pub fn same_tags(a: &[String], b: &[String]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let left: HashSet<&str> = a.iter().map(String::as_str).collect();
    let right: HashSet<&str> = b.iter().map(String::as_str).collect();
    left == right
}
