//! Aggregate statistics over a batch of list items.

use serde::Serialize;

use crate::content::{ContentListItem, ContentStatus};

/// Counts shown on the dashboard and above the content list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContentStats {
    pub total: usize,
    pub published: usize,
    pub drafts: usize,
    pub archived: usize,
    pub total_views: u64,
}

impl ContentStats {
    pub fn from_items(items: &[ContentListItem]) -> Self {
        items.iter().fold(Self::default(), |mut stats, item| {
            stats.total += 1;
            match item.status {
                ContentStatus::Published => stats.published += 1,
                ContentStatus::Draft => stats.drafts += 1,
                ContentStatus::Archived => stats.archived += 1,
            }
            stats.total_views += item.view_count();
            stats
        })
    }
}

/// Distinct non-empty categories in first-seen order.
pub fn categories_of(items: &[ContentListItem]) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for item in items {
        if !item.category.is_empty() && !categories.contains(&item.category) {
            categories.push(item.category.clone());
        }
    }
    categories
}
