//! In-memory filter, sort, and pagination over a batch of list items, plus
//! the server-side query parameters used to fetch that batch.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::Serialize;

use crate::content::{ContentListItem, ContentStatus};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Upper bound on a requested page size.
pub const MAX_PAGE_SIZE: usize = 100;

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Status criterion of a list filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ContentStatus),
}

impl StatusFilter {
    fn matches(&self, status: ContentStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = crate::error::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            Ok(StatusFilter::All)
        } else {
            s.parse().map(StatusFilter::Only)
        }
    }
}

/// Conjunctive list filter. `None` category means all categories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub status: StatusFilter,
    pub category: Option<String>,
    pub search: String,
}

impl ListFilter {
    /// Whether `item` passes the status, category, and title search criteria.
    pub fn matches(&self, item: &ContentListItem) -> bool {
        self.status.matches(item.status)
            && self
                .category
                .as_deref()
                .is_none_or(|category| item.category == category)
            && item
                .title
                .to_lowercase()
                .contains(&self.search.to_lowercase())
    }
}

// ---------------------------------------------------------------------------
// Sort
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Date,
    Views,
    Title,
}

impl std::str::FromStr for SortKey {
    type Err = crate::error::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(SortKey::Date),
            "views" => Ok(SortKey::Views),
            "title" => Ok(SortKey::Title),
            other => Err(crate::error::CoreError::Validation(format!(
                "Invalid sort key '{other}'. Must be one of: date, views, title"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Current sort column and direction. Defaults to newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            key: SortKey::Date,
            direction: SortDirection::Desc,
        }
    }
}

impl SortState {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Select a sort column. The same column flips direction; a new column
    /// starts descending.
    pub fn select(&mut self, key: SortKey) {
        if self.key == key {
            self.direction = self.direction.flipped();
        } else {
            self.key = key;
            self.direction = SortDirection::Desc;
        }
    }
}

/// Compare titles case-insensitively, with the exact text as tie-break so
/// the order is total.
///
/// Lowercased text is compared by code point. There is no locale collation,
/// so accented letters sort after `z`.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn ascending(key: SortKey, a: &ContentListItem, b: &ContentListItem) -> Ordering {
    match key {
        SortKey::Date => a.updated_at.cmp(&b.updated_at),
        SortKey::Views => a.view_count().cmp(&b.view_count()),
        SortKey::Title => compare_titles(&a.title, &b.title),
    }
}

/// Filter and sort a batch of list items.
///
/// Sorting is stable in ascending order; descending order is the exact
/// reverse of the ascending result.
pub fn apply(
    items: &[ContentListItem],
    filter: &ListFilter,
    sort: SortState,
) -> Vec<ContentListItem> {
    let mut result: Vec<ContentListItem> = items
        .iter()
        .filter(|item| filter.matches(item))
        .cloned()
        .collect();

    result.sort_by(|a, b| ascending(sort.key, a, b));
    if sort.direction == SortDirection::Desc {
        result.reverse();
    }
    result
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// One page of an already filtered and sorted sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSlice<T> {
    pub items: Vec<T>,
    /// The 1-based page actually shown, after clamping.
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub has_previous: bool,
    pub has_next: bool,
}

/// Slice `items` into the requested 1-based page.
///
/// Out-of-range pages clamp to the nearest valid page. An empty sequence
/// has a single empty page.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> PageSlice<T> {
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
    let total_pages = items.len().div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * page_size;
    let end = (start + page_size).min(items.len());

    PageSlice {
        items: items[start..end].to_vec(),
        page,
        total_pages,
        total_items: items.len(),
        has_previous: page > 1,
        has_next: page < total_pages,
    }
}

// ---------------------------------------------------------------------------
// Server-side query
// ---------------------------------------------------------------------------

/// Parameters for fetching a page of content from the content service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub status: StatusFilter,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl Default for ContentQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE as u32,
            search: None,
            status: StatusFilter::All,
            category: None,
            tag: None,
            from: None,
            to: None,
        }
    }
}

impl ContentQuery {
    /// Render as query pairs. `all` status and empty values are omitted.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.max(1).to_string()),
            ("limit", self.limit.clamp(1, MAX_PAGE_SIZE as u32).to_string()),
        ];

        let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.trim().is_empty());

        if let Some(search) = non_empty(&self.search) {
            pairs.push(("search", search));
        }
        if let StatusFilter::Only(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(category) = non_empty(&self.category) {
            pairs.push(("category", category));
        }
        if let Some(tag) = non_empty(&self.tag) {
            pairs.push(("tag", tag));
        }
        if let Some(from) = self.from {
            pairs.push(("from", from.to_string()));
        }
        if let Some(to) = self.to {
            pairs.push(("to", to.to_string()));
        }
        pairs
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
