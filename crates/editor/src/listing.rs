//! List view over the content collection.
//!
//! [`ContentListView`] fetches every content item from the repository,
//! then filters, sorts and paginates in memory. A refresh replaces the batch
//! wholesale.

use std::sync::Arc;

use futures::future;
use h2space_core::content::{ContentListItem, ContentStatus};
use h2space_core::dashboard::{categories_of, ContentStats};
use h2space_core::error::CoreResult;
use h2space_core::listing::{
    self, ContentQuery, ListFilter, PageSlice, SortKey, SortState, StatusFilter, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};
use h2space_core::repository::ContentRepository;

pub struct ContentListView {
    repo: Arc<dyn ContentRepository>,
    page_size: usize,
    filter: ListFilter,
    sort: SortState,
    page: usize,
    /// Server-side narrowing applied on every refresh.
    base_query: ContentQuery,
    items: Vec<ContentListItem>,
}

impl ContentListView {
    pub fn new(repo: Arc<dyn ContentRepository>) -> Self {
        Self {
            repo,
            page_size: DEFAULT_PAGE_SIZE,
            filter: ListFilter::default(),
            sort: SortState::default(),
            page: 1,
            base_query: ContentQuery::default(),
            items: Vec::new(),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Narrow what the service returns (tag, date range, ...). Paging fields
    /// are ignored.
    pub fn with_query(mut self, query: ContentQuery) -> Self {
        self.base_query = query;
        self
    }

    /// Fetch the whole collection, replacing the current batch.
    ///
    /// The first page reports how many pages exist; the rest are fetched
    /// concurrently.
    pub async fn refresh(&mut self) -> CoreResult<()> {
        let base = self.base_query.clone();
        let query = |page: u32| ContentQuery {
            page,
            limit: MAX_PAGE_SIZE as u32,
            ..base.clone()
        };

        let first = self.repo.get_contents(&query(1)).await?;
        let mut items = first.items;

        if first.total_pages > 1 {
            let repo = &self.repo;
            let rest = future::try_join_all((2..=first.total_pages).map(|page| {
                let query = query(page);
                async move { repo.get_contents(&query).await }
            }))
            .await?;
            items.extend(rest.into_iter().flat_map(|page| page.items));
        }

        tracing::debug!(count = items.len(), "Content list refreshed");
        self.items = items;
        self.page = self.visible_page_for(self.page);
        Ok(())
    }

    pub fn items(&self) -> &[ContentListItem] {
        &self.items
    }

    pub fn filter(&self) -> &ListFilter {
        &self.filter
    }

    pub fn sort(&self) -> SortState {
        self.sort
    }

    // ---- filter and sort controls; each returns to the first page ----

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.filter.search = search.into();
        self.page = 1;
    }

    pub fn set_status(&mut self, status: StatusFilter) {
        self.filter.status = status;
        self.page = 1;
    }

    /// `None` shows all categories.
    pub fn set_category(&mut self, category: Option<String>) {
        self.filter.category = category.filter(|c| !c.is_empty());
        self.page = 1;
    }

    /// Select a sort key. The same key twice flips direction; a new key
    /// starts descending.
    pub fn sort_by(&mut self, key: SortKey) {
        self.sort.select(key);
    }

    pub fn set_sort(&mut self, sort: SortState) {
        self.sort = sort;
    }

    // ---- pagination ----

    /// The visible page after filtering and sorting.
    pub fn visible(&self) -> PageSlice<ContentListItem> {
        let filtered = listing::apply(&self.items, &self.filter, self.sort);
        listing::paginate(&filtered, self.page, self.page_size)
    }

    /// Jump to a 1-based page, clamped to the pages that exist.
    pub fn go_to(&mut self, page: usize) {
        self.page = self.visible_page_for(page);
    }

    /// Returns false when already on the last page.
    pub fn next_page(&mut self) -> bool {
        let visible = self.visible();
        if !visible.has_next {
            return false;
        }
        self.page = visible.page + 1;
        true
    }

    /// Returns false when already on the first page.
    pub fn previous_page(&mut self) -> bool {
        let visible = self.visible();
        if !visible.has_previous {
            return false;
        }
        self.page = visible.page - 1;
        true
    }

    fn visible_page_for(&self, page: usize) -> usize {
        let filtered = listing::apply(&self.items, &self.filter, self.sort);
        listing::paginate(&filtered, page, self.page_size).page
    }

    // ---- derived views ----

    /// Categories present in the batch, for the category filter.
    pub fn categories(&self) -> Vec<String> {
        categories_of(&self.items)
    }

    pub fn stats(&self) -> ContentStats {
        ContentStats::from_items(&self.items)
    }

    /// Drop an item from the batch after it was deleted elsewhere.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        let removed = self.items.len() != before;
        if removed {
            self.page = self.visible_page_for(self.page);
        }
        removed
    }

    /// Reflect a status change without refetching.
    pub fn update_status(&mut self, id: &str, status: ContentStatus) -> bool {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.status = status;
                self.page = self.visible_page_for(self.page);
                true
            }
            None => false,
        }
    }
}
