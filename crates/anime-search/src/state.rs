//! Search state snapshot.

use shared::{AnimeSummary, FilterSet};

use crate::params::SearchRequest;

/// Everything the presentation layer needs to render the search page.
///
/// Owned by [`crate::session::SearchSession`]; consumers get clones.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    pub query: String,
    pub page: u32,
    pub filters: FilterSet,
    pub results: Vec<AnimeSummary>,
    pub page_count: u32,
    pub loading: bool,
    /// Current banner slot; `None` while there is nothing to rotate
    pub banner_index: Option<usize>,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            query: String::new(),
            page: 1,
            filters: FilterSet::default(),
            results: Vec::new(),
            page_count: 1,
            loading: false,
            banner_index: None,
        }
    }
}

impl SearchState {
    /// Parameters to fetch for this state
    pub fn request(&self) -> SearchRequest {
        SearchRequest::new(self.query.clone(), self.page, self.filters.clone())
    }

    pub fn has_next_page(&self) -> bool {
        self.page < self.page_count
    }

    pub fn has_previous_page(&self) -> bool {
        self.page > 1
    }
}
