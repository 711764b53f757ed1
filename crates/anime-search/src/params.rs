//! Request parameter building.
//!
//! Text search and filtered browsing are mutually exclusive request shapes:
//! a non-empty query goes to `anime` with only `q` and `page`, an empty one
//! goes to `top/anime` with whichever facets are set.

use crate::api::{Endpoint, RequestDescriptor};
use shared::FilterSet;

/// User-facing search parameters at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub page: u32,
    pub filters: FilterSet,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, page: u32, filters: FilterSet) -> Self {
        Self {
            query: query.into(),
            page,
            filters,
        }
    }

    pub fn descriptor(&self) -> RequestDescriptor {
        build_search_request(&self.query, self.page, &self.filters)
    }
}

/// Build the descriptor for a search or browse request
pub fn build_search_request(query: &str, page: u32, filters: &FilterSet) -> RequestDescriptor {
    let page = page.max(1);
    let query = query.trim();

    if !query.is_empty() {
        return RequestDescriptor::new(Endpoint::Search)
            .with_param("q", query)
            .with_param("page", page);
    }

    let mut request = RequestDescriptor::new(Endpoint::TopList);
    if let Some(media_type) = filters.media_type {
        request = request.with_param("type", media_type.as_str());
    }
    if let Some(top_filter) = filters.top_filter {
        request = request.with_param("filter", top_filter.as_str());
    }
    if let Some(rating) = filters.rating {
        request = request.with_param("rating", rating.as_str());
    }
    if filters.sfw_only {
        request = request.with_param("sfw", "true");
    }
    request.with_param("page", page)
}

pub fn recommendations_request() -> RequestDescriptor {
    RequestDescriptor::new(Endpoint::Recommendations)
}

pub fn detail_request(mal_id: u32) -> RequestDescriptor {
    RequestDescriptor::new(Endpoint::DetailById(mal_id))
}
