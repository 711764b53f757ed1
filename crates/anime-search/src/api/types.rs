//! Jikan API v4 request and response types.
//!
//! Requests are described by a [`RequestDescriptor`] so that building them
//! stays pure and testable; responses are read leniently from JSON because
//! the API occasionally omits `pagination` or sends partial items.

use serde_json::Value;
use shared::{AnimeDetails, AnimeSummary, RecommendationEntry};
use tracing::debug;

use crate::error::FetchError;

/// Catalog endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Free-text search, `anime`
    Search,
    /// Filtered browse, `top/anime`
    TopList,
    /// Recommendation feed, `recommendations/anime`
    Recommendations,
    /// Single record, `anime/{id}/full`
    DetailById(u32),
}

impl Endpoint {
    /// Path relative to the API base URL
    pub fn path(&self) -> String {
        match self {
            Endpoint::Search => "anime".to_string(),
            Endpoint::TopList => "top/anime".to_string(),
            Endpoint::Recommendations => "recommendations/anime".to_string(),
            Endpoint::DetailById(id) => format!("anime/{}/full", id),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Search => "search",
            Endpoint::TopList => "top_list",
            Endpoint::Recommendations => "recommendations",
            Endpoint::DetailById(_) => "detail",
        }
    }
}

/// Normalized GET request: endpoint plus ordered query parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub endpoint: Endpoint,
    pub params: Vec<(String, String)>,
}

impl RequestDescriptor {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: impl ToString) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    /// Look up a parameter value by key
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Path plus encoded query string, for logging
    pub fn to_path_and_query(&self) -> String {
        if self.params.is_empty() {
            return self.endpoint.path();
        }
        let query = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v.replace(' ', "+")))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.endpoint.path(), query)
    }
}

/// One page of search or top-list results
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogPage {
    pub data: Vec<AnimeSummary>,
    /// `pagination.last_visible_page`, 1 when missing or malformed
    pub last_visible_page: u32,
}

impl CatalogPage {
    /// Read a `{ data: [...], pagination: { last_visible_page } }` envelope.
    ///
    /// Missing `data` reads as an empty list. Items without an integer
    /// `mal_id` are skipped.
    pub fn from_value(body: &Value) -> Self {
        let data = parse_items::<AnimeSummary>(body.get("data"));

        let last_visible_page = body
            .get("pagination")
            .and_then(|p| p.get("last_visible_page"))
            .and_then(Value::as_u64)
            .filter(|&n| n >= 1)
            .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
            .unwrap_or(1);

        Self {
            data,
            last_visible_page,
        }
    }
}

/// Read the `recommendations/anime` feed
pub fn parse_recommendations(body: &Value) -> Vec<RecommendationEntry> {
    parse_items::<RecommendationEntry>(body.get("data"))
}

/// Read the `anime/{id}/full` record
pub fn parse_details(body: &Value) -> Result<AnimeDetails, FetchError> {
    let data = body
        .get("data")
        .ok_or_else(|| FetchError::Decode("response has no data field".to_string()))?;

    serde_json::from_value(data.clone()).map_err(|e| FetchError::Decode(e.to_string()))
}

fn parse_items<T: serde::de::DeserializeOwned>(data: Option<&Value>) -> Vec<T> {
    let Some(Value::Array(items)) = data else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match serde_json::from_value::<T>(item.clone()) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!(error = %e, "Skipping malformed item");
                None
            }
        })
        .collect()
}
