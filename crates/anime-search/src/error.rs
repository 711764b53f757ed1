//! Fetch error taxonomy.
//!
//! Every failure of a catalog request maps to one of these variants. The
//! session absorbs them into an empty result set; only the detail lookup
//! hands them back to the caller.

use thiserror::Error;

/// Why a catalog request produced no usable body
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// No response was received (connection, DNS, timeout)
    #[error("transport error: {0}")]
    Transport(String),

    /// HTTP 429 from the catalog API
    #[error("rate limited by catalog API (HTTP 429)")]
    RateLimited,

    /// Any other non-success status
    #[error("request failed with status {0}")]
    Status(u16),

    /// 2xx response whose body is not usable JSON
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Classify a non-success HTTP status code
    pub fn from_status(status: u16) -> Self {
        if status == 429 {
            FetchError::RateLimited
        } else {
            FetchError::Status(status)
        }
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, FetchError::RateLimited)
    }

    /// Short label for structured log fields
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::RateLimited => "rate_limited",
            FetchError::Status(_) => "status",
            FetchError::Decode(_) => "decode",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(FetchError::from_status(429), FetchError::RateLimited);
        assert!(FetchError::from_status(429).is_rate_limit());
        assert_eq!(FetchError::from_status(500), FetchError::Status(500));
        assert!(!FetchError::from_status(404).is_rate_limit());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            FetchError::Status(503).to_string(),
            "request failed with status 503"
        );
        assert_eq!(FetchError::RateLimited.kind(), "rate_limited");
    }
}
