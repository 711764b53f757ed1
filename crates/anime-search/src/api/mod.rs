//! Jikan API v4 client implementation.
//!
//! This module provides the transport seam used by the orchestration
//! layer, the rate-limited production client behind it, and the request
//! and response types both sides share.

pub mod client;
pub mod rate_limiter;
pub mod transport;
pub mod types;

pub use client::JikanClient;
pub use rate_limiter::RateLimiter;
pub use transport::CatalogTransport;
pub use types::*;
