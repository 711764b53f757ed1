//! Shared library for the anime search client.
//!
//! This crate provides common functionality used by the search crate:
//! - Configuration management
//! - Catalog data models
//! - Logging infrastructure

pub mod config;
pub mod logging;
pub mod models;

// Re-export commonly used types
pub use config::{
    BannerSource, Config, SearchConfig, MAX_BANNER_SLOTS, MAX_RECOMMENDATIONS, MAX_RESULTS,
};
pub use logging::LogConfig;
pub use models::*;

/// Common result type using anyhow::Error
pub type Result<T> = anyhow::Result<T>;
