//! Configuration management for the anime search client.
//!
//! This module handles loading and parsing configuration from TOML files,
//! with sensible defaults for all settings.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Hard cap on results kept per page
pub const MAX_RESULTS: usize = 21;

/// Hard cap on banner slots
pub const MAX_BANNER_SLOTS: usize = 5;

/// Hard cap on de-duplicated recommendations
pub const MAX_RECOMMENDATIONS: usize = 10;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Catalog API settings
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Search orchestration settings
    #[serde(default)]
    pub search: SearchConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log directory path
    pub log_dir: String,

    /// Default log level (trace, debug, info, warn, error)
    pub default_level: String,

    /// Enable console output
    pub console: bool,

    /// Enable file output
    pub file: bool,

    /// Enable JSON formatting for file logs
    pub json_format: bool,
}

/// Catalog API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Jikan API base URL
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,

    /// User agent sent with every request
    pub user_agent: String,

    /// Rate limiting settings
    pub rate_limit: RateLimitConfig,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Maximum requests per second
    pub requests_per_second: f64,

    /// Maximum requests per minute
    pub requests_per_minute: u32,
}

/// Which list drives the rotating banner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BannerSource {
    /// Leading entries of the current result page
    #[default]
    Results,
    /// Leading entries of the recommendations feed
    Recommendations,
}

/// Search orchestration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet period after the last input change before a fetch is issued
    pub debounce_ms: u64,

    /// Results kept per page, at most [`MAX_RESULTS`]
    pub max_results: usize,

    /// Banner rotation interval in milliseconds
    pub banner_interval_ms: u64,

    /// Banner slots, at most [`MAX_BANNER_SLOTS`]
    pub banner_slots: usize,

    /// De-duplicated recommendations kept, at most [`MAX_RECOMMENDATIONS`]
    pub recommendation_limit: usize,

    /// Which list feeds the banner
    pub banner_source: BannerSource,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            default_level: "info".to_string(),
            console: true,
            file: false,
            json_format: false,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.jikan.moe/v4".to_string(),
            timeout_seconds: 30,
            user_agent: concat!("anime-search/", env!("CARGO_PKG_VERSION")).to_string(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 3.0,
            requests_per_minute: 60,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            max_results: MAX_RESULTS,
            banner_interval_ms: 4000,
            banner_slots: MAX_BANNER_SLOTS,
            recommendation_limit: MAX_RECOMMENDATIONS,
            banner_source: BannerSource::Results,
        }
    }
}

impl SearchConfig {
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn banner_interval(&self) -> Duration {
        Duration::from_millis(self.banner_interval_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// If the file doesn't exist, returns the default configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Load configuration from a TOML file or create default if not found
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::from_file(path).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load config, using defaults");
            Self::default()
        })
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration saved successfully"
        );

        Ok(())
    }

    /// Reject settings that would stall or spin the client
    pub fn validate(&self) -> Result<()> {
        let rate = &self.catalog.rate_limit;
        if rate.requests_per_second.is_nan() || rate.requests_per_second <= 0.0 {
            bail!("catalog.rate_limit.requests_per_second must be positive");
        }
        if rate.requests_per_minute == 0 {
            bail!("catalog.rate_limit.requests_per_minute must be at least 1");
        }
        if self.catalog.timeout_seconds == 0 {
            bail!("catalog.timeout_seconds must be at least 1");
        }

        let search = &self.search;
        if search.debounce_ms == 0 {
            bail!("search.debounce_ms must be at least 1");
        }
        if search.banner_interval_ms == 0 {
            bail!("search.banner_interval_ms must be at least 1");
        }
        if search.max_results == 0 || search.banner_slots == 0 || search.recommendation_limit == 0 {
            bail!("search limits must be at least 1");
        }
        if search.max_results > MAX_RESULTS {
            bail!("search.max_results must be at most {}", MAX_RESULTS);
        }
        if search.banner_slots > MAX_BANNER_SLOTS {
            bail!("search.banner_slots must be at most {}", MAX_BANNER_SLOTS);
        }
        if search.recommendation_limit > MAX_RECOMMENDATIONS {
            bail!(
                "search.recommendation_limit must be at most {}",
                MAX_RECOMMENDATIONS
            );
        }

        Ok(())
    }

    /// Get the path for the log directory
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.logging.log_dir)
    }
}
