//! yp-harvest: a proxied business-directory harvester
//!
//! This crate crawls the paginated Yellow Pages search listings with a pool of
//! concurrent workers, rotating through a list of forward proxies, and writes
//! every extracted listing to a CSV file.

pub mod config;
pub mod crawler;
pub mod listing;
pub mod output;
pub mod proxy;

use thiserror::Error;

/// Main error type for yp-harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Proxy pool closed: every proxy was discarded")]
    PoolClosed,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Proxy list error: {0}")]
    ProxyList(String),
}

/// Result type alias for yp-harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlOutcome, PageAllocator};
pub use listing::Listing;
pub use proxy::ProxyPool;
