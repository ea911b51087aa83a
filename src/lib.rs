//! Tour-Harvest: a daily tour event scraper
//!
//! This crate discovers tournament events published on a paginated tour search
//! listing, tracks per-event fetch status in a durable request ledger, and
//! extracts event detail pages into structured result rows.

pub mod config;
pub mod harvest;
pub mod ledger;
pub mod model;
pub mod output;

use thiserror::Error;

/// Main error type for Tour-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP status {code} for {url}")]
    Status { url: String, code: u16 },

    #[error("HTML parse error for {url}: {message}")]
    HtmlParse { url: String, message: String },

    #[error("Ledger error: {0}")]
    Ledger(#[from] ledger::LedgerError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
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
}

/// Result type alias for Tour-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use harvest::{run_harvest, Coordinator, RunSummary};
pub use ledger::{RequestOutcome, RequestStatus};
pub use model::EventRow;
