use serde::Deserialize;

/// Main configuration structure for Tour-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub harvest: HarvestConfig,
    pub output: OutputConfig,
}

/// Source site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the tour site (e.g., "https://www.pdga.com")
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Country filter applied to the tour search
    pub country: String,

    /// Tier allow-list applied to the tour search (e.g., ["A", "B", "C"])
    pub tiers: Vec<String>,

    /// Optional outbound proxy for all requests
    #[serde(default)]
    pub proxy: Option<String>,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the scraper
    #[serde(rename = "scraper-name")]
    pub scraper_name: String,

    /// Version of the scraper
    #[serde(rename = "scraper-version")]
    pub scraper_version: String,

    /// URL with information about the scraper
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for scraper-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Harvest run behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HarvestConfig {
    /// Pause between successive detail fetches (milliseconds)
    #[serde(rename = "request-pause-ms", default = "default_request_pause_ms")]
    pub request_pause_ms: u64,

    /// Days to wait before retrying an incomplete event
    #[serde(rename = "retry-backoff-days", default = "default_retry_backoff_days")]
    pub retry_backoff_days: u32,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            request_pause_ms: default_request_pause_ms(),
            retry_backoff_days: default_retry_backoff_days(),
        }
    }
}

fn default_request_pause_ms() -> u64 {
    2000
}

fn default_retry_backoff_days() -> u32 {
    5
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}
