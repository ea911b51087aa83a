//! HTTP fetch client
//!
//! This module is the sole egress point for the harvester, including:
//! - Building an HTTP client with a proper user agent string
//! - Optional outbound proxy support
//! - GET requests for listing and detail pages
//! - Transport error classification
//!
//! The client performs no retries and no backoff: a non-2xx response or a
//! transport error is surfaced to the caller, who decides whether it is
//! retryable.

use crate::config::UserAgentConfig;
use crate::HarvestError;
use reqwest::{Client, Proxy};
use std::time::Duration;
use url::Url;

/// A successfully fetched page (2xx response)
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// HTTP status code
    pub status_code: u16,

    /// Response body
    pub body: String,
}

/// HTTP client wrapper used for every outbound request
#[derive(Debug, Clone)]
pub struct FetchClient {
    client: Client,
}

impl FetchClient {
    /// Creates a fetch client from user agent configuration and an optional proxy
    ///
    /// # Arguments
    ///
    /// * `config` - The user agent configuration
    /// * `proxy` - Optional proxy URL routed for all requests
    ///
    /// # Returns
    ///
    /// * `Ok(FetchClient)` - Successfully built HTTP client
    /// * `Err(HarvestError)` - Failed to build client
    pub fn new(config: &UserAgentConfig, proxy: Option<&str>) -> Result<Self, HarvestError> {
        // Format: ScraperName/Version (+ContactURL; ContactEmail)
        let user_agent = format!(
            "{}/{} (+{}; {})",
            config.scraper_name, config.scraper_version, config.contact_url, config.contact_email
        );

        let mut builder = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true);

        if let Some(proxy_url) = proxy {
            builder = builder.proxy(Proxy::all(proxy_url)?);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Fetches a URL with a single GET request
    ///
    /// # Error Classification
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | 2xx | `Ok(FetchedPage)` |
    /// | Non-2xx | `HarvestError::Status` |
    /// | Timeout | `HarvestError::Timeout` |
    /// | Other transport error | `HarvestError::Http` |
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to fetch
    pub async fn fetch(&self, url: &Url) -> Result<FetchedPage, HarvestError> {
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                HarvestError::Timeout {
                    url: url.to_string(),
                }
            } else {
                HarvestError::Http {
                    url: url.to_string(),
                    source: e,
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::Status {
                url: url.to_string(),
                code: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| HarvestError::Http {
            url: url.to_string(),
            source,
        })?;

        Ok(FetchedPage {
            status_code: status.as_u16(),
            body,
        })
    }
}
