//! Listing paginator for the tour search endpoint
//!
//! This module drives the fetch client across the site's paginated tour
//! search, including:
//! - Building the filtered search URL for one observation date
//! - Parsing result cells into event identifiers
//! - Following the "next page" link until the listing is exhausted
//!
//! # Markup Contract
//!
//! Discovery depends on stable class-name markers in the search results:
//! each result row carries a `td.views-field-OfficialName` cell whose `<a>`
//! links to the event page (the trailing path segment is the numeric event
//! id), and paged listings expose a `li.pager-next` item wrapping the link to
//! the next page. If the site changes this markup, discovery fails loudly
//! rather than returning a partial list.

use crate::config::SourceConfig;
use crate::harvest::fetcher::FetchClient;
use crate::HarvestError;
use chrono::NaiveDate;
use scraper::{Html, Selector};
use url::Url;

/// Event ids and pagination state parsed from one listing page
#[derive(Debug, Clone)]
pub struct ListingPage {
    /// Event ids in row order
    pub event_ids: Vec<i64>,

    /// Absolute URL of the next page, if the listing continues
    pub next_url: Option<Url>,
}

/// Builds the first search URL for one observation date
///
/// The date bounds both ends of the search window, so the listing covers
/// exactly the events updated on that date, filtered to the configured
/// country and tier allow-list.
pub fn search_url(source: &SourceConfig, date: NaiveDate) -> Result<Url, HarvestError> {
    let base = Url::parse(&source.base_url)?;
    let mut url = base.join("/tour/search")?;

    let date_str = date.to_string();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("date_filter[min][date]", &date_str);
        pairs.append_pair("date_filter[max][date]", &date_str);
        pairs.append_pair("Country[]", &source.country);
        for tier in &source.tiers {
            pairs.append_pair("Tier[]", tier);
        }
    }

    Ok(url)
}

/// Parses one listing page into event ids and the next-page URL
///
/// # Arguments
///
/// * `html` - The listing page body
/// * `base_url` - The page's own URL, for resolving relative pager links
///
/// # Returns
///
/// * `Ok(ListingPage)` - Successfully parsed page
/// * `Err(String)` - Expected markup was absent or malformed
pub fn parse_listing_page(html: &str, base_url: &Url) -> Result<ListingPage, String> {
    let document = Html::parse_document(html);

    let cell_selector = Selector::parse("td.views-field-OfficialName")
        .map_err(|e| format!("bad selector: {}", e))?;
    let link_selector = Selector::parse("a").map_err(|e| format!("bad selector: {}", e))?;

    let mut event_ids = Vec::new();
    for cell in document.select(&cell_selector) {
        let link = cell
            .select(&link_selector)
            .next()
            .ok_or_else(|| "result cell without an event link".to_string())?;

        let href = link
            .value()
            .attr("href")
            .ok_or_else(|| "event link without href".to_string())?;

        event_ids.push(event_id_from_href(href)?);
    }

    let next_url = find_next_url(&document, base_url)?;

    Ok(ListingPage {
        event_ids,
        next_url,
    })
}

/// Extracts the numeric event id from the trailing path segment of a link
fn event_id_from_href(href: &str) -> Result<i64, String> {
    let trimmed = href.trim_end_matches('/');
    let segment = trimmed
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("event link '{}' has no path segment", href))?;

    segment
        .parse::<i64>()
        .map_err(|_| format!("event link '{}' has a non-numeric id segment", href))
}

/// Locates the pager-next link, if any
fn find_next_url(document: &Html, base_url: &Url) -> Result<Option<Url>, String> {
    let pager_selector =
        Selector::parse("li.pager-next").map_err(|e| format!("bad selector: {}", e))?;
    let link_selector = Selector::parse("a").map_err(|e| format!("bad selector: {}", e))?;

    let Some(pager) = document.select(&pager_selector).next() else {
        return Ok(None);
    };

    let href = pager
        .select(&link_selector)
        .next()
        .and_then(|a| a.value().attr("href"))
        .ok_or_else(|| "pager-next item without a link".to_string())?;

    let url = base_url
        .join(href)
        .map_err(|e| format!("pager-next href '{}' did not resolve: {}", href, e))?;

    Ok(Some(url))
}

/// Lazily pages through the tour search for one observation date
///
/// The sequence is finite and not restartable mid-stream: a caller that needs
/// to restart re-issues the whole discovery from page one, which is acceptable
/// because discovery is cheap relative to detail fetches.
pub struct ListingPaginator<'a> {
    client: &'a FetchClient,
    next_url: Option<Url>,
}

impl<'a> ListingPaginator<'a> {
    /// Creates a paginator positioned at the first search page
    pub fn new(
        client: &'a FetchClient,
        source: &SourceConfig,
        date: NaiveDate,
    ) -> Result<Self, HarvestError> {
        let first = search_url(source, date)?;
        Ok(Self {
            client,
            next_url: Some(first),
        })
    }

    /// Fetches and parses the next listing page
    ///
    /// # Returns
    ///
    /// * `Ok(Some(ids))` - Event ids from the page, in row order
    /// * `Ok(None)` - The listing is exhausted
    /// * `Err(HarvestError)` - Fetch or parse failure; the sequence is dead
    pub async fn next_page(&mut self) -> Result<Option<Vec<i64>>, HarvestError> {
        let Some(url) = self.next_url.take() else {
            return Ok(None);
        };

        let page = self.client.fetch(&url).await?;
        let parsed =
            parse_listing_page(&page.body, &url).map_err(|message| HarvestError::HtmlParse {
                url: url.to_string(),
                message,
            })?;

        if parsed.next_url.is_some() {
            tracing::debug!("More results available after {}", url);
        }
        self.next_url = parsed.next_url;

        Ok(Some(parsed.event_ids))
    }
}

/// Discovers all event ids for one observation date
///
/// Drives the paginator to exhaustion and returns ids in page/row order,
/// duplicates included; the ledger upsert is the dedup point. Any fetch or
/// parse error aborts the whole discovery so a partial list can never
/// under-register work undetected.
pub async fn discover_events(
    client: &FetchClient,
    source: &SourceConfig,
    date: NaiveDate,
) -> Result<Vec<i64>, HarvestError> {
    let mut paginator = ListingPaginator::new(client, source, date)?;
    let mut event_ids = Vec::new();
    let mut pages = 0;

    while let Some(page_ids) = paginator.next_page().await? {
        pages += 1;
        event_ids.extend(page_ids);
    }

    tracing::info!(
        "Discovered {} event links across {} page(s) for {}",
        event_ids.len(),
        pages,
        date
    );

    Ok(event_ids)
}
