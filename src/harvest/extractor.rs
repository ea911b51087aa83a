//! Detail extractor for event pages
//!
//! This module turns one event's detail page into structured result rows and
//! classifies the attempt as complete, incomplete, or skipped. Classification
//! is the extractor's responsibility; persistence belongs to the ledger and is
//! driven by the coordinator.
//!
//! # Markup Contract
//!
//! - Event name from the first `h1`; a name marked "cancelled" declares the
//!   event permanently inapplicable.
//! - `li.tournament-date` carries "Date: 01-Mar-2024 to 03-Mar-2024" (a one
//!   day event omits the " to " part); `li.tournament-location` carries
//!   "Location: ...".
//! - One `table.results` per division, its label in `caption`, one `tr` per
//!   player with `td.place`, `td.player`, `td.pdga-number`, `td.player-rating`
//!   and `td.total` cells.
//!
//! A reachable page without any results table is not an error: results are
//! published after the event finishes, so the attempt is incomplete and the
//! ledger schedules a retry.

use crate::config::SourceConfig;
use crate::harvest::fetcher::FetchClient;
use crate::ledger::RequestOutcome;
use crate::model::EventRow;
use crate::HarvestError;
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Result of one extraction attempt
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Classification reported back to the ledger
    pub outcome: RequestOutcome,

    /// Structured rows; non-empty only when the outcome is complete
    pub rows: Vec<EventRow>,
}

impl Extraction {
    pub fn complete(rows: Vec<EventRow>) -> Self {
        Self {
            outcome: RequestOutcome::Complete,
            rows,
        }
    }

    pub fn incomplete() -> Self {
        Self {
            outcome: RequestOutcome::Incomplete,
            rows: Vec::new(),
        }
    }

    pub fn skipped() -> Self {
        Self {
            outcome: RequestOutcome::Skipped,
            rows: Vec::new(),
        }
    }
}

/// Boundary between the run coordinator and detail extraction
///
/// Implementations fetch and parse whatever pages they need for one event and
/// report a three-way outcome. Errors returned here are downgraded to an
/// incomplete outcome by the coordinator; they never abort the run.
pub trait ExtractDetails {
    fn extract(
        &self,
        event_id: i64,
        observed: NaiveDate,
    ) -> impl std::future::Future<Output = Result<Extraction, HarvestError>> + Send;
}

/// Production extractor for the tour site's event pages
#[derive(Debug, Clone)]
pub struct EventExtractor {
    client: FetchClient,
    base_url: Url,
}

impl EventExtractor {
    /// Creates an extractor bound to the configured source site
    pub fn new(client: FetchClient, source: &SourceConfig) -> Result<Self, HarvestError> {
        let base_url = Url::parse(&source.base_url)?;
        Ok(Self { client, base_url })
    }

    fn event_url(&self, event_id: i64) -> Result<Url, HarvestError> {
        Ok(self.base_url.join(&format!("/tour/event/{}", event_id))?)
    }
}

impl ExtractDetails for EventExtractor {
    async fn extract(&self, event_id: i64, observed: NaiveDate) -> Result<Extraction, HarvestError> {
        let url = self.event_url(event_id)?;

        let page = match self.client.fetch(&url).await {
            Ok(page) => page,
            Err(HarvestError::Status { url, code }) => {
                // The detail page is not (yet) being served; retry later
                tracing::debug!("Event {} returned HTTP {} at {}", event_id, code, url);
                return Ok(Extraction::incomplete());
            }
            Err(e) => return Err(e),
        };

        let parsed =
            parse_event_page(&page.body).map_err(|message| HarvestError::HtmlParse {
                url: url.to_string(),
                message,
            })?;

        if parsed.cancelled {
            tracing::info!("Event {} is cancelled, skipping permanently", event_id);
            return Ok(Extraction::skipped());
        }

        let rows = parsed.into_rows(event_id, observed);
        if rows.is_empty() {
            // Results are published after the event wraps up
            return Ok(Extraction::incomplete());
        }

        Ok(Extraction::complete(rows))
    }
}

/// Event header and results parsed from a detail page
#[derive(Debug, Clone)]
struct ParsedEvent {
    name: String,
    cancelled: bool,
    tier: Option<String>,
    location: Option<String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    divisions: Vec<ParsedDivision>,
}

#[derive(Debug, Clone)]
struct ParsedDivision {
    label: String,
    results: Vec<ParsedResult>,
}

#[derive(Debug, Clone)]
struct ParsedResult {
    place: Option<u32>,
    player_name: String,
    player_number: Option<i64>,
    player_rating: Option<u32>,
    total_score: Option<i32>,
}

impl ParsedEvent {
    fn into_rows(self, event_id: i64, observed: NaiveDate) -> Vec<EventRow> {
        let mut rows = Vec::new();
        for division in self.divisions {
            for result in division.results {
                rows.push(EventRow {
                    event_id,
                    event_name: self.name.clone(),
                    tier: self.tier.clone(),
                    location: self.location.clone(),
                    start_date: self.start_date,
                    end_date: self.end_date,
                    division: division.label.clone(),
                    place: result.place,
                    player_name: result.player_name,
                    player_number: result.player_number,
                    player_rating: result.player_rating,
                    total_score: result.total_score,
                    event_date: observed,
                });
            }
        }
        rows
    }
}

fn selector(css: &str) -> Result<Selector, String> {
    Selector::parse(css).map_err(|e| format!("bad selector '{}': {}", css, e))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Parses an event detail page
fn parse_event_page(html: &str) -> Result<ParsedEvent, String> {
    let document = Html::parse_document(html);

    let h1 = selector("h1")?;
    let name = document
        .select(&h1)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "event page without an h1 title".to_string())?;

    let cancelled = name.to_lowercase().contains("cancelled");

    let tier_sel = selector("li.tournament-tier")?;
    let tier = document
        .select(&tier_sel)
        .next()
        .map(element_text)
        .map(|s| strip_label(&s, "Tier:"));

    let location_sel = selector("li.tournament-location")?;
    let location = document
        .select(&location_sel)
        .next()
        .map(element_text)
        .map(|s| strip_label(&s, "Location:"));

    let date_sel = selector("li.tournament-date")?;
    let (start_date, end_date) = match document.select(&date_sel).next() {
        Some(element) => parse_date_span(&strip_label(&element_text(element), "Date:")),
        None => (None, None),
    };

    let divisions = parse_divisions(&document)?;

    Ok(ParsedEvent {
        name,
        cancelled,
        tier,
        location,
        start_date,
        end_date,
        divisions,
    })
}

fn strip_label(text: &str, label: &str) -> String {
    text.strip_prefix(label).unwrap_or(text).trim().to_string()
}

/// Parses "01-Mar-2024 to 03-Mar-2024" or a single "01-Mar-2024"
fn parse_date_span(text: &str) -> (Option<NaiveDate>, Option<NaiveDate>) {
    let parse = |s: &str| NaiveDate::parse_from_str(s.trim(), "%d-%b-%Y").ok();

    match text.split_once(" to ") {
        Some((start, end)) => (parse(start), parse(end)),
        None => {
            let day = parse(text);
            (day, day)
        }
    }
}

fn parse_divisions(document: &Html) -> Result<Vec<ParsedDivision>, String> {
    let table_sel = selector("table.results")?;
    let caption_sel = selector("caption")?;
    let row_sel = selector("tr")?;

    let mut divisions = Vec::new();
    for table in document.select(&table_sel) {
        let label = table
            .select(&caption_sel)
            .next()
            .map(element_text)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "results table without a division caption".to_string())?;

        let mut results = Vec::new();
        for row in table.select(&row_sel) {
            if let Some(result) = parse_result_row(row)? {
                results.push(result);
            }
        }

        divisions.push(ParsedDivision { label, results });
    }

    Ok(divisions)
}

/// Parses one results row; returns None for header and filler rows
fn parse_result_row(row: ElementRef<'_>) -> Result<Option<ParsedResult>, String> {
    let player_sel = selector("td.player")?;
    let place_sel = selector("td.place")?;
    let number_sel = selector("td.pdga-number")?;
    let rating_sel = selector("td.player-rating")?;
    let total_sel = selector("td.total")?;

    let Some(player_cell) = row.select(&player_sel).next() else {
        return Ok(None);
    };

    let player_name = element_text(player_cell);
    if player_name.is_empty() {
        return Err("result row with an empty player cell".to_string());
    }

    let cell_text = |sel: &Selector| row.select(sel).next().map(element_text);

    Ok(Some(ParsedResult {
        place: cell_text(&place_sel).and_then(|s| s.parse().ok()),
        player_name,
        player_number: cell_text(&number_sel).and_then(|s| s.parse().ok()),
        player_rating: cell_text(&rating_sel).and_then(|s| s.parse().ok()),
        total_score: cell_text(&total_sel).and_then(|s| s.parse().ok()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_PAGE: &str = r#"
        <html><body>
        <h1>Spring Fling Open</h1>
        <ul class="event-info">
            <li class="tournament-date">Date: 01-Mar-2024 to 03-Mar-2024</li>
            <li class="tournament-location">Location: Austin, Texas, United States</li>
            <li class="tournament-tier">Tier: B</li>
        </ul>
        <table class="results">
            <caption>MPO</caption>
            <tr><th>Place</th><th>Name</th></tr>
            <tr>
                <td class="place">1</td>
                <td class="player"><a href="/player/55123">A. Player</a></td>
                <td class="pdga-number">55123</td>
                <td class="player-rating">1012</td>
                <td class="total">198</td>
            </tr>
            <tr>
                <td class="place">2</td>
                <td class="player">B. Thrower</td>
                <td class="pdga-number">61077</td>
                <td class="player-rating">998</td>
                <td class="total">201</td>
            </tr>
        </table>
        <table class="results">
            <caption>FPO</caption>
            <tr>
                <td class="place">1</td>
                <td class="player">C. Putter</td>
                <td class="pdga-number"></td>
                <td class="player-rating">955</td>
                <td class="total">DNF</td>
            </tr>
        </table>
        </body></html>
    "#;

    #[test]
    fn test_parse_event_page_full() {
        let parsed = parse_event_page(RESULTS_PAGE).unwrap();

        assert_eq!(parsed.name, "Spring Fling Open");
        assert!(!parsed.cancelled);
        assert_eq!(parsed.tier.as_deref(), Some("B"));
        assert_eq!(
            parsed.location.as_deref(),
            Some("Austin, Texas, United States")
        );
        assert_eq!(parsed.start_date, Some("2024-03-01".parse().unwrap()));
        assert_eq!(parsed.end_date, Some("2024-03-03".parse().unwrap()));

        assert_eq!(parsed.divisions.len(), 2);
        assert_eq!(parsed.divisions[0].label, "MPO");
        assert_eq!(parsed.divisions[0].results.len(), 2);
        assert_eq!(parsed.divisions[1].label, "FPO");
    }

    #[test]
    fn test_parse_result_row_fields() {
        let parsed = parse_event_page(RESULTS_PAGE).unwrap();
        let first = &parsed.divisions[0].results[0];

        assert_eq!(first.place, Some(1));
        assert_eq!(first.player_name, "A. Player");
        assert_eq!(first.player_number, Some(55123));
        assert_eq!(first.player_rating, Some(1012));
        assert_eq!(first.total_score, Some(198));

        // Blank and non-numeric cells degrade to None rather than failing
        let dnf = &parsed.divisions[1].results[0];
        assert_eq!(dnf.player_number, None);
        assert_eq!(dnf.total_score, None);
    }

    #[test]
    fn test_into_rows_flattens_divisions() {
        let observed: NaiveDate = "2024-03-04".parse().unwrap();
        let rows = parse_event_page(RESULTS_PAGE)
            .unwrap()
            .into_rows(77001, observed);

        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.event_id == 77001));
        assert!(rows.iter().all(|r| r.event_date == observed));
        assert_eq!(rows[2].division, "FPO");
    }

    #[test]
    fn test_parse_event_page_cancelled() {
        let html = r#"<html><body><h1>Winter Open (CANCELLED)</h1></body></html>"#;
        let parsed = parse_event_page(html).unwrap();
        assert!(parsed.cancelled);
    }

    #[test]
    fn test_parse_event_page_no_results_yet() {
        let html = r#"
            <html><body>
            <h1>Upcoming Open</h1>
            <ul class="event-info"><li class="tournament-date">Date: 09-Aug-2025</li></ul>
            </body></html>
        "#;
        let parsed = parse_event_page(html).unwrap();
        assert!(parsed.divisions.is_empty());
        // Single-day span fills both ends
        assert_eq!(parsed.start_date, parsed.end_date);
        assert_eq!(parsed.start_date, Some("2025-08-09".parse().unwrap()));
    }

    #[test]
    fn test_parse_event_page_missing_title() {
        let html = r#"<html><body><p>nothing here</p></body></html>"#;
        assert!(parse_event_page(html).is_err());
    }

    #[test]
    fn test_parse_event_page_table_without_caption() {
        let html = r#"
            <html><body><h1>Open</h1>
            <table class="results"><tr><td class="player">X</td></tr></table>
            </body></html>
        "#;
        assert!(parse_event_page(html).is_err());
    }

    #[test]
    fn test_parse_date_span_variants() {
        let (start, end) = parse_date_span("01-Mar-2024 to 03-Mar-2024");
        assert_eq!(start, Some("2024-03-01".parse().unwrap()));
        assert_eq!(end, Some("2024-03-03".parse().unwrap()));

        let (start, end) = parse_date_span("garbage");
        assert_eq!(start, None);
        assert_eq!(end, None);
    }
}
