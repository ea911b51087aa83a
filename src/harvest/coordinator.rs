//! Harvest coordinator - main run orchestration logic
//!
//! This module contains the run loop for one observation date:
//! - Discovering event ids via the listing paginator
//! - Registering the batch in the request ledger
//! - Driving the detail extractor over the due-work set
//! - Recording each outcome and pausing between requests
//! - Bulk-writing extracted rows and purging stale pending rows

use crate::config::Config;
use crate::harvest::extractor::{EventExtractor, ExtractDetails};
use crate::harvest::fetcher::FetchClient;
use crate::harvest::listing::discover_events;
use crate::ledger::{Ledger, RequestOutcome, SqliteLedger};
use crate::model::EventRow;
use crate::HarvestError;
use chrono::NaiveDate;
use std::path::Path;
use std::time::Duration;

/// Counts reported at the end of one harvest run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Event links found by discovery, duplicates included
    pub discovered: usize,

    /// Pending rows inserted by registration
    pub registered: usize,

    /// Size of the due-work set
    pub due: usize,

    /// Events whose extraction completed
    pub completed: usize,

    /// Events marked incomplete for retry
    pub incomplete: usize,

    /// Events skipped permanently
    pub skipped: usize,

    /// Rows appended to the detail sink
    pub rows_written: usize,

    /// Stale pending rows purged at end of run
    pub purged: usize,
}

/// Main harvest coordinator structure
pub struct Coordinator<E> {
    config: Config,
    client: FetchClient,
    ledger: SqliteLedger,
    extractor: E,
}

impl Coordinator<EventExtractor> {
    /// Creates a coordinator with the production extractor
    ///
    /// # Arguments
    ///
    /// * `config` - The harvest configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - Failed to initialize
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        let client = FetchClient::new(&config.user_agent, config.source.proxy.as_deref())?;
        let ledger = SqliteLedger::new(
            Path::new(&config.output.database_path),
            config.harvest.retry_backoff_days,
        )?;
        let extractor = EventExtractor::new(client.clone(), &config.source)?;

        Ok(Self {
            config,
            client,
            ledger,
            extractor,
        })
    }
}

impl<E: ExtractDetails> Coordinator<E> {
    /// Creates a coordinator from pre-built parts
    ///
    /// Used by tests to substitute a scripted extractor or an in-memory
    /// ledger.
    pub fn with_parts(
        config: Config,
        client: FetchClient,
        ledger: SqliteLedger,
        extractor: E,
    ) -> Self {
        Self {
            config,
            client,
            ledger,
            extractor,
        }
    }

    /// Runs one harvest for the given observation date
    ///
    /// The sequence is strictly ordered: discovery must fully succeed before
    /// registration touches the ledger (a partial discovery list would
    /// silently under-register work), each extraction outcome is committed
    /// before the next event is attempted, and the detail rows are flushed in
    /// a single batch before stale pending rows are purged.
    ///
    /// A failed extraction is downgraded to an incomplete outcome and the
    /// loop continues; discovery and persistence failures abort the run with
    /// the ledger left safely resumable for a rerun of the same date.
    pub async fn run(&mut self, observed: NaiveDate) -> Result<RunSummary, HarvestError> {
        tracing::info!("Starting harvest for {}", observed);
        let start_time = std::time::Instant::now();
        let mut summary = RunSummary::default();

        // Discovery is all-or-nothing; the ledger is untouched until the
        // whole listing has materialized
        let discovered = discover_events(&self.client, &self.config.source, observed).await?;
        summary.discovered = discovered.len();

        summary.registered = self.ledger.register_batch(&discovered, observed)?;
        tracing::info!("Loaded {} requests for processing", summary.registered);

        let due = self.ledger.due_work(observed)?;
        summary.due = due.len();
        tracing::info!("{} events due for extraction", due.len());

        let pause = Duration::from_millis(self.config.harvest.request_pause_ms);
        let mut rows: Vec<EventRow> = Vec::new();

        for (index, &event_id) in due.iter().enumerate() {
            let outcome = match self.extractor.extract(event_id, observed).await {
                Ok(extraction) => {
                    tracing::debug!(
                        "Event {}: {:?}, {} row(s)",
                        event_id,
                        extraction.outcome,
                        extraction.rows.len()
                    );
                    rows.extend(extraction.rows);
                    extraction.outcome
                }
                Err(e) => {
                    // One bad event must not sink the run; retry it later
                    tracing::warn!("Extraction failed for event {}: {}", event_id, e);
                    RequestOutcome::Incomplete
                }
            };

            match outcome {
                RequestOutcome::Complete => summary.completed += 1,
                RequestOutcome::Incomplete => summary.incomplete += 1,
                RequestOutcome::Skipped => summary.skipped += 1,
            }

            self.ledger.record_outcome(event_id, observed, outcome)?;

            if index + 1 < due.len() {
                tokio::time::sleep(pause).await;
            }
        }

        if !rows.is_empty() {
            summary.rows_written = self.ledger.append_details(&rows)?;
            tracing::info!(
                "Wrote {} detail rows for {}",
                summary.rows_written,
                observed
            );
        }

        summary.purged = self.ledger.purge_stale_pending(observed)?;
        if summary.purged > 0 {
            tracing::info!("Purged {} stale pending rows", summary.purged);
        }

        tracing::info!(
            "Harvest for {} finished in {:?}: {} complete, {} incomplete, {} skipped",
            observed,
            start_time.elapsed(),
            summary.completed,
            summary.incomplete,
            summary.skipped
        );

        Ok(summary)
    }

    /// Read access to the ledger, for post-run inspection
    pub fn ledger(&self) -> &SqliteLedger {
        &self.ledger
    }
}

/// Runs one harvest with the production extractor
///
/// This is the main entry point used by the CLI: it builds the HTTP client,
/// opens the ledger database, and executes the full run sequence for the
/// given observation date.
///
/// # Arguments
///
/// * `config` - The harvest configuration
/// * `observed` - The observation date supplied by the scheduler
///
/// # Returns
///
/// * `Ok(RunSummary)` - Run completed; individual events may still have been
///   marked incomplete or skipped
/// * `Err(HarvestError)` - Discovery or persistence failed; safe to rerun
pub async fn run_harvest(config: Config, observed: NaiveDate) -> Result<RunSummary, HarvestError> {
    let mut coordinator = Coordinator::new(config)?;
    coordinator.run(observed).await
}
