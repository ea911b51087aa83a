//! Ledger trait and error types
//!
//! This module defines the trait interface for ledger backends and
//! associated error types.

use crate::ledger::{DailyStatusCount, RequestOutcome, RequestRecord, RequestStatus};
use crate::model::EventRow;
use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur during ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Unknown status '{0}' in ledger")]
    UnknownStatus(String),

    #[error("Malformed date '{0}' in ledger")]
    MalformedDate(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Trait for ledger backend implementations
///
/// This trait defines all database operations needed by the harvest run: the
/// request status table that coordinates work across runs, and the append-only
/// detail sink.
pub trait Ledger {
    // ===== Request Lifecycle =====

    /// Registers a discovery batch for one observation date
    ///
    /// Deletes any existing pending or incomplete row for `date` (clears stale
    /// work left by a failed prior run for the same date), then inserts the
    /// deduplicated batch as pending. Terminal rows for `date` (complete,
    /// skipped) are left untouched.
    ///
    /// # Returns
    ///
    /// The number of pending rows inserted
    fn register_batch(&mut self, event_ids: &[i64], date: NaiveDate) -> LedgerResult<usize>;

    /// Computes the set of event ids due for extraction on `date`
    ///
    /// The due set is: ids pending for `date`, plus ids incomplete with a retry
    /// date equal to `date`, minus ids skipped at any date. The skip exclusion
    /// matches on the event id alone, so a permanent skip blocks every future
    /// retry of that event. Returned sorted ascending.
    fn due_work(&self, date: NaiveDate) -> LedgerResult<Vec<i64>>;

    /// Records the outcome of one extraction attempt
    ///
    /// Overwrites the event's non-complete rows in place; never creates a row.
    /// An incomplete outcome also schedules the retry date from `observed` plus
    /// the configured backoff window. Complete and skipped clear the retry date.
    fn record_outcome(
        &mut self,
        event_id: i64,
        observed: NaiveDate,
        outcome: RequestOutcome,
    ) -> LedgerResult<()>;

    /// Deletes rows still pending for `date` after the due-work cycle
    ///
    /// # Returns
    ///
    /// The number of rows removed
    fn purge_stale_pending(&mut self, date: NaiveDate) -> LedgerResult<usize>;

    /// Gets one ledger row by its natural key
    fn get_request(&self, event_id: i64, date: NaiveDate) -> LedgerResult<Option<RequestRecord>>;

    /// Gets all ledger rows for an event across observation dates
    fn get_requests_for_event(&self, event_id: i64) -> LedgerResult<Vec<RequestRecord>>;

    // ===== Detail Sink =====

    /// Appends a batch of extracted rows to the detail sink in one transaction
    ///
    /// # Returns
    ///
    /// The number of rows written
    fn append_details(&mut self, rows: &[EventRow]) -> LedgerResult<usize>;

    // ===== Statistics =====

    /// Counts ledger rows by status
    fn count_requests_by_status(&self, status: RequestStatus) -> LedgerResult<u64>;

    /// Gets request counts per day and status, most recent day first
    fn requests_by_day(&self) -> LedgerResult<Vec<DailyStatusCount>>;

    /// Counts rows in the detail sink
    fn count_detail_rows(&self) -> LedgerResult<u64>;

    /// Counts distinct events present in the detail sink
    fn count_detail_events(&self) -> LedgerResult<u64>;
}
