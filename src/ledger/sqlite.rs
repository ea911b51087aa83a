//! SQLite ledger implementation
//!
//! This module provides a SQLite-based implementation of the Ledger trait.

use crate::ledger::schema::initialize_schema;
use crate::ledger::traits::{Ledger, LedgerError, LedgerResult};
use crate::ledger::{DailyStatusCount, RequestOutcome, RequestRecord, RequestStatus};
use crate::model::EventRow;
use crate::HarvestError;
use chrono::{Duration, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashSet;
use std::path::Path;

/// SQLite ledger backend
pub struct SqliteLedger {
    conn: Connection,
    retry_backoff_days: u32,
}

impl SqliteLedger {
    /// Creates a new SqliteLedger instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `retry_backoff_days` - Days to wait before retrying an incomplete event
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteLedger)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path, retry_backoff_days: u32) -> Result<Self, HarvestError> {
        let conn = Connection::open(path).map_err(LedgerError::Sqlite)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )
        .map_err(LedgerError::Sqlite)?;

        // Initialize schema
        initialize_schema(&conn).map_err(LedgerError::Sqlite)?;

        Ok(Self {
            conn,
            retry_backoff_days,
        })
    }

    /// Creates an in-memory ledger (for testing)
    pub fn new_in_memory(retry_backoff_days: u32) -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory().map_err(LedgerError::Sqlite)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(LedgerError::Sqlite)?;
        initialize_schema(&conn).map_err(LedgerError::Sqlite)?;
        Ok(Self {
            conn,
            retry_backoff_days,
        })
    }

    fn record_from_row(row: &Row<'_>) -> rusqlite::Result<(i64, String, String, Option<String>, String)> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
        ))
    }

    fn build_record(
        (event_id, date_str, status_str, retry_str, requested_at): (
            i64,
            String,
            String,
            Option<String>,
            String,
        ),
    ) -> LedgerResult<RequestRecord> {
        let status = RequestStatus::from_db_string(&status_str)
            .ok_or(LedgerError::UnknownStatus(status_str))?;
        let event_date = parse_date(&date_str)?;
        let retry_date = retry_str.as_deref().map(parse_date).transpose()?;

        Ok(RequestRecord {
            event_id,
            event_date,
            status,
            retry_date,
            requested_at,
        })
    }
}

fn parse_date(s: &str) -> LedgerResult<NaiveDate> {
    s.parse::<NaiveDate>()
        .map_err(|_| LedgerError::MalformedDate(s.to_string()))
}

impl Ledger for SqliteLedger {
    // ===== Request Lifecycle =====

    fn register_batch(&mut self, event_ids: &[i64], date: NaiveDate) -> LedgerResult<usize> {
        let date_str = date.to_string();
        let now = Utc::now().to_rfc3339();

        let tx = self.conn.transaction()?;

        // Clear stale pending/incomplete rows left from a failed prior run for
        // this date; complete and skipped are terminal and survive reruns
        tx.execute(
            "DELETE FROM event_requests WHERE event_date = ?1 AND status IN (?2, ?3)",
            params![
                date_str,
                RequestStatus::Pending.to_db_string(),
                RequestStatus::Incomplete.to_db_string()
            ],
        )?;

        let mut inserted = 0;
        {
            // OR IGNORE keeps terminal rows for this date untouched
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO event_requests (event_id, event_date, status, requested_at)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;

            let mut seen = HashSet::new();
            for &event_id in event_ids {
                if !seen.insert(event_id) {
                    continue;
                }
                inserted += stmt.execute(params![
                    event_id,
                    date_str,
                    RequestStatus::Pending.to_db_string(),
                    now
                ])?;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    fn due_work(&self, date: NaiveDate) -> LedgerResult<Vec<i64>> {
        let date_str = date.to_string();

        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT event_id FROM event_requests
             WHERE event_date = ?1 AND status = ?2
             UNION
             SELECT event_id FROM event_requests
             WHERE status = ?3 AND retry_date = ?1
             EXCEPT
             SELECT event_id FROM event_requests WHERE status = ?4
             ORDER BY 1",
        )?;

        let ids = stmt
            .query_map(
                params![
                    date_str,
                    RequestStatus::Pending.to_db_string(),
                    RequestStatus::Incomplete.to_db_string(),
                    RequestStatus::Skipped.to_db_string(),
                ],
                |row| row.get(0),
            )?
            .collect::<Result<Vec<i64>, _>>()?;

        Ok(ids)
    }

    fn record_outcome(
        &mut self,
        event_id: i64,
        observed: NaiveDate,
        outcome: RequestOutcome,
    ) -> LedgerResult<()> {
        let status = RequestStatus::from(outcome);

        // Complete rows from earlier dates are history, not work; leave them be
        let updated = match outcome {
            RequestOutcome::Incomplete => {
                let retry = observed + Duration::days(i64::from(self.retry_backoff_days));
                self.conn.execute(
                    "UPDATE event_requests SET status = ?1, retry_date = ?2
                     WHERE event_id = ?3 AND status != ?4",
                    params![
                        status.to_db_string(),
                        retry.to_string(),
                        event_id,
                        RequestStatus::Complete.to_db_string()
                    ],
                )?
            }
            RequestOutcome::Complete | RequestOutcome::Skipped => self.conn.execute(
                "UPDATE event_requests SET status = ?1, retry_date = NULL
                 WHERE event_id = ?2 AND status != ?3",
                params![
                    status.to_db_string(),
                    event_id,
                    RequestStatus::Complete.to_db_string()
                ],
            )?,
        };

        if updated == 0 {
            tracing::debug!("No ledger rows updated for event {}", event_id);
        }

        Ok(())
    }

    fn purge_stale_pending(&mut self, date: NaiveDate) -> LedgerResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM event_requests WHERE event_date = ?1 AND status = ?2",
            params![date.to_string(), RequestStatus::Pending.to_db_string()],
        )?;
        Ok(removed)
    }

    fn get_request(&self, event_id: i64, date: NaiveDate) -> LedgerResult<Option<RequestRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT event_id, event_date, status, retry_date, requested_at
             FROM event_requests WHERE event_id = ?1 AND event_date = ?2",
        )?;

        let raw = stmt
            .query_row(params![event_id, date.to_string()], Self::record_from_row)
            .optional()?;

        raw.map(Self::build_record).transpose()
    }

    fn get_requests_for_event(&self, event_id: i64) -> LedgerResult<Vec<RequestRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT event_id, event_date, status, retry_date, requested_at
             FROM event_requests WHERE event_id = ?1 ORDER BY event_date",
        )?;

        let raw = stmt
            .query_map(params![event_id], Self::record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter().map(Self::build_record).collect()
    }

    // ===== Detail Sink =====

    fn append_details(&mut self, rows: &[EventRow]) -> LedgerResult<usize> {
        let now = Utc::now().to_rfc3339();

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO event_details
                 (event_id, event_name, tier, location, start_date, end_date,
                  division, place, player_name, player_number, player_rating,
                  total_score, event_date, loaded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            )?;

            for row in rows {
                stmt.execute(params![
                    row.event_id,
                    row.event_name,
                    row.tier,
                    row.location,
                    row.start_date.map(|d| d.to_string()),
                    row.end_date.map(|d| d.to_string()),
                    row.division,
                    row.place,
                    row.player_name,
                    row.player_number,
                    row.player_rating,
                    row.total_score,
                    row.event_date.to_string(),
                    now,
                ])?;
            }
        }
        tx.commit()?;

        Ok(rows.len())
    }

    // ===== Statistics =====

    fn count_requests_by_status(&self, status: RequestStatus) -> LedgerResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM event_requests WHERE status = ?1",
            params![status.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn requests_by_day(&self) -> LedgerResult<Vec<DailyStatusCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT event_date, status, COUNT(*) FROM event_requests
             GROUP BY event_date, status
             ORDER BY event_date DESC, status",
        )?;

        let raw = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(date_str, status_str, count)| {
                let status = RequestStatus::from_db_string(&status_str)
                    .ok_or(LedgerError::UnknownStatus(status_str))?;
                Ok(DailyStatusCount {
                    event_date: parse_date(&date_str)?,
                    status,
                    count: count as u64,
                })
            })
            .collect()
    }

    fn count_detail_rows(&self) -> LedgerResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM event_details", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_detail_events(&self) -> LedgerResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT event_id) FROM event_details",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
