//! Request ledger for coordinating discovery, extraction, and retry
//!
//! This module owns the durable per-event status table that makes harvest runs
//! idempotent and safely repeatable, including:
//! - The request status state machine (pending, complete, incomplete, skipped)
//! - Batch registration with delete-then-insert replace semantics per date
//! - The due-work query that drives each run's extraction loop
//! - Retry scheduling for incomplete events
//! - The append-only detail sink

mod schema;
mod sqlite;
mod traits;

pub use schema::initialize_schema;
pub use sqlite::SqliteLedger;
pub use traits::{Ledger, LedgerError, LedgerResult};

use chrono::NaiveDate;
use std::fmt;

/// Lifecycle status of a request row in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestStatus {
    /// Registered by discovery, not yet attempted this run
    Pending,

    /// Extraction produced final rows; terminal
    Complete,

    /// Extraction failed transiently; retried once the retry date arrives
    Incomplete,

    /// Event is permanently inapplicable; terminal, blocks all future retries
    Skipped,
}

impl RequestStatus {
    /// Returns true if this is a terminal state (never re-attempted)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Skipped)
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Complete => "complete",
            Self::Incomplete => "incomplete",
            Self::Skipped => "skipped",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "complete" => Some(Self::Complete),
            "incomplete" => Some(Self::Incomplete),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }

    /// Returns all possible statuses
    pub fn all_statuses() -> Vec<Self> {
        vec![
            Self::Pending,
            Self::Complete,
            Self::Incomplete,
            Self::Skipped,
        ]
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// Outcome of one extraction attempt, shared between the detail extractor and
/// the ledger so the two can never drift apart on status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Rows were produced and are considered final
    Complete,

    /// Transient failure; re-attempt after the backoff window
    Incomplete,

    /// Event confirmed permanently inapplicable (e.g., cancelled upstream)
    Skipped,
}

impl From<RequestOutcome> for RequestStatus {
    fn from(outcome: RequestOutcome) -> Self {
        match outcome {
            RequestOutcome::Complete => Self::Complete,
            RequestOutcome::Incomplete => Self::Incomplete,
            RequestOutcome::Skipped => Self::Skipped,
        }
    }
}

/// One row of the request ledger
#[derive(Debug, Clone, PartialEq)]
pub struct RequestRecord {
    /// Stable event identifier from the source site
    pub event_id: i64,

    /// The observation date this row was registered under
    pub event_date: NaiveDate,

    /// Current lifecycle status
    pub status: RequestStatus,

    /// Earliest date a re-fetch is attempted; set only while incomplete
    pub retry_date: Option<NaiveDate>,

    /// RFC 3339 timestamp of registration
    pub requested_at: String,
}

/// Per-day request count for one status, used by the stats report
#[derive(Debug, Clone, PartialEq)]
pub struct DailyStatusCount {
    pub event_date: NaiveDate,
    pub status: RequestStatus,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip_db_string() {
        for status in RequestStatus::all_statuses() {
            let db_str = status.to_db_string();
            let parsed = RequestStatus::from_db_string(db_str);
            assert_eq!(Some(status), parsed, "Failed roundtrip for {:?}", status);
        }
    }

    #[test]
    fn test_status_invalid() {
        assert_eq!(RequestStatus::from_db_string("invalid"), None);
        assert_eq!(RequestStatus::from_db_string(""), None);
        // Raw integers from the legacy encoding must not parse
        assert_eq!(RequestStatus::from_db_string("1"), None);
    }

    #[test]
    fn test_is_terminal() {
        assert!(RequestStatus::Complete.is_terminal());
        assert!(RequestStatus::Skipped.is_terminal());

        assert!(!RequestStatus::Pending.is_terminal());
        assert!(!RequestStatus::Incomplete.is_terminal());
    }

    #[test]
    fn test_outcome_maps_to_status() {
        assert_eq!(
            RequestStatus::from(RequestOutcome::Complete),
            RequestStatus::Complete
        );
        assert_eq!(
            RequestStatus::from(RequestOutcome::Incomplete),
            RequestStatus::Incomplete
        );
        assert_eq!(
            RequestStatus::from(RequestOutcome::Skipped),
            RequestStatus::Skipped
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", RequestStatus::Pending), "pending");
        assert_eq!(format!("{}", RequestStatus::Incomplete), "incomplete");
    }
}
