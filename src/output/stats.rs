//! Statistics generation from the ledger database
//!
//! This module provides functionality for extracting and displaying request
//! and detail-sink statistics from the ledger.

use crate::ledger::{DailyStatusCount, Ledger, RequestStatus};
use crate::HarvestError;
use std::collections::HashMap;

/// Ledger statistics summary
#[derive(Debug, Clone)]
pub struct LedgerStatistics {
    /// Request counts by status across all dates
    pub requests_by_status: HashMap<RequestStatus, u64>,

    /// Request counts per day and status, most recent day first
    pub requests_by_day: Vec<DailyStatusCount>,

    /// Total rows in the detail sink
    pub detail_rows: u64,

    /// Distinct events present in the detail sink
    pub detail_events: u64,
}

/// Loads statistics from the ledger
pub fn load_statistics(ledger: &dyn Ledger) -> Result<LedgerStatistics, HarvestError> {
    let mut requests_by_status = HashMap::new();
    for status in RequestStatus::all_statuses() {
        let count = ledger.count_requests_by_status(status)?;
        if count > 0 {
            requests_by_status.insert(status, count);
        }
    }

    Ok(LedgerStatistics {
        requests_by_status,
        requests_by_day: ledger.requests_by_day()?,
        detail_rows: ledger.count_detail_rows()?,
        detail_events: ledger.count_detail_events()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &LedgerStatistics) {
    println!("=== Harvest Statistics ===\n");

    let total_requests: u64 = stats.requests_by_status.values().sum();
    println!("Overview:");
    println!("  Total requests tracked: {}", total_requests);
    println!("  Detail rows written: {}", stats.detail_rows);
    println!("  Events with details: {}", stats.detail_events);
    println!();

    println!("Requests by Status:");
    // Sort statuses by count (descending)
    let mut status_counts: Vec<_> = stats.requests_by_status.iter().collect();
    status_counts.sort_by(|a, b| b.1.cmp(a.1));

    for (status, count) in status_counts {
        let percentage = if total_requests > 0 {
            (*count as f64 / total_requests as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", status, count, percentage);
    }
    println!();

    if !stats.requests_by_day.is_empty() {
        println!("Requests by Day:");
        for entry in &stats.requests_by_day {
            println!("  {} {}: {}", entry.event_date, entry.status, entry.count);
        }
        println!();
    }

    // Completion rate over terminal + retryable work
    let completed = stats
        .requests_by_status
        .get(&RequestStatus::Complete)
        .copied()
        .unwrap_or(0);
    let rate = if total_requests > 0 {
        (completed as f64 / total_requests as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Completion Rate: {:.1}% ({} / {} requests complete)",
        rate, completed, total_requests
    );
}
