//! Output module for ledger reports
//!
//! This module handles:
//! - Loading request and detail statistics from the ledger
//! - Printing the stats report for the CLI

pub mod stats;

pub use stats::{load_statistics, print_statistics, LedgerStatistics};
