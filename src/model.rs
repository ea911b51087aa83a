//! Data model for extracted event details

use chrono::NaiveDate;

/// One structured result row extracted from an event detail page.
///
/// The harvest core treats these rows as opaque beyond counting and appending
/// them to the detail sink; the fields exist for the downstream transforms
/// that build the dimensional tables.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    /// Stable event identifier from the source site
    pub event_id: i64,

    /// Event name as shown on the detail page
    pub event_name: String,

    /// Tier label (e.g., "A", "B/C"), if published
    pub tier: Option<String>,

    /// Venue location, if published
    pub location: Option<String>,

    /// First day of the event
    pub start_date: Option<NaiveDate>,

    /// Last day of the event
    pub end_date: Option<NaiveDate>,

    /// Division label (e.g., "MPO", "FPO")
    pub division: String,

    /// Finishing place within the division
    pub place: Option<u32>,

    /// Player display name
    pub player_name: String,

    /// Player membership number, if listed
    pub player_number: Option<i64>,

    /// Player rating at event time, if listed
    pub player_rating: Option<u32>,

    /// Total score across all rounds, if listed
    pub total_score: Option<i32>,

    /// The observation date of the run that extracted this row
    pub event_date: NaiveDate,
}
