//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Tour-Harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Per-event request ledger; the sole coordination state across runs
CREATE TABLE IF NOT EXISTS event_requests (
    event_id INTEGER NOT NULL,
    event_date TEXT NOT NULL,
    status TEXT NOT NULL,
    retry_date TEXT,
    requested_at TEXT NOT NULL,
    PRIMARY KEY (event_id, event_date)
);

CREATE INDEX IF NOT EXISTS idx_event_requests_status ON event_requests(status);
CREATE INDEX IF NOT EXISTS idx_event_requests_retry ON event_requests(retry_date);

-- Append-only detail sink consumed by downstream transforms
CREATE TABLE IF NOT EXISTS event_details (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    event_id INTEGER NOT NULL,
    event_name TEXT NOT NULL,
    tier TEXT,
    location TEXT,
    start_date TEXT,
    end_date TEXT,
    division TEXT NOT NULL,
    place INTEGER,
    player_name TEXT NOT NULL,
    player_number INTEGER,
    player_rating INTEGER,
    total_score INTEGER,
    event_date TEXT NOT NULL,
    loaded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_event_details_event ON event_details(event_id);
CREATE INDEX IF NOT EXISTS idx_event_details_date ON event_details(event_date);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
