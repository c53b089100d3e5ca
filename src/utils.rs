//! Utility functions for the region matchmaker

use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

/// Generate a new unique client session ID
pub fn generate_session_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Whole milliseconds in a duration, saturating
pub fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Show an optional count the way the region list does ("-" when unknown)
pub fn display_count(count: Option<u32>) -> String {
    count
        .map(|c| c.to_string())
        .unwrap_or_else(|| "-".to_string())
}
