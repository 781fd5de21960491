//! Shared command helpers.

use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate, Utc};

/// Parse an instant from RFC 3339 or a bare `YYYY-MM-DD` day
/// (interpreted as midnight UTC).
pub fn parse_datetime(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = day.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    bail!("expected RFC 3339 or YYYY-MM-DD, got: {raw}")
}

/// Truncate a string for table display, adding "..." if shortened.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{kept}...")
}
