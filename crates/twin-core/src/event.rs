//! Raw and fused activity events.
//!
//! Raw events arrive from two independently-timestamped feeds: browser
//! history entries and window-focus events. Timestamps are kept as the
//! transport strings until fusion, where they are parsed leniently —
//! a malformed timestamp degrades to the minimum instant instead of
//! failing the pipeline.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A browser history entry captured from the local browser database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserVisit {
    /// Feed identifier (e.g. "browser").
    pub source: String,
    pub url: String,
    pub title: String,
    /// RFC 3339 instant of the last visit.
    pub timestamp: String,
}

/// A window-focus event captured from the activity watcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowFocusEvent {
    /// Application/process name (e.g. "chrome.exe").
    pub app: String,
    /// Window title at focus time.
    pub title: String,
    /// RFC 3339 instant of focus gain.
    pub timestamp: String,
    /// Focus duration in seconds (fractional).
    #[serde(default)]
    pub duration: f64,
}

/// Browsing context attached to a focus event during fusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowsingDetail {
    pub url: String,
    pub title: String,
    pub timestamp: DateTime<Utc>,
}

/// A window-focus event annotated with optional browsing context.
///
/// Created by fusion, consumed by sessionization; never mutated after
/// creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedEvent {
    pub app: String,
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub duration_secs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browsing: Option<BrowsingDetail>,
}

/// Parse an instant, normalizing to UTC.
///
/// Accepts RFC 3339 with any offset, or a naive datetime treated as UTC.
/// Anything else degrades to [`DateTime::<Utc>::MIN_UTC`] so the event
/// sorts as "unknown/oldest" rather than aborting the run.
pub fn parse_instant(raw: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.and_utc();
    }
    tracing::warn!(timestamp = %raw, "unparseable timestamp, sorting as oldest");
    DateTime::<Utc>::MIN_UTC
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_instant_normalizes_offset() {
        let jst = parse_instant("2026-01-15T09:00:00+09:00");
        let utc = parse_instant("2026-01-15T00:00:00Z");
        assert_eq!(jst, utc);
    }

    #[test]
    fn parse_instant_accepts_naive_as_utc() {
        let naive = parse_instant("2026-01-15T00:00:00.500");
        let explicit = parse_instant("2026-01-15T00:00:00.500Z");
        assert_eq!(naive, explicit);
    }

    #[test]
    fn parse_instant_degrades_to_oldest() {
        assert_eq!(parse_instant("not-a-date"), DateTime::<Utc>::MIN_UTC);
        assert_eq!(parse_instant(""), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn focus_event_missing_duration_defaults_to_zero() {
        let json = r#"{"app":"chrome","title":"docs","timestamp":"2026-01-15T00:00:00Z"}"#;
        let event: WindowFocusEvent = serde_json::from_str(json).unwrap();
        assert!(event.duration.abs() < f64::EPSILON);
    }

    #[test]
    fn fused_event_serde_roundtrip() {
        let event = FusedEvent {
            app: "chrome".into(),
            title: "sqlite3 — DB-API".into(),
            timestamp: parse_instant("2026-01-15T09:00:05Z"),
            duration_secs: 235.0,
            browsing: Some(BrowsingDetail {
                url: "https://docs.python.org/3/library/sqlite3.html".into(),
                title: "sqlite3 — DB-API".into(),
                timestamp: parse_instant("2026-01-15T09:00:00Z"),
            }),
        };

        let json = serde_json::to_string(&event).unwrap();
        let parsed: FusedEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
