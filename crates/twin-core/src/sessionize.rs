//! Session collapse.
//!
//! Folds the fused event sequence into contiguous per-application
//! sessions, merging events separated by small time gaps. Session
//! duration is the sum of contributing event durations, not the
//! start/end span — focus within a session is intermittent and the
//! span would overstate idle time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::event::FusedEvent;

/// Configuration for sessionization.
#[derive(Debug, Clone)]
pub struct SessionizeConfig {
    /// Maximum gap in seconds between events of the same app for them to
    /// fold into one session. Default: 300 (5 minutes).
    pub gap_threshold_secs: i64,
}

impl Default for SessionizeConfig {
    fn default() -> Self {
        Self {
            gap_threshold_secs: 300,
        }
    }
}

/// A contiguous run of activity in one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub app: String,
    /// Distinct window titles seen, in first-seen order.
    pub titles: Vec<String>,
    /// Distinct URLs from attached browsing context, in first-seen order.
    pub urls: Vec<String>,
    /// Accumulated focus seconds (sum of event durations, not the span).
    pub duration_secs: f64,
    pub event_count: usize,
}

impl Session {
    fn open(event: &FusedEvent) -> Self {
        let mut session = Self {
            start_time: event.timestamp,
            end_time: event.timestamp + secs_to_duration(event.duration_secs),
            app: event.app.clone(),
            titles: Vec::new(),
            urls: Vec::new(),
            duration_secs: event.duration_secs.max(0.0),
            event_count: 1,
        };
        session.absorb_content(event);
        session
    }

    fn extend(&mut self, event: &FusedEvent) {
        let event_end = event.timestamp + secs_to_duration(event.duration_secs);
        self.end_time = self.end_time.max(event_end);
        self.duration_secs += event.duration_secs.max(0.0);
        self.event_count += 1;
        self.absorb_content(event);
    }

    fn absorb_content(&mut self, event: &FusedEvent) {
        let title = event.title.trim();
        if !title.is_empty() && !self.titles.iter().any(|t| t == title) {
            self.titles.push(title.to_string());
        }
        if let Some(browsing) = &event.browsing {
            if !browsing.url.is_empty() && !self.urls.iter().any(|u| u == &browsing.url) {
                self.urls.push(browsing.url.clone());
            }
        }
    }
}

/// Collapse a chronological fused sequence into sessions.
///
/// A single left-to-right scan: an event folds into the open session iff
/// it is for the same app and starts less than the gap threshold after
/// the session's current end (overlapping events count as zero gap).
/// Anything else seals the open session and starts a new one.
pub fn sessionize(fused: &[FusedEvent], config: &SessionizeConfig) -> Vec<Session> {
    let mut sessions = Vec::new();
    let mut current: Option<Session> = None;

    for event in fused {
        let mergeable = current.as_ref().is_some_and(|session| {
            let gap_secs = (event.timestamp - session.end_time).num_seconds();
            event.app == session.app && gap_secs < config.gap_threshold_secs
        });

        if mergeable {
            if let Some(session) = current.as_mut() {
                session.extend(event);
            }
        } else {
            // Seal the open session and start a new one from this event.
            sessions.extend(current.take());
            current = Some(Session::open(event));
        }
    }

    sessions.extend(current);

    tracing::debug!(
        events = fused.len(),
        sessions = sessions.len(),
        "collapsed fused events into sessions"
    );

    sessions
}

/// Convert fractional seconds to a duration, clamping negatives to zero.
fn secs_to_duration(secs: f64) -> Duration {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "event durations are bounded well below i64 milliseconds"
    )]
    let millis = (secs.max(0.0) * 1000.0) as i64;
    Duration::milliseconds(millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{BrowsingDetail, parse_instant};

    fn event(app: &str, title: &str, timestamp: &str, duration: f64) -> FusedEvent {
        FusedEvent {
            app: app.into(),
            title: title.into(),
            timestamp: parse_instant(timestamp),
            duration_secs: duration,
            browsing: None,
        }
    }

    fn with_url(mut e: FusedEvent, url: &str) -> FusedEvent {
        e.browsing = Some(BrowsingDetail {
            url: url.into(),
            title: e.title.clone(),
            timestamp: e.timestamp,
        });
        e
    }

    #[test]
    fn same_app_within_gap_collapses_to_one_session() {
        let fused = vec![
            event("chrome", "docs", "2026-01-15T09:00:00Z", 60.0),
            event("chrome", "issues", "2026-01-15T09:03:00Z", 120.0),
        ];

        let sessions = sessionize(&fused, &SessionizeConfig::default());
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].event_count, 2);
        assert_eq!(sessions[0].titles, vec!["docs", "issues"]);
        assert!((sessions[0].duration_secs - 180.0).abs() < f64::EPSILON);
    }

    #[test]
    fn different_apps_always_split() {
        let fused = vec![
            event("chrome", "docs", "2026-01-15T09:00:00Z", 60.0),
            event("slack", "general", "2026-01-15T09:01:01Z", 30.0),
        ];

        let sessions = sessionize(&fused, &SessionizeConfig::default());
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].app, "chrome");
        assert_eq!(sessions[1].app, "slack");
    }

    #[test]
    fn gap_at_threshold_splits() {
        let fused = vec![
            event("chrome", "docs", "2026-01-15T09:00:00Z", 60.0),
            // Session end is 09:01:00; exactly 300s later is not < 300.
            event("chrome", "docs", "2026-01-15T09:06:00Z", 60.0),
        ];

        let sessions = sessionize(&fused, &SessionizeConfig::default());
        assert_eq!(sessions.len(), 2);
    }

    #[test]
    fn overlapping_events_merge_as_zero_gap() {
        let fused = vec![
            event("code", "main.rs", "2026-01-15T09:00:00Z", 600.0),
            // Starts before the previous event's end.
            event("code", "lib.rs", "2026-01-15T09:05:00Z", 120.0),
        ];

        let sessions = sessionize(&fused, &SessionizeConfig::default());
        assert_eq!(sessions.len(), 1);
        // Span ends at the later of the two event ends.
        assert_eq!(
            sessions[0].end_time,
            parse_instant("2026-01-15T09:10:00Z")
        );
        assert!((sessions[0].duration_secs - 720.0).abs() < f64::EPSILON);
    }

    #[test]
    fn titles_and_urls_deduplicate() {
        let fused = vec![
            with_url(
                event("chrome", "docs", "2026-01-15T09:00:00Z", 60.0),
                "https://docs.example",
            ),
            with_url(
                event("chrome", "docs", "2026-01-15T09:02:00Z", 60.0),
                "https://docs.example",
            ),
        ];

        let sessions = sessionize(&fused, &SessionizeConfig::default());
        assert_eq!(sessions[0].titles, vec!["docs"]);
        assert_eq!(sessions[0].urls, vec!["https://docs.example"]);
    }

    #[test]
    fn urls_empty_without_browsing_context() {
        let fused = vec![event("code", "main.rs", "2026-01-15T09:00:00Z", 60.0)];
        let sessions = sessionize(&fused, &SessionizeConfig::default());
        assert!(sessions[0].urls.is_empty());
        assert_eq!(sessions[0].event_count, 1);
    }

    #[test]
    fn empty_input_yields_no_sessions() {
        assert!(sessionize(&[], &SessionizeConfig::default()).is_empty());
    }

    #[test]
    fn sandwiched_app_switch_produces_three_sessions() {
        let fused = vec![
            event("chrome", "docs", "2026-01-15T09:00:05Z", 235.0),
            event("slack", "general", "2026-01-15T09:04:02Z", 2.0),
            event("chrome", "docs", "2026-01-15T09:04:05Z", 355.0),
        ];

        let sessions = sessionize(&fused, &SessionizeConfig::default());
        assert_eq!(sessions.len(), 3);
        assert_eq!(sessions[0].app, "chrome");
        assert_eq!(sessions[1].app, "slack");
        assert_eq!(sessions[2].app, "chrome");
    }
}
