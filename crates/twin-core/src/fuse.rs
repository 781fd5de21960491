//! Browser/window stream fusion.
//!
//! Merges two independently-timestamped feeds — browser visits and
//! window-focus events — into one chronological sequence of
//! [`FusedEvent`]s, attaching browsing context to focus events on
//! recognized browsers whose titles correlate with a previously seen
//! visit.
//!
//! # Algorithm
//!
//! 1. Stable-sort both feeds by parsed timestamp (malformed sorts as
//!    oldest, ties keep arrival order)
//! 2. Merge-walk in time order, keeping a title cache: normalized visit
//!    title → most recent visit (last-write-wins)
//! 3. Emit every focus event; for browser apps, attach the cached visit
//!    whose title matches exactly, else the best fuzzy substring match
//!
//! Fusion never fails: it emits exactly one fused event per focus event
//! regardless of input quality.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::event::{BrowserVisit, BrowsingDetail, FusedEvent, WindowFocusEvent, parse_instant};

/// Process names treated as browsers (case-insensitive substring match).
const BROWSER_APPS: &[&str] = &[
    "chrome", "chromium", "firefox", "msedge", "edge", "brave", "safari", "opera", "vivaldi",
    "arc",
];

/// Configuration for stream fusion.
#[derive(Debug, Clone)]
pub struct FuseConfig {
    /// Process-name fragments identifying browser apps.
    pub browser_apps: Vec<String>,
}

impl Default for FuseConfig {
    fn default() -> Self {
        Self {
            browser_apps: BROWSER_APPS.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl FuseConfig {
    fn is_browser(&self, app: &str) -> bool {
        let app = app.to_lowercase();
        self.browser_apps
            .iter()
            .any(|b| !b.is_empty() && app.contains(&b.to_lowercase()))
    }
}

/// A cached visit keyed by normalized title.
#[derive(Debug, Clone)]
struct CachedVisit {
    url: String,
    title: String,
    timestamp: DateTime<Utc>,
}

/// Fuse browser visits and window-focus events into one annotated sequence.
///
/// Output is chronological by focus-event timestamp. Each focus event on a
/// recognized browser is annotated with the most recent correlating visit,
/// if any; non-browser apps never receive browsing context.
pub fn fuse(
    history: &[BrowserVisit],
    focus: &[WindowFocusEvent],
    config: &FuseConfig,
) -> Vec<FusedEvent> {
    let mut visits: Vec<(DateTime<Utc>, &BrowserVisit)> = history
        .iter()
        .map(|v| (parse_instant(&v.timestamp), v))
        .collect();
    visits.sort_by_key(|(ts, _)| *ts);

    let mut focuses: Vec<(DateTime<Utc>, &WindowFocusEvent)> = focus
        .iter()
        .map(|e| (parse_instant(&e.timestamp), e))
        .collect();
    focuses.sort_by_key(|(ts, _)| *ts);

    let mut cache: HashMap<String, CachedVisit> = HashMap::new();
    let mut fused = Vec::with_capacity(focuses.len());
    let mut next_visit = 0;

    for (ts, event) in focuses {
        // Drain visits up to and including this instant so a visit sharing
        // the focus timestamp can still correlate.
        while let Some((visit_ts, visit)) = visits.get(next_visit).copied() {
            if visit_ts > ts {
                break;
            }
            let key = normalize_title(&visit.title);
            if !key.is_empty() {
                cache.insert(
                    key,
                    CachedVisit {
                        url: visit.url.clone(),
                        title: visit.title.clone(),
                        timestamp: visit_ts,
                    },
                );
            }
            next_visit += 1;
        }

        let browsing = if config.is_browser(&event.app) {
            lookup(&cache, &event.title)
        } else {
            None
        };

        fused.push(FusedEvent {
            app: event.app.clone(),
            title: event.title.clone(),
            timestamp: ts,
            duration_secs: event.duration,
            browsing,
        });
    }

    tracing::debug!(
        visits = history.len(),
        focus_events = focus.len(),
        annotated = fused.iter().filter(|e| e.browsing.is_some()).count(),
        "fused activity streams"
    );

    fused
}

/// Find the cached visit correlating with a focus title.
///
/// Exact match on the normalized title wins. Otherwise the fuzzy rule
/// accepts any cache entry whose normalized title contains, or is
/// contained in, the focus title; among those the longest entry title
/// wins, ties broken lexicographically, so the result is stable across
/// runs despite the unordered cache.
fn lookup(cache: &HashMap<String, CachedVisit>, title: &str) -> Option<BrowsingDetail> {
    let key = normalize_title(title);
    if key.is_empty() {
        return None;
    }

    if let Some(visit) = cache.get(&key) {
        return Some(detail(visit));
    }

    let mut best: Option<&str> = None;
    for entry_key in cache.keys() {
        if entry_key.contains(&key) || key.contains(entry_key.as_str()) {
            let better = best.is_none_or(|b| {
                entry_key.len() > b.len() || (entry_key.len() == b.len() && entry_key.as_str() < b)
            });
            if better {
                best = Some(entry_key);
            }
        }
    }

    best.map(|k| detail(&cache[k]))
}

fn detail(visit: &CachedVisit) -> BrowsingDetail {
    BrowsingDetail {
        url: visit.url.clone(),
        title: visit.title.clone(),
        timestamp: visit.timestamp,
    }
}

fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}
