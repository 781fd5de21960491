//! ActivityWatch window-event client.
//!
//! Talks to a local ActivityWatch server (`aw-watcher-window`). Bucket
//! names vary by hostname, so the client discovers the window bucket by
//! substring before fetching events.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use thiserror::Error;

use twin_core::event::WindowFocusEvent;
use twin_core::sanitize::Sanitizer;

/// Default request timeout for watcher calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Bucket-name fragment identifying the window watcher.
const WINDOW_BUCKET_FRAGMENT: &str = "aw-watcher-window";

/// ActivityWatch client errors.
#[derive(Debug, Error)]
pub enum AwError {
    /// The base URL was empty.
    #[error("watcher URL cannot be empty")]
    EmptyUrl,
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("watcher request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// One raw event from the window watcher.
#[derive(Debug, Deserialize)]
struct AwEvent {
    timestamp: String,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    data: AwEventData,
}

#[derive(Debug, Default, Deserialize)]
struct AwEventData {
    #[serde(default)]
    app: String,
    #[serde(default)]
    title: String,
}

/// ActivityWatch HTTP client.
#[derive(Debug, Clone)]
pub struct AwClient {
    http: reqwest::Client,
    base_url: String,
}

impl AwClient {
    /// Creates a client for the given server URL (e.g.
    /// `http://localhost:5600`).
    pub fn new(base_url: impl Into<String>) -> Result<Self, AwError> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(AwError::EmptyUrl);
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(AwError::ClientBuild)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch window-focus events for the given time range.
    ///
    /// A missing window bucket is not an error: the watcher may simply
    /// not be running on this machine, so the result is an empty feed
    /// with a warning. Titles are sanitized before leaving this crate.
    pub async fn fetch_window_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        sanitizer: &Sanitizer,
    ) -> Result<Vec<WindowFocusEvent>, AwError> {
        let Some(bucket) = self.find_window_bucket().await? else {
            tracing::warn!("no {WINDOW_BUCKET_FRAGMENT} bucket found");
            return Ok(Vec::new());
        };

        let url = format!("{}/api/0/buckets/{bucket}/events", self.base_url);
        let events: Vec<AwEvent> = self
            .http
            .get(&url)
            .query(&[
                ("start", start.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ("end", end.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        tracing::debug!(bucket = %bucket, count = events.len(), "fetched window events");

        Ok(events
            .into_iter()
            .map(|e| WindowFocusEvent {
                app: e.data.app,
                title: sanitizer.sanitize_text(&e.data.title),
                timestamp: e.timestamp,
                duration: e.duration,
            })
            .collect())
    }

    /// Locate the window-watcher bucket by name fragment.
    async fn find_window_bucket(&self) -> Result<Option<String>, AwError> {
        let url = format!("{}/api/0/buckets", self.base_url);
        let buckets: HashMap<String, serde_json::Value> =
            self.http.get(&url).send().await?.error_for_status()?.json().await?;

        let mut names: Vec<String> = buckets
            .into_keys()
            .filter(|name| name.contains(WINDOW_BUCKET_FRAGMENT))
            .collect();
        // Bucket maps are unordered; pick deterministically.
        names.sort();
        Ok(names.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_rejects_empty_url() {
        assert!(matches!(AwClient::new(""), Err(AwError::EmptyUrl)));
        assert!(matches!(AwClient::new("   "), Err(AwError::EmptyUrl)));
    }

    #[test]
    fn client_strips_trailing_slash() {
        let client = AwClient::new("http://localhost:5600/").unwrap();
        assert_eq!(client.base_url, "http://localhost:5600");
    }

    #[test]
    fn aw_event_parses_with_missing_fields() {
        let json = r#"{"timestamp":"2026-01-15T09:00:00Z"}"#;
        let event: AwEvent = serde_json::from_str(json).unwrap();
        assert!(event.duration.abs() < f64::EPSILON);
        assert!(event.data.app.is_empty());
    }

    #[test]
    fn aw_event_parses_full_payload() {
        let json = r#"{
            "timestamp": "2026-01-15T09:00:00.123+00:00",
            "duration": 42.5,
            "data": {"app": "chrome.exe", "title": "docs"}
        }"#;
        let event: AwEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.data.app, "chrome.exe");
        assert!((event.duration - 42.5).abs() < f64::EPSILON);
    }
}
