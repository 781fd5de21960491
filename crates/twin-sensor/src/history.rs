//! Browser-history extraction.
//!
//! The browser keeps its history in a SQLite database that is locked
//! while the browser runs, so extraction shadow-copies the file first,
//! retrying with backoff on sharing violations, then queries the copy.
//! Chromium stores visit times in WebKit format: microseconds since
//! 1601-01-01 UTC.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use thiserror::Error;

use twin_core::event::BrowserVisit;
use twin_core::sanitize::Sanitizer;

/// Seconds between the WebKit epoch (1601-01-01) and the unix epoch.
const WEBKIT_EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

/// Rows fetched from the history table before the time cutoff applies.
const HISTORY_FETCH_LIMIT: u32 = 1000;

/// Shadow-copy retry attempts and initial backoff.
const COPY_ATTEMPTS: u32 = 3;
const COPY_BACKOFF: Duration = Duration::from_secs(1);

/// Browser-history extraction errors.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The history file could not be copied after retries.
    #[error("failed to copy history database {path}: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Locate the default browser history database, Chrome before Edge.
#[must_use]
pub fn default_history_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;

    let candidates = [
        // Windows
        home.join("AppData/Local/Google/Chrome/User Data/Default/History"),
        home.join("AppData/Local/Microsoft/Edge/User Data/Default/History"),
        // Linux
        home.join(".config/google-chrome/Default/History"),
        home.join(".config/chromium/Default/History"),
        // macOS
        home.join("Library/Application Support/Google/Chrome/Default/History"),
    ];

    candidates.into_iter().find(|p| p.exists())
}

/// Extract recent browser visits from a history database.
///
/// Visits older than the cutoff are skipped, blocked domains are
/// dropped, and titles are sanitized. The shadow copy is removed before
/// returning.
pub fn extract_history(
    history_db: &Path,
    shadow_dir: &Path,
    cutoff: DateTime<Utc>,
    sanitizer: &Sanitizer,
) -> Result<Vec<BrowserVisit>, HistoryError> {
    let shadow = shadow_dir.join("temp_history.sqlite");
    shadow_copy(history_db, &shadow)?;

    let result = query_visits(&shadow, cutoff, sanitizer);

    if let Err(error) = std::fs::remove_file(&shadow) {
        tracing::debug!(path = %shadow.display(), %error, "failed to remove shadow copy");
    }

    result
}

/// Copy the possibly-locked history file, retrying with backoff.
fn shadow_copy(src: &Path, dest: &Path) -> Result<(), HistoryError> {
    let mut backoff = COPY_BACKOFF;
    let mut last_error = None;

    for attempt in 1..=COPY_ATTEMPTS {
        match std::fs::copy(src, dest) {
            Ok(_) => return Ok(()),
            Err(error) => {
                tracing::warn!(
                    path = %src.display(),
                    attempt,
                    %error,
                    "history file copy failed, retrying"
                );
                last_error = Some(error);
                if attempt < COPY_ATTEMPTS {
                    std::thread::sleep(backoff);
                    backoff *= 2;
                }
            }
        }
    }

    Err(HistoryError::Copy {
        path: src.to_path_buf(),
        source: last_error.unwrap_or_else(|| std::io::Error::other("copy failed")),
    })
}

fn query_visits(
    db_path: &Path,
    cutoff: DateTime<Utc>,
    sanitizer: &Sanitizer,
) -> Result<Vec<BrowserVisit>, HistoryError> {
    let conn = Connection::open(db_path)?;
    let mut stmt = conn.prepare(
        "SELECT url, title, last_visit_time
         FROM urls
         ORDER BY last_visit_time DESC
         LIMIT ?1",
    )?;

    let rows = stmt.query_map([HISTORY_FETCH_LIMIT], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
        ))
    })?;

    let mut visits = Vec::new();
    for row in rows {
        let (url, title, last_visit_time) = row?;
        let timestamp = webkit_to_utc(last_visit_time);

        if timestamp < cutoff {
            continue;
        }
        if sanitizer.is_domain_blocked(&url) {
            continue;
        }

        visits.push(BrowserVisit {
            source: "browser".to_string(),
            url,
            title: sanitizer.sanitize_text(&title),
            timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        });
    }

    tracing::debug!(count = visits.len(), "extracted browser visits");
    Ok(visits)
}

/// Convert a WebKit timestamp (µs since 1601-01-01) to a UTC instant.
///
/// Out-of-range values degrade to the unix epoch rather than failing.
fn webkit_to_utc(webkit_micros: i64) -> DateTime<Utc> {
    let unix_micros = webkit_micros - WEBKIT_EPOCH_OFFSET_SECS * 1_000_000;
    DateTime::from_timestamp_micros(unix_micros).unwrap_or_else(|| {
        tracing::warn!(webkit_micros, "out-of-range webkit timestamp");
        DateTime::UNIX_EPOCH
    })
}
