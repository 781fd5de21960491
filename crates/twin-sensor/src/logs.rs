//! Sensor-log persistence and discovery.
//!
//! Each sensing run writes one JSON payload carrying both raw feeds.
//! Timeline processing discovers unprocessed logs, parses them in
//! parallel, and renames each `.processed` once consumed so reruns are
//! idempotent.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use twin_core::event::{BrowserVisit, WindowFocusEvent};

/// Filename prefix for sensor logs.
const LOG_PREFIX: &str = "sensor_log_";

/// Suffix marking a consumed log.
const PROCESSED_SUFFIX: &str = "processed";

/// Sensor-log errors.
#[derive(Debug, Error)]
pub enum LogError {
    /// IO error reading or writing a log file.
    #[error("IO error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Failed to serialize a payload.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One sensing run's raw capture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SensorLog {
    /// When the run happened (RFC 3339).
    pub date: String,
    #[serde(default)]
    pub browser_history: Vec<BrowserVisit>,
    #[serde(default)]
    pub window_activity: Vec<WindowFocusEvent>,
}

/// Write a sensor log into the logs directory, named by capture time.
pub fn save(dir: &Path, log: &SensorLog, captured_at: DateTime<Utc>) -> Result<PathBuf, LogError> {
    std::fs::create_dir_all(dir).map_err(|source| LogError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let filename = format!("{LOG_PREFIX}{}.json", captured_at.format("%Y%m%d_%H%M%S"));
    let path = dir.join(filename);
    let payload = serde_json::to_string_pretty(log)?;
    std::fs::write(&path, payload).map_err(|source| LogError::Io {
        path: path.clone(),
        source,
    })?;

    tracing::info!(path = %path.display(), "saved sensor log");
    Ok(path)
}

/// List unprocessed sensor logs, oldest first.
pub fn discover(dir: &Path) -> Result<Vec<PathBuf>, LogError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(LogError::Io {
                path: dir.to_path_buf(),
                source,
            });
        }
    };

    let mut logs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(LOG_PREFIX))
                && p.extension().and_then(|e| e.to_str()) == Some("json")
        })
        .collect();
    logs.sort();
    Ok(logs)
}

/// Parse discovered logs in parallel.
///
/// Malformed logs are skipped with a warning; one bad capture must not
/// block the rest of the backlog.
#[must_use]
pub fn load_all(paths: &[PathBuf]) -> Vec<(PathBuf, SensorLog)> {
    let mut loaded: Vec<(PathBuf, SensorLog)> = paths
        .par_iter()
        .filter_map(|path| match load(path) {
            Ok(log) => Some((path.clone(), log)),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "skipping unreadable sensor log");
                None
            }
        })
        .collect();
    loaded.sort_by(|(a, _), (b, _)| a.cmp(b));
    loaded
}

fn load(path: &Path) -> Result<SensorLog, LogError> {
    let raw = std::fs::read_to_string(path).map_err(|source| LogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}

/// Rename a consumed log so it is not discovered again.
pub fn mark_processed(path: &Path) -> Result<PathBuf, LogError> {
    let mut renamed = path.as_os_str().to_os_string();
    renamed.push(".");
    renamed.push(PROCESSED_SUFFIX);
    let renamed = PathBuf::from(renamed);

    std::fs::rename(path, &renamed).map_err(|source| LogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(renamed)
}
