//! Sense command: capture raw telemetry into a sensor log.
//!
//! Both feeds degrade independently — an unreachable watcher or a
//! locked history database yields an empty feed with a warning, and the
//! run saves whatever was captured.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};

use twin_core::sanitize::Sanitizer;
use twin_sensor::logs::{self, SensorLog};
use twin_sensor::{AwClient, history};

use crate::Config;

pub fn run(config: &Config, hours: u32, dry_run: bool) -> Result<()> {
    let sanitizer = Sanitizer::new(&config.privacy);
    let end = Utc::now();
    let start = end - Duration::hours(i64::from(hours));

    // The data dir doubles as scratch space for the history shadow copy.
    std::fs::create_dir_all(&config.data_dir).context("failed to create data directory")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let window_activity = match AwClient::new(&config.watcher_url) {
        Ok(client) => runtime
            .block_on(client.fetch_window_events(start, end, &sanitizer))
            .unwrap_or_else(|error| {
                tracing::warn!(%error, "window watcher unavailable, continuing without focus events");
                Vec::new()
            }),
        Err(error) => {
            tracing::warn!(%error, "invalid watcher configuration, continuing without focus events");
            Vec::new()
        }
    };

    let browser_history = history::default_history_path().map_or_else(
        || {
            tracing::warn!("no browser history database found");
            Vec::new()
        },
        |path| {
            history::extract_history(&path, &config.data_dir, start, &sanitizer).unwrap_or_else(
                |error| {
                    tracing::warn!(%error, "browser history extraction failed, continuing without visits");
                    Vec::new()
                },
            )
        },
    );

    println!(
        "Captured {} window events and {} browser visits over the last {hours}h.",
        window_activity.len(),
        browser_history.len()
    );

    let log = SensorLog {
        date: end.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        browser_history,
        window_activity,
    };

    if dry_run {
        println!("Dry run: not saving a sensor log.");
    } else {
        let path = logs::save(&config.logs_dir(), &log, end).context("failed to save sensor log")?;
        println!("Saved {}", path.display());
    }

    Ok(())
}
