//! Timeline command: run the full pipeline over pending sensor logs.
//!
//! Each log flows through fusion → sessionization → categorization →
//! smoothing and is rendered for the summarization consumer. One
//! categorizer instance serves the whole invocation, so an unmatched
//! (app, title) pair reaches the audit file at most once per run.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use twin_core::categorize::{Categorizer, UncategorizedPair};
use twin_core::fuse::{FuseConfig, fuse};
use twin_core::sessionize::{SessionizeConfig, sessionize};
use twin_core::smooth::{SmoothConfig, smooth};
use twin_core::timeline::{TimelineEntry, render};
use twin_sensor::logs::{self, SensorLog};

use super::util::truncate;
use crate::Config;

/// One processed sensor log's rendered timeline.
#[derive(Debug, Serialize)]
pub struct TimelineReport {
    pub log: String,
    pub date: String,
    pub entries: Vec<TimelineEntry>,
}

pub fn run(config: &Config, json: bool, keep: bool) -> Result<()> {
    let rules = config.load_rules().context("failed to load category rules")?;
    let paths = logs::discover(&config.logs_dir()).context("failed to list sensor logs")?;
    if paths.is_empty() {
        println!("No pending sensor logs.");
        return Ok(());
    }

    let loaded = logs::load_all(&paths);
    let mut categorizer = Categorizer::new(rules);
    let mut reports = Vec::with_capacity(loaded.len());
    let mut processed: Vec<PathBuf> = Vec::new();

    for (path, log) in &loaded {
        let entries = process_log(log, config, &mut categorizer);
        reports.push(TimelineReport {
            log: path.display().to_string(),
            date: log_date(log),
            entries,
        });
        processed.push(path.clone());
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&reports).context("failed to serialize timeline")?
        );
    } else {
        for report in &reports {
            print_report(report);
        }
    }

    append_audit(&config.audit_path(), &categorizer.take_unmatched())
        .context("failed to write uncategorized audit log")?;

    if !keep {
        for path in processed {
            logs::mark_processed(&path)
                .with_context(|| format!("failed to mark {} processed", path.display()))?;
        }
    }

    Ok(())
}

/// Run one sensor log through the whole pipeline.
pub(crate) fn process_log(
    log: &SensorLog,
    config: &Config,
    categorizer: &mut Categorizer,
) -> Vec<TimelineEntry> {
    let fused = fuse(&log.browser_history, &log.window_activity, &FuseConfig::default());
    let sessions = sessionize(
        &fused,
        &SessionizeConfig {
            gap_threshold_secs: config.gap_threshold_secs,
        },
    );
    let blocks: Vec<_> = sessions
        .into_iter()
        .map(|s| categorizer.categorize(s))
        .collect();
    let smoothed = smooth(
        blocks,
        &SmoothConfig {
            noise_threshold_secs: config.noise_threshold_secs,
            ..SmoothConfig::default()
        },
    );
    render(&smoothed, config.min_render_secs)
}

/// The capture day (`YYYY-MM-DD`) of a sensor log.
pub(crate) fn log_date(log: &SensorLog) -> String {
    log.date.get(..10).unwrap_or(&log.date).to_string()
}

/// Append unmatched pairs to the audit file, one tab-separated line each.
pub(crate) fn append_audit(path: &Path, pairs: &[UncategorizedPair]) -> Result<()> {
    if pairs.is_empty() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    for pair in pairs {
        writeln!(file, "{}\t{}", pair.app, pair.title)?;
    }

    tracing::info!(count = pairs.len(), path = %path.display(), "recorded uncategorized pairs");
    Ok(())
}

fn print_report(report: &TimelineReport) {
    println!("{} — {} blocks", report.date, report.entries.len());
    for entry in &report.entries {
        println!("  {}", format_entry(entry));
    }
    println!();
}

fn format_entry(entry: &TimelineEntry) -> String {
    let minutes = entry.duration_secs / 60;
    format!(
        "{} {}–{} [{}/{}] {:<12} {:>4}m  {}",
        entry.icon,
        clock(&entry.start_time),
        clock(&entry.end_time),
        entry.category,
        entry.activity,
        entry.app,
        minutes,
        truncate(&entry.titles.join("; "), 60),
    )
}

/// HH:MM portion of an RFC 3339 timestamp.
fn clock(timestamp: &str) -> &str {
    timestamp.get(11..16).unwrap_or(timestamp)
}
