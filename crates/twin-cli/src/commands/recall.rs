//! Recall command: query long-term memory with recency-aware ranking.

use anyhow::{Context, Result};
use chrono::Utc;

use twin_memory::MemoryClient;

use super::util::{parse_datetime, truncate};
use crate::Config;

pub fn run(
    config: &Config,
    query: &str,
    top: usize,
    before: Option<&str>,
    json: bool,
) -> Result<()> {
    let cutoff = before
        .map(parse_datetime)
        .transpose()
        .context("invalid --before value")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let ranked = runtime.block_on(async {
        let client = MemoryClient::connect(&config.memory_url, &config.memory_collection)
            .await
            .context("failed to connect to memory store")?;
        client
            .recall(query, top, cutoff, Utc::now(), config.decay_rate)
            .await
            .context("recall query failed")
    })?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&ranked).context("failed to serialize results")?
        );
        return Ok(());
    }

    if ranked.is_empty() {
        println!("No memories matched.");
        return Ok(());
    }

    println!("{:<8} {:<8} {:<12} MEMORY", "SCORE", "BASE", "DATE");
    for item in &ranked {
        println!(
            "{:<8.4} {:<8.4} {:<12} {}",
            item.score,
            item.base_score,
            item.candidate.metadata.date.as_deref().unwrap_or("-"),
            truncate(&item.candidate.content, 70),
        );
    }

    Ok(())
}
