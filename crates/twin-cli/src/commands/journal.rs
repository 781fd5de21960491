//! Journal command: summarize pending sensor logs into daily journals.
//!
//! Each log is rendered through the timeline pipeline, handed to the
//! LLM for a first-person narrative plus extracted facts, written as a
//! frontmattered markdown file, and its facts ingested into long-term
//! memory. Memory-store failures degrade to a warning — the journal on
//! disk is the source of truth.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use twin_core::categorize::Categorizer;
use twin_llm::DailyJournal;
use twin_memory::MemoryClient;
use twin_sensor::logs;

use super::timeline::{append_audit, log_date, process_log};
use crate::Config;

pub fn run(config: &Config, no_ingest: bool) -> Result<()> {
    let rules = config.load_rules().context("failed to load category rules")?;
    let paths = logs::discover(&config.logs_dir()).context("failed to list sensor logs")?;
    if paths.is_empty() {
        println!("No pending sensor logs.");
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let llm = twin_llm::Client::new(
        &config.ollama_url,
        &config.ollama_model,
        config.context_limit,
    )
    .context("failed to build LLM client")?;

    let memory = if no_ingest {
        None
    } else {
        match runtime.block_on(MemoryClient::connect(
            &config.memory_url,
            &config.memory_collection,
        )) {
            Ok(client) => Some(client),
            Err(error) => {
                tracing::warn!(%error, "memory store unavailable, facts will not be ingested");
                None
            }
        }
    };

    let loaded = logs::load_all(&paths);
    let mut categorizer = Categorizer::new(rules);

    for (path, log) in &loaded {
        let date = log_date(log);
        let entries = process_log(log, config, &mut categorizer);
        if entries.is_empty() {
            tracing::info!(log = %path.display(), "no renderable activity, skipping journal");
            logs::mark_processed(path)
                .with_context(|| format!("failed to mark {} processed", path.display()))?;
            continue;
        }

        let journal = runtime
            .block_on(llm.daily_journal(&date, &entries))
            .with_context(|| format!("journal generation failed for {date}"))?;

        let journal_path = write_journal(&config.journals_dir, &date, &journal)
            .with_context(|| format!("failed to write journal for {date}"))?;
        println!("Wrote {}", journal_path.display());

        if let Some(memory) = &memory {
            for fact in &journal.facts {
                if let Err(error) = runtime.block_on(memory.ingest_fact(fact, &date)) {
                    tracing::warn!(fact, %error, "fact ingestion failed");
                }
            }
        }

        logs::mark_processed(path)
            .with_context(|| format!("failed to mark {} processed", path.display()))?;
    }

    append_audit(&config.audit_path(), &categorizer.take_unmatched())
        .context("failed to write uncategorized audit log")?;

    Ok(())
}

/// Write one day's journal as frontmattered markdown.
fn write_journal(dir: &Path, date: &str, journal: &DailyJournal) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{date}_daily.md"));

    let facts = serde_json::to_string(&journal.facts)?;
    let content = format!(
        "---\ndate: {date}\ntags: [daily, digital_twin]\nfacts: {facts}\n---\n\n\
         # Daily Log: {date}\n\n{}\n",
        journal.narrative
    );
    std::fs::write(&path, content)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn journal_file_carries_frontmatter_and_narrative() {
        let temp = tempfile::tempdir().unwrap();
        let journal = DailyJournal {
            narrative: "Today I studied the sqlite3 module.".into(),
            facts: vec!["Studied sqlite3".into(), "Wrote a parser".into()],
        };

        let path = write_journal(temp.path(), "2026-01-15", &journal).unwrap();
        assert_eq!(path.file_name().unwrap().to_str().unwrap(), "2026-01-15_daily.md");

        let content = std::fs::read_to_string(&path).unwrap();
        insta::assert_snapshot!(content, @r#"
        ---
        date: 2026-01-15
        tags: [daily, digital_twin]
        facts: ["Studied sqlite3","Wrote a parser"]
        ---

        # Daily Log: 2026-01-15

        Today I studied the sqlite3 module.
        "#);
    }
}
