//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Personal digital twin.
///
/// Passively senses activity telemetry, compresses it into a categorized
/// timeline, journals each day with an LLM, and keeps a recency-aware
/// long-term memory for recall.
#[derive(Debug, Parser)]
#[command(name = "twin", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Capture window activity and browser history into a sensor log.
    Sense {
        /// Hours of history to capture.
        #[arg(long, default_value_t = 24)]
        hours: u32,

        /// Capture and report without saving a log.
        #[arg(long)]
        dry_run: bool,
    },

    /// Process pending sensor logs into categorized timelines.
    Timeline {
        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,

        /// Leave processed logs in place for reprocessing.
        #[arg(long)]
        keep: bool,
    },

    /// Generate daily journals from pending sensor logs.
    Journal {
        /// Skip memory-store ingestion of extracted facts.
        #[arg(long)]
        no_ingest: bool,
    },

    /// Query the long-term memory with recency-aware ranking.
    Recall {
        /// Query text.
        query: String,

        /// Number of results.
        #[arg(short = 'k', long, default_value_t = 5)]
        top: usize,

        /// Only recall events strictly before this instant
        /// (RFC 3339 or YYYY-MM-DD).
        #[arg(long)]
        before: Option<String>,

        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Show the loaded categorization rules.
    Rules {
        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}
