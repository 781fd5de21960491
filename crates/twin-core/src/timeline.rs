//! Timeline output records.
//!
//! The smoothed, categorized timeline is handed to the summarization
//! consumer as flat serializable rows. Dropping blocks below the minimum
//! rendered duration is a presentation step — it happens here, never
//! before smoothing.

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::categorize::CategorizedBlock;

/// Default minimum duration for a block to appear in rendered output.
pub const DEFAULT_MIN_RENDER_SECS: f64 = 60.0;

/// One rendered timeline row — the contract the summarization consumer
/// depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub start_time: String,
    pub end_time: String,
    pub app: String,
    pub titles: Vec<String>,
    pub urls: Vec<String>,
    /// Accumulated focus seconds, rounded to whole seconds. Serialized
    /// as `duration` — the consumer contract's field name.
    #[serde(rename = "duration")]
    pub duration_secs: i64,
    pub category: String,
    pub activity: String,
    pub icon: String,
}

impl TimelineEntry {
    /// Flatten a categorized block into an output row.
    #[must_use]
    pub fn from_block(block: &CategorizedBlock) -> Self {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "accumulated focus seconds are bounded far below i64"
        )]
        let duration_secs = block.session.duration_secs.round() as i64;
        Self {
            start_time: block
                .session
                .start_time
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            end_time: block
                .session
                .end_time
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            app: block.session.app.clone(),
            titles: block.session.titles.clone(),
            urls: block.session.urls.clone(),
            duration_secs,
            category: block.category.clone(),
            activity: block.activity.clone(),
            icon: block.icon.clone(),
        }
    }
}

/// Render blocks as output rows, filtering those below the minimum
/// rendered duration.
#[must_use]
pub fn render(blocks: &[CategorizedBlock], min_render_secs: f64) -> Vec<TimelineEntry> {
    blocks
        .iter()
        .filter(|b| b.session.duration_secs >= min_render_secs)
        .map(TimelineEntry::from_block)
        .collect()
}
