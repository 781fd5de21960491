//! Timeline smoothing.
//!
//! Post-processes categorized blocks with a single left-to-right scan:
//! adjacent blocks with identical classification merge, and very short
//! "noise" blocks interrupting focused work are absorbed into the
//! preceding work block instead of fragmenting it. Absorption folds the
//! interruption's span and duration into the work block but not its
//! titles or URLs — the interruption's content does not belong to the
//! focused activity.
//!
//! Blocks below the minimum rendered duration are filtered at
//! presentation time only (see [`crate::timeline`]); they always
//! participate in the merge/absorption pass.

use crate::categorize::CategorizedBlock;

/// Configuration for timeline smoothing.
#[derive(Debug, Clone)]
pub struct SmoothConfig {
    /// Blocks shorter than this many seconds are absorption candidates.
    /// Default: 30.
    pub noise_threshold_secs: f64,
    /// Category whose blocks absorb adjacent noise. Default: "Work".
    pub focus_category: String,
    /// Category never absorbed as noise. Default: "Entertainment".
    pub resist_category: String,
}

impl Default for SmoothConfig {
    fn default() -> Self {
        Self {
            noise_threshold_secs: 30.0,
            focus_category: "Work".to_string(),
            resist_category: "Entertainment".to_string(),
        }
    }
}

/// Smooth a chronological sequence of categorized blocks.
///
/// Applying `smooth` to its own output yields the same sequence — once
/// merged and absorbed, no further folds are possible.
pub fn smooth(blocks: Vec<CategorizedBlock>, config: &SmoothConfig) -> Vec<CategorizedBlock> {
    let mut iter = blocks.into_iter();
    let Some(mut current) = iter.next() else {
        return Vec::new();
    };

    let mut smoothed = Vec::new();
    for next in iter {
        if same_classification(&current, &next) {
            merge(&mut current, next);
        } else if is_noise(&next, config) && absorbs(&current, &next, config) {
            absorb(&mut current, &next);
        } else {
            smoothed.push(current);
            current = next;
        }
    }
    smoothed.push(current);

    smoothed
}

fn same_classification(a: &CategorizedBlock, b: &CategorizedBlock) -> bool {
    a.category == b.category && a.activity == b.activity
}

fn is_noise(block: &CategorizedBlock, config: &SmoothConfig) -> bool {
    block.session.duration_secs < config.noise_threshold_secs
}

fn absorbs(current: &CategorizedBlock, next: &CategorizedBlock, config: &SmoothConfig) -> bool {
    current.category == config.focus_category && next.category != config.resist_category
}

/// Merge an identically-classified block: span, duration, and content.
fn merge(current: &mut CategorizedBlock, next: CategorizedBlock) {
    current.session.end_time = current.session.end_time.max(next.session.end_time);
    current.session.duration_secs += next.session.duration_secs;
    current.session.event_count += next.session.event_count;
    for title in next.session.titles {
        if !current.session.titles.iter().any(|t| t == &title) {
            current.session.titles.push(title);
        }
    }
    for url in next.session.urls {
        if !current.session.urls.iter().any(|u| u == &url) {
            current.session.urls.push(url);
        }
    }
}

/// Fold a noise block's span and duration only.
fn absorb(current: &mut CategorizedBlock, next: &CategorizedBlock) {
    current.session.end_time = current.session.end_time.max(next.session.end_time);
    current.session.duration_secs += next.session.duration_secs;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::parse_instant;
    use crate::sessionize::Session;

    fn block(
        category: &str,
        activity: &str,
        app: &str,
        start: &str,
        end: &str,
        duration: f64,
    ) -> CategorizedBlock {
        CategorizedBlock {
            session: Session {
                start_time: parse_instant(start),
                end_time: parse_instant(end),
                app: app.into(),
                titles: vec![format!("{app} window")],
                urls: Vec::new(),
                duration_secs: duration,
                event_count: 1,
            },
            category: category.into(),
            activity: activity.into(),
            icon: "💼".into(),
        }
    }

    #[test]
    fn identical_classification_merges() {
        let blocks = vec![
            block("Work", "Coding", "code", "2026-01-15T09:00:00Z", "2026-01-15T09:30:00Z", 1800.0),
            block("Work", "Coding", "code", "2026-01-15T09:31:00Z", "2026-01-15T10:00:00Z", 1740.0),
        ];

        let smoothed = smooth(blocks, &SmoothConfig::default());
        assert_eq!(smoothed.len(), 1);
        assert_eq!(smoothed[0].session.end_time, parse_instant("2026-01-15T10:00:00Z"));
        assert!((smoothed[0].session.duration_secs - 3540.0).abs() < f64::EPSILON);
        assert_eq!(smoothed[0].session.event_count, 2);
    }

    #[test]
    fn short_interruption_absorbed_into_work() {
        let blocks = vec![
            block("Work", "Coding", "code", "2026-01-15T09:00:00Z", "2026-01-15T09:30:00Z", 1800.0),
            block("Comms", "General", "slack", "2026-01-15T09:30:05Z", "2026-01-15T09:30:07Z", 2.0),
            block("Work", "Coding", "code", "2026-01-15T09:30:10Z", "2026-01-15T10:00:00Z", 1790.0),
        ];

        let smoothed = smooth(blocks, &SmoothConfig::default());
        assert_eq!(smoothed.len(), 1);
        assert!((smoothed[0].session.duration_secs - 3592.0).abs() < f64::EPSILON);
        // The interruption's titles stay out of the work block.
        assert_eq!(smoothed[0].session.titles, vec!["code window"]);
    }

    #[test]
    fn entertainment_is_never_absorbed() {
        let blocks = vec![
            block("Work", "Coding", "code", "2026-01-15T09:00:00Z", "2026-01-15T09:30:00Z", 1800.0),
            block("Entertainment", "General", "youtube", "2026-01-15T09:30:05Z", "2026-01-15T09:30:15Z", 10.0),
        ];

        let smoothed = smooth(blocks, &SmoothConfig::default());
        assert_eq!(smoothed.len(), 2);
    }

    #[test]
    fn noise_after_non_work_block_stays() {
        let blocks = vec![
            block("Comms", "General", "slack", "2026-01-15T09:00:00Z", "2026-01-15T09:10:00Z", 600.0),
            block("Uncategorized", "General", "mystery", "2026-01-15T09:10:05Z", "2026-01-15T09:10:10Z", 5.0),
        ];

        let smoothed = smooth(blocks, &SmoothConfig::default());
        assert_eq!(smoothed.len(), 2);
    }

    #[test]
    fn noise_at_threshold_is_not_absorbed() {
        let blocks = vec![
            block("Work", "Coding", "code", "2026-01-15T09:00:00Z", "2026-01-15T09:30:00Z", 1800.0),
            block("Comms", "General", "slack", "2026-01-15T09:30:05Z", "2026-01-15T09:30:35Z", 30.0),
        ];

        let smoothed = smooth(blocks, &SmoothConfig::default());
        assert_eq!(smoothed.len(), 2);
    }

    #[test]
    fn smoothing_is_idempotent() {
        let blocks = vec![
            block("Work", "Coding", "code", "2026-01-15T09:00:00Z", "2026-01-15T09:30:00Z", 1800.0),
            block("Comms", "General", "slack", "2026-01-15T09:30:05Z", "2026-01-15T09:30:07Z", 2.0),
            block("Work", "Docs", "chrome", "2026-01-15T09:30:10Z", "2026-01-15T10:00:00Z", 1790.0),
            block("Entertainment", "General", "youtube", "2026-01-15T10:01:00Z", "2026-01-15T10:20:00Z", 1140.0),
        ];

        let once = smooth(blocks, &SmoothConfig::default());
        let twice = smooth(once.clone(), &SmoothConfig::default());
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(smooth(Vec::new(), &SmoothConfig::default()).is_empty());
    }
}
