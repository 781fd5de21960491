//! Rule-based activity categorization.
//!
//! Maps an (app, title) pair to a (category, activity, icon) triple using
//! prioritized, user-configurable rules. Activity keywords are evaluated
//! across the whole rule set before any app-name fallback, so a specific
//! activity match in a low-priority rule beats a generic app match in a
//! high-priority one.
//!
//! The categorizer also records every (app, title) pair it could not
//! classify, deduplicated for the lifetime of the instance, as feedback
//! for rule authoring. Recording is in-memory; the caller drains the
//! pairs and appends them to the audit log.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::sessionize::Session;

/// Category returned when no rule matches.
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";
/// Activity name for app-level and fallback matches.
pub const GENERIC_ACTIVITY: &str = "General";
/// Icon used when a rule does not define one.
pub const DEFAULT_ICON: &str = "📌";
/// Icon for uncategorized activity.
pub const UNCATEGORIZED_ICON: &str = "❓";

/// A named activity within a rule, matched by title keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRule {
    pub name: String,
    /// Case-insensitive substrings tested against the window title.
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// A user-configured categorization rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Evaluation order; lower numbers are evaluated first.
    pub priority: i64,
    /// Category label assigned on match (e.g. "Work").
    pub label: String,
    /// Icon shown next to the category.
    #[serde(default)]
    pub icon: Option<String>,
    /// Case-insensitive substrings tested against the app name.
    #[serde(default)]
    pub apps: Vec<String>,
    /// Named activities matched by title keywords.
    #[serde(default)]
    pub activities: Vec<ActivityRule>,
}

/// The result of classifying one (app, title) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: String,
    pub activity: String,
    pub icon: String,
}

/// A session with its assigned classification.
///
/// Produced by [`Categorizer::categorize`], consumed by smoothing, which
/// may extend the session's end and duration but never splits a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizedBlock {
    #[serde(flatten)]
    pub session: Session,
    pub category: String,
    pub activity: String,
    pub icon: String,
}

/// An (app, title) pair no rule could classify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UncategorizedPair {
    pub app: String,
    pub title: String,
}

/// Rule-based classifier with instance-lifetime audit state.
///
/// The rule set is immutable for the instance's lifetime. The seen-pair
/// set must not be reset between calls within one pipeline run, and must
/// not be shared across concurrent runs — give each run its own instance.
#[derive(Debug)]
pub struct Categorizer {
    rules: Vec<CategoryRule>,
    seen: HashSet<(String, String)>,
    unmatched: Vec<UncategorizedPair>,
}

impl Categorizer {
    /// Build a categorizer from a rule list.
    ///
    /// Rules are evaluated in ascending priority; ties keep list order.
    /// An empty rule list is valid and classifies everything as
    /// uncategorized.
    #[must_use]
    pub fn new(mut rules: Vec<CategoryRule>) -> Self {
        rules.sort_by_key(|r| r.priority);
        if rules.is_empty() {
            tracing::warn!("no category rules configured, everything will be uncategorized");
        }
        Self {
            rules,
            seen: HashSet::new(),
            unmatched: Vec::new(),
        }
    }

    /// Classify an (app, title) pair.
    ///
    /// First pass: every rule's activity keywords against the title, in
    /// priority order — the first keyword hit anywhere wins. Second pass:
    /// every rule's app substrings against the app name, yielding the
    /// rule's label with a generic activity. Unmatched pairs are recorded
    /// once per instance lifetime.
    pub fn classify(&mut self, app: &str, title: &str) -> Classification {
        let title_lower = title.to_lowercase();
        let app_lower = app.to_lowercase();

        for rule in &self.rules {
            for activity in &rule.activities {
                for keyword in &activity.keywords {
                    let keyword = keyword.trim().to_lowercase();
                    if !keyword.is_empty() && title_lower.contains(&keyword) {
                        return Classification {
                            category: rule.label.clone(),
                            activity: activity.name.clone(),
                            icon: rule_icon(rule),
                        };
                    }
                }
            }
        }

        for rule in &self.rules {
            for pattern in &rule.apps {
                let pattern = pattern.trim().to_lowercase();
                if !pattern.is_empty() && app_lower.contains(&pattern) {
                    return Classification {
                        category: rule.label.clone(),
                        activity: GENERIC_ACTIVITY.to_string(),
                        icon: rule_icon(rule),
                    };
                }
            }
        }

        self.record_unmatched(app, title);
        Classification {
            category: UNCATEGORIZED_LABEL.to_string(),
            activity: GENERIC_ACTIVITY.to_string(),
            icon: UNCATEGORIZED_ICON.to_string(),
        }
    }

    /// Classify a session into a categorized block.
    ///
    /// The session's distinct titles are matched as one joined string so
    /// a keyword hit in any title classifies the whole session.
    pub fn categorize(&mut self, session: Session) -> CategorizedBlock {
        let joined = session.titles.join(" | ");
        let classification = self.classify(&session.app, &joined);
        CategorizedBlock {
            session,
            category: classification.category,
            activity: classification.activity,
            icon: classification.icon,
        }
    }

    /// Drain pairs recorded since the last drain.
    ///
    /// The dedup set is retained, so a drained pair is never recorded
    /// again by this instance.
    pub fn take_unmatched(&mut self) -> Vec<UncategorizedPair> {
        std::mem::take(&mut self.unmatched)
    }

    fn record_unmatched(&mut self, app: &str, title: &str) {
        let signature = (app.to_string(), title.to_string());
        if self.seen.insert(signature) {
            tracing::debug!(app, title, "uncategorized activity");
            self.unmatched.push(UncategorizedPair {
                app: app.to_string(),
                title: title.to_string(),
            });
        }
    }
}

fn rule_icon(rule: &CategoryRule) -> String {
    rule.icon
        .clone()
        .unwrap_or_else(|| DEFAULT_ICON.to_string())
}
