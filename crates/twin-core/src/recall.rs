//! Recency-aware re-ranking of semantic search results.
//!
//! Retrieved memory items come back from the vector store ordered by
//! similarity alone. Re-ranking blends similarity with time decay:
//!
//! - `base_score = 1 / (1 + distance)` — distance 0 scores 1.0
//! - `time_decay = 1 / (1 + decay_rate * days_old)`
//! - `score = base_score * (1 + time_decay)`, range (0, 2]
//!
//! The decay is an additive boost, not a multiplier on similarity, so a
//! highly relevant old fact is outranked by an equally relevant newer
//! one without being crushed by age. The ranker performs no temporal
//! filtering — a hard cutoff belongs in the upstream query predicate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default time-decay rate (per day). At 0.05, a 30-day-old item's boost
/// factor is 0.4 versus 1.0 for today's.
pub const DEFAULT_DECAY_RATE: f64 = 0.05;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Re-ranking errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecallError {
    /// A candidate arrived with a structurally invalid distance. A
    /// fabricated default would corrupt ranking silently, so this fails
    /// fast instead.
    #[error("candidate {index} has invalid similarity distance {distance}")]
    InvalidDistance { index: usize, distance: f64 },
}

/// Metadata attached to a retrieval candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CandidateMetadata {
    /// Event time as unix seconds. Missing timestamps default to 0,
    /// which decays the item to a negligible boost.
    #[serde(default)]
    pub timestamp: f64,
    /// Human-readable event date, when the store recorded one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Any further store-specific metadata, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A document returned by the external nearest-neighbor search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalCandidate {
    pub content: String,
    #[serde(default)]
    pub metadata: CandidateMetadata,
    /// Similarity distance; nonnegative, 0 = identical.
    pub distance: f64,
}

/// A candidate with its combined similarity/recency score attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    #[serde(flatten)]
    pub candidate: RetrievalCandidate,
    pub score: f64,
    pub base_score: f64,
}

/// Re-rank candidates by blended similarity and recency, returning the
/// top `k` by descending score.
///
/// The sort is stable: equal scores keep the input (similarity) order.
/// Fewer than `k` candidates in means fewer than `k` out.
pub fn rank(
    candidates: Vec<RetrievalCandidate>,
    now: DateTime<Utc>,
    k: usize,
    decay_rate: f64,
) -> Result<Vec<RankedCandidate>, RecallError> {
    for (index, candidate) in candidates.iter().enumerate() {
        if !candidate.distance.is_finite() || candidate.distance < 0.0 {
            return Err(RecallError::InvalidDistance {
                index,
                distance: candidate.distance,
            });
        }
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "unix seconds fit comfortably in an f64 mantissa"
    )]
    let now_secs = now.timestamp() as f64;

    let mut ranked: Vec<RankedCandidate> = candidates
        .into_iter()
        .map(|candidate| {
            let base_score = 1.0 / (1.0 + candidate.distance);
            let days_old = ((now_secs - candidate.metadata.timestamp) / SECONDS_PER_DAY).max(0.0);
            let time_decay = 1.0 / (1.0 + decay_rate * days_old);
            RankedCandidate {
                score: base_score * (1.0 + time_decay),
                base_score,
                candidate,
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(k);
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn candidate(content: &str, distance: f64, timestamp: f64) -> RetrievalCandidate {
        RetrievalCandidate {
            content: content.into(),
            metadata: CandidateMetadata {
                timestamp,
                date: None,
                extra: serde_json::Map::new(),
            },
            distance,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap()
    }

    #[test]
    fn recent_item_outranks_equally_similar_old_item() {
        #[expect(clippy::cast_precision_loss, reason = "test timestamps are small")]
        let now_secs = now().timestamp() as f64;
        let candidates = vec![
            candidate("old", 0.1, now_secs - 30.0 * 86_400.0),
            candidate("new", 0.1, now_secs),
        ];

        let ranked = rank(candidates, now(), 5, DEFAULT_DECAY_RATE).unwrap();
        assert_eq!(ranked[0].candidate.content, "new");
        assert_eq!(ranked[1].candidate.content, "old");

        // Worked example: base 1/1.1, decay 1.0 vs 1/(1+0.05*30).
        assert!((ranked[0].base_score - 0.909).abs() < 1e-3);
        assert!((ranked[0].score - 1.818).abs() < 1e-3);
        assert!((ranked[1].score - 1.273).abs() < 1e-3);
    }

    #[test]
    fn fresher_never_scores_lower_at_fixed_distance() {
        #[expect(clippy::cast_precision_loss, reason = "test timestamps are small")]
        let now_secs = now().timestamp() as f64;
        let mut previous = f64::INFINITY;
        for days in [0.0, 1.0, 7.0, 30.0, 365.0] {
            let ranked = rank(
                vec![candidate("x", 0.3, now_secs - days * 86_400.0)],
                now(),
                1,
                DEFAULT_DECAY_RATE,
            )
            .unwrap();
            assert!(ranked[0].score <= previous, "score increased at {days} days");
            previous = ranked[0].score;
        }
    }

    #[test]
    fn future_timestamps_clamp_to_zero_days_old() {
        #[expect(clippy::cast_precision_loss, reason = "test timestamps are small")]
        let now_secs = now().timestamp() as f64;
        let ranked = rank(
            vec![candidate("future", 0.0, now_secs + 86_400.0)],
            now(),
            1,
            DEFAULT_DECAY_RATE,
        )
        .unwrap();
        // Full boost, never above the (0, 2] range.
        assert!((ranked[0].score - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn top_k_truncates_and_short_input_passes_through() {
        let candidates = vec![
            candidate("a", 0.1, 0.0),
            candidate("b", 0.2, 0.0),
            candidate("c", 0.3, 0.0),
        ];
        assert_eq!(rank(candidates.clone(), now(), 2, 0.05).unwrap().len(), 2);
        assert_eq!(rank(candidates, now(), 10, 0.05).unwrap().len(), 3);
    }

    #[test]
    fn equal_scores_keep_input_order() {
        let candidates = vec![candidate("first", 0.2, 0.0), candidate("second", 0.2, 0.0)];
        let ranked = rank(candidates, now(), 2, DEFAULT_DECAY_RATE).unwrap();
        assert_eq!(ranked[0].candidate.content, "first");
        assert_eq!(ranked[1].candidate.content, "second");
    }

    #[test]
    fn invalid_distance_fails_fast() {
        let negative = rank(vec![candidate("x", -0.5, 0.0)], now(), 1, 0.05);
        assert!(matches!(
            negative,
            Err(RecallError::InvalidDistance { index: 0, .. })
        ));

        let nan = rank(vec![candidate("x", f64::NAN, 0.0)], now(), 1, 0.05);
        assert!(nan.is_err());
    }

    #[test]
    fn candidate_missing_distance_fails_deserialization() {
        let json = r#"{"content":"fact","metadata":{"timestamp":0}}"#;
        let parsed: Result<RetrievalCandidate, _> = serde_json::from_str(json);
        assert!(parsed.is_err());
    }

    #[test]
    fn empty_candidates_rank_to_empty() {
        assert!(rank(Vec::new(), now(), 5, 0.05).unwrap().is_empty());
    }
}
