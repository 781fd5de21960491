//! Long-term memory store client.
//!
//! Talks to a Chroma-style vector store over HTTP: facts extracted from
//! daily journals are ingested with their event date, and recall queries
//! over-fetch by similarity, then re-rank with the recency-aware scorer
//! from `twin-core` before returning the top results.
//!
//! Document IDs are content hashes of fact + date, so re-ingesting the
//! same fact is idempotent.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use twin_core::recall::{
    CandidateMetadata, RankedCandidate, RecallError, RetrievalCandidate, rank,
};

/// Default request timeout for store calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Over-fetch factor applied before re-ranking.
const OVERFETCH_FACTOR: usize = 2;

/// Memory store client errors.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// The store URL or collection name was empty.
    #[error("invalid store configuration: {reason}")]
    InvalidConfig { reason: &'static str },
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("store request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The store returned an unexpected payload.
    #[error("invalid store response: {0}")]
    InvalidResponse(String),
    /// A fact date was not a valid `YYYY-MM-DD` day.
    #[error("invalid fact date {date}: {source}")]
    InvalidDate {
        date: String,
        #[source]
        source: chrono::ParseError,
    },
    /// Re-ranking rejected the candidate set.
    #[error(transparent)]
    Recall(#[from] RecallError),
}

/// Memory store HTTP client, bound to one collection.
pub struct MemoryClient {
    http: reqwest::Client,
    base_url: String,
    collection_id: String,
}

impl fmt::Debug for MemoryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryClient")
            .field("base_url", &self.base_url)
            .field("collection_id", &self.collection_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct CollectionRequest<'a> {
    name: &'a str,
    get_or_create: bool,
}

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    id: String,
}

#[derive(Debug, Serialize)]
struct AddRequest<'a> {
    ids: Vec<String>,
    documents: Vec<&'a str>,
    metadatas: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query_texts: Vec<&'a str>,
    n_results: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    r#where: Option<serde_json::Value>,
}

/// Query results come back column-major, one row per query text.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    documents: Vec<Vec<String>>,
    #[serde(default)]
    metadatas: Vec<Vec<CandidateMetadata>>,
    #[serde(default)]
    distances: Vec<Vec<f64>>,
}

impl MemoryClient {
    /// Connect to the store, creating the collection if needed.
    pub async fn connect(
        base_url: impl Into<String>,
        collection: &str,
    ) -> Result<Self, MemoryError> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(MemoryError::InvalidConfig {
                reason: "store URL cannot be empty",
            });
        }
        if collection.trim().is_empty() {
            return Err(MemoryError::InvalidConfig {
                reason: "collection name cannot be empty",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(MemoryError::ClientBuild)?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let response: CollectionResponse = http
            .post(format!("{base_url}/api/v1/collections"))
            .json(&CollectionRequest {
                name: collection,
                get_or_create: true,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        tracing::debug!(collection, id = %response.id, "connected to memory store");

        Ok(Self {
            http,
            base_url,
            collection_id: response.id,
        })
    }

    /// Ingest one fact with its event date (`YYYY-MM-DD`).
    pub async fn ingest_fact(&self, fact: &str, date: &str) -> Result<(), MemoryError> {
        let timestamp = date_to_unix(date)?;
        let request = AddRequest {
            ids: vec![fact_id(fact, date)],
            documents: vec![fact],
            metadatas: vec![serde_json::json!({
                "date": date,
                "timestamp": timestamp,
            })],
        };

        self.http
            .post(format!(
                "{}/api/v1/collections/{}/add",
                self.base_url, self.collection_id
            ))
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        tracing::debug!(date, "ingested fact");
        Ok(())
    }

    /// Recall the `k` best memories for a query, blending similarity and
    /// recency.
    ///
    /// `before` is a hard cutoff applied by the store's metadata
    /// predicate — events at or after that instant never reach the
    /// ranker. The ranker itself only scores.
    pub async fn recall(
        &self,
        query: &str,
        k: usize,
        before: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        decay_rate: f64,
    ) -> Result<Vec<RankedCandidate>, MemoryError> {
        let request = QueryRequest {
            query_texts: vec![query],
            // Over-fetch so re-ranking has recency headroom.
            n_results: k.max(1) * OVERFETCH_FACTOR,
            r#where: before.map(|cutoff| {
                serde_json::json!({ "timestamp": { "$lt": cutoff.timestamp() } })
            }),
        };

        let response: QueryResponse = self
            .http
            .post(format!(
                "{}/api/v1/collections/{}/query",
                self.base_url, self.collection_id
            ))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let candidates = flatten_response(response)?;
        Ok(rank(candidates, now, k, decay_rate)?)
    }
}

/// Deterministic document ID: SHA-256 of fact text + date.
fn fact_id(fact: &str, date: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(fact.as_bytes());
    hasher.update(date.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Midnight UTC of a `YYYY-MM-DD` day as unix seconds.
fn date_to_unix(date: &str) -> Result<i64, MemoryError> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|source| {
        MemoryError::InvalidDate {
            date: date.to_string(),
            source,
        }
    })?;
    Ok(day
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
        .timestamp())
}

/// Zip the store's column-major result rows into candidates.
fn flatten_response(response: QueryResponse) -> Result<Vec<RetrievalCandidate>, MemoryError> {
    let documents = response.documents.into_iter().next().unwrap_or_default();
    let metadatas = response.metadatas.into_iter().next().unwrap_or_default();
    let distances = response.distances.into_iter().next().unwrap_or_default();

    if documents.len() != distances.len() || documents.len() != metadatas.len() {
        return Err(MemoryError::InvalidResponse(format!(
            "mismatched result columns: {} documents, {} metadatas, {} distances",
            documents.len(),
            metadatas.len(),
            distances.len()
        )));
    }

    Ok(documents
        .into_iter()
        .zip(metadatas)
        .zip(distances)
        .map(|((content, metadata), distance)| RetrievalCandidate {
            content,
            metadata,
            distance,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fact_id_is_deterministic_and_date_scoped() {
        let a = fact_id("Shipped the parser", "2026-01-15");
        let b = fact_id("Shipped the parser", "2026-01-15");
        let c = fact_id("Shipped the parser", "2026-01-16");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn date_to_unix_is_midnight_utc() {
        assert_eq!(date_to_unix("2026-01-15").unwrap(), 1_768_435_200);
        assert!(date_to_unix("15/01/2026").is_err());
    }

    #[test]
    fn query_request_omits_where_without_cutoff() {
        let request = QueryRequest {
            query_texts: vec!["dinner"],
            n_results: 10,
            r#where: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("where").is_none());
    }

    #[test]
    fn flatten_zips_result_columns() {
        let response: QueryResponse = serde_json::from_str(
            r#"{
                "documents": [["fact a", "fact b"]],
                "metadatas": [[{"timestamp": 100.0, "date": "2026-01-15"}, {"timestamp": 200.0}]],
                "distances": [[0.2, 0.4]]
            }"#,
        )
        .unwrap();

        let candidates = flatten_response(response).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].content, "fact a");
        assert_eq!(candidates[0].metadata.date.as_deref(), Some("2026-01-15"));
        assert!((candidates[1].distance - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn flatten_rejects_mismatched_columns() {
        let response: QueryResponse = serde_json::from_str(
            r#"{
                "documents": [["fact a", "fact b"]],
                "metadatas": [[{"timestamp": 100.0}]],
                "distances": [[0.2, 0.4]]
            }"#,
        )
        .unwrap();
        assert!(matches!(
            flatten_response(response),
            Err(MemoryError::InvalidResponse(_))
        ));
    }

    #[test]
    fn empty_response_flattens_to_no_candidates() {
        let response: QueryResponse = serde_json::from_str("{}").unwrap();
        assert!(flatten_response(response).unwrap().is_empty());
    }
}
