//! LLM summarization for the digital twin.
//!
//! Turns a day's rendered timeline into a first-person narrative plus a
//! list of short facts for the memory store, via a local Ollama server.
//! The model must answer in strict JSON; inputs that exceed the context
//! budget are map-reduced — each chunk summarized to bullet points, the
//! final request consuming the concatenated micro-summaries.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use twin_core::timeline::TimelineEntry;

/// Default request timeout. Local models can be slow on first load.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Context headroom reserved for the prompt scaffolding and response.
const CONTEXT_HEADROOM_TOKENS: usize = 1000;

/// Character length of each map-reduce chunk.
const CHUNK_CHARS: usize = 6000;

const PROMPT_SYSTEM: &str = "\
You are a highly intelligent digital twin assistant. Summarize the user's \
daily activity into a coherent first-person narrative and extract structured \
facts for a memory store.

Respond with valid JSON containing exactly two keys:
1. \"narrative\": a markdown string (3-5 paragraphs) describing the day in \
first person (\"I did...\").
2. \"facts\": a list of short, independent strings representing key facts \
(e.g. \"Worked on project X\", \"Fixed bug in API\").";

const PROMPT_MAP_SYSTEM: &str = "Summarize these logs into concise bullet points.";

const PROMPT_MAP_USER: &str =
    "The following logs are a partial segment of my day. Summarize them briefly into bullet \
     points.";

/// LLM client errors.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The configured model or URL was empty.
    #[error("invalid LLM configuration: {reason}")]
    InvalidConfig { reason: &'static str },
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The model's answer was not the expected JSON.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// A generated daily journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyJournal {
    /// First-person markdown narrative.
    pub narrative: String,
    /// Short facts for memory ingestion.
    #[serde(default)]
    pub facts: Vec<String>,
}

/// Ollama chat client.
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    model: String,
    /// Model context window in tokens.
    context_limit: usize,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("context_limit", &self.context_limit)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

impl Client {
    /// Creates a client for the given Ollama server and model.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        context_limit: usize,
    ) -> Result<Self, LlmError> {
        let base_url = base_url.into();
        let model = model.into();
        if base_url.trim().is_empty() {
            return Err(LlmError::InvalidConfig {
                reason: "server URL cannot be empty",
            });
        }
        if model.trim().is_empty() {
            return Err(LlmError::InvalidConfig {
                reason: "model name cannot be empty",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(LlmError::ClientBuild)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            context_limit,
        })
    }

    /// Generate the daily journal for a rendered timeline.
    pub async fn daily_journal(
        &self,
        date: &str,
        entries: &[TimelineEntry],
    ) -> Result<DailyJournal, LlmError> {
        let rendered = render_timeline(entries);
        let context = self.condense(&rendered).await?;
        let prompt = build_daily_prompt(date, &context);

        let content = self.chat(PROMPT_SYSTEM, &prompt, true).await?;
        parse_journal(&content)
    }

    /// Shrink oversized input via map-reduce; pass small input through.
    async fn condense(&self, input: &str) -> Result<String, LlmError> {
        let budget = self.context_limit.saturating_sub(CONTEXT_HEADROOM_TOKENS);
        if estimate_tokens(input) < budget {
            return Ok(input.to_string());
        }

        let chunks = chunk_chars(input, CHUNK_CHARS);
        tracing::info!(chunks = chunks.len(), "input over context budget, map-reducing");

        let mut summaries = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.iter().enumerate() {
            tracing::debug!(chunk = index + 1, total = chunks.len(), "mapping chunk");
            let prompt = format!("{PROMPT_MAP_USER}\nLogs:\n{chunk}");
            summaries.push(self.chat(PROMPT_MAP_SYSTEM, &prompt, false).await?);
        }
        Ok(summaries.join("\n"))
    }

    async fn chat(&self, system: &str, user: &str, json: bool) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
            stream: false,
            format: json.then_some("json"),
        };

        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::InvalidResponse(format!("status {status}: {body}")));
        }

        let payload: ChatResponse = serde_json::from_str(&body)
            .map_err(|err| LlmError::InvalidResponse(err.to_string()))?;
        Ok(payload.message.content)
    }
}

/// Render timeline entries as prompt text, one line per block.
fn render_timeline(entries: &[TimelineEntry]) -> String {
    let mut lines = Vec::with_capacity(entries.len());
    for entry in entries {
        let minutes = entry.duration_secs / 60;
        let titles = entry.titles.join("; ");
        lines.push(format!(
            "{} – {} [{} / {}] {} ({minutes}m): {titles}",
            entry.start_time, entry.end_time, entry.category, entry.activity, entry.app,
        ));
        for url in &entry.urls {
            lines.push(format!("    {url}"));
        }
    }
    lines.join("\n")
}

fn build_daily_prompt(date: &str, context: &str) -> String {
    format!(
        "Here is the activity timeline for {date}.\n\n{context}\n\n\
         Synthesize this into a meaningful daily journal."
    )
}

/// Rough token estimate: four characters per token.
fn estimate_tokens(text: &str) -> usize {
    text.len() / 4
}

/// Split text into character-bounded chunks on char boundaries.
fn chunk_chars(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size.max(1))
        .map(|c| c.iter().collect())
        .collect()
}

fn parse_journal(text: &str) -> Result<DailyJournal, LlmError> {
    serde_json::from_str(text).map_err(|err| LlmError::InvalidResponse(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> TimelineEntry {
        TimelineEntry {
            start_time: "2026-01-15T09:00:05Z".into(),
            end_time: "2026-01-15T09:10:00Z".into(),
            app: "chrome".into(),
            titles: vec!["sqlite3 — DB-API".into()],
            urls: vec!["https://docs.python.org/3/library/sqlite3.html".into()],
            duration_secs: 592,
            category: "Work".into(),
            activity: "Programming".into(),
            icon: "💼".into(),
        }
    }

    #[test]
    fn client_rejects_empty_config() {
        assert!(matches!(
            Client::new("", "llama3", 8192),
            Err(LlmError::InvalidConfig { .. })
        ));
        assert!(matches!(
            Client::new("http://localhost:11434", "  ", 8192),
            Err(LlmError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn rendered_timeline_includes_classification_and_urls() {
        let text = render_timeline(&[entry()]);
        assert!(text.contains("[Work / Programming]"));
        assert!(text.contains("chrome (9m)"));
        assert!(text.contains("https://docs.python.org/3/library/sqlite3.html"));
    }

    #[test]
    fn daily_prompt_carries_date_and_context() {
        let prompt = build_daily_prompt("2026-01-15", "context here");
        assert!(prompt.contains("2026-01-15"));
        assert!(prompt.contains("context here"));
    }

    #[test]
    fn parse_journal_accepts_strict_json() {
        let parsed = parse_journal(
            r#"{"narrative":"Today I studied sqlite.","facts":["Studied sqlite"]}"#,
        )
        .unwrap();
        assert_eq!(parsed.facts, vec!["Studied sqlite"]);
    }

    #[test]
    fn parse_journal_tolerates_missing_facts() {
        let parsed = parse_journal(r#"{"narrative":"Quiet day."}"#).unwrap();
        assert!(parsed.facts.is_empty());
    }

    #[test]
    fn parse_journal_rejects_non_json() {
        assert!(matches!(
            parse_journal("Today I..."),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[test]
    fn chunking_splits_on_char_boundaries() {
        let text = "あいうえお".repeat(100); // 500 chars, multi-byte
        let chunks = chunk_chars(&text, 120);
        assert_eq!(chunks.len(), 5);
        assert_eq!(chunks.iter().map(String::len).sum::<usize>(), text.len());
    }

    #[test]
    fn token_estimate_is_quarter_of_chars() {
        assert_eq!(estimate_tokens("abcdefgh"), 2);
    }
}
