//! Privacy sanitization for captured telemetry.
//!
//! Applied at acquisition time, before events are persisted or fused:
//! configured sensitive keywords and e-mail addresses are redacted from
//! titles, and visits to blocked domains are dropped entirely.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("email pattern compiles")
});

/// Privacy configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SanitizeConfig {
    /// Literal strings replaced with `[REDACTED]` wherever they appear.
    #[serde(default)]
    pub sensitive_keywords: Vec<String>,
    /// Regex patterns; a URL matching any of them is dropped.
    #[serde(default)]
    pub blocked_domains: Vec<String>,
}

/// Compiled sanitizer built once per run from configuration.
#[derive(Debug)]
pub struct Sanitizer {
    keywords: Vec<String>,
    blocked: Vec<Regex>,
}

impl Sanitizer {
    /// Compile a sanitizer from configuration.
    ///
    /// Invalid blocklist patterns are skipped with a warning rather than
    /// failing the run.
    #[must_use]
    pub fn new(config: &SanitizeConfig) -> Self {
        let blocked = config
            .blocked_domains
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(re) => Some(re),
                Err(error) => {
                    tracing::warn!(pattern, %error, "skipping invalid blocked-domain pattern");
                    None
                }
            })
            .collect();

        Self {
            keywords: config
                .sensitive_keywords
                .iter()
                .filter(|k| !k.is_empty())
                .cloned()
                .collect(),
            blocked,
        }
    }

    /// Redact sensitive keywords and e-mail addresses from text.
    #[must_use]
    pub fn sanitize_text(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let mut text = text.to_string();
        for keyword in &self.keywords {
            text = text.replace(keyword, "[REDACTED]");
        }
        EMAIL_RE.replace_all(&text, "[EMAIL_REDACTED]").into_owned()
    }

    /// Whether a URL matches any blocked-domain pattern.
    #[must_use]
    pub fn is_domain_blocked(&self, url: &str) -> bool {
        if url.is_empty() {
            return false;
        }
        self.blocked.iter().any(|re| re.is_match(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitizer(keywords: &[&str], blocked: &[&str]) -> Sanitizer {
        Sanitizer::new(&SanitizeConfig {
            sensitive_keywords: keywords.iter().map(|s| (*s).to_string()).collect(),
            blocked_domains: blocked.iter().map(|s| (*s).to_string()).collect(),
        })
    }

    #[test]
    fn keywords_are_redacted() {
        let s = sanitizer(&["secret-project"], &[]);
        assert_eq!(
            s.sanitize_text("notes on secret-project launch"),
            "notes on [REDACTED] launch"
        );
    }

    #[test]
    fn emails_are_redacted() {
        let s = sanitizer(&[], &[]);
        assert_eq!(
            s.sanitize_text("mail from alice@example.com today"),
            "mail from [EMAIL_REDACTED] today"
        );
    }

    #[test]
    fn blocked_domain_patterns_match() {
        let s = sanitizer(&[], &[r"bank\.example", r"^https://private\."]);
        assert!(s.is_domain_blocked("https://bank.example/login"));
        assert!(s.is_domain_blocked("https://private.example/x"));
        assert!(!s.is_domain_blocked("https://docs.example/page"));
    }

    #[test]
    fn invalid_pattern_is_skipped_not_fatal() {
        let s = sanitizer(&[], &["([unclosed", r"ok\.example"]);
        assert!(s.is_domain_blocked("https://ok.example/"));
    }

    #[test]
    fn empty_inputs_pass_through() {
        let s = sanitizer(&["x"], &["y"]);
        assert_eq!(s.sanitize_text(""), "");
        assert!(!s.is_domain_blocked(""));
    }
}
