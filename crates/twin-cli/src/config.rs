//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use twin_core::categorize::CategoryRule;
use twin_core::sanitize::SanitizeConfig;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory; sensor logs live under `<data_dir>/logs`.
    pub data_dir: PathBuf,
    /// Where daily journal markdown files are written.
    pub journals_dir: PathBuf,
    /// Category rules file. Missing file means an empty rule set.
    pub rules_path: PathBuf,

    /// ActivityWatch server URL.
    pub watcher_url: String,
    /// Memory store (vector database) URL.
    pub memory_url: String,
    /// Memory store collection name.
    pub memory_collection: String,
    /// Ollama server URL.
    pub ollama_url: String,
    /// Ollama model name.
    pub ollama_model: String,
    /// Model context window in tokens.
    pub context_limit: usize,

    /// Session gap threshold in seconds.
    pub gap_threshold_secs: i64,
    /// Noise-absorption threshold in seconds.
    pub noise_threshold_secs: f64,
    /// Minimum rendered block duration in seconds.
    pub min_render_secs: f64,
    /// Memory recall time-decay rate per day.
    pub decay_rate: f64,

    /// Privacy settings applied at acquisition time.
    #[serde(default)]
    pub privacy: SanitizeConfig,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        let config_dir = dirs_config_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            journals_dir: data_dir.join("journals"),
            rules_path: config_dir.join("rules.toml"),
            data_dir,
            watcher_url: "http://localhost:5600".to_string(),
            memory_url: "http://localhost:8000".to_string(),
            memory_collection: "digital_twin_memory".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "llama3".to_string(),
            context_limit: 8192,
            gap_threshold_secs: 300,
            noise_threshold_secs: 30.0,
            min_render_secs: twin_core::timeline::DEFAULT_MIN_RENDER_SECS,
            decay_rate: twin_core::recall::DEFAULT_DECAY_RATE,
            privacy: SanitizeConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (TWIN_*)
        figment = figment.merge(Env::prefixed("TWIN_"));

        figment.extract()
    }

    /// Directory where sensor logs are kept.
    #[must_use]
    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    /// The append-only uncategorized-activity audit file.
    #[must_use]
    pub fn audit_path(&self) -> PathBuf {
        self.data_dir.join("uncategorized.log")
    }

    /// Load the category rule set.
    ///
    /// A missing rules file is a warning, not an error: everything will
    /// classify as uncategorized until rules are authored.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_rules(&self) -> Result<Vec<CategoryRule>, figment::Error> {
        if !self.rules_path.exists() {
            tracing::warn!(
                path = %self.rules_path.display(),
                "rules file not found, using empty rule set"
            );
            return Ok(Vec::new());
        }

        let rules: RulesFile = Figment::from(Serialized::defaults(RulesFile::default()))
            .merge(Toml::file(&self.rules_path))
            .extract()?;
        Ok(rules.rules)
    }
}

/// On-disk schema of `rules.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RulesFile {
    #[serde(default)]
    rules: Vec<CategoryRule>,
}

/// Returns the platform-specific config directory for twin.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("twin"))
}

/// Returns the platform-specific data directory for twin.
///
/// On Linux: `~/.local/share/twin`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("twin"))
}
