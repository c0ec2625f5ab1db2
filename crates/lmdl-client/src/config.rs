//! Connection settings for the search engine and the label service.

use serde::{Deserialize, Serialize};

/// Solr connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolrConfig {
    /// Base URL of the Solr server, without the core.
    #[serde(default = "default_solr_url")]
    pub url: String,

    /// Core (collection) name.
    #[serde(default = "default_core")]
    pub core: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_solr_url() -> String {
    "http://localhost:8983/solr".to_string()
}

fn default_core() -> String {
    "test_core".to_string()
}

fn default_timeout_secs() -> u64 {
    20
}

impl SolrConfig {
    /// URL of the configured core.
    pub fn core_url(&self) -> String {
        format!("{}/{}", self.url.trim_end_matches('/'), self.core)
    }
}

impl Default for SolrConfig {
    fn default() -> Self {
        Self {
            url: default_solr_url(),
            core: default_core(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Wikidata label service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelServiceConfig {
    /// `api.php` endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Label language.
    #[serde(default = "default_language")]
    pub language: String,

    /// Identifiers per request; the service caps this at 50.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Also fetch aliases.
    #[serde(default = "default_true")]
    pub include_aliases: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Largest batch the label service accepts.
pub const MAX_LABEL_BATCH: usize = 50;

fn default_api_url() -> String {
    "https://www.wikidata.org/w/api.php".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_batch_size() -> usize {
    MAX_LABEL_BATCH
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    format!(
        "lmdl-search/{} (https://github.com/linkedmusic/lmdl-search)",
        env!("CARGO_PKG_VERSION")
    )
}

impl LabelServiceConfig {
    /// Batch size clamped to what the service accepts.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.clamp(1, MAX_LABEL_BATCH)
    }
}

impl Default for LabelServiceConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            language: default_language(),
            batch_size: default_batch_size(),
            include_aliases: default_true(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
