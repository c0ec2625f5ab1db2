//! `lmdl` configuration file.
//!
//! Resolution order: `--config <path>`, then `LMDL_CONFIG` (both handled by
//! the CLI parser), then `<config dir>/lmdl/config.toml`. A missing file
//! gives the defaults. A few environment variables override file values.

use std::path::{Path, PathBuf};

use lmdl_client::{LabelServiceConfig, SolrConfig};
use lmdl_core::{Authority, AuthorityResolver, Error, Result};
use lmdl_index::SimilarTermsGroup;
use lmdl_query::SearchSettings;
use serde::{Deserialize, Serialize};

/// Directory name under the platform config directory.
pub const PROJECT_NAME: &str = "lmdl";

/// Environment variables that override file values, with their dotted keys.
pub const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("LMDL_SOLR_URL", "solr.url"),
    ("LMDL_SOLR_CORE", "solr.core"),
    ("LMDL_LABELS_API_URL", "labels.api_url"),
    ("LMDL_LABELS_LANGUAGE", "labels.language"),
];

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LmdlConfig {
    /// Groups of equivalent IRIs indexed by `lmdl similar-terms`.
    #[serde(default = "SimilarTermsGroup::builtin")]
    pub similar_terms: Vec<SimilarTermsGroup>,

    /// `[solr]`
    #[serde(default)]
    pub solr: SolrConfig,

    /// `[labels]`
    #[serde(default)]
    pub labels: LabelServiceConfig,

    /// `[search]`
    #[serde(default)]
    pub search: SearchSettings,

    /// `[[authorities]]` added to the built-in table.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authorities: Vec<Authority>,
}

impl Default for LmdlConfig {
    fn default() -> Self {
        Self {
            similar_terms: SimilarTermsGroup::builtin(),
            solr: SolrConfig::default(),
            labels: LabelServiceConfig::default(),
            search: SearchSettings::default(),
            authorities: Vec::new(),
        }
    }
}

/// Default config file location, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(PROJECT_NAME).join("config.toml"))
}

/// Explicit path when given, otherwise the default location.
pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(PathBuf::from(path)),
        None => default_config_path(),
    }
}

impl LmdlConfig {
    /// Load the configuration and apply environment overrides.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] when an existing file cannot be read,
    /// [`Error::Config`] when it cannot be parsed.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        let mut config = match resolve_config_path(explicit) {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                log::debug!("No config file at {}, using defaults", path.display());
                Self::default()
            }
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Parse a config file without environment overrides.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(e.to_string()))
    }

    /// Serialize as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Apply overrides from `lookup`, which maps a variable name to its
    /// value.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("LMDL_SOLR_URL") {
            self.solr.url = url;
        }
        if let Some(core) = lookup("LMDL_SOLR_CORE") {
            self.solr.core = core;
        }
        if let Some(api_url) = lookup("LMDL_LABELS_API_URL") {
            self.labels.api_url = api_url;
        }
        if let Some(language) = lookup("LMDL_LABELS_LANGUAGE") {
            self.labels.language = language;
        }
    }

    /// Current values of the overridable settings, as environment variables.
    pub fn to_env_vars(&self) -> Vec<(String, String)> {
        ENV_OVERRIDES
            .iter()
            .map(|(name, key)| {
                let value = match *key {
                    "solr.url" => self.solr.url.clone(),
                    "solr.core" => self.solr.core.clone(),
                    "labels.api_url" => self.labels.api_url.clone(),
                    _ => self.labels.language.clone(),
                };
                (name.to_string(), value)
            })
            .collect()
    }

    /// Built-in authorities plus the configured ones.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] when a configured authority clashes with an
    /// existing one or has a malformed namespace.
    pub fn authority_resolver(&self) -> Result<AuthorityResolver> {
        self.authorities
            .iter()
            .cloned()
            .try_fold(AuthorityResolver::new(), AuthorityResolver::with_authority)
    }
}

// ============================================================================
// Tests
// ============================================================================
