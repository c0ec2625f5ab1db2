//! Wikidata `wbgetentities` label lookup.

use std::time::Duration;

use async_trait::async_trait;
use lmdl_core::{EntityLabels, Error, LabelMap, Result};
use serde::Deserialize;
use std::collections::HashMap;

use crate::config::LabelServiceConfig;
use crate::labels::LabelLookup;

/// [`LabelLookup`] against the Wikidata API.
#[derive(Debug, Clone)]
pub struct WikidataClient {
    http: reqwest::Client,
    api_url: String,
    language: String,
    include_aliases: bool,
    batch_size: usize,
}

#[derive(Debug, Deserialize)]
struct EntitiesResponse {
    entities: Option<HashMap<String, EntityRecord>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Debug, Deserialize)]
struct EntityRecord {
    #[serde(default)]
    missing: Option<serde_json::Value>,
    #[serde(default)]
    labels: HashMap<String, Term>,
    #[serde(default)]
    aliases: HashMap<String, Vec<Term>>,
}

#[derive(Debug, Deserialize)]
struct Term {
    value: String,
}

impl WikidataClient {
    /// Build a client from the label service settings.
    ///
    /// # Errors
    ///
    /// [`Error::Http`] when the HTTP client cannot be constructed.
    pub fn new(config: &LabelServiceConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::http("failed to build label service HTTP client", e))?;
        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            language: config.language.clone(),
            include_aliases: config.include_aliases,
            batch_size: config.effective_batch_size(),
        })
    }

    fn props(&self) -> &'static str {
        if self.include_aliases {
            "labels|aliases"
        } else {
            "labels"
        }
    }

    fn into_labels(&self, response: EntitiesResponse) -> Result<LabelMap> {
        if let Some(error) = response.error {
            return Err(Error::label_lookup(format!("{}: {}", error.code, error.info)));
        }
        let entities = response
            .entities
            .ok_or_else(|| Error::label_lookup("response has no 'entities' map"))?;

        let mut labels = LabelMap::new();
        for (id, mut record) in entities {
            if record.missing.is_some() {
                log::debug!("Label service has no entity {id}");
                continue;
            }
            let entry = EntityLabels {
                label: record.labels.remove(&self.language).map(|t| t.value),
                aliases: if self.include_aliases {
                    record
                        .aliases
                        .remove(&self.language)
                        .unwrap_or_default()
                        .into_iter()
                        .map(|t| t.value)
                        .collect()
                } else {
                    Vec::new()
                },
            };
            labels.insert(id, entry);
        }
        Ok(labels)
    }
}

#[async_trait]
impl LabelLookup for WikidataClient {
    async fn fetch(&self, ids: &[String]) -> Result<LabelMap> {
        if ids.is_empty() {
            return Ok(LabelMap::new());
        }
        if ids.len() > self.batch_size {
            return Err(Error::label_lookup(format!(
                "{} identifiers exceed the batch limit of {}",
                ids.len(),
                self.batch_size
            )));
        }

        let joined = ids.join("|");
        let params = [
            ("action", "wbgetentities"),
            ("ids", joined.as_str()),
            ("format", "json"),
            ("props", self.props()),
            ("languages", self.language.as_str()),
        ];
        let response = self
            .http
            .get(&self.api_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| Error::http(format!("label request to {} failed", self.api_url), e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::label_lookup_status(status.as_u16(), text));
        }
        let body: EntitiesResponse = response
            .json()
            .await
            .map_err(|e| Error::label_lookup(format!("malformed entity map: {e}")))?;
        self.into_labels(body)
    }

    fn max_batch(&self) -> usize {
        self.batch_size
    }
}

// ============================================================================
// Tests
// ============================================================================
