//! Solr HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use lmdl_core::{Error, Result};
use serde_json::{Value, json};

use crate::config::SolrConfig;
use crate::engine::{SearchEngine, SelectParams, SelectResponse};

/// [`SearchEngine`] backed by one Solr core.
#[derive(Debug, Clone)]
pub struct SolrClient {
    http: reqwest::Client,
    core_url: String,
}

impl SolrClient {
    /// Build a client for the configured core.
    ///
    /// # Errors
    ///
    /// [`Error::Http`] when the HTTP client cannot be constructed.
    pub fn new(config: &SolrConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::http("failed to build Solr HTTP client", e))?;
        Ok(Self {
            http,
            core_url: config.core_url(),
        })
    }

    /// URL of the core this client talks to.
    pub fn core_url(&self) -> &str {
        &self.core_url
    }

    async fn update(&self, operation: &str, body: &Value) -> Result<u16> {
        let url = format!("{}/update/json/", self.core_url);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::http(format!("Solr {operation} request to {url} failed"), e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::search_engine_status(operation, status.as_u16(), text));
        }
        log::debug!("Solr {operation} returned {status}");
        Ok(status.as_u16())
    }

    async fn get_json(&self, operation: &str, url: &str, pairs: &[(String, String)]) -> Result<Value> {
        let response = self
            .http
            .get(url)
            .query(pairs)
            .send()
            .await
            .map_err(|e| Error::http(format!("Solr {operation} request to {url} failed"), e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::search_engine_status(operation, status.as_u16(), text));
        }
        response
            .json()
            .await
            .map_err(|e| Error::search_engine(operation, format!("unparseable response: {e}")))
    }
}

#[async_trait]
impl SearchEngine for SolrClient {
    async fn add(&self, docs: &[Value]) -> Result<u16> {
        log::info!("Submitting {} documents to {}", docs.len(), self.core_url);
        self.update("add", &json!({"add": docs, "commit": {}})).await
    }

    async fn delete_all(&self) -> Result<u16> {
        log::info!("Deleting all documents from {}", self.core_url);
        self.update("delete", &json!({"delete": {"query": "*:*"}, "commit": {}}))
            .await
    }

    async fn select(&self, params: &SelectParams) -> Result<SelectResponse> {
        let url = format!("{}/select", self.core_url);
        log::debug!("Solr select q={} fq={:?}", params.query, params.filters);
        let body = self.get_json("select", &url, &params.to_query_pairs()).await?;
        SelectResponse::from_json(&body)
    }

    async fn field_names(&self) -> Result<Vec<String>> {
        let url = format!("{}/admin/luke", self.core_url);
        let pairs = [
            ("numTerms".to_string(), "0".to_string()),
            ("wt".to_string(), "json".to_string()),
        ];
        let body = self.get_json("luke", &url, &pairs).await?;
        let fields = body
            .get("fields")
            .and_then(Value::as_object)
            .ok_or_else(|| Error::search_engine("luke", "response has no 'fields' section"))?;
        Ok(fields.keys().cloned().collect())
    }

    fn name(&self) -> &str {
        "solr"
    }
}

// ============================================================================
// Tests
// ============================================================================
