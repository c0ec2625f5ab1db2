//! Search engine trait and request/response types.
//!
//! The indexing driver and the query layer only talk to the engine through
//! [`SearchEngine`]. [`SolrClient`](crate::SolrClient) is the production
//! implementation; tests use in-memory fakes.

use std::collections::BTreeMap;

use async_trait::async_trait;
use lmdl_core::{Error, Result};
use serde_json::{Map, Value};

/// Parameters of a select request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectParams {
    /// Main query (`q`).
    pub query: String,

    /// Filter queries (`fq`), each sent as its own parameter.
    pub filters: Vec<String>,

    /// Field list (`fl`).
    pub fields: Option<String>,

    /// Maximum documents to return.
    pub rows: Option<usize>,

    /// Offset of the first document.
    pub start: Option<usize>,

    /// Fields to facet on.
    pub facet_fields: Vec<String>,

    /// Maximum facet values per field (`-1` for all).
    pub facet_limit: Option<i64>,

    /// Minimum count for a facet value to be returned.
    pub facet_min_count: Option<u64>,
}

impl SelectParams {
    /// Select with only a main query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Add a filter query.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filters.push(filter.into());
        self
    }

    /// Set the field list.
    pub fn with_fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    /// Set the row limit.
    pub fn with_rows(mut self, rows: usize) -> Self {
        self.rows = Some(rows);
        self
    }

    /// Set the start offset.
    pub fn with_start(mut self, start: usize) -> Self {
        self.start = Some(start);
        self
    }

    /// Facet on a field.
    pub fn with_facet(mut self, field: impl Into<String>) -> Self {
        self.facet_fields.push(field.into());
        self
    }

    /// Query-string pairs, always asking for a JSON response.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("q".to_string(), self.query.clone())];
        pairs.extend(self.filters.iter().map(|fq| ("fq".to_string(), fq.clone())));
        if let Some(fields) = &self.fields {
            pairs.push(("fl".to_string(), fields.clone()));
        }
        if let Some(rows) = self.rows {
            pairs.push(("rows".to_string(), rows.to_string()));
        }
        if let Some(start) = self.start {
            pairs.push(("start".to_string(), start.to_string()));
        }
        if !self.facet_fields.is_empty() {
            pairs.push(("facet".to_string(), "true".to_string()));
            pairs.extend(
                self.facet_fields
                    .iter()
                    .map(|f| ("facet.field".to_string(), f.clone())),
            );
            if let Some(limit) = self.facet_limit {
                pairs.push(("facet.limit".to_string(), limit.to_string()));
            }
            if let Some(min_count) = self.facet_min_count {
                pairs.push(("facet.mincount".to_string(), min_count.to_string()));
            }
        }
        pairs.push(("wt".to_string(), "json".to_string()));
        pairs
    }
}

/// One facet value and its document count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetCount {
    /// Indexed term.
    pub value: String,
    /// Matching documents.
    pub count: u64,
}

/// Parsed select response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectResponse {
    /// Total matching documents.
    pub num_found: u64,
    /// Returned documents, as the engine sent them.
    pub docs: Vec<Map<String, Value>>,
    /// Facet counts per field, in engine order.
    pub facet_fields: BTreeMap<String, Vec<FacetCount>>,
}

impl SelectResponse {
    /// Parse a Solr JSON select response.
    ///
    /// # Errors
    ///
    /// [`Error::SearchEngine`] when the `response` section is missing or
    /// malformed.
    pub fn from_json(body: &Value) -> Result<Self> {
        let response = body
            .get("response")
            .ok_or_else(|| Error::search_engine("select", "response has no 'response' section"))?;
        let num_found = response
            .get("numFound")
            .and_then(Value::as_u64)
            .ok_or_else(|| Error::search_engine("select", "response has no numFound"))?;
        let docs = match response.get("docs") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|doc| {
                    doc.as_object()
                        .cloned()
                        .ok_or_else(|| Error::search_engine("select", "document is not an object"))
                })
                .collect::<Result<Vec<_>>>()?,
            _ => Vec::new(),
        };

        let mut facet_fields = BTreeMap::new();
        if let Some(Value::Object(fields)) = body.pointer("/facet_counts/facet_fields") {
            for (field, counts) in fields {
                facet_fields.insert(field.clone(), parse_facet_counts(counts));
            }
        }

        Ok(Self {
            num_found,
            docs,
            facet_fields,
        })
    }

    /// Facet counts for a field, empty when the field was not faceted.
    pub fn facet(&self, field: &str) -> &[FacetCount] {
        self.facet_fields.get(field).map_or(&[], Vec::as_slice)
    }
}

// Solr's default facet layout is a flat [term, count, term, count, ...] list.
fn parse_facet_counts(counts: &Value) -> Vec<FacetCount> {
    let Some(items) = counts.as_array() else {
        return Vec::new();
    };
    items
        .chunks(2)
        .filter_map(|pair| match pair {
            [Value::String(value), count] => Some(FacetCount {
                value: value.clone(),
                count: count.as_u64()?,
            }),
            _ => None,
        })
        .collect()
}

/// A search engine hosting the flat index.
///
/// Every call is a single request; failures are never retried.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Submit documents and commit them in the same request.
    ///
    /// Returns the engine's HTTP status code.
    async fn add(&self, docs: &[Value]) -> Result<u16>;

    /// Delete every document and commit.
    async fn delete_all(&self) -> Result<u16>;

    /// Run a select query.
    async fn select(&self, params: &SelectParams) -> Result<SelectResponse>;

    /// Names of all indexed fields.
    async fn field_names(&self) -> Result<Vec<String>>;

    /// Engine name for diagnostics.
    fn name(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================
