//! Search service: everything a search page needs in one call.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use lmdl_client::{LabelResolver, SearchEngine, SelectParams};
use lmdl_core::authority::{AuthorityRole, IdentifierShape};
use lmdl_core::flat::{ID_FIELD, TYPE_FIELD};
use lmdl_core::labels::LABEL_FIELD;
use lmdl_core::{AuthorityResolver, FieldName, LabelKind, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::expander::{DisplayDocument, ResultExpander};
use crate::related::RelatedTermsResolver;
use crate::translator::{Clause, QueryTranslator};

/// Prefix shared by the label and similar-terms document types.
const INDEX_TYPE_PREFIX: &str = "ld_";

/// Result sizes used by the search service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Results per page.
    #[serde(default = "default_rows")]
    pub rows: usize,

    /// Label matches used to widen a field search.
    #[serde(default = "default_recommendation_rows")]
    pub recommendation_rows: usize,

    /// Label documents fetched when listing selectable fields.
    #[serde(default = "default_field_label_rows")]
    pub field_label_rows: usize,
}

fn default_rows() -> usize {
    30
}

fn default_recommendation_rows() -> usize {
    10
}

fn default_field_label_rows() -> usize {
    1000
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            rows: default_rows(),
            recommendation_rows: default_recommendation_rows(),
            field_label_rows: default_field_label_rows(),
        }
    }
}

/// A search as submitted by a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free text; blank means "list fields and types only".
    pub text: String,
    /// Field selectors (`P86`, `wdt_P86`).
    #[serde(default)]
    pub fields: Vec<String>,
    /// Type selector (`Q5`, `wd_Q5`).
    #[serde(default, rename = "type")]
    pub type_filter: Option<String>,
    /// Offset of the first result.
    #[serde(default)]
    pub start: usize,
}

impl SearchRequest {
    /// Request for free text with no selectors.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Add a field selector.
    pub fn with_field(mut self, selector: impl Into<String>) -> Self {
        self.fields.push(selector.into());
        self
    }

    /// Restrict to a type.
    pub fn with_type(mut self, type_filter: impl Into<String>) -> Self {
        self.type_filter = Some(type_filter.into());
        self
    }
}

/// A selectable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldOption {
    /// Bare identifier (`P86`).
    pub selector: String,
    /// Stored base name (`wdt_P86`).
    pub base: String,
    /// Label followed by aliases; empty when the index has none.
    pub labels: Vec<String>,
}

/// A selectable type with its document count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeOption {
    /// Stored type (`wd_Q5`).
    pub value: String,
    /// Type label, or the stored type when it has none.
    pub label: String,
    /// Documents of this type.
    pub count: u64,
}

/// One page of search output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchPage {
    /// Total matching documents.
    pub count: u64,
    /// Expanded results of this page.
    pub results: Vec<DisplayDocument>,
    /// Selectable fields.
    pub fields: Vec<FieldOption>,
    /// Selectable types.
    pub types: Vec<TypeOption>,
    /// Terms related to the single selected field.
    pub related: BTreeMap<String, String>,
}

/// Ties translation, the engine, expansion and related terms together.
pub struct SearchService {
    engine: Arc<dyn SearchEngine>,
    authorities: AuthorityResolver,
    translator: QueryTranslator,
    expander: ResultExpander,
    related: RelatedTermsResolver,
    resolver: LabelResolver,
    settings: SearchSettings,
}

impl SearchService {
    /// Service over `engine`, labelling through `resolver`.
    pub fn new(
        engine: Arc<dyn SearchEngine>,
        authorities: AuthorityResolver,
        resolver: LabelResolver,
        settings: SearchSettings,
    ) -> Self {
        let translator = QueryTranslator::new(authorities.clone());
        Self {
            expander: ResultExpander::new(authorities.clone(), resolver.clone()),
            related: RelatedTermsResolver::new(
                Arc::clone(&engine),
                translator.clone(),
                resolver.clone(),
            ),
            engine,
            authorities,
            translator,
            resolver,
            settings,
        }
    }

    /// Settings in use.
    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Run a search.
    ///
    /// # Errors
    ///
    /// Fails on an unusable selector or any engine or label lookup error.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchPage> {
        let mut page = SearchPage {
            fields: self.field_options().await?,
            types: self.type_options().await?,
            ..Default::default()
        };

        let text = request.text.trim();
        if text.is_empty() {
            log::debug!("Empty search text, listing fields and types only");
            return Ok(page);
        }

        let recommendations = if request.fields.is_empty() {
            Vec::new()
        } else {
            self.recommendations(text).await?
        };
        let query = self.translator.translate(
            text,
            &request.fields,
            request.type_filter.as_deref(),
            &recommendations,
        )?;
        let params = query.to_select_params(self.settings.rows, request.start);
        log::info!("Searching q={} fq={:?}", params.query, params.filters);

        let response = self.engine.select(&params).await?;
        page.count = response.num_found;
        if !response.docs.is_empty() {
            page.results = self.expander.expand(&response.docs).await?;
        }

        if let [selector] = request.fields.as_slice() {
            page.related = self.related.related(selector).await?;
        }
        Ok(page)
    }

    /// Bare entity identifiers whose labels match the text.
    pub async fn recommendations(&self, text: &str) -> Result<Vec<String>> {
        let params = self
            .translator
            .recommendation_query(text, self.settings.recommendation_rows);
        let response = self.engine.select(&params).await?;
        Ok(response
            .docs
            .iter()
            .filter_map(|doc| doc.get(ID_FIELD).and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }

    /// Selectable fields: entity and property fields present in the index,
    /// with the labels stored in the label documents.
    pub async fn field_options(&self) -> Result<Vec<FieldOption>> {
        let names = self.engine.field_names().await?;
        let bases: BTreeSet<String> = names
            .iter()
            .map(|name| FieldName::parse(name).base)
            .collect();

        let mut options: Vec<FieldOption> = bases
            .into_iter()
            .filter_map(|base| {
                let (authority, local) = self.authorities.split_field_base(&base)?;
                let selectable = matches!(
                    authority.role,
                    AuthorityRole::Entity | AuthorityRole::Property
                ) && IdentifierShape::of(local) != IdentifierShape::Other;
                selectable.then(|| FieldOption {
                    selector: local.to_string(),
                    base: base.clone(),
                    labels: Vec::new(),
                })
            })
            .collect();
        if options.is_empty() {
            return Ok(options);
        }

        let query = Clause::Any(
            options
                .iter()
                .map(|o| Clause::exact(ID_FIELD, o.selector.clone()))
                .collect(),
        );
        let kinds = Clause::Any(
            [LabelKind::Property, LabelKind::Item]
                .iter()
                .map(|k| Clause::exact(TYPE_FIELD, k.index_type()))
                .collect(),
        );
        let params = SelectParams::new(query.render())
            .with_filter(kinds.render())
            .with_fields(format!("{ID_FIELD},{LABEL_FIELD}"))
            .with_rows(self.settings.field_label_rows);
        let response = self.engine.select(&params).await?;

        let mut labels: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for doc in &response.docs {
            let Some(id) = doc.get(ID_FIELD).and_then(Value::as_str) else {
                continue;
            };
            let values = match doc.get(LABEL_FIELD) {
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
                Some(Value::String(s)) => vec![s.clone()],
                _ => Vec::new(),
            };
            labels.entry(id.to_string()).or_insert(values);
        }

        for option in &mut options {
            if let Some(found) = labels.get(&option.selector) {
                option.labels = found.clone();
            }
        }
        Ok(options)
    }

    /// Selectable types with counts, excluding label and similar-terms
    /// documents.
    pub async fn type_options(&self) -> Result<Vec<TypeOption>> {
        let params = SelectParams {
            facet_limit: Some(-1),
            facet_min_count: Some(1),
            ..SelectParams::new(Clause::MatchAll.render())
                .with_rows(0)
                .with_facet(TYPE_FIELD)
        };
        let response = self.engine.select(&params).await?;
        let counts: Vec<_> = response
            .facet(TYPE_FIELD)
            .iter()
            .filter(|c| !c.value.starts_with(INDEX_TYPE_PREFIX))
            .collect();

        let locals: Vec<&str> = counts
            .iter()
            .filter_map(|c| self.entity_local(&c.value))
            .collect();
        let labels = self.resolver.resolve(&locals).await?;

        Ok(counts
            .into_iter()
            .map(|c| TypeOption {
                value: c.value.clone(),
                label: self
                    .entity_local(&c.value)
                    .and_then(|local| labels.get(local)?.label.clone())
                    .unwrap_or_else(|| c.value.clone()),
                count: c.count,
            })
            .collect())
    }

    fn entity_local<'a>(&self, value: &'a str) -> Option<&'a str> {
        let (authority, local) = self.authorities.split_field_base(value)?;
        (authority.role == AuthorityRole::Entity).then_some(local)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedEngine, StaticLookup};
    use lmdl_client::{FacetCount, SelectResponse};
    use serde_json::json;

    fn docs(values: Vec<Value>) -> SelectResponse {
        SelectResponse {
            num_found: values.len() as u64,
            docs: values
                .into_iter()
                .map(|v| v.as_object().unwrap().clone())
                .collect(),
            ..Default::default()
        }
    }

    fn type_facets() -> SelectResponse {
        let mut response = SelectResponse::default();
        response.facet_fields.insert(
            "@type".to_string(),
            vec![
                FacetCount { value: "wd_Q207628".to_string(), count: 12 },
                FacetCount { value: "ld_item".to_string(), count: 40 },
                FacetCount { value: "schema_MusicRecording".to_string(), count: 3 },
            ],
        );
        response
    }

    fn service(engine: &ScriptedEngine, lookup: &StaticLookup) -> SearchService {
        SearchService::new(
            Arc::new(engine.clone()),
            AuthorityResolver::new(),
            lookup.clone().into_resolver(),
            SearchSettings::default(),
        )
    }

    fn is_facet(p: &SelectParams) -> bool {
        !p.facet_fields.is_empty()
    }

    fn is_label_docs(p: &SelectParams) -> bool {
        p.fields.as_deref() == Some("@id,wd_label_txt")
    }

    // ------------------------------------------------------------------------
    // Settings and requests
    // ------------------------------------------------------------------------

    #[test]
    fn test_search_settings_defaults() {
        let settings: SearchSettings = serde_json::from_value(json!({"rows": 5})).unwrap();
        assert_eq!(settings.rows, 5);
        assert_eq!(settings.recommendation_rows, 10);
        assert_eq!(settings.field_label_rows, 1000);
    }

    #[test]
    fn test_search_request_builder() {
        let request = SearchRequest::new("bach").with_field("P86").with_type("Q5");
        assert_eq!(request.fields, vec!["P86"]);
        assert_eq!(request.type_filter.as_deref(), Some("Q5"));
        assert_eq!(request.start, 0);
    }

    // ------------------------------------------------------------------------
    // Fields and types
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_field_options_from_luke_and_label_docs() {
        let engine = ScriptedEngine::new()
            .with_field_names(&[
                "@id",
                "@type",
                "wdt_P86_s",
                "wdt_P86_t",
                "wdt_P86",
                "wdt_P136_t",
                "schema_name_t",
                "wd_label_txt",
                "_text_",
            ])
            .respond_when(
                is_label_docs,
                docs(vec![json!({"@id": "P86", "wd_label_txt": ["composer", "written by"]})]),
            );
        let lookup = StaticLookup::new();

        let fields = service(&engine, &lookup).field_options().await.unwrap();
        assert_eq!(
            fields,
            vec![
                FieldOption {
                    selector: "P136".to_string(),
                    base: "wdt_P136".to_string(),
                    labels: vec![],
                },
                FieldOption {
                    selector: "P86".to_string(),
                    base: "wdt_P86".to_string(),
                    labels: vec!["composer".to_string(), "written by".to_string()],
                },
            ]
        );

        let sent = engine.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].query, "(@id:\"P136\" OR @id:\"P86\")");
        assert_eq!(sent[0].filters, vec!["(@type:\"ld_prop\" OR @type:\"ld_item\")"]);
        assert_eq!(sent[0].rows, Some(1000));
    }

    #[tokio::test]
    async fn test_field_options_empty_index() {
        let engine = ScriptedEngine::new().with_field_names(&["@id", "_text_"]);
        let fields = service(&engine, &StaticLookup::new()).field_options().await.unwrap();
        assert!(fields.is_empty());
        assert!(engine.requests().is_empty());
    }

    #[tokio::test]
    async fn test_type_options_excludes_index_types() {
        let engine = ScriptedEngine::new().respond_when(is_facet, type_facets());
        let lookup = StaticLookup::new().with("Q207628", "musical composition");

        let types = service(&engine, &lookup).type_options().await.unwrap();
        assert_eq!(
            types,
            vec![
                TypeOption {
                    value: "wd_Q207628".to_string(),
                    label: "musical composition".to_string(),
                    count: 12,
                },
                TypeOption {
                    value: "schema_MusicRecording".to_string(),
                    label: "schema_MusicRecording".to_string(),
                    count: 3,
                },
            ]
        );
        assert_eq!(lookup.requested_ids(), vec!["Q207628"]);

        let sent = &engine.requests()[0];
        assert_eq!(sent.facet_fields, vec!["@type"]);
        assert_eq!(sent.facet_limit, Some(-1));
        assert_eq!(sent.facet_min_count, Some(1));
        assert_eq!(sent.rows, Some(0));
    }

    // ------------------------------------------------------------------------
    // search
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_search_empty_text_lists_only() {
        let engine = ScriptedEngine::new().respond_when(is_facet, type_facets());
        let page = service(&engine, &StaticLookup::new())
            .search(&SearchRequest::new("   "))
            .await
            .unwrap();
        assert_eq!(page.count, 0);
        assert!(page.results.is_empty());
        assert_eq!(page.types.len(), 2);
        // Luke yields no fields, so only the facet query ran.
        assert_eq!(engine.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_search_free_text() {
        let engine = ScriptedEngine::new().respond_when(
            |p| p.query == "_text_:(missa)",
            docs(vec![json!({
                "@id": "https://db.simssa.ca/musicalworks/3",
                "@type": "wd_Q207628",
                "schema_name_t": "Missa"
            })]),
        );
        let lookup = StaticLookup::new().with("Q207628", "musical composition");

        let page = service(&engine, &lookup)
            .search(&SearchRequest::new("missa"))
            .await
            .unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.results[0].type_label.as_deref(), Some("musical composition"));
        assert!(page.related.is_empty());

        // Facet query, then the search itself; no recommendation query.
        let sent = engine.requests();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].filters.len(), 2);
        assert!(sent[1].filters[0].starts_with("-(@type:\"ld_item\""));
        assert_eq!(sent[1].filters[1], "-_nest_parent_:*");
        assert_eq!(sent[1].rows, Some(30));
    }

    #[tokio::test]
    async fn test_search_zero_results_skips_expansion() {
        let engine = ScriptedEngine::new();
        let lookup = StaticLookup::new();
        let page = service(&engine, &lookup)
            .search(&SearchRequest::new("nothing"))
            .await
            .unwrap();
        assert_eq!(page.count, 0);
        assert!(page.results.is_empty());
        assert_eq!(lookup.requests(), 0);
    }

    #[tokio::test]
    async fn test_search_single_field_with_recommendations_and_related() {
        let engine = ScriptedEngine::new()
            .respond_when(
                |p| p.query == "wd_label_txt:(bach)",
                docs(vec![json!({"@id": "Q1339"})]),
            )
            .respond_when(
                |p| p.query.starts_with("_nest_parent_"),
                docs(vec![json!({"@id": "http://www.wikidata.org/prop/direct/P1303"})]),
            )
            .respond_when(
                |p| p.query == "(wdt_P86_t:(bach) OR *:*)",
                docs(vec![json!({
                    "@id": "w1",
                    "wdt_P86_s": "http://www.wikidata.org/entity/Q1339"
                })]),
            );
        let lookup = StaticLookup::new().with("P86", "composer").with("P1303", "instrument");

        let page = service(&engine, &lookup)
            .search(&SearchRequest::new("bach").with_field("P86"))
            .await
            .unwrap();

        assert_eq!(page.count, 1);
        assert_eq!(page.results[0].properties[0].label, "composer");
        assert_eq!(page.related.get("P1303").map(String::as_str), Some("instrument"));

        let search = engine
            .requests()
            .into_iter()
            .find(|p| p.query == "(wdt_P86_t:(bach) OR *:*)")
            .unwrap();
        assert_eq!(
            search.filters,
            vec!["(wdt_P86_t:(bach) OR wdt_P86_s:\"http://www.wikidata.org/entity/Q1339\")"]
        );
    }

    #[tokio::test]
    async fn test_search_two_fields_no_related() {
        let engine = ScriptedEngine::new();
        let page = service(&engine, &StaticLookup::new())
            .search(&SearchRequest::new("bach").with_field("P86").with_field("P676"))
            .await
            .unwrap();
        assert!(page.related.is_empty());
        assert!(
            !engine
                .requests()
                .iter()
                .any(|p| p.query.starts_with("_nest_parent_"))
        );
    }

    #[tokio::test]
    async fn test_search_invalid_selector() {
        let engine = ScriptedEngine::new();
        let err = service(&engine, &StaticLookup::new())
            .search(&SearchRequest::new("bach").with_field("composer"))
            .await
            .unwrap_err();
        assert!(matches!(err, lmdl_core::Error::InvalidSelector { .. }));
    }
}
