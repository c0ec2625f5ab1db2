//! Related terms: identifiers grouped with a selector as similar terms.

use std::collections::BTreeMap;
use std::sync::Arc;

use lmdl_client::{LabelResolver, SearchEngine, SelectParams};
use lmdl_core::flat::{ID_FIELD, NEST_PARENT_FIELD, SIMILAR_TERMS_TYPE, TYPE_FIELD};
use lmdl_core::util::ids::local_name;
use lmdl_core::Result;
use serde_json::Value;

use crate::translator::{Clause, QueryTranslator};

/// Upper bound on related identifiers returned for one selector.
const RELATED_ROWS: usize = 100;

/// Finds terms recorded as similar to a property selector.
pub struct RelatedTermsResolver {
    engine: Arc<dyn SearchEngine>,
    translator: QueryTranslator,
    resolver: LabelResolver,
}

impl RelatedTermsResolver {
    /// Resolver over `engine`, labelling through `resolver`.
    pub fn new(
        engine: Arc<dyn SearchEngine>,
        translator: QueryTranslator,
        resolver: LabelResolver,
    ) -> Self {
        Self {
            engine,
            translator,
            resolver,
        }
    }

    /// Query for the similar-terms children of the group containing `iri`.
    pub fn related_query(iri: &str) -> SelectParams {
        SelectParams::new(Clause::exact(NEST_PARENT_FIELD, iri).render())
            .with_filter(Clause::exact(TYPE_FIELD, SIMILAR_TERMS_TYPE).render())
            .with_fields(ID_FIELD)
            .with_rows(RELATED_ROWS)
    }

    /// Related identifiers with their labels, excluding the selector itself.
    ///
    /// An identifier without a label maps to itself.
    ///
    /// # Errors
    ///
    /// Fails on an unusable selector, an engine error or a label lookup
    /// error.
    pub async fn related(&self, selector: &str) -> Result<BTreeMap<String, String>> {
        let iri = self.translator.selector_iri(selector)?;
        let own = local_name(&iri).to_string();

        let response = self.engine.select(&Self::related_query(&iri)).await?;
        let ids: Vec<String> = response
            .docs
            .iter()
            .filter_map(|doc| doc.get(ID_FIELD).and_then(Value::as_str))
            .map(|id| local_name(id).to_string())
            .filter(|id| !id.is_empty() && *id != own)
            .collect();

        if ids.is_empty() {
            return Ok(BTreeMap::new());
        }

        let labels = self.resolver.resolve(&ids).await?;
        Ok(ids
            .into_iter()
            .map(|id| {
                let label = labels
                    .get(&id)
                    .and_then(|l| l.label.clone())
                    .unwrap_or_else(|| id.clone());
                (id, label)
            })
            .collect())
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
    use lmdl_client::SelectResponse;
    use lmdl_core::AuthorityResolver;
    use serde_json::json;

    fn response(ids: &[&str]) -> SelectResponse {
        SelectResponse {
            num_found: ids.len() as u64,
            docs: ids
                .iter()
                .map(|id| json!({"@id": id}).as_object().unwrap().clone())
                .collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_related_excludes_selector_and_labels() {
        let engine = ScriptedEngine::new().respond(response(&[
            "http://www.wikidata.org/prop/direct/P826",
            "http://www.wikidata.org/prop/direct/P1922",
            "http://www.wikidata.org/prop/direct/P1923",
        ]));
        let lookup = StaticLookup::new().with("P826", "tonality").with("P1922", "first line");
        let resolver = RelatedTermsResolver::new(
            Arc::new(engine.clone()),
            QueryTranslator::new(AuthorityResolver::new()),
            lookup.into_resolver(),
        );

        let related = resolver.related("P826").await.unwrap();
        assert_eq!(related.len(), 2);
        assert_eq!(related["P1922"], "first line");
        assert_eq!(related["P1923"], "P1923");

        let sent = engine.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].query,
            "_nest_parent_:\"http://www.wikidata.org/prop/direct/P826\""
        );
        assert_eq!(sent[0].filters, vec!["@type:\"ld_similar_terms\""]);
    }

    #[tokio::test]
    async fn test_related_none_skips_lookup() {
        let engine = ScriptedEngine::new().respond(response(&[]));
        let lookup = StaticLookup::new();
        let resolver = RelatedTermsResolver::new(
            Arc::new(engine),
            QueryTranslator::default(),
            lookup.clone().into_resolver(),
        );
        assert!(resolver.related("P86").await.unwrap().is_empty());
        assert_eq!(lookup.requests(), 0);
    }

    #[tokio::test]
    async fn test_related_rejects_bad_selector() {
        let resolver = RelatedTermsResolver::new(
            Arc::new(ScriptedEngine::new()),
            QueryTranslator::default(),
            StaticLookup::new().into_resolver(),
        );
        assert!(resolver.related("not a selector").await.is_err());
    }
}
