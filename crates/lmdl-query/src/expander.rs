//! Result expander: flat engine documents to labelled display records.
//!
//! Expansion runs in two passes so that labels are fetched with a single
//! resolver call per result page: the first pass parses every document and
//! collects the identifiers that can be labelled, the second builds the
//! display records.

use std::collections::BTreeSet;

use lmdl_client::LabelResolver;
use lmdl_core::authority::AuthorityRole;
use lmdl_core::util::ids::humanize_field;
use lmdl_core::{AuthorityResolver, FieldKind, FieldValue, FlatDocument, LabelMap, Result};
use serde::Serialize;
use serde_json::{Map, Value};

/// One labelled property of a display record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayProperty {
    /// Stored field name.
    pub field: String,
    /// Human-readable property label.
    pub label: String,
    /// Value as text.
    pub value: String,
}

/// A search result ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayDocument {
    /// Document identifier.
    pub id: String,
    /// Stored type (`wd_Q5`).
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    /// Label of the type, or the raw type when it has none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_label: Option<String>,
    /// Properties in stored order.
    pub properties: Vec<DisplayProperty>,
}

/// Expands engine documents using one label lookup per call.
#[derive(Debug, Clone)]
pub struct ResultExpander {
    authorities: AuthorityResolver,
    resolver: LabelResolver,
}

impl ResultExpander {
    /// Expander labelling through `resolver`.
    pub fn new(authorities: AuthorityResolver, resolver: LabelResolver) -> Self {
        Self {
            authorities,
            resolver,
        }
    }

    /// Expand raw engine documents.
    ///
    /// # Errors
    ///
    /// Fails when a document has no `@id` or the label lookup fails.
    pub async fn expand(&self, raw: &[Map<String, Value>]) -> Result<Vec<DisplayDocument>> {
        let docs = raw
            .iter()
            .map(FlatDocument::from_engine)
            .collect::<Result<Vec<_>>>()?;

        let mut ids = BTreeSet::new();
        for doc in &docs {
            self.collect_ids(doc, &mut ids);
        }
        let labels = self.resolver.resolve(&ids).await?;
        log::debug!(
            "Expanding {} documents with {} of {} labels",
            docs.len(),
            labels.len(),
            ids.len()
        );

        Ok(docs.iter().map(|doc| self.display(doc, &labels)).collect())
    }

    fn labelled_local<'a>(&self, base: &'a str, roles: &[AuthorityRole]) -> Option<&'a str> {
        let (authority, local) = self.authorities.split_field_base(base)?;
        roles.contains(&authority.role).then_some(local)
    }

    fn collect_ids(&self, doc: &FlatDocument, ids: &mut BTreeSet<String>) {
        if let Some(local) = doc
            .doc_type
            .as_deref()
            .and_then(|t| self.labelled_local(t, &[AuthorityRole::Entity]))
        {
            ids.insert(local.to_string());
        }
        for field in &doc.fields {
            if let Some(local) =
                self.labelled_local(&field.base, &[AuthorityRole::Entity, AuthorityRole::Property])
            {
                ids.insert(local.to_string());
            }
        }
    }

    /// Build a display record from a parsed document and resolved labels.
    pub fn display(&self, doc: &FlatDocument, labels: &LabelMap) -> DisplayDocument {
        let type_label = doc.doc_type.as_ref().map(|t| {
            self.labelled_local(t, &[AuthorityRole::Entity])
                .and_then(|local| labels.get(local)?.label.clone())
                .unwrap_or_else(|| t.clone())
        });

        let properties = doc
            .fields
            .iter()
            .map(|field| {
                let label = self
                    .labelled_local(&field.base, &[AuthorityRole::Entity, AuthorityRole::Property])
                    .and_then(|local| labels.get(local)?.label.clone())
                    .unwrap_or_else(|| humanize_field(&field.base));
                DisplayProperty {
                    field: field.name().to_string(),
                    label,
                    value: display_value(&field.value),
                }
            })
            .collect();

        DisplayDocument {
            id: doc.id.clone(),
            doc_type: doc.doc_type.clone(),
            type_label,
            properties,
        }
    }
}

fn display_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Nested(children) => children
            .iter()
            .map(child_summary)
            .collect::<Vec<_>>()
            .join("; "),
        scalar => scalar.display().unwrap_or_default(),
    }
}

// Text value first, then exact value, then the child's own identifier.
fn child_summary(child: &FlatDocument) -> String {
    let pick = |kind: FieldKind| {
        child
            .fields
            .iter()
            .find(|f| f.kind == kind)
            .and_then(|f| f.value.display())
    };
    pick(FieldKind::Text)
        .or_else(|| pick(FieldKind::Exact))
        .unwrap_or_else(|| child.id.clone())
}

// ============================================================================
// Tests
// ============================================================================
