//! Query translator: user selections to Solr queries.
//!
//! A search is a free-text string plus optional field selectors (`P86`,
//! `wdt_P86`) and an optional type (`Q5`, `wd_Q5`). Without selectors the
//! text is matched against the catch-all `_text_` field and results are
//! scoped to content documents by excluding label, similar-terms and nested
//! child documents. With selectors the text is matched against
//! each selected field's `_t` variant, and entities whose labels match the
//! text widen the filter through the fields' `_s` variants.

use std::fmt;

use lmdl_client::SelectParams;
use lmdl_core::authority::IdentifierShape;
use lmdl_core::flat::{ID_FIELD, NEST_PARENT_FIELD, SIMILAR_TERMS_TYPE, TEXT_FIELD, TYPE_FIELD};
use lmdl_core::labels::LABEL_FIELD;
use lmdl_core::{AuthorityResolver, Error, FieldKind, FieldName, LabelKind, Result};

/// Field list returning documents with their nested children.
pub const RESULT_FIELDS: &str = "*,[child]";

/// One clause of a structured query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// `*:*`.
    MatchAll,
    /// Free-text terms on a field: `field:(terms)`.
    Text {
        /// Field name.
        field: String,
        /// Unescaped user text.
        text: String,
    },
    /// Exact phrase on a field: `field:"value"`.
    Exact {
        /// Field name.
        field: String,
        /// Unescaped value.
        value: String,
    },
    /// Field has any value: `field:*`.
    Exists {
        /// Field name.
        field: String,
    },
    /// Disjunction of clauses.
    Any(Vec<Clause>),
    /// Exclusion: `-clause`.
    Not(Box<Clause>),
}

impl Clause {
    /// Free-text clause.
    pub fn text(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Text {
            field: field.into(),
            text: text.into(),
        }
    }

    /// Exact-phrase clause.
    pub fn exact(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Exact {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Exclusion clause.
    pub fn not(clause: Clause) -> Self {
        Self::Not(Box::new(clause))
    }

    /// Render in Lucene query syntax.
    pub fn render(&self) -> String {
        match self {
            Self::MatchAll => "*:*".to_string(),
            Self::Text { field, text } => {
                let terms = escape_terms(text);
                if terms.is_empty() {
                    format!("{field}:*")
                } else {
                    format!("{field}:({terms})")
                }
            }
            Self::Exact { field, value } => format!("{field}:\"{}\"", escape_phrase(value)),
            Self::Exists { field } => format!("{field}:*"),
            Self::Any(clauses) => match clauses.as_slice() {
                [] => Self::MatchAll.render(),
                [single] => single.render(),
                many => format!(
                    "({})",
                    many.iter().map(Clause::render).collect::<Vec<_>>().join(" OR ")
                ),
            },
            Self::Not(clause) => format!("-{}", clause.render()),
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

const SPECIAL: &[char] = &[
    '+', '-', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?', ':', '\\',
    '/',
];

const OPERATORS: &[&str] = &["AND", "OR", "NOT"];

/// Escape Lucene syntax characters, keeping whitespace between terms.
///
/// Bare `AND`/`OR`/`NOT` words are lowercased so they search as terms.
pub fn escape_terms(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        if OPERATORS.contains(&word) {
            out.push_str(&word.to_lowercase());
            continue;
        }
        for c in word.chars() {
            if SPECIAL.contains(&c) {
                out.push('\\');
            }
            out.push(c);
        }
    }
    out
}

fn escape_phrase(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// A translated search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Main query, used for ranking.
    pub query: Clause,
    /// Scope restrictions; each is a filter of its own.
    pub scope: Vec<Clause>,
    /// Filter disjuncts; a result must match at least one.
    pub filter: Vec<Clause>,
    /// Exact type restriction.
    pub type_filter: Option<Clause>,
}

impl SearchQuery {
    /// All filter queries to send, in order.
    pub fn filter_queries(&self) -> Vec<String> {
        let mut fq: Vec<String> = self.scope.iter().map(Clause::render).collect();
        if !self.filter.is_empty() {
            fq.push(Clause::Any(self.filter.clone()).render());
        }
        if let Some(type_filter) = &self.type_filter {
            fq.push(type_filter.render());
        }
        fq
    }

    /// Select parameters returning full documents with children.
    pub fn to_select_params(&self, rows: usize, start: usize) -> SelectParams {
        let mut params = SelectParams::new(self.query.render())
            .with_fields(RESULT_FIELDS)
            .with_rows(rows);
        if start > 0 {
            params = params.with_start(start);
        }
        for fq in self.filter_queries() {
            params = params.with_filter(fq);
        }
        params
    }
}

/// Builds [`SearchQuery`] values from user selections.
#[derive(Debug, Clone, Default)]
pub struct QueryTranslator {
    authorities: AuthorityResolver,
}

impl QueryTranslator {
    /// Translator using the given authority table.
    pub fn new(authorities: AuthorityResolver) -> Self {
        Self { authorities }
    }

    /// Field base name for a selector: a bare `P…`/`Q…` identifier or an
    /// already-prefixed base such as `wdt_P86`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSelector`] for anything else.
    pub fn selector_base(&self, selector: &str) -> Result<String> {
        let selector = selector.trim();
        if IdentifierShape::of(selector) != IdentifierShape::Other {
            return self.authorities.selector_base(selector);
        }
        match self.authorities.split_field_base(selector) {
            Some(_) => Ok(selector.to_string()),
            None => Err(Error::invalid_selector(selector)),
        }
    }

    /// Full IRI for a selector, accepting bare, prefixed or IRI forms.
    pub fn selector_iri(&self, selector: &str) -> Result<String> {
        let selector = selector.trim();
        if selector.contains("://") {
            self.authorities.resolve(selector)?;
            return Ok(selector.to_string());
        }
        if IdentifierShape::of(selector) != IdentifierShape::Other {
            return self.authorities.selector_iri(selector);
        }
        match self.authorities.split_field_base(selector) {
            Some((authority, local)) => Ok(authority.iri(local)),
            None => Err(Error::invalid_selector(selector)),
        }
    }

    /// Exact clause on `@type` for a type selector.
    ///
    /// Entity-shaped values map through the entity authority, IRIs through
    /// their own authority; prefixed values must use a known prefix.
    pub fn type_clause(&self, type_filter: &str) -> Result<Clause> {
        let type_filter = type_filter.trim();
        let value = if type_filter.contains("://") {
            self.authorities.resolve(type_filter)?.field_base()
        } else if IdentifierShape::of(type_filter) == IdentifierShape::Entity {
            self.authorities.entity()?.field_base(type_filter)
        } else if self.authorities.split_field_base(type_filter).is_some() {
            type_filter.to_string()
        } else {
            return Err(Error::invalid_selector(type_filter));
        };
        Ok(Clause::exact(TYPE_FIELD, value))
    }

    /// Exclusions keeping only content documents: no label or similar-terms
    /// documents and no nested children.
    pub fn content_scope() -> Vec<Clause> {
        let index_types = [
            LabelKind::Item.index_type(),
            LabelKind::Property.index_type(),
            SIMILAR_TERMS_TYPE,
        ];
        vec![
            Clause::not(Clause::Any(
                index_types
                    .into_iter()
                    .map(|t| Clause::exact(TYPE_FIELD, t))
                    .collect(),
            )),
            Clause::not(Clause::Exists {
                field: NEST_PARENT_FIELD.to_string(),
            }),
        ]
    }

    /// Query for entities whose labels match the text.
    pub fn recommendation_query(&self, text: &str, rows: usize) -> SelectParams {
        SelectParams::new(Clause::text(LABEL_FIELD, text).render())
            .with_filter(Clause::exact(TYPE_FIELD, LabelKind::Item.index_type()).render())
            .with_fields(ID_FIELD)
            .with_rows(rows)
    }

    fn entity_iri(&self, id: &str) -> Result<String> {
        if id.contains("://") {
            Ok(id.to_string())
        } else {
            Ok(self.authorities.entity()?.iri(id))
        }
    }

    /// Translate a search.
    ///
    /// `recommendations` are entity identifiers (bare or IRI) whose labels
    /// matched the text; they only matter when selectors are given.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSelector`] for an unusable field or type selector.
    pub fn translate<S: AsRef<str>>(
        &self,
        text: &str,
        selectors: &[S],
        type_filter: Option<&str>,
        recommendations: &[String],
    ) -> Result<SearchQuery> {
        let type_filter = type_filter
            .filter(|t| !t.trim().is_empty())
            .map(|t| self.type_clause(t))
            .transpose()?;

        if selectors.is_empty() {
            return Ok(SearchQuery {
                query: Clause::text(TEXT_FIELD, text),
                scope: Self::content_scope(),
                filter: Vec::new(),
                type_filter,
            });
        }

        let bases = selectors
            .iter()
            .map(|s| self.selector_base(s.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let mut filter: Vec<Clause> = bases
            .iter()
            .map(|base| Clause::text(FieldName::new(base.clone(), FieldKind::Text).to_string(), text))
            .collect();

        let mut query_clauses = filter.clone();
        query_clauses.push(Clause::MatchAll);

        for rec in recommendations {
            let iri = self.entity_iri(rec)?;
            for base in &bases {
                filter.push(Clause::exact(
                    FieldName::new(base.clone(), FieldKind::Exact).to_string(),
                    iri.clone(),
                ));
            }
        }

        Ok(SearchQuery {
            query: Clause::Any(query_clauses),
            scope: Vec::new(),
            filter,
            type_filter,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
