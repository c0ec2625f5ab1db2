//! Flat documents: the search engine's view of a graph node.
//!
//! A field is kept as a `(base, kind, value)` triple. The suffix that encodes
//! the kind in the stored field name (`_s`, `_t`, `_dt`, or none for nested
//! lists) is only produced when serializing and only parsed when reading a
//! document back from the engine.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::graph::XSD_DATE_TIME;

/// Identifier field.
pub const ID_FIELD: &str = "@id";
/// Primary type field.
pub const TYPE_FIELD: &str = "@type";
/// Catch-all full-text field populated by the engine's copy rules.
pub const TEXT_FIELD: &str = "_text_";
/// Engine field pointing from a child document to its parent.
pub const NEST_PARENT_FIELD: &str = "_nest_parent_";
/// Type of similar-terms documents.
pub const SIMILAR_TERMS_TYPE: &str = "ld_similar_terms";
/// Field listing the other members of a similar-terms group.
pub const SIMILAR_TERMS_FIELD: &str = "wdt_P460";

/// Fields the engine adds on its own; never part of a flat document.
pub const INTERNAL_FIELDS: &[&str] = &[
    "_version_",
    "_root_",
    NEST_PARENT_FIELD,
    "_nest_path_",
    TEXT_FIELD,
    "@context",
    "score",
];

/// Literal types with a dedicated field suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    /// `xsd:dateTime`.
    DateTime,
}

impl LiteralKind {
    /// Kind for a literal type IRI, if it has its own suffix.
    pub fn from_datatype(iri: &str) -> Option<Self> {
        match iri {
            XSD_DATE_TIME => Some(Self::DateTime),
            _ => None,
        }
    }

    /// Field-name suffix without the leading underscore.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::DateTime => "dt",
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "dt" => Some(Self::DateTime),
            _ => None,
        }
    }
}

/// How a field's value is stored and matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Exact-match string (`_s`).
    Exact,
    /// Full-text (`_t`).
    Text,
    /// Typed literal with its own suffix.
    Typed(LiteralKind),
    /// Ordered list of nested sub-documents (no suffix).
    Nested,
}

impl FieldKind {
    /// Suffix appended to the base name, if any.
    pub fn suffix(&self) -> Option<&'static str> {
        match self {
            Self::Exact => Some("s"),
            Self::Text => Some("t"),
            Self::Typed(kind) => Some(kind.suffix()),
            Self::Nested => None,
        }
    }
}

/// A stored field name split into base name and kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldName {
    /// `<prefix>_<local>`.
    pub base: String,
    /// Field kind.
    pub kind: FieldKind,
}

impl FieldName {
    /// Field name from its parts.
    pub fn new(base: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            base: base.into(),
            kind,
        }
    }

    /// Split a stored field name at its kind suffix.
    ///
    /// Names without a known suffix are nested-list fields.
    pub fn parse(name: &str) -> Self {
        if let Some((base, suffix)) = name.rsplit_once('_')
            && !base.is_empty()
        {
            let kind = match suffix {
                "s" => Some(FieldKind::Exact),
                "t" => Some(FieldKind::Text),
                other => LiteralKind::from_suffix(other).map(FieldKind::Typed),
            };
            if let Some(kind) = kind {
                return Self::new(base, kind);
            }
        }
        Self::new(name, FieldKind::Nested)
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind.suffix() {
            Some(suffix) => write!(f, "{}_{suffix}", self.base),
            None => write!(f, "{}", self.base),
        }
    }
}

/// Value of a flat field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A JSON scalar (or a list of scalars for multi-valued engine fields).
    Scalar(Value),
    /// Nested sub-documents, in order.
    Nested(Vec<FlatDocument>),
}

impl FieldValue {
    /// String scalar.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Scalar(Value::String(value.into()))
    }

    /// Display string for scalar values; nested values have none.
    pub fn display(&self) -> Option<String> {
        match self {
            Self::Scalar(Value::String(s)) => Some(s.clone()),
            Self::Scalar(Value::Array(items)) => Some(
                items
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            Self::Scalar(other) => Some(other.to_string()),
            Self::Nested(_) => None,
        }
    }
}

/// One field of a flat document.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatField {
    /// `<prefix>_<local>`.
    pub base: String,
    /// How the value is stored.
    pub kind: FieldKind,
    /// The value.
    pub value: FieldValue,
}

impl FlatField {
    /// Stored field name including the kind suffix.
    pub fn name(&self) -> FieldName {
        FieldName::new(self.base.clone(), self.kind)
    }
}

/// A search-engine document.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatDocument {
    /// Value of the `@id` field.
    pub id: String,
    /// Value of the `@type` field, `<prefix>_<local>`.
    pub doc_type: Option<String>,
    /// Fields in encoding order.
    pub fields: Vec<FlatField>,
}

impl FlatDocument {
    /// Document with an identifier and no fields.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            doc_type: None,
            fields: Vec::new(),
        }
    }

    /// Set the primary type.
    pub fn with_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    /// Append a field.
    pub fn push(&mut self, base: impl Into<String>, kind: FieldKind, value: FieldValue) {
        self.fields.push(FlatField {
            base: base.into(),
            kind,
            value,
        });
    }

    /// Look up a field by its stored name (`wdt_P86_s`).
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        let wanted = FieldName::parse(name);
        self.fields
            .iter()
            .find(|f| f.base == wanted.base && f.kind == wanted.kind)
            .map(|f| &f.value)
    }

    /// Serialize to the JSON object submitted to the engine.
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Rebuild a flat document from an engine-returned JSON object.
    ///
    /// Engine-internal fields are dropped. Unsuffixed fields whose value
    /// is not a list of documents are skipped.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidDocument`] when `@id` is missing or not a string.
    pub fn from_engine(raw: &Map<String, Value>) -> Result<Self> {
        let id = raw
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| Error::invalid_document("engine document has no string @id"))?;
        let doc_type = match raw.get(TYPE_FIELD) {
            Some(Value::String(t)) => Some(t.clone()),
            Some(Value::Array(items)) => items.first().and_then(Value::as_str).map(str::to_string),
            _ => None,
        };

        let mut doc = FlatDocument {
            id: id.to_string(),
            doc_type,
            fields: Vec::new(),
        };

        for (name, value) in raw {
            if name == ID_FIELD || name == TYPE_FIELD || INTERNAL_FIELDS.contains(&name.as_str()) {
                continue;
            }
            let field = FieldName::parse(name);
            let value = match field.kind {
                FieldKind::Nested => match nested_children(value)? {
                    Some(children) => FieldValue::Nested(children),
                    None => {
                        log::debug!("Skipping unsuffixed scalar field '{name}' on {id}");
                        continue;
                    }
                },
                _ => FieldValue::Scalar(value.clone()),
            };
            doc.push(field.base, field.kind, value);
        }
        Ok(doc)
    }
}

fn nested_children(value: &Value) -> Result<Option<Vec<FlatDocument>>> {
    match value {
        Value::Object(child) => Ok(Some(vec![FlatDocument::from_engine(child)?])),
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => items
            .iter()
            .filter_map(Value::as_object)
            .map(FlatDocument::from_engine)
            .collect::<Result<Vec<_>>>()
            .map(Some),
        _ => Ok(None),
    }
}

impl Serialize for FlatDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let len = 1 + usize::from(self.doc_type.is_some()) + self.fields.len();
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry(ID_FIELD, &self.id)?;
        if let Some(doc_type) = &self.doc_type {
            map.serialize_entry(TYPE_FIELD, doc_type)?;
        }
        for field in &self.fields {
            let name = field.name().to_string();
            match &field.value {
                FieldValue::Scalar(value) => map.serialize_entry(&name, value)?,
                FieldValue::Nested(children) => map.serialize_entry(&name, children)?,
            }
        }
        map.end()
    }
}

// ============================================================================
// Tests
// ============================================================================
