//! Label types: label partitions, resolved labels and label documents.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::flat::{ID_FIELD, TYPE_FIELD};

/// Field holding label strings on label documents.
pub const LABEL_FIELD: &str = "wd_label_txt";

/// The two label indexes kept next to the content documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelKind {
    /// Item labels (`Q…` identifiers).
    Item,
    /// Property labels (`P…` identifiers).
    Property,
}

impl LabelKind {
    /// Value of the `@type` field on label documents of this kind.
    pub fn index_type(&self) -> &'static str {
        match self {
            Self::Item => "ld_item",
            Self::Property => "ld_prop",
        }
    }

    /// Parse a label document `@type` value.
    pub fn from_index_type(value: &str) -> Option<Self> {
        match value {
            "ld_item" => Some(Self::Item),
            "ld_prop" => Some(Self::Property),
            _ => None,
        }
    }
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Item => write!(f, "item"),
            Self::Property => write!(f, "prop"),
        }
    }
}

impl std::str::FromStr for LabelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "item" => Ok(Self::Item),
            "prop" | "property" => Ok(Self::Property),
            other => Err(format!("unknown label kind '{other}' (expected item or prop)")),
        }
    }
}

/// Label and aliases of one identifier in the display language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityLabels {
    /// Primary label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Aliases, in service order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl EntityLabels {
    /// Labels with only a primary label.
    pub fn labelled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            aliases: Vec::new(),
        }
    }

    /// Primary label followed by the aliases.
    pub fn all(&self) -> Vec<String> {
        self.label
            .iter()
            .chain(self.aliases.iter())
            .cloned()
            .collect()
    }

    /// True when there is neither a label nor an alias.
    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.aliases.is_empty()
    }
}

/// Resolved labels keyed by bare identifier.
pub type LabelMap = BTreeMap<String, EntityLabels>;

/// A label index document: `{@id: Q1339, @type: ld_item, wd_label_txt: [...]}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelDocument {
    /// Bare identifier.
    pub id: String,
    /// Which label index the document belongs to.
    pub kind: LabelKind,
    /// Primary label followed by aliases.
    pub labels: Vec<String>,
}

impl LabelDocument {
    /// Build a label document, or `None` when there is nothing to index.
    pub fn from_labels(id: impl Into<String>, kind: LabelKind, labels: &EntityLabels) -> Option<Self> {
        if labels.is_empty() {
            return None;
        }
        Some(Self {
            id: id.into(),
            kind,
            labels: labels.all(),
        })
    }
}

impl Serialize for LabelDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry(ID_FIELD, &self.id)?;
        map.serialize_entry(TYPE_FIELD, self.kind.index_type())?;
        map.serialize_entry(LABEL_FIELD, &self.labels)?;
        map.end()
    }
}

// ============================================================================
// Tests
// ============================================================================
