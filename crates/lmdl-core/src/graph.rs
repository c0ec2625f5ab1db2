//! Graph documents read from expanded JSON-LD.
//!
//! Only the narrow subset of expanded JSON-LD the data lake produces is
//! understood: node objects with `@id`, `@type` and property arrays whose
//! elements are value objects (`@value`), node references or `@list`
//! containers. No context processing happens here; compacted input is
//! rejected as soon as a property key is not an IRI the authority table
//! knows, which the encoder reports.

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Extension property whose first literal is a reference's display value.
pub const DISPLAY_VALUE_PROPERTY: &str = "http://www.wikidata.org/entity/P2561";

/// Literal type IRI for `xsd:dateTime`.
pub const XSD_DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";

/// A JSON-LD literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    /// Scalar value (string, number or boolean).
    pub value: Value,
    /// Literal type IRI from `@type`.
    pub datatype: Option<String>,
    /// Language tag from `@language`.
    pub language: Option<String>,
}

impl Literal {
    /// Untyped string literal.
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: Value::String(value.into()),
            datatype: None,
            language: None,
        }
    }

    /// Literal with a type IRI.
    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            value: Value::String(value.into()),
            datatype: Some(datatype.into()),
            language: None,
        }
    }

    /// Lexical form of the value.
    pub fn lexical(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// One element of a property's value list.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// A literal value.
    Literal(Literal),
    /// A node reference, possibly with inlined properties.
    Reference(GraphDocument),
}

impl PropertyValue {
    /// Reference to a node by identifier only.
    pub fn reference(id: impl Into<String>) -> Self {
        Self::Reference(GraphDocument::new(id))
    }
}

/// A property IRI and its ordered values.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphProperty {
    /// Property IRI.
    pub iri: String,
    /// Values in document order.
    pub values: Vec<PropertyValue>,
}

/// A node of the input graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphDocument {
    /// Node identifier; absent for anonymous nested nodes.
    pub id: Option<String>,
    /// Type IRIs in document order.
    pub types: Vec<String>,
    /// Properties in document order.
    pub properties: Vec<GraphProperty>,
}

impl GraphDocument {
    /// Node with an identifier and nothing else.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Add a type IRI.
    pub fn with_type(mut self, iri: impl Into<String>) -> Self {
        self.types.push(iri.into());
        self
    }

    /// Append a property with its values.
    pub fn with_property(mut self, iri: impl Into<String>, values: Vec<PropertyValue>) -> Self {
        self.properties.push(GraphProperty {
            iri: iri.into(),
            values,
        });
        self
    }

    /// First type IRI, the only one that is indexed.
    pub fn primary_type(&self) -> Option<&str> {
        self.types.first().map(String::as_str)
    }

    /// Display value carried through the display-value extension property.
    pub fn display_value(&self) -> Option<String> {
        self.properties
            .iter()
            .filter(|p| p.iri == DISPLAY_VALUE_PROPERTY)
            .flat_map(|p| p.values.iter())
            .find_map(|v| match v {
                PropertyValue::Literal(lit) => Some(lit.lexical()),
                PropertyValue::Reference(_) => None,
            })
    }

    /// Parse one expanded JSON-LD node object.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidDocument`] when the value is not a node object or
    /// one of its values has an unsupported shape.
    pub fn from_expanded(value: &Value) -> Result<Self> {
        let Value::Object(node) = value else {
            return Err(Error::invalid_document(format!(
                "expected a node object, found {}",
                json_kind(value)
            )));
        };
        parse_node(node)
    }
}

/// True for blank-node identifiers (`_:b0`).
pub fn is_blank_node(id: &str) -> bool {
    id.starts_with("_:")
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn parse_node(node: &Map<String, Value>) -> Result<GraphDocument> {
    let id = match node.get("@id") {
        None => None,
        Some(Value::String(id)) => Some(id.clone()),
        Some(other) => {
            return Err(Error::invalid_document(format!(
                "@id must be a string, found {}",
                json_kind(other)
            )));
        }
    };

    let types = match node.get("@type") {
        None => Vec::new(),
        Some(Value::String(t)) => vec![t.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(t) => Ok(t.clone()),
                other => Err(Error::invalid_document(format!(
                    "@type entries must be strings, found {}",
                    json_kind(other)
                ))),
            })
            .collect::<Result<Vec<_>>>()?,
        Some(other) => {
            return Err(Error::invalid_document(format!(
                "@type must be a string or array, found {}",
                json_kind(other)
            )));
        }
    };

    let mut properties = Vec::new();
    for (key, raw) in node {
        if key.starts_with('@') {
            continue;
        }
        let mut values = Vec::new();
        match raw {
            Value::Array(items) => {
                for item in items {
                    collect_values(item, &mut values)?;
                }
            }
            single => collect_values(single, &mut values)?,
        }
        properties.push(GraphProperty {
            iri: key.clone(),
            values,
        });
    }

    Ok(GraphDocument {
        id,
        types,
        properties,
    })
}

fn collect_values(item: &Value, out: &mut Vec<PropertyValue>) -> Result<()> {
    match item {
        Value::Null => {}
        Value::Object(obj) if obj.contains_key("@value") => {
            out.push(PropertyValue::Literal(parse_literal(obj)?));
        }
        Value::Object(obj) if obj.contains_key("@list") => match obj.get("@list") {
            Some(Value::Array(items)) => {
                for inner in items {
                    collect_values(inner, out)?;
                }
            }
            Some(single) => collect_values(single, out)?,
            None => {}
        },
        Value::Object(obj) => out.push(PropertyValue::Reference(parse_node(obj)?)),
        Value::Array(_) => {
            return Err(Error::invalid_document(
                "nested arrays are not valid expanded JSON-LD values",
            ));
        }
        scalar => out.push(PropertyValue::Literal(Literal {
            value: scalar.clone(),
            datatype: None,
            language: None,
        })),
    }
    Ok(())
}

fn parse_literal(obj: &Map<String, Value>) -> Result<Literal> {
    let value = match obj.get("@value") {
        Some(v @ (Value::String(_) | Value::Number(_) | Value::Bool(_))) => v.clone(),
        Some(other) => {
            return Err(Error::invalid_document(format!(
                "@value must be a scalar, found {}",
                json_kind(other)
            )));
        }
        None => Value::Null,
    };
    let string_field = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);
    Ok(Literal {
        value,
        datatype: string_field("@type"),
        language: string_field("@language"),
    })
}

/// Parse an expanded JSON-LD payload into graph documents.
///
/// Accepts a top-level array of node objects, an object with an `@graph`
/// array, or a single node object. Every top-level node must carry `@id`.
///
/// # Errors
///
/// [`Error::InvalidDocument`] for unsupported shapes or anonymous
/// top-level nodes.
pub fn parse_graph_documents(payload: &Value) -> Result<Vec<GraphDocument>> {
    let nodes: &[Value] = match payload {
        Value::Array(items) => items,
        Value::Object(obj) => match obj.get("@graph") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(Error::invalid_document(format!(
                    "@graph must be an array, found {}",
                    json_kind(other)
                )));
            }
            None => std::slice::from_ref(payload),
        },
        other => {
            return Err(Error::invalid_document(format!(
                "expected an array or object at the top level, found {}",
                json_kind(other)
            )));
        }
    };

    nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| {
            let doc = GraphDocument::from_expanded(node)?;
            if doc.id.is_none() {
                return Err(Error::invalid_document(format!(
                    "top-level node {idx} has no @id"
                )));
            }
            Ok(doc)
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    fn work_node() -> Value {
        json!({
            "@id": "https://cantusdatabase.org/chant/100",
            "@type": ["http://www.wikidata.org/entity/Q4484726", "https://schema.org/CreativeWork"],
            "http://www.wikidata.org/prop/direct/P1476": [{"@value": "Ave Maria", "@language": "la"}],
            "http://www.wikidata.org/prop/direct/P136": [{
                "@id": "http://www.wikidata.org/entity/Q731978",
                "http://www.wikidata.org/entity/P2561": [{"@value": "antiphon"}]
            }],
            "http://www.wikidata.org/prop/direct/P571": [{
                "@value": "1200-01-01T00:00:00Z",
                "@type": "http://www.w3.org/2001/XMLSchema#dateTime"
            }]
        })
    }

    // ------------------------------------------------------------------------
    // Node parsing tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_from_expanded_node() {
        let doc = GraphDocument::from_expanded(&work_node()).unwrap();
        assert_eq!(doc.id.as_deref(), Some("https://cantusdatabase.org/chant/100"));
        assert_eq!(doc.types.len(), 2);
        assert_eq!(doc.primary_type(), Some("http://www.wikidata.org/entity/Q4484726"));
        assert_eq!(doc.properties.len(), 3);

        let title = &doc.properties[0];
        assert_eq!(title.iri, "http://www.wikidata.org/prop/direct/P1476");
        match &title.values[0] {
            PropertyValue::Literal(lit) => {
                assert_eq!(lit.lexical(), "Ave Maria");
                assert_eq!(lit.language.as_deref(), Some("la"));
                assert!(lit.datatype.is_none());
            }
            other => panic!("expected literal, got {other:?}"),
        }
    }

    #[test]
    fn test_reference_display_value() {
        let doc = GraphDocument::from_expanded(&work_node()).unwrap();
        match &doc.properties[1].values[0] {
            PropertyValue::Reference(target) => {
                assert_eq!(target.id.as_deref(), Some("http://www.wikidata.org/entity/Q731978"));
                assert_eq!(target.display_value().as_deref(), Some("antiphon"));
            }
            other => panic!("expected reference, got {other:?}"),
        }
    }

    #[test]
    fn test_list_container_contributes_items() {
        let node = json!({
            "@id": "https://thesession.org/tunes/1",
            "https://schema.org/keywords": [{"@list": [{"@value": "reel"}, {"@value": "jig"}]}]
        });
        let doc = GraphDocument::from_expanded(&node).unwrap();
        assert_eq!(doc.properties[0].values.len(), 2);
    }

    #[test]
    fn test_ignores_other_keywords() {
        let node = json!({
            "@id": "https://thesession.org/tunes/1",
            "@context": {"x": "y"},
            "@reverse": {}
        });
        let doc = GraphDocument::from_expanded(&node).unwrap();
        assert!(doc.properties.is_empty());
    }

    #[test]
    fn test_numeric_literal_lexical() {
        let node = json!({
            "@id": "https://thesession.org/tunes/1",
            "https://schema.org/position": [{"@value": 3}]
        });
        let doc = GraphDocument::from_expanded(&node).unwrap();
        match &doc.properties[0].values[0] {
            PropertyValue::Literal(lit) => assert_eq!(lit.lexical(), "3"),
            other => panic!("expected literal, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_nested_arrays() {
        let node = json!({"@id": "a", "https://schema.org/name": [[{"@value": "x"}]]});
        assert!(matches!(
            GraphDocument::from_expanded(&node),
            Err(Error::InvalidDocument { .. })
        ));
    }

    #[test]
    fn test_rejects_non_string_id() {
        let node = json!({"@id": 5});
        assert!(GraphDocument::from_expanded(&node).is_err());
    }

    // ------------------------------------------------------------------------
    // Payload tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_parse_graph_array_and_graph_object() {
        let array = json!([work_node(), {"@id": "https://cantusdatabase.org/chant/101"}]);
        assert_eq!(parse_graph_documents(&array).unwrap().len(), 2);

        let graph = json!({"@graph": [work_node()]});
        assert_eq!(parse_graph_documents(&graph).unwrap().len(), 1);

        assert_eq!(parse_graph_documents(&work_node()).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_rejects_anonymous_top_level() {
        let payload = json!([{"@type": ["https://schema.org/Thing"]}]);
        let err = parse_graph_documents(&payload).unwrap_err();
        assert!(err.to_string().contains("no @id"));
    }

    #[test]
    fn test_is_blank_node() {
        assert!(is_blank_node("_:b0"));
        assert!(!is_blank_node("http://www.wikidata.org/entity/Q5"));
    }
}
