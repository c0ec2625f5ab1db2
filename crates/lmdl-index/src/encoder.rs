//! Flattening encoder: graph documents to flat search-engine documents.
//!
//! # Field rules
//!
//! For a property resolved to base name `<prefix>_<local>`:
//!
//! | Values | Stored as |
//! |--------|-----------|
//! | none | omitted |
//! | one reference with `@id` | `<base>_s` = id, plus `<base>_t` = display value |
//! | one untyped or language-tagged literal | `<base>_t` |
//! | one `xsd:dateTime` literal | `<base>_dt` |
//! | one literal of any other type | `<base>_s` |
//! | one anonymous reference | `<base>_t` = display value, else a nested list of one |
//! | more than one | `<base>` = list of nested sub-documents |
//!
//! Each nested sub-document stores its element as the single value of the
//! same base name, then the element's own type and properties. Elements
//! without an identifier get `<parent id>#<base>-<index>`.

use lmdl_core::authority::AuthorityRole;
use lmdl_core::graph::is_blank_node;
use lmdl_core::util::ids::nested_id;
use lmdl_core::{
    AuthorityResolver, Error, FieldKind, FieldValue, FlatDocument, GraphDocument, Literal,
    LiteralKind, PropertyValue, Result,
};

use crate::pending::PendingLabels;

/// Turns graph documents into flat documents.
#[derive(Debug, Clone, Default)]
pub struct FlatteningEncoder {
    authorities: AuthorityResolver,
}

impl FlatteningEncoder {
    /// Encoder using the given authority table.
    pub fn new(authorities: AuthorityResolver) -> Self {
        Self { authorities }
    }

    /// Authority table in use.
    pub fn authorities(&self) -> &AuthorityResolver {
        &self.authorities
    }

    /// Encode one top-level graph document.
    ///
    /// Identifiers needing labels are added to `pending` only when the
    /// whole document encodes successfully.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidDocument`] when the node has no `@id`;
    /// [`Error::UnknownAuthority`] when a property, type or reference
    /// target IRI has no authority.
    pub fn encode(&self, doc: &GraphDocument, pending: &mut PendingLabels) -> Result<FlatDocument> {
        let id = doc
            .id
            .as_deref()
            .ok_or_else(|| Error::invalid_document("top-level node has no @id"))?;
        let mut local = PendingLabels::new();
        let flat = self.encode_node(id.to_string(), doc, &mut local)?;
        pending.merge(local);
        Ok(flat)
    }

    fn encode_node(
        &self,
        id: String,
        node: &GraphDocument,
        pending: &mut PendingLabels,
    ) -> Result<FlatDocument> {
        let mut flat = FlatDocument::new(id);
        self.apply_node(&mut flat, node, pending)?;
        Ok(flat)
    }

    // Type and properties of `node` onto an existing flat document.
    fn apply_node(
        &self,
        flat: &mut FlatDocument,
        node: &GraphDocument,
        pending: &mut PendingLabels,
    ) -> Result<()> {
        if let Some(type_iri) = node.primary_type() {
            if node.types.len() > 1 {
                log::debug!(
                    "{}: keeping type {type_iri}, dropping {} more",
                    flat.id,
                    node.types.len() - 1
                );
            }
            flat.doc_type = Some(self.authorities.resolve(type_iri)?.field_base());
        }

        for property in &node.properties {
            let resolved = self.authorities.resolve(&property.iri)?;
            let base = resolved.field_base();
            if let Some(kind) = resolved.label_kind() {
                pending.record(kind, resolved.local);
            }

            match property.values.as_slice() {
                [] => {}
                [single] => self.encode_single(flat, &base, single, pending)?,
                values => {
                    let children = values
                        .iter()
                        .enumerate()
                        .map(|(idx, value)| self.encode_element(&flat.id, &base, idx, value, pending))
                        .collect::<Result<Vec<_>>>()?;
                    flat.push(base, FieldKind::Nested, FieldValue::Nested(children));
                }
            }
        }
        Ok(())
    }

    fn encode_single(
        &self,
        flat: &mut FlatDocument,
        base: &str,
        value: &PropertyValue,
        pending: &mut PendingLabels,
    ) -> Result<()> {
        match value {
            PropertyValue::Literal(literal) => {
                flat.push(base, literal_kind(literal), FieldValue::Scalar(literal.value.clone()));
            }
            PropertyValue::Reference(target) => match &target.id {
                Some(target_id) => {
                    self.record_reference(target_id, pending)?;
                    flat.push(base, FieldKind::Exact, FieldValue::text(target_id.clone()));
                    if let Some(display) = target.display_value() {
                        flat.push(base, FieldKind::Text, FieldValue::text(display));
                    }
                }
                None => match target.display_value() {
                    Some(display) => flat.push(base, FieldKind::Text, FieldValue::text(display)),
                    None => {
                        let child = self.encode_element(&flat.id, base, 0, value, pending)?;
                        flat.push(base, FieldKind::Nested, FieldValue::Nested(vec![child]));
                    }
                },
            },
        }
        Ok(())
    }

    fn encode_element(
        &self,
        parent_id: &str,
        base: &str,
        index: usize,
        value: &PropertyValue,
        pending: &mut PendingLabels,
    ) -> Result<FlatDocument> {
        match value {
            PropertyValue::Literal(_) => {
                let mut child = FlatDocument::new(nested_id(parent_id, base, index));
                self.encode_single(&mut child, base, value, pending)?;
                Ok(child)
            }
            PropertyValue::Reference(target) => {
                let child_id = target
                    .id
                    .clone()
                    .unwrap_or_else(|| nested_id(parent_id, base, index));
                let mut child = FlatDocument::new(child_id);
                if let Some(target_id) = &target.id {
                    self.record_reference(target_id, pending)?;
                    child.push(base, FieldKind::Exact, FieldValue::text(target_id.clone()));
                }
                if let Some(display) = target.display_value() {
                    child.push(base, FieldKind::Text, FieldValue::text(display));
                }
                self.apply_node(&mut child, target, pending)?;
                Ok(child)
            }
        }
    }

    // Reference targets must resolve; entity targets need item labels.
    fn record_reference(&self, target_id: &str, pending: &mut PendingLabels) -> Result<()> {
        if is_blank_node(target_id) {
            return Ok(());
        }
        let resolved = self.authorities.resolve(target_id)?;
        if resolved.authority.role == AuthorityRole::Entity
            && let Some(kind) = resolved.label_kind()
        {
            pending.record(kind, resolved.local);
        }
        Ok(())
    }
}

fn literal_kind(literal: &Literal) -> FieldKind {
    match literal.datatype.as_deref() {
        None => FieldKind::Text,
        Some(datatype) => LiteralKind::from_datatype(datatype)
            .map_or(FieldKind::Exact, FieldKind::Typed),
    }
}

// ============================================================================
// Tests
// ============================================================================
