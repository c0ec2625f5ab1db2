//! Similar-terms groups: identifiers that mean the same thing.
//!
//! Each member of a group is indexed as its own document listing every
//! other member as a nested child, so a lookup by `_nest_parent_` finds the
//! alternatives for any member.

use lmdl_core::flat::{SIMILAR_TERMS_FIELD, SIMILAR_TERMS_TYPE};
use lmdl_core::{FieldKind, FieldValue, FlatDocument};
use serde::{Deserialize, Serialize};

/// A set of IRIs considered equivalent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimilarTermsGroup {
    members: Vec<String>,
}

impl SimilarTermsGroup {
    /// Group from member IRIs. Duplicates are dropped, first one wins.
    pub fn new<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for member in members {
            let member = member.into();
            if !unique.contains(&member) {
                unique.push(member);
            }
        }
        Self { members: unique }
    }

    /// The built-in groups.
    pub fn builtin() -> Vec<Self> {
        vec![Self::new([
            "http://www.wikidata.org/prop/direct/P826",
            "http://www.wikidata.org/entity/Q731978",
            "http://www.wikidata.org/entity/Q4484726",
        ])]
    }

    /// Member IRIs in order.
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// One document per member, each listing the others.
    ///
    /// Groups with fewer than two members produce nothing.
    pub fn documents(&self) -> Vec<FlatDocument> {
        if self.members.len() < 2 {
            log::warn!("Ignoring similar-terms group with {} member(s)", self.members.len());
            return Vec::new();
        }
        self.members
            .iter()
            .map(|member| {
                let others = self
                    .members
                    .iter()
                    .filter(|other| *other != member)
                    .map(|other| FlatDocument::new(other.clone()).with_type(SIMILAR_TERMS_TYPE))
                    .collect();
                let mut doc = FlatDocument::new(member.clone()).with_type(SIMILAR_TERMS_TYPE);
                doc.push(SIMILAR_TERMS_FIELD, FieldKind::Nested, FieldValue::Nested(others));
                doc
            })
            .collect()
    }
}
