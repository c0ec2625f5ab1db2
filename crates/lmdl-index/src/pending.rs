//! Identifiers waiting for label documents.

use std::collections::BTreeSet;

use lmdl_core::LabelKind;

/// Identifiers seen while encoding that still need label documents.
///
/// One value per indexing run, returned in
/// [`IndexOutcome`](crate::IndexOutcome) and drained by
/// [`IndexingDriver::index_labels`](crate::IndexingDriver::index_labels).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingLabels {
    items: BTreeSet<String>,
    properties: BTreeSet<String>,
}

impl PendingLabels {
    /// Empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    fn partition(&self, kind: LabelKind) -> &BTreeSet<String> {
        match kind {
            LabelKind::Item => &self.items,
            LabelKind::Property => &self.properties,
        }
    }

    fn partition_mut(&mut self, kind: LabelKind) -> &mut BTreeSet<String> {
        match kind {
            LabelKind::Item => &mut self.items,
            LabelKind::Property => &mut self.properties,
        }
    }

    /// Record a bare identifier. Returns `false` when it was already known.
    pub fn record(&mut self, kind: LabelKind, id: impl Into<String>) -> bool {
        self.partition_mut(kind).insert(id.into())
    }

    /// Whether an identifier is pending.
    pub fn contains(&self, kind: LabelKind, id: &str) -> bool {
        self.partition(kind).contains(id)
    }

    /// Identifiers of one partition, sorted.
    pub fn ids(&self, kind: LabelKind) -> impl Iterator<Item = &str> {
        self.partition(kind).iter().map(String::as_str)
    }

    /// Number of identifiers in one partition.
    pub fn len(&self, kind: LabelKind) -> usize {
        self.partition(kind).len()
    }

    /// True when both partitions are empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.properties.is_empty()
    }

    /// Remove and return one partition, sorted.
    pub fn take(&mut self, kind: LabelKind) -> Vec<String> {
        std::mem::take(self.partition_mut(kind)).into_iter().collect()
    }

    /// Move every identifier of `other` into this tracker.
    pub fn merge(&mut self, other: PendingLabels) {
        self.items.extend(other.items);
        self.properties.extend(other.properties);
    }
}
