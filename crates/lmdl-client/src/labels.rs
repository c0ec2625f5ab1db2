//! Label lookup trait and the batching resolver built on it.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use lmdl_core::{LabelMap, Result};

use crate::config::MAX_LABEL_BATCH;

/// An external service that maps bare identifiers to labels.
#[async_trait]
pub trait LabelLookup: Send + Sync {
    /// Fetch labels for at most [`LabelLookup::max_batch`] identifiers in
    /// one request. Identifiers the service does not know are absent from
    /// the returned map.
    async fn fetch(&self, ids: &[String]) -> Result<LabelMap>;

    /// Largest batch a single request accepts.
    fn max_batch(&self) -> usize {
        MAX_LABEL_BATCH
    }
}

/// Resolves any number of identifiers by splitting them into batches.
///
/// Batches are requested one after another and merged into one map before
/// returning, so callers never see a partial result. Any failed batch fails
/// the whole call.
#[derive(Clone)]
pub struct LabelResolver {
    lookup: Arc<dyn LabelLookup>,
    batch_size: usize,
}

impl LabelResolver {
    /// Resolver using the lookup's own batch limit.
    pub fn new(lookup: Arc<dyn LabelLookup>) -> Self {
        let batch_size = lookup.max_batch().max(1);
        Self { lookup, batch_size }
    }

    /// Use smaller batches than the lookup allows.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, self.lookup.max_batch().max(1));
        self
    }

    /// Batch size in use.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Resolve identifiers to labels.
    ///
    /// Duplicates are requested once; an empty input makes no request.
    pub async fn resolve<I, S>(&self, ids: I) -> Result<LabelMap>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let unique: Vec<String> = ids
            .into_iter()
            .filter_map(|id| {
                let id = id.as_ref();
                (!id.is_empty() && seen.insert(id.to_string())).then(|| id.to_string())
            })
            .collect();

        let mut labels = LabelMap::new();
        if unique.is_empty() {
            return Ok(labels);
        }

        let batches = unique.len().div_ceil(self.batch_size);
        log::debug!(
            "Resolving {} labels in {batches} batches of up to {}",
            unique.len(),
            self.batch_size
        );
        for chunk in unique.chunks(self.batch_size) {
            labels.extend(self.lookup.fetch(chunk).await?);
        }
        Ok(labels)
    }
}

impl std::fmt::Debug for LabelResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelResolver")
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
