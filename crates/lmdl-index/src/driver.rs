//! Indexing driver.
//!
//! Orchestrates a full indexing run against a [`SearchEngine`]:
//!
//! 1. Load expanded JSON-LD into graph documents
//! 2. Encode every document (all-or-nothing)
//! 3. Submit all flat documents as one add-and-commit batch
//! 4. Optionally resolve and submit label documents for the identifiers
//!    collected during encoding
//!
//! # Usage
//!
//! ```rust,ignore
//! use lmdl_index::IndexingDriver;
//!
//! let driver = IndexingDriver::new(engine, AuthorityResolver::new());
//! let docs = IndexingDriver::load_documents("chants.jsonld").await?;
//! let mut outcome = driver.run(&docs).await?;
//! driver.index_labels(LabelKind::Item, &mut outcome.pending, &resolver).await?;
//! ```

use std::path::Path;
use std::sync::Arc;

use lmdl_client::{LabelResolver, SearchEngine};
use lmdl_core::{
    AuthorityResolver, Error, FlatDocument, GraphDocument, LabelDocument, LabelKind, Result,
    parse_graph_documents,
};
use serde_json::Value;

use crate::encoder::FlatteningEncoder;
use crate::pending::PendingLabels;
use crate::similar::SimilarTermsGroup;

/// Result of an indexing run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexOutcome {
    /// Engine status code, `None` when nothing was submitted.
    pub status: Option<u16>,
    /// Number of top-level documents submitted.
    pub documents: usize,
    /// Identifiers that still need label documents.
    pub pending: PendingLabels,
}

/// Result of a label indexing step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelOutcome {
    /// Partition that was drained.
    pub kind: LabelKind,
    /// Identifiers sent to the label service.
    pub requested: usize,
    /// Label documents submitted.
    pub documents: usize,
    /// Engine status code, `None` when nothing was submitted.
    pub status: Option<u16>,
}

/// Drives encoding and submission against a search engine.
pub struct IndexingDriver {
    engine: Arc<dyn SearchEngine>,
    encoder: FlatteningEncoder,
}

impl IndexingDriver {
    /// Driver for an engine using the given authority table.
    pub fn new(engine: Arc<dyn SearchEngine>, authorities: AuthorityResolver) -> Self {
        Self {
            engine,
            encoder: FlatteningEncoder::new(authorities),
        }
    }

    /// The encoder in use.
    pub fn encoder(&self) -> &FlatteningEncoder {
        &self.encoder
    }

    /// Read an expanded JSON-LD file.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] when the file cannot be read, [`Error::Json`] or
    /// [`Error::InvalidDocument`] when its content is not expanded JSON-LD.
    pub async fn load_documents(path: impl AsRef<Path>) -> Result<Vec<GraphDocument>> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::io_with_path(e, path))?;
        let payload: Value = serde_json::from_str(&content)?;
        let docs = parse_graph_documents(&payload)?;
        log::info!("Loaded {} documents from {}", docs.len(), path.display());
        Ok(docs)
    }

    /// Encode every document, failing on the first one that cannot be
    /// encoded.
    pub fn encode_all(&self, docs: &[GraphDocument]) -> Result<(Vec<FlatDocument>, PendingLabels)> {
        let mut pending = PendingLabels::new();
        let flat = docs
            .iter()
            .map(|doc| self.encoder.encode(doc, &mut pending))
            .collect::<Result<Vec<_>>>()?;
        Ok((flat, pending))
    }

    /// Encode and submit documents as one batch.
    ///
    /// Nothing is submitted when any document fails to encode, or when
    /// there are no documents.
    pub async fn run(&self, docs: &[GraphDocument]) -> Result<IndexOutcome> {
        let (flat, pending) = self.encode_all(docs)?;
        if flat.is_empty() {
            log::info!("No documents to index");
            return Ok(IndexOutcome {
                pending,
                ..Default::default()
            });
        }

        let status = self.submit(&flat).await?;
        log::info!(
            "Indexed {} documents ({} items, {} properties pending labels)",
            flat.len(),
            pending.len(LabelKind::Item),
            pending.len(LabelKind::Property)
        );
        Ok(IndexOutcome {
            status: Some(status),
            documents: flat.len(),
            pending,
        })
    }

    /// Drain one partition of `pending`, resolve labels and submit label
    /// documents.
    ///
    /// Identifiers without a label or alias are skipped. When the lookup or
    /// the submission fails the drained identifiers are put back.
    pub async fn index_labels(
        &self,
        kind: LabelKind,
        pending: &mut PendingLabels,
        resolver: &LabelResolver,
    ) -> Result<LabelOutcome> {
        let ids = pending.take(kind);
        if ids.is_empty() {
            log::debug!("No {kind} labels pending");
            return Ok(LabelOutcome {
                kind,
                requested: 0,
                documents: 0,
                status: None,
            });
        }

        match self.submit_labels(kind, &ids, resolver).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                log::warn!("Label step for {} {kind} identifiers failed: {e}", ids.len());
                for id in ids {
                    pending.record(kind, id);
                }
                Err(e)
            }
        }
    }

    async fn submit_labels(
        &self,
        kind: LabelKind,
        ids: &[String],
        resolver: &LabelResolver,
    ) -> Result<LabelOutcome> {
        let mut outcome = LabelOutcome {
            kind,
            requested: ids.len(),
            documents: 0,
            status: None,
        };
        let labels = resolver.resolve(ids).await?;

        let docs = ids
            .iter()
            .filter_map(|id| LabelDocument::from_labels(id.clone(), kind, labels.get(id)?))
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        if docs.is_empty() {
            log::warn!("None of {} {kind} identifiers had labels", ids.len());
            return Ok(outcome);
        }

        outcome.status = Some(self.engine.add(&docs).await?);
        outcome.documents = docs.len();
        log::info!(
            "Indexed {} {kind} label documents for {} identifiers",
            outcome.documents,
            outcome.requested
        );
        Ok(outcome)
    }

    /// Submit the documents of every similar-terms group as one batch.
    pub async fn index_similar_terms(&self, groups: &[SimilarTermsGroup]) -> Result<Option<u16>> {
        let flat: Vec<FlatDocument> = groups.iter().flat_map(SimilarTermsGroup::documents).collect();
        if flat.is_empty() {
            log::info!("No similar-terms documents to index");
            return Ok(None);
        }
        let status = self.submit(&flat).await?;
        log::info!("Indexed {} similar-terms documents", flat.len());
        Ok(Some(status))
    }

    /// Delete every document in the index.
    pub async fn reset(&self) -> Result<u16> {
        let status = self.engine.delete_all().await?;
        log::info!("Cleared index via {}", self.engine.name());
        Ok(status)
    }

    async fn submit(&self, flat: &[FlatDocument]) -> Result<u16> {
        let docs = flat
            .iter()
            .map(FlatDocument::to_json)
            .collect::<Result<Vec<_>>>()?;
        self.engine.add(&docs).await
    }
}

impl std::fmt::Debug for IndexingDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexingDriver")
            .field("engine", &self.engine.name())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
