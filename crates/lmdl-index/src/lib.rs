//! Indexing side of LinkedMusic search.
//!
//! Turns expanded JSON-LD graph documents into flat Solr documents and
//! submits them, together with the label and similar-terms documents the
//! query layer relies on.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      lmdl-index                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  IndexingDriver                                             │
//! │  ├── load_documents (expanded JSON-LD file)                 │
//! │  ├── run            (encode all, one add+commit)            │
//! │  ├── index_labels   (drain PendingLabels, ld_item/ld_prop)  │
//! │  ├── index_similar_terms                                    │
//! │  └── reset          (delete *:*)                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  FlatteningEncoder (field naming, nesting)                  │
//! │  PendingLabels     (identifiers awaiting labels)            │
//! │  SimilarTermsGroup (equivalent identifiers)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod driver;
pub mod encoder;
pub mod pending;
pub mod similar;

pub use driver::{IndexOutcome, IndexingDriver, LabelOutcome};
pub use encoder::FlatteningEncoder;
pub use pending::PendingLabels;
pub use similar::SimilarTermsGroup;
