//! Query side of LinkedMusic search.
//!
//! Translates user selections into Solr queries, expands the flat results
//! into labelled records and assembles everything a search page shows.
//!
//! ```text
//! SearchRequest
//!     │
//!     ├── QueryTranslator ──► select ──► ResultExpander ──► results
//!     ├── field_options  (Luke field list + label documents)
//!     ├── type_options   (facet on @type)
//!     └── RelatedTermsResolver (single selector only)
//! ```

pub mod expander;
pub mod related;
pub mod service;
pub mod translator;

#[cfg(test)]
#[allow(clippy::unwrap_used, missing_docs)]
mod testing;

pub use expander::{DisplayDocument, DisplayProperty, ResultExpander};
pub use related::RelatedTermsResolver;
pub use service::{FieldOption, SearchPage, SearchRequest, SearchService, SearchSettings, TypeOption};
pub use translator::{Clause, QueryTranslator, SearchQuery};
