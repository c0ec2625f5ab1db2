//! LinkedMusic search core: shared types, errors and document models.
//!
//! This crate has no internal dependencies and no I/O beyond reading input
//! files. Every other crate in the workspace builds on it.
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`authority`]: IRI namespace → field prefix table
//! - [`graph`]: Graph documents read from expanded JSON-LD
//! - [`flat`]: Flat search-engine documents and field naming
//! - [`labels`]: Label partitions, resolved labels and label documents
//! - [`util`]: Identifier helpers

pub mod authority;
pub mod error;
pub mod flat;
pub mod graph;
pub mod labels;
pub mod util;

// Re-export key types at crate root for convenience
pub use authority::{Authority, AuthorityResolver, AuthorityRole, IdentifierShape, ResolvedIri};
pub use error::{Error, Result};
pub use flat::{FieldKind, FieldName, FieldValue, FlatDocument, FlatField, LiteralKind};
pub use graph::{GraphDocument, GraphProperty, Literal, PropertyValue, parse_graph_documents};
pub use labels::{EntityLabels, LabelDocument, LabelKind, LabelMap};
