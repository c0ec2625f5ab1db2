//! HTTP clients for the LinkedMusic search index and its label service.
//!
//! # Modules
//!
//! - [`engine`]: `SearchEngine` trait, select parameters and responses
//! - [`solr`]: Solr implementation of `SearchEngine`
//! - [`labels`]: `LabelLookup` trait and the batching `LabelResolver`
//! - [`wikidata`]: Wikidata `wbgetentities` implementation of `LabelLookup`
//! - [`config`]: Connection settings

pub mod config;
pub mod engine;
pub mod labels;
pub mod solr;
pub mod wikidata;

pub use config::{LabelServiceConfig, MAX_LABEL_BATCH, SolrConfig};
pub use engine::{FacetCount, SearchEngine, SelectParams, SelectResponse};
pub use labels::{LabelLookup, LabelResolver};
pub use solr::SolrClient;
pub use wikidata::WikidataClient;
