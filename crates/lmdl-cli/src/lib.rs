//! `lmdl` command-line interface.
//!
//! Indexes expanded JSON-LD into Solr, indexes label and similar-terms
//! documents, searches the index and manages the configuration file.

pub mod cli;
pub mod commands;
pub mod config;
pub mod config_handlers;

pub use cli::{Cli, Command, ConfigAction};
pub use config::LmdlConfig;
