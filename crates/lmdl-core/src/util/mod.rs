//! Utility modules.
//!
//! # Modules
//!
//! - [`ids`]: IRI splitting, synthesized identifiers and fallback labels

pub mod ids;
