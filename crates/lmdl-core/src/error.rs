//! Error types shared by every LinkedMusic search crate.

use std::path::{Path, PathBuf};

/// Result type alias for LinkedMusic search operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while indexing, querying or expanding documents.
///
/// All variants are fatal for the operation that raised them. Nothing in
/// this workspace retries; callers that want a retry policy wrap the call.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An IRI namespace has no entry in the authority table.
    ///
    /// Raised while encoding means the schema has drifted from the data and
    /// the whole indexing run is aborted.
    #[error("Unknown authority '{stem}' for IRI '{iri}'")]
    UnknownAuthority {
        /// The IRI that could not be resolved.
        iri: String,
        /// The namespace stem that was looked up.
        stem: String,
    },

    /// The label service answered with a failure or a malformed entity map.
    #[error("Label lookup failed: {message}")]
    LabelLookup {
        /// What went wrong.
        message: String,
        /// HTTP status, when the service answered at all.
        status: Option<u16>,
    },

    /// The search engine rejected an add/commit/delete/select request.
    #[error("Search engine {operation} failed: {message}")]
    SearchEngine {
        /// The engine operation that failed (`add`, `select`, ...).
        operation: String,
        /// HTTP status, when the engine answered at all.
        status: Option<u16>,
        /// Response body or parse failure.
        message: String,
    },

    /// Transport-level HTTP failure (connection refused, timeout, ...).
    #[error("HTTP error: {message}")]
    Http {
        /// Human-readable error message.
        message: String,
        /// Underlying transport error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An input graph document is not valid expanded JSON-LD.
    #[error("Invalid document: {message}")]
    InvalidDocument {
        /// What is wrong with the document.
        message: String,
    },

    /// A field or type selector has a shape no authority accepts.
    #[error("Invalid selector '{selector}'")]
    InvalidSelector {
        /// The rejected selector.
        selector: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic.
        message: String,
    },

    /// I/O error on a specific path.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Creates an unknown-authority error.
    pub fn unknown_authority(iri: impl Into<String>, stem: impl Into<String>) -> Self {
        Error::UnknownAuthority {
            iri: iri.into(),
            stem: stem.into(),
        }
    }

    /// Creates a label lookup error without an HTTP status.
    pub fn label_lookup(message: impl Into<String>) -> Self {
        Error::LabelLookup {
            message: message.into(),
            status: None,
        }
    }

    /// Creates a label lookup error for a non-success HTTP status.
    pub fn label_lookup_status(status: u16, message: impl Into<String>) -> Self {
        Error::LabelLookup {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Creates a search engine error without an HTTP status.
    pub fn search_engine(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Error::SearchEngine {
            operation: operation.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Creates a search engine error for a non-success HTTP status.
    pub fn search_engine_status(
        operation: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        Error::SearchEngine {
            operation: operation.into(),
            status: Some(status),
            message: message.into(),
        }
    }

    /// Creates a transport error wrapping its source.
    pub fn http<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Http {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates an invalid-document error.
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Error::InvalidDocument {
            message: message.into(),
        }
    }

    /// Creates an invalid-selector error.
    pub fn invalid_selector(selector: impl Into<String>) -> Self {
        Error::InvalidSelector {
            selector: selector.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Wraps an I/O error with the path it happened on.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::LabelLookup { status, .. } | Error::SearchEngine { status, .. } => *status,
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_authority_display() {
        let err = Error::unknown_authority("https://example.org/ns/p1", "https://example.org/ns/");
        assert_eq!(
            err.to_string(),
            "Unknown authority 'https://example.org/ns/' for IRI 'https://example.org/ns/p1'"
        );
    }

    #[test]
    fn test_search_engine_status() {
        let err = Error::search_engine_status("add", 400, "undefined field");
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.to_string(), "Search engine add failed: undefined field");
    }

    #[test]
    fn test_label_lookup_without_status() {
        let err = Error::label_lookup("missing 'entities'");
        assert_eq!(err.status(), None);
        assert!(err.to_string().contains("missing 'entities'"));
    }

    #[test]
    fn test_io_with_path() {
        let err = Error::io_with_path(
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            "/data/works.jsonld",
        );
        assert!(err.to_string().contains("/data/works.jsonld"));
    }

    #[test]
    fn test_json_error_from() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        let err: Error = serde_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_error_implements_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
